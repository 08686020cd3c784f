//! Winnow grammar for criterion text

use std::ops::Range;
use trialmatch_diagnostics::Span;
use winnow::ascii::multispace0;
use winnow::combinator::{alt, cut_err, delimited, opt, preceded, separated};
use winnow::error::{StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::stream::LocatingSlice;
use winnow::token::{rest, take_while};

pub(crate) type Input<'a> = LocatingSlice<&'a str>;

/// Criterion as written, before rule names are looked up
#[derive(Debug)]
pub(crate) struct RawCriterion<'a> {
    pub name: &'a str,
    pub name_span: Span,
    pub parameters: RawParameters<'a>,
}

#[derive(Debug)]
pub(crate) enum RawParameters<'a> {
    None,
    Tokens(Vec<&'a str>),
    Children(Vec<RawCriterion<'a>>),
}

fn ws(input: &mut Input<'_>) -> ModalResult<()> {
    multispace0.void().parse_next(input)
}

fn rule_name<'a>(input: &mut Input<'a>) -> ModalResult<(&'a str, Range<usize>)> {
    take_while(1.., |c: char| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
        .with_span()
        .context(StrContext::Label("rule name"))
        .context(StrContext::Expected(StrContextValue::Description(
            "an upper-case rule name",
        )))
        .parse_next(input)
}

fn token<'a>(input: &mut Input<'a>) -> ModalResult<&'a str> {
    take_while(0.., |c: char| !matches!(c, ',' | '[' | ']' | '(' | ')'))
        .map(str::trim)
        .parse_next(input)
}

fn tokens<'a>(input: &mut Input<'a>) -> ModalResult<Vec<&'a str>> {
    let tokens: Vec<&str> = separated(1.., token, ',').parse_next(input)?;
    if tokens.len() == 1 && tokens[0].is_empty() {
        return Ok(Vec::new());
    }
    Ok(tokens)
}

fn children<'a>(input: &mut Input<'a>) -> ModalResult<Vec<RawCriterion<'a>>> {
    separated(1.., criterion, (ws, ',', ws)).parse_next(input)
}

pub(crate) fn criterion<'a>(input: &mut Input<'a>) -> ModalResult<RawCriterion<'a>> {
    let (name, name_span) = rule_name.parse_next(input)?;
    ws.parse_next(input)?;

    let parameters = opt(alt((
        delimited(('(', ws), cut_err(children), (ws, cut_err(')'))).map(RawParameters::Children),
        delimited('[', tokens, cut_err(']')).map(RawParameters::Tokens),
    )))
    .parse_next(input)?;

    Ok(RawCriterion {
        name,
        name_span: Span::from(name_span),
        parameters: parameters.unwrap_or(RawParameters::None),
    })
}

/// A criterion followed by whatever input remains
pub(crate) fn document<'a>(
    input: &mut Input<'a>,
) -> ModalResult<(RawCriterion<'a>, (&'a str, Range<usize>))> {
    (preceded(ws, criterion), preceded(ws, rest.with_span())).parse_next(input)
}
