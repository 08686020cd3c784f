//! Criterion text parser using Winnow
//!
//! Curated protocols store each criterion as text:
//!
//! ```text
//! criterion := NAME ( '(' criterion (',' criterion)* ')' | '[' tokens ']' )?
//! tokens    := token (',' token)*
//! ```
//!
//! A token is any text without `,` `[` `]` `(` `)`, trimmed. `NAME[]` has no
//! tokens. Parsing is two-staged: the grammar produces a raw tree with the
//! span of every rule name, then rule names are looked up in the catalogue so
//! an unknown rule can be reported at its position.

mod delimiters;
mod grammar;

use grammar::{RawCriterion, RawParameters};
use trialmatch_diagnostics::{
    Result, SourceLocation, Span, TM0001, TM0002, TM0003, TM0005, TrialMatchError,
};
use trialmatch_types::{Parameter, Rule, RuleExpression};
use winnow::prelude::*;
use winnow::stream::LocatingSlice;

/// Parse one criterion into a rule expression tree
pub fn parse_criterion(text: &str) -> Result<RuleExpression> {
    delimiters::check_balanced(text)?;

    let (raw, (trailing, trailing_span)) = grammar::document
        .parse(LocatingSlice::new(text))
        .map_err(|err| {
            let offset = err.offset();
            let (code, what) = if offset >= text.len() {
                (TM0002, "unexpected end of criterion".to_string())
            } else {
                (TM0001, format!("unexpected input '{}'", snippet(&text[offset..])))
            };
            let expected = err.inner().to_string();
            let message = if expected.is_empty() {
                what
            } else {
                format!("{}, {}", what, expected)
            };
            let location = SourceLocation::from_span(Span::new(offset, offset + 1), text);
            TrialMatchError::parse_at(code, message, text, location)
        })?;

    if !trailing.is_empty() {
        let span = Span::from(trailing_span);
        return Err(TrialMatchError::parse_at(
            TM0005,
            format!("trailing input '{}' after criterion", snippet(trailing)),
            text,
            SourceLocation::from_span(span, text),
        ));
    }

    resolve(raw, text)
}

fn resolve(raw: RawCriterion<'_>, text: &str) -> Result<RuleExpression> {
    let rule = Rule::from_name(raw.name).ok_or_else(|| {
        TrialMatchError::parse_at(
            TM0003,
            format!("unknown rule '{}'", raw.name),
            text,
            SourceLocation::from_span(raw.name_span, text),
        )
    })?;

    let parameters = match raw.parameters {
        RawParameters::None => Vec::new(),
        RawParameters::Tokens(tokens) => tokens
            .into_iter()
            .map(|token| Parameter::Token(token.to_string()))
            .collect(),
        RawParameters::Children(children) => children
            .into_iter()
            .map(|child| resolve(child, text).map(Parameter::Function))
            .collect::<Result<Vec<_>>>()?,
    };

    Ok(RuleExpression::new(rule, parameters))
}

/// First few characters of the remaining input, for messages
fn snippet(rest: &str) -> String {
    let mut out: String = rest.chars().take(20).collect();
    if rest.chars().count() > 20 {
        out.push_str("...");
    }
    out
}
