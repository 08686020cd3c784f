//! Delimiter balance check run before the grammar
//!
//! Tokens cannot contain brackets, so every `(`/`[` in a well-formed
//! criterion has a matching closer. Checking this up front lets an
//! unbalanced criterion be reported at the offending delimiter instead of
//! wherever the grammar happens to give up.

use trialmatch_diagnostics::{Result, SourceLocation, Span, TM0004, TrialMatchError};

fn closer_for(open: char) -> char {
    if open == '(' { ')' } else { ']' }
}

fn unbalanced(text: &str, offset: usize, message: String) -> TrialMatchError {
    let location = SourceLocation::from_span(Span::new(offset, offset + 1), text);
    TrialMatchError::parse_at(TM0004, message, text, location)
}

pub(crate) fn check_balanced(text: &str) -> Result<()> {
    let mut open: Vec<(char, usize)> = Vec::new();

    for (offset, ch) in text.char_indices() {
        match ch {
            '(' | '[' => open.push((ch, offset)),
            ')' | ']' => match open.pop() {
                Some((opener, _)) if closer_for(opener) == ch => {}
                Some((opener, opened_at)) => {
                    return Err(unbalanced(
                        text,
                        offset,
                        format!(
                            "'{}' does not close '{}' opened at offset {}",
                            ch, opener, opened_at
                        ),
                    ));
                }
                None => {
                    return Err(unbalanced(text, offset, format!("unmatched '{}'", ch)));
                }
            },
            _ => {}
        }
    }

    match open.pop() {
        Some((opener, offset)) => Err(unbalanced(
            text,
            offset,
            format!("'{}' is never closed", opener),
        )),
        None => Ok(()),
    }
}
