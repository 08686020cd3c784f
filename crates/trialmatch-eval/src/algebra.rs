//! Result algebra over evaluations
//!
//! All combinators are total and return fresh [`Evaluation`]s. A combined
//! evaluation carries the messages and molecular events of the inputs that
//! hold the winning result; the others are dropped, so a combined FAIL never
//! explains itself with PASS messages.

use trialmatch_types::{Evaluation, EvaluationResult};

/// Evaluations holding the winning result, in input order
fn winners_of(evaluations: &[Evaluation], winner: EvaluationResult) -> Vec<&Evaluation> {
    evaluations.iter().filter(|e| e.result() == winner).collect()
}

/// Conjunction: the lowest result on the AND precedence table wins
///
/// Precedence (lowest wins):
/// `FAIL < UNDETERMINED < NOT_EVALUATED < NOT_IMPLEMENTED < WARN < PASS`
///
/// | A      | B       | A and B |
/// |--------|---------|---------|
/// | FAIL   | any     | FAIL    |
/// | UND    | NE / NI | UND     |
/// | NE     | NI      | NE      |
/// | NE/NI  | WARN    | NE/NI   |
/// | NE/NI  | PASS    | NE/NI   |
/// | WARN   | PASS    | WARN    |
/// | WARN   | WARN    | WARN    |
/// | PASS   | PASS    | PASS    |
///
/// The combined result is recoverable only when every winning input is.
/// An empty conjunction is PASS.
pub fn and(evaluations: &[Evaluation]) -> Evaluation {
    let Some(winner) = evaluations
        .iter()
        .map(Evaluation::result)
        .min_by_key(|r| r.and_rank())
    else {
        return Evaluation::combine(EvaluationResult::Pass, false, []);
    };
    let winners = winners_of(evaluations, winner);
    let recoverable = winners.iter().all(|e| e.is_recoverable());
    Evaluation::combine(winner, recoverable, winners)
}

/// Disjunction: the highest result on the OR precedence table wins
///
/// Precedence (highest wins):
/// `FAIL < NOT_EVALUATED < NOT_IMPLEMENTED < UNDETERMINED < WARN < PASS`
///
/// | A      | B       | A or B  |
/// |--------|---------|---------|
/// | PASS   | any     | PASS    |
/// | WARN   | < PASS  | WARN    |
/// | UND    | NE / NI | UND     |
/// | NI     | NE      | NI      |
/// | any    | FAIL    | any     |
///
/// The combined result is recoverable when any winning input is.
/// An empty disjunction is FAIL; composite construction rejects it before
/// evaluation ever sees it.
pub fn or(evaluations: &[Evaluation]) -> Evaluation {
    let Some(winner) = evaluations
        .iter()
        .map(Evaluation::result)
        .max_by_key(|r| r.or_rank())
    else {
        return Evaluation::combine(EvaluationResult::Fail, false, []);
    };
    let winners = winners_of(evaluations, winner);
    let recoverable = winners.iter().any(|e| e.is_recoverable());
    Evaluation::combine(winner, recoverable, winners)
}

/// Negation
///
/// | A     | not A |
/// |-------|-------|
/// | PASS  | FAIL  |
/// | WARN  | FAIL  |
/// | FAIL  | PASS  |
/// | UND   | UND   |
/// | NE    | NE    |
/// | NI    | NI    |
///
/// Inclusion and exclusion events swap.
pub fn not(evaluation: Evaluation) -> Evaluation {
    let result = match evaluation.result() {
        EvaluationResult::Pass | EvaluationResult::Warn => EvaluationResult::Fail,
        EvaluationResult::Fail => EvaluationResult::Pass,
        other => other,
    };
    evaluation.with_result(result).with_swapped_events()
}

/// PASS and WARN become WARN; everything else is unchanged
pub fn warn_if(evaluation: Evaluation) -> Evaluation {
    match evaluation.result() {
        EvaluationResult::Pass | EvaluationResult::Warn => {
            evaluation.with_result(EvaluationResult::Warn)
        }
        _ => evaluation,
    }
}

/// PASS becomes WARN; everything else, NOT_EVALUATED included, is unchanged
pub fn warn_on_pass(evaluation: Evaluation) -> Evaluation {
    match evaluation.result() {
        EvaluationResult::Pass => evaluation.with_result(EvaluationResult::Warn),
        _ => evaluation,
    }
}

/// FAIL becomes WARN; everything else is unchanged
pub fn warn_on_fail(evaluation: Evaluation) -> Evaluation {
    match evaluation.result() {
        EvaluationResult::Fail => evaluation.with_result(EvaluationResult::Warn),
        _ => evaluation,
    }
}

/// The primary evaluation unless it is uninformative (UNDETERMINED,
/// NOT_EVALUATED, NOT_IMPLEMENTED); then the secondary. The secondary is only
/// computed when needed.
pub fn fallback(primary: Evaluation, secondary: impl FnOnce() -> Evaluation) -> Evaluation {
    if primary.result().is_uninformative() {
        secondary()
    } else {
        primary
    }
}
