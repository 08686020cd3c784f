//! Composite evaluators built from sub-criterion evaluators

use crate::algebra;
use crate::function::{EvaluationFunction, SharedFunction};
use trialmatch_model::PatientRecord;
use trialmatch_types::Evaluation;

/// All sub-criteria must hold; see [`algebra::and`]
pub struct And {
    children: Vec<SharedFunction>,
}

impl And {
    pub fn new(children: Vec<SharedFunction>) -> Self {
        Self { children }
    }
}

impl EvaluationFunction for And {
    fn evaluate(&self, record: &PatientRecord) -> Evaluation {
        let evaluations: Vec<Evaluation> =
            self.children.iter().map(|c| c.evaluate(record)).collect();
        algebra::and(&evaluations)
    }
}

/// Any sub-criterion must hold; see [`algebra::or`]
pub struct Or {
    children: Vec<SharedFunction>,
}

impl Or {
    pub fn new(children: Vec<SharedFunction>) -> Self {
        Self { children }
    }
}

impl EvaluationFunction for Or {
    fn evaluate(&self, record: &PatientRecord) -> Evaluation {
        let evaluations: Vec<Evaluation> =
            self.children.iter().map(|c| c.evaluate(record)).collect();
        algebra::or(&evaluations)
    }
}

/// Single-child transform over the result of a sub-criterion
pub struct Unary {
    child: SharedFunction,
    transform: fn(Evaluation) -> Evaluation,
}

impl Unary {
    pub fn not(child: SharedFunction) -> Self {
        Self { child, transform: algebra::not }
    }

    pub fn warn_if(child: SharedFunction) -> Self {
        Self { child, transform: algebra::warn_if }
    }

    pub fn warn_on_pass(child: SharedFunction) -> Self {
        Self { child, transform: algebra::warn_on_pass }
    }

    pub fn warn_on_fail(child: SharedFunction) -> Self {
        Self { child, transform: algebra::warn_on_fail }
    }
}

impl EvaluationFunction for Unary {
    fn evaluate(&self, record: &PatientRecord) -> Evaluation {
        (self.transform)(self.child.evaluate(record))
    }
}

/// Primary sub-criterion, or the secondary when the primary is uninformative
pub struct Fallback {
    primary: SharedFunction,
    secondary: SharedFunction,
}

impl Fallback {
    pub fn new(primary: SharedFunction, secondary: SharedFunction) -> Self {
        Self { primary, secondary }
    }
}

impl EvaluationFunction for Fallback {
    fn evaluate(&self, record: &PatientRecord) -> Evaluation {
        algebra::fallback(self.primary.evaluate(record), || {
            self.secondary.evaluate(record)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::Constant;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use trialmatch_types::{EvaluationResult, Gender};

    fn record() -> PatientRecord {
        PatientRecord::new("P-1", 1960, Gender::Female)
    }

    fn constant(evaluation: Evaluation) -> SharedFunction {
        Arc::new(Constant(evaluation))
    }

    #[test]
    fn test_and_of_pass_and_or() {
        // AND(PASS, OR(FAIL, WARN)) = WARN
        let or = Arc::new(Or::new(vec![
            constant(Evaluation::fail("fails", "")),
            constant(Evaluation::warn("warns", "")),
        ]));
        let and = And::new(vec![constant(Evaluation::pass("passes", "")), or]);
        let evaluation = and.evaluate(&record());
        assert_eq!(evaluation.result(), EvaluationResult::Warn);
        assert!(evaluation.specific_messages().contains("warns"));
        assert!(!evaluation.specific_messages().contains("passes"));
    }

    #[test]
    fn test_fallback_skips_secondary() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let secondary: SharedFunction = Arc::new(move |_: &PatientRecord| {
            counter.fetch_add(1, Ordering::SeqCst);
            Evaluation::fail("secondary", "")
        });

        let fallback = Fallback::new(constant(Evaluation::pass("primary", "")), Arc::clone(&secondary));
        assert_eq!(fallback.evaluate(&record()).result(), EvaluationResult::Pass);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let fallback = Fallback::new(constant(Evaluation::undetermined("unknown", "")), secondary);
        assert_eq!(fallback.evaluate(&record()).result(), EvaluationResult::Fail);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_not_of_warn_is_fail() {
        let not = Unary::not(constant(Evaluation::warn("warns", "")));
        assert_eq!(not.evaluate(&record()).result(), EvaluationResult::Fail);
    }
}
