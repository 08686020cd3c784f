//! Evaluator trait shared by leaf predicates and composites

use std::fmt;
use std::sync::Arc;
use trialmatch_model::PatientRecord;
use trialmatch_types::Evaluation;

/// A built criterion, ready to run against patient records
///
/// Evaluators are immutable once created and shared across threads through
/// `Arc`. Evaluation never fails: missing or ambiguous data yields an
/// UNDETERMINED evaluation instead of an error.
pub trait EvaluationFunction: Send + Sync {
    fn evaluate(&self, record: &PatientRecord) -> Evaluation;
}

impl<F> EvaluationFunction for F
where
    F: Fn(&PatientRecord) -> Evaluation + Send + Sync,
{
    fn evaluate(&self, record: &PatientRecord) -> Evaluation {
        self(record)
    }
}

/// Shared handle to an evaluator
pub type SharedFunction = Arc<dyn EvaluationFunction>;

/// Evaluator that always returns the same evaluation
///
/// Used for rules whose outcome does not depend on the record, such as
/// criteria that need manual review.
#[derive(Clone)]
pub struct Constant(pub Evaluation);

impl EvaluationFunction for Constant {
    fn evaluate(&self, _record: &PatientRecord) -> Evaluation {
        self.0.clone()
    }
}

impl fmt::Debug for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Constant({})", self.0.result())
    }
}
