//! Eligibility evaluation engine
//!
//! [`EligibilityEngine`] owns a verified [`RuleRegistry`] and evaluates
//! criterion trees against patient records.

use crate::config::EvaluationConfig;
use crate::context::RuleContext;
use crate::function::SharedFunction;
use crate::registry::RuleRegistry;
use log::trace;
use std::sync::Arc;
use trialmatch_diagnostics::Result;
use trialmatch_doid::DoidModel;
use trialmatch_model::PatientRecord;
use trialmatch_types::{Evaluation, RuleExpression};

/// Builds and runs evaluators for criterion trees
///
/// Construction verifies that every catalogued rule has a creator and an
/// input shape, so a running engine never meets an unknown rule.
pub struct EligibilityEngine {
    registry: RuleRegistry,
}

impl EligibilityEngine {
    /// Create an engine with the standard rules
    pub fn new(doid_model: Arc<DoidModel>, config: EvaluationConfig) -> Result<Self> {
        config.validate()?;
        Self::with_registry(RuleRegistry::with_standard_rules(RuleContext::new(
            doid_model, config,
        )))
    }

    /// Create an engine with a custom registry
    pub fn with_registry(registry: RuleRegistry) -> Result<Self> {
        registry.verify()?;
        Ok(Self { registry })
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub fn context(&self) -> &RuleContext {
        self.registry.context()
    }

    /// Build the evaluator for a criterion tree
    pub fn build(&self, expression: &RuleExpression) -> Result<SharedFunction> {
        self.registry.create(expression)
    }

    /// Build and evaluate a criterion tree in one go
    pub fn evaluate(&self, expression: &RuleExpression, record: &PatientRecord) -> Result<Evaluation> {
        let function = self.build(expression)?;
        let evaluation = function.evaluate(record);
        trace!(
            "{} for {}: {}",
            expression.rule,
            record.patient_id,
            evaluation.result()
        );
        Ok(evaluation)
    }

    /// Whether the parameters of a criterion tree match the declared input
    /// shapes; `None` when a rule in the tree declares no shape
    pub fn has_valid_inputs(&self, expression: &RuleExpression) -> Option<bool> {
        self.context().resolver().has_valid_inputs(expression)
    }
}
