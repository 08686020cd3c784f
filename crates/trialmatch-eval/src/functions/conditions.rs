//! Prior conditions and second malignancies

use crate::context::RuleContext;
use crate::function::{EvaluationFunction, SharedFunction};
use std::sync::Arc;
use trialmatch_diagnostics::Result;
use trialmatch_doid::DoidModel;
use trialmatch_doid::constants::CANCER_DOID;
use trialmatch_model::{PatientRecord, PriorCondition};
use trialmatch_types::{DoidTerm, Evaluation, RuleExpression};

fn describe(terms: &[DoidTerm]) -> String {
    let terms: Vec<&str> = terms.iter().map(|t| t.term.as_str()).collect();
    terms.join(" or ")
}

fn matches_any(doid_model: &DoidModel, condition: &PriorCondition, doids: &[String]) -> bool {
    doids
        .iter()
        .any(|doid| doid_model.is_of_type(&condition.doids, doid))
}

struct HasHistoryOfCondition {
    doid_model: Arc<DoidModel>,
    terms: Vec<DoidTerm>,
}

impl EvaluationFunction for HasHistoryOfCondition {
    fn evaluate(&self, record: &PatientRecord) -> Evaluation {
        let doids: Vec<String> = self.terms.iter().map(|t| t.doid.clone()).collect();
        let matching: Vec<&str> = record
            .prior_conditions
            .iter()
            .filter(|condition| matches_any(&self.doid_model, condition, &doids))
            .map(|condition| condition.name.as_str())
            .collect();

        if matching.is_empty() {
            Evaluation::fail(
                format!("Patient has no history of {}", describe(&self.terms)),
                "No relevant condition history",
            )
        } else {
            Evaluation::pass(
                format!("Patient has history of {}", matching.join(", ")),
                "Relevant condition history",
            )
        }
    }
}

/// A matching condition within the last `years`. The condition year alone
/// cannot place a condition exactly `years` ago inside or outside the window.
struct HasConditionWithinYears {
    doid_model: Arc<DoidModel>,
    doids: Vec<String>,
    description: String,
    years: i32,
    reference_year: i32,
}

impl EvaluationFunction for HasConditionWithinYears {
    fn evaluate(&self, record: &PatientRecord) -> Evaluation {
        let min_year = self.reference_year - self.years;
        let mut undetermined = Vec::new();

        for condition in &record.prior_conditions {
            if !matches_any(&self.doid_model, condition, &self.doids) {
                continue;
            }
            match condition.year {
                Some(year) if year > min_year => {
                    return Evaluation::pass(
                        format!(
                            "Patient has had {} within the last {} years",
                            condition.name, self.years
                        ),
                        format!("Recent {}", self.description),
                    );
                }
                Some(year) if year < min_year => {}
                _ => undetermined.push(condition.name.as_str()),
            }
        }

        if undetermined.is_empty() {
            Evaluation::fail(
                format!(
                    "Patient has had no {} within the last {} years",
                    self.description, self.years
                ),
                format!("No recent {}", self.description),
            )
        } else {
            Evaluation::undetermined(
                format!(
                    "Unable to determine whether {} occurred within the last {} years",
                    undetermined.join(", "),
                    self.years
                ),
                format!("Undetermined recent {}", self.description),
            )
        }
    }
}

pub(super) fn has_history_of_condition_with_doid_term(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    let term = context.resolver().create_one_doid_term_input(expression)?;
    Ok(Arc::new(HasHistoryOfCondition {
        doid_model: Arc::clone(context.doid_model()),
        terms: vec![term],
    }))
}

pub(super) fn has_history_of_condition_with_any_doid_term(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    let terms = context.resolver().create_many_doid_terms_input(expression)?;
    Ok(Arc::new(HasHistoryOfCondition {
        doid_model: Arc::clone(context.doid_model()),
        terms,
    }))
}

pub(super) fn has_had_condition_with_any_doid_term_within_years(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    let (years, terms) = context
        .resolver()
        .create_one_integer_many_doid_terms_input(expression)?;
    Ok(Arc::new(HasConditionWithinYears {
        doid_model: Arc::clone(context.doid_model()),
        doids: terms.iter().map(|t| t.doid.clone()).collect(),
        description: describe(&terms),
        years,
        reference_year: context.config().reference_year(),
    }))
}

pub(super) fn has_history_of_second_malignancy_within_years(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    let years = context.resolver().create_one_integer_input(expression)?;
    Ok(Arc::new(HasConditionWithinYears {
        doid_model: Arc::clone(context.doid_model()),
        doids: vec![CANCER_DOID.to_string()],
        description: "second malignancy".to_string(),
        years,
        reference_year: context.config().reference_year(),
    }))
}
