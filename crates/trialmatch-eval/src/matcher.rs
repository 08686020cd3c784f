//! Trial level matching
//!
//! A [`Trial`] is compiled once into a [`CompiledTrial`] holding the
//! evaluators of all its criteria. A compiled trial is immutable and can be
//! shared across threads to evaluate many patients.

use crate::engine::EligibilityEngine;
use crate::function::SharedFunction;
use indexmap::IndexMap;
use log::debug;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use trialmatch_diagnostics::{Result, TM0303, TrialMatchError};
use trialmatch_model::PatientRecord;
use trialmatch_types::{
    CohortMetadata, CriterionReference, Eligibility, Evaluation, EvaluationResult, Trial,
    TrialIdentification,
};

struct CompiledCriterion {
    label: String,
    references: Vec<CriterionReference>,
    function: SharedFunction,
}

impl CompiledCriterion {
    fn evaluate(&self, record: &PatientRecord) -> CriterionEvaluation {
        CriterionEvaluation {
            references: self.references.clone(),
            evaluation: self.function.evaluate(record),
        }
    }
}

fn evaluate_all(
    criteria: &[CompiledCriterion],
    record: &PatientRecord,
) -> IndexMap<String, CriterionEvaluation> {
    criteria
        .iter()
        .map(|criterion| (criterion.label.clone(), criterion.evaluate(record)))
        .collect()
}

/// No criterion failed beyond recovery
fn is_potentially_eligible(evaluations: &IndexMap<String, CriterionEvaluation>) -> bool {
    evaluations.values().all(|criterion| {
        let evaluation = &criterion.evaluation;
        evaluation.result() != EvaluationResult::Fail || evaluation.is_recoverable()
    })
}

/// Evaluation of one curated criterion
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CriterionEvaluation {
    pub references: Vec<CriterionReference>,
    pub evaluation: Evaluation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortMatch {
    pub cohort_id: String,
    pub description: String,
    pub open: bool,
    pub is_potentially_eligible: bool,
    pub evaluations: IndexMap<String, CriterionEvaluation>,
}

/// Outcome of matching one patient against one trial
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialMatch {
    pub trial_id: String,
    pub acronym: String,
    pub patient_id: String,
    pub is_potentially_eligible: bool,
    pub evaluations: IndexMap<String, CriterionEvaluation>,
    pub cohorts: Vec<CohortMatch>,
}

impl TrialMatch {
    /// Number of criteria per result, trial-wide and cohort criteria together
    pub fn result_counts(&self) -> BTreeMap<EvaluationResult, usize> {
        let mut counts = BTreeMap::new();
        let all = self
            .evaluations
            .values()
            .chain(self.cohorts.iter().flat_map(|c| c.evaluations.values()));
        for criterion in all {
            *counts.entry(criterion.evaluation.result()).or_insert(0) += 1;
        }
        counts
    }
}

/// A trial with evaluators built for all of its criteria
pub struct CompiledTrial {
    identification: TrialIdentification,
    general: Vec<CompiledCriterion>,
    cohorts: Vec<(CohortMetadata, Vec<CompiledCriterion>)>,
}

impl CompiledTrial {
    pub fn identification(&self) -> &TrialIdentification {
        &self.identification
    }

    pub fn criterion_count(&self) -> usize {
        self.general.len() + self.cohorts.iter().map(|(_, c)| c.len()).sum::<usize>()
    }

    /// Evaluate a patient against every criterion of the trial
    ///
    /// A cohort is potentially eligible when it is open and neither its own
    /// nor the trial-wide criteria fail beyond recovery. The trial is
    /// potentially eligible when its trial-wide criteria pass that test and
    /// it either has no cohorts or at least one eligible cohort.
    pub fn evaluate(&self, record: &PatientRecord) -> TrialMatch {
        let evaluations = evaluate_all(&self.general, record);
        let general_eligible = is_potentially_eligible(&evaluations);

        let cohorts: Vec<CohortMatch> = self
            .cohorts
            .iter()
            .map(|(metadata, criteria)| {
                let evaluations = evaluate_all(criteria, record);
                CohortMatch {
                    cohort_id: metadata.cohort_id.clone(),
                    description: metadata.description.clone(),
                    open: metadata.open,
                    is_potentially_eligible: metadata.open
                        && general_eligible
                        && is_potentially_eligible(&evaluations),
                    evaluations,
                }
            })
            .collect();

        let is_potentially_eligible = general_eligible
            && (cohorts.is_empty() || cohorts.iter().any(|c| c.is_potentially_eligible));
        debug!(
            "{} for {}: potentially eligible {}",
            self.identification.trial_id, record.patient_id, is_potentially_eligible
        );

        TrialMatch {
            trial_id: self.identification.trial_id.clone(),
            acronym: self.identification.acronym.clone(),
            patient_id: record.patient_id.clone(),
            is_potentially_eligible,
            evaluations,
            cohorts,
        }
    }
}

/// Compiles trials with an [`EligibilityEngine`] and matches patients
pub struct TrialMatcher {
    engine: EligibilityEngine,
}

impl TrialMatcher {
    pub fn new(engine: EligibilityEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &EligibilityEngine {
        &self.engine
    }

    /// Build evaluators for all criteria of a trial
    ///
    /// Errors are reported for every failing criterion, each labelled with
    /// its reference ids. Results are keyed by label, so a criterion without
    /// references or with a label already used in the trial is rejected.
    pub fn compile(&self, trial: &Trial) -> Result<CompiledTrial> {
        let mut errors = Vec::new();
        let mut labels = HashSet::new();

        let general = self.compile_all(&trial.general_eligibility, &mut labels, &mut errors);
        let cohorts = trial
            .cohorts
            .iter()
            .map(|cohort| {
                (
                    cohort.metadata.clone(),
                    self.compile_all(&cohort.eligibility, &mut labels, &mut errors),
                )
            })
            .collect();

        match errors.len() {
            0 => Ok(CompiledTrial {
                identification: trial.identification.clone(),
                general,
                cohorts,
            }),
            1 => Err(errors.remove(0)),
            _ => Err(TrialMatchError::Multiple(errors)),
        }
    }

    fn compile_all(
        &self,
        criteria: &[Eligibility],
        labels: &mut HashSet<String>,
        errors: &mut Vec<TrialMatchError>,
    ) -> Vec<CompiledCriterion> {
        let mut compiled = Vec::with_capacity(criteria.len());
        for eligibility in criteria {
            let label = eligibility.label();
            if label.is_empty() {
                errors.push(TrialMatchError::data(
                    TM0303,
                    format!("criterion {} has no protocol reference", eligibility.function),
                ));
                continue;
            }
            if !labels.insert(label.clone()) {
                errors.push(
                    TrialMatchError::data(
                        TM0303,
                        format!("label '{}' is used by more than one criterion", label),
                    )
                    .with_context(label),
                );
                continue;
            }
            match self.engine.build(&eligibility.function) {
                Ok(function) => compiled.push(CompiledCriterion {
                    label,
                    references: eligibility.references.clone(),
                    function,
                }),
                Err(err) => errors.push(err.with_context(label)),
            }
        }
        compiled
    }

    /// Compile and evaluate in one go
    pub fn evaluate(&self, trial: &Trial, record: &PatientRecord) -> Result<TrialMatch> {
        Ok(self.compile(trial)?.evaluate(record))
    }
}
