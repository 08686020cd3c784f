//! Trial protocol files
//!
//! A protocol file is the curated form of a trial: identification, the
//! trial-wide criteria and the cohorts with their own criteria. Criteria
//! are stored as text and parsed when the file is turned into a [`Trial`].
//!
//! ```json
//! {
//!   "trialId": "NCT00000001",
//!   "acronym": "LUNG-1",
//!   "title": "Targeted therapy in NSCLC",
//!   "generalEligibility": [
//!     { "references": [{ "id": "I-01", "text": "Age >= 18" }],
//!       "criterion": "IS_AT_LEAST_X_YEARS_OLD[18]" }
//!   ],
//!   "cohorts": [
//!     { "cohortId": "A", "description": "EGFR", "open": true, "eligibility": [] }
//!   ]
//! }
//! ```

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use trialmatch_diagnostics::{
    Diagnostic, Result, TM0108, TM0303, TM0406, TrialMatchError,
};
use trialmatch_eval::EligibilityEngine;
use trialmatch_parser::parse_criterion;
use trialmatch_types::{
    Cohort, CohortMetadata, CriterionReference, Eligibility, Trial, TrialIdentification,
};

/// A criterion as written in a protocol file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionEntry {
    pub references: Vec<CriterionReference>,
    pub criterion: String,
}

impl CriterionEntry {
    pub fn label(&self) -> String {
        let ids: Vec<&str> = self.references.iter().map(|r| r.id.as_str()).collect();
        ids.join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortEntry {
    pub cohort_id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "open_by_default")]
    pub open: bool,
    #[serde(default)]
    pub eligibility: Vec<CriterionEntry>,
}

fn open_by_default() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolFile {
    pub trial_id: String,
    #[serde(default)]
    pub acronym: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub general_eligibility: Vec<CriterionEntry>,
    #[serde(default)]
    pub cohorts: Vec<CohortEntry>,
}

impl ProtocolFile {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|err| {
            TrialMatchError::system(TM0406, format!("invalid protocol JSON: {}", err))
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|err| TrialMatchError::from(err).with_context(path.display().to_string()))?;
        Self::from_json(&json).map_err(|err| err.with_context(path.display().to_string()))
    }

    /// All criteria, trial-wide ones first
    pub fn criteria(&self) -> impl Iterator<Item = &CriterionEntry> {
        self.general_eligibility
            .iter()
            .chain(self.cohorts.iter().flat_map(|c| c.eligibility.iter()))
    }

    /// Structural problems: missing ids, unlabelled or duplicate references
    pub fn check(&self) -> Vec<TrialMatchError> {
        let mut errors = Vec::new();
        if self.trial_id.trim().is_empty() {
            errors.push(TrialMatchError::data(TM0303, "protocol has no trial id"));
        }

        let mut cohort_ids = HashSet::new();
        for cohort in &self.cohorts {
            if !cohort_ids.insert(cohort.cohort_id.as_str()) {
                errors.push(TrialMatchError::data(
                    TM0303,
                    format!("duplicate cohort id '{}'", cohort.cohort_id),
                ));
            }
        }

        let mut reference_ids = HashSet::new();
        for (index, entry) in self.criteria().enumerate() {
            if entry.references.is_empty() {
                errors.push(TrialMatchError::data(
                    TM0303,
                    format!("criterion #{} has no protocol reference", index + 1),
                ));
            }
            for reference in &entry.references {
                if !reference_ids.insert(reference.id.as_str()) {
                    errors.push(TrialMatchError::data(
                        TM0303,
                        format!("reference '{}' is used by more than one criterion", reference.id),
                    ));
                }
            }
        }
        errors
    }

    /// Parse every criterion and build the trial
    ///
    /// Errors of all criteria are collected; each carries the reference
    /// ids of the criterion it belongs to.
    pub fn into_trial(self) -> Result<Trial> {
        let mut errors = self.check();

        let general_eligibility = parse_all(&self.general_eligibility, &mut errors);
        let cohorts = self
            .cohorts
            .iter()
            .map(|cohort| Cohort {
                metadata: CohortMetadata {
                    cohort_id: cohort.cohort_id.clone(),
                    description: cohort.description.clone(),
                    open: cohort.open,
                },
                eligibility: parse_all(&cohort.eligibility, &mut errors),
            })
            .collect();

        match errors.len() {
            0 => {
                debug!("Loaded protocol {}", self.trial_id);
                Ok(Trial {
                    identification: TrialIdentification {
                        trial_id: self.trial_id,
                        acronym: self.acronym,
                        title: self.title,
                    },
                    general_eligibility,
                    cohorts,
                })
            }
            1 => Err(errors.remove(0)),
            _ => Err(TrialMatchError::Multiple(errors)),
        }
    }
}

/// Load a protocol file and build its trial
pub fn load_trial(path: impl AsRef<Path>) -> Result<Trial> {
    ProtocolFile::from_path(path)?.into_trial()
}

fn parse_all(entries: &[CriterionEntry], errors: &mut Vec<TrialMatchError>) -> Vec<Eligibility> {
    let mut parsed = Vec::with_capacity(entries.len());
    for entry in entries {
        match parse_criterion(&entry.criterion) {
            Ok(function) => parsed.push(Eligibility {
                references: entry.references.clone(),
                function,
            }),
            Err(err) => errors.push(label_error(err, &entry.label())),
        }
    }
    parsed
}

/// Attach a criterion label to an error
///
/// Parse errors carry no context field, so the label is prefixed to the
/// message instead.
fn label_error(err: TrialMatchError, label: &str) -> TrialMatchError {
    match err {
        TrialMatchError::Parse {
            code,
            message,
            criterion,
            location,
        } => TrialMatchError::Parse {
            code,
            message: format!("{}: {}", label, message),
            criterion,
            location,
        },
        TrialMatchError::Multiple(errors) => TrialMatchError::Multiple(
            errors.into_iter().map(|e| label_error(e, label)).collect(),
        ),
        other => other.with_context(label),
    }
}

/// One problem found while linting a protocol
#[derive(Debug, Clone, Serialize)]
pub struct LintFinding {
    /// Reference ids of the criterion, empty for trial-level findings
    pub label: String,
    pub diagnostic: Diagnostic,
}

impl LintFinding {
    fn new(label: impl Into<String>, diagnostic: Diagnostic) -> Self {
        Self {
            label: label.into(),
            diagnostic,
        }
    }

    pub fn is_error(&self) -> bool {
        self.diagnostic.severity == trialmatch_diagnostics::Severity::Error
    }
}

fn flatten(err: TrialMatchError, out: &mut Vec<TrialMatchError>) {
    match err {
        TrialMatchError::Multiple(errors) => {
            for err in errors {
                flatten(err, out);
            }
        }
        other => out.push(other),
    }
}

/// Check every criterion of a protocol without evaluating it
///
/// Criteria are parsed, their inputs checked against the catalogue shapes
/// and their evaluators built, which also resolves DOID terms.
pub fn lint_protocol(protocol: &ProtocolFile, engine: &EligibilityEngine) -> Vec<LintFinding> {
    let mut findings: Vec<LintFinding> = protocol
        .check()
        .into_iter()
        .map(|err| LintFinding::new("", err.to_diagnostic()))
        .collect();

    for cohort in protocol.cohorts.iter().filter(|c| !c.open) {
        findings.push(LintFinding::new(
            "",
            Diagnostic::warning(
                TM0303,
                format!("cohort '{}' is closed and never matches", cohort.cohort_id),
            ),
        ));
    }

    for entry in protocol.criteria() {
        let label = entry.label();
        let expression = match parse_criterion(&entry.criterion) {
            Ok(expression) => expression,
            Err(err) => {
                findings.push(LintFinding::new(label, err.to_diagnostic()));
                continue;
            }
        };

        if engine.has_valid_inputs(&expression).is_none() {
            findings.push(LintFinding::new(
                label.clone(),
                Diagnostic::warning(TM0108, "input shape of a rule cannot be verified"),
            ));
        }

        if let Err(err) = engine.build(&expression) {
            let mut errors = Vec::new();
            flatten(err, &mut errors);
            findings.extend(
                errors
                    .into_iter()
                    .map(|err| LintFinding::new(label.clone(), err.to_diagnostic())),
            );
        }
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use trialmatch_diagnostics::{TM0003, TM0101, TM0106};
    use trialmatch_doid::{DoidModel, DoidNode};
    use trialmatch_eval::EvaluationConfig;
    use trialmatch_types::Rule;

    const PROTOCOL: &str = r#"{
        "trialId": "NCT00000001",
        "acronym": "LUNG-1",
        "title": "Targeted therapy in NSCLC",
        "generalEligibility": [
            { "references": [{ "id": "I-01", "text": "Age >= 18" }],
              "criterion": "IS_AT_LEAST_X_YEARS_OLD[18]" },
            { "references": [{ "id": "I-02", "text": "NSCLC" }, { "id": "I-03", "text": "Stage IV" }],
              "criterion": "AND(HAS_PRIMARY_TUMOR_BELONGING_TO_DOID_TERM_X[lung cancer], HAS_ANY_STAGE_X[IV])" }
        ],
        "cohorts": [
            { "cohortId": "A", "description": "EGFR mutant",
              "eligibility": [
                { "references": [{ "id": "A-01", "text": "EGFR" }],
                  "criterion": "ACTIVATING_MUTATION_IN_GENE_X[EGFR]" }
              ] },
            { "cohortId": "B", "description": "Closed", "open": false }
        ]
    }"#;

    fn engine() -> EligibilityEngine {
        let model = DoidModel::builder()
            .node(DoidNode::new("162", "cancer"))
            .node(DoidNode::new("1324", "lung cancer"))
            .is_a("1324", "162")
            .build()
            .unwrap();
        EligibilityEngine::new(Arc::new(model), EvaluationConfig::default()).unwrap()
    }

    #[test]
    fn test_into_trial() {
        let trial = ProtocolFile::from_json(PROTOCOL).unwrap().into_trial().unwrap();
        assert_eq!(trial.identification.acronym, "LUNG-1");
        assert_eq!(trial.general_eligibility.len(), 2);
        assert_eq!(trial.general_eligibility[1].label(), "I-02, I-03");
        assert_eq!(trial.general_eligibility[1].function.rule, Rule::And);
        assert_eq!(trial.cohorts.len(), 2);
        assert!(trial.cohorts[0].metadata.open);
        assert!(!trial.cohorts[1].metadata.open);
        assert!(trial.cohorts[1].eligibility.is_empty());
    }

    #[test]
    fn test_parse_errors_are_labelled() {
        let mut protocol = ProtocolFile::from_json(PROTOCOL).unwrap();
        protocol.general_eligibility[0].criterion = "IS_OLD".to_string();
        protocol.cohorts[0].eligibility[0].criterion = "AND(IS_MALE".to_string();

        let err = protocol.into_trial().unwrap_err();
        let TrialMatchError::Multiple(errors) = err else {
            panic!("expected one error per criterion");
        };
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].code(), TM0003);
        assert!(errors[0].to_string().contains("I-01: "));
        assert!(errors[1].to_string().contains("A-01: "));
    }

    #[test]
    fn test_structural_checks() {
        let mut protocol = ProtocolFile::from_json(PROTOCOL).unwrap();
        protocol.trial_id = " ".to_string();
        protocol.cohorts[1].cohort_id = "A".to_string();
        protocol.cohorts[0].eligibility[0].references[0].id = "I-02".to_string();
        protocol.general_eligibility[0].references.clear();

        let errors = protocol.check();
        assert_eq!(errors.len(), 4);
        assert!(errors[3].to_string().contains("'I-02'"));
        assert!(errors.iter().all(|e| e.code() == TM0303));
    }

    #[test]
    fn test_invalid_json() {
        let err = ProtocolFile::from_json("{ \"acronym\": \"X\" }").unwrap_err();
        assert_eq!(err.code(), TM0406);
    }

    #[test]
    fn test_lint_clean_protocol_only_warns_about_closed_cohort() {
        let protocol = ProtocolFile::from_json(PROTOCOL).unwrap();
        let findings = lint_protocol(&protocol, &engine());
        assert_eq!(findings.len(), 1);
        assert!(!findings[0].is_error());
        assert!(findings[0].diagnostic.message.contains("'B'"));
    }

    #[test]
    fn test_lint_reports_build_errors_per_criterion() {
        let mut protocol = ProtocolFile::from_json(PROTOCOL).unwrap();
        protocol.cohorts.truncate(1);
        protocol.general_eligibility[0].criterion = "IS_AT_LEAST_X_YEARS_OLD".to_string();
        protocol.general_eligibility[1].criterion =
            "HAS_PRIMARY_TUMOR_BELONGING_TO_DOID_TERM_X[no such disease]".to_string();

        let findings = lint_protocol(&protocol, &engine());
        let codes: Vec<(String, String)> = findings
            .iter()
            .map(|f| (f.label.clone(), f.diagnostic.code.to_string()))
            .collect();
        assert_eq!(
            codes,
            vec![
                ("I-01".to_string(), TM0101.to_string()),
                ("I-02, I-03".to_string(), TM0106.to_string()),
            ]
        );
        assert!(findings.iter().all(LintFinding::is_error));
    }
}
