//! End-to-end eligibility scenarios
//!
//! Criteria are parsed from curated text, built with the standard registry
//! and evaluated against realistic patient records.

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};
use std::sync::Arc;
use trialmatch_diagnostics::{TM0102, TM0103, TM0106, TrialMatchError};
use trialmatch_doid::{DoidManualConfig, DoidModel, DoidNode};
use trialmatch_eval::{EligibilityEngine, EvaluationConfig, TrialMatcher};
use trialmatch_model::PatientRecord;
use trialmatch_parser::parse_criterion;
use trialmatch_types::{
    Cohort, CohortMetadata, CriterionReference, Eligibility, EvaluationResult, Trial,
    TrialIdentification,
};

const NSCLC_PATIENT: &str = r#"{
  "patientId": "ACTN-01-02-0001",
  "birthYear": 1958,
  "gender": "MALE",
  "clinicalStatus": { "who": 1, "hasActiveInfection": false },
  "tumor": {
    "doids": ["3910"],
    "stage": "IV",
    "hasMeasurableDisease": true,
    "hasBrainLesions": false,
    "hasCnsLesions": false
  },
  "priorConditions": [
    { "name": "Hypertension", "doids": ["10763"], "year": 2010 }
  ],
  "oncologicalHistory": [
    { "name": "Carboplatin", "categories": ["CHEMOTHERAPY"], "startYear": 2022, "stopYear": 2022, "numberOfCycles": 4 },
    { "name": "Pemetrexed", "categories": ["CHEMOTHERAPY"], "startYear": 2022, "stopYear": 2023 },
    { "name": "Pembrolizumab", "categories": ["IMMUNOTHERAPY"], "startYear": 2023 }
  ],
  "labValues": [
    { "date": "2024-05-15", "measurement": "HEMOGLOBIN", "value": 7.1, "unit": "mmol/L" },
    { "date": "2024-05-15", "measurement": "ASAT", "value": 35, "unit": "U/L", "refUpper": 40 },
    { "date": "2024-05-15", "measurement": "NEUTROPHILS_ABS", "value": 1.2, "unit": "10^9/L" }
  ],
  "molecular": {
    "date": "2024-01-10",
    "variants": [
      { "gene": "EGFR", "proteinImpact": "L858R", "isReportable": true, "driverLikelihood": "HIGH" }
    ],
    "tumorMutationalBurden": 4.2
  }
}"#;

#[fixture]
fn doid_model() -> Arc<DoidModel> {
    let model = DoidModel::builder()
        .node(DoidNode::new("14566", "disease of cellular proliferation"))
        .node(DoidNode::new("162", "cancer"))
        .node(DoidNode::new("0050686", "organ system cancer"))
        .node(DoidNode::new("1324", "lung cancer"))
        .node(DoidNode::new("3908", "lung non-small cell carcinoma").with_synonym("NSCLC"))
        .node(DoidNode::new("3910", "lung adenocarcinoma"))
        .node(DoidNode::new("1612", "breast cancer"))
        .node(DoidNode::new("10763", "hypertension"))
        .is_a("162", "14566")
        .is_a("0050686", "162")
        .is_a("1324", "0050686")
        .is_a("3908", "1324")
        .is_a("3910", "3908")
        .is_a("1612", "0050686")
        .manual_config(DoidManualConfig::default())
        .build()
        .unwrap();
    Arc::new(model)
}

#[fixture]
fn engine(doid_model: Arc<DoidModel>) -> EligibilityEngine {
    let config = EvaluationConfig::default()
        .with_reference_date(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
    EligibilityEngine::new(doid_model, config).unwrap()
}

fn patient() -> PatientRecord {
    PatientRecord::from_json(NSCLC_PATIENT).unwrap()
}

fn evaluate(engine: &EligibilityEngine, criterion: &str) -> EvaluationResult {
    let expression = parse_criterion(criterion).unwrap();
    engine.evaluate(&expression, &patient()).unwrap().result()
}

#[rstest]
#[case("HAS_PRIMARY_TUMOR_BELONGING_TO_DOID_TERM_X[NSCLC]", EvaluationResult::Pass)]
#[case("HAS_PRIMARY_TUMOR_BELONGING_TO_ANY_DOID_TERM_X[breast cancer;lung cancer]", EvaluationResult::Pass)]
#[case("HAS_SOLID_PRIMARY_TUMOR", EvaluationResult::Pass)]
#[case("HAS_ANY_STAGE_X[III;IV]", EvaluationResult::Pass)]
#[case("HAS_MEASURABLE_DISEASE", EvaluationResult::Pass)]
#[case("NOT(HAS_BRAIN_METASTASES)", EvaluationResult::Pass)]
#[case("HAS_HEMOGLOBIN_G_PER_DL_OF_AT_LEAST_X[9]", EvaluationResult::Pass)]
#[case("HAS_ASAT_ULN_OF_AT_MOST_X[2.5]", EvaluationResult::Pass)]
#[case("HAS_NEUTROPHILS_ABS_OF_AT_LEAST_X[1.5]", EvaluationResult::Fail)]
#[case("HAS_HAD_AT_LEAST_X_SYSTEMIC_TREATMENT_LINES[2]", EvaluationResult::Pass)]
#[case("HAS_HAD_AT_LEAST_X_CYCLES_OF_TREATMENT_NAME_Y[4, carboplatin]", EvaluationResult::Pass)]
#[case("ACTIVATING_MUTATION_IN_GENE_X[EGFR]", EvaluationResult::Pass)]
#[case("MUTATION_IN_GENE_X_OF_ANY_CODON_Y[EGFR, L858;T790]", EvaluationResult::Pass)]
#[case("TMB_OF_AT_LEAST_X[10]", EvaluationResult::Fail)]
#[case("HAS_HISTORY_OF_SECOND_MALIGNANCY_WITHIN_X_YEARS[3]", EvaluationResult::Fail)]
#[case("HRD_SIGNATURE", EvaluationResult::Undetermined)]
#[case("FALLBACK(HRD_SIGNATURE, MSI_SIGNATURE)", EvaluationResult::Undetermined)]
#[case("WARN_ON_PASS(IS_MALE)", EvaluationResult::Warn)]
fn test_nsclc_patient(engine: EligibilityEngine, #[case] criterion: &str, #[case] expected: EvaluationResult) {
    assert_eq!(evaluate(&engine, criterion), expected, "{}", criterion);
}

#[rstest]
fn test_nested_criterion(engine: EligibilityEngine) {
    let criterion = "AND(IS_AT_LEAST_X_YEARS_OLD[18], HAS_WHO_STATUS_OF_AT_MOST_X[1], \
                     OR(HAS_HAD_CATEGORY_X_TREATMENT[TARGETED_THERAPY], ACTIVATING_MUTATION_IN_GENE_X[EGFR]), \
                     NOT(HAS_KNOWN_ACTIVE_CNS_METASTASES))";
    let expression = parse_criterion(criterion).unwrap();
    let evaluation = engine.evaluate(&expression, &patient()).unwrap();
    assert_eq!(evaluation.result(), EvaluationResult::Pass);
    assert!(evaluation.inclusion_events().contains("EGFR L858R"));
}

#[rstest]
fn test_build_errors_carry_rule_path(engine: EligibilityEngine) {
    let expression =
        parse_criterion("AND(IS_MALE, OR(IS_FEMALE, IS_AT_LEAST_X_YEARS_OLD[adult]))").unwrap();
    let err = engine.build(&expression).err().unwrap();
    assert_eq!(err.code(), TM0102);
    assert_eq!(
        err.path().map(ToString::to_string).as_deref(),
        Some("AND > OR#1 > IS_AT_LEAST_X_YEARS_OLD#1")
    );
    assert_eq!(engine.has_valid_inputs(&expression), Some(false));
}

#[rstest]
#[case("NOT(IS_MALE, IS_FEMALE)", TM0103)]
#[case("HAS_PRIMARY_TUMOR_BELONGING_TO_DOID_TERM_X[martian cancer]", TM0106)]
fn test_build_errors(engine: EligibilityEngine, #[case] criterion: &str, #[case] code: trialmatch_diagnostics::ErrorCode) {
    let expression = parse_criterion(criterion).unwrap();
    let err = engine.build(&expression).err().unwrap();
    assert_eq!(err.code(), code);
    assert!(err.is_configuration_error());
}

fn eligibility(id: &str, criterion: &str) -> Eligibility {
    Eligibility {
        references: vec![CriterionReference::new(id, criterion)],
        function: parse_criterion(criterion).unwrap(),
    }
}

fn lung_trial() -> Trial {
    Trial {
        identification: TrialIdentification {
            trial_id: "NCT04000001".into(),
            acronym: "LUNG-1".into(),
            title: "Second line treatment of advanced NSCLC".into(),
        },
        general_eligibility: vec![
            eligibility("I-01", "IS_AT_LEAST_X_YEARS_OLD[18]"),
            eligibility("I-02", "HAS_PRIMARY_TUMOR_BELONGING_TO_DOID_TERM_X[lung cancer]"),
            eligibility("I-03", "HAS_NEUTROPHILS_ABS_OF_AT_LEAST_X[1.5]"),
            eligibility("E-01", "NOT(HAS_ACTIVE_INFECTION)"),
        ],
        cohorts: vec![
            Cohort {
                metadata: CohortMetadata {
                    cohort_id: "EGFR".into(),
                    description: "EGFR mutant".into(),
                    open: true,
                },
                eligibility: vec![eligibility("C-01", "ACTIVATING_MUTATION_IN_GENE_X[EGFR]")],
            },
            Cohort {
                metadata: CohortMetadata {
                    cohort_id: "TMB".into(),
                    description: "TMB high".into(),
                    open: true,
                },
                eligibility: vec![eligibility("C-02", "TMB_OF_AT_LEAST_X[10]")],
            },
        ],
    }
}

#[rstest]
fn test_trial_match(engine: EligibilityEngine) {
    let matcher = TrialMatcher::new(engine);
    let result = matcher.evaluate(&lung_trial(), &patient()).unwrap();

    // neutrophils fail recoverably and do not exclude
    let neutrophils = &result.evaluations["I-03"].evaluation;
    assert_eq!(neutrophils.result(), EvaluationResult::Fail);
    assert!(neutrophils.is_recoverable());

    let cohorts: Vec<(&str, bool)> = result
        .cohorts
        .iter()
        .map(|c| (c.cohort_id.as_str(), c.is_potentially_eligible))
        .collect();
    assert_eq!(cohorts, vec![("EGFR", true), ("TMB", false)]);
    assert!(result.is_potentially_eligible);

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["trialId"], "NCT04000001");
    assert_eq!(json["cohorts"][0]["isPotentiallyEligible"], true);
}

#[rstest]
fn test_compiled_trial_is_shared_across_threads(engine: EligibilityEngine) {
    let matcher = TrialMatcher::new(engine);
    let compiled = Arc::new(matcher.compile(&lung_trial()).unwrap());
    assert_eq!(compiled.criterion_count(), 6);

    let expected = compiled.evaluate(&patient());
    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let compiled = Arc::clone(&compiled);
                scope.spawn(move || compiled.evaluate(&patient()))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for result in results {
        assert_eq!(result, expected);
    }
}

#[rstest]
fn test_compile_reports_every_broken_criterion(engine: EligibilityEngine) {
    let mut trial = lung_trial();
    trial.general_eligibility.push(eligibility("I-04", "IS_MALE[yes]"));
    trial.cohorts[0].eligibility.push(eligibility("C-03", "AND(IS_MALE)"));

    let matcher = TrialMatcher::new(engine);
    match matcher.compile(&trial).err().unwrap() {
        TrialMatchError::Multiple(errors) => {
            let labels: Vec<Option<&str>> = errors.iter().map(|e| e.context()).collect();
            assert_eq!(labels, vec![Some("I-04"), Some("C-03")]);
        }
        other => panic!("expected two errors, got {}", other),
    }
}
