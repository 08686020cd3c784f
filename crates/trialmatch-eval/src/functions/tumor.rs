//! Primary tumor type, stage and lesions

use super::from_flag;
use crate::context::RuleContext;
use crate::function::{EvaluationFunction, SharedFunction};
use std::collections::BTreeSet;
use std::sync::Arc;
use trialmatch_diagnostics::Result;
use trialmatch_doid::DoidModel;
use trialmatch_doid::constants::{
    BENIGN_NEOPLASM_DOID, CANCER_DOID, HEMATOLOGIC_CANCER_DOID, UNSPECIFIC_TUMOR_DOIDS,
};
use trialmatch_model::{PatientRecord, TumorDetails};
use trialmatch_types::{DoidTerm, Evaluation, EvaluationResult, RuleExpression, TumorStage};

/// Tumor DOIDs of a record; `None` when unknown or empty
fn tumor_doids(record: &PatientRecord) -> Option<&BTreeSet<String>> {
    record.tumor.doids.as_ref().filter(|doids| !doids.is_empty())
}

fn unknown_tumor_type() -> Evaluation {
    Evaluation::undetermined("Tumor type of patient is unknown", "Unknown tumor type")
}

struct HasSolidPrimaryTumor {
    doid_model: Arc<DoidModel>,
}

impl EvaluationFunction for HasSolidPrimaryTumor {
    fn evaluate(&self, record: &PatientRecord) -> Evaluation {
        let Some(doids) = tumor_doids(record) else {
            return unknown_tumor_type();
        };
        let result = self.doid_model.is_exclusively_of_type(
            doids,
            CANCER_DOID,
            &[HEMATOLOGIC_CANCER_DOID, BENIGN_NEOPLASM_DOID],
            &[],
        );
        match result {
            EvaluationResult::Pass
                if doids.iter().all(|doid| UNSPECIFIC_TUMOR_DOIDS.contains(&doid.as_str())) =>
            {
                Evaluation::warn(
                    "Patient has cancer of unspecified type, assumed to be solid",
                    "Unspecified cancer type",
                )
            }
            EvaluationResult::Pass => {
                Evaluation::pass("Patient has a solid primary tumor", "Solid primary tumor")
            }
            _ => Evaluation::fail(
                "Patient does not have a solid primary tumor",
                "No solid primary tumor",
            ),
        }
    }
}

/// Primary tumor belongs to at least one of the given DOID terms
///
/// | tumor doids                                          | result |
/// |------------------------------------------------------|--------|
/// | unknown                                              | UND    |
/// | some doid under a target                             | PASS   |
/// | adeno-squamous type whose adeno or squamous part is a target | WARN |
/// | some doid is an ancestor of a target                 | UND    |
/// | some doid shares a main cancer type with a target    | WARN   |
/// | otherwise                                            | FAIL   |
struct PrimaryTumorBelongsTo {
    doid_model: Arc<DoidModel>,
    terms: Vec<DoidTerm>,
}

impl PrimaryTumorBelongsTo {
    fn describe_terms(&self) -> String {
        let terms: Vec<&str> = self.terms.iter().map(|t| t.term.as_str()).collect();
        terms.join(" or ")
    }

    fn is_potential_adeno_squamous(&self, doids: &BTreeSet<String>, term: &DoidTerm) -> bool {
        self.doid_model
            .adeno_squamous_mappings_for_doid(&term.doid)
            .iter()
            .any(|mapping| self.doid_model.is_of_type(doids, &mapping.adeno_squamous_doid))
    }

    fn is_ancestor_of_target(&self, doids: &BTreeSet<String>, term: &DoidTerm) -> bool {
        let target_closure = self.doid_model.doid_with_parents(&term.doid);
        doids
            .iter()
            .any(|doid| doid != &term.doid && target_closure.contains(doid))
    }

    /// Main cancer types of the target that the tumor belongs to as well
    fn shared_main_cancer_type(&self, doids: &BTreeSet<String>, term: &DoidTerm) -> Option<String> {
        self.doid_model
            .main_cancer_doids(&term.doid)
            .into_iter()
            .find(|main| self.doid_model.is_of_type(doids, main))
    }
}

impl EvaluationFunction for PrimaryTumorBelongsTo {
    fn evaluate(&self, record: &PatientRecord) -> Evaluation {
        let Some(doids) = tumor_doids(record) else {
            return unknown_tumor_type();
        };

        if let Some(term) = self
            .terms
            .iter()
            .find(|term| self.doid_model.is_of_type(doids, &term.doid))
        {
            return Evaluation::pass(
                format!("Patient has {}", term.term),
                format!("Tumor type {}", term.term),
            );
        }

        if let Some(term) = self
            .terms
            .iter()
            .find(|term| self.is_potential_adeno_squamous(doids, term))
        {
            return Evaluation::warn(
                format!("Patient has adenosquamous tumor type, possibly {}", term.term),
                format!("Tumor type possibly {}", term.term),
            );
        }

        if self.terms.iter().any(|term| self.is_ancestor_of_target(doids, term)) {
            return Evaluation::undetermined(
                format!(
                    "Unable to determine whether tumor type is {}",
                    self.describe_terms()
                ),
                "Undetermined tumor type",
            );
        }

        if let Some((term, main)) = self.terms.iter().find_map(|term| {
            self.shared_main_cancer_type(doids, term)
                .map(|main| (term, main))
        }) {
            let main_term = self
                .doid_model
                .resolve_term_for_doid(&main)
                .unwrap_or(main.as_str());
            return Evaluation::warn(
                format!(
                    "Patient has {} but of another type than {}",
                    main_term, term.term
                ),
                format!("Tumor type possibly {}", term.term),
            );
        }

        Evaluation::fail(
            format!("Patient has no {}", self.describe_terms()),
            "Wrong tumor type",
        )
    }
}

/// Stage within any of the given stages; a main stage that only might be a
/// required sub-stage is UNDETERMINED.
struct HasAnyStage {
    stages: Vec<TumorStage>,
}

impl HasAnyStage {
    fn describe(&self) -> String {
        let stages: Vec<&str> = self.stages.iter().map(|s| s.as_str()).collect();
        stages.join(" or ")
    }
}

impl EvaluationFunction for HasAnyStage {
    fn evaluate(&self, record: &PatientRecord) -> Evaluation {
        let Some(stage) = record.tumor.stage else {
            return Evaluation::undetermined("Tumor stage is unknown", "Unknown tumor stage");
        };
        if self.stages.iter().any(|target| stage.is_within(*target)) {
            Evaluation::pass(
                format!("Patient tumor stage {} is {}", stage, self.describe()),
                "Adequate tumor stage",
            )
        } else if self.stages.iter().any(|target| target.category() == stage && *target != stage) {
            Evaluation::undetermined(
                format!(
                    "Unable to determine whether stage {} is {}",
                    stage,
                    self.describe()
                ),
                "Undetermined tumor stage",
            )
        } else {
            Evaluation::fail(
                format!("Patient tumor stage {} is not {}", stage, self.describe()),
                "Inadequate tumor stage",
            )
        }
    }
}

/// Presence of a kind of lesion recorded as a yes/no field
struct HasLesion {
    field: fn(&TumorDetails) -> Option<bool>,
    name: &'static str,
}

impl EvaluationFunction for HasLesion {
    fn evaluate(&self, record: &PatientRecord) -> Evaluation {
        from_flag(
            (self.field)(&record.tumor),
            &format!("Patient has {}", self.name),
            &format!("Patient has no {}", self.name),
            &format!("Unknown whether patient has {}", self.name),
        )
    }
}

struct HasKnownActiveCnsMetastases;

impl EvaluationFunction for HasKnownActiveCnsMetastases {
    fn evaluate(&self, record: &PatientRecord) -> Evaluation {
        let tumor = &record.tumor;
        let present = [tumor.has_cns_lesions, tumor.has_brain_lesions];
        let active = [tumor.has_active_cns_lesions, tumor.has_active_brain_lesions];

        if active.contains(&Some(true)) {
            Evaluation::pass("Patient has active CNS metastases", "Active CNS metastases")
        } else if present.iter().all(|p| *p == Some(false)) {
            Evaluation::fail("Patient has no CNS metastases", "No CNS metastases")
        } else if present.contains(&Some(true)) && active.contains(&None) {
            Evaluation::undetermined(
                "Patient has CNS metastases, unknown whether active",
                "Undetermined CNS metastases activity",
            )
        } else if present.contains(&Some(true)) {
            Evaluation::fail(
                "Patient has CNS metastases that are not active",
                "No active CNS metastases",
            )
        } else {
            Evaluation::undetermined(
                "Unknown whether patient has CNS metastases",
                "Undetermined CNS metastases",
            )
        }
    }
}

pub(super) fn has_solid_primary_tumor(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    context.resolver().create_no_input(expression)?;
    Ok(Arc::new(HasSolidPrimaryTumor {
        doid_model: Arc::clone(context.doid_model()),
    }))
}

pub(super) fn has_primary_tumor_belonging_to_doid_term(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    let term = context.resolver().create_one_doid_term_input(expression)?;
    Ok(Arc::new(PrimaryTumorBelongsTo {
        doid_model: Arc::clone(context.doid_model()),
        terms: vec![term],
    }))
}

pub(super) fn has_primary_tumor_belonging_to_any_doid_term(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    let terms = context.resolver().create_many_doid_terms_input(expression)?;
    Ok(Arc::new(PrimaryTumorBelongsTo {
        doid_model: Arc::clone(context.doid_model()),
        terms,
    }))
}

pub(super) fn has_tumor_stage(expression: &RuleExpression, context: &RuleContext) -> Result<SharedFunction> {
    let stage = context.resolver().create_one_tumor_stage_input(expression)?;
    Ok(Arc::new(HasAnyStage { stages: vec![stage] }))
}

pub(super) fn has_any_stage(expression: &RuleExpression, context: &RuleContext) -> Result<SharedFunction> {
    let stages = context.resolver().create_many_tumor_stages_input(expression)?;
    Ok(Arc::new(HasAnyStage { stages }))
}

fn lesion(
    expression: &RuleExpression,
    context: &RuleContext,
    field: fn(&TumorDetails) -> Option<bool>,
    name: &'static str,
) -> Result<SharedFunction> {
    context.resolver().create_no_input(expression)?;
    Ok(Arc::new(HasLesion { field, name }))
}

pub(super) fn has_measurable_disease(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    lesion(expression, context, |t| t.has_measurable_disease, "measurable disease")
}

pub(super) fn has_brain_metastases(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    lesion(expression, context, |t| t.has_brain_lesions, "brain metastases")
}

pub(super) fn has_known_active_cns_metastases(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    context.resolver().create_no_input(expression)?;
    Ok(Arc::new(HasKnownActiveCnsMetastases))
}

pub(super) fn has_liver_metastases(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    lesion(expression, context, |t| t.has_liver_lesions, "liver metastases")
}

pub(super) fn has_bone_metastases(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    lesion(expression, context, |t| t.has_bone_lesions, "bone metastases")
}
