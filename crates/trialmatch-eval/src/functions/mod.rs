//! Standard rule creators
//!
//! [`creator_for`] is the single exhaustive dispatch from the rule catalogue
//! to evaluation logic. Adding a rule without a creator does not compile.

mod conditions;
mod general;
mod laboratory;
mod molecular;
mod treatment;
mod tumor;

use crate::composite::{And, Fallback, Or, Unary};
use crate::context::RuleContext;
use crate::function::SharedFunction;
use crate::registry::RuleCreator;
use std::sync::Arc;
use trialmatch_diagnostics::{Result, TM0103, TrialMatchError};
use trialmatch_types::{CompositeArity, Evaluation, Rule, RuleExpression};

type LeafFn = fn(&RuleExpression, &RuleContext) -> Result<SharedFunction>;

fn leaf(create: LeafFn) -> RuleCreator {
    RuleCreator::leaf(create)
}

/// Evaluation of a yes/no record field; `None` is UNDETERMINED
pub(crate) fn from_flag(value: Option<bool>, pass: &str, fail: &str, unknown: &str) -> Evaluation {
    match value {
        Some(true) => Evaluation::pass(pass, pass),
        Some(false) => Evaluation::fail(fail, fail),
        None => Evaluation::undetermined(unknown, unknown),
    }
}

fn exactly<const N: usize>(rule: Rule, children: Vec<SharedFunction>) -> Result<[SharedFunction; N]> {
    <[SharedFunction; N]>::try_from(children).map_err(|children| {
        let arity = match N {
            1 => CompositeArity::ExactlyOne,
            _ => CompositeArity::ExactlyTwo,
        };
        TrialMatchError::configuration(
            TM0103,
            format!("{} expects {}, got {}", rule.name(), arity, children.len()),
        )
    })
}

fn at_least_two(rule: Rule, children: Vec<SharedFunction>) -> Result<Vec<SharedFunction>> {
    if CompositeArity::AtLeastTwo.accepts(children.len()) {
        Ok(children)
    } else {
        Err(TrialMatchError::configuration(
            TM0103,
            format!(
                "{} expects {}, got {}",
                rule.name(),
                CompositeArity::AtLeastTwo,
                children.len()
            ),
        ))
    }
}

fn unary(rule: Rule, wrap: fn(SharedFunction) -> Unary) -> RuleCreator {
    RuleCreator::composite(move |children| {
        let [child] = exactly::<1>(rule, children)?;
        Ok(Arc::new(wrap(child)))
    })
}

/// Creator of the standard evaluation logic for `rule`
pub(crate) fn creator_for(rule: Rule) -> RuleCreator {
    match rule {
        Rule::And => RuleCreator::composite(|children| {
            Ok(Arc::new(And::new(at_least_two(Rule::And, children)?)))
        }),
        Rule::Or => RuleCreator::composite(|children| {
            Ok(Arc::new(Or::new(at_least_two(Rule::Or, children)?)))
        }),
        Rule::Not => unary(rule, Unary::not),
        Rule::WarnIf => unary(rule, Unary::warn_if),
        Rule::WarnOnPass => unary(rule, Unary::warn_on_pass),
        Rule::WarnOnFail => unary(rule, Unary::warn_on_fail),
        Rule::Fallback => RuleCreator::composite(|children| {
            let [primary, secondary] = exactly::<2>(Rule::Fallback, children)?;
            Ok(Arc::new(Fallback::new(primary, secondary)))
        }),

        Rule::IsAtLeastXYearsOld => leaf(general::is_at_least_x_years_old),
        Rule::IsAtMostXYearsOld => leaf(general::is_at_most_x_years_old),
        Rule::IsMale => leaf(general::is_male),
        Rule::IsFemale => leaf(general::is_female),
        Rule::HasWhoStatusOfAtMostX => leaf(general::has_who_status_of_at_most_x),
        Rule::HasWhoStatusOfAtExactlyX => leaf(general::has_who_status_of_exactly_x),
        Rule::HasWhoStatusOfAnyOfX => leaf(general::has_who_status_of_any_of_x),
        Rule::CanGiveAdequateInformedConsent => leaf(general::can_give_adequate_informed_consent),
        Rule::HasActiveInfection => leaf(general::has_active_infection),
        Rule::IsPregnant => leaf(general::is_pregnant),
        Rule::HasAdequateVenousAccess => leaf(general::has_adequate_venous_access),

        Rule::HasSolidPrimaryTumor => leaf(tumor::has_solid_primary_tumor),
        Rule::HasPrimaryTumorBelongingToDoidTermX => leaf(tumor::has_primary_tumor_belonging_to_doid_term),
        Rule::HasPrimaryTumorBelongingToAnyDoidTermX => {
            leaf(tumor::has_primary_tumor_belonging_to_any_doid_term)
        }
        Rule::HasTumorStageX => leaf(tumor::has_tumor_stage),
        Rule::HasAnyStageX => leaf(tumor::has_any_stage),
        Rule::HasMeasurableDisease => leaf(tumor::has_measurable_disease),
        Rule::HasBrainMetastases => leaf(tumor::has_brain_metastases),
        Rule::HasKnownActiveCnsMetastases => leaf(tumor::has_known_active_cns_metastases),
        Rule::HasLiverMetastases => leaf(tumor::has_liver_metastases),
        Rule::HasBoneMetastases => leaf(tumor::has_bone_metastases),

        Rule::HasHistoryOfConditionWithDoidTermX => leaf(conditions::has_history_of_condition_with_doid_term),
        Rule::HasHistoryOfConditionWithAnyDoidTermX => {
            leaf(conditions::has_history_of_condition_with_any_doid_term)
        }
        Rule::HasHadConditionWithAnyDoidTermYWithinXYears => {
            leaf(conditions::has_had_condition_with_any_doid_term_within_years)
        }
        Rule::HasHistoryOfSecondMalignancyWithinXYears => {
            leaf(conditions::has_history_of_second_malignancy_within_years)
        }

        Rule::HasHadTreatmentNameX => leaf(treatment::has_had_treatment_name),
        Rule::HasHadTreatmentWithAnyNameX => leaf(treatment::has_had_treatment_with_any_name),
        Rule::HasHadTreatmentWithAnyNameYWithinXYears => {
            leaf(treatment::has_had_treatment_with_any_name_within_years)
        }
        Rule::HasHadAtLeastXCyclesOfTreatmentNameY => leaf(treatment::has_had_at_least_cycles_of_treatment),
        Rule::HasHadCategoryXTreatment => leaf(treatment::has_had_category_treatment),
        Rule::HasHadCategoryXTreatmentOfAtLeastYLines => {
            leaf(treatment::has_had_category_treatment_of_at_least_lines)
        }
        Rule::HasHadCategoryXTreatmentOfAtMostYLines => {
            leaf(treatment::has_had_category_treatment_of_at_most_lines)
        }
        Rule::HasHadAtLeastXSystemicTreatmentLines => leaf(treatment::has_had_at_least_systemic_lines),
        Rule::HasHadAtMostXSystemicTreatmentLines => leaf(treatment::has_had_at_most_systemic_lines),
        Rule::HasHadSystemicTreatmentLinesBetweenXAndY => leaf(treatment::has_had_systemic_lines_between),

        Rule::HasHemoglobinGPerDlOfAtLeastX => leaf(laboratory::has_hemoglobin_of_at_least),
        Rule::HasThrombocytesAbsOfAtLeastX => leaf(laboratory::has_thrombocytes_of_at_least),
        Rule::HasNeutrophilsAbsOfAtLeastX => leaf(laboratory::has_neutrophils_of_at_least),
        Rule::HasAlbuminGPerDlOfAtLeastX => leaf(laboratory::has_albumin_of_at_least),
        Rule::HasAsatUlnOfAtMostX => leaf(laboratory::has_asat_uln_of_at_most),
        Rule::HasAlatUlnOfAtMostX => leaf(laboratory::has_alat_uln_of_at_most),
        Rule::HasTotalBilirubinUlnOfAtMostX => leaf(laboratory::has_total_bilirubin_uln_of_at_most),
        Rule::HasCreatinineUlnOfAtMostX => leaf(laboratory::has_creatinine_uln_of_at_most),
        Rule::HasPotassiumMmolPerLBetweenXAndY => leaf(laboratory::has_potassium_between),

        Rule::MolecularResultsMustBeAvailable => leaf(molecular::molecular_results_must_be_available),
        Rule::ActivatingMutationInGeneX => leaf(molecular::activating_mutation_in_gene),
        Rule::ActivatingMutationInAnyGenesX => leaf(molecular::activating_mutation_in_any_genes),
        Rule::MutationInGeneXOfAnyCodonY => leaf(molecular::mutation_in_gene_of_any_codon),
        Rule::MutationInGeneXOfAnyProteinImpactsY => leaf(molecular::mutation_in_gene_of_any_protein_impact),
        Rule::AmplificationOfGeneX => leaf(molecular::amplification_of_gene),
        Rule::AmplificationOfGeneXOfAtLeastYCopies => leaf(molecular::amplification_of_gene_of_at_least_copies),
        Rule::InactivationOfGeneX => leaf(molecular::inactivation_of_gene),
        Rule::FusionInGeneX => leaf(molecular::fusion_in_gene),
        Rule::HasHlaTypeX => leaf(molecular::has_hla_type),
        Rule::MsiSignature => leaf(molecular::msi_signature),
        Rule::HrdSignature => leaf(molecular::hrd_signature),
        Rule::TmbOfAtLeastX => leaf(molecular::tmb_of_at_least),
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{evaluate, record};
    use super::*;
    use pretty_assertions::assert_eq;
    use trialmatch_types::EvaluationResult;

    #[test]
    fn test_every_rule_has_matching_creator_kind() {
        for rule in Rule::ALL {
            assert_eq!(creator_for(*rule).is_composite(), rule.is_composite(), "{}", rule);
        }
    }

    #[test]
    fn test_from_flag() {
        assert_eq!(from_flag(Some(true), "yes", "no", "?").result(), EvaluationResult::Pass);
        assert_eq!(from_flag(Some(false), "yes", "no", "?").result(), EvaluationResult::Fail);
        let unknown = from_flag(None, "yes", "no", "?");
        assert_eq!(unknown.result(), EvaluationResult::Undetermined);
        assert!(unknown.specific_messages().contains("?"));
    }

    #[test]
    fn test_composites_through_registry() {
        let record = record();
        assert_eq!(evaluate("NOT(IS_MALE)", &record).result(), EvaluationResult::Pass);
        assert_eq!(evaluate("WARN_IF(IS_FEMALE)", &record).result(), EvaluationResult::Warn);
        assert_eq!(
            evaluate("FALLBACK(HAS_MEASURABLE_DISEASE, IS_FEMALE)", &record).result(),
            EvaluationResult::Pass
        );
        assert_eq!(
            evaluate("OR(IS_MALE, CAN_GIVE_ADEQUATE_INFORMED_CONSENT)", &record).result(),
            EvaluationResult::NotEvaluated
        );
    }
}
