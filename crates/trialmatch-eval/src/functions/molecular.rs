//! Molecular test results
//!
//! Only reportable events count. A patient without a molecular test is
//! UNDETERMINED for every predicate except the availability check itself.

use super::from_flag;
use crate::context::RuleContext;
use crate::function::{EvaluationFunction, SharedFunction};
use chrono::NaiveDate;
use std::sync::Arc;
use trialmatch_diagnostics::Result;
use trialmatch_model::{DriverLikelihood, MolecularTest, PatientRecord};
use trialmatch_types::{Evaluation, EvaluationBuilder, EvaluationResult, RuleExpression};

/// Evaluates the molecular test of a record, if there is one
struct OnMolecularTest<F>(F);

impl<F> EvaluationFunction for OnMolecularTest<F>
where
    F: Fn(&MolecularTest) -> Evaluation + Send + Sync,
{
    fn evaluate(&self, record: &PatientRecord) -> Evaluation {
        match &record.molecular {
            Some(test) => (self.0)(test),
            None => Evaluation::undetermined(
                "No molecular test results available",
                "Molecular results missing",
            ),
        }
    }
}

fn on_test<F>(evaluate: F) -> SharedFunction
where
    F: Fn(&MolecularTest) -> Evaluation + Send + Sync + 'static,
{
    Arc::new(OnMolecularTest(evaluate))
}

fn with_event(result: EvaluationResult, message: String, event: String) -> Evaluation {
    EvaluationBuilder::new(result)
        .specific(message.clone())
        .general(message)
        .inclusion_event(event)
        .build()
}

fn without_protein_prefix(impact: &str) -> &str {
    impact.strip_prefix("p.").unwrap_or(impact)
}

struct MolecularResultsAvailable {
    reference_date: NaiveDate,
    max_age_days: Option<i64>,
}

impl EvaluationFunction for MolecularResultsAvailable {
    fn evaluate(&self, record: &PatientRecord) -> Evaluation {
        let Some(test) = &record.molecular else {
            return Evaluation::recoverable_fail(
                "No molecular test results available",
                "Molecular results missing",
            );
        };
        let Some(date) = test.date else {
            return Evaluation::warn(
                "Molecular test results available but the test date is unknown",
                "Molecular test date unknown",
            );
        };
        match self.max_age_days {
            Some(max_age) if (self.reference_date - date).num_days() > max_age => Evaluation::warn(
                format!("Molecular test of {} is older than {} days", date, max_age),
                "Molecular results outdated",
            ),
            _ => Evaluation::pass(
                format!("Molecular test results of {} available", date),
                "Molecular results available",
            ),
        }
    }
}

fn activating_mutation(test: &MolecularTest, genes: &[String]) -> Evaluation {
    let genes_desc = genes.join(" or ");
    let reportable = || {
        genes
            .iter()
            .flat_map(|gene| test.variants_in(gene))
            .filter(|variant| variant.is_reportable)
    };

    if let Some(variant) = reportable().find(|variant| variant.is_high_driver()) {
        return with_event(
            EvaluationResult::Pass,
            format!("Activating mutation {} detected", variant.event()),
            variant.event(),
        );
    }
    if let Some(variant) = reportable().next() {
        return with_event(
            EvaluationResult::Warn,
            format!(
                "Mutation {} detected but not known to be activating",
                variant.event()
            ),
            variant.event(),
        );
    }
    Evaluation::fail(
        format!("No activating mutation in {} detected", genes_desc),
        format!("No activating {} mutation", genes_desc),
    )
}

pub(super) fn molecular_results_must_be_available(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    context.resolver().create_no_input(expression)?;
    Ok(Arc::new(MolecularResultsAvailable {
        reference_date: context.config().reference_date,
        max_age_days: context.config().max_molecular_test_age_days,
    }))
}

pub(super) fn activating_mutation_in_gene(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    let gene = context.resolver().create_one_gene_input(expression)?;
    let genes = vec![gene];
    Ok(on_test(move |test| activating_mutation(test, &genes)))
}

pub(super) fn activating_mutation_in_any_genes(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    let genes = context.resolver().create_many_genes_input(expression)?;
    Ok(on_test(move |test| activating_mutation(test, &genes)))
}

pub(super) fn mutation_in_gene_of_any_codon(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    let (gene, codons) = context.resolver().create_one_gene_many_codons_input(expression)?;
    Ok(on_test(move |test| {
        let matching = test
            .variants_in(&gene)
            .filter(|variant| variant.is_reportable)
            .find(|variant| {
                variant
                    .codon()
                    .is_some_and(|codon| codons.iter().any(|c| c == codon))
            });
        match matching {
            Some(variant) => with_event(
                EvaluationResult::Pass,
                format!("Mutation {} in codon {} detected", variant.event(), codons.join(" or ")),
                variant.event(),
            ),
            None => Evaluation::fail(
                format!("No mutation in {} codon {} detected", gene, codons.join(" or ")),
                format!("No {} codon mutation", gene),
            ),
        }
    }))
}

pub(super) fn mutation_in_gene_of_any_protein_impact(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    let (gene, impacts) = context
        .resolver()
        .create_one_gene_many_protein_impacts_input(expression)?;
    Ok(on_test(move |test| {
        let matching = test
            .variants_in(&gene)
            .filter(|variant| variant.is_reportable)
            .find(|variant| {
                let impact = without_protein_prefix(&variant.protein_impact);
                impacts.iter().any(|wanted| without_protein_prefix(wanted) == impact)
            });
        match matching {
            Some(variant) => with_event(
                EvaluationResult::Pass,
                format!("Mutation {} detected", variant.event()),
                variant.event(),
            ),
            None => Evaluation::fail(
                format!("None of {} detected in {}", impacts.join(", "), gene),
                format!("No {} protein impact match", gene),
            ),
        }
    }))
}

fn amplification(test: &MolecularTest, gene: &str, min_copies: Option<i32>) -> Evaluation {
    let amplified = test
        .amplifications
        .iter()
        .filter(|amp| amp.is_reportable && amp.gene == gene)
        .find(|amp| min_copies.is_none_or(|min| amp.copies >= min));
    match (amplified, min_copies) {
        (Some(amp), _) => with_event(
            EvaluationResult::Pass,
            format!("Amplification of {} with {} copies detected", gene, amp.copies),
            format!("{} amp", gene),
        ),
        (None, Some(min)) => Evaluation::fail(
            format!("No amplification of {} with at least {} copies detected", gene, min),
            format!("No {} amplification", gene),
        ),
        (None, None) => Evaluation::fail(
            format!("No amplification of {} detected", gene),
            format!("No {} amplification", gene),
        ),
    }
}

pub(super) fn amplification_of_gene(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    let gene = context.resolver().create_one_gene_input(expression)?;
    Ok(on_test(move |test| amplification(test, &gene, None)))
}

pub(super) fn amplification_of_gene_of_at_least_copies(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    let (gene, min_copies) = context.resolver().create_one_gene_one_integer_input(expression)?;
    Ok(on_test(move |test| amplification(test, &gene, Some(min_copies))))
}

pub(super) fn inactivation_of_gene(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    let gene = context.resolver().create_one_gene_input(expression)?;
    Ok(on_test(move |test| {
        if test.losses.iter().any(|loss| loss.is_reportable && loss.gene == gene) {
            return with_event(
                EvaluationResult::Pass,
                format!("Loss of {} detected", gene),
                format!("{} del", gene),
            );
        }
        if let Some(variant) = test.variants_in(&gene).find(|variant| variant.is_reportable) {
            return with_event(
                EvaluationResult::Warn,
                format!(
                    "Mutation {} detected, unclear whether {} is inactivated",
                    variant.event(),
                    gene
                ),
                variant.event(),
            );
        }
        Evaluation::fail(
            format!("No inactivation of {} detected", gene),
            format!("No {} inactivation", gene),
        )
    }))
}

pub(super) fn fusion_in_gene(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    let gene = context.resolver().create_one_gene_input(expression)?;
    Ok(on_test(move |test| {
        let mut fusions = test
            .fusions
            .iter()
            .filter(|fusion| fusion.is_reportable && fusion.involves(&gene));
        let Some(first) = fusions.next() else {
            return Evaluation::fail(
                format!("No fusion involving {} detected", gene),
                format!("No {} fusion", gene),
            );
        };
        let fusion = std::iter::once(first)
            .chain(fusions)
            .find(|fusion| fusion.driver_likelihood == Some(DriverLikelihood::High));
        match fusion {
            Some(fusion) => with_event(
                EvaluationResult::Pass,
                format!("Fusion {} detected", fusion.event()),
                fusion.event(),
            ),
            None => with_event(
                EvaluationResult::Warn,
                format!("Fusion {} detected with unclear driver likelihood", first.event()),
                first.event(),
            ),
        }
    }))
}

pub(super) fn has_hla_type(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    let allele = context.resolver().create_one_hla_allele_input(expression)?;
    Ok(on_test(move |test| {
        if test.hla_alleles.is_empty() {
            return Evaluation::undetermined(
                "HLA type was not determined",
                "HLA type unknown",
            );
        }
        match test.hla_alleles.iter().find(|hla| hla.name == allele) {
            Some(hla) if hla.has_somatic_mutations => with_event(
                EvaluationResult::Warn,
                format!("Patient has HLA type {} but it carries somatic mutations", hla.name),
                format!("HLA-{}", hla.name),
            ),
            Some(hla) => with_event(
                EvaluationResult::Pass,
                format!("Patient has HLA type {}", hla.name),
                format!("HLA-{}", hla.name),
            ),
            None => Evaluation::fail(
                format!("Patient does not have HLA type {}", allele),
                format!("No HLA-{}", allele),
            ),
        }
    }))
}

/// Flag based signature; PASS carries `event` as inclusion event
fn signature(value: Option<bool>, event: &str, pass: &str, fail: &str, unknown: &str) -> Evaluation {
    let evaluation = from_flag(value, pass, fail, unknown);
    if evaluation.result() == EvaluationResult::Pass {
        EvaluationBuilder::new(EvaluationResult::Pass)
            .absorb(&evaluation)
            .inclusion_event(event)
            .build()
    } else {
        evaluation
    }
}

pub(super) fn msi_signature(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    context.resolver().create_no_input(expression)?;
    Ok(on_test(|test| {
        signature(
            test.microsatellite_unstable,
            "MSI high",
            "Tumor is microsatellite unstable",
            "Tumor is microsatellite stable",
            "Microsatellite status unknown",
        )
    }))
}

pub(super) fn hrd_signature(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    context.resolver().create_no_input(expression)?;
    Ok(on_test(|test| {
        signature(
            test.homologous_repair_deficient,
            "HRD",
            "Tumor is homologous repair deficient",
            "Tumor is homologous repair proficient",
            "Homologous repair status unknown",
        )
    }))
}

pub(super) fn tmb_of_at_least(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    let min = context.resolver().create_one_double_input(expression)?;
    Ok(on_test(move |test| match test.tumor_mutational_burden {
        None => Evaluation::undetermined(
            "Tumor mutational burden unknown",
            "TMB unknown",
        ),
        Some(tmb) if tmb >= min => with_event(
            EvaluationResult::Pass,
            format!("Tumor mutational burden of {} is at least {}", tmb, min),
            format!("TMB high ({})", tmb),
        ),
        Some(tmb) => Evaluation::fail(
            format!("Tumor mutational burden of {} is below {}", tmb, min),
            "Inadequate TMB",
        ),
    }))
}

#[cfg(test)]
mod tests {
    use crate::functions::test_support::{evaluate, record};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use trialmatch_model::{
        Amplification, DriverLikelihood, Fusion, HlaAllele, Loss, MolecularTest, PatientRecord,
        Variant,
    };
    use trialmatch_types::EvaluationResult;

    fn variant(gene: &str, impact: &str, driver: Option<DriverLikelihood>) -> Variant {
        Variant {
            gene: gene.to_string(),
            protein_impact: impact.to_string(),
            is_reportable: true,
            driver_likelihood: driver,
        }
    }

    fn with_test(test: MolecularTest) -> PatientRecord {
        let mut record = record();
        record.molecular = Some(test);
        record
    }

    fn braf_test() -> MolecularTest {
        MolecularTest {
            date: NaiveDate::from_ymd_opt(2024, 2, 1),
            variants: vec![
                variant("BRAF", "V600E", Some(DriverLikelihood::High)),
                variant("TP53", "R175H", Some(DriverLikelihood::Medium)),
            ],
            amplifications: vec![Amplification {
                gene: "MET".into(),
                copies: 9,
                is_reportable: true,
            }],
            losses: vec![Loss {
                gene: "PTEN".into(),
                is_reportable: true,
            }],
            fusions: vec![Fusion {
                gene_start: "EML4".into(),
                gene_end: "ALK".into(),
                is_reportable: true,
                driver_likelihood: Some(DriverLikelihood::High),
            }],
            hla_alleles: vec![HlaAllele {
                name: "A*02:01".into(),
                has_somatic_mutations: false,
            }],
            tumor_mutational_burden: Some(12.5),
            microsatellite_unstable: Some(false),
            homologous_repair_deficient: None,
        }
    }

    #[test]
    fn test_missing_test_is_undetermined() {
        let record = record();
        assert_eq!(
            evaluate("ACTIVATING_MUTATION_IN_GENE_X[BRAF]", &record).result(),
            EvaluationResult::Undetermined
        );
        let available = evaluate("MOLECULAR_RESULTS_MUST_BE_AVAILABLE", &record);
        assert_eq!(available.result(), EvaluationResult::Fail);
        assert!(available.is_recoverable());
    }

    #[test]
    fn test_activating_mutation_carries_event() {
        let record = with_test(braf_test());
        let evaluation = evaluate("ACTIVATING_MUTATION_IN_GENE_X[BRAF]", &record);
        assert_eq!(evaluation.result(), EvaluationResult::Pass);
        assert!(evaluation.inclusion_events().contains("BRAF V600E"));

        let evaluation = evaluate("ACTIVATING_MUTATION_IN_ANY_GENES_X[KRAS;TP53]", &record);
        assert_eq!(evaluation.result(), EvaluationResult::Warn);
        assert_eq!(
            evaluate("ACTIVATING_MUTATION_IN_GENE_X[KRAS]", &record).result(),
            EvaluationResult::Fail
        );
    }

    #[rstest]
    #[case("MUTATION_IN_GENE_X_OF_ANY_CODON_Y[BRAF, V600;K601]", EvaluationResult::Pass)]
    #[case("MUTATION_IN_GENE_X_OF_ANY_CODON_Y[BRAF, G469]", EvaluationResult::Fail)]
    #[case("MUTATION_IN_GENE_X_OF_ANY_PROTEIN_IMPACTS_Y[BRAF, p.V600E]", EvaluationResult::Pass)]
    #[case("MUTATION_IN_GENE_X_OF_ANY_PROTEIN_IMPACTS_Y[BRAF, V600K]", EvaluationResult::Fail)]
    #[case("AMPLIFICATION_OF_GENE_X[MET]", EvaluationResult::Pass)]
    #[case("AMPLIFICATION_OF_GENE_X_OF_AT_LEAST_Y_COPIES[MET, 10]", EvaluationResult::Fail)]
    #[case("AMPLIFICATION_OF_GENE_X_OF_AT_LEAST_Y_COPIES[MET, 8]", EvaluationResult::Pass)]
    #[case("INACTIVATION_OF_GENE_X[PTEN]", EvaluationResult::Pass)]
    #[case("INACTIVATION_OF_GENE_X[TP53]", EvaluationResult::Warn)]
    #[case("INACTIVATION_OF_GENE_X[RB1]", EvaluationResult::Fail)]
    #[case("FUSION_IN_GENE_X[ALK]", EvaluationResult::Pass)]
    #[case("FUSION_IN_GENE_X[ROS1]", EvaluationResult::Fail)]
    #[case("HAS_HLA_TYPE_X[A*02:01]", EvaluationResult::Pass)]
    #[case("HAS_HLA_TYPE_X[A*01:01]", EvaluationResult::Fail)]
    #[case("MSI_SIGNATURE", EvaluationResult::Fail)]
    #[case("HRD_SIGNATURE", EvaluationResult::Undetermined)]
    #[case("TMB_OF_AT_LEAST_X[10]", EvaluationResult::Pass)]
    #[case("TMB_OF_AT_LEAST_X[16]", EvaluationResult::Fail)]
    #[case("MOLECULAR_RESULTS_MUST_BE_AVAILABLE", EvaluationResult::Pass)]
    fn test_molecular_predicates(#[case] criterion: &str, #[case] expected: EvaluationResult) {
        let record = with_test(braf_test());
        assert_eq!(evaluate(criterion, &record).result(), expected, "{}", criterion);
    }

    #[test]
    fn test_non_reportable_events_are_ignored() {
        let mut test = braf_test();
        test.variants[0].is_reportable = false;
        test.fusions[0].driver_likelihood = None;
        let record = with_test(test);
        assert_eq!(
            evaluate("ACTIVATING_MUTATION_IN_GENE_X[BRAF]", &record).result(),
            EvaluationResult::Fail
        );
        assert_eq!(evaluate("FUSION_IN_GENE_X[ALK]", &record).result(), EvaluationResult::Warn);
    }

    #[test]
    fn test_hla_with_somatic_mutations_warns() {
        let mut test = braf_test();
        test.hla_alleles[0].has_somatic_mutations = true;
        let record = with_test(test);
        assert_eq!(evaluate("HAS_HLA_TYPE_X[A*02:01]", &record).result(), EvaluationResult::Warn);

        let record = with_test(MolecularTest::default());
        assert_eq!(
            evaluate("HAS_HLA_TYPE_X[A*02:01]", &record).result(),
            EvaluationResult::Undetermined
        );
    }

    #[test]
    fn test_unknown_test_date_warns() {
        let record = with_test(MolecularTest::default());
        assert_eq!(
            evaluate("MOLECULAR_RESULTS_MUST_BE_AVAILABLE", &record).result(),
            EvaluationResult::Warn
        );
    }
}
