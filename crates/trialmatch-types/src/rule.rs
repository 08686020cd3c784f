//! The rule catalogue
//!
//! Every rule a criterion may use is a variant of [`Rule`]. The catalogue
//! table below is the single place where a rule's wire name, group and input
//! shape are declared; the generated `match` expressions are exhaustive, so
//! a new rule without a shape does not compile.

use crate::input::{CompositeArity, RuleInput};
use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Rule name not present in the catalogue
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown rule '{0}'")]
pub struct UnknownRule(pub String);

/// Clinical area a rule belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleGroup {
    Composite,
    General,
    Tumor,
    PriorCondition,
    Treatment,
    Laboratory,
    Molecular,
}

impl fmt::Display for RuleGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Composite => "composite",
            Self::General => "general",
            Self::Tumor => "tumor",
            Self::PriorCondition => "prior condition",
            Self::Treatment => "treatment",
            Self::Laboratory => "laboratory",
            Self::Molecular => "molecular",
        };
        f.write_str(name)
    }
}

macro_rules! rule_catalogue {
    ($( $variant:ident => $name:literal, $group:ident, $input:ident $(($arity:ident))?; )+) => {
        /// A rule of the eligibility catalogue
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum Rule {
            $( $variant, )+
        }

        impl Rule {
            /// Every catalogued rule, in catalogue order
            pub const ALL: &'static [Rule] = &[ $( Rule::$variant, )+ ];

            /// Wire name, e.g. `IS_AT_LEAST_X_YEARS_OLD`
            pub const fn name(self) -> &'static str {
                match self {
                    $( Rule::$variant => $name, )+
                }
            }

            pub const fn group(self) -> RuleGroup {
                match self {
                    $( Rule::$variant => RuleGroup::$group, )+
                }
            }

            /// Declared parameter shape
            pub const fn input(self) -> RuleInput {
                match self {
                    $( Rule::$variant => RuleInput::$input $((CompositeArity::$arity))?, )+
                }
            }
        }
    };
}

rule_catalogue! {
    // Composite
    And => "AND", Composite, Composite(AtLeastTwo);
    Or => "OR", Composite, Composite(AtLeastTwo);
    Not => "NOT", Composite, Composite(ExactlyOne);
    WarnIf => "WARN_IF", Composite, Composite(ExactlyOne);
    WarnOnPass => "WARN_ON_PASS", Composite, Composite(ExactlyOne);
    WarnOnFail => "WARN_ON_FAIL", Composite, Composite(ExactlyOne);
    Fallback => "FALLBACK", Composite, Composite(ExactlyTwo);

    // General
    IsAtLeastXYearsOld => "IS_AT_LEAST_X_YEARS_OLD", General, OneInteger;
    IsAtMostXYearsOld => "IS_AT_MOST_X_YEARS_OLD", General, OneInteger;
    IsMale => "IS_MALE", General, None;
    IsFemale => "IS_FEMALE", General, None;
    HasWhoStatusOfAtMostX => "HAS_WHO_STATUS_OF_AT_MOST_X", General, OneInteger;
    HasWhoStatusOfAtExactlyX => "HAS_WHO_STATUS_OF_AT_EXACTLY_X", General, OneInteger;
    HasWhoStatusOfAnyOfX => "HAS_WHO_STATUS_OF_ANY_OF_X", General, ManyIntegers;
    CanGiveAdequateInformedConsent => "CAN_GIVE_ADEQUATE_INFORMED_CONSENT", General, None;
    HasActiveInfection => "HAS_ACTIVE_INFECTION", General, None;
    IsPregnant => "IS_PREGNANT", General, None;
    HasAdequateVenousAccess => "HAS_ADEQUATE_VENOUS_ACCESS", General, None;

    // Tumor
    HasSolidPrimaryTumor => "HAS_SOLID_PRIMARY_TUMOR", Tumor, None;
    HasPrimaryTumorBelongingToDoidTermX => "HAS_PRIMARY_TUMOR_BELONGING_TO_DOID_TERM_X", Tumor, OneDoidTerm;
    HasPrimaryTumorBelongingToAnyDoidTermX => "HAS_PRIMARY_TUMOR_BELONGING_TO_ANY_DOID_TERM_X", Tumor, ManyDoidTerms;
    HasTumorStageX => "HAS_TUMOR_STAGE_X", Tumor, OneTumorStage;
    HasAnyStageX => "HAS_ANY_STAGE_X", Tumor, ManyTumorStages;
    HasMeasurableDisease => "HAS_MEASURABLE_DISEASE", Tumor, None;
    HasBrainMetastases => "HAS_BRAIN_METASTASES", Tumor, None;
    HasKnownActiveCnsMetastases => "HAS_KNOWN_ACTIVE_CNS_METASTASES", Tumor, None;
    HasLiverMetastases => "HAS_LIVER_METASTASES", Tumor, None;
    HasBoneMetastases => "HAS_BONE_METASTASES", Tumor, None;

    // Prior conditions
    HasHistoryOfConditionWithDoidTermX => "HAS_HISTORY_OF_CONDITION_WITH_DOID_TERM_X", PriorCondition, OneDoidTerm;
    HasHistoryOfConditionWithAnyDoidTermX => "HAS_HISTORY_OF_CONDITION_WITH_ANY_DOID_TERM_X", PriorCondition, ManyDoidTerms;
    HasHadConditionWithAnyDoidTermYWithinXYears => "HAS_HAD_CONDITION_WITH_ANY_DOID_TERM_Y_WITHIN_X_YEARS", PriorCondition, OneIntegerManyDoidTerms;
    HasHistoryOfSecondMalignancyWithinXYears => "HAS_HISTORY_OF_SECOND_MALIGNANCY_WITHIN_X_YEARS", PriorCondition, OneInteger;

    // Treatment history
    HasHadTreatmentNameX => "HAS_HAD_TREATMENT_NAME_X", Treatment, OneString;
    HasHadTreatmentWithAnyNameX => "HAS_HAD_TREATMENT_WITH_ANY_NAME_X", Treatment, ManyStrings;
    HasHadTreatmentWithAnyNameYWithinXYears => "HAS_HAD_TREATMENT_WITH_ANY_NAME_Y_WITHIN_X_YEARS", Treatment, OneIntegerManyStrings;
    HasHadAtLeastXCyclesOfTreatmentNameY => "HAS_HAD_AT_LEAST_X_CYCLES_OF_TREATMENT_NAME_Y", Treatment, OneIntegerOneString;
    HasHadCategoryXTreatment => "HAS_HAD_CATEGORY_X_TREATMENT", Treatment, OneTreatmentCategory;
    HasHadCategoryXTreatmentOfAtLeastYLines => "HAS_HAD_CATEGORY_X_TREATMENT_OF_AT_LEAST_Y_LINES", Treatment, OneTreatmentCategoryOneInteger;
    HasHadCategoryXTreatmentOfAtMostYLines => "HAS_HAD_CATEGORY_X_TREATMENT_OF_AT_MOST_Y_LINES", Treatment, OneTreatmentCategoryOneInteger;
    HasHadAtLeastXSystemicTreatmentLines => "HAS_HAD_AT_LEAST_X_SYSTEMIC_TREATMENT_LINES", Treatment, OneInteger;
    HasHadAtMostXSystemicTreatmentLines => "HAS_HAD_AT_MOST_X_SYSTEMIC_TREATMENT_LINES", Treatment, OneInteger;
    HasHadSystemicTreatmentLinesBetweenXAndY => "HAS_HAD_SYSTEMIC_TREATMENT_LINES_BETWEEN_X_AND_Y", Treatment, TwoIntegers;

    // Laboratory
    HasHemoglobinGPerDlOfAtLeastX => "HAS_HEMOGLOBIN_G_PER_DL_OF_AT_LEAST_X", Laboratory, OneDouble;
    HasThrombocytesAbsOfAtLeastX => "HAS_THROMBOCYTES_ABS_OF_AT_LEAST_X", Laboratory, OneDouble;
    HasNeutrophilsAbsOfAtLeastX => "HAS_NEUTROPHILS_ABS_OF_AT_LEAST_X", Laboratory, OneDouble;
    HasAlbuminGPerDlOfAtLeastX => "HAS_ALBUMIN_G_PER_DL_OF_AT_LEAST_X", Laboratory, OneDouble;
    HasAsatUlnOfAtMostX => "HAS_ASAT_ULN_OF_AT_MOST_X", Laboratory, OneDouble;
    HasAlatUlnOfAtMostX => "HAS_ALAT_ULN_OF_AT_MOST_X", Laboratory, OneDouble;
    HasTotalBilirubinUlnOfAtMostX => "HAS_TOTAL_BILIRUBIN_ULN_OF_AT_MOST_X", Laboratory, OneDouble;
    HasCreatinineUlnOfAtMostX => "HAS_CREATININE_ULN_OF_AT_MOST_X", Laboratory, OneDouble;
    HasPotassiumMmolPerLBetweenXAndY => "HAS_POTASSIUM_MMOL_PER_L_BETWEEN_X_AND_Y", Laboratory, TwoDoubles;

    // Molecular
    MolecularResultsMustBeAvailable => "MOLECULAR_RESULTS_MUST_BE_AVAILABLE", Molecular, None;
    ActivatingMutationInGeneX => "ACTIVATING_MUTATION_IN_GENE_X", Molecular, OneGene;
    ActivatingMutationInAnyGenesX => "ACTIVATING_MUTATION_IN_ANY_GENES_X", Molecular, ManyGenes;
    MutationInGeneXOfAnyCodonY => "MUTATION_IN_GENE_X_OF_ANY_CODON_Y", Molecular, OneGeneManyCodons;
    MutationInGeneXOfAnyProteinImpactsY => "MUTATION_IN_GENE_X_OF_ANY_PROTEIN_IMPACTS_Y", Molecular, OneGeneManyProteinImpacts;
    AmplificationOfGeneX => "AMPLIFICATION_OF_GENE_X", Molecular, OneGene;
    AmplificationOfGeneXOfAtLeastYCopies => "AMPLIFICATION_OF_GENE_X_OF_AT_LEAST_Y_COPIES", Molecular, OneGeneOneInteger;
    InactivationOfGeneX => "INACTIVATION_OF_GENE_X", Molecular, OneGene;
    FusionInGeneX => "FUSION_IN_GENE_X", Molecular, OneGene;
    HasHlaTypeX => "HAS_HLA_TYPE_X", Molecular, OneHlaAllele;
    MsiSignature => "MSI_SIGNATURE", Molecular, None;
    HrdSignature => "HRD_SIGNATURE", Molecular, None;
    TmbOfAtLeastX => "TMB_OF_AT_LEAST_X", Molecular, OneDouble;
}

static RULES_BY_NAME: Lazy<HashMap<&'static str, Rule>> =
    Lazy::new(|| Rule::ALL.iter().map(|rule| (rule.name(), *rule)).collect());

impl Rule {
    /// AND, OR, NOT, FALLBACK and the WARN_* transforms
    pub const fn is_composite(self) -> bool {
        matches!(self.input(), RuleInput::Composite(_))
    }

    /// Look a rule up by its wire name
    pub fn from_name(name: &str) -> Option<Rule> {
        RULES_BY_NAME.get(name).copied()
    }
}

impl FromStr for Rule {
    type Err = UnknownRule;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| UnknownRule(s.to_string()))
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Rule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Rule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}
