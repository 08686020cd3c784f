//! Declared parameter shapes and their decoded values

use crate::expression::RuleExpression;
use crate::values::{DoidTerm, TreatmentCategory, TumorStage};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of sub-criteria a composite rule accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompositeArity {
    ExactlyOne,
    ExactlyTwo,
    AtLeastTwo,
}

impl CompositeArity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Self::ExactlyOne => count == 1,
            Self::ExactlyTwo => count == 2,
            Self::AtLeastTwo => count >= 2,
        }
    }
}

impl fmt::Display for CompositeArity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExactlyOne => f.write_str("exactly one sub-criterion"),
            Self::ExactlyTwo => f.write_str("exactly two sub-criteria"),
            Self::AtLeastTwo => f.write_str("at least two sub-criteria"),
        }
    }
}

/// Shape of the parameter list a rule expects
///
/// `Many*` shapes take a single token holding `;`-separated elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleInput {
    None,
    OneInteger,
    TwoIntegers,
    ManyIntegers,
    OneDouble,
    TwoDoubles,
    OneString,
    ManyStrings,
    OneIntegerOneString,
    OneIntegerManyStrings,
    OneTreatmentCategory,
    OneTreatmentCategoryOneInteger,
    OneTumorStage,
    ManyTumorStages,
    OneDoidTerm,
    ManyDoidTerms,
    OneIntegerManyDoidTerms,
    OneGene,
    ManyGenes,
    OneGeneOneInteger,
    OneGeneManyCodons,
    OneGeneManyProteinImpacts,
    OneHlaAllele,
    Composite(CompositeArity),
}

impl RuleInput {
    /// Exact number of parameters; `None` when only a lower bound exists
    pub fn expected_count(self) -> Option<usize> {
        match self {
            Self::None => Some(0),
            Self::OneInteger
            | Self::ManyIntegers
            | Self::OneDouble
            | Self::OneString
            | Self::ManyStrings
            | Self::OneTreatmentCategory
            | Self::OneTumorStage
            | Self::ManyTumorStages
            | Self::OneDoidTerm
            | Self::ManyDoidTerms
            | Self::OneGene
            | Self::ManyGenes
            | Self::OneHlaAllele => Some(1),
            Self::TwoIntegers
            | Self::TwoDoubles
            | Self::OneIntegerOneString
            | Self::OneIntegerManyStrings
            | Self::OneTreatmentCategoryOneInteger
            | Self::OneIntegerManyDoidTerms
            | Self::OneGeneOneInteger
            | Self::OneGeneManyCodons
            | Self::OneGeneManyProteinImpacts => Some(2),
            Self::Composite(CompositeArity::ExactlyOne) => Some(1),
            Self::Composite(CompositeArity::ExactlyTwo) => Some(2),
            Self::Composite(CompositeArity::AtLeastTwo) => None,
        }
    }

    pub fn is_composite(self) -> bool {
        matches!(self, Self::Composite(_))
    }

    /// Short human description of the expected parameters
    pub fn describe(self) -> String {
        match self {
            Self::None => "no parameters".to_string(),
            Self::Composite(arity) => arity.to_string(),
            other => {
                let name = format!("{:?}", other);
                let mut words = String::new();
                for (i, ch) in name.char_indices() {
                    if ch.is_uppercase() && i > 0 {
                        words.push(' ');
                    }
                    words.extend(ch.to_lowercase());
                }
                words
            }
        }
    }
}

impl fmt::Display for RuleInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Composite(arity) => write!(f, "Composite({:?})", arity),
            other => write!(f, "{:?}", other),
        }
    }
}

/// Parameters of a rule decoded according to its [`RuleInput`]
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedInput {
    None,
    OneInteger(i32),
    TwoIntegers(i32, i32),
    ManyIntegers(Vec<i32>),
    OneDouble(f64),
    TwoDoubles(f64, f64),
    OneString(String),
    ManyStrings(Vec<String>),
    OneIntegerOneString { integer: i32, string: String },
    OneIntegerManyStrings { integer: i32, strings: Vec<String> },
    OneTreatmentCategory(TreatmentCategory),
    OneTreatmentCategoryOneInteger { category: TreatmentCategory, integer: i32 },
    OneTumorStage(TumorStage),
    ManyTumorStages(Vec<TumorStage>),
    OneDoidTerm(DoidTerm),
    ManyDoidTerms(Vec<DoidTerm>),
    OneIntegerManyDoidTerms { integer: i32, doid_terms: Vec<DoidTerm> },
    OneGene(String),
    ManyGenes(Vec<String>),
    OneGeneOneInteger { gene: String, integer: i32 },
    OneGeneManyCodons { gene: String, codons: Vec<String> },
    OneGeneManyProteinImpacts { gene: String, protein_impacts: Vec<String> },
    OneHlaAllele(String),
    Composite(Vec<RuleExpression>),
}
