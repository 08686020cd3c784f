//! Molecular test results

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriverLikelihood {
    High,
    Medium,
    Low,
}

/// Small variant (SNV / indel)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub gene: String,
    /// Protein impact in short notation, e.g. `V600E`
    pub protein_impact: String,
    #[serde(default)]
    pub is_reportable: bool,
    pub driver_likelihood: Option<DriverLikelihood>,
}

impl Variant {
    /// Codon of the protein impact: `V600E` -> `V600`
    pub fn codon(&self) -> Option<&str> {
        let impact = self.protein_impact.strip_prefix("p.").unwrap_or(&self.protein_impact);
        let mut chars = impact.char_indices();
        let (_, first) = chars.next()?;
        if !first.is_ascii_alphabetic() {
            return None;
        }
        let end = chars
            .find(|(_, c)| !c.is_ascii_digit())
            .map(|(i, _)| i)
            .unwrap_or(impact.len());
        (end > 1).then(|| &impact[..end])
    }

    pub fn event(&self) -> String {
        format!("{} {}", self.gene, self.protein_impact)
    }

    pub fn is_high_driver(&self) -> bool {
        self.is_reportable && self.driver_likelihood == Some(DriverLikelihood::High)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Amplification {
    pub gene: String,
    pub copies: i32,
    #[serde(default)]
    pub is_reportable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loss {
    pub gene: String,
    #[serde(default)]
    pub is_reportable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fusion {
    pub gene_start: String,
    pub gene_end: String,
    #[serde(default)]
    pub is_reportable: bool,
    pub driver_likelihood: Option<DriverLikelihood>,
}

impl Fusion {
    pub fn involves(&self, gene: &str) -> bool {
        self.gene_start == gene || self.gene_end == gene
    }

    pub fn event(&self) -> String {
        format!("{}::{} fusion", self.gene_start, self.gene_end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HlaAllele {
    /// Allele name such as `A*02:01`
    pub name: String,
    #[serde(default)]
    pub has_somatic_mutations: bool,
}

/// Result of the most recent molecular test
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MolecularTest {
    pub date: Option<NaiveDate>,
    pub variants: Vec<Variant>,
    pub amplifications: Vec<Amplification>,
    pub losses: Vec<Loss>,
    pub fusions: Vec<Fusion>,
    pub hla_alleles: Vec<HlaAllele>,
    pub tumor_mutational_burden: Option<f64>,
    pub microsatellite_unstable: Option<bool>,
    pub homologous_repair_deficient: Option<bool>,
}

impl MolecularTest {
    pub fn variants_in<'a>(&'a self, gene: &'a str) -> impl Iterator<Item = &'a Variant> + 'a {
        self.variants.iter().filter(move |v| v.gene == gene)
    }
}
