//! Doid command implementation: term and hierarchy lookups

use super::load_doid_model;
use super::output::{self, OutputFormat};
use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;
use tabled::Tabled;
use trialmatch_doid::DoidModel;
use trialmatch_doid::loader::normalize_doid;

/// Configuration for doid command
pub struct DoidConfig {
    pub doid: PathBuf,
    pub doid_config: Option<PathBuf>,
    /// DOID ids (`1324`, `DOID:1324`) or term names
    pub queries: Vec<String>,
    pub output_format: Option<String>,
    pub output_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoidLookup {
    pub query: String,
    pub doid: Option<String>,
    pub term: Option<String>,
    pub parents: Vec<String>,
    /// The id and all its ancestors, sorted
    pub with_parents: Vec<String>,
    pub main_cancer_doids: Vec<String>,
}

#[derive(Tabled)]
struct LookupRow {
    #[tabled(rename = "Query")]
    query: String,
    #[tabled(rename = "DOID")]
    doid: String,
    #[tabled(rename = "Term")]
    term: String,
    #[tabled(rename = "Ancestors")]
    ancestors: String,
}

impl LookupRow {
    fn new(lookup: &DoidLookup) -> Self {
        let ancestors: Vec<&str> = lookup
            .with_parents
            .iter()
            .filter(|id| Some(*id) != lookup.doid.as_ref())
            .map(String::as_str)
            .collect();
        Self {
            query: lookup.query.clone(),
            doid: lookup.doid.clone().unwrap_or_else(|| "-".to_string()),
            term: lookup.term.clone().unwrap_or_else(|| "-".to_string()),
            ancestors: ancestors.join(", "),
        }
    }
}

/// Resolve a query as an id first, then as a term or synonym
pub fn lookup(model: &DoidModel, query: &str) -> DoidLookup {
    let as_id = normalize_doid(query)
        .or_else(|| query.chars().all(|c| c.is_ascii_digit()).then_some(query))
        .filter(|id| model.has_doid(id));
    let doid = as_id.or_else(|| model.resolve_doid_for_term(query));

    match doid {
        Some(id) => {
            let mut with_parents: Vec<String> = model.doid_with_parents(id).into_iter().collect();
            with_parents.sort();
            DoidLookup {
                query: query.to_string(),
                doid: Some(id.to_string()),
                term: model.resolve_term_for_doid(id).map(str::to_string),
                parents: model.parents_of(id).to_vec(),
                with_parents,
                main_cancer_doids: model.main_cancer_doids(id),
            }
        }
        None => DoidLookup {
            query: query.to_string(),
            doid: None,
            term: None,
            parents: Vec::new(),
            with_parents: Vec::new(),
            main_cancer_doids: Vec::new(),
        },
    }
}

/// Look up terms in the disease ontology
pub async fn doid(config: DoidConfig) -> Result<()> {
    if config.queries.is_empty() {
        anyhow::bail!("No DOID ids or terms specified");
    }
    let model = load_doid_model(&config.doid, config.doid_config.as_deref())?;

    let lookups: Vec<DoidLookup> = config.queries.iter().map(|q| lookup(&model, q)).collect();
    for missing in lookups.iter().filter(|l| l.doid.is_none()) {
        eprintln!(
            "{}",
            output::format_warning(&format!("'{}' is not in the ontology", missing.query))
        );
    }

    let format = OutputFormat::from_flag(config.output_format.as_deref(), OutputFormat::Table);
    output::print_output(&lookups, LookupRow::new, format, config.output_file.as_deref())
}
