//! Command-line interface

pub mod doid;
pub mod evaluate;
pub mod lint;
pub mod output;
pub mod rules;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use trialmatch_doid::{DoidManualConfig, DoidModel, load_obograph};
use trialmatch_eval::{EligibilityEngine, EvaluationConfig};

/// Environment variable holding the log filter, e.g. `trialmatch_eval=debug`
pub const LOG_ENV: &str = "TRIALMATCH_LOG";

/// Install the log subscriber; `log` records are forwarded to it
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    // Only the first call installs a subscriber
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}

/// Ontology and evaluation settings shared by the commands that build an engine
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    pub doid: PathBuf,
    pub doid_config: Option<PathBuf>,
    pub eval_config: Option<PathBuf>,
    pub reference_date: Option<NaiveDate>,
}

impl EngineOptions {
    pub fn load_doid_model(&self) -> Result<Arc<DoidModel>> {
        load_doid_model(&self.doid, self.doid_config.as_deref())
    }

    pub fn load_evaluation_config(&self) -> Result<EvaluationConfig> {
        let config = match &self.eval_config {
            Some(path) => EvaluationConfig::from_path(path)
                .with_context(|| format!("Failed to load evaluation config {}", path.display()))?,
            None => EvaluationConfig::default(),
        };
        Ok(match self.reference_date {
            Some(date) => config.with_reference_date(date),
            None => config,
        })
    }

    pub fn build_engine(&self) -> Result<EligibilityEngine> {
        let model = self.load_doid_model()?;
        let config = self.load_evaluation_config()?;
        EligibilityEngine::new(model, config).context("Failed to set up the eligibility engine")
    }
}

pub fn load_doid_model(path: &Path, manual_config: Option<&Path>) -> Result<Arc<DoidModel>> {
    let config = manual_config
        .map(|path| {
            DoidManualConfig::from_path(path)
                .with_context(|| format!("Failed to load DOID config {}", path.display()))
        })
        .transpose()?;
    let model = load_obograph(path, config)
        .with_context(|| format!("Failed to load disease ontology {}", path.display()))?;
    Ok(Arc::new(model))
}
