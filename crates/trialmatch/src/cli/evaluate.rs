//! Evaluate command implementation

use super::EngineOptions;
use super::output::{self, OutputFormat};
use anyhow::{Context, Result};
use futures::future::try_join_all;
use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use tabled::Tabled;
use trialmatch_eval::{CompiledTrial, TrialMatch, TrialMatcher};
use trialmatch_model::PatientRecord;

use crate::protocol::load_trial;

/// Configuration for evaluate command
pub struct EvaluateConfig {
    pub protocols: Vec<PathBuf>,
    pub patients: Vec<PathBuf>,
    pub engine: EngineOptions,
    /// Only report trials the patient is potentially eligible for
    pub eligible_only: bool,
    pub output_format: Option<String>,
    pub output_file: Option<PathBuf>,
}

#[derive(Tabled)]
struct MatchRow {
    #[tabled(rename = "Patient")]
    patient: String,
    #[tabled(rename = "Trial")]
    trial: String,
    #[tabled(rename = "Eligible")]
    eligible: String,
    #[tabled(rename = "Cohorts")]
    cohorts: String,
    #[tabled(rename = "Results")]
    results: String,
}

impl MatchRow {
    fn new(trial_match: &TrialMatch) -> Self {
        let cohorts: Vec<&str> = trial_match
            .cohorts
            .iter()
            .filter(|c| c.is_potentially_eligible)
            .map(|c| c.cohort_id.as_str())
            .collect();
        let results: Vec<String> = trial_match
            .result_counts()
            .into_iter()
            .map(|(result, count)| format!("{} {}", output::format_result(result), count))
            .collect();
        Self {
            patient: trial_match.patient_id.clone(),
            trial: format!("{} ({})", trial_match.acronym, trial_match.trial_id),
            eligible: if trial_match.is_potentially_eligible { "yes" } else { "no" }.to_string(),
            cohorts: cohorts.join(", "),
            results: results.join(", "),
        }
    }
}

/// Match every patient against every trial
///
/// Each patient is evaluated on the blocking pool; the compiled trials are
/// shared between them.
pub async fn match_all(
    trials: Vec<Arc<CompiledTrial>>,
    patients: Vec<PatientRecord>,
) -> Result<Vec<TrialMatch>> {
    let trials = Arc::new(trials);
    let tasks = patients.into_iter().map(|patient| {
        let trials = Arc::clone(&trials);
        tokio::task::spawn_blocking(move || {
            trials
                .iter()
                .map(|trial| trial.evaluate(&patient))
                .collect::<Vec<_>>()
        })
    });
    let per_patient = try_join_all(tasks)
        .await
        .context("Evaluation task failed")?;
    Ok(per_patient.into_iter().flatten().collect())
}

/// Evaluate patients against trial protocols
pub async fn evaluate(config: EvaluateConfig) -> Result<()> {
    if config.protocols.is_empty() {
        anyhow::bail!("No protocol files specified");
    }
    if config.patients.is_empty() {
        anyhow::bail!("No patient records specified");
    }

    let matcher = TrialMatcher::new(config.engine.build_engine()?);

    let mut trials = Vec::with_capacity(config.protocols.len());
    for path in &config.protocols {
        let trial = load_trial(path)
            .with_context(|| format!("Failed to load protocol {}", path.display()))?;
        let compiled = matcher
            .compile(&trial)
            .with_context(|| format!("Failed to compile protocol {}", path.display()))?;
        info!(
            "Compiled {} with {} criteria",
            trial.identification.trial_id,
            compiled.criterion_count()
        );
        trials.push(Arc::new(compiled));
    }

    let mut patients = Vec::with_capacity(config.patients.len());
    for path in &config.patients {
        let record = PatientRecord::from_path(path)
            .with_context(|| format!("Failed to load patient record {}", path.display()))?;
        patients.push(record);
    }

    let mut matches = match_all(trials, patients).await?;
    if config.eligible_only {
        matches.retain(|m| m.is_potentially_eligible);
    }

    let format = OutputFormat::from_flag(config.output_format.as_deref(), OutputFormat::Table);
    output::print_output(&matches, MatchRow::new, format, config.output_file.as_deref())
}
