//! Lint command implementation

use super::EngineOptions;
use super::output::{self, OutputFormat};
use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

use crate::protocol::{LintFinding, ProtocolFile, lint_protocol};

/// Configuration for lint command
pub struct LintConfig {
    pub protocols: Vec<PathBuf>,
    pub engine: EngineOptions,
    /// Treat warnings as errors
    pub strict: bool,
    pub verbose: bool,
    pub output_format: Option<String>,
}

#[derive(Serialize)]
struct FileReport {
    file: PathBuf,
    findings: Vec<LintFinding>,
}

impl FileReport {
    fn errors(&self) -> usize {
        self.findings.iter().filter(|f| f.is_error()).count()
    }

    fn warnings(&self) -> usize {
        self.findings.len() - self.errors()
    }
}

fn print_report(report: &FileReport) {
    if report.findings.is_empty() {
        println!("{} {}", "ok".green().bold(), report.file.display());
        return;
    }
    println!("{}", report.file.display().to_string().bold());
    for finding in &report.findings {
        let rendered = finding.diagnostic.render_colored();
        if finding.label.is_empty() {
            println!("{}", rendered);
        } else {
            println!("{} {}", format!("[{}]", finding.label).cyan(), rendered);
        }
    }
}

/// Check protocol files without evaluating any patient
pub async fn lint(config: LintConfig) -> Result<()> {
    if config.protocols.is_empty() {
        anyhow::bail!("No protocol files specified");
    }

    let engine = config.engine.build_engine()?;

    let mut reports = Vec::with_capacity(config.protocols.len());
    for file in &config.protocols {
        if config.verbose {
            eprintln!("Linting: {}", file.display());
        }
        let protocol = ProtocolFile::from_path(file)
            .with_context(|| format!("Failed to load protocol {}", file.display()))?;
        reports.push(FileReport {
            file: file.clone(),
            findings: lint_protocol(&protocol, &engine),
        });
    }

    let total_errors: usize = reports.iter().map(FileReport::errors).sum();
    let total_warnings: usize = reports.iter().map(FileReport::warnings).sum();

    match OutputFormat::from_flag(config.output_format.as_deref(), OutputFormat::Table) {
        OutputFormat::Table => {
            for report in &reports {
                print_report(report);
            }
            println!();
        }
        format => {
            let json = output::format_json(&reports, format == OutputFormat::JsonPretty)?;
            output::write_output(&json, None)?;
        }
    }

    if total_errors == 0 && total_warnings == 0 {
        eprintln!(
            "{}",
            output::format_success(&format!(
                "All {} protocol(s) are valid",
                config.protocols.len()
            ))
        );
        return Ok(());
    }

    if total_warnings > 0 {
        eprintln!("{}", output::format_warning(&format!("{} warning(s)", total_warnings)));
    }
    if total_errors > 0 {
        anyhow::bail!("{} error(s) found", total_errors);
    }
    if config.strict {
        anyhow::bail!("Strict mode: {} warning(s) treated as errors", total_warnings);
    }
    Ok(())
}
