//! Output formatting utilities

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::fs::File;
use std::io::{IsTerminal, Write};
use std::path::Path;
use tabled::{Table, Tabled, settings::Style};
use trialmatch_types::EvaluationResult;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    JsonPretty,
    Table,
}

impl OutputFormat {
    /// Format from the `--format` flag; unknown names fall back to `default`
    pub fn from_flag(flag: Option<&str>, default: Self) -> Self {
        match flag.map(str::to_lowercase).as_deref() {
            Some("json") => Self::Json,
            Some("pretty") | Some("json-pretty") => Self::JsonPretty,
            Some("table") => Self::Table,
            _ => default,
        }
    }
}

/// Set up color output based on user preference
pub fn setup_colors(mode: &str) {
    match mode.to_lowercase().as_str() {
        "always" => colored::control::set_override(true),
        "never" => colored::control::set_override(false),
        _ => colored::control::set_override(std::io::stdout().is_terminal()),
    }
}

/// Format an error for display
pub fn format_error(error: &anyhow::Error) -> String {
    format!("{} {:#}", "Error:".red().bold(), error)
}

pub fn format_warning(warning: &str) -> String {
    format!("{} {}", "Warning:".yellow().bold(), warning)
}

pub fn format_success(message: &str) -> String {
    format!("{} {}", "Success:".green().bold(), message)
}

/// Color a result the way it reads: green passes, red fails
pub fn format_result(result: EvaluationResult) -> String {
    let name = result.as_str();
    match result {
        EvaluationResult::Pass => name.green().to_string(),
        EvaluationResult::Warn => name.yellow().to_string(),
        EvaluationResult::Fail => name.red().to_string(),
        EvaluationResult::Undetermined => name.cyan().to_string(),
        EvaluationResult::NotEvaluated | EvaluationResult::NotImplemented => {
            name.dimmed().to_string()
        }
    }
}

/// Write output to a file or stdout
pub fn write_output(content: &str, output_file: Option<&Path>) -> Result<()> {
    if let Some(path) = output_file {
        let mut file = File::create(path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        file.write_all(content.as_bytes())
            .with_context(|| format!("Failed to write to output file: {}", path.display()))?;
        eprintln!(
            "{}",
            format_success(&format!("Output written to {}", path.display()))
        );
    } else {
        println!("{}", content);
    }
    Ok(())
}

pub fn format_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String> {
    if pretty {
        serde_json::to_string_pretty(value).context("Failed to serialize JSON")
    } else {
        serde_json::to_string(value).context("Failed to serialize JSON")
    }
}

pub fn format_table<T: Tabled>(rows: &[T]) -> String {
    if rows.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(rows).with(Style::modern()).to_string()
}

/// Print values as JSON or as a table of rows derived from them
pub fn print_output<T, R>(
    values: &[T],
    to_row: impl Fn(&T) -> R,
    format: OutputFormat,
    output_file: Option<&Path>,
) -> Result<()>
where
    T: Serialize,
    R: Tabled,
{
    let content = match format {
        OutputFormat::Json => format_json(values, false)?,
        OutputFormat::JsonPretty => format_json(values, true)?,
        OutputFormat::Table => {
            let rows: Vec<R> = values.iter().map(to_row).collect();
            format_table(&rows)
        }
    };
    write_output(&content, output_file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Tabled)]
    struct Row {
        name: String,
    }

    #[test]
    fn test_output_format_from_flag() {
        assert_eq!(OutputFormat::from_flag(Some("JSON"), OutputFormat::Table), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flag(Some("pretty"), OutputFormat::Json), OutputFormat::JsonPretty);
        assert_eq!(OutputFormat::from_flag(Some("xml"), OutputFormat::Table), OutputFormat::Table);
        assert_eq!(OutputFormat::from_flag(None, OutputFormat::Json), OutputFormat::Json);
    }

    #[test]
    fn test_format_table() {
        assert_eq!(format_table::<Row>(&[]), "(no rows)");
        let table = format_table(&[Row { name: "IS_MALE".into() }]);
        assert!(table.contains("name"));
        assert!(table.contains("IS_MALE"));
    }

    #[test]
    fn test_write_output_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_output("{}", Some(&path)).unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "{}");
    }
}
