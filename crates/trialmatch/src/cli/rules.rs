//! Rules command implementation: the rule catalogue

use super::output::{self, OutputFormat};
use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;
use tabled::Tabled;
use trialmatch_types::Rule;

/// Configuration for rules command
pub struct RulesConfig {
    /// Only list rules of this group, e.g. `molecular`
    pub group: Option<String>,
    /// Only list rules whose name contains this text
    pub filter: Option<String>,
    pub output_format: Option<String>,
    pub output_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Tabled)]
pub struct RuleEntry {
    #[tabled(rename = "Rule")]
    pub name: &'static str,
    #[tabled(rename = "Group")]
    pub group: String,
    #[tabled(rename = "Input")]
    pub input: String,
}

impl RuleEntry {
    fn new(rule: Rule) -> Self {
        Self {
            name: rule.name(),
            group: rule.group().to_string(),
            input: rule.input().describe(),
        }
    }
}

/// Catalogue entries matching the group and name filters
pub fn catalogue(group: Option<&str>, filter: Option<&str>) -> Vec<RuleEntry> {
    let filter = filter.map(str::to_uppercase);
    Rule::ALL
        .iter()
        .copied()
        .filter(|rule| group.is_none_or(|g| rule.group().to_string().eq_ignore_ascii_case(g)))
        .filter(|rule| filter.as_deref().is_none_or(|f| rule.name().contains(f)))
        .map(RuleEntry::new)
        .collect()
}

/// List the rule catalogue
pub async fn rules(config: RulesConfig) -> Result<()> {
    let entries = catalogue(config.group.as_deref(), config.filter.as_deref());
    let format = OutputFormat::from_flag(config.output_format.as_deref(), OutputFormat::Table);
    output::print_output(&entries, RuleEntry::clone, format, config.output_file.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_full_catalogue() {
        assert_eq!(catalogue(None, None).len(), Rule::ALL.len());
    }

    #[test]
    fn test_group_filter() {
        let composites = catalogue(Some("Composite"), None);
        let names: Vec<&str> = composites.iter().map(|e| e.name).collect();
        assert!(names.contains(&"AND"));
        assert!(names.contains(&"FALLBACK"));
        assert!(!names.contains(&"IS_MALE"));
    }

    #[test]
    fn test_name_filter() {
        let entries = catalogue(None, Some("years_old"));
        assert!(!entries.is_empty());
        assert!(entries.iter().all(|e| e.name.contains("YEARS_OLD")));
    }
}
