//! Trialmatch error types

use crate::{ErrorCode, RulePath, SourceLocation};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Protocol cannot be evaluated
    Error,
    /// Protocol can be evaluated but something looks off
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A diagnostic message with location and context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Position in the criterion text, when the error came from parsing
    pub location: Option<SourceLocation>,
    /// Node in the rule tree, when the error came from building evaluators
    pub path: Option<RulePath>,
    /// Additional context or help
    pub help: Option<String>,
}

impl Diagnostic {
    /// Create a new error diagnostic
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, message)
    }

    /// Create a new warning diagnostic
    pub fn warning(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, message)
    }

    fn new(severity: Severity, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            location: None,
            path: None,
            help: None,
        }
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_path(mut self, path: RulePath) -> Self {
        self.path = Some(path);
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Render with terminal colors
    #[cfg(feature = "colored")]
    pub fn render_colored(&self) -> String {
        use colored::Colorize;

        let severity = match self.severity {
            Severity::Error => self.severity.to_string().red().bold(),
            Severity::Warning => self.severity.to_string().yellow().bold(),
            Severity::Info => self.severity.to_string().blue().bold(),
        };
        let mut out = format!("{}[{}]: {}", severity, self.code, self.message);
        if let Some(loc) = &self.location {
            out.push_str(&format!("\n  {} {}", "-->".cyan(), loc));
        }
        if let Some(path) = &self.path {
            out.push_str(&format!("\n  {} {}", "in".cyan(), path));
        }
        if let Some(help) = self.help.as_deref().or(self.code.info().help) {
            out.push_str(&format!("\n  {} {}", "help:".green(), help));
        }
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} - {}", self.severity, self.code, self.message)?;
        if let Some(loc) = &self.location {
            write!(f, " at {}", loc)?;
        }
        if let Some(path) = &self.path {
            write!(f, " in {}", path)?;
        }
        Ok(())
    }
}

/// Main trialmatch error type
#[derive(Debug, Clone, Error)]
pub enum TrialMatchError {
    /// Criterion text could not be parsed
    #[error("{code}: {message}")]
    Parse {
        code: ErrorCode,
        message: String,
        criterion: String,
        location: Option<SourceLocation>,
    },

    /// Defective rule tree: unknown rule, bad parameters, bad composite arity
    #[error("{code}: {message}{}", path_suffix(.path))]
    Configuration {
        code: ErrorCode,
        message: String,
        path: Option<RulePath>,
        context: Option<String>,
    },

    /// Internal evaluation failure
    #[error("{code}: {message}")]
    Evaluation {
        code: ErrorCode,
        message: String,
        context: Option<String>,
    },

    /// Input data could not be loaded or is inconsistent
    #[error("{code}: {message}")]
    Data {
        code: ErrorCode,
        message: String,
        source_name: Option<String>,
        context: Option<String>,
    },

    /// I/O and other system failures
    #[error("{code}: {message}")]
    System {
        code: ErrorCode,
        message: String,
        context: Option<String>,
    },

    /// Multiple errors collected
    #[error("Multiple errors: {}", .0.len())]
    Multiple(Vec<TrialMatchError>),
}

fn path_suffix(path: &Option<RulePath>) -> String {
    match path {
        Some(path) => format!(" (in {})", path),
        None => String::new(),
    }
}

impl TrialMatchError {
    /// Create a parse error
    pub fn parse(code: ErrorCode, message: impl Into<String>, criterion: impl Into<String>) -> Self {
        Self::Parse {
            code,
            message: message.into(),
            criterion: criterion.into(),
            location: None,
        }
    }

    /// Create a parse error with location
    pub fn parse_at(
        code: ErrorCode,
        message: impl Into<String>,
        criterion: impl Into<String>,
        location: SourceLocation,
    ) -> Self {
        Self::Parse {
            code,
            message: message.into(),
            criterion: criterion.into(),
            location: Some(location),
        }
    }

    /// Create a configuration error
    pub fn configuration(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Configuration {
            code,
            message: message.into(),
            path: None,
            context: None,
        }
    }

    /// Create an evaluation error
    pub fn evaluation(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Evaluation {
            code,
            message: message.into(),
            context: None,
        }
    }

    /// Create a data error
    pub fn data(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Data {
            code,
            message: message.into(),
            source_name: None,
            context: None,
        }
    }

    /// Create a system error
    pub fn system(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::System {
            code,
            message: message.into(),
            context: None,
        }
    }

    /// Attach a rule path to a configuration error.
    ///
    /// A path that is already set is kept: it was recorded closer to the
    /// failing node.
    pub fn at_path(self, at: &RulePath) -> Self {
        match self {
            Self::Configuration {
                code,
                message,
                path: None,
                context,
            } => Self::Configuration {
                code,
                message,
                path: Some(at.clone()),
                context,
            },
            other => other,
        }
    }

    /// Attach free-form context (e.g. the criterion reference)
    pub fn with_context(self, ctx: impl Into<String>) -> Self {
        let ctx = Some(ctx.into());
        match self {
            Self::Configuration { code, message, path, .. } => Self::Configuration {
                code,
                message,
                path,
                context: ctx,
            },
            Self::Evaluation { code, message, .. } => Self::Evaluation {
                code,
                message,
                context: ctx,
            },
            Self::Data { code, message, source_name, .. } => Self::Data {
                code,
                message,
                source_name,
                context: ctx,
            },
            Self::System { code, message, .. } => Self::System {
                code,
                message,
                context: ctx,
            },
            other => other,
        }
    }

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Parse { code, .. } => *code,
            Self::Configuration { code, .. } => *code,
            Self::Evaluation { code, .. } => *code,
            Self::Data { code, .. } => *code,
            Self::System { code, .. } => *code,
            Self::Multiple(errors) => errors.first().map(|e| e.code()).unwrap_or(ErrorCode::new(0)),
        }
    }

    /// Rule path of a configuration error
    pub fn path(&self) -> Option<&RulePath> {
        match self {
            Self::Configuration { path, .. } => path.as_ref(),
            _ => None,
        }
    }

    /// Context attached with [`with_context`](Self::with_context)
    pub fn context(&self) -> Option<&str> {
        match self {
            Self::Configuration { context, .. }
            | Self::Evaluation { context, .. }
            | Self::Data { context, .. }
            | Self::System { context, .. } => context.as_deref(),
            Self::Parse { .. } | Self::Multiple(_) => None,
        }
    }

    /// Source location of a parse error
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            Self::Parse { location, .. } => location.as_ref(),
            _ => None,
        }
    }

    /// Check whether this is a configuration/authoring error (parse errors included)
    pub fn is_configuration_error(&self) -> bool {
        let code = self.code();
        code.is_parse_error() || code.is_configuration_error()
    }

    /// Convert to a diagnostic
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Self::Parse { code, message, location, criterion } => {
                let mut diag = Diagnostic::error(*code, message.clone())
                    .with_help(format!("while parsing `{}`", criterion));
                if let Some(loc) = location {
                    diag = diag.with_location(loc.clone());
                }
                diag
            }
            Self::Configuration { code, message, path, context } => {
                let mut diag = Diagnostic::error(*code, message.clone());
                if let Some(path) = path {
                    diag = diag.with_path(path.clone());
                }
                if let Some(ctx) = context {
                    diag = diag.with_help(ctx.clone());
                }
                diag
            }
            Self::Evaluation { code, message, context }
            | Self::Data { code, message, context, .. }
            | Self::System { code, message, context } => {
                let mut diag = Diagnostic::error(*code, message.clone());
                if let Some(ctx) = context {
                    diag = diag.with_help(ctx.clone());
                }
                diag
            }
            Self::Multiple(errors) => match errors.first() {
                Some(first) => first.to_diagnostic(),
                None => Diagnostic::error(ErrorCode::new(0), "Unknown error"),
            },
        }
    }
}

impl From<std::io::Error> for TrialMatchError {
    fn from(err: std::io::Error) -> Self {
        Self::system(crate::TM0401, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Span, TM0003, TM0101, TM0301};

    #[test]
    fn test_at_path_keeps_innermost_path() {
        let inner = RulePath::root("NOT").child(0, "IS_MALE");
        let err = TrialMatchError::configuration(TM0101, "bad")
            .at_path(&inner)
            .at_path(&RulePath::root("NOT"));
        assert_eq!(err.path(), Some(&inner));
    }

    #[test]
    fn test_diagnostic_display() {
        let source = "AND(IS_MALE, NOPE)";
        let loc = SourceLocation::from_span(Span::new(13, 17), source);
        let err = TrialMatchError::parse_at(TM0003, "Unknown rule 'NOPE'", source, loc);
        let diag = err.to_diagnostic();

        assert!(diag.to_string().contains("TM0003"));
        assert!(diag.to_string().contains("1:14"));
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_data_error_is_not_configuration() {
        let err = TrialMatchError::data(TM0301, "cycle").with_context("doid.json");
        assert!(!err.is_configuration_error());
        assert_eq!(err.to_diagnostic().help.as_deref(), Some("doid.json"));
    }
}
