//! Trialmatch error codes following a structured numbering system
//!
//! Error code ranges:
//! - TM0001-TM0099: Criterion parse errors (syntax)
//! - TM0100-TM0199: Configuration errors (rule catalogue, inputs, composites)
//! - TM0200-TM0299: Evaluation errors (internal, should not surface)
//! - TM0300-TM0399: Data errors (ontology, patient records, protocols)
//! - TM0400-TM0499: System errors (I/O, configuration files)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Error code identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode(u16);

impl ErrorCode {
    /// Create a new error code
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Get the numeric code
    pub const fn code(&self) -> u16 {
        self.0
    }

    /// Get error information for this code
    pub fn info(&self) -> &'static ErrorInfo {
        ERROR_INFO.get(&self.0).unwrap_or(&UNKNOWN_ERROR)
    }

    /// Check if this is a parse error (0001-0099)
    pub const fn is_parse_error(&self) -> bool {
        self.0 >= 1 && self.0 < 100
    }

    /// Check if this is a configuration error (0100-0199)
    pub const fn is_configuration_error(&self) -> bool {
        self.0 >= 100 && self.0 < 200
    }

    /// Check if this is an evaluation error (0200-0299)
    pub const fn is_evaluation_error(&self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// Check if this is a data error (0300-0399)
    pub const fn is_data_error(&self) -> bool {
        self.0 >= 300 && self.0 < 400
    }

    /// Check if this is a system error (0400-0499)
    pub const fn is_system_error(&self) -> bool {
        self.0 >= 400 && self.0 < 500
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TM{:04}", self.0)
    }
}

/// Information about an error code
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// Short description of the error
    pub description: &'static str,
    /// Detailed help text
    pub help: Option<&'static str>,
}

impl ErrorInfo {
    const fn new(description: &'static str) -> Self {
        Self {
            description,
            help: None,
        }
    }

    const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

static UNKNOWN_ERROR: ErrorInfo = ErrorInfo::new("Unknown error");

static ERROR_INFO: LazyLock<HashMap<u16, ErrorInfo>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    // Parse errors (0001-0099)
    map.insert(1, ErrorInfo::new("Unexpected token"));
    map.insert(2, ErrorInfo::new("Unexpected end of input"));
    map.insert(3, ErrorInfo::new("Unknown rule")
        .with_help("Rule names must match the rule catalogue exactly, e.g. IS_AT_LEAST_X_YEARS_OLD"));
    map.insert(4, ErrorInfo::new("Unbalanced delimiter"));
    map.insert(5, ErrorInfo::new("Trailing input after criterion"));
    map.insert(6, ErrorInfo::new("Invalid parameter token"));

    // Configuration errors (0100-0199)
    map.insert(100, ErrorInfo::new("Rule has no registered creator"));
    map.insert(101, ErrorInfo::new("Invalid parameter count"));
    map.insert(102, ErrorInfo::new("Invalid parameter type"));
    map.insert(103, ErrorInfo::new("Composite arity violated")
        .with_help("NOT and WARN_* take exactly one sub-criterion, FALLBACK two, AND and OR at least two"));
    map.insert(104, ErrorInfo::new("Expected sub-criterion"));
    map.insert(105, ErrorInfo::new("Expected primitive parameter"));
    map.insert(106, ErrorInfo::new("Unknown DOID term"));
    map.insert(107, ErrorInfo::new("Rule catalogue out of sync with registry"));
    map.insert(108, ErrorInfo::new("Rule has no registered input shape"));

    // Evaluation errors (0200-0299)
    map.insert(200, ErrorInfo::new("Evaluation failed"));

    // Data errors (0300-0399)
    map.insert(300, ErrorInfo::new("Ontology load failed"));
    map.insert(301, ErrorInfo::new("Cycle in is-a hierarchy")
        .with_help("The disease ontology must be acyclic along is-a edges"));
    map.insert(302, ErrorInfo::new("Invalid patient record"));
    map.insert(303, ErrorInfo::new("Invalid trial protocol"));

    // System errors (0400-0499)
    map.insert(400, ErrorInfo::new("Internal error"));
    map.insert(401, ErrorInfo::new("I/O error"));
    map.insert(402, ErrorInfo::new("Configuration error"));
    map.insert(406, ErrorInfo::new("Invalid format"));

    map
});

// Parse errors
pub const TM0001: ErrorCode = ErrorCode::new(1);
pub const TM0002: ErrorCode = ErrorCode::new(2);
pub const TM0003: ErrorCode = ErrorCode::new(3);
pub const TM0004: ErrorCode = ErrorCode::new(4);
pub const TM0005: ErrorCode = ErrorCode::new(5);
pub const TM0006: ErrorCode = ErrorCode::new(6);

// Configuration errors
pub const TM0100: ErrorCode = ErrorCode::new(100);
pub const TM0101: ErrorCode = ErrorCode::new(101);
pub const TM0102: ErrorCode = ErrorCode::new(102);
pub const TM0103: ErrorCode = ErrorCode::new(103);
pub const TM0104: ErrorCode = ErrorCode::new(104);
pub const TM0105: ErrorCode = ErrorCode::new(105);
pub const TM0106: ErrorCode = ErrorCode::new(106);
pub const TM0107: ErrorCode = ErrorCode::new(107);
pub const TM0108: ErrorCode = ErrorCode::new(108);

// Evaluation errors
pub const TM0200: ErrorCode = ErrorCode::new(200);

// Data errors
pub const TM0300: ErrorCode = ErrorCode::new(300);
pub const TM0301: ErrorCode = ErrorCode::new(301);
pub const TM0302: ErrorCode = ErrorCode::new(302);
pub const TM0303: ErrorCode = ErrorCode::new(303);

// System errors
pub const TM0400: ErrorCode = ErrorCode::new(400);
pub const TM0401: ErrorCode = ErrorCode::new(401);
pub const TM0402: ErrorCode = ErrorCode::new(402);
pub const TM0406: ErrorCode = ErrorCode::new(406);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(TM0001.to_string(), "TM0001");
        assert_eq!(TM0103.to_string(), "TM0103");
    }

    #[test]
    fn test_error_code_ranges() {
        assert!(TM0003.is_parse_error());
        assert!(TM0101.is_configuration_error());
        assert!(TM0200.is_evaluation_error());
        assert!(TM0301.is_data_error());
        assert!(TM0401.is_system_error());
        assert!(!TM0101.is_parse_error());
    }

    #[test]
    fn test_error_info() {
        assert_eq!(TM0301.info().description, "Cycle in is-a hierarchy");
        assert!(TM0103.info().help.is_some());
        assert_eq!(ErrorCode::new(999).info().description, "Unknown error");
    }
}
