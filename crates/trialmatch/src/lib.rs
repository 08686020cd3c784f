//! Clinical trial eligibility matching for Rust
//!
//! This crate bundles the trialmatch workspace:
//! - parsing curated criteria such as `AND(IS_AT_LEAST_X_YEARS_OLD[18], NOT(IS_PREGNANT))`
//! - resolving and validating rule inputs against the rule catalogue
//! - evaluating criteria against patient records with the six-valued result algebra
//! - querying the Disease Ontology (DOID) hierarchy
//! - loading trial protocols and matching patients against them
//!
//! # Example
//!
//! ```ignore
//! use trialmatch::{EligibilityEngine, EvaluationConfig, PatientRecord, parse_criterion};
//!
//! let engine = EligibilityEngine::new(doid_model, EvaluationConfig::default())?;
//! let criterion = parse_criterion("AND(IS_AT_LEAST_X_YEARS_OLD[18], HAS_MEASURABLE_DISEASE)")?;
//! let evaluation = engine.evaluate(&criterion, &PatientRecord::from_path("patient.json")?)?;
//! println!("{}", evaluation.result());
//! ```

pub use trialmatch_diagnostics as diagnostics;
pub use trialmatch_doid as doid;
pub use trialmatch_eval as eval;
pub use trialmatch_model as model;
pub use trialmatch_parser as parser;
pub use trialmatch_types as types;

pub mod protocol;

pub use protocol::{LintFinding, ProtocolFile, lint_protocol};
pub use trialmatch_diagnostics::{Result, TrialMatchError};
pub use trialmatch_doid::DoidModel;
pub use trialmatch_eval::{EligibilityEngine, EvaluationConfig, TrialMatch, TrialMatcher};
pub use trialmatch_model::PatientRecord;
pub use trialmatch_parser::parse_criterion;
pub use trialmatch_types::{Evaluation, EvaluationResult, Rule, RuleExpression, Trial};

#[cfg(feature = "cli")]
pub mod cli;
