//! Trialmatch core types
//!
//! This crate defines the values every other trialmatch crate exchanges:
//! - [`EvaluationResult`] and [`Evaluation`]: the six-valued verdict and its messages
//! - [`Rule`]: the closed rule catalogue with per-rule input shapes
//! - [`RuleExpression`]: criterion trees built from rules and parameters
//! - [`RuleInput`] / [`ResolvedInput`]: declared parameter shapes and their decoded form
//! - Trial, cohort and eligibility definitions

pub mod evaluation;
pub mod expression;
pub mod input;
pub mod rule;
pub mod trial;
pub mod values;

pub use evaluation::{Evaluation, EvaluationBuilder, EvaluationResult};
pub use expression::{Parameter, RuleExpression};
pub use input::{CompositeArity, ResolvedInput, RuleInput};
pub use rule::{Rule, RuleGroup, UnknownRule};
pub use trial::{Cohort, CohortMetadata, CriterionReference, Eligibility, Trial, TrialIdentification};
pub use values::{DoidTerm, Gender, TreatmentCategory, TumorStage, ValueParseError};
