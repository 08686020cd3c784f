//! Trialmatch evaluation engine
//!
//! This crate turns criterion trees into evaluators and runs them against
//! patient records:
//!
//! - [`algebra`]: AND, OR, NOT, FALLBACK and the WARN transforms over
//!   [`Evaluation`](trialmatch_types::Evaluation) values
//! - [`FunctionInputResolver`]: validates and decodes the untyped parameters
//!   of a rule according to its declared input shape
//! - [`RuleRegistry`]: maps every catalogued rule to the creator that builds
//!   its evaluator
//! - [`EligibilityEngine`] and [`TrialMatcher`]: criterion and trial level
//!   evaluation
//!
//! # Result lattice
//!
//! Evaluations are six-valued. AND lets the weakest verdict win
//! (`FAIL < UNDETERMINED < NOT_EVALUATED < NOT_IMPLEMENTED < WARN < PASS`),
//! OR the strongest (`FAIL < NOT_EVALUATED < NOT_IMPLEMENTED < UNDETERMINED
//! < WARN < PASS`). Missing patient data never raises an error; it yields
//! UNDETERMINED with a message saying what is missing.
//!
//! # Example
//!
//! ```ignore
//! use trialmatch_eval::{EligibilityEngine, EvaluationConfig};
//!
//! let engine = EligibilityEngine::new(doid_model, EvaluationConfig::default())?;
//! let evaluation = engine.evaluate(&expression, &patient)?;
//! println!("{}", evaluation);
//! ```

pub mod algebra;
pub mod composite;
pub mod config;
pub mod context;
pub mod engine;
pub mod function;
mod functions;
pub mod matcher;
pub mod registry;
pub mod resolver;

pub use config::EvaluationConfig;
pub use context::RuleContext;
pub use engine::EligibilityEngine;
pub use function::EvaluationFunction;
pub use matcher::{CohortMatch, CompiledTrial, CriterionEvaluation, TrialMatch, TrialMatcher};
pub use registry::{CompositeCreator, LeafCreator, RuleCreator, RuleRegistry};
pub use resolver::FunctionInputResolver;
