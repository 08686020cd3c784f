//! Disease Ontology graph for trialmatch
//!
//! The [`DoidModel`] answers type-membership questions over the DOID is-a
//! hierarchy ("is this tumor a lung cancer?"). Ancestor closures are
//! computed once when the model is built; afterwards the model is read-only
//! and can be shared between threads behind an `Arc`.
//!
//! Unknown DOIDs are never errors: their closure is the id itself.

pub mod config;
pub mod constants;
mod error;
pub mod loader;
mod model;

pub use config::{AdenoSquamousMapping, DoidManualConfig};
pub use error::DoidError;
pub use loader::{load_obograph, parse_obograph};
pub use model::{DoidModel, DoidModelBuilder, DoidNode, DoidRelation};
