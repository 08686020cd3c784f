//! Trialmatch diagnostics and error handling
//!
//! This crate provides the error handling infrastructure shared by every
//! trialmatch crate: structured error codes, source locations for criterion
//! text, paths into rule expression trees and diagnostic reporting.

mod error;
mod error_code;
mod path;
mod span;

pub use error::*;
pub use error_code::*;
pub use path::*;
pub use span::*;

/// Result type for trialmatch operations
pub type Result<T> = std::result::Result<T, TrialMatchError>;
