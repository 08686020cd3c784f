//! Patient record model for trialmatch
//!
//! A [`PatientRecord`] is the read-only view of one patient that leaf
//! predicates evaluate against. Every clinical field that a feed may leave
//! empty is an `Option`: predicates turn missing data into UNDETERMINED
//! rather than guessing.

mod error;
pub mod history;
pub mod lab;
pub mod molecular;
mod patient;

pub use error::ModelError;
pub use history::{PriorCondition, TreatmentHistoryEntry};
pub use lab::{LabMeasurement, LabValue};
pub use molecular::{Amplification, DriverLikelihood, Fusion, HlaAllele, Loss, MolecularTest, Variant};
pub use patient::{ClinicalStatus, PatientRecord, TumorDetails};
