pub mod admission;

pub use admission::{AdmissionModel, DECISION_THRESHOLD};
