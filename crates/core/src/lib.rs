//! # patternlab core
//!
//! Domain enums and error definitions shared by every patternlab crate.
//! The crate stays dependency-light so that the orchestration utilities,
//! the benchmark simulators and the script runner all depend inward on it.

pub mod error;
pub mod framework;

pub use error::{
    BlackboardError, Error, FieldViolation, HandoffError, Result, RiskError, ValidationError,
};
pub use framework::Framework;
