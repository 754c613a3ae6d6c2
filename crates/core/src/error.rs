//! Error types for the patternlab domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error type.

use thiserror::Error;

/// The top-level error type for shared-utility operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Blackboard error: {0}")]
    Blackboard(#[from] BlackboardError),

    #[error("Handoff error: {0}")]
    Handoff(#[from] HandoffError),

    #[error("Risk error: {0}")]
    Risk(#[from] RiskError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlackboardError {
    #[error("Key not found on blackboard '{board}': {key}")]
    NotFound { board: String, key: String },

    #[error("Blackboard serialization failed: {0}")]
    Serialization(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandoffError {
    #[error("Context package is missing required field: {0}")]
    MissingField(&'static str),

    #[error("Malformed context package: {0}")]
    Malformed(String),

    #[error("At least one context package is required to merge")]
    NothingToMerge,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RiskError {
    #[error("At least one risk score is required")]
    NoScores,

    #[error("Weights must be non-negative, got {weight} for {risk_type}")]
    NegativeWeight { risk_type: String, weight: f64 },
}

/// One rule a payload broke.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{schema} failed validation with {} violation(s)", .violations.len())]
    Invalid {
        schema: &'static str,
        violations: Vec<FieldViolation>,
    },

    #[error("Unknown schema: {0}")]
    UnknownSchema(String),

    #[error("Malformed payload: {0}")]
    Malformed(String),
}

impl ValidationError {
    /// The individual violations, empty for non-rule failures.
    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            Self::Invalid { violations, .. } => violations,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blackboard_error_displays_key() {
        let err = Error::Blackboard(BlackboardError::NotFound {
            board: "ProductDesign".into(),
            key: "design_specs".into(),
        });
        assert!(err.to_string().contains("ProductDesign"));
        assert!(err.to_string().contains("design_specs"));
    }

    #[test]
    fn validation_error_counts_violations() {
        let err = ValidationError::Invalid {
            schema: "SupportTicket",
            violations: vec![
                FieldViolation::new("ticket_id", "must match TKT-NNNNNN"),
                FieldViolation::new("subject", "must be at least 5 characters"),
            ],
        };
        assert!(err.to_string().contains("2 violation(s)"));
        assert_eq!(err.violations().len(), 2);
        assert_eq!(err.violations()[0].to_string(), "ticket_id: must match TKT-NNNNNN");
    }

    #[test]
    fn non_rule_errors_have_no_violations() {
        assert!(ValidationError::UnknownSchema("foo".into()).violations().is_empty());
    }
}
