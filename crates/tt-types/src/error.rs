use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid {kind} id: {reason}")]
    InvalidId { kind: &'static str, reason: String },

    #[error("invalid coordinate {field}: {value}")]
    InvalidCoordinate { field: &'static str, value: String },
}
