use std::fmt;

/// The kind of record an error refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordKind {
    Planter,
    Identification,
    TreeCapture,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Planter => write!(f, "planter"),
            Self::Identification => write!(f, "identification"),
            Self::TreeCapture => write!(f, "tree capture"),
        }
    }
}

/// Errors produced by record store operations.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: RecordKind, id: String },

    #[error("duplicate {kind} key: {id}")]
    DuplicateKey { kind: RecordKind, id: String },

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("record store lock poisoned")]
    LockPoisoned,
}

impl RecordError {
    pub(crate) fn not_found(kind: RecordKind, id: impl fmt::Display) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub(crate) fn duplicate(kind: RecordKind, id: impl fmt::Display) -> Self {
        Self::DuplicateKey {
            kind,
            id: id.to_string(),
        }
    }
}

/// Result alias for record store operations.
pub type RecordResult<T> = Result<T, RecordError>;
