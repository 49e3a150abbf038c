use tt_types::DocumentRef;

/// Errors from document store operations.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// The key is empty or would escape the store root.
    #[error("invalid document key: {0:?}")]
    InvalidKey(String),

    /// The reference does not belong to this store.
    #[error("document reference not owned by this store: {0}")]
    ForeignReference(DocumentRef),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Storage backend is read-only or otherwise unavailable.
    #[error("document store is read-only")]
    ReadOnly,

    /// A lock guarding in-memory state was poisoned by a panicking writer.
    #[error("document store lock poisoned")]
    LockPoisoned,
}

/// Result alias for document store operations.
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Reject keys that are empty or could address something outside the store.
pub(crate) fn validate_key(key: &str) -> DocumentResult<()> {
    let bad = key.is_empty()
        || key == "."
        || key.contains("..")
        || key.contains(['/', '\\', '\0']);
    if bad {
        return Err(DocumentError::InvalidKey(key.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_uuid_keys() {
        validate_key("0b6cc7a4-3f3e-4c47-9d0c-8f6f0f1b2a3c").unwrap();
        validate_key("tree_1").unwrap();
    }

    #[test]
    fn rejects_escaping_keys() {
        for key in ["", ".", "..", "a/b", "..\\x", "a\0b"] {
            assert!(
                matches!(validate_key(key), Err(DocumentError::InvalidKey(_))),
                "{key:?} should be rejected"
            );
        }
    }
}
