use tt_documents::DocumentError;
use tt_records::RecordError;

/// Errors produced by the tree save workflow.
///
/// Exactly one error is returned per failed save. Nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum TreeServiceError {
    /// The planter is not a persisted record known to the record store.
    #[error("planter is not a persisted planter record")]
    Planter,

    /// The planter has no identification with a creation date.
    #[error("planter has no dated identification")]
    Identification,

    /// The photo could not be written to the document store.
    #[error("failed to store capture photo")]
    DocumentStorage(#[source] DocumentError),

    /// A record store failure, surfaced as the store reported it.
    #[error(transparent)]
    Record(#[from] RecordError),
}

pub type TreeServiceResult<T> = Result<T, TreeServiceError>;
