use async_trait::async_trait;
use tt_types::DocumentRef;

use crate::error::DocumentResult;

/// Key-addressed storage for binary payloads such as capture photos.
///
/// All implementations must satisfy these invariants:
/// - `store` persists the bytes under the caller-chosen key and returns a
///   stable reference. Storing the same key again overwrites it, so an
///   external retry is safe.
/// - The store never interprets payload contents.
/// - All I/O errors are propagated, never silently ignored.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persist `data` under `key` and return its location.
    async fn store(&self, data: &[u8], key: &str) -> DocumentResult<DocumentRef>;

    /// Read a payload back. Returns `Ok(None)` if nothing is stored there.
    async fn read(&self, reference: &DocumentRef) -> DocumentResult<Option<Vec<u8>>>;

    /// Remove a payload. Returns `true` if it existed.
    async fn remove(&self, reference: &DocumentRef) -> DocumentResult<bool>;

    /// Check whether a payload exists.
    async fn exists(&self, reference: &DocumentRef) -> DocumentResult<bool> {
        Ok(self.read(reference).await?.is_some())
    }
}
