use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard};

use async_trait::async_trait;
use tt_types::DocumentRef;

use crate::error::{validate_key, DocumentError, DocumentResult};
use crate::traits::DocumentStore;

const SCHEME: &str = "mem://";

/// In-memory, HashMap-based document store.
///
/// Intended for tests and embedding. Payloads are held behind a `RwLock`
/// and cloned on read/write. References have the form `mem://<key>`.
pub struct InMemoryDocumentStore {
    documents: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryDocumentStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
        }
    }

    /// Read-only view for the inspection helpers below.
    ///
    /// These report on the map even after a writer panicked, while the
    /// [`DocumentStore`] methods fail with [`DocumentError::LockPoisoned`].
    fn snapshot(&self) -> RwLockReadGuard<'_, HashMap<String, Vec<u8>>> {
        self.documents.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of documents currently stored.
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total bytes across all stored documents.
    pub fn total_bytes(&self) -> u64 {
        self.snapshot()
            .values()
            .map(|data| data.len() as u64)
            .sum()
    }

    /// Sorted list of all keys in the store.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.snapshot().keys().cloned().collect();
        keys.sort();
        keys
    }

    fn key_of<'r>(&self, reference: &'r DocumentRef) -> DocumentResult<&'r str> {
        reference
            .as_str()
            .strip_prefix(SCHEME)
            .ok_or_else(|| DocumentError::ForeignReference(reference.clone()))
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn store(&self, data: &[u8], key: &str) -> DocumentResult<DocumentRef> {
        validate_key(key)?;
        let mut map = self
            .documents
            .write()
            .map_err(|_| DocumentError::LockPoisoned)?;
        map.insert(key.to_string(), data.to_vec());
        Ok(DocumentRef::new(format!("{SCHEME}{key}")))
    }

    async fn read(&self, reference: &DocumentRef) -> DocumentResult<Option<Vec<u8>>> {
        let key = self.key_of(reference)?;
        let map = self
            .documents
            .read()
            .map_err(|_| DocumentError::LockPoisoned)?;
        Ok(map.get(key).cloned())
    }

    async fn remove(&self, reference: &DocumentRef) -> DocumentResult<bool> {
        let key = self.key_of(reference)?;
        let mut map = self
            .documents
            .write()
            .map_err(|_| DocumentError::LockPoisoned)?;
        Ok(map.remove(key).is_some())
    }
}

impl std::fmt::Debug for InMemoryDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryDocumentStore")
            .field("document_count", &self.len())
            .finish()
    }
}
