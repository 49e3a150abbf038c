//! Document storage for TreeTracker capture photos.
//!
//! The document store is the blob side of a tree save: it persists opaque
//! payloads under a caller-chosen key and hands back a [`DocumentRef`] that
//! the record store keeps on the owning record.
//!
//! # Storage Backends
//!
//! All backends implement the [`DocumentStore`] trait:
//!
//! - [`InMemoryDocumentStore`] -- `HashMap`-based store for tests and embedding
//! - [`FsDocumentStore`] -- one file per document under a root directory
//!
//! # Design Rules
//!
//! 1. Keys are chosen by the caller; storing a key twice overwrites it.
//! 2. Keys never contain path separators or `..`.
//! 3. The store never interprets payload contents.
//! 4. All I/O errors are propagated, never silently ignored.
//!
//! [`DocumentRef`]: tt_types::DocumentRef

pub mod error;
pub mod fs;
pub mod memory;
pub mod traits;

pub use error::{DocumentError, DocumentResult};
pub use fs::FsDocumentStore;
pub use memory::InMemoryDocumentStore;
pub use traits::DocumentStore;
