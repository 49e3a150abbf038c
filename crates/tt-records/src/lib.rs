//! Transactional record store for TreeTracker.
//!
//! This crate holds the structured side of a tree save. It provides:
//! - `RecordStore` trait boundary with all-or-nothing commits
//! - `ChangeSet` / `Mutation` describing pending writes
//! - `UnitOfWork`, the staged-changes object a workflow threads through
//! - `RecordState`, the keyed arena that maintains both sides of every
//!   planter → identification → tree capture relationship
//! - `InMemoryRecordStore` for tests and embedding
//! - `JsonFileRecordStore` persisting a JSON snapshot with atomic replace

pub mod change;
pub mod error;
pub mod file;
pub mod memory;
pub mod state;
pub mod traits;
pub mod work;

pub use change::{ChangeSet, CommitSummary, Mutation};
pub use error::{RecordError, RecordKind, RecordResult};
pub use file::JsonFileRecordStore;
pub use memory::InMemoryRecordStore;
pub use state::RecordState;
pub use traits::RecordStore;
pub use work::UnitOfWork;
