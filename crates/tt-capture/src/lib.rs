//! Tree save workflow for TreeTracker.
//!
//! A save resolves the planter's latest identification, writes the photo to
//! a [`tt_documents::DocumentStore`], stages the new tree capture and its
//! link in a [`tt_records::UnitOfWork`], and commits it. Failures map to one
//! [`TreeServiceError`] each; nothing is retried.

pub mod config;
pub mod error;
pub mod resolver;
pub mod service;

pub use config::{OrphanedPhotoPolicy, TreeServiceConfig};
pub use error::{TreeServiceError, TreeServiceResult};
pub use resolver::resolve_latest;
pub use service::{LocalTreeService, TreeService};
