//! Foundation types for TreeTracker tree captures.
//!
//! Every other `tt-*` crate depends on `tt-types`.
//!
//! # Key Types
//!
//! - [`Planter`] -- Capability set shared by all planter representations
//! - [`PlanterDetail`] -- The storage-backed planter
//! - [`DetachedPlanter`] -- An in-memory planter that has not been saved
//! - [`Identification`] -- A verification record for a planter
//! - [`TreeCapture`] -- The persisted record of one planting event
//! - [`TreeServiceData`] -- Captured image bytes plus a [`Location`]
//! - [`DocumentRef`] -- Location of a payload in the document store
//!
//! Relationships are expressed with keys, never with live references: a
//! planter owns a set of [`IdentificationId`]s, an identification owns a set
//! of [`TreeCaptureId`]s, and each child keeps its parent's key.

pub mod capture;
pub mod document;
pub mod error;
pub mod identification;
pub mod ids;
pub mod planter;

pub use capture::{Location, TreeCapture, TreeServiceData};
pub use document::DocumentRef;
pub use error::TypeError;
pub use identification::Identification;
pub use ids::{IdentificationId, PlanterId, TreeCaptureId};
pub use planter::{DetachedPlanter, Planter, PlanterDetail, PlanterProfile};
