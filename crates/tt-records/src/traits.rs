use async_trait::async_trait;
use tt_types::{
    Identification, IdentificationId, PlanterDetail, PlanterId, TreeCapture, TreeCaptureId,
};

use crate::change::{ChangeSet, CommitSummary};
use crate::error::RecordResult;

/// Transactional store for planters, identifications, and tree captures.
///
/// Reads return committed state only. [`RecordStore::commit`] is
/// all-or-nothing: either every mutation in the change set becomes durable,
/// or the committed state is exactly what it was before the call.
#[async_trait]
pub trait RecordStore: Send + Sync {
    fn planter(&self, id: &PlanterId) -> RecordResult<Option<PlanterDetail>>;

    fn identification(&self, id: &IdentificationId) -> RecordResult<Option<Identification>>;

    fn tree_capture(&self, id: &TreeCaptureId) -> RecordResult<Option<TreeCapture>>;

    /// All planters, ordered by ID.
    fn planters(&self) -> RecordResult<Vec<PlanterDetail>>;

    /// All tree captures, ordered by ID.
    fn tree_captures(&self) -> RecordResult<Vec<TreeCapture>>;

    /// Identifications owned by a planter. Empty if the planter is unknown.
    fn identifications_of(&self, planter: &PlanterId) -> RecordResult<Vec<Identification>>;

    /// Durably apply a change set.
    async fn commit(&self, changes: ChangeSet) -> RecordResult<CommitSummary>;
}
