use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use tracing::debug;
use tt_types::{
    Identification, IdentificationId, PlanterDetail, PlanterId, TreeCapture, TreeCaptureId,
};

use crate::change::{ChangeSet, CommitSummary};
use crate::error::{RecordError, RecordResult};
use crate::state::RecordState;
use crate::traits::RecordStore;

/// In-memory record store for tests, local demos, and embedding.
pub struct InMemoryRecordStore {
    inner: RwLock<RecordState>,
    commits: AtomicU64,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::with_state(RecordState::new())
    }

    pub fn with_state(state: RecordState) -> Self {
        Self {
            inner: RwLock::new(state),
            commits: AtomicU64::new(0),
        }
    }

    /// Number of successful commits since creation.
    pub fn commit_count(&self) -> u64 {
        self.commits.load(Ordering::SeqCst)
    }

    /// A copy of the committed state.
    pub fn snapshot(&self) -> RecordResult<RecordState> {
        self.read(|state| state.clone())
    }

    fn read<T>(&self, f: impl FnOnce(&RecordState) -> T) -> RecordResult<T> {
        let state = self.inner.read().map_err(|_| RecordError::LockPoisoned)?;
        Ok(f(&state))
    }
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    fn planter(&self, id: &PlanterId) -> RecordResult<Option<PlanterDetail>> {
        self.read(|state| state.planter(id).cloned())
    }

    fn identification(&self, id: &IdentificationId) -> RecordResult<Option<Identification>> {
        self.read(|state| state.identification(id).cloned())
    }

    fn tree_capture(&self, id: &TreeCaptureId) -> RecordResult<Option<TreeCapture>> {
        self.read(|state| state.tree_capture(id).cloned())
    }

    fn planters(&self) -> RecordResult<Vec<PlanterDetail>> {
        self.read(|state| state.planters().cloned().collect())
    }

    fn tree_captures(&self) -> RecordResult<Vec<TreeCapture>> {
        self.read(|state| state.tree_captures().cloned().collect())
    }

    fn identifications_of(&self, planter: &PlanterId) -> RecordResult<Vec<Identification>> {
        self.read(|state| {
            state
                .identifications_of(planter)
                .into_iter()
                .cloned()
                .collect()
        })
    }

    async fn commit(&self, changes: ChangeSet) -> RecordResult<CommitSummary> {
        let mut state = self.inner.write().map_err(|_| RecordError::LockPoisoned)?;

        let mut next = state.clone();
        let summary = next.apply(&changes)?;
        *state = next;

        let seq = self.commits.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(seq, mutations = changes.len(), "records committed");
        Ok(summary)
    }
}

impl std::fmt::Debug for InMemoryRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let records = self
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("InMemoryRecordStore")
            .field("record_count", &records)
            .field("commits", &self.commit_count())
            .finish()
    }
}
