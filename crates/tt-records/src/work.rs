//! The unit of work: staged record mutations with a single commit.

use tt_types::{
    Identification, IdentificationId, PlanterDetail, PlanterId, TreeCapture, TreeCaptureId,
};

use crate::change::{ChangeSet, CommitSummary, Mutation};
use crate::error::RecordResult;
use crate::traits::RecordStore;

/// Pending changes against a [`RecordStore`].
///
/// Nothing is visible to other readers until [`UnitOfWork::commit`]. The
/// navigation reads on this type see staged inserts layered over committed
/// state. Dropping a unit of work discards it.
pub struct UnitOfWork<'a> {
    store: &'a dyn RecordStore,
    changes: ChangeSet,
}

impl<'a> UnitOfWork<'a> {
    pub fn new(store: &'a dyn RecordStore) -> Self {
        Self {
            store,
            changes: ChangeSet::new(),
        }
    }

    pub fn changes(&self) -> &ChangeSet {
        &self.changes
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    // ---------------------------------------------------------------
    // Staging
    // ---------------------------------------------------------------

    pub fn insert_planter(&mut self, planter: PlanterDetail) -> PlanterId {
        let id = planter.id.clone();
        self.changes.push(Mutation::InsertPlanter(planter));
        id
    }

    pub fn update_planter(&mut self, planter: PlanterDetail) {
        self.changes.push(Mutation::UpdatePlanter(planter));
    }

    pub fn insert_identification(&mut self, identification: Identification) -> IdentificationId {
        let id = identification.id.clone();
        self.changes
            .push(Mutation::InsertIdentification(identification));
        id
    }

    pub fn insert_tree_capture(&mut self, tree: TreeCapture) -> TreeCaptureId {
        let id = tree.id.clone();
        self.changes.push(Mutation::InsertTreeCapture(tree));
        id
    }

    /// Add a tree capture to an identification's collection.
    pub fn link_tree_capture(&mut self, identification: &IdentificationId, tree: &TreeCaptureId) {
        self.changes.push(Mutation::LinkTreeCapture {
            identification: identification.clone(),
            tree: tree.clone(),
        });
    }

    pub fn set_tree_uploaded(&mut self, tree: &TreeCaptureId, uploaded: bool) {
        self.changes.push(Mutation::SetTreeUploaded {
            tree: tree.clone(),
            uploaded,
        });
    }

    // ---------------------------------------------------------------
    // Navigation
    // ---------------------------------------------------------------

    /// Look up a planter, preferring the most recent staged version.
    pub fn planter(&self, id: &PlanterId) -> RecordResult<Option<PlanterDetail>> {
        let staged = self.changes.iter().rev().find_map(|m| match m {
            Mutation::InsertPlanter(p) | Mutation::UpdatePlanter(p) if &p.id == id => Some(p),
            _ => None,
        });
        match staged {
            Some(p) => Ok(Some(p.clone())),
            None => self.store.planter(id),
        }
    }

    /// Identifications owned by `planter`, committed and staged.
    pub fn identifications_of(&self, planter: &PlanterId) -> RecordResult<Vec<Identification>> {
        let mut identifications = self.store.identifications_of(planter)?;
        identifications.extend(self.changes.iter().filter_map(|m| match m {
            Mutation::InsertIdentification(i) if &i.planter == planter => Some(i.clone()),
            _ => None,
        }));
        Ok(identifications)
    }

    /// Look up a tree capture, staged or committed.
    pub fn tree_capture(&self, id: &TreeCaptureId) -> RecordResult<Option<TreeCapture>> {
        let staged = self.changes.iter().rev().find_map(|m| match m {
            Mutation::InsertTreeCapture(t) if &t.id == id => Some(t),
            _ => None,
        });
        match staged {
            Some(t) => Ok(Some(t.clone())),
            None => self.store.tree_capture(id),
        }
    }

    /// Commit every staged mutation atomically.
    pub async fn commit(self) -> RecordResult<CommitSummary> {
        self.store.commit(self.changes).await
    }
}

impl std::fmt::Debug for UnitOfWork<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitOfWork")
            .field("pending", &self.changes.len())
            .finish()
    }
}
