//! The record arena and the rules for applying a change set to it.
//!
//! Relationships are stored as keys on both sides: a planter owns the set of
//! its identification IDs, an identification owns the set of its tree capture
//! IDs, and every child keeps its parent's key. [`RecordState::apply`] is the
//! only place that maintains both sides.

use std::collections::{BTreeMap, BTreeSet};

use tt_types::{
    Identification, IdentificationId, PlanterDetail, PlanterId, TreeCapture, TreeCaptureId,
};

use crate::change::{ChangeSet, CommitSummary, Mutation};
use crate::error::{RecordError, RecordKind, RecordResult};

/// All committed records, keyed by ID.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordState {
    planters: BTreeMap<PlanterId, PlanterDetail>,
    identifications: BTreeMap<IdentificationId, Identification>,
    tree_captures: BTreeMap<TreeCaptureId, TreeCapture>,
}

impl RecordState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn planter(&self, id: &PlanterId) -> Option<&PlanterDetail> {
        self.planters.get(id)
    }

    pub fn identification(&self, id: &IdentificationId) -> Option<&Identification> {
        self.identifications.get(id)
    }

    pub fn tree_capture(&self, id: &TreeCaptureId) -> Option<&TreeCapture> {
        self.tree_captures.get(id)
    }

    pub fn planters(&self) -> impl Iterator<Item = &PlanterDetail> {
        self.planters.values()
    }

    pub fn identifications(&self) -> impl Iterator<Item = &Identification> {
        self.identifications.values()
    }

    pub fn tree_captures(&self) -> impl Iterator<Item = &TreeCapture> {
        self.tree_captures.values()
    }

    /// Identifications owned by `planter`, following the planter's key set.
    pub fn identifications_of(&self, planter: &PlanterId) -> Vec<&Identification> {
        self.planters
            .get(planter)
            .map(|p| {
                p.identifications
                    .iter()
                    .filter_map(|id| self.identifications.get(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.planters.len() + self.identifications.len() + self.tree_captures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply every mutation in order.
    ///
    /// On error the state may be partially modified; callers apply to a copy
    /// and keep it only on success.
    pub fn apply(&mut self, changes: &ChangeSet) -> RecordResult<CommitSummary> {
        let mut summary = CommitSummary::default();
        let mut inserted_trees = BTreeSet::new();

        for mutation in changes {
            match mutation {
                Mutation::InsertPlanter(planter) => {
                    self.insert_planter(planter)?;
                    summary.inserted += 1;
                }
                Mutation::UpdatePlanter(planter) => {
                    self.update_planter(planter)?;
                    summary.updated += 1;
                }
                Mutation::InsertIdentification(identification) => {
                    self.insert_identification(identification)?;
                    summary.inserted += 1;
                }
                Mutation::InsertTreeCapture(tree) => {
                    self.insert_tree_capture(tree)?;
                    inserted_trees.insert(tree.id.clone());
                    summary.inserted += 1;
                }
                Mutation::LinkTreeCapture {
                    identification,
                    tree,
                } => {
                    if self.link_tree_capture(identification, tree)? {
                        summary.linked += 1;
                    }
                }
                Mutation::SetTreeUploaded { tree, uploaded } => {
                    let capture = self
                        .tree_captures
                        .get_mut(tree)
                        .ok_or_else(|| RecordError::not_found(RecordKind::TreeCapture, tree))?;
                    capture.uploaded = *uploaded;
                    summary.updated += 1;
                }
            }
        }

        for tree in &inserted_trees {
            let linked = self
                .tree_captures
                .get(tree)
                .and_then(|capture| self.identifications.get(&capture.identification))
                .is_some_and(|identification| identification.trees.contains(tree));
            if !linked {
                return Err(RecordError::ConstraintViolation(format!(
                    "tree capture {tree} was inserted without being linked to its identification"
                )));
            }
        }

        Ok(summary)
    }

    fn insert_planter(&mut self, planter: &PlanterDetail) -> RecordResult<()> {
        if self.planters.contains_key(&planter.id) {
            return Err(RecordError::duplicate(RecordKind::Planter, &planter.id));
        }
        if !planter.identifications.is_empty() {
            return Err(RecordError::ConstraintViolation(format!(
                "planter {} must be inserted without identifications",
                planter.id
            )));
        }
        self.planters.insert(planter.id.clone(), planter.clone());
        Ok(())
    }

    fn update_planter(&mut self, planter: &PlanterDetail) -> RecordResult<()> {
        let existing = self
            .planters
            .get_mut(&planter.id)
            .ok_or_else(|| RecordError::not_found(RecordKind::Planter, &planter.id))?;
        existing.profile = planter.profile.clone();
        existing.uploaded = planter.uploaded;
        existing.accepted_terms = planter.accepted_terms;
        Ok(())
    }

    fn insert_identification(&mut self, identification: &Identification) -> RecordResult<()> {
        if self.identifications.contains_key(&identification.id) {
            return Err(RecordError::duplicate(
                RecordKind::Identification,
                &identification.id,
            ));
        }
        if !identification.trees.is_empty() {
            return Err(RecordError::ConstraintViolation(format!(
                "identification {} must be inserted without tree captures",
                identification.id
            )));
        }
        let planter = self
            .planters
            .get_mut(&identification.planter)
            .ok_or_else(|| RecordError::not_found(RecordKind::Planter, &identification.planter))?;
        planter.identifications.insert(identification.id.clone());
        self.identifications
            .insert(identification.id.clone(), identification.clone());
        Ok(())
    }

    fn insert_tree_capture(&mut self, tree: &TreeCapture) -> RecordResult<()> {
        if self.tree_captures.contains_key(&tree.id) {
            return Err(RecordError::duplicate(RecordKind::TreeCapture, &tree.id));
        }
        if tree.photo.is_empty() {
            return Err(RecordError::ConstraintViolation(format!(
                "tree capture {} has no photo reference",
                tree.id
            )));
        }
        if !self.identifications.contains_key(&tree.identification) {
            return Err(RecordError::not_found(
                RecordKind::Identification,
                &tree.identification,
            ));
        }
        self.tree_captures.insert(tree.id.clone(), tree.clone());
        Ok(())
    }

    /// Returns `true` if the link was new.
    fn link_tree_capture(
        &mut self,
        identification: &IdentificationId,
        tree: &TreeCaptureId,
    ) -> RecordResult<bool> {
        let capture = self
            .tree_captures
            .get(tree)
            .ok_or_else(|| RecordError::not_found(RecordKind::TreeCapture, tree))?;
        if &capture.identification != identification {
            return Err(RecordError::ConstraintViolation(format!(
                "tree capture {tree} belongs to identification {}, not {identification}",
                capture.identification
            )));
        }
        let owner = self
            .identifications
            .get_mut(identification)
            .ok_or_else(|| RecordError::not_found(RecordKind::Identification, identification))?;
        Ok(owner.trees.insert(tree.clone()))
    }

    /// Build a state from raw records, checking that both sides of every
    /// relationship agree. Repeated IDs are rejected.
    pub fn from_records(
        planters: Vec<PlanterDetail>,
        identifications: Vec<Identification>,
        tree_captures: Vec<TreeCapture>,
    ) -> RecordResult<Self> {
        let mut state = Self::new();
        for planter in planters {
            if state.planters.contains_key(&planter.id) {
                return Err(RecordError::duplicate(RecordKind::Planter, &planter.id));
            }
            state.planters.insert(planter.id.clone(), planter);
        }
        for identification in identifications {
            if state.identifications.contains_key(&identification.id) {
                return Err(RecordError::duplicate(
                    RecordKind::Identification,
                    &identification.id,
                ));
            }
            state
                .identifications
                .insert(identification.id.clone(), identification);
        }
        for tree in tree_captures {
            if state.tree_captures.contains_key(&tree.id) {
                return Err(RecordError::duplicate(RecordKind::TreeCapture, &tree.id));
            }
            state.tree_captures.insert(tree.id.clone(), tree);
        }
        state.check_relationships()?;
        Ok(state)
    }

    fn check_relationships(&self) -> RecordResult<()> {
        for planter in self.planters.values() {
            for id in &planter.identifications {
                let owned = self
                    .identifications
                    .get(id)
                    .is_some_and(|i| i.planter == planter.id);
                if !owned {
                    return Err(RecordError::ConstraintViolation(format!(
                        "planter {} lists identification {id} it does not own",
                        planter.id
                    )));
                }
            }
        }
        for identification in self.identifications.values() {
            let listed = self
                .planters
                .get(&identification.planter)
                .is_some_and(|p| p.identifications.contains(&identification.id));
            if !listed {
                return Err(RecordError::ConstraintViolation(format!(
                    "identification {} is not listed by planter {}",
                    identification.id, identification.planter
                )));
            }
        }
        for identification in self.identifications.values() {
            for id in &identification.trees {
                let owned = self
                    .tree_captures
                    .get(id)
                    .is_some_and(|t| t.identification == identification.id);
                if !owned {
                    return Err(RecordError::ConstraintViolation(format!(
                        "identification {} lists tree capture {id} it does not own",
                        identification.id
                    )));
                }
            }
        }
        for tree in self.tree_captures.values() {
            let listed = self
                .identifications
                .get(&tree.identification)
                .is_some_and(|i| i.trees.contains(&tree.id));
            if !listed {
                return Err(RecordError::ConstraintViolation(format!(
                    "tree capture {} is not listed by identification {}",
                    tree.id, tree.identification
                )));
            }
        }
        Ok(())
    }
}
