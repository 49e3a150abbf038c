use serde::{Deserialize, Serialize};
use tt_types::{Identification, IdentificationId, PlanterDetail, TreeCapture, TreeCaptureId};

/// A single staged mutation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Mutation {
    /// Insert a new planter.
    InsertPlanter(PlanterDetail),
    /// Replace the profile and flags of an existing planter.
    ///
    /// The identification set is owned by the store and is left untouched.
    UpdatePlanter(PlanterDetail),
    /// Insert an identification and attach it to its planter.
    InsertIdentification(Identification),
    /// Insert a tree capture. It must also be linked in the same change set.
    InsertTreeCapture(TreeCapture),
    /// Add a tree capture to an identification's collection.
    LinkTreeCapture {
        identification: IdentificationId,
        tree: TreeCaptureId,
    },
    /// Flip the upload flag of a tree capture.
    SetTreeUploaded { tree: TreeCaptureId, uploaded: bool },
}

impl Mutation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::InsertPlanter(_) => "insert_planter",
            Self::UpdatePlanter(_) => "update_planter",
            Self::InsertIdentification(_) => "insert_identification",
            Self::InsertTreeCapture(_) => "insert_tree_capture",
            Self::LinkTreeCapture { .. } => "link_tree_capture",
            Self::SetTreeUploaded { .. } => "set_tree_uploaded",
        }
    }
}

/// An ordered set of pending mutations, committed all-or-nothing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChangeSet {
    mutations: Vec<Mutation>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, mutation: Mutation) {
        self.mutations.push(mutation);
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Mutation> {
        self.mutations.iter()
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = &'a Mutation;
    type IntoIter = std::slice::Iter<'a, Mutation>;

    fn into_iter(self) -> Self::IntoIter {
        self.mutations.iter()
    }
}

impl FromIterator<Mutation> for ChangeSet {
    fn from_iter<T: IntoIterator<Item = Mutation>>(iter: T) -> Self {
        Self {
            mutations: iter.into_iter().collect(),
        }
    }
}

/// What a successful commit did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    pub inserted: usize,
    pub linked: usize,
    pub updated: usize,
}

impl CommitSummary {
    pub fn total(&self) -> usize {
        self.inserted + self.linked + self.updated
    }
}
