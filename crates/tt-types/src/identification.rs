use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::DocumentRef;
use crate::ids::{IdentificationId, PlanterId, TreeCaptureId};

/// A verification record for a planter.
///
/// New tree captures are attributed to the planter's latest identification.
/// Identifications carry no ordering field; they are ordered by `created_at`
/// only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identification {
    pub id: IdentificationId,
    /// Key of the owning planter.
    pub planter: PlanterId,
    /// `None` for records migrated without a timestamp.
    pub created_at: Option<DateTime<Utc>>,
    /// Verification selfie, if one was taken.
    pub photo: Option<DocumentRef>,
    /// Tree captures attributed to this identification.
    pub trees: BTreeSet<TreeCaptureId>,
}

impl Identification {
    /// A new identification for `planter`, created now.
    pub fn new(planter: PlanterId) -> Self {
        Self::dated(planter, Utc::now())
    }

    /// A new identification for `planter` with an explicit creation time.
    pub fn dated(planter: PlanterId, created_at: DateTime<Utc>) -> Self {
        Self {
            id: IdentificationId::new(),
            planter,
            created_at: Some(created_at),
            photo: None,
            trees: BTreeSet::new(),
        }
    }

    pub fn with_photo(mut self, photo: DocumentRef) -> Self {
        self.photo = Some(photo);
        self
    }
}
