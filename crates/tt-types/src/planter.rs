use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{IdentificationId, PlanterId};

/// Identity fields shared by every planter representation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanterProfile {
    pub created_at: Option<DateTime<Utc>>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub organization: Option<String>,
    pub phone_number: Option<String>,
    /// The login identifier (usually the email or phone number).
    pub identifier: Option<String>,
}

impl PlanterProfile {
    /// First and last name joined by a space, skipping missing parts.
    pub fn display_name(&self) -> Option<String> {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}

/// Capability set of a planter.
///
/// Several representations satisfy it, but only [`PlanterDetail`] is backed
/// by the record store. Code that needs the persisted entity narrows with
/// [`Planter::as_persisted`] and treats `None` as a typed failure.
pub trait Planter: Send + Sync {
    fn profile(&self) -> &PlanterProfile;

    fn profile_mut(&mut self) -> &mut PlanterProfile;

    /// Whether the planter has been uploaded to the remote service.
    fn uploaded(&self) -> bool;

    fn set_uploaded(&mut self, uploaded: bool);

    fn accepted_terms(&self) -> bool;

    fn set_accepted_terms(&mut self, accepted: bool);

    /// Identification records attached to this planter, in no particular order.
    fn identification_ids(&self) -> &BTreeSet<IdentificationId>;

    /// Narrow to the storage-backed variant.
    fn as_persisted(&self) -> Option<&PlanterDetail> {
        None
    }
}

/// A planter as persisted in the record store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanterDetail {
    pub id: PlanterId,
    pub profile: PlanterProfile,
    pub uploaded: bool,
    pub accepted_terms: bool,
    /// Owned collection of identification keys.
    pub identifications: BTreeSet<IdentificationId>,
}

impl PlanterDetail {
    /// Create a new planter record with a fresh ID and `created_at = now`.
    pub fn new(mut profile: PlanterProfile) -> Self {
        if profile.created_at.is_none() {
            profile.created_at = Some(Utc::now());
        }
        Self {
            id: PlanterId::new(),
            profile,
            uploaded: false,
            accepted_terms: false,
            identifications: BTreeSet::new(),
        }
    }
}

impl Planter for PlanterDetail {
    fn profile(&self) -> &PlanterProfile {
        &self.profile
    }

    fn profile_mut(&mut self) -> &mut PlanterProfile {
        &mut self.profile
    }

    fn uploaded(&self) -> bool {
        self.uploaded
    }

    fn set_uploaded(&mut self, uploaded: bool) {
        self.uploaded = uploaded;
    }

    fn accepted_terms(&self) -> bool {
        self.accepted_terms
    }

    fn set_accepted_terms(&mut self, accepted: bool) {
        self.accepted_terms = accepted;
    }

    fn identification_ids(&self) -> &BTreeSet<IdentificationId> {
        &self.identifications
    }

    fn as_persisted(&self) -> Option<&PlanterDetail> {
        Some(self)
    }
}

/// A planter that exists only in memory, e.g. a sign-up form that has not
/// been saved yet. It never narrows to [`PlanterDetail`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DetachedPlanter {
    pub profile: PlanterProfile,
    pub uploaded: bool,
    pub accepted_terms: bool,
    pub identifications: BTreeSet<IdentificationId>,
}

impl DetachedPlanter {
    pub fn new(profile: PlanterProfile) -> Self {
        Self {
            profile,
            ..Default::default()
        }
    }

    /// Turn this into a new persisted record with a fresh ID.
    ///
    /// Identification keys are dropped: identifications are attached by the
    /// record store when they are inserted.
    pub fn into_detail(self) -> PlanterDetail {
        let mut detail = PlanterDetail::new(self.profile);
        detail.uploaded = self.uploaded;
        detail.accepted_terms = self.accepted_terms;
        detail
    }
}

impl Planter for DetachedPlanter {
    fn profile(&self) -> &PlanterProfile {
        &self.profile
    }

    fn profile_mut(&mut self) -> &mut PlanterProfile {
        &mut self.profile
    }

    fn uploaded(&self) -> bool {
        self.uploaded
    }

    fn set_uploaded(&mut self, uploaded: bool) {
        self.uploaded = uploaded;
    }

    fn accepted_terms(&self) -> bool {
        self.accepted_terms
    }

    fn set_accepted_terms(&mut self, accepted: bool) {
        self.accepted_terms = accepted;
    }

    fn identification_ids(&self) -> &BTreeSet<IdentificationId> {
        &self.identifications
    }
}
