use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Create from an existing UUID.
            pub fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// The underlying UUID.
            pub fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }

            /// Short representation (first 8 characters of the UUID).
            pub fn short_id(&self) -> String {
                let mut text = self.0.to_string();
                text.truncate(8);
                text
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.short_id())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = TypeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                uuid::Uuid::parse_str(s.trim())
                    .map(Self)
                    .map_err(|e| TypeError::InvalidId {
                        kind: $kind,
                        reason: e.to_string(),
                    })
            }
        }
    };
}

uuid_id!(
    /// Identifier of a persisted planter (UUID v7, time-ordered).
    PlanterId,
    "planter"
);

uuid_id!(
    /// Identifier of an identification record (UUID v7, time-ordered).
    IdentificationId,
    "identification"
);

uuid_id!(
    /// Identifier of a tree capture.
    ///
    /// Random (UUID v4). The same string keys the capture's photo in the
    /// document store.
    TreeCaptureId,
    "tree capture"
);

impl PlanterId {
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }
}

impl Default for PlanterId {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentificationId {
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }
}

impl Default for IdentificationId {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeCaptureId {
    /// Generate a new random tree capture ID.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// The document store key for this capture's photo.
    pub fn as_key(&self) -> String {
        self.0.to_string()
    }
}

impl Default for TreeCaptureId {
    fn default() -> Self {
        Self::new()
    }
}
