use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::DocumentRef;
use crate::error::TypeError;
use crate::ids::{IdentificationId, TreeCaptureId};

/// A geolocation fix as reported by the device.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    /// Radius of uncertainty in meters.
    pub horizontal_accuracy: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64, horizontal_accuracy: f64) -> Self {
        Self {
            latitude,
            longitude,
            horizontal_accuracy,
        }
    }

    /// Check that the fix is a real coordinate.
    pub fn validate(&self) -> Result<(), TypeError> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(TypeError::InvalidCoordinate {
                field: "latitude",
                value: self.latitude.to_string(),
            });
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(TypeError::InvalidCoordinate {
                field: "longitude",
                value: self.longitude.to_string(),
            });
        }
        if !self.horizontal_accuracy.is_finite() || self.horizontal_accuracy < 0.0 {
            return Err(TypeError::InvalidCoordinate {
                field: "horizontal_accuracy",
                value: self.horizontal_accuracy.to_string(),
            });
        }
        Ok(())
    }
}

/// Captured photo and location, the input of a tree save.
#[derive(Clone, Debug)]
pub struct TreeServiceData {
    /// Encoded image bytes (PNG from the capture screen).
    pub image: Bytes,
    pub location: Location,
}

impl TreeServiceData {
    pub fn new(image: impl Into<Bytes>, location: Location) -> Self {
        Self {
            image: image.into(),
            location,
        }
    }
}

/// The persisted record of one planting event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TreeCapture {
    pub id: TreeCaptureId,
    pub created_at: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub horizontal_accuracy: f64,
    /// Flipped by the sync process once the capture reaches the server.
    pub uploaded: bool,
    /// Where the photo lives in the document store.
    pub photo: DocumentRef,
    /// Key of the owning identification.
    pub identification: IdentificationId,
}

impl TreeCapture {
    /// A new, not yet uploaded capture created now.
    pub fn new(
        id: TreeCaptureId,
        location: &Location,
        photo: DocumentRef,
        identification: IdentificationId,
    ) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            latitude: location.latitude,
            longitude: location.longitude,
            horizontal_accuracy: location.horizontal_accuracy,
            uploaded: false,
            photo,
            identification,
        }
    }

    pub fn location(&self) -> Location {
        Location::new(self.latitude, self.longitude, self.horizontal_accuracy)
    }
}
