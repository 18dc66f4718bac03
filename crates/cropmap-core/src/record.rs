//! Measurement records and coordinate validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoord {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoCoord {
    /// `true` if both components are finite and in range
    /// (latitude [-90, 90], longitude [-180, 180]).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// One submitted crop-quality reading.
///
/// Owned by the record-source collaborator; the engine treats it as
/// immutable input for the duration of one aggregation pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasurementRecord {
    pub id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    /// Numeric quality reading, in the crop's own unit.
    pub reading: f64,
    /// Crop type label, e.g. `"apple"`. Keys the per-crop threshold lookup.
    pub crop: String,
    pub brand: Option<String>,
    /// Exact (case-sensitive) grouping key for the top-level map view.
    pub location_name: String,
    pub verified: bool,
    pub submitted_at: DateTime<Utc>,
    pub submitted_by: String,
    pub notes: Option<String>,
    /// Ordered image references; may be empty.
    #[serde(default)]
    pub photos: Vec<String>,
}

impl MeasurementRecord {
    #[must_use]
    pub fn coordinate(&self) -> GeoCoord {
        GeoCoord {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }

    /// `true` if the record can be placed on the map.
    ///
    /// Records failing this are excluded from spatial placement entirely
    /// but still contribute to aggregates that do not need coordinates.
    #[must_use]
    pub fn is_placeable(&self) -> bool {
        self.coordinate().is_valid()
    }

    /// `true` if the reading can participate in score aggregation.
    #[must_use]
    pub fn has_valid_reading(&self) -> bool {
        self.reading.is_finite()
    }
}
