//! Per-crop quality thresholds, scale direction, and quality bands.

use serde::{Deserialize, Serialize};

/// Four ordered quality boundaries for one crop.
///
/// Scale direction is inferred, never assumed: `excellent > poor` means the
/// scale ascends (a higher reading is better); anything else descends, which
/// covers "lower is better" domains such as a rank or a defect count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSet {
    pub poor: f64,
    pub average: f64,
    pub good: f64,
    pub excellent: f64,
}

impl ThresholdSet {
    /// `true` if all four boundaries are finite.
    ///
    /// A set failing this is treated as absent wherever it is consumed.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.poor.is_finite()
            && self.average.is_finite()
            && self.good.is_finite()
            && self.excellent.is_finite()
    }

    #[must_use]
    pub fn direction(&self) -> ScaleDirection {
        if self.excellent > self.poor {
            ScaleDirection::Ascending
        } else {
            ScaleDirection::Descending
        }
    }
}

/// Whether a higher reading means better quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleDirection {
    Ascending,
    Descending,
}

/// The bounded quality category a reading classifies into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityBand {
    Poor,
    Average,
    Good,
    Excellent,
    /// Reading or thresholds were unusable.
    Unknown,
}

impl std::fmt::Display for QualityBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QualityBand::Poor => write!(f, "poor"),
            QualityBand::Average => write!(f, "average"),
            QualityBand::Good => write!(f, "good"),
            QualityBand::Excellent => write!(f, "excellent"),
            QualityBand::Unknown => write!(f, "unknown"),
        }
    }
}

/// Dataset-wide (min, max) reading pair, the last-resort normalization range
/// when a crop has no usable threshold set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallbackRange {
    pub min: f64,
    pub max: f64,
}

impl FallbackRange {
    /// Compute the range over all finite readings in the current dataset.
    ///
    /// An empty or all-invalid dataset yields an unusable range, which
    /// downstream scoring degrades to the neutral midpoint.
    #[must_use]
    pub fn from_readings<I>(readings: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for reading in readings {
            if reading.is_finite() {
                min = min.min(reading);
                max = max.max(reading);
            }
        }
        Self { min, max }
    }

    /// `true` if the range can normalize a reading (`max > min`, both finite).
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.max > self.min
    }
}
