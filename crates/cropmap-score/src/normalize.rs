//! Band classification and continuous score normalization.

use cropmap_core::{FallbackRange, QualityBand, ScaleDirection, ThresholdSet};

/// The score every unusable reading degrades to: the middle of the ~[1, 2]
/// normalized range.
pub const NEUTRAL_SCORE: f64 = 1.5;

/// Classify a reading into its quality band.
///
/// Comparison runs against excellent, good, average, poor in that priority,
/// with the direction inferred from the threshold set. Returns
/// [`QualityBand::Unknown`] for a non-finite reading or an invalid set.
#[must_use]
pub fn quality_band(reading: f64, thresholds: &ThresholdSet) -> QualityBand {
    if !reading.is_finite() || !thresholds.is_valid() {
        return QualityBand::Unknown;
    }

    match thresholds.direction() {
        ScaleDirection::Ascending => {
            if reading >= thresholds.excellent {
                QualityBand::Excellent
            } else if reading >= thresholds.good {
                QualityBand::Good
            } else if reading >= thresholds.average {
                QualityBand::Average
            } else {
                QualityBand::Poor
            }
        }
        ScaleDirection::Descending => {
            if reading <= thresholds.excellent {
                QualityBand::Excellent
            } else if reading <= thresholds.good {
                QualityBand::Good
            } else if reading <= thresholds.average {
                QualityBand::Average
            } else {
                QualityBand::Poor
            }
        }
    }
}

/// Rescale a reading onto the comparable ~[1, 2] range.
///
/// With valid ascending thresholds the poor boundary maps to `1.0` and the
/// excellent boundary to `2.0`. Without them the dataset-wide range is used,
/// and when neither is usable the reading degrades to [`NEUTRAL_SCORE`].
/// This shared scale is what lets clusters of different crops be
/// color-averaged meaningfully.
#[must_use]
pub fn normalized_score(reading: f64, thresholds: &ThresholdSet, fallback: FallbackRange) -> f64 {
    if reading.is_finite() && thresholds.is_valid() && thresholds.excellent > thresholds.poor {
        return (reading - thresholds.poor) / (thresholds.excellent - thresholds.poor) + 1.0;
    }
    if reading.is_finite() && fallback.is_usable() {
        return (reading - fallback.min) / (fallback.max - fallback.min) + 1.0;
    }
    NEUTRAL_SCORE
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn ascending() -> ThresholdSet {
        ThresholdSet {
            poor: 6.0,
            average: 10.0,
            good: 14.0,
            excellent: 18.0,
        }
    }

    fn descending() -> ThresholdSet {
        // A rank scale: 1st place is excellent.
        ThresholdSet {
            poor: 100.0,
            average: 50.0,
            good: 10.0,
            excellent: 1.0,
        }
    }

    fn unusable_range() -> FallbackRange {
        FallbackRange::from_readings(std::iter::empty())
    }

    #[test]
    fn ascending_band_boundaries() {
        let set = ascending();
        assert_eq!(quality_band(5.0, &set), QualityBand::Poor);
        assert_eq!(quality_band(10.0, &set), QualityBand::Average);
        assert_eq!(quality_band(14.0, &set), QualityBand::Good);
        assert_eq!(quality_band(18.0, &set), QualityBand::Excellent);
        assert_eq!(quality_band(25.0, &set), QualityBand::Excellent);
    }

    #[test]
    fn ascending_band_is_monotone_in_reading() {
        let set = ascending();
        let order = |band: QualityBand| match band {
            QualityBand::Poor => 0,
            QualityBand::Average => 1,
            QualityBand::Good => 2,
            QualityBand::Excellent => 3,
            QualityBand::Unknown => unreachable!("valid inputs never classify unknown"),
        };
        let mut previous = 0;
        for step in 0..100 {
            let reading = f64::from(step) * 0.25;
            let rank = order(quality_band(reading, &set));
            assert!(rank >= previous, "band regressed at reading {reading}");
            previous = rank;
        }
    }

    #[test]
    fn descending_band_inverts_comparisons() {
        let set = descending();
        // A reading equal to the excellent boundary still classifies excellent.
        assert_eq!(quality_band(1.0, &set), QualityBand::Excellent);
        assert_eq!(quality_band(5.0, &set), QualityBand::Good);
        assert_eq!(quality_band(30.0, &set), QualityBand::Average);
        assert_eq!(quality_band(80.0, &set), QualityBand::Poor);
        assert_eq!(quality_band(200.0, &set), QualityBand::Poor);
    }

    #[test]
    fn nan_reading_is_unknown() {
        assert_eq!(quality_band(f64::NAN, &ascending()), QualityBand::Unknown);
    }

    #[test]
    fn invalid_thresholds_are_unknown() {
        let set = ThresholdSet {
            poor: 6.0,
            average: f64::NAN,
            good: 14.0,
            excellent: 18.0,
        };
        assert_eq!(quality_band(12.0, &set), QualityBand::Unknown);
    }

    #[test]
    fn score_anchors_at_threshold_floor_and_ceiling() {
        let set = ascending();
        let range = unusable_range();
        assert!((normalized_score(set.poor, &set, range) - 1.0).abs() < TOLERANCE);
        assert!((normalized_score(set.excellent, &set, range) - 2.0).abs() < TOLERANCE);
    }

    #[test]
    fn score_of_reading_between_boundaries() {
        // (15 - 6) / (18 - 6) + 1 = 1.75
        let score = normalized_score(15.0, &ascending(), unusable_range());
        assert!((score - 1.75).abs() < TOLERANCE);
    }

    #[test]
    fn invalid_thresholds_fall_back_to_dataset_range() {
        let set = ThresholdSet {
            poor: f64::NAN,
            average: 10.0,
            good: 14.0,
            excellent: 18.0,
        };
        let range = FallbackRange { min: 0.0, max: 20.0 };
        // (10 - 0) / (20 - 0) + 1 = 1.5
        let score = normalized_score(10.0, &set, range);
        assert!((score - 1.5).abs() < TOLERANCE);
    }

    #[test]
    fn descending_thresholds_fall_back_to_dataset_range() {
        // excellent < poor fails the ascending validity check for the
        // continuous formula, so the dataset range takes over.
        let range = FallbackRange { min: 0.0, max: 200.0 };
        let score = normalized_score(50.0, &descending(), range);
        assert!((score - 1.25).abs() < TOLERANCE);
    }

    #[test]
    fn nothing_usable_degrades_to_neutral_midpoint() {
        let set = ThresholdSet {
            poor: f64::NAN,
            average: f64::NAN,
            good: f64::NAN,
            excellent: f64::NAN,
        };
        assert_eq!(normalized_score(12.0, &set, unusable_range()), NEUTRAL_SCORE);
        assert_eq!(
            normalized_score(f64::NAN, &ascending(), unusable_range()),
            NEUTRAL_SCORE
        );
    }
}
