//! Threshold resolution with dataset-wide fallback.

use cropmap_core::{FallbackRange, ThresholdSet};

use crate::cache::ThresholdCache;

/// Build the substitute threshold set for a crop with no cached thresholds.
///
/// The spread `{poor: min, average: midpoint, good: 0.8 * max, excellent:
/// max}` keeps fallback-scored records on the same four-band scale as
/// records with real thresholds.
#[must_use]
pub fn fallback_thresholds(range: FallbackRange) -> ThresholdSet {
    ThresholdSet {
        poor: range.min,
        average: (range.min + range.max) / 2.0,
        good: range.max * 0.8,
        excellent: range.max,
    }
}

/// Resolve the threshold set to score a crop against.
///
/// Cache hit wins; a miss degrades to a set constructed from the
/// dataset-wide reading range. Never errors — an unusable range produces an
/// invalid set, which downstream scoring turns into the neutral midpoint.
#[must_use]
pub fn resolve_thresholds(cache: &ThresholdCache, crop: &str) -> ThresholdSet {
    cache
        .get(crop)
        .unwrap_or_else(|| fallback_thresholds(cache.fallback()))
}
