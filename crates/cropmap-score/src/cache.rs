//! Per-crop threshold cache with wholesale reload.

use std::collections::HashMap;
use std::sync::Arc;

use cropmap_core::{FallbackRange, ThresholdSet};

/// Read-mostly lookup from crop label to its threshold set, plus the
/// dataset-wide reading range used when a crop has none.
///
/// `replace` swaps the entire contents atomically: a new map is built off to
/// the side and then installed, so a lookup in flight keeps reading the old
/// generation rather than observing a half-updated one.
#[derive(Debug, Clone)]
pub struct ThresholdCache {
    thresholds: Arc<HashMap<String, ThresholdSet>>,
    fallback: FallbackRange,
}

impl ThresholdCache {
    /// An empty cache with an unusable fallback range.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            thresholds: Arc::new(HashMap::new()),
            fallback: FallbackRange::from_readings(std::iter::empty()),
        }
    }

    /// Install a freshly built generation of the cache.
    ///
    /// Invalid sets are dropped here (logged), so lookups never hand out a
    /// threshold set that fails [`ThresholdSet::is_valid`].
    pub fn replace(&mut self, thresholds: HashMap<String, ThresholdSet>, fallback: FallbackRange) {
        let kept: HashMap<String, ThresholdSet> = thresholds
            .into_iter()
            .filter(|(crop, set)| {
                if set.is_valid() {
                    true
                } else {
                    tracing::warn!(crop = %crop, "dropping non-finite threshold set");
                    false
                }
            })
            .collect();
        self.thresholds = Arc::new(kept);
        self.fallback = fallback;
    }

    /// Refresh the dataset-wide reading range without touching the
    /// threshold map. Called whenever the loaded record set changes.
    pub fn set_fallback(&mut self, fallback: FallbackRange) {
        self.fallback = fallback;
    }

    /// Look up the threshold set for a crop label, if one is cached.
    #[must_use]
    pub fn get(&self, crop: &str) -> Option<ThresholdSet> {
        self.thresholds.get(crop).copied()
    }

    #[must_use]
    pub fn fallback(&self) -> FallbackRange {
        self.fallback
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.thresholds.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }
}

impl Default for ThresholdCache {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_set() -> ThresholdSet {
        ThresholdSet {
            poor: 6.0,
            average: 10.0,
            good: 14.0,
            excellent: 18.0,
        }
    }

    #[test]
    fn empty_cache_misses_everything() {
        let cache = ThresholdCache::empty();
        assert!(cache.get("apple").is_none());
        assert!(!cache.fallback().is_usable());
        assert!(cache.is_empty());
    }

    #[test]
    fn replace_installs_new_generation() {
        let mut cache = ThresholdCache::empty();
        let mut map = HashMap::new();
        map.insert("apple".to_string(), valid_set());
        cache.replace(map, FallbackRange { min: 0.0, max: 20.0 });

        assert_eq!(cache.get("apple"), Some(valid_set()));
        assert_eq!(cache.fallback(), FallbackRange { min: 0.0, max: 20.0 });
    }

    #[test]
    fn replace_drops_previous_contents() {
        let mut cache = ThresholdCache::empty();
        let mut first = HashMap::new();
        first.insert("apple".to_string(), valid_set());
        cache.replace(first, FallbackRange { min: 0.0, max: 20.0 });

        let mut second = HashMap::new();
        second.insert("pear".to_string(), valid_set());
        cache.replace(second, FallbackRange { min: 1.0, max: 9.0 });

        assert!(cache.get("apple").is_none());
        assert!(cache.get("pear").is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn replace_filters_invalid_sets() {
        let mut cache = ThresholdCache::empty();
        let mut map = HashMap::new();
        map.insert("apple".to_string(), valid_set());
        map.insert(
            "pear".to_string(),
            ThresholdSet {
                poor: f64::NAN,
                average: 10.0,
                good: 14.0,
                excellent: 18.0,
            },
        );
        cache.replace(map, FallbackRange { min: 0.0, max: 20.0 });

        assert!(cache.get("apple").is_some());
        assert!(cache.get("pear").is_none());
    }

    #[test]
    fn clone_before_replace_keeps_old_generation() {
        let mut cache = ThresholdCache::empty();
        let mut map = HashMap::new();
        map.insert("apple".to_string(), valid_set());
        cache.replace(map, FallbackRange { min: 0.0, max: 20.0 });

        let reader = cache.clone();
        cache.replace(HashMap::new(), FallbackRange { min: 2.0, max: 3.0 });

        // The in-flight reader still sees the generation it started with.
        assert!(reader.get("apple").is_some());
        assert!(cache.get("apple").is_none());
    }
}
