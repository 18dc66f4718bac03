//! By-name grouping of the filtered record set.
//!
//! Distance/zoom clustering is delegated to the map provider; this module
//! only builds the one-marker-per-location aggregate groups for the
//! top-level view.

use std::collections::HashMap;

use cropmap_core::{GeoCoord, MeasurementRecord};
use cropmap_score::{normalized_score, resolve_thresholds, ThresholdCache, NEUTRAL_SCORE};

/// Filter over the raw record set. All conditions are conjunctive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub crop: Option<String>,
    pub brand: Option<String>,
    pub verified_only: bool,
}

impl RecordFilter {
    #[must_use]
    pub fn matches(&self, record: &MeasurementRecord) -> bool {
        if let Some(crop) = &self.crop {
            if record.crop != *crop {
                return false;
            }
        }
        if let Some(brand) = &self.brand {
            if record.brand.as_deref() != Some(brand.as_str()) {
                return false;
            }
        }
        if self.verified_only && !record.verified {
            return false;
        }
        true
    }
}

/// One per-location aggregate group for the top-level map view.
#[derive(Debug, Clone)]
pub struct LocationGroup {
    pub location_name: String,
    /// Coordinate of the first placeable member; `None` when nothing in the
    /// group can be placed, in which case the group gets no marker.
    pub representative: Option<GeoCoord>,
    pub member_count: usize,
    pub placeable_count: usize,
    /// Mean of member normalized scores. Members without a finite reading
    /// are left out of the mean; a group with none defaults to the neutral
    /// midpoint.
    pub mean_score: f64,
}

/// Group records sharing an exact (case-sensitive) location-name key, in
/// first-appearance order.
///
/// A record with invalid coordinates still counts toward the group and its
/// score; it just cannot anchor the marker.
pub fn group_by_location<'a, I>(records: I, cache: &ThresholdCache) -> Vec<LocationGroup>
where
    I: IntoIterator<Item = &'a MeasurementRecord>,
{
    struct Accumulator {
        representative: Option<GeoCoord>,
        member_count: usize,
        placeable_count: usize,
        score_sum: f64,
        scored_count: usize,
    }

    let mut order: Vec<String> = Vec::new();
    let mut by_name: HashMap<String, Accumulator> = HashMap::new();

    for record in records {
        let entry = by_name
            .entry(record.location_name.clone())
            .or_insert_with(|| {
                order.push(record.location_name.clone());
                Accumulator {
                    representative: None,
                    member_count: 0,
                    placeable_count: 0,
                    score_sum: 0.0,
                    scored_count: 0,
                }
            });

        entry.member_count += 1;
        if record.is_placeable() {
            entry.placeable_count += 1;
            if entry.representative.is_none() {
                entry.representative = Some(record.coordinate());
            }
        }
        if record.has_valid_reading() {
            let thresholds = resolve_thresholds(cache, &record.crop);
            entry.score_sum += normalized_score(record.reading, &thresholds, cache.fallback());
            entry.scored_count += 1;
        }
    }

    order
        .into_iter()
        .filter_map(|location_name| {
            let entry = by_name.remove(&location_name)?;
            #[allow(clippy::cast_precision_loss)]
            let mean_score = if entry.scored_count == 0 {
                NEUTRAL_SCORE
            } else {
                entry.score_sum / entry.scored_count as f64
            };
            Some(LocationGroup {
                location_name,
                representative: entry.representative,
                member_count: entry.member_count,
                placeable_count: entry.placeable_count,
                mean_score,
            })
        })
        .collect()
}
