//! Derived view models: map markers and the focused-location side panel.

use cropmap_core::{EngineConfig, GeoCoord, MeasurementRecord, QualityBand};
use cropmap_score::score_color;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::grouping::LocationGroup;
use crate::selection::GroupingMode;

/// One ranked row in a leaderboard list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub label: String,
    pub mean_score: f64,
    pub sample_count: u32,
}

/// The three leaderboard lists scoped to one focused location.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Leaderboards {
    pub overall: Vec<LeaderboardEntry>,
    pub by_crop: Vec<LeaderboardEntry>,
    pub by_brand: Vec<LeaderboardEntry>,
}

/// Side-panel view model for the focused location.
#[derive(Debug, Clone, Default)]
pub struct LocationPanel {
    pub location_name: String,
    pub grouping: GroupingMode,
    pub leaderboards: Leaderboards,
    /// Raw member records of the drilled sub-group, when one is focused.
    pub subgroup_records: Vec<MeasurementRecord>,
    /// Non-blocking inline message when a leaderboard fetch failed.
    pub notice: Option<String>,
}

impl LocationPanel {
    #[must_use]
    pub fn open(location_name: &str, grouping: GroupingMode) -> Self {
        Self {
            location_name: location_name.to_string(),
            grouping,
            ..Self::default()
        }
    }
}

/// One individually drawn record on the point layer.
#[derive(Debug, Clone)]
pub struct PointFeature {
    pub record_id: Uuid,
    pub position: GeoCoord,
    /// Resolved symbol, already fallen back if the crop's asset is not
    /// loaded.
    pub symbol: String,
    pub band: QualityBand,
    pub color: &'static str,
}

/// Marker for one location group on the map.
#[derive(Debug, Clone)]
pub struct MapMarker {
    pub location_name: String,
    pub position: GeoCoord,
    pub member_count: usize,
    pub mean_score: f64,
    pub color: &'static str,
}

/// Turn the location groups into colored markers. Groups with nothing
/// placeable yield no marker.
#[must_use]
pub fn build_markers(groups: &[LocationGroup], config: &EngineConfig) -> Vec<MapMarker> {
    groups
        .iter()
        .filter_map(|group| {
            group.representative.map(|position| MapMarker {
                location_name: group.location_name.clone(),
                position,
                member_count: group.member_count,
                mean_score: group.mean_score,
                color: score_color(group.mean_score, &config.score_bucket_edges),
            })
        })
        .collect()
}
