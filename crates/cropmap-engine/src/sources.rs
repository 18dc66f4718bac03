//! Boundary traits for the data collaborators.
//!
//! The engine consumes records, thresholds, symbol assets, and leaderboard
//! rows through these traits and never performs I/O of its own. Every
//! failure degrades at the call site per the engine's error policy; nothing
//! here is allowed to take the aggregation pipeline down.

use std::collections::HashMap;

use cropmap_core::{CropsFile, MeasurementRecord, ThresholdSet};
use thiserror::Error;

use crate::view::LeaderboardEntry;

/// Error surfaced by an external collaborator.
///
/// Collaborators are black boxes; the engine only needs something it can log
/// and degrade on, so the payload is an opaque message.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct SourceError {
    pub message: String,
}

impl SourceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Supplies the raw measurement records for one aggregation pass.
pub trait RecordSource {
    async fn fetch_records(&self) -> Result<Vec<MeasurementRecord>, SourceError>;
}

/// Supplies per-crop threshold sets, batched across all known crops at
/// cache-build time.
pub trait ThresholdSource {
    async fn fetch_thresholds(&self, crop: &str) -> Result<Option<ThresholdSet>, SourceError>;
}

/// Supplies symbol image bytes by canonical asset identifier.
pub trait AssetSource {
    async fn fetch_symbol(&self, id: &str) -> Result<Vec<u8>, SourceError>;
}

/// Scope for a leaderboard query: all filters optional, all conjunctive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeFilter {
    pub location_name: Option<String>,
    pub crop: Option<String>,
    pub brand: Option<String>,
}

impl ScopeFilter {
    #[must_use]
    pub fn location(name: &str) -> Self {
        Self {
            location_name: Some(name.to_string()),
            ..Self::default()
        }
    }
}

/// Supplies ranked leaderboard rows; each list is independently failable.
pub trait LeaderboardSource {
    async fn location_leaderboard(
        &self,
        scope: &ScopeFilter,
    ) -> Result<Vec<LeaderboardEntry>, SourceError>;

    async fn crop_leaderboard(
        &self,
        scope: &ScopeFilter,
    ) -> Result<Vec<LeaderboardEntry>, SourceError>;

    async fn brand_leaderboard(
        &self,
        scope: &ScopeFilter,
    ) -> Result<Vec<LeaderboardEntry>, SourceError>;
}

/// A [`ThresholdSource`] backed by a loaded crop catalog.
///
/// Useful for tests and for deployments that ship thresholds as static
/// configuration instead of a remote service.
#[derive(Debug, Clone)]
pub struct CatalogThresholdSource {
    thresholds: HashMap<String, ThresholdSet>,
}

impl CatalogThresholdSource {
    #[must_use]
    pub fn new(catalog: &CropsFile) -> Self {
        let thresholds = catalog
            .crops
            .iter()
            .filter_map(|crop| crop.thresholds.map(|set| (crop.name.clone(), set)))
            .collect();
        Self { thresholds }
    }
}

impl ThresholdSource for CatalogThresholdSource {
    async fn fetch_thresholds(&self, crop: &str) -> Result<Option<ThresholdSet>, SourceError> {
        Ok(self.thresholds.get(crop).copied())
    }
}

#[cfg(test)]
mod tests {
    use cropmap_core::CropConfig;

    use super::*;

    #[tokio::test]
    async fn catalog_source_serves_configured_thresholds() {
        let catalog = CropsFile {
            crops: vec![
                CropConfig {
                    name: "apple".to_string(),
                    thresholds: Some(ThresholdSet {
                        poor: 6.0,
                        average: 10.0,
                        good: 14.0,
                        excellent: 18.0,
                    }),
                    symbol: None,
                    notes: None,
                },
                CropConfig {
                    name: "pear".to_string(),
                    thresholds: None,
                    symbol: None,
                    notes: None,
                },
            ],
        };
        let source = CatalogThresholdSource::new(&catalog);

        let apple = source.fetch_thresholds("apple").await.unwrap();
        assert_eq!(apple.map(|set| set.excellent), Some(18.0));

        // A crop listed without thresholds resolves to absent, not an error.
        assert!(source.fetch_thresholds("pear").await.unwrap().is_none());
        assert!(source.fetch_thresholds("quince").await.unwrap().is_none());
    }
}
