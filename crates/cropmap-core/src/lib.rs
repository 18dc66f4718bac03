//! Domain types and configuration for the cropmap engine.

use thiserror::Error;

pub mod config;
pub mod crops;
pub mod record;
pub mod thresholds;

pub use config::EngineConfig;
pub use crops::{canonical_symbol_id, load_crops, CropConfig, CropsFile};
pub use record::{GeoCoord, MeasurementRecord};
pub use thresholds::{FallbackRange, QualityBand, ScaleDirection, ThresholdSet};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read crop catalog at {path}: {source}")]
    CatalogIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse crop catalog: {0}")]
    CatalogParse(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Validation(String),
}
