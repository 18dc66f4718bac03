//! Quality scoring for cropmap: threshold cache, resolution, normalization,
//! and the four-bucket color scale.

pub mod cache;
pub mod color;
pub mod normalize;
pub mod resolve;

pub use cache::ThresholdCache;
pub use color::{band_color, score_color, BUCKET_COLORS, UNKNOWN_COLOR};
pub use normalize::{normalized_score, quality_band, NEUTRAL_SCORE};
pub use resolve::{fallback_thresholds, resolve_thresholds};
