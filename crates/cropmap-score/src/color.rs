//! Four-bucket color mapping for bands and normalized scores.

use cropmap_core::QualityBand;

/// Marker colors for the four quality buckets, worst to best.
pub const BUCKET_COLORS: [&str; 4] = ["#d73027", "#fc8d59", "#91cf60", "#1a9850"];

/// Color for records whose quality could not be established.
pub const UNKNOWN_COLOR: &str = "#9e9e9e";

/// Map a quality band onto the four-color scheme.
///
/// Band classification already accounts for scale direction, so descending
/// "lower is better" domains land on the right color here without any
/// special casing.
#[must_use]
pub fn band_color(band: QualityBand) -> &'static str {
    match band {
        QualityBand::Poor => BUCKET_COLORS[0],
        QualityBand::Average => BUCKET_COLORS[1],
        QualityBand::Good => BUCKET_COLORS[2],
        QualityBand::Excellent => BUCKET_COLORS[3],
        QualityBand::Unknown => UNKNOWN_COLOR,
    }
}

/// Map a normalized score onto the four-color scheme using ascending bucket
/// edges (typically `[1.25, 1.5, 1.75]` over the ~[1, 2] range).
#[must_use]
pub fn score_color(score: f64, edges: &[f64; 3]) -> &'static str {
    if !score.is_finite() {
        return UNKNOWN_COLOR;
    }
    if score < edges[0] {
        BUCKET_COLORS[0]
    } else if score < edges[1] {
        BUCKET_COLORS[1]
    } else if score < edges[2] {
        BUCKET_COLORS[2]
    } else {
        BUCKET_COLORS[3]
    }
}
