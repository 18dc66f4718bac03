//! Spiral de-overlap layout ("spiderfy") for cluster members.

use cropmap_core::{EngineConfig, GeoCoord, MeasurementRecord};

use crate::surface::{MapSurface, PixelCoord};
use crate::symbols::resolve_symbol;

/// How a cluster interaction should expand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterExpansion {
    /// Lay members out radially so each is individually clickable.
    Spiderfy,
    /// Ease the camera in and let the provider split the cluster.
    EaseZoom,
}

/// Decide the expansion path for a clicked cluster.
///
/// Zooming stops being useful once the cluster is small or the view is
/// already close, so both conditions route to the spiral layout.
#[must_use]
pub fn choose_expansion(leaf_count: usize, zoom: f64, config: &EngineConfig) -> ClusterExpansion {
    if leaf_count <= config.spiderfy_leaf_threshold || zoom >= config.spiderfy_zoom_threshold {
        ClusterExpansion::Spiderfy
    } else {
        ClusterExpansion::EaseZoom
    }
}

/// Pixel offset of spiral slot `index` (0-based, in stable member order).
///
/// The radius grows with the angle, so inter-point spacing keeps widening
/// as the member count grows and no per-pair collision checks are needed:
/// the layout stays O(n).
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn spiral_offset(index: usize, config: &EngineConfig) -> (f64, f64) {
    let angle = config.spiral_angle_step * index as f64;
    let radius = config.spiral_base_radius_px * (1.0 + config.spiral_growth_per_radian * angle);
    (radius * angle.cos(), radius * angle.sin())
}

/// A spiderfied member: where it draws, what it draws with, and the leg
/// back to the center.
#[derive(Debug, Clone)]
pub struct SpiderLeg {
    pub record: MeasurementRecord,
    pub pixel: PixelCoord,
    pub position: GeoCoord,
    /// Resolved symbol for this member, already fallen back if its crop's
    /// asset is not loaded.
    pub symbol: String,
}

/// Fully materialized expansion of one cluster. Transient: rebuilt on every
/// expand click, torn down by the next click elsewhere.
#[derive(Debug, Clone)]
pub struct SpiderExpansion {
    pub cluster_id: u64,
    pub center: GeoCoord,
    pub center_pixel: PixelCoord,
    pub legs: Vec<SpiderLeg>,
}

/// Lay the members of a cluster out around its projected center.
///
/// Offsets are applied in pixel space and converted back through the
/// surface's inverse projection, so the layout is uniform on screen at any
/// latitude. Each leg carries the straight connective line back to the
/// center implicitly as (`center_pixel`, `pixel`).
pub fn spiderfy<S: MapSurface>(
    surface: &S,
    cluster_id: u64,
    center: GeoCoord,
    members: Vec<MeasurementRecord>,
    config: &EngineConfig,
) -> SpiderExpansion {
    let center_pixel = surface.project(center);
    let legs = members
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            let (dx, dy) = spiral_offset(index, config);
            let pixel = PixelCoord {
                x: center_pixel.x + dx,
                y: center_pixel.y + dy,
            };
            let symbol = resolve_symbol(surface, &record.crop);
            SpiderLeg {
                record,
                pixel,
                position: surface.unproject(pixel),
                symbol,
            }
        })
        .collect();

    SpiderExpansion {
        cluster_id,
        center,
        center_pixel,
        legs,
    }
}
