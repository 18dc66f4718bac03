//! Boundary trait for the rendering surface and its typed event stream.
//!
//! The surface (tile/map provider) owns projection, marker paint, pan/zoom,
//! and click dispatch. The engine talks to it through this trait and
//! receives interaction events as plain values, so no DOM or widget types
//! leak into the core.

use std::collections::{HashMap, HashSet};

use cropmap_core::{GeoCoord, MeasurementRecord};
use uuid::Uuid;

use crate::sources::SourceError;

/// Pixel-space coordinate on the rendering surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelCoord {
    pub x: f64,
    pub y: f64,
}

impl PixelCoord {
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Logical layer names the engine renders to and receives events from.
pub mod layers {
    /// Individually placed measurement points.
    pub const POINTS: &str = "measurement-points";
    /// Aggregate cluster markers.
    pub const CLUSTERS: &str = "measurement-clusters";
    /// Spiderfied member points.
    pub const SPIDER_POINTS: &str = "spider-points";
    /// Connective lines from spiderfied points back to the cluster center.
    pub const SPIDER_LEGS: &str = "spider-legs";
    /// Anything that is not a marker layer.
    pub const BACKGROUND: &str = "background";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Click,
    Hover,
}

/// One event from the surface's subscription stream.
///
/// The payload shape is layer-specific; the engine deserializes it into the
/// typed forms it understands and ignores what it does not.
#[derive(Debug, Clone)]
pub struct SurfaceEvent {
    pub layer: String,
    pub kind: EventKind,
    pub payload: serde_json::Value,
}

impl SurfaceEvent {
    #[must_use]
    pub fn click(layer: &str, payload: serde_json::Value) -> Self {
        Self {
            layer: layer.to_string(),
            kind: EventKind::Click,
            payload,
        }
    }
}

/// The rendering-surface collaborator.
pub trait MapSurface {
    /// Project a geo-coordinate to surface pixels at the current view.
    fn project(&self, coord: GeoCoord) -> PixelCoord;

    /// Inverse projection back to a geo-coordinate.
    fn unproject(&self, pixel: PixelCoord) -> GeoCoord;

    fn zoom(&self) -> f64;

    fn max_zoom(&self) -> f64;

    /// `true` once an asset has been registered under `id`.
    fn has_asset(&self, id: &str) -> bool;

    fn register_asset(&mut self, id: &str, image: Vec<u8>);

    /// Replace the surface's point-source data with the current placeable,
    /// filtered record set. The surface derives its distance/zoom clusters
    /// from this.
    fn set_source_data(&mut self, records: Vec<MeasurementRecord>);

    /// Animate the view toward `center` at `zoom`.
    fn ease_to(&mut self, center: GeoCoord, zoom: f64);

    /// Fetch up to `count` member records of a provider cluster.
    async fn cluster_leaves(
        &self,
        cluster_id: u64,
        count: usize,
    ) -> Result<Vec<MeasurementRecord>, SourceError>;
}

/// In-memory reference surface with a flat equirectangular projection.
///
/// Stands in for a real tile/map provider in tests and headless runs:
/// assets are a name set, provider clusters are configured explicitly, and
/// camera moves are recorded rather than animated.
#[derive(Debug, Clone, Default)]
pub struct PlanarSurface {
    zoom: f64,
    max_zoom: f64,
    assets: HashSet<String>,
    source: Vec<MeasurementRecord>,
    clusters: HashMap<u64, Vec<Uuid>>,
    /// Every `ease_to` call, in order.
    pub eased: Vec<(GeoCoord, f64)>,
}

impl PlanarSurface {
    #[must_use]
    pub fn new(zoom: f64) -> Self {
        Self {
            zoom,
            max_zoom: 22.0,
            ..Self::default()
        }
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom;
    }

    /// Declare a provider cluster by the ids of its member records, which
    /// must be present in the source data to be served as leaves.
    pub fn set_cluster(&mut self, cluster_id: u64, members: Vec<Uuid>) {
        self.clusters.insert(cluster_id, members);
    }

    #[must_use]
    pub fn source_data(&self) -> &[MeasurementRecord] {
        &self.source
    }

    fn pixels_per_degree(&self) -> f64 {
        self.zoom.exp2() * 256.0 / 360.0
    }
}

impl MapSurface for PlanarSurface {
    fn project(&self, coord: GeoCoord) -> PixelCoord {
        let scale = self.pixels_per_degree();
        PixelCoord {
            x: (coord.longitude + 180.0) * scale,
            y: (90.0 - coord.latitude) * scale,
        }
    }

    fn unproject(&self, pixel: PixelCoord) -> GeoCoord {
        let scale = self.pixels_per_degree();
        GeoCoord {
            latitude: 90.0 - pixel.y / scale,
            longitude: pixel.x / scale - 180.0,
        }
    }

    fn zoom(&self) -> f64 {
        self.zoom
    }

    fn max_zoom(&self) -> f64 {
        self.max_zoom
    }

    fn has_asset(&self, id: &str) -> bool {
        self.assets.contains(id)
    }

    fn register_asset(&mut self, id: &str, _image: Vec<u8>) {
        self.assets.insert(id.to_string());
    }

    fn set_source_data(&mut self, records: Vec<MeasurementRecord>) {
        self.source = records;
    }

    fn ease_to(&mut self, center: GeoCoord, zoom: f64) {
        self.eased.push((center, zoom));
    }

    async fn cluster_leaves(
        &self,
        cluster_id: u64,
        count: usize,
    ) -> Result<Vec<MeasurementRecord>, SourceError> {
        let members = self.clusters.get(&cluster_id).ok_or_else(|| {
            SourceError::new(format!("unknown cluster id {cluster_id}"))
        })?;
        Ok(members
            .iter()
            .take(count)
            .filter_map(|id| self.source.iter().find(|r| r.id == *id).cloned())
            .collect())
    }
}
