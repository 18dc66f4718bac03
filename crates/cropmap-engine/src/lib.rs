//! The cropmap geospatial aggregation engine.
//!
//! Ties the scoring layer to the map: by-name grouping with aggregate
//! colors, the spiral de-overlap layout for co-located points, symbol
//! resolution with a guaranteed fallback, and the selection state machine
//! behind the location/leaderboard side panel. All I/O happens through the
//! boundary traits in [`sources`] and [`surface`]; every upstream failure
//! degrades inside the engine instead of crossing its boundary.

// Collaborators are consumed through generics, never trait objects, so the
// auto-trait caveat behind `async_fn_in_trait` does not apply here.
#![allow(async_fn_in_trait)]

pub mod engine;
pub mod error;
pub mod grouping;
pub mod selection;
pub mod sources;
pub mod spiral;
pub mod surface;
pub mod symbols;
pub mod view;

pub use engine::{fetch_leaderboards, Effect, LeaderboardRequest, MapEngine};
pub use error::EngineError;
pub use grouping::{group_by_location, LocationGroup, RecordFilter};
pub use selection::{GroupingMode, Selection, SelectionState, Subgroup};
pub use sources::{
    AssetSource, CatalogThresholdSource, LeaderboardSource, RecordSource, ScopeFilter, SourceError,
    ThresholdSource,
};
pub use spiral::{
    choose_expansion, spiderfy, spiral_offset, ClusterExpansion, SpiderExpansion, SpiderLeg,
};
pub use surface::{layers, EventKind, MapSurface, PixelCoord, PlanarSurface, SurfaceEvent};
pub use symbols::{resolve_symbol, sync_symbols, FALLBACK_SYMBOL_ID};
pub use view::{
    build_markers, LeaderboardEntry, Leaderboards, LocationPanel, MapMarker, PointFeature,
};
