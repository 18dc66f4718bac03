//! The event-driven map engine.
//!
//! `MapEngine` owns the derived view (groups, markers, side panel) and the
//! transient interaction state (selection, spiderfy). Interaction events
//! arrive from the surface's subscription stream; pure transitions return
//! typed [`Effect`]s, and the async driver executes them against the
//! collaborators. Record or filter changes rebuild the whole derived view
//! from scratch — record volumes are bounded, so recomputation is cheaper
//! than being clever.

use std::collections::{HashMap, HashSet};

use cropmap_core::{EngineConfig, FallbackRange, GeoCoord, MeasurementRecord};
use cropmap_score::{band_color, quality_band, resolve_thresholds, ThresholdCache};
use futures::future::join_all;
use serde::Deserialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::EngineError;
use crate::grouping::{group_by_location, LocationGroup, RecordFilter};
use crate::selection::{GroupingMode, Selection, SelectionState, Subgroup};
use crate::sources::{
    AssetSource, LeaderboardSource, RecordSource, ScopeFilter, SourceError, ThresholdSource,
};
use crate::spiral::{choose_expansion, spiderfy, ClusterExpansion, SpiderExpansion};
use crate::surface::{layers, EventKind, MapSurface, SurfaceEvent};
use crate::symbols::{self, resolve_symbol};
use crate::view::{
    build_markers, LeaderboardEntry, Leaderboards, LocationPanel, MapMarker, PointFeature,
};

/// A leaderboard fetch issued on entering a location focus, tagged with the
/// selection epoch so a superseded result identifies itself on arrival.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardRequest {
    pub epoch: u64,
    pub location_name: String,
}

/// Side effect requested by a pure event transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    FetchLeaderboards(LeaderboardRequest),
    EaseTo {
        center: GeoCoord,
        zoom: f64,
    },
    ExpandCluster {
        cluster_id: u64,
        leaf_count: usize,
        center: GeoCoord,
    },
}

#[derive(Debug, Deserialize)]
struct PointClickPayload {
    record_id: Uuid,
}

#[derive(Debug, Deserialize)]
struct ClusterClickPayload {
    cluster_id: u64,
    point_count: usize,
    latitude: f64,
    longitude: f64,
}

pub struct MapEngine<S> {
    config: EngineConfig,
    surface: S,
    cache: ThresholdCache,
    records: Vec<MeasurementRecord>,
    filter: RecordFilter,
    selection: Selection,
    spider: Option<SpiderExpansion>,
    groups: Vec<LocationGroup>,
    markers: Vec<MapMarker>,
    panel: Option<LocationPanel>,
}

impl<S: MapSurface> MapEngine<S> {
    #[must_use]
    pub fn new(config: EngineConfig, surface: S) -> Self {
        Self {
            config,
            surface,
            cache: ThresholdCache::empty(),
            records: Vec::new(),
            filter: RecordFilter::default(),
            selection: Selection::default(),
            spider: None,
            groups: Vec::new(),
            markers: Vec::new(),
            panel: None,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn groups(&self) -> &[LocationGroup] {
        &self.groups
    }

    pub fn markers(&self) -> &[MapMarker] {
        &self.markers
    }

    pub fn panel(&self) -> Option<&LocationPanel> {
        self.panel.as_ref()
    }

    pub fn selection(&self) -> &SelectionState {
        self.selection.state()
    }

    pub fn spider(&self) -> Option<&SpiderExpansion> {
        self.spider.as_ref()
    }

    pub fn filter(&self) -> &RecordFilter {
        &self.filter
    }

    /// Per-record features for the individually drawn point layer.
    ///
    /// Derived on demand rather than cached in `rebuild`, so symbol
    /// resolution sees the assets registered by the latest batch load.
    #[must_use]
    pub fn point_features(&self) -> Vec<PointFeature> {
        self.records
            .iter()
            .filter(|record| self.filter.matches(record) && record.is_placeable())
            .map(|record| {
                let thresholds = resolve_thresholds(&self.cache, &record.crop);
                let band = quality_band(record.reading, &thresholds);
                PointFeature {
                    record_id: record.id,
                    position: record.coordinate(),
                    symbol: resolve_symbol(&self.surface, &record.crop),
                    band,
                    color: band_color(band),
                }
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Data loading
    // -----------------------------------------------------------------------

    /// Replace the loaded record set from the record source and recompute
    /// the derived view.
    ///
    /// # Errors
    ///
    /// A fetch failure empties the record set, rebuilds, and returns
    /// [`EngineError::Source`] for the caller to surface — the engine itself
    /// stays usable.
    pub async fn reload_records<R: RecordSource>(&mut self, source: &R) -> Result<(), EngineError> {
        match source.fetch_records().await {
            Ok(records) => {
                self.records = records;
                self.rebuild();
                Ok(())
            }
            Err(source) => {
                self.records.clear();
                self.rebuild();
                Err(EngineError::Source {
                    context: "records",
                    source,
                })
            }
        }
    }

    /// Rebuild the threshold cache: fetch every crop present in the loaded
    /// records concurrently, then install the new generation wholesale.
    ///
    /// Per-crop failures degrade to absent (the crop scores against the
    /// dataset fallback) and are logged, never fatal. Returns the number of
    /// crops that got thresholds.
    pub async fn reload_thresholds<T: ThresholdSource>(&mut self, source: &T) -> usize {
        let crops: Vec<String> = {
            let mut seen = HashSet::new();
            self.records
                .iter()
                .filter(|record| seen.insert(record.crop.as_str()))
                .map(|record| record.crop.clone())
                .collect()
        };

        let results = join_all(crops.iter().map(|crop| async move {
            (crop.clone(), source.fetch_thresholds(crop).await)
        }))
        .await;

        let mut thresholds = HashMap::new();
        for (crop, result) in results {
            match result {
                Ok(Some(set)) => {
                    thresholds.insert(crop, set);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(
                        crop = %crop,
                        error = %e,
                        "threshold fetch failed; crop will score against the dataset fallback"
                    );
                }
            }
        }

        let loaded = thresholds.len();
        let fallback = FallbackRange::from_readings(self.records.iter().map(|r| r.reading));
        self.cache.replace(thresholds, fallback);
        self.rebuild();
        loaded
    }

    /// Load symbol assets for every crop in the filtered record set, plus
    /// the fallback, then leave the surface ready for a layer rebuild.
    ///
    /// # Errors
    ///
    /// Only a failed fallback-asset load is an error; see
    /// [`symbols::sync_symbols`].
    pub async fn sync_symbols<A: AssetSource>(&mut self, assets: &A) -> Result<usize, EngineError> {
        let labels: Vec<String> = {
            let mut seen = HashSet::new();
            self.records
                .iter()
                .filter(|record| self.filter.matches(record))
                .filter(|record| seen.insert(record.crop.as_str()))
                .map(|record| record.crop.clone())
                .collect()
        };
        symbols::sync_symbols(&mut self.surface, assets, labels.iter().map(String::as_str)).await
    }

    /// Swap the active filter and recompute. The drilled sub-group is
    /// grouping-dependent state and resets; the location focus survives
    /// unless the location itself drops out of the filtered set.
    pub fn set_filter(&mut self, filter: RecordFilter) {
        if filter == self.filter {
            return;
        }
        self.filter = filter;
        self.selection.clear_subgroup();
        self.rebuild();
    }

    /// Change the side panel's grouping mode, clearing the drilled
    /// sub-group but keeping the location focus.
    pub fn set_grouping(&mut self, mode: GroupingMode) {
        self.selection.set_grouping(mode);
        if let Some(panel) = &mut self.panel {
            panel.grouping = mode;
            panel.subgroup_records.clear();
        }
    }

    /// Recompute the full derived view from the current records and filter.
    fn rebuild(&mut self) {
        self.cache
            .set_fallback(FallbackRange::from_readings(
                self.records.iter().map(|r| r.reading),
            ));

        let filtered: Vec<&MeasurementRecord> = self
            .records
            .iter()
            .filter(|record| self.filter.matches(record))
            .collect();

        self.groups = group_by_location(filtered.iter().copied(), &self.cache);
        self.markers = build_markers(&self.groups, &self.config);

        let placeable: Vec<MeasurementRecord> = filtered
            .iter()
            .filter(|record| record.is_placeable())
            .map(|record| (*record).clone())
            .collect();
        self.surface.set_source_data(placeable);

        // Spiderfy state never survives a data change.
        self.spider = None;

        let groups = &self.groups;
        self.selection
            .retain_if(|name| groups.iter().any(|g| g.location_name == name));

        match self.selection.state() {
            SelectionState::Idle => self.panel = None,
            SelectionState::LocationFocused { .. } | SelectionState::SubgroupFocused { .. } => {
                self.refresh_subgroup_records();
            }
        }
    }

    // -----------------------------------------------------------------------
    // Interaction
    // -----------------------------------------------------------------------

    /// Dispatch one surface event through the selection machine and spiderfy
    /// rules. Pure: side effects come back as [`Effect`]s for the driver.
    pub fn handle_event(&mut self, event: &SurfaceEvent) -> Vec<Effect> {
        if event.kind != EventKind::Click {
            return Vec::new();
        }

        match event.layer.as_str() {
            layers::POINTS | layers::SPIDER_POINTS => {
                if event.layer != layers::SPIDER_POINTS {
                    self.spider = None;
                }
                match serde_json::from_value::<PointClickPayload>(event.payload.clone()) {
                    Ok(payload) => self.focus_record(payload.record_id).into_iter().collect(),
                    Err(e) => {
                        tracing::warn!(error = %e, "malformed point click payload ignored");
                        Vec::new()
                    }
                }
            }
            layers::CLUSTERS => {
                self.spider = None;
                match serde_json::from_value::<ClusterClickPayload>(event.payload.clone()) {
                    Ok(payload) => {
                        let center = GeoCoord {
                            latitude: payload.latitude,
                            longitude: payload.longitude,
                        };
                        match choose_expansion(
                            payload.point_count,
                            self.surface.zoom(),
                            &self.config,
                        ) {
                            ClusterExpansion::Spiderfy => vec![Effect::ExpandCluster {
                                cluster_id: payload.cluster_id,
                                leaf_count: payload.point_count,
                                center,
                            }],
                            ClusterExpansion::EaseZoom => {
                                let zoom = (self.surface.zoom() + self.config.expand_zoom_step)
                                    .min(self.surface.max_zoom());
                                vec![Effect::EaseTo { center, zoom }]
                            }
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "malformed cluster click payload ignored");
                        Vec::new()
                    }
                }
            }
            // Legs are traceability furniture; clicking one dismisses nothing.
            layers::SPIDER_LEGS => Vec::new(),
            _ => {
                self.spider = None;
                self.selection.close();
                self.panel = None;
                Vec::new()
            }
        }
    }

    fn focus_record(&mut self, record_id: Uuid) -> Option<Effect> {
        let Some(record) = self.records.iter().find(|r| r.id == record_id) else {
            tracing::warn!(record = %record_id, "click on unknown record id ignored");
            return None;
        };
        let location_name = record.location_name.clone();
        let epoch = self.selection.focus_location(&location_name);
        self.panel = Some(LocationPanel::open(&location_name, self.selection.grouping()));
        Some(Effect::FetchLeaderboards(LeaderboardRequest {
            epoch,
            location_name,
        }))
    }

    /// Drill into a crop or brand entry from the focused location's
    /// leaderboard. Returns whether the transition happened.
    pub fn select_subgroup(&mut self, subgroup: Subgroup) -> bool {
        if !self.selection.drill(subgroup) {
            return false;
        }
        self.refresh_subgroup_records();
        true
    }

    /// Return from a drilled sub-group to the location focus.
    pub fn go_back(&mut self) -> bool {
        if !self.selection.back() {
            return false;
        }
        self.refresh_subgroup_records();
        true
    }

    /// Explicit panel close.
    pub fn close_panel(&mut self) {
        self.selection.close();
        self.panel = None;
    }

    fn refresh_subgroup_records(&mut self) {
        let (location_name, subgroup) = match self.selection.state() {
            SelectionState::SubgroupFocused {
                location_name,
                subgroup,
                ..
            } => (location_name.clone(), subgroup.clone()),
            _ => {
                if let Some(panel) = &mut self.panel {
                    panel.subgroup_records.clear();
                }
                return;
            }
        };

        let rows: Vec<MeasurementRecord> = self
            .records
            .iter()
            .filter(|record| self.filter.matches(record))
            .filter(|record| record.location_name == location_name)
            .filter(|record| match &subgroup {
                Subgroup::Crop(crop) => record.crop == *crop,
                Subgroup::Brand(brand) => record.brand.as_deref() == Some(brand.as_str()),
            })
            .cloned()
            .collect();

        if let Some(panel) = &mut self.panel {
            panel.subgroup_records = rows;
        }
    }

    /// Apply a settled leaderboard fetch. A result whose epoch no longer
    /// matches the current selection was superseded in flight and is
    /// discarded silently.
    pub fn apply_leaderboards(
        &mut self,
        request: &LeaderboardRequest,
        leaderboards: Leaderboards,
        notice: Option<String>,
    ) {
        if request.epoch != self.selection.epoch() {
            tracing::debug!(
                location = %request.location_name,
                "stale leaderboard result discarded"
            );
            return;
        }
        if let Some(panel) = &mut self.panel {
            panel.leaderboards = leaderboards;
            panel.notice = notice;
        }
    }

    /// Materialize the spiral layout for a cluster. A leaves fetch failure
    /// degrades to no expansion, logged, never fatal.
    pub async fn expand_cluster(&mut self, cluster_id: u64, leaf_count: usize, center: GeoCoord) {
        match self.surface.cluster_leaves(cluster_id, leaf_count).await {
            Ok(members) => {
                self.spider = Some(spiderfy(
                    &self.surface,
                    cluster_id,
                    center,
                    members,
                    &self.config,
                ));
            }
            Err(e) => {
                tracing::warn!(
                    cluster = cluster_id,
                    error = %e,
                    "cluster leaves fetch failed; expansion skipped"
                );
                self.spider = None;
            }
        }
    }

    /// Dispatch one event and execute whatever effects it produced. Every
    /// failure degrades internally; nothing escapes this boundary.
    pub async fn process_event<L: LeaderboardSource>(
        &mut self,
        event: &SurfaceEvent,
        leaderboards: &L,
    ) {
        for effect in self.handle_event(event) {
            match effect {
                Effect::FetchLeaderboards(request) => {
                    let (lists, notice) = fetch_leaderboards(leaderboards, &request).await;
                    self.apply_leaderboards(&request, lists, notice);
                }
                Effect::EaseTo { center, zoom } => self.surface.ease_to(center, zoom),
                Effect::ExpandCluster {
                    cluster_id,
                    leaf_count,
                    center,
                } => self.expand_cluster(cluster_id, leaf_count, center).await,
            }
        }
    }

    /// Consume the surface's event stream until it closes.
    pub async fn drive<L: LeaderboardSource>(
        &mut self,
        mut events: mpsc::Receiver<SurfaceEvent>,
        leaderboards: &L,
    ) {
        while let Some(event) = events.recv().await {
            self.process_event(&event, leaderboards).await;
        }
    }
}

/// Fetch the three leaderboard lists scoped to one location, concurrently.
///
/// Each list is independently failable: a failure degrades to an empty list
/// and contributes a non-blocking notice instead of an error.
pub async fn fetch_leaderboards<L: LeaderboardSource>(
    source: &L,
    request: &LeaderboardRequest,
) -> (Leaderboards, Option<String>) {
    let scope = ScopeFilter::location(&request.location_name);
    let (overall, by_crop, by_brand) = futures::join!(
        source.location_leaderboard(&scope),
        source.crop_leaderboard(&scope),
        source.brand_leaderboard(&scope),
    );

    let mut failures = 0usize;
    let overall = settle(overall, "overall", &request.location_name, &mut failures);
    let by_crop = settle(by_crop, "crop", &request.location_name, &mut failures);
    let by_brand = settle(by_brand, "brand", &request.location_name, &mut failures);

    let notice =
        (failures > 0).then(|| "Some rankings are temporarily unavailable.".to_string());
    (
        Leaderboards {
            overall,
            by_crop,
            by_brand,
        },
        notice,
    )
}

fn settle(
    result: Result<Vec<LeaderboardEntry>, SourceError>,
    list: &'static str,
    location_name: &str,
    failures: &mut usize,
) -> Vec<LeaderboardEntry> {
    match result {
        Ok(rows) => rows,
        Err(e) => {
            *failures += 1;
            tracing::warn!(
                list,
                location = %location_name,
                error = %e,
                "leaderboard fetch failed; showing an empty list"
            );
            Vec::new()
        }
    }
}
