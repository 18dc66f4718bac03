//! Engine tunables with documented defaults and env-var overrides.

const DEFAULT_SPIRAL_BASE_RADIUS_PX: f64 = 60.0;
const DEFAULT_SPIRAL_GROWTH_PER_RADIAN: f64 = 0.15;
const DEFAULT_SPIRAL_ANGLE_STEP: f64 = 0.5;
const DEFAULT_SPIDERFY_ZOOM_THRESHOLD: f64 = 13.0;
const DEFAULT_SPIDERFY_LEAF_THRESHOLD: usize = 5;
const DEFAULT_EXPAND_ZOOM_STEP: f64 = 2.0;
const DEFAULT_SCORE_BUCKET_EDGES: [f64; 3] = [1.25, 1.5, 1.75];

/// Tunables for grouping, the spiral de-overlap layout, and score coloring.
///
/// Injected into the engine rather than read from constants at use sites,
/// so a deployment can tune the layout without touching engine code.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Radius of the innermost spiral slot, in pixels.
    pub spiral_base_radius_px: f64,
    /// Radius growth per radian of spiral angle, as a fraction of the base.
    pub spiral_growth_per_radian: f64,
    /// Angular step between consecutive spiral slots, in radians.
    pub spiral_angle_step: f64,
    /// At or above this zoom a cluster always expands by spiderfying.
    pub spiderfy_zoom_threshold: f64,
    /// Clusters with at most this many leaves spiderfy regardless of zoom.
    pub spiderfy_leaf_threshold: usize,
    /// Zoom step applied when a cluster expands by easing instead.
    pub expand_zoom_step: f64,
    /// Ascending bucket edges over the normalized score for the four-color
    /// scale.
    pub score_bucket_edges: [f64; 3],
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            spiral_base_radius_px: DEFAULT_SPIRAL_BASE_RADIUS_PX,
            spiral_growth_per_radian: DEFAULT_SPIRAL_GROWTH_PER_RADIAN,
            spiral_angle_step: DEFAULT_SPIRAL_ANGLE_STEP,
            spiderfy_zoom_threshold: DEFAULT_SPIDERFY_ZOOM_THRESHOLD,
            spiderfy_leaf_threshold: DEFAULT_SPIDERFY_LEAF_THRESHOLD,
            expand_zoom_step: DEFAULT_EXPAND_ZOOM_STEP,
            score_bucket_edges: DEFAULT_SCORE_BUCKET_EDGES,
        }
    }
}

impl EngineConfig {
    /// Build the config from process env vars, loading `.env` first.
    #[must_use]
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key))
    }

    /// Build the config using the provided env-var lookup function.
    ///
    /// Unset or unparseable variables fall back to the documented defaults;
    /// overrides never fail.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        Self {
            spiral_base_radius_px: read_f64(
                &lookup,
                "CROPMAP_SPIRAL_BASE_RADIUS_PX",
                DEFAULT_SPIRAL_BASE_RADIUS_PX,
            ),
            spiral_growth_per_radian: read_f64(
                &lookup,
                "CROPMAP_SPIRAL_GROWTH_PER_RADIAN",
                DEFAULT_SPIRAL_GROWTH_PER_RADIAN,
            ),
            spiral_angle_step: read_f64(
                &lookup,
                "CROPMAP_SPIRAL_ANGLE_STEP",
                DEFAULT_SPIRAL_ANGLE_STEP,
            ),
            spiderfy_zoom_threshold: read_f64(
                &lookup,
                "CROPMAP_SPIDERFY_ZOOM_THRESHOLD",
                DEFAULT_SPIDERFY_ZOOM_THRESHOLD,
            ),
            spiderfy_leaf_threshold: read_usize(
                &lookup,
                "CROPMAP_SPIDERFY_LEAF_THRESHOLD",
                DEFAULT_SPIDERFY_LEAF_THRESHOLD,
            ),
            expand_zoom_step: read_f64(
                &lookup,
                "CROPMAP_EXPAND_ZOOM_STEP",
                DEFAULT_EXPAND_ZOOM_STEP,
            ),
            score_bucket_edges: DEFAULT_SCORE_BUCKET_EDGES,
        }
    }
}

fn read_f64<F>(lookup: &F, var: &str, default: f64) -> f64
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    lookup(var)
        .ok()
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}

fn read_usize<F>(lookup: &F, var: &str, default: usize) -> usize
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    lookup(var)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env::VarError;

    use super::*;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = EngineConfig::default();

        assert_eq!(config.spiral_base_radius_px, 60.0);
        assert_eq!(config.spiral_growth_per_radian, 0.15);
        assert_eq!(config.spiral_angle_step, 0.5);
        assert_eq!(config.spiderfy_zoom_threshold, 13.0);
        assert_eq!(config.spiderfy_leaf_threshold, 5);
        assert_eq!(config.expand_zoom_step, 2.0);
        assert_eq!(config.score_bucket_edges, [1.25, 1.5, 1.75]);
    }

    #[test]
    fn empty_env_yields_defaults() {
        let map = HashMap::new();
        let config = EngineConfig::from_lookup(lookup_from_map(&map));
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn env_overrides_are_applied() {
        let mut map = HashMap::new();
        map.insert("CROPMAP_SPIRAL_BASE_RADIUS_PX", "45.5");
        map.insert("CROPMAP_SPIDERFY_LEAF_THRESHOLD", "8");
        let config = EngineConfig::from_lookup(lookup_from_map(&map));

        assert_eq!(config.spiral_base_radius_px, 45.5);
        assert_eq!(config.spiderfy_leaf_threshold, 8);
        assert_eq!(config.spiderfy_zoom_threshold, 13.0);
    }

    #[test]
    fn unparseable_override_falls_back_to_default() {
        let mut map = HashMap::new();
        map.insert("CROPMAP_SPIDERFY_ZOOM_THRESHOLD", "not-a-number");
        map.insert("CROPMAP_SPIRAL_BASE_RADIUS_PX", "NaN");
        let config = EngineConfig::from_lookup(lookup_from_map(&map));

        assert_eq!(config.spiderfy_zoom_threshold, 13.0);
        assert_eq!(config.spiral_base_radius_px, 60.0);
    }
}
