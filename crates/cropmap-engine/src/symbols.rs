//! Symbol resolution and the batch asset-load protocol.

use std::collections::HashSet;

use cropmap_core::canonical_symbol_id;
use futures::future::join_all;

use crate::error::EngineError;
use crate::sources::AssetSource;
use crate::surface::MapSurface;

/// The symbol every record falls back to when its own asset is not loaded.
/// Registered before any record-dependent layer is drawn.
pub const FALLBACK_SYMBOL_ID: &str = "crop_generic";

/// Resolve the symbol to draw for a crop label.
///
/// Correctness over completeness: a record always gets some valid symbol,
/// so a label whose asset is not loaded resolves to [`FALLBACK_SYMBOL_ID`]
/// rather than blocking rendering.
#[must_use]
pub fn resolve_symbol<S: MapSurface>(surface: &S, crop: &str) -> String {
    let id = canonical_symbol_id(crop);
    if surface.has_asset(&id) {
        id
    } else {
        FALLBACK_SYMBOL_ID.to_string()
    }
}

/// Load the symbol assets for the given crop labels, plus the fallback.
///
/// Each missing asset is requested exactly once; assets the surface already
/// has are skipped. Every request settles before this returns, so dependent
/// layers are only rebuilt against a stable asset set. An individual failure
/// is logged and leaves that label resolving to the fallback.
///
/// Returns the number of newly registered assets.
///
/// # Errors
///
/// Returns [`EngineError::FallbackSymbol`] only when the fallback asset
/// itself cannot be fetched — the one asset rendering cannot proceed
/// without. Successfully fetched assets are still registered first.
pub async fn sync_symbols<'a, S, A, I>(
    surface: &mut S,
    assets: &A,
    crop_labels: I,
) -> Result<usize, EngineError>
where
    S: MapSurface,
    A: AssetSource,
    I: IntoIterator<Item = &'a str>,
{
    let mut wanted: Vec<String> = vec![FALLBACK_SYMBOL_ID.to_string()];
    let mut seen: HashSet<String> = wanted.iter().cloned().collect();
    for label in crop_labels {
        let id = canonical_symbol_id(label);
        if seen.insert(id.clone()) {
            wanted.push(id);
        }
    }

    let missing: Vec<String> = wanted
        .into_iter()
        .filter(|id| !surface.has_asset(id))
        .collect();

    let results = join_all(
        missing
            .iter()
            .map(|id| async move { (id.clone(), assets.fetch_symbol(id).await) }),
    )
    .await;

    let mut registered = 0;
    let mut fallback_failure = None;
    for (id, result) in results {
        match result {
            Ok(image) => {
                surface.register_asset(&id, image);
                registered += 1;
            }
            Err(e) if id == FALLBACK_SYMBOL_ID => fallback_failure = Some(e),
            Err(e) => {
                tracing::warn!(
                    symbol = %id,
                    error = %e,
                    "symbol asset load failed; records will use the fallback"
                );
            }
        }
    }

    match fallback_failure {
        Some(source) => Err(EngineError::FallbackSymbol {
            id: FALLBACK_SYMBOL_ID.to_string(),
            source,
        }),
        None => Ok(registered),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use crate::sources::SourceError;
    use crate::surface::PlanarSurface;

    use super::*;

    /// Asset source that fails for configured ids and counts every fetch.
    struct ScriptedAssets {
        failing: Vec<String>,
        fetched: Mutex<HashMap<String, usize>>,
    }

    impl ScriptedAssets {
        fn new(failing: &[&str]) -> Self {
            Self {
                failing: failing.iter().map(|s| (*s).to_string()).collect(),
                fetched: Mutex::new(HashMap::new()),
            }
        }

        fn fetch_count(&self, id: &str) -> usize {
            self.fetched.lock().unwrap().get(id).copied().unwrap_or(0)
        }
    }

    impl AssetSource for ScriptedAssets {
        async fn fetch_symbol(&self, id: &str) -> Result<Vec<u8>, SourceError> {
            *self
                .fetched
                .lock()
                .unwrap()
                .entry(id.to_string())
                .or_insert(0) += 1;
            if self.failing.iter().any(|f| f == id) {
                Err(SourceError::new(format!("no such asset: {id}")))
            } else {
                Ok(vec![0u8; 4])
            }
        }
    }

    #[test]
    fn loaded_label_resolves_to_its_canonical_id() {
        let mut surface = PlanarSurface::new(10.0);
        surface.register_asset("winter_wheat", vec![0u8]);
        assert_eq!(resolve_symbol(&surface, "Winter Wheat"), "winter_wheat");
    }

    #[test]
    fn missing_label_resolves_to_fallback() {
        let surface = PlanarSurface::new(10.0);
        assert_eq!(resolve_symbol(&surface, "quince"), FALLBACK_SYMBOL_ID);
    }

    #[tokio::test]
    async fn batch_registers_unique_ids_and_fallback() {
        let mut surface = PlanarSurface::new(10.0);
        let assets = ScriptedAssets::new(&[]);

        let registered = sync_symbols(&mut surface, &assets, ["apple", "Apple", "pear"])
            .await
            .unwrap();

        // apple + pear + fallback; the duplicate label collapsed.
        assert_eq!(registered, 3);
        assert!(surface.has_asset("apple"));
        assert!(surface.has_asset("pear"));
        assert!(surface.has_asset(FALLBACK_SYMBOL_ID));
        assert_eq!(assets.fetch_count("apple"), 1);
    }

    #[tokio::test]
    async fn already_registered_assets_are_skipped() {
        let mut surface = PlanarSurface::new(10.0);
        surface.register_asset("apple", vec![0u8]);
        let assets = ScriptedAssets::new(&[]);

        sync_symbols(&mut surface, &assets, ["apple"]).await.unwrap();

        assert_eq!(assets.fetch_count("apple"), 0);
        assert_eq!(assets.fetch_count(FALLBACK_SYMBOL_ID), 1);
    }

    #[tokio::test]
    async fn individual_failure_does_not_block_the_batch() {
        let mut surface = PlanarSurface::new(10.0);
        let assets = ScriptedAssets::new(&["pear"]);

        let registered = sync_symbols(&mut surface, &assets, ["apple", "pear"])
            .await
            .unwrap();

        assert_eq!(registered, 2);
        assert!(surface.has_asset("apple"));
        assert!(!surface.has_asset("pear"));
        assert_eq!(resolve_symbol(&surface, "pear"), FALLBACK_SYMBOL_ID);
    }

    #[tokio::test]
    async fn fallback_failure_is_surfaced_after_the_batch_settles() {
        let mut surface = PlanarSurface::new(10.0);
        let assets = ScriptedAssets::new(&[FALLBACK_SYMBOL_ID]);

        let err = sync_symbols(&mut surface, &assets, ["apple"])
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::FallbackSymbol { .. }));
        // The rest of the batch still registered before the error surfaced.
        assert!(surface.has_asset("apple"));
    }
}
