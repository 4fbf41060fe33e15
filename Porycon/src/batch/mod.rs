//! Batch conversion
//!
//! A batch runs in three phases separated by barriers:
//!
//! 1. **Scan**: maps are read in parallel. Each worker fills its own usage
//!    set and warp table; they are merged once every map is done.
//! 2. **Build**: the merged usage is sealed and every tileset's atlas is
//!    built, tilesets in parallel with each other.
//! 3. **Emit**: with identifier tables and the warp lookup frozen, maps are
//!    translated to global tile ids in parallel.
//!
//! Failures stay with the map or tileset they belong to. A tileset that fails
//! to build fails every map that draws from it, with the same shared error.
//!
//! # Example
//!
//! ```no_run
//! use porycon::batch;
//! use porycon::config::ConvertOptions;
//! use porycon::project::MapSet;
//!
//! let set = MapSet::discover("pokeemerald")?;
//! let result = batch::run(&set, &ConvertOptions::default())?;
//! println!("{} converted, {} failed", result.success_count(), result.error_count());
//! # Ok::<(), porycon::Error>(())
//! ```

mod build;
mod emit;
pub mod progress;
pub mod result;
mod scan;

pub use progress::{BatchPhase, BatchProgress, BatchProgressCallback};
pub use result::{
    BatchResult, BatchSummary, BorderLayers, ConvertedMap, ErrorEntry, MapConversionResult,
    MapOutcome, MapPhase, MapProperties, MetatileGrids, TileLayer, TilesetBuildResult, TilesetRef,
    TilesetSummary,
};

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;

use crate::atlas::{TilesetAtlas, UsageArena};
use crate::config::ConvertOptions;
use crate::error::{Error, Result};
use crate::project::MapSet;
use crate::warp::{WarpLookup, WorldLayout, WorldNode, build_world};
use emit::{GidResolver, emit_map};
use scan::ScannedMap;

/// Convert every map in `set`.
///
/// Only configuration problems (an unreadable animation catalog, a worker
/// pool that cannot start) fail the call; everything else is reported in the
/// returned [`BatchResult`].
pub fn run(set: &MapSet, options: &ConvertOptions) -> Result<BatchResult> {
    run_with_progress(set, options, &|_| {})
}

/// Convert every map in `set`, reporting progress per phase.
pub fn run_with_progress(
    set: &MapSet,
    options: &ConvertOptions,
    progress: BatchProgressCallback<'_>,
) -> Result<BatchResult> {
    let catalog = if options.emit_animations {
        Some(options.catalog()?)
    } else {
        None
    };
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.workers)
        .build()
        .map_err(|e| Error::ThreadPool(e.to_string()))?;

    tracing::info!(
        "Converting {} maps with {} workers",
        set.len(),
        pool.current_num_threads()
    );

    Ok(pool.install(|| {
        let store = scan::load_tilesets(set, options, progress);
        tracing::info!("Loaded {} tilesets", store.values().filter(|t| t.is_ok()).count());

        let scanned = scan::scan_maps(set, &store, options, progress);
        let mut arena = UsageArena::new();
        for (name, loaded) in &store {
            if loaded.is_ok() {
                arena.declare(name);
            }
        }
        arena.merge(scanned.usage);
        let lookup = scanned.warps.finish();
        tracing::info!(
            "Scanned {} maps ({} with warp tables)",
            scanned.maps.len(),
            lookup.map_count()
        );

        let (pairings, mut warnings) = build::choose_pairings(&scanned.pairings);
        let tilesets = build::build_tilesets(
            arena.seal(),
            &store,
            &pairings,
            catalog.as_ref(),
            options.atlas_columns,
            progress,
        );
        tracing::info!(
            "Built {} atlases",
            tilesets.values().filter(|t| t.outcome.is_ok()).count()
        );

        let maps = emit_all(set, scanned.maps, &tilesets, &lookup, options, progress);

        progress(&BatchProgress::new(BatchPhase::Assembling, 0, 1));
        let world = assemble_world(set, options.world_start_map.as_deref());
        warnings.extend(world.warnings.iter().cloned());
        progress(&BatchProgress::new(BatchPhase::Assembling, 1, 1));

        let result = BatchResult {
            maps,
            tilesets,
            world: Some(world),
            warnings,
            skipped: set.skipped.clone(),
        };
        tracing::info!(
            "Batch complete: {} converted, {} failed",
            result.success_count(),
            result.error_count()
        );
        result
    }))
}

fn emit_all(
    set: &MapSet,
    scanned: Vec<(usize, Result<ScannedMap<'_>>)>,
    tilesets: &BTreeMap<String, TilesetBuildResult>,
    lookup: &WarpLookup,
    options: &ConvertOptions,
    progress: BatchProgressCallback<'_>,
) -> Vec<MapConversionResult> {
    let total = scanned.len();
    let processed = AtomicUsize::new(0);

    scanned
        .into_par_iter()
        .map(|(index, scanned)| {
            let result = match scanned {
                Ok(map) => emit_one(&map, tilesets, lookup, options),
                Err(e) => MapConversionResult {
                    map_id: set.maps[index].id().to_string(),
                    outcome: MapOutcome::Failed {
                        phase: MapPhase::Scan,
                        error: Arc::new(e),
                    },
                    warnings: Vec::new(),
                },
            };
            let current = processed.fetch_add(1, Ordering::SeqCst) + 1;
            progress(&BatchProgress::with_item(
                BatchPhase::Emitting,
                current,
                total,
                result.map_id.as_str(),
            ));
            result
        })
        .collect()
}

fn atlas_for<'t>(
    tilesets: &'t BTreeMap<String, TilesetBuildResult>,
    name: &str,
) -> std::result::Result<&'t TilesetAtlas, Arc<Error>> {
    match tilesets.get(name).map(|t| &t.outcome) {
        Some(Ok(atlas)) => Ok(atlas),
        Some(Err(cause)) => Err(Arc::clone(cause)),
        None => Err(Arc::new(Error::TilesetNotFound {
            name: name.to_string(),
        })),
    }
}

fn emit_one(
    map: &ScannedMap<'_>,
    tilesets: &BTreeMap<String, TilesetBuildResult>,
    lookup: &WarpLookup,
    options: &ConvertOptions,
) -> MapConversionResult {
    let map_id = map.entry.id().to_string();
    let failed = |phase, error| MapConversionResult {
        map_id: map_id.clone(),
        outcome: MapOutcome::Failed { phase, error },
        warnings: Vec::new(),
    };

    let primary = match atlas_for(tilesets, &map.primary.name) {
        Ok(atlas) => atlas,
        Err(cause) => return failed(MapPhase::Build, cause),
    };
    let secondary = match map.secondary.as_ref().map(|t| atlas_for(tilesets, &t.name)).transpose() {
        Ok(atlas) => atlas,
        Err(cause) => return failed(MapPhase::Build, cause),
    };

    let gids = GidResolver::new(primary, secondary, options.keep_blank_tiles);
    match emit_map(map, &gids, lookup) {
        Ok((converted, warnings)) => MapConversionResult {
            map_id: map_id.clone(),
            outcome: MapOutcome::Converted(Box::new(converted)),
            warnings,
        },
        Err(e) => {
            tracing::warn!("Map {} failed to emit: {}", map_id, e);
            failed(MapPhase::Emit, Arc::new(e))
        }
    }
}

/// Place every map with a known layout, whether or not it converted.
fn assemble_world(set: &MapSet, start: Option<&str>) -> WorldLayout {
    let nodes: Vec<WorldNode<'_>> = set
        .maps
        .iter()
        .filter_map(|entry| {
            let layout = set.layout_for(entry).ok()?;
            Some(WorldNode {
                map_id: entry.id(),
                width: layout.width,
                height: layout.height,
                connections: entry.document.connections(),
            })
        })
        .collect();
    build_world(&nodes, start)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_set() {
        let dir = tempfile::tempdir().unwrap();
        let set = MapSet::from_parts(dir.path(), Vec::new(), Vec::new());
        let result = run(&set, &ConvertOptions::default()).unwrap();
        assert_eq!(result.success_count(), 0);
        assert!(result.tilesets.is_empty());
        assert!(result.world.is_some_and(|w| w.maps.is_empty()));
    }

    #[test]
    fn test_unknown_layout_fails_in_scan() {
        let dir = tempfile::tempdir().unwrap();
        let doc: crate::project::MapDocument = serde_json::from_str(
            r#"{"id": "MAP_A", "name": "A", "layout": "LAYOUT_MISSING"}"#,
        )
        .unwrap();
        let set = MapSet::from_parts(dir.path(), Vec::new(), vec![doc]);
        let result = run(&set, &ConvertOptions::default()).unwrap();

        let map = result.map("MAP_A").unwrap();
        assert!(matches!(
            &map.outcome,
            MapOutcome::Failed { phase: MapPhase::Scan, error } if matches!(**error, Error::LayoutNotFound(_))
        ));
        assert_eq!(result.summary().errors.len(), 1);
    }
}
