//! Atlas building
//!
//! Runs once per tileset after scanning, consuming the sealed usage sets.
//! Tilesets build in parallel with each other; each build is sequential.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;

use super::progress::{BatchPhase, BatchProgress, BatchProgressCallback};
use super::result::TilesetBuildResult;
use super::scan::TilesetStore;
use crate::animation::{AnimationCatalog, extract_animations};
use crate::atlas::{SealedUsage, TileSource, build_atlas};
use crate::error::{Error, Result};
use crate::warning::Warning;

/// Pick one primary per secondary tileset.
///
/// With several candidates the lexicographically smallest wins and an
/// [`Warning::AmbiguousPrimaryPairing`] is raised.
pub(crate) fn choose_pairings(
    pairings: &BTreeMap<String, BTreeSet<String>>,
) -> (HashMap<String, String>, Vec<Warning>) {
    let mut chosen = HashMap::new();
    let mut warnings = Vec::new();
    for (secondary, primaries) in pairings {
        let mut iter = primaries.iter();
        let Some(first) = iter.next() else {
            continue;
        };
        let others: Vec<String> = iter.cloned().collect();
        if !others.is_empty() {
            warnings.push(
                Warning::AmbiguousPrimaryPairing {
                    secondary: secondary.clone(),
                    chosen: first.clone(),
                    others,
                }
                .logged(),
            );
        }
        chosen.insert(secondary.clone(), first.clone());
    }
    (chosen, warnings)
}

/// Build atlases for every sealed usage set. Tilesets that failed to load are
/// reported with their load error.
pub(crate) fn build_tilesets(
    sealed: BTreeMap<String, SealedUsage>,
    store: &TilesetStore,
    pairings: &HashMap<String, String>,
    catalog: Option<&AnimationCatalog>,
    columns: u32,
    progress: BatchProgressCallback<'_>,
) -> BTreeMap<String, TilesetBuildResult> {
    let total = sealed.len();
    let processed = AtomicUsize::new(0);

    let mut results: BTreeMap<String, TilesetBuildResult> = sealed
        .into_par_iter()
        .map(|(name, usage)| {
            let current = processed.fetch_add(1, Ordering::SeqCst) + 1;
            progress(&BatchProgress::with_item(BatchPhase::BuildingAtlases, current, total, &name));

            let outcome = build_one(usage, store, pairings, catalog, columns).map_err(|e| {
                tracing::warn!("Tileset {} failed to build: {}", name, e);
                Arc::new(e)
            });
            (name.clone(), TilesetBuildResult { name, outcome })
        })
        .collect();

    for (name, loaded) in store {
        if let Err(cause) = loaded {
            results.entry(name.clone()).or_insert_with(|| TilesetBuildResult {
                name: name.clone(),
                outcome: Err(Arc::clone(cause)),
            });
        }
    }
    results
}

fn build_one(
    usage: SealedUsage,
    store: &TilesetStore,
    pairings: &HashMap<String, String>,
    catalog: Option<&AnimationCatalog>,
    columns: u32,
) -> Result<crate::atlas::TilesetAtlas> {
    let name = usage.tileset().to_string();
    let tileset = match store.get(&name) {
        Some(Ok(tileset)) => tileset,
        Some(Err(cause)) => {
            return Err(Error::TilesetFailed {
                tileset: name,
                cause: cause.to_string(),
            });
        }
        None => return Err(Error::TilesetNotFound { name }),
    };
    let paired_primary = if tileset.is_primary() {
        None
    } else {
        pairings
            .get(&name)
            .and_then(|primary| store.get(primary))
            .and_then(|loaded| loaded.as_ref().ok())
    };

    let source = TileSource::new(tileset, paired_primary.map(AsRef::as_ref));
    let mut atlas = build_atlas(usage, &source, columns)?;
    if let Some(catalog) = catalog {
        extract_animations(catalog, &source, &mut atlas)?;
    }

    tracing::debug!(
        "Tileset {}: {} unique tiles, {} animations",
        name,
        atlas.base_tile_count(),
        atlas.animations.len()
    );
    Ok(atlas)
}
