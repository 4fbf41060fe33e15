//! Tileset loading and map scanning
//!
//! Tilesets referenced by any layout are loaded once, in parallel, into a
//! shared store. Maps are then scanned in parallel with rayon's fold/reduce:
//! every worker accumulates its own usage set, warp builder and pairing table,
//! and the partial results are merged at the end of the phase.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;

use super::progress::{BatchPhase, BatchProgress, BatchProgressCallback};
use crate::atlas::LocalUsage;
use crate::config::ConvertOptions;
use crate::error::{Error, Result};
use crate::formats::{LayoutGrid, read_layout};
use crate::metatile::{MetatileSource, ResolvedMetatile, decompose};
use crate::project::{LayoutDef, MapEntry, MapSet};
use crate::tileset::{Tileset, TilesetLocator, tileset_key};
use crate::warp::WarpLookupBuilder;

/// Loaded tilesets keyed by normalized name. Failures are shared by every
/// map that references the tileset.
pub(crate) type TilesetStore = HashMap<String, std::result::Result<Arc<Tileset>, Arc<Error>>>;

/// Load every tileset referenced by a layout that some map uses.
pub(crate) fn load_tilesets(
    set: &MapSet,
    options: &ConvertOptions,
    progress: BatchProgressCallback<'_>,
) -> TilesetStore {
    let mut labels = BTreeSet::new();
    for map in &set.maps {
        if let Ok(layout) = set.layout_for(map) {
            labels.insert(layout.primary_tileset.clone());
            if let Some(secondary) = layout.secondary() {
                labels.insert(secondary.to_string());
            }
        }
    }

    let locator = TilesetLocator::new(&set.root);
    let total = labels.len();
    let processed = AtomicUsize::new(0);

    labels
        .into_par_iter()
        .map(|label| {
            let key = tileset_key(&label);
            let current = processed.fetch_add(1, Ordering::SeqCst) + 1;
            progress(&BatchProgress::with_item(BatchPhase::LoadingTilesets, current, total, &key));

            let loaded = Tileset::locate_and_load(&locator, &label, options.attribute_format)
                .map(Arc::new)
                .map_err(|e| {
                    tracing::warn!("Tileset {} failed to load: {}", label, e);
                    Arc::new(e)
                });
            (key, loaded)
        })
        .collect()
}

/// A map whose layout decoded and whose tiles were registered.
pub(crate) struct ScannedMap<'a> {
    pub entry: &'a MapEntry,
    pub layout: &'a LayoutDef,
    pub primary: Arc<Tileset>,
    pub secondary: Option<Arc<Tileset>>,
    pub grid: LayoutGrid,
    pub border: LayoutGrid,
    /// Every metatile the map or its border uses, by global id.
    pub metatiles: HashMap<u16, ResolvedMetatile>,
}

/// Per-worker scan state, merged across workers at the barrier.
#[derive(Default)]
pub(crate) struct ScanAccumulator<'a> {
    pub maps: Vec<(usize, Result<ScannedMap<'a>>)>,
    pub usage: LocalUsage,
    pub warps: WarpLookupBuilder,
    /// Secondary tileset -> primaries it was used with.
    pub pairings: BTreeMap<String, BTreeSet<String>>,
}

impl ScanAccumulator<'_> {
    fn merge(mut self, other: Self) -> Self {
        self.maps.extend(other.maps);
        self.usage.absorb(other.usage);
        self.warps.merge(other.warps);
        for (secondary, primaries) in other.pairings {
            self.pairings.entry(secondary).or_default().extend(primaries);
        }
        self
    }
}

/// Scan every map. The returned map list is in map set order.
pub(crate) fn scan_maps<'a>(
    set: &'a MapSet,
    store: &TilesetStore,
    options: &ConvertOptions,
    progress: BatchProgressCallback<'_>,
) -> ScanAccumulator<'a> {
    let total = set.maps.len();
    let processed = AtomicUsize::new(0);

    let mut acc = set
        .maps
        .par_iter()
        .enumerate()
        .fold(ScanAccumulator::default, |mut acc, (index, entry)| {
            let current = processed.fetch_add(1, Ordering::SeqCst) + 1;
            progress(&BatchProgress::with_item(BatchPhase::Scanning, current, total, entry.id()));

            // Warp slots are recorded even if the layout fails to decode.
            acc.warps.record(entry.id(), &entry.document.warp_events);

            let mut local = LocalUsage::new();
            let result = scan_map(set, entry, store, options, &mut local);
            match &result {
                Ok(scanned) => {
                    acc.usage.absorb(local);
                    if let Some(secondary) = &scanned.secondary {
                        acc.pairings
                            .entry(secondary.name.clone())
                            .or_default()
                            .insert(scanned.primary.name.clone());
                    }
                }
                Err(e) => tracing::warn!("Map {} failed to scan: {}", entry.id(), e),
            }
            acc.maps.push((index, result));
            acc
        })
        .reduce(ScanAccumulator::default, ScanAccumulator::merge);

    acc.maps.sort_by_key(|(index, _)| *index);
    acc
}

fn fetch(store: &TilesetStore, label: &str) -> Result<Arc<Tileset>> {
    let key = tileset_key(label);
    match store.get(&key) {
        Some(Ok(tileset)) => Ok(Arc::clone(tileset)),
        Some(Err(cause)) => Err(Error::TilesetFailed {
            tileset: key,
            cause: cause.to_string(),
        }),
        None => Err(Error::TilesetNotFound {
            name: label.to_string(),
        }),
    }
}

fn scan_map<'a>(
    set: &'a MapSet,
    entry: &'a MapEntry,
    store: &TilesetStore,
    options: &ConvertOptions,
    usage: &mut LocalUsage,
) -> Result<ScannedMap<'a>> {
    let layout = set.layout_for(entry)?;
    let primary = fetch(store, &layout.primary_tileset)?;
    let secondary = layout.secondary().map(|label| fetch(store, label)).transpose()?;

    let grid = read_layout(
        set.resolve(&layout.blockdata_filepath),
        layout.width,
        layout.height,
        "map.bin",
    )?;
    let (border_width, border_height) = layout.border_size();
    let border = read_layout(
        set.resolve(&layout.border_filepath),
        border_width,
        border_height,
        "border.bin",
    )?;

    let source = MetatileSource {
        primary: &primary,
        secondary: secondary.as_deref(),
    };
    let mut metatiles = HashMap::new();
    for cell in grid.cells.iter().chain(&border.cells) {
        if metatiles.contains_key(&cell.metatile_id) {
            continue;
        }
        let resolved = source.resolve(cell.metatile_id)?;
        let owner = source
            .tileset(resolved.owner)
            .map_or(primary.name.as_str(), |t| t.name.as_str());
        for (_, _, _, tile) in decompose(&resolved.metatile).placements() {
            if tile.is_blank() && !options.keep_blank_tiles {
                continue;
            }
            usage.register(owner, tile);
        }
        metatiles.insert(cell.metatile_id, resolved);
    }

    tracing::debug!(
        "Scanned {} ({}x{}, {} distinct metatiles)",
        entry.id(),
        layout.width,
        layout.height,
        metatiles.len()
    );

    Ok(ScannedMap {
        entry,
        layout,
        primary,
        secondary,
        grid,
        border,
        metatiles,
    })
}
