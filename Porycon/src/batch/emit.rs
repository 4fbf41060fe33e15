//! Per-map output
//!
//! Runs after every atlas exists. Identifier tables and the warp lookup are
//! read-only here, so maps emit in parallel without synchronization.

use std::collections::HashMap;

use super::result::{
    BorderLayers, ConvertedMap, MapProperties, MetatileGrids, TileLayer, TilesetRef,
};
use super::scan::ScannedMap;
use crate::atlas::TilesetAtlas;
use crate::error::{Error, Result};
use crate::events::convert_events;
use crate::formats::{LayoutGrid, TileRef};
use crate::metatile::{Layer, ResolvedMetatile, decompose};
use crate::project::MapDocument;
use crate::tileset::TilesetCategory;
use crate::warning::Warning;
use crate::warp::{WarpLookup, resolve_warps};

/// Translates tile variants into global ids for one map.
///
/// The primary atlas starts at global id 1; the secondary follows the
/// primary's last tile, animation frames included.
#[derive(Debug, Clone, Copy)]
pub(crate) struct GidResolver<'a> {
    primary: &'a TilesetAtlas,
    secondary: Option<(&'a TilesetAtlas, u32)>,
    keep_blank: bool,
}

impl<'a> GidResolver<'a> {
    pub(crate) fn new(
        primary: &'a TilesetAtlas,
        secondary: Option<&'a TilesetAtlas>,
        keep_blank: bool,
    ) -> Self {
        Self {
            primary,
            secondary: secondary.map(|atlas| (atlas, 1 + primary.total_tile_count())),
            keep_blank,
        }
    }

    /// Tileset references, primary first.
    pub(crate) fn tileset_refs(&self) -> Vec<TilesetRef> {
        let mut refs = vec![TilesetRef {
            name: self.primary.tileset.clone(),
            category: self.primary.category,
            first_gid: 1,
            tile_count: self.primary.total_tile_count(),
        }];
        if let Some((atlas, first_gid)) = self.secondary {
            refs.push(TilesetRef {
                name: atlas.tileset.clone(),
                category: atlas.category,
                first_gid,
                tile_count: atlas.total_tile_count(),
            });
        }
        refs
    }

    /// Global id of `tile` drawn by a metatile owned by `owner`. Blank tiles
    /// are 0 unless blank tiles were registered.
    pub(crate) fn gid(&self, owner: TilesetCategory, tile: TileRef) -> Result<u32> {
        if tile.is_blank() && !self.keep_blank {
            return Ok(0);
        }
        let (atlas, first_gid) = match owner {
            TilesetCategory::Primary => (self.primary, 1),
            TilesetCategory::Secondary => match self.secondary {
                Some(pair) => pair,
                None => return Err(missing(self.primary, tile)),
            },
        };
        atlas
            .identifiers
            .get(&tile)
            .map(|id| first_gid - 1 + id)
            .ok_or_else(|| missing(atlas, tile))
    }
}

fn missing(atlas: &TilesetAtlas, tile: TileRef) -> Error {
    Error::IdentifierMissing {
        tileset: atlas.tileset.clone(),
        tile_id: tile.tile_id,
        palette: tile.palette,
    }
}

/// Produce the converted map for a scanned map.
pub(crate) fn emit_map(
    scanned: &ScannedMap<'_>,
    gids: &GidResolver<'_>,
    lookup: &WarpLookup,
) -> Result<(ConvertedMap, Vec<Warning>)> {
    let doc = &scanned.entry.document;
    let layers = render_layers(&scanned.grid, &scanned.metatiles, gids)?;
    let border = BorderLayers {
        width: scanned.border.width,
        height: scanned.border.height,
        layers: render_layers(&scanned.border, &scanned.metatiles, gids)?,
    };
    let grids = attribute_grids(&scanned.grid, &scanned.metatiles)?;

    let mut warnings = Vec::new();
    let (warps, unresolved) = resolve_warps(scanned.entry.id(), &doc.warp_events, lookup);
    warnings.extend(unresolved.into_iter().map(|w| Warning::from(w).logged()));
    let (events, event_warnings) = convert_events(doc);
    warnings.extend(event_warnings);

    let map = ConvertedMap {
        map_id: scanned.entry.id().to_string(),
        layout_id: scanned.layout.id.clone(),
        width: scanned.grid.width,
        height: scanned.grid.height,
        properties: properties(doc),
        tilesets: gids.tileset_refs(),
        layers,
        grids,
        border,
        warps,
        events,
        connections: doc.connections().to_vec(),
    };
    tracing::debug!(
        "Emitted {} ({} warps, {} objects)",
        map.map_id,
        map.warps.len(),
        map.events.objects.len()
    );
    Ok((map, warnings))
}

fn lookup_metatile<'m>(
    metatiles: &'m HashMap<u16, ResolvedMetatile>,
    metatile_id: u16,
) -> Result<&'m ResolvedMetatile> {
    // Scan resolves every cell, so a miss means the grids changed underneath.
    metatiles.get(&metatile_id).ok_or_else(|| Error::MetatileOutOfRange {
        tileset: "<unscanned>".to_string(),
        metatile_id,
        count: metatiles.len(),
    })
}

/// Expand a metatile grid into Ground/Objects/Overhead tile layers.
fn render_layers(
    grid: &LayoutGrid,
    metatiles: &HashMap<u16, ResolvedMetatile>,
    gids: &GidResolver<'_>,
) -> Result<Vec<TileLayer>> {
    let (width, height) = (grid.width * 2, grid.height * 2);
    let mut layers: Vec<TileLayer> = Layer::ALL
        .iter()
        .map(|&layer| TileLayer::new(layer, width, height))
        .collect();

    for (x, y, cell) in grid.iter() {
        let resolved = lookup_metatile(metatiles, cell.metatile_id)?;
        for (layer, dx, dy, tile) in decompose(&resolved.metatile).placements() {
            let gid = gids.gid(resolved.owner, tile)?;
            let index = ((y * 2 + dy) * width + x * 2 + dx) as usize;
            layers[layer.index()].data[index] = gid;
        }
    }
    Ok(layers)
}

fn attribute_grids(
    grid: &LayoutGrid,
    metatiles: &HashMap<u16, ResolvedMetatile>,
) -> Result<MetatileGrids> {
    let count = grid.cells.len();
    let mut grids = MetatileGrids {
        width: grid.width,
        height: grid.height,
        collision: Vec::with_capacity(count),
        elevation: Vec::with_capacity(count),
        behavior: Vec::with_capacity(count),
        terrain: Vec::with_capacity(count),
    };
    for cell in &grid.cells {
        let metatile = &lookup_metatile(metatiles, cell.metatile_id)?.metatile;
        grids.collision.push(cell.collision);
        grids.elevation.push(cell.elevation);
        grids.behavior.push(metatile.behavior);
        grids.terrain.push(metatile.terrain);
    }
    Ok(grids)
}

fn properties(doc: &MapDocument) -> MapProperties {
    MapProperties {
        name: doc.name.clone(),
        music: doc.music.clone(),
        weather: doc.weather.clone(),
        map_type: doc.map_type.clone(),
        region_map_section: doc.region_map_section.clone(),
        show_map_name: doc.show_map_name,
        allow_cycling: doc.allow_cycling,
        allow_running: doc.allow_running,
        allow_escaping: doc.allow_escaping,
        battle_scene: doc.battle_scene.clone(),
        requires_flash: doc.requires_flash,
    }
}
