//! Batch result types

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::atlas::TilesetAtlas;
use crate::error::{Error, ErrorKind};
use crate::events::MapEvents;
use crate::metatile::Layer;
use crate::project::{ConnectionDef, DiscoveryError};
use crate::tileset::TilesetCategory;
use crate::warning::Warning;
use crate::warp::{ResolvedWarp, WorldLayout};

/// Phase in which a map failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MapPhase {
    Scan,
    Build,
    Emit,
}

/// Header properties copied from the map document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MapProperties {
    pub name: String,
    pub music: Option<String>,
    pub weather: Option<String>,
    pub map_type: Option<String>,
    pub region_map_section: Option<String>,
    pub show_map_name: Option<bool>,
    pub allow_cycling: Option<bool>,
    pub allow_running: Option<bool>,
    pub allow_escaping: Option<bool>,
    pub battle_scene: Option<String>,
    pub requires_flash: Option<bool>,
}

/// A tileset used by a map, with the first global id of its tiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TilesetRef {
    pub name: String,
    pub category: TilesetCategory,
    pub first_gid: u32,
    pub tile_count: u32,
}

/// One rendering layer of global tile ids, 0 meaning empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TileLayer {
    pub layer: Layer,
    /// Width in 8x8 tiles.
    pub width: u32,
    /// Height in 8x8 tiles.
    pub height: u32,
    pub data: Vec<u32>,
}

impl TileLayer {
    #[must_use]
    pub fn new(layer: Layer, width: u32, height: u32) -> Self {
        Self {
            layer,
            width,
            height,
            data: vec![0; (width * height) as usize],
        }
    }

    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Option<u32> {
        (x < self.width && y < self.height).then(|| self.data[(y * self.width + x) as usize])
    }
}

/// Per-metatile attribute grids, row-major.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetatileGrids {
    pub width: u32,
    pub height: u32,
    pub collision: Vec<u8>,
    pub elevation: Vec<u8>,
    pub behavior: Vec<u16>,
    pub terrain: Vec<u8>,
}

/// A border block rendered into the three layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BorderLayers {
    /// Width in metatiles.
    pub width: u32,
    /// Height in metatiles.
    pub height: u32,
    pub layers: Vec<TileLayer>,
}

/// A successfully converted map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConvertedMap {
    pub map_id: String,
    pub layout_id: String,
    /// Width in metatiles.
    pub width: u32,
    /// Height in metatiles.
    pub height: u32,
    pub properties: MapProperties,
    /// Primary first.
    pub tilesets: Vec<TilesetRef>,
    /// Ground, Objects, Overhead.
    pub layers: Vec<TileLayer>,
    pub grids: MetatileGrids,
    pub border: BorderLayers,
    pub warps: Vec<ResolvedWarp>,
    pub events: MapEvents,
    pub connections: Vec<ConnectionDef>,
}

impl ConvertedMap {
    /// The layer grid for `layer`.
    #[must_use]
    pub fn layer(&self, layer: Layer) -> Option<&TileLayer> {
        self.layers.iter().find(|l| l.layer == layer)
    }
}

/// Outcome of one map.
#[derive(Debug, Clone)]
pub enum MapOutcome {
    Converted(Box<ConvertedMap>),
    Failed { phase: MapPhase, error: Arc<Error> },
}

/// Result for one map: its outcome and any warnings raised for it.
#[derive(Debug, Clone)]
pub struct MapConversionResult {
    pub map_id: String,
    pub outcome: MapOutcome,
    pub warnings: Vec<Warning>,
}

impl MapConversionResult {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, MapOutcome::Converted(_))
    }

    #[must_use]
    pub fn converted(&self) -> Option<&ConvertedMap> {
        match &self.outcome {
            MapOutcome::Converted(map) => Some(map.as_ref()),
            MapOutcome::Failed { .. } => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&Error> {
        match &self.outcome {
            MapOutcome::Converted(_) => None,
            MapOutcome::Failed { error, .. } => Some(error.as_ref()),
        }
    }
}

/// Result for one tileset.
#[derive(Debug, Clone)]
pub struct TilesetBuildResult {
    pub name: String,
    pub outcome: Result<TilesetAtlas, Arc<Error>>,
}

impl TilesetBuildResult {
    #[must_use]
    pub fn atlas(&self) -> Option<&TilesetAtlas> {
        self.outcome.as_ref().ok()
    }
}

/// Everything a batch produced.
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    /// One entry per map, in map set order.
    pub maps: Vec<MapConversionResult>,
    pub tilesets: BTreeMap<String, TilesetBuildResult>,
    pub world: Option<WorldLayout>,
    /// Warnings not tied to a single map or tileset.
    pub warnings: Vec<Warning>,
    /// Map documents that could not be read at all.
    pub skipped: Vec<DiscoveryError>,
}

impl BatchResult {
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.maps.iter().filter(|m| m.is_success()).count()
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.maps.len() - self.success_count()
    }

    #[must_use]
    pub fn map(&self, map_id: &str) -> Option<&MapConversionResult> {
        self.maps.iter().find(|m| m.map_id == map_id)
    }

    #[must_use]
    pub fn atlas(&self, tileset: &str) -> Option<&TilesetAtlas> {
        self.tilesets.get(tileset).and_then(TilesetBuildResult::atlas)
    }

    /// Every warning: batch-level, per tileset and per map.
    pub fn all_warnings(&self) -> impl Iterator<Item = &Warning> {
        self.warnings
            .iter()
            .chain(self.tilesets.values().filter_map(|t| t.atlas()).flat_map(|a| a.warnings.iter()))
            .chain(self.maps.iter().flat_map(|m| m.warnings.iter()))
    }

    /// Counts and error detail for reporting.
    #[must_use]
    pub fn summary(&self) -> BatchSummary {
        let mut errors = Vec::new();
        for map in &self.maps {
            if let MapOutcome::Failed { phase, error } = &map.outcome {
                errors.push(ErrorEntry {
                    scope: "map",
                    id: map.map_id.clone(),
                    phase: Some(*phase),
                    kind: error.kind(),
                    message: error.to_string(),
                });
            }
        }
        for (name, tileset) in &self.tilesets {
            if let Err(error) = &tileset.outcome {
                errors.push(ErrorEntry {
                    scope: "tileset",
                    id: name.clone(),
                    phase: None,
                    kind: error.kind(),
                    message: error.to_string(),
                });
            }
        }
        for skipped in &self.skipped {
            errors.push(ErrorEntry {
                scope: "document",
                id: skipped.path.display().to_string(),
                phase: None,
                kind: ErrorKind::Config,
                message: skipped.message.clone(),
            });
        }

        BatchSummary {
            maps_total: self.maps.len(),
            maps_succeeded: self.success_count(),
            maps_failed: self.error_count(),
            tilesets: self
                .tilesets
                .values()
                .map(|t| TilesetSummary {
                    name: t.name.clone(),
                    built: t.outcome.is_ok(),
                    unique_tiles: t.atlas().map_or(0, TilesetAtlas::base_tile_count),
                    total_tiles: t.atlas().map_or(0, TilesetAtlas::total_tile_count),
                    animations: t.atlas().map_or(0, |a| a.animations.len()),
                })
                .collect(),
            warnings: self.all_warnings().count(),
            errors,
        }
    }
}

/// Serializable batch overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub maps_total: usize,
    pub maps_succeeded: usize,
    pub maps_failed: usize,
    pub tilesets: Vec<TilesetSummary>,
    pub warnings: usize,
    pub errors: Vec<ErrorEntry>,
}

/// Per-tileset counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TilesetSummary {
    pub name: String,
    pub built: bool,
    /// Distinct tile variants (identifier table size).
    pub unique_tiles: u32,
    /// Atlas tiles including animation frames.
    pub total_tiles: u32,
    pub animations: usize,
}

/// One failure in the summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEntry {
    pub scope: &'static str,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<MapPhase>,
    pub kind: ErrorKind,
    pub message: String,
}
