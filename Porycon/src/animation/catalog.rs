//! Animation catalog configuration
//!
//! The catalog lists, per tileset, which tile ranges animate and where their
//! frames live. It is plain JSON so projects can extend or replace it:
//!
//! ```json
//! { "tilesets": { "general": [
//!     { "name": "flower", "baseTileId": 508, "tileCount": 4,
//!       "folder": "flower", "durationMs": 133, "frameSequence": [0, 1, 0, 2] }
//! ] } }
//! ```
//!
//! `baseTileId` is an absolute VRAM tile id, so secondary tilesets use ids
//! from 512 up.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const BUILTIN_CATALOG: &str = include_str!("default_catalog.json");

/// Highest VRAM tile id plus one.
const VRAM_TILE_LIMIT: u32 = 1024;

fn default_duration_ms() -> u32 {
    133
}

/// One animated tile range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationPattern {
    pub name: String,
    pub base_tile_id: u16,
    pub tile_count: u16,
    /// Folder under the tileset's `anim/` directory.
    pub folder: String,
    #[serde(default = "default_duration_ms")]
    pub duration_ms: u32,
    /// Frame indices to play; defaults to every frame in order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_sequence: Option<Vec<usize>>,
}

impl AnimationPattern {
    /// Whether `tile_id` lies in this pattern's range.
    #[must_use]
    pub fn contains(&self, tile_id: u16) -> bool {
        tile_id >= self.base_tile_id && u32::from(tile_id) < self.end()
    }

    /// One past the last tile id of the range.
    #[must_use]
    pub fn end(&self) -> u32 {
        u32::from(self.base_tile_id) + u32::from(self.tile_count)
    }
}

/// Patterns keyed by normalized tileset name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationCatalog {
    #[serde(default)]
    pub tilesets: IndexMap<String, Vec<AnimationPattern>>,
}

impl AnimationCatalog {
    /// The catalog bundled with the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_json_str(BUILTIN_CATALOG)
    }

    /// Parse and validate catalog JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let catalog: Self = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load a catalog file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&text)?;
        tracing::debug!(
            "Loaded animation catalog {} ({} tilesets)",
            path.display(),
            catalog.tilesets.len()
        );
        Ok(catalog)
    }

    /// Patterns for a tileset; empty if none are cataloged.
    #[must_use]
    pub fn patterns_for(&self, tileset: &str) -> &[AnimationPattern] {
        self.tilesets.get(tileset).map_or(&[], Vec::as_slice)
    }

    fn validate(&self) -> Result<()> {
        for (tileset, patterns) in &self.tilesets {
            for pattern in patterns {
                if pattern.tile_count == 0 {
                    return Err(Error::InvalidConfig(format!(
                        "animation {tileset}/{}: tileCount must be positive",
                        pattern.name
                    )));
                }
                if pattern.end() > VRAM_TILE_LIMIT {
                    return Err(Error::InvalidConfig(format!(
                        "animation {tileset}/{}: tiles {}..{} exceed VRAM",
                        pattern.name,
                        pattern.base_tile_id,
                        pattern.end()
                    )));
                }
                if pattern.duration_ms == 0 {
                    return Err(Error::InvalidConfig(format!(
                        "animation {tileset}/{}: durationMs must be positive",
                        pattern.name
                    )));
                }
            }
        }
        Ok(())
    }
}
