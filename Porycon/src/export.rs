//! Writing batch results to disk
//!
//! Layout of the output directory:
//!
//! ```text
//! out/
//!   tilesets/<name>/atlas.png
//!   tilesets/<name>/tileset.json
//!   maps/<map id>.json
//!   world.json
//!   summary.json
//! ```

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::animation::AnimationDefinition;
use crate::atlas::{IdentifierTable, TilesetAtlas};
use crate::batch::{BatchResult, ConvertedMap};
use crate::error::Result;
use crate::formats::common::TILE_SIZE;
use crate::tileset::TilesetCategory;
use crate::warning::Warning;

#[derive(Serialize)]
struct TilesetDocument<'a> {
    name: &'a str,
    category: TilesetCategory,
    image: Option<&'static str>,
    tile_size: u32,
    columns: u32,
    unique_tiles: u32,
    total_tiles: u32,
    identifiers: &'a IdentifierTable,
    animations: &'a [AnimationDefinition],
    warnings: &'a [Warning],
}

#[derive(Serialize)]
struct MapDocumentOut<'a> {
    #[serde(flatten)]
    map: &'a ConvertedMap,
    warnings: &'a [Warning],
}

/// Write every built atlas, converted map, the world layout and a summary.
///
/// Failed maps and tilesets produce no files of their own; they are listed
/// in `summary.json`.
///
/// # Errors
/// Returns an error if a directory cannot be created or a file cannot be
/// written.
pub fn write_batch<P: AsRef<Path>>(result: &BatchResult, out_dir: P) -> Result<()> {
    let out_dir = out_dir.as_ref();
    let tilesets_dir = out_dir.join("tilesets");
    let maps_dir = out_dir.join("maps");
    fs::create_dir_all(&tilesets_dir)?;
    fs::create_dir_all(&maps_dir)?;

    for atlas in result.tilesets.values().filter_map(|t| t.atlas()) {
        write_tileset(atlas, &tilesets_dir.join(&atlas.tileset))?;
    }

    for map in &result.maps {
        if let Some(converted) = map.converted() {
            let doc = MapDocumentOut {
                map: converted,
                warnings: &map.warnings,
            };
            write_json(&maps_dir.join(format!("{}.json", map.map_id)), &doc)?;
        }
    }

    if let Some(world) = &result.world {
        write_json(&out_dir.join("world.json"), world)?;
    }
    write_json(&out_dir.join("summary.json"), &result.summary())?;

    tracing::info!(
        "Wrote {} tilesets and {} maps to {}",
        result.tilesets.values().filter(|t| t.atlas().is_some()).count(),
        result.success_count(),
        out_dir.display()
    );
    Ok(())
}

fn write_tileset(atlas: &TilesetAtlas, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;

    // A zero-sized PNG cannot be encoded.
    let image = if atlas.total_tile_count() > 0 {
        atlas.image.to_rgba_image().save(dir.join("atlas.png"))?;
        Some("atlas.png")
    } else {
        None
    };

    let doc = TilesetDocument {
        name: &atlas.tileset,
        category: atlas.category,
        image,
        tile_size: TILE_SIZE,
        columns: atlas.image.columns(),
        unique_tiles: atlas.base_tile_count(),
        total_tiles: atlas.total_tile_count(),
        identifiers: &atlas.identifiers,
        animations: &atlas.animations,
        warnings: &atlas.warnings,
    };
    write_json(&dir.join("tileset.json"), &doc)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{MapConversionResult, MapOutcome, MapPhase};
    use crate::error::Error;
    use std::sync::Arc;

    #[test]
    fn test_write_batch_with_failure_only() {
        let dir = tempfile::tempdir().unwrap();
        let result = BatchResult {
            maps: vec![MapConversionResult {
                map_id: "MAP_BROKEN".into(),
                outcome: MapOutcome::Failed {
                    phase: MapPhase::Scan,
                    error: Arc::new(Error::LayoutNotFound("LAYOUT_X".into())),
                },
                warnings: Vec::new(),
            }],
            ..BatchResult::default()
        };
        write_batch(&result, dir.path()).unwrap();

        assert!(!dir.path().join("maps").join("MAP_BROKEN.json").exists());
        assert!(!dir.path().join("world.json").exists());

        let summary: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("summary.json")).unwrap()).unwrap();
        assert_eq!(summary["maps_failed"], 1);
        assert_eq!(summary["errors"][0]["id"], "MAP_BROKEN");
        assert_eq!(summary["errors"][0]["phase"], "scan");
    }
}
