//! CLI commands for inspecting raw project files

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;

use crate::formats::common::NUM_METATILES_IN_PRIMARY;
use crate::formats::{AttributeFormat, read_layout};
use crate::tileset::{Tileset, TilesetCategory, tileset_key};

/// Print a decoded layout grid summary.
pub fn map(path: &Path, width: u32, height: u32) -> anyhow::Result<()> {
    let grid = read_layout(path, width, height, "layout")
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let mut metatiles = BTreeMap::new();
    let mut collision = [0usize; 4];
    let mut elevation = BTreeMap::new();
    for cell in &grid.cells {
        *metatiles.entry(cell.metatile_id).or_insert(0usize) += 1;
        collision[cell.collision as usize & 3] += 1;
        *elevation.entry(cell.elevation).or_insert(0usize) += 1;
    }
    let secondary = metatiles
        .keys()
        .filter(|&&id| id >= NUM_METATILES_IN_PRIMARY)
        .count();

    println!("Layout: {}", path.display());
    println!("Size: {width}x{height} ({} cells)", grid.cells.len());
    println!(
        "Distinct metatiles: {} ({} primary, {} secondary)",
        metatiles.len(),
        metatiles.len() - secondary,
        secondary
    );
    println!("Collision: {collision:?}");
    println!("Elevations:");
    for (level, count) in &elevation {
        println!("  {level:>2}: {count}");
    }

    let mut common: Vec<_> = metatiles.iter().collect();
    common.sort_by_key(|(_, count)| std::cmp::Reverse(**count));
    println!("Most used metatiles:");
    for (id, count) in common.iter().take(10) {
        println!("  {id:#05x}: {count}");
    }
    Ok(())
}

/// Print a tileset directory summary.
pub fn tileset(dir: &Path, firered: bool) -> anyhow::Result<()> {
    let name = dir
        .file_name()
        .map(|n| tileset_key(&n.to_string_lossy()))
        .unwrap_or_default();
    let category = if dir.parent().and_then(Path::file_name).is_some_and(|p| p == "secondary") {
        TilesetCategory::Secondary
    } else {
        TilesetCategory::Primary
    };
    let format = if firered {
        AttributeFormat::FireRed
    } else {
        AttributeFormat::Emerald
    };

    let tileset = Tileset::load(&name, category, dir, format)
        .with_context(|| format!("Failed to load tileset {}", dir.display()))?;

    let mut layer_types = BTreeMap::new();
    let mut behaviors = BTreeMap::new();
    for attrs in &tileset.attributes {
        *layer_types.entry(attrs.layer_type).or_insert(0usize) += 1;
        *behaviors.entry(attrs.behavior).or_insert(0usize) += 1;
    }
    let loaded: Vec<u8> = (0..16).filter(|&slot| tileset.palettes.get(slot).is_some()).collect();

    println!("Tileset: {} ({})", tileset.name, tileset.category.as_str());
    println!("Metatiles: {}", tileset.metatiles.len());
    println!("Tiles: {}", tileset.graphics.len());
    println!("Palettes: {loaded:?}");
    println!("Layer types:");
    for (value, count) in &layer_types {
        let label = match value {
            0 => "normal",
            1 => "covered",
            2 => "split",
            _ => "invalid",
        };
        println!("  {value} {label:8} {count}");
    }
    println!("Distinct behaviors: {}", behaviors.len());
    if tileset.anim_dir().is_dir() {
        println!("Animation folder: {}", tileset.anim_dir().display());
    }
    Ok(())
}
