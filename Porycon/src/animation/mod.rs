//! Tile animations
//!
//! For every cataloged pattern whose range covers tiles some map uses, the
//! frame images under `anim/<folder>/` are cut into 8x8 tiles, re-rendered with
//! each variant's palette and flips, and appended to the atlas after the
//! regular tiles. A secondary tileset also animates tiles it borrows from its
//! paired primary, using the primary's patterns and frame folders.

pub mod catalog;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

pub use catalog::{AnimationCatalog, AnimationPattern};

use crate::atlas::{TileSource, TilesetAtlas, render_tile};
use crate::error::Result;
use crate::formats::common::NUM_TILES_IN_PRIMARY_VRAM;
use crate::formats::tiles::BLANK_TILE;
use crate::formats::{TilePixels, TileRef, parse_indexed_png_bytes};
use crate::tileset::Tileset;
use crate::warning::Warning;

/// One frame of an animated tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnimationFrame {
    /// 1-based atlas index of the frame tile.
    pub tile: u32,
    pub duration_ms: u32,
}

/// A used tile variant and the frames it cycles through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnimatedTile {
    /// Identifier of the base variant.
    pub identifier: u32,
    pub tile: TileRef,
    pub frames: Vec<AnimationFrame>,
}

/// A cataloged pattern bound to a tileset's atlas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnimationDefinition {
    pub name: String,
    /// Tileset whose `anim/` folder supplied the frames.
    pub source_tileset: String,
    pub base_tile_id: u16,
    pub tile_count: u16,
    pub duration_ms: u32,
    pub frame_sequence: Vec<usize>,
    pub tiles: Vec<AnimatedTile>,
}

/// Frame images of one pattern, each cut to `tile_count` tiles.
pub type FrameSheet = Vec<Vec<TilePixels>>;

/// Read `N.png` frames from `dir` in numeric order.
///
/// Returns `Ok(None)` if the folder is missing or holds no numbered frames.
/// Frames with fewer tiles than `tile_count` are padded with blank tiles.
pub fn load_frames(dir: &Path, tile_count: u16) -> Result<Option<FrameSheet>> {
    if !dir.is_dir() {
        return Ok(None);
    }

    let mut numbered: Vec<(u32, PathBuf)> = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        let path = entry.path();
        let is_png = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
        let index = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.parse::<u32>().ok());
        if let (true, Some(index)) = (is_png, index) {
            numbered.push((index, path.to_path_buf()));
        }
    }
    if numbered.is_empty() {
        return Ok(None);
    }
    numbered.sort_by_key(|(index, _)| *index);

    let wanted = tile_count as usize;
    let mut sheet = Vec::with_capacity(numbered.len());
    for (_, path) in numbered {
        let image = parse_indexed_png_bytes(&std::fs::read(&path)?)?;
        let mut tiles = image.to_tiles();
        if tiles.len() < wanted {
            tracing::debug!(
                "Frame {} has {} tiles, padding to {}",
                path.display(),
                tiles.len(),
                wanted
            );
        }
        tiles.resize(wanted, BLANK_TILE);
        sheet.push(tiles);
    }
    Ok(Some(sheet))
}

/// The playback order for a pattern with `frame_count` frames.
///
/// Out-of-range indices are dropped; an empty result falls back to playing
/// every frame in order.
#[must_use]
pub fn resolve_sequence(pattern: &AnimationPattern, frame_count: usize) -> Vec<usize> {
    let sequence: Vec<usize> = pattern
        .frame_sequence
        .iter()
        .flatten()
        .copied()
        .filter(|&i| i < frame_count)
        .collect();
    if sequence.is_empty() {
        (0..frame_count).collect()
    } else {
        sequence
    }
}

/// Patterns that may apply to `source`'s atlas, paired with the tileset owning
/// their frames.
fn applicable_patterns<'a>(
    catalog: &'a AnimationCatalog,
    source: &TileSource<'a>,
) -> Vec<(&'a Tileset, &'a AnimationPattern)> {
    let tileset = source.tileset;
    let own_range = if tileset.is_primary() {
        0..u32::from(NUM_TILES_IN_PRIMARY_VRAM)
    } else {
        u32::from(NUM_TILES_IN_PRIMARY_VRAM)..u32::from(NUM_TILES_IN_PRIMARY_VRAM) * 2
    };

    let mut out = Vec::new();
    for pattern in catalog.patterns_for(&tileset.name) {
        if own_range.contains(&u32::from(pattern.base_tile_id)) && pattern.end() <= own_range.end {
            out.push((tileset, pattern));
        } else {
            tracing::debug!(
                "Animation {}/{} lies outside the tileset's tile range, ignored",
                tileset.name,
                pattern.name
            );
        }
    }
    if let Some(primary) = source.paired_primary.filter(|_| !tileset.is_primary()) {
        for pattern in catalog.patterns_for(&primary.name) {
            if pattern.end() <= u32::from(NUM_TILES_IN_PRIMARY_VRAM) {
                out.push((primary, pattern));
            }
        }
    }
    out
}

/// Bind cataloged animations to a built atlas, appending frame tiles.
///
/// Frame tiles are deduplicated per (pattern, frame, offset, palette, flips).
/// A missing frame folder or unreadable frame skips that pattern with a
/// warning.
pub fn extract_animations(
    catalog: &AnimationCatalog,
    source: &TileSource<'_>,
    atlas: &mut TilesetAtlas,
) -> Result<()> {
    for (pattern_index, (owner, pattern)) in applicable_patterns(catalog, source).into_iter().enumerate() {
        let users: Vec<(u32, TileRef)> = atlas
            .identifiers
            .iter()
            .filter(|(_, tile)| pattern.contains(tile.tile_id))
            .collect();
        if users.is_empty() {
            continue;
        }

        let frames_dir = owner.anim_dir().join(&pattern.folder);
        let sheet = match load_frames(&frames_dir, pattern.tile_count) {
            Ok(Some(sheet)) => sheet,
            Ok(None) => {
                atlas.warnings.push(
                    Warning::AnimationPatternMissing {
                        tileset: atlas.tileset.clone(),
                        pattern: pattern.name.clone(),
                        folder: frames_dir.display().to_string(),
                    }
                    .logged(),
                );
                continue;
            }
            Err(e) => {
                atlas.warnings.push(
                    Warning::AnimationFrameUnreadable {
                        tileset: atlas.tileset.clone(),
                        pattern: pattern.name.clone(),
                        message: e.to_string(),
                    }
                    .logged(),
                );
                continue;
            }
        };

        let sequence = resolve_sequence(pattern, sheet.len());
        let mut rendered: HashMap<(usize, usize, TileRef), u32> = HashMap::new();
        let mut tiles = Vec::with_capacity(users.len());

        for (identifier, tile) in users {
            let offset = (tile.tile_id - pattern.base_tile_id) as usize;
            let palette = source.palette(tile.palette)?;
            let mut frames = Vec::with_capacity(sequence.len());
            for &frame in &sequence {
                let key = (frame, offset, tile);
                let index = match rendered.get(&key) {
                    Some(&index) => index,
                    None => {
                        let pixels = render_tile(&sheet[frame][offset], palette, tile.flip_h, tile.flip_v);
                        let index = atlas.image.push(pixels);
                        rendered.insert(key, index);
                        index
                    }
                };
                frames.push(AnimationFrame {
                    tile: index,
                    duration_ms: pattern.duration_ms,
                });
            }
            tiles.push(AnimatedTile {
                identifier,
                tile,
                frames,
            });
        }

        tracing::debug!(
            "Animation {}/{} (#{}): {} tiles, {} frames",
            atlas.tileset,
            pattern.name,
            pattern_index,
            tiles.len(),
            sequence.len()
        );

        atlas.animations.push(AnimationDefinition {
            name: pattern.name.clone(),
            source_tileset: owner.name.clone(),
            base_tile_id: pattern.base_tile_id,
            tile_count: pattern.tile_count,
            duration_ms: pattern.duration_ms,
            frame_sequence: sequence,
            tiles,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::{LocalUsage, UsageArena, build_atlas};
    use crate::formats::{Palette, PaletteSet, Rgba, TileGraphics};
    use crate::tileset::TilesetCategory;

    fn write_frame(path: &Path, value: u8, tiles: u32) {
        let file = std::fs::File::create(path).unwrap();
        let mut encoder = png::Encoder::new(file, 8 * tiles, 8);
        encoder.set_color(png::ColorType::Indexed);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_palette(vec![0u8; 16 * 3]);
        let mut writer = encoder.write_header().unwrap();
        writer
            .write_image_data(&vec![value; (64 * tiles) as usize])
            .unwrap();
    }

    fn tileset(dir: &Path) -> Tileset {
        let mut colors = [Rgba::opaque(0, 0, 0); 16];
        for (i, c) in colors.iter_mut().enumerate() {
            *c = Rgba::opaque(i as u8 * 10, 0, 0);
        }
        let mut palettes = PaletteSet::default();
        palettes.slots[0] = Some(Palette { colors });
        Tileset {
            name: "general".into(),
            category: TilesetCategory::Primary,
            dir: dir.to_path_buf(),
            metatiles: Vec::new(),
            attributes: Vec::new(),
            palettes,
            graphics: TileGraphics {
                tiles: vec![[1; 64]; 512],
            },
        }
    }

    fn atlas_for(tileset: &Tileset, tiles: &[TileRef]) -> TilesetAtlas {
        let mut local = LocalUsage::new();
        for t in tiles {
            local.register(&tileset.name, *t);
        }
        let mut arena = UsageArena::new();
        arena.merge(local);
        let usage = arena.seal().remove(&tileset.name).unwrap();
        build_atlas(usage, &TileSource::new(tileset, None), 16).unwrap()
    }

    fn catalog(json: &str) -> AnimationCatalog {
        AnimationCatalog::from_json_str(json).unwrap()
    }

    #[test]
    fn test_resolve_sequence_filters_invalid() {
        let mut pattern = AnimationPattern {
            name: "p".into(),
            base_tile_id: 0,
            tile_count: 1,
            folder: "p".into(),
            duration_ms: 100,
            frame_sequence: Some(vec![0, 5, 1]),
        };
        assert_eq!(resolve_sequence(&pattern, 2), vec![0, 1]);
        pattern.frame_sequence = Some(vec![9]);
        assert_eq!(resolve_sequence(&pattern, 3), vec![0, 1, 2]);
        pattern.frame_sequence = None;
        assert_eq!(resolve_sequence(&pattern, 2), vec![0, 1]);
    }

    #[test]
    fn test_frames_appended_after_base_tiles() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("anim/flower");
        std::fs::create_dir_all(&folder).unwrap();
        write_frame(&folder.join("0.png"), 2, 4);
        write_frame(&folder.join("1.png"), 3, 4);
        write_frame(&folder.join("10.png"), 4, 4);

        let ts = tileset(dir.path());
        let mut atlas = atlas_for(
            &ts,
            &[
                TileRef::new(5, 0, false, false),
                TileRef::new(509, 0, false, false),
                TileRef::new(509, 0, true, false),
            ],
        );
        let cat = catalog(
            r#"{"tilesets":{"general":[{"name":"flower","baseTileId":508,"tileCount":4,"folder":"flower","frameSequence":[0,2,0,7]}]}}"#,
        );
        extract_animations(&cat, &TileSource::new(&ts, None), &mut atlas).unwrap();

        assert!(atlas.warnings.is_empty());
        assert_eq!(atlas.animations.len(), 1);
        let anim = &atlas.animations[0];
        assert_eq!(anim.frame_sequence, vec![0, 2, 0]);
        assert_eq!(anim.tiles.len(), 2);

        // 3 base tiles, then 2 distinct frames for each of the 2 variants.
        assert_eq!(atlas.base_tile_count(), 3);
        assert_eq!(atlas.total_tile_count(), 7);
        let frames = &anim.tiles[0].frames;
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].tile, frames[2].tile);
        assert!(frames[0].tile > 3);
        assert_eq!(frames[0].duration_ms, 133);
        // "10.png" sorts after "1.png" numerically and is frame 2.
        assert_eq!(atlas.image.tile(frames[1].tile).unwrap()[0], Rgba::opaque(40, 0, 0));
    }

    #[test]
    fn test_missing_folder_warns_and_skips() {
        let dir = tempfile::tempdir().unwrap();
        let ts = tileset(dir.path());
        let mut atlas = atlas_for(&ts, &[TileRef::new(509, 0, false, false)]);
        let cat = catalog(
            r#"{"tilesets":{"general":[{"name":"flower","baseTileId":508,"tileCount":4,"folder":"flower"}]}}"#,
        );
        extract_animations(&cat, &TileSource::new(&ts, None), &mut atlas).unwrap();
        assert!(atlas.animations.is_empty());
        assert_eq!(atlas.total_tile_count(), 1);
        assert!(matches!(
            &atlas.warnings[0],
            Warning::AnimationPatternMissing { pattern, .. } if pattern == "flower"
        ));
    }

    #[test]
    fn test_unused_pattern_is_ignored_silently() {
        let dir = tempfile::tempdir().unwrap();
        let ts = tileset(dir.path());
        let mut atlas = atlas_for(&ts, &[TileRef::new(1, 0, false, false)]);
        let cat = catalog(
            r#"{"tilesets":{"general":[{"name":"flower","baseTileId":508,"tileCount":4,"folder":"flower"}]}}"#,
        );
        extract_animations(&cat, &TileSource::new(&ts, None), &mut atlas).unwrap();
        assert!(atlas.animations.is_empty());
        assert!(atlas.warnings.is_empty());
    }
}
