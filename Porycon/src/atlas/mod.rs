//! Deduplicated tile atlases
//!
//! Each tileset gets one atlas holding exactly the tile variants some map
//! actually uses. Building happens after every map has been scanned:
//!
//! 1. Maps register variants into a [`LocalUsage`]
//! 2. Local sets merge into a [`UsageArena`], which is sealed
//! 3. [`build_atlas`] consumes a [`SealedUsage`], assigns identifiers and
//!    renders each variant into an [`AtlasImage`]

pub mod identifier;
pub mod render;
pub mod usage;

pub use identifier::IdentifierTable;
pub use render::{AtlasImage, RenderedTile, TileSource, render_tile, render_variant};
pub use usage::{LocalUsage, SealedUsage, UsageArena};

use crate::animation::AnimationDefinition;
use crate::error::Result;
use crate::formats::tiles::TILE_PIXELS;
use crate::formats::Rgba;
use crate::tileset::TilesetCategory;
use crate::warning::Warning;

/// Default atlas width in tiles.
pub const DEFAULT_ATLAS_COLUMNS: u32 = 16;

/// The built atlas for one tileset.
#[derive(Debug, Clone)]
pub struct TilesetAtlas {
    pub tileset: String,
    pub category: TilesetCategory,
    pub identifiers: IdentifierTable,
    pub image: AtlasImage,
    pub animations: Vec<AnimationDefinition>,
    pub warnings: Vec<Warning>,
}

impl TilesetAtlas {
    /// Tiles that map cells can reference (excludes animation frames).
    #[must_use]
    pub fn base_tile_count(&self) -> u32 {
        self.identifiers.len() as u32
    }

    /// All tiles in the image, animation frames included.
    #[must_use]
    pub fn total_tile_count(&self) -> u32 {
        self.image.tile_count()
    }
}

/// Build the identifier table and atlas image for a sealed usage set.
///
/// Every palette slot referenced by a variant must be loaded, otherwise the
/// whole tileset fails with [`crate::Error::MissingPalette`]. A tile id with no
/// graphics is drawn transparent and reported as a warning.
pub fn build_atlas(usage: SealedUsage, source: &TileSource<'_>, columns: u32) -> Result<TilesetAtlas> {
    let tileset = source.tileset;
    for tile in usage.tiles() {
        source.palette(tile.palette)?;
    }

    let identifiers = IdentifierTable::build(&usage);
    let mut image = AtlasImage::new(columns);
    let mut warnings = Vec::new();

    for (id, tile) in identifiers.iter() {
        let rendered = match render_variant(source, tile)? {
            Some(pixels) => pixels,
            None => {
                warnings.push(
                    Warning::TileOutOfRange {
                        tileset: tileset.name.clone(),
                        tile_id: tile.tile_id,
                    }
                    .logged(),
                );
                [Rgba::TRANSPARENT; TILE_PIXELS]
            }
        };
        let slot = image.push(rendered);
        debug_assert_eq!(slot, id);
    }

    tracing::debug!(
        "Built atlas for {}: {} tiles in {}x{} grid",
        tileset.name,
        image.tile_count(),
        image.columns(),
        image.rows()
    );

    Ok(TilesetAtlas {
        tileset: tileset.name.clone(),
        category: tileset.category,
        identifiers,
        image,
        animations: Vec::new(),
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::formats::{Palette, PaletteSet, TileGraphics, TileRef};
    use crate::tileset::Tileset;

    fn general(slots: &[u8]) -> Tileset {
        let mut palettes = PaletteSet::default();
        for &s in slots {
            let mut colors = [Rgba::opaque(0, 0, 0); 16];
            colors[1] = Rgba::opaque(255, s, 0);
            palettes.slots[s as usize] = Some(Palette { colors });
        }
        let mut graphics = TileGraphics::default();
        for _ in 0..16 {
            graphics.tiles.push([1; TILE_PIXELS]);
        }
        Tileset {
            name: "general".into(),
            category: TilesetCategory::Primary,
            dir: std::path::PathBuf::new(),
            metatiles: Vec::new(),
            attributes: Vec::new(),
            palettes,
            graphics,
        }
    }

    fn seal(tiles: &[TileRef]) -> SealedUsage {
        let mut local = LocalUsage::new();
        for t in tiles {
            local.register("general", *t);
        }
        let mut arena = UsageArena::new();
        arena.merge(local);
        arena.seal().remove("general").unwrap()
    }

    #[test]
    fn test_build_atlas_places_tiles_in_id_order() {
        let tileset = general(&[0, 1]);
        let source = TileSource::new(&tileset, None);
        let usage = seal(&[
            TileRef::new(12, 1, false, false),
            TileRef::new(10, 0, false, false),
            TileRef::new(10, 0, true, false),
        ]);
        let atlas = build_atlas(usage, &source, 16).unwrap();

        assert_eq!(atlas.base_tile_count(), 3);
        assert_eq!(atlas.identifiers.get(&TileRef::new(12, 1, false, false)), Some(3));
        assert_eq!(atlas.image.tile(3).unwrap()[0], Rgba::opaque(255, 1, 0));
        assert_eq!(atlas.image.tile(1).unwrap()[0], Rgba::opaque(255, 0, 0));
        assert!(atlas.warnings.is_empty());
    }

    #[test]
    fn test_missing_palette_fails_tileset() {
        let tileset = general(&[0]);
        let source = TileSource::new(&tileset, None);
        let usage = seal(&[TileRef::new(1, 3, false, false)]);
        let err = build_atlas(usage, &source, 16).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingPalette {
                palette_index: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_out_of_range_tile_is_warning() {
        let tileset = general(&[0]);
        let source = TileSource::new(&tileset, None);
        let usage = seal(&[TileRef::new(300, 0, false, false)]);
        let atlas = build_atlas(usage, &source, 16).unwrap();
        assert_eq!(atlas.total_tile_count(), 1);
        assert_eq!(atlas.image.tile(1).unwrap()[0], Rgba::TRANSPARENT);
        assert!(matches!(
            atlas.warnings[0],
            Warning::TileOutOfRange { tile_id: 300, .. }
        ));
    }
}
