//! Tile rendering
//!
//! Turns a tile variant into 8x8 RGBA pixels using the palette bank and
//! graphics bank visible to a tileset.

use image::RgbaImage;

use crate::error::{Error, Result};
use crate::formats::common::{NUM_PRIMARY_PALETTES, NUM_TILES_IN_PRIMARY_VRAM, TILE_SIZE};
use crate::formats::tiles::TILE_PIXELS;
use crate::formats::{Palette, Rgba, TilePixels, TileRef};
use crate::tileset::Tileset;

/// One rendered 8x8 tile, row-major.
pub type RenderedTile = [Rgba; TILE_PIXELS];

/// Palettes and tile graphics visible while drawing one tileset's atlas.
///
/// A secondary tileset sees palette slots 0-5 and tile ids below 512 through
/// its paired primary. A primary tileset only sees itself.
#[derive(Debug, Clone, Copy)]
pub struct TileSource<'a> {
    pub tileset: &'a Tileset,
    pub paired_primary: Option<&'a Tileset>,
}

impl<'a> TileSource<'a> {
    #[must_use]
    pub fn new(tileset: &'a Tileset, paired_primary: Option<&'a Tileset>) -> Self {
        Self {
            tileset,
            paired_primary,
        }
    }

    /// Palette for a slot, or [`Error::MissingPalette`].
    pub fn palette(&self, slot: u8) -> Result<&'a Palette> {
        let owner = match self.paired_primary {
            Some(primary) if !self.tileset.is_primary() && slot < NUM_PRIMARY_PALETTES => primary,
            _ => self.tileset,
        };
        owner.palettes.get(slot).ok_or_else(|| Error::MissingPalette {
            tileset: self.tileset.name.clone(),
            palette_index: slot,
        })
    }

    /// Pixel indices for a VRAM tile id, if the graphics cover it.
    #[must_use]
    pub fn pixels(&self, tile_id: u16) -> Option<&'a TilePixels> {
        if tile_id < NUM_TILES_IN_PRIMARY_VRAM {
            let owner = if self.tileset.is_primary() {
                Some(self.tileset)
            } else {
                self.paired_primary
            };
            owner.and_then(|t| t.graphics.get(tile_id as usize))
        } else if self.tileset.is_primary() {
            None
        } else {
            self.tileset
                .graphics
                .get((tile_id - NUM_TILES_IN_PRIMARY_VRAM) as usize)
        }
    }
}

/// Color one tile's pixel indices with a palette, applying flips.
#[must_use]
pub fn render_tile(pixels: &TilePixels, palette: &Palette, flip_h: bool, flip_v: bool) -> RenderedTile {
    let size = TILE_SIZE as usize;
    let mut out = [Rgba::TRANSPARENT; TILE_PIXELS];
    for y in 0..size {
        let src_y = if flip_v { size - 1 - y } else { y };
        for x in 0..size {
            let src_x = if flip_h { size - 1 - x } else { x };
            out[y * size + x] = palette.color(pixels[src_y * size + src_x]);
        }
    }
    out
}

/// Render a variant against `source`.
///
/// Returns `Ok(None)` when the tile id has no graphics. A missing palette is
/// an error.
pub fn render_variant(source: &TileSource<'_>, tile: TileRef) -> Result<Option<RenderedTile>> {
    let palette = source.palette(tile.palette)?;
    Ok(source
        .pixels(tile.tile_id)
        .map(|pixels| render_tile(pixels, palette, tile.flip_h, tile.flip_v)))
}

/// A grid of rendered tiles. Tile `n` (1-based) sits in cell `n - 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtlasImage {
    columns: u32,
    tiles: Vec<RenderedTile>,
}

impl AtlasImage {
    #[must_use]
    pub fn new(columns: u32) -> Self {
        Self {
            columns: columns.max(1),
            tiles: Vec::new(),
        }
    }

    /// Append a tile and return its 1-based index.
    pub fn push(&mut self, tile: RenderedTile) -> u32 {
        self.tiles.push(tile);
        self.tiles.len() as u32
    }

    #[must_use]
    pub fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of tiles, including any appended animation frames.
    #[must_use]
    pub fn tile_count(&self) -> u32 {
        self.tiles.len() as u32
    }

    #[must_use]
    pub fn rows(&self) -> u32 {
        (self.tile_count().div_ceil(self.columns)).max(1)
    }

    /// Pixels of a 1-based tile index.
    #[must_use]
    pub fn tile(&self, index: u32) -> Option<&RenderedTile> {
        index
            .checked_sub(1)
            .and_then(|i| self.tiles.get(i as usize))
    }

    /// Lay the tiles out into an image `columns * 8` pixels wide.
    #[must_use]
    pub fn to_rgba_image(&self) -> RgbaImage {
        let size = TILE_SIZE;
        let mut img = RgbaImage::new(self.columns * size, self.rows() * size);
        for (i, tile) in self.tiles.iter().enumerate() {
            let i = i as u32;
            let ox = (i % self.columns) * size;
            let oy = (i / self.columns) * size;
            for (p, color) in tile.iter().enumerate() {
                let p = p as u32;
                img.put_pixel(ox + p % size, oy + p / size, color.to_image());
            }
        }
        img
    }
}
