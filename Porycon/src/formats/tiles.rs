//! Indexed 8x8 tile graphics
//!
//! Graphics come either as raw 4bpp data (32 bytes per tile, low nibble is the
//! left pixel) or as an indexed PNG sheet cut into 8x8 cells row-major. Pixel
//! values are palette indices; the palette is applied when the atlas is
//! rendered.

// Binary format parsing requires many intentional casts between integer types
#![allow(clippy::cast_possible_truncation)]

use std::io::Cursor;
use std::path::Path;

use super::common::TILE_SIZE;
use crate::error::{Error, Result};

pub const TILE_PIXELS: usize = (TILE_SIZE * TILE_SIZE) as usize;
const BYTES_PER_4BPP_TILE: usize = TILE_PIXELS / 2;

/// Palette indices of one 8x8 tile, row-major.
pub type TilePixels = [u8; TILE_PIXELS];

/// An all-zero (fully transparent) tile.
pub const BLANK_TILE: TilePixels = [0; TILE_PIXELS];

/// A decoded indexed image of arbitrary size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedImage {
    pub width: u32,
    pub height: u32,
    /// Row-major palette indices.
    pub pixels: Vec<u8>,
}

impl IndexedImage {
    /// Cut the image into 8x8 tiles, left-to-right then top-to-bottom.
    ///
    /// Partial cells at the right or bottom edge are dropped.
    #[must_use]
    pub fn to_tiles(&self) -> Vec<TilePixels> {
        let cols = self.width / TILE_SIZE;
        let rows = self.height / TILE_SIZE;
        let mut tiles = Vec::with_capacity((cols * rows) as usize);
        for row in 0..rows {
            for col in 0..cols {
                let mut tile = BLANK_TILE;
                for py in 0..TILE_SIZE {
                    let y = row * TILE_SIZE + py;
                    let start = (y * self.width + col * TILE_SIZE) as usize;
                    let dst = (py * TILE_SIZE) as usize;
                    tile[dst..dst + TILE_SIZE as usize]
                        .copy_from_slice(&self.pixels[start..start + TILE_SIZE as usize]);
                }
                tiles.push(tile);
            }
        }
        tiles
    }
}

/// A tileset's tile graphics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileGraphics {
    pub tiles: Vec<TilePixels>,
}

impl TileGraphics {
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&TilePixels> {
        self.tiles.get(index)
    }

    /// Load `tiles.4bpp`, falling back to `tiles.png`.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let raw = dir.join("tiles.4bpp");
        if raw.is_file() {
            return parse_4bpp_bytes(&std::fs::read(raw)?);
        }
        let png_path = dir.join("tiles.png");
        if png_path.is_file() {
            let image = parse_indexed_png_bytes(&std::fs::read(png_path)?)?;
            return Ok(Self {
                tiles: image.to_tiles(),
            });
        }
        Err(Error::MissingAsset { path: png_path })
    }
}

/// Parse raw 4bpp tile data. Length must be a multiple of 32.
pub fn parse_4bpp_bytes(data: &[u8]) -> Result<TileGraphics> {
    if data.len() % BYTES_PER_4BPP_TILE != 0 {
        return Err(Error::BufferLengthMismatch {
            what: "tiles.4bpp",
            expected: data.len() / BYTES_PER_4BPP_TILE * BYTES_PER_4BPP_TILE,
            actual: data.len(),
        });
    }
    let tiles = data
        .chunks_exact(BYTES_PER_4BPP_TILE)
        .map(|chunk| {
            let mut tile = BLANK_TILE;
            for (i, byte) in chunk.iter().enumerate() {
                tile[i * 2] = byte & 0x0F;
                tile[i * 2 + 1] = byte >> 4;
            }
            tile
        })
        .collect();
    Ok(TileGraphics { tiles })
}

/// Decode an indexed (or low-depth grayscale) PNG into palette indices.
///
/// No colour transformation is applied. Every index must fit in 4 bits, the
/// width the hardware stores.
pub fn parse_indexed_png_bytes(data: &[u8]) -> Result<IndexedImage> {
    let mut decoder = png::Decoder::new(Cursor::new(data));
    decoder.set_transformations(png::Transformations::IDENTITY);
    let mut reader = decoder.read_info()?;
    let mut buf = vec![0u8; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf)?;

    let depth = info.bit_depth as u8;
    match (info.color_type, depth) {
        (png::ColorType::Indexed, 1 | 2 | 4 | 8) | (png::ColorType::Grayscale, 1 | 2 | 4) => {}
        (color, depth) => {
            return Err(Error::InvalidTileGraphics(format!(
                "expected an indexed PNG, found {color:?} at {depth} bits"
            )));
        }
    }

    let width = info.width as usize;
    let height = info.height as usize;
    let mut pixels = Vec::with_capacity(width * height);
    for line in buf.chunks(info.line_size).take(height) {
        for x in 0..width {
            let sample = unpack_sample(line, x, depth);
            if sample > 0x0F {
                return Err(Error::InvalidBitField {
                    what: "tile pixel",
                    index: pixels.len(),
                    value: u32::from(sample),
                });
            }
            pixels.push(sample);
        }
    }

    Ok(IndexedImage {
        width: info.width,
        height: info.height,
        pixels,
    })
}

/// Extract sample `x` from a packed scanline; high bits come first.
fn unpack_sample(line: &[u8], x: usize, depth: u8) -> u8 {
    if depth == 8 {
        return line[x];
    }
    let per_byte = 8 / depth as usize;
    let byte = line[x / per_byte];
    let shift = 8 - depth as usize * (x % per_byte + 1);
    let mask = (1u16 << depth) as u8 - 1;
    (byte >> shift) & mask
}
