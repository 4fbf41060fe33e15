//! Binary asset readers
//!
//! Decodes the fixed-size, bit-packed blobs a project stores per layout and per
//! tileset. Every reader has a `read_*` variant taking a path and a `parse_*`
//! variant taking bytes; the latter never touches the filesystem.

pub mod attributes;
pub mod common;
pub mod layout;
pub mod metatiles;
pub mod palette;
pub mod tiles;

pub use attributes::{AttributeFormat, MetatileAttributes, parse_attributes_bytes, read_attributes};
pub use layout::{BlockEntry, LayoutGrid, parse_layout_bytes, read_layout};
pub use metatiles::{MetatileRecord, TileRef, parse_metatiles_bytes, read_metatiles};
pub use palette::{Palette, PaletteSet, Rgba, expand_5bit, parse_gbapal_bytes, parse_jasc_pal};
pub use tiles::{TileGraphics, TilePixels, parse_4bpp_bytes, parse_indexed_png_bytes};
