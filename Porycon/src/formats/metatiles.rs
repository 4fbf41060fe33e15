//! `metatiles.bin` reading
//!
//! Eight u16 tile entries per metatile. Entries 0-3 form the bottom half and
//! 4-7 the top half, each a 2x2 block in row-major order.

// Binary format parsing requires many intentional casts between integer types
#![allow(clippy::cast_possible_truncation)]

use std::io::Cursor;
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use serde::{Deserialize, Serialize};

use super::common::{FLIP_H_BIT, FLIP_V_BIT, PALETTE_SHIFT, TILE_ID_MASK, TILES_PER_METATILE};
use crate::error::{Error, Result};

/// One renderable tile variant.
///
/// Field order matters: the derived `Ord` sorts by tile id, then palette,
/// then horizontal flip, then vertical flip, which is the identifier order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileRef {
    /// 10-bit tile id.
    pub tile_id: u16,
    /// Palette slot (0-15).
    pub palette: u8,
    pub flip_h: bool,
    pub flip_v: bool,
}

impl TileRef {
    /// Create a tile reference.
    #[must_use]
    pub const fn new(tile_id: u16, palette: u8, flip_h: bool, flip_v: bool) -> Self {
        Self {
            tile_id,
            palette,
            flip_h,
            flip_v,
        }
    }

    /// Unpack a raw metatile entry.
    #[must_use]
    pub fn from_raw(raw: u16) -> Self {
        Self {
            tile_id: raw & TILE_ID_MASK,
            palette: (raw >> PALETTE_SHIFT) as u8,
            flip_h: raw & FLIP_H_BIT != 0,
            flip_v: raw & FLIP_V_BIT != 0,
        }
    }

    /// Pack into the on-disk representation.
    #[must_use]
    pub fn to_raw(self) -> u16 {
        let mut raw = (self.tile_id & TILE_ID_MASK) | (u16::from(self.palette & 0xF) << PALETTE_SHIFT);
        if self.flip_h {
            raw |= FLIP_H_BIT;
        }
        if self.flip_v {
            raw |= FLIP_V_BIT;
        }
        raw
    }

    /// Tile id 0 is the conventional blank tile.
    #[must_use]
    pub fn is_blank(self) -> bool {
        self.tile_id == 0
    }
}

/// The eight tile entries of one metatile, as stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MetatileRecord {
    pub tiles: [TileRef; TILES_PER_METATILE],
}

impl MetatileRecord {
    /// Bottom 2x2 half (entries 0-3).
    #[must_use]
    pub fn bottom(&self) -> [TileRef; 4] {
        [self.tiles[0], self.tiles[1], self.tiles[2], self.tiles[3]]
    }

    /// Top 2x2 half (entries 4-7).
    #[must_use]
    pub fn top(&self) -> [TileRef; 4] {
        [self.tiles[4], self.tiles[5], self.tiles[6], self.tiles[7]]
    }
}

/// Read `metatiles.bin` from disk.
pub fn read_metatiles<P: AsRef<Path>>(path: P) -> Result<Vec<MetatileRecord>> {
    let data = std::fs::read(path)?;
    parse_metatiles_bytes(&data)
}

/// Parse metatile records from bytes. Length must be a multiple of 16.
pub fn parse_metatiles_bytes(data: &[u8]) -> Result<Vec<MetatileRecord>> {
    const RECORD_SIZE: usize = TILES_PER_METATILE * 2;

    if data.len() % RECORD_SIZE != 0 {
        return Err(Error::BufferLengthMismatch {
            what: "metatiles.bin",
            expected: data.len() / RECORD_SIZE * RECORD_SIZE,
            actual: data.len(),
        });
    }

    let mut cursor = Cursor::new(data);
    let count = data.len() / RECORD_SIZE;
    let mut records = Vec::with_capacity(count);
    for _ in 0..count {
        let mut tiles = [TileRef::default(); TILES_PER_METATILE];
        for tile in &mut tiles {
            *tile = TileRef::from_raw(cursor.read_u16::<LittleEndian>()?);
        }
        records.push(MetatileRecord { tiles });
    }
    Ok(records)
}

impl Default for TileRef {
    fn default() -> Self {
        Self::new(0, 0, false, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_ref_bits() {
        let t = TileRef::from_raw(0x3C05 | 0x0400);
        assert_eq!(t.tile_id, 5);
        assert_eq!(t.palette, 3);
        assert!(t.flip_h);
        assert!(t.flip_v);
        assert_eq!(t.to_raw(), 0x3C05 | 0x0400);
    }

    #[test]
    fn test_tile_ref_ordering() {
        let mut refs = vec![
            TileRef::new(12, 1, false, false),
            TileRef::new(10, 0, true, false),
            TileRef::new(10, 0, false, true),
            TileRef::new(10, 0, false, false),
        ];
        refs.sort();
        assert_eq!(
            refs,
            vec![
                TileRef::new(10, 0, false, false),
                TileRef::new(10, 0, false, true),
                TileRef::new(10, 0, true, false),
                TileRef::new(12, 1, false, false),
            ]
        );
    }

    #[test]
    fn test_parse_metatiles() {
        let mut data = Vec::new();
        for i in 0u16..8 {
            data.extend_from_slice(&(i | (2 << 12)).to_le_bytes());
        }
        let records = parse_metatiles_bytes(&data).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].bottom()[3].tile_id, 3);
        assert_eq!(records[0].top()[0].tile_id, 4);
        assert!(records[0].tiles.iter().all(|t| t.palette == 2));
    }

    #[test]
    fn test_partial_record_rejected() {
        let err = parse_metatiles_bytes(&[0u8; 18]).unwrap_err();
        assert!(err.is_format_error());
    }
}
