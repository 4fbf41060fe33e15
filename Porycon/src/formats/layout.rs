//! Layout grid (`map.bin` / `border.bin`) reading
//!
//! Each cell is a little-endian u16: metatile id in bits 0-9, collision in
//! bits 10-11 and elevation in bits 12-15.

use std::io::Cursor;
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use serde::Serialize;

use super::common::{
    COLLISION_MASK, COLLISION_SHIFT, ELEVATION_MASK, ELEVATION_SHIFT, METATILE_ID_MASK,
};
use crate::error::{Error, Result};

/// One decoded layout cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BlockEntry {
    /// Global metatile id (0-1023).
    pub metatile_id: u16,
    /// Collision bits (0-3).
    pub collision: u8,
    /// Elevation (0-15).
    pub elevation: u8,
}

impl BlockEntry {
    /// Unpack a raw cell value. Every u16 is a valid cell.
    #[must_use]
    pub fn from_raw(raw: u16) -> Self {
        Self {
            metatile_id: raw & METATILE_ID_MASK,
            collision: ((raw & COLLISION_MASK) >> COLLISION_SHIFT) as u8,
            elevation: ((raw & ELEVATION_MASK) >> ELEVATION_SHIFT) as u8,
        }
    }

    /// Pack back into the on-disk representation.
    #[must_use]
    pub fn to_raw(self) -> u16 {
        (self.metatile_id & METATILE_ID_MASK)
            | ((u16::from(self.collision) << COLLISION_SHIFT) & COLLISION_MASK)
            | ((u16::from(self.elevation) << ELEVATION_SHIFT) & ELEVATION_MASK)
    }
}

/// A row-major grid of layout cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutGrid {
    pub width: u32,
    pub height: u32,
    pub cells: Vec<BlockEntry>,
}

impl LayoutGrid {
    /// Cell at `(x, y)`, or `None` outside the grid.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Option<BlockEntry> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells.get((y * self.width + x) as usize).copied()
    }

    /// Iterate `(x, y, cell)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, BlockEntry)> + '_ {
        let width = self.width.max(1);
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| (i as u32 % width, i as u32 / width, *cell))
    }
}

/// Read a layout grid from disk.
///
/// `what` names the blob in error messages (`"map.bin"`, `"border.bin"`).
pub fn read_layout<P: AsRef<Path>>(
    path: P,
    width: u32,
    height: u32,
    what: &'static str,
) -> Result<LayoutGrid> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::MissingAsset {
            path: path.to_path_buf(),
        });
    }
    let data = std::fs::read(path)?;
    parse_layout_bytes(&data, width, height, what)
}

/// Parse a layout grid from bytes.
///
/// The buffer must be exactly `width * height * 2` bytes.
pub fn parse_layout_bytes(
    data: &[u8],
    width: u32,
    height: u32,
    what: &'static str,
) -> Result<LayoutGrid> {
    let expected = width as usize * height as usize * 2;
    if data.len() != expected {
        return Err(Error::BufferLengthMismatch {
            what,
            expected,
            actual: data.len(),
        });
    }

    let mut cursor = Cursor::new(data);
    let mut cells = Vec::with_capacity(expected / 2);
    for _ in 0..expected / 2 {
        cells.push(BlockEntry::from_raw(cursor.read_u16::<LittleEndian>()?));
    }

    Ok(LayoutGrid {
        width,
        height,
        cells,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_entry_bits() {
        // metatile 0x1A5, collision 1, elevation 3
        let raw: u16 = 0x1A5 | (1 << 10) | (3 << 12);
        let entry = BlockEntry::from_raw(raw);
        assert_eq!(entry.metatile_id, 0x1A5);
        assert_eq!(entry.collision, 1);
        assert_eq!(entry.elevation, 3);
        assert_eq!(entry.to_raw(), raw);
    }

    #[test]
    fn test_parse_layout() {
        let data = [0x01, 0x00, 0x02, 0x04, 0xFF, 0xF3, 0x00, 0x02];
        let grid = parse_layout_bytes(&data, 2, 2, "map.bin").unwrap();
        assert_eq!(grid.get(0, 0).unwrap().metatile_id, 1);
        assert_eq!(grid.get(1, 0).unwrap().collision, 1);
        let cell = grid.get(0, 1).unwrap();
        assert_eq!(cell.metatile_id, 0x3FF);
        assert_eq!(cell.elevation, 0xF);
        assert_eq!(grid.get(1, 1).unwrap().metatile_id, 512);
        assert!(grid.get(2, 0).is_none());
    }

    #[test]
    fn test_truncated_layout_is_format_error() {
        let err = parse_layout_bytes(&[0u8; 7], 2, 2, "map.bin").unwrap_err();
        assert!(err.is_format_error());
        assert!(matches!(
            err,
            Error::BufferLengthMismatch {
                expected: 8,
                actual: 7,
                ..
            }
        ));
    }

    #[test]
    fn test_oversized_layout_is_format_error() {
        assert!(parse_layout_bytes(&[0u8; 10], 2, 2, "map.bin").is_err());
    }
}
