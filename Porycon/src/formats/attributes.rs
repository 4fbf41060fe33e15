//! `metatile_attributes.bin` reading
//!
//! Two layouts exist. Emerald packs each metatile into a u16 (behavior in bits
//! 0-7, layer type in bits 12-15). FireRed uses a u32 with a wider behavior
//! field plus terrain and encounter bits.
//!
//! The layer type is kept raw here. Validation happens during decomposition so
//! one bad metatile does not poison the whole table.

// Binary format parsing requires many intentional casts between integer types
#![allow(clippy::cast_possible_truncation)]

use std::io::Cursor;
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// On-disk attribute layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeFormat {
    /// u16 per metatile.
    #[default]
    Emerald,
    /// u32 per metatile.
    FireRed,
}

impl AttributeFormat {
    /// Bytes per metatile.
    #[must_use]
    pub fn element_size(self) -> usize {
        match self {
            Self::Emerald => 2,
            Self::FireRed => 4,
        }
    }
}

/// Decoded attributes of one metatile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct MetatileAttributes {
    /// Behavior id (`MB_*`).
    pub behavior: u16,
    /// Terrain type; always 0 for Emerald.
    pub terrain: u8,
    /// Encounter type; always 0 for Emerald.
    pub encounter: u8,
    /// Raw layer type value, validated later.
    pub layer_type: u8,
}

impl MetatileAttributes {
    /// Unpack an Emerald u16 attribute.
    #[must_use]
    pub fn from_emerald(raw: u16) -> Self {
        Self {
            behavior: raw & 0x00FF,
            terrain: 0,
            encounter: 0,
            layer_type: ((raw & 0xF000) >> 12) as u8,
        }
    }

    /// Unpack a FireRed u32 attribute.
    #[must_use]
    pub fn from_firered(raw: u32) -> Self {
        Self {
            behavior: (raw & 0x0000_01FF) as u16,
            terrain: ((raw & 0x0000_3E00) >> 9) as u8,
            encounter: ((raw & 0x0700_0000) >> 24) as u8,
            layer_type: ((raw & 0x6000_0000) >> 29) as u8,
        }
    }
}

/// Read attributes from disk.
pub fn read_attributes<P: AsRef<Path>>(
    path: P,
    format: AttributeFormat,
) -> Result<Vec<MetatileAttributes>> {
    let data = std::fs::read(path)?;
    parse_attributes_bytes(&data, format)
}

/// Parse attributes from bytes. Length must be a multiple of the element size.
pub fn parse_attributes_bytes(
    data: &[u8],
    format: AttributeFormat,
) -> Result<Vec<MetatileAttributes>> {
    let size = format.element_size();
    if data.len() % size != 0 {
        return Err(Error::BufferLengthMismatch {
            what: "metatile_attributes.bin",
            expected: data.len() / size * size,
            actual: data.len(),
        });
    }

    let mut cursor = Cursor::new(data);
    let count = data.len() / size;
    let mut attrs = Vec::with_capacity(count);
    for _ in 0..count {
        attrs.push(match format {
            AttributeFormat::Emerald => {
                MetatileAttributes::from_emerald(cursor.read_u16::<LittleEndian>()?)
            }
            AttributeFormat::FireRed => {
                MetatileAttributes::from_firered(cursor.read_u32::<LittleEndian>()?)
            }
        });
    }
    Ok(attrs)
}
