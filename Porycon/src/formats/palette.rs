//! 16-color palette decoding
//!
//! Binary palettes (`NN.gbapal`) hold 16 little-endian BGR555 colors: red in
//! bits 0-4, green in 5-9, blue in 10-14, bit 15 unused. Text palettes
//! (`NN.pal`) use the JASC-PAL layout.
//!
//! 5-bit channels widen to 8 bits by bit replication, `(c << 3) | (c >> 2)`,
//! so 0 maps to 0 and 31 maps to 255 with no rounding step.

use std::io::Cursor;
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use serde::Serialize;

use super::common::{NUM_PALETTES, PALETTE_COLORS};
use crate::error::{Error, Result};

/// An RGBA color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[must_use]
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Decode a BGR555 value.
    #[must_use]
    pub fn from_bgr555(raw: u16) -> Self {
        Self::opaque(
            expand_5bit((raw & 0x1F) as u8),
            expand_5bit(((raw >> 5) & 0x1F) as u8),
            expand_5bit(((raw >> 10) & 0x1F) as u8),
        )
    }

    #[must_use]
    pub fn to_image(self) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, self.a])
    }
}

/// Widen a 5-bit channel to 8 bits by bit replication.
#[must_use]
pub fn expand_5bit(value: u8) -> u8 {
    let v = value & 0x1F;
    (v << 3) | (v >> 2)
}

/// One 16-color palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub colors: [Rgba; PALETTE_COLORS],
}

impl Palette {
    /// Color for a pixel index. Index 0 is always transparent.
    #[must_use]
    pub fn color(&self, index: u8) -> Rgba {
        if index == 0 {
            Rgba::TRANSPARENT
        } else {
            self.colors[(index as usize) & (PALETTE_COLORS - 1)]
        }
    }
}

/// The 16 palette slots of one tileset. Slots without a file are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaletteSet {
    pub slots: [Option<Palette>; NUM_PALETTES],
}

impl PaletteSet {
    #[must_use]
    pub fn get(&self, slot: u8) -> Option<&Palette> {
        self.slots.get(slot as usize).and_then(Option::as_ref)
    }

    /// Number of populated slots.
    #[must_use]
    pub fn loaded(&self) -> usize {
        self.slots.iter().filter(|p| p.is_some()).count()
    }

    /// Load `palettes/NN.gbapal` (preferred) or `palettes/NN.pal` for each slot.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let mut set = Self::default();
        for (i, slot) in set.slots.iter_mut().enumerate() {
            let binary = dir.join(format!("{i:02}.gbapal"));
            let text = dir.join(format!("{i:02}.pal"));
            if binary.is_file() {
                *slot = Some(parse_gbapal_bytes(&std::fs::read(&binary)?)?);
            } else if text.is_file() {
                *slot = Some(parse_jasc_pal(&std::fs::read_to_string(&text)?, &text)?);
            }
        }
        tracing::debug!("Loaded {} palettes from {}", set.loaded(), dir.display());
        Ok(set)
    }
}

/// Parse a binary BGR555 palette. Must be exactly 32 bytes.
pub fn parse_gbapal_bytes(data: &[u8]) -> Result<Palette> {
    if data.len() != PALETTE_COLORS * 2 {
        return Err(Error::BufferLengthMismatch {
            what: "palette",
            expected: PALETTE_COLORS * 2,
            actual: data.len(),
        });
    }
    let mut cursor = Cursor::new(data);
    let mut colors = [Rgba::default(); PALETTE_COLORS];
    for color in &mut colors {
        *color = Rgba::from_bgr555(cursor.read_u16::<LittleEndian>()?);
    }
    Ok(Palette { colors })
}

/// Parse a JASC-PAL text palette.
///
/// Fewer than 16 colors pad with opaque black; extra colors are ignored.
pub fn parse_jasc_pal(text: &str, path: &Path) -> Result<Palette> {
    let invalid = |message: String| Error::InvalidPalette {
        path: path.to_path_buf(),
        message,
    };

    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
    if lines.next() != Some("JASC-PAL") {
        return Err(invalid("missing JASC-PAL header".into()));
    }
    // Version line, always 0100
    lines
        .next()
        .ok_or_else(|| invalid("missing version line".into()))?;
    let count: usize = lines
        .next()
        .ok_or_else(|| invalid("missing color count".into()))?
        .parse()
        .map_err(|e| invalid(format!("bad color count: {e}")))?;

    let mut colors = [Rgba::opaque(0, 0, 0); PALETTE_COLORS];
    for (i, line) in lines.take(count.min(PALETTE_COLORS)).enumerate() {
        let parts: Vec<u8> = line
            .split_whitespace()
            .map(str::parse)
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| invalid(format!("bad color on line {}: {e}", i + 4)))?;
        let [r, g, b] = parts[..] else {
            return Err(invalid(format!("expected 3 channels on line {}", i + 4)));
        };
        colors[i] = Rgba::opaque(r, g, b);
    }
    Ok(Palette { colors })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_5bit() {
        assert_eq!(expand_5bit(0), 0);
        assert_eq!(expand_5bit(31), 255);
        assert_eq!(expand_5bit(16), 132);
        assert_eq!(expand_5bit(1), 8);
        // Only the low 5 bits count
        assert_eq!(expand_5bit(0xFF), 255);
    }

    #[test]
    fn test_bgr555_channels() {
        // red=31, green=0, blue=16, bit 15 set and ignored
        let raw: u16 = 31 | (16 << 10) | 0x8000;
        assert_eq!(Rgba::from_bgr555(raw), Rgba::opaque(255, 0, 132));
    }

    #[test]
    fn test_parse_gbapal() {
        let mut data = vec![0u8; 32];
        data[2..4].copy_from_slice(&(0x1Fu16 << 5).to_le_bytes());
        let palette = parse_gbapal_bytes(&data).unwrap();
        assert_eq!(palette.colors[1], Rgba::opaque(0, 255, 0));
        assert_eq!(palette.color(0), Rgba::TRANSPARENT);
        assert_eq!(palette.color(1).a, 255);
    }

    #[test]
    fn test_gbapal_length_checked() {
        assert!(parse_gbapal_bytes(&[0u8; 30]).unwrap_err().is_format_error());
    }

    #[test]
    fn test_parse_jasc() {
        let text = "JASC-PAL\r\n0100\r\n3\r\n0 0 0\r\n255 128 64\r\n8 16 24\r\n";
        let palette = parse_jasc_pal(text, Path::new("00.pal")).unwrap();
        assert_eq!(palette.colors[1], Rgba::opaque(255, 128, 64));
        assert_eq!(palette.colors[2], Rgba::opaque(8, 16, 24));
        assert_eq!(palette.colors[15], Rgba::opaque(0, 0, 0));
    }

    #[test]
    fn test_jasc_rejects_garbage() {
        assert!(parse_jasc_pal("RIFF\n", Path::new("x.pal")).is_err());
        assert!(parse_jasc_pal("JASC-PAL\n0100\n1\n1 2\n", Path::new("x.pal")).is_err());
    }
}
