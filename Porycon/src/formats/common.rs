//! Format constants shared by the readers

/// Metatile ids below this belong to the primary tileset.
pub const NUM_METATILES_IN_PRIMARY: u16 = 512;
/// Tile ids below this sample the primary tileset's graphics.
pub const NUM_TILES_IN_PRIMARY_VRAM: u16 = 512;

/// Tile edge length in pixels.
pub const TILE_SIZE: u32 = 8;
/// Metatile edge length in pixels.
pub const METATILE_SIZE: u32 = 16;
/// Tiles per metatile (two 2x2 halves).
pub const TILES_PER_METATILE: usize = 8;
/// Tiles per metatile half.
pub const TILES_PER_HALF: usize = 4;

/// Palette slots per tileset bank.
pub const NUM_PALETTES: usize = 16;
/// Colors per palette.
pub const PALETTE_COLORS: usize = 16;
/// Palette slots owned by the primary tileset; the rest come from the secondary.
pub const NUM_PRIMARY_PALETTES: u8 = 6;

// Layout cell bit-fields
pub const METATILE_ID_MASK: u16 = 0x03FF;
pub const COLLISION_MASK: u16 = 0x0C00;
pub const COLLISION_SHIFT: u16 = 10;
pub const ELEVATION_MASK: u16 = 0xF000;
pub const ELEVATION_SHIFT: u16 = 12;

// Metatile tile entry bit-fields
pub const TILE_ID_MASK: u16 = 0x03FF;
pub const FLIP_H_BIT: u16 = 0x0400;
pub const FLIP_V_BIT: u16 = 0x0800;
pub const PALETTE_SHIFT: u16 = 12;

/// Default border grid size in metatiles.
pub const DEFAULT_BORDER_SIZE: u32 = 2;
