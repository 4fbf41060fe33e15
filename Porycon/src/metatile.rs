//! Metatile decomposition
//!
//! A metatile is two 2x2 tile halves. Its layer type decides which of the
//! three output layers each half lands on:
//!
//! | Layer type | bottom half | top half |
//! |------------|-------------|----------|
//! | Normal     | Objects     | Overhead |
//! | Covered    | Ground      | Objects  |
//! | Split      | Ground      | Overhead |
//!
//! An unknown layer type value is rejected rather than defaulted.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::formats::common::NUM_METATILES_IN_PRIMARY;
use crate::formats::{MetatileAttributes, MetatileRecord, TileRef};
use crate::tileset::{Tileset, TilesetCategory};

/// Routing rule for a metatile's halves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerType {
    Normal,
    Covered,
    Split,
}

impl LayerType {
    /// Validate a raw layer type value for metatile `metatile_id`.
    pub fn from_raw(metatile_id: u16, value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Normal),
            1 => Ok(Self::Covered),
            2 => Ok(Self::Split),
            _ => Err(Error::InvalidLayerType { metatile_id, value }),
        }
    }

    /// Destination layers for (bottom, top).
    #[must_use]
    pub fn route(self) -> (Layer, Layer) {
        match self {
            Self::Normal => (Layer::Objects, Layer::Overhead),
            Self::Covered => (Layer::Ground, Layer::Objects),
            Self::Split => (Layer::Ground, Layer::Overhead),
        }
    }
}

/// Output rendering layer, drawn bottom to top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Layer {
    Ground,
    Objects,
    Overhead,
}

impl Layer {
    pub const ALL: [Layer; 3] = [Layer::Ground, Layer::Objects, Layer::Overhead];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Ground => "Ground",
            Self::Objects => "Objects",
            Self::Overhead => "Overhead",
        }
    }

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// A decoded metatile with validated routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metatile {
    /// Id within its owning tileset.
    pub id: u16,
    pub bottom: [TileRef; 4],
    pub top: [TileRef; 4],
    pub layer_type: LayerType,
    pub behavior: u16,
    pub terrain: u8,
    pub encounter: u8,
}

impl Metatile {
    /// Combine a stored record and its attributes, validating the layer type.
    pub fn from_parts(id: u16, record: &MetatileRecord, attrs: MetatileAttributes) -> Result<Self> {
        Ok(Self {
            id,
            bottom: record.bottom(),
            top: record.top(),
            layer_type: LayerType::from_raw(id, attrs.layer_type)?,
            behavior: attrs.behavior,
            terrain: attrs.terrain,
            encounter: attrs.encounter,
        })
    }
}

/// One half of a metatile tagged with its destination layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoutedHalf {
    pub layer: Layer,
    /// Row-major 2x2 block.
    pub tiles: [TileRef; 4],
}

/// Both halves of a metatile after routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Decomposed {
    pub bottom: RoutedHalf,
    pub top: RoutedHalf,
}

impl Decomposed {
    /// Tiles placed on `layer`, if either half lands there.
    #[must_use]
    pub fn tiles_on(&self, layer: Layer) -> Option<&[TileRef; 4]> {
        if self.bottom.layer == layer {
            Some(&self.bottom.tiles)
        } else if self.top.layer == layer {
            Some(&self.top.tiles)
        } else {
            None
        }
    }

    /// Iterate `(layer, dx, dy, tile)` for all eight tiles, `dx`/`dy` in 0..2.
    pub fn placements(&self) -> impl Iterator<Item = (Layer, u32, u32, TileRef)> + '_ {
        [&self.bottom, &self.top].into_iter().flat_map(|half| {
            half.tiles
                .iter()
                .enumerate()
                .map(move |(i, t)| (half.layer, i as u32 % 2, i as u32 / 2, *t))
        })
    }
}

/// Split a metatile into its routed halves.
#[must_use]
pub fn decompose(metatile: &Metatile) -> Decomposed {
    let (bottom_layer, top_layer) = metatile.layer_type.route();
    Decomposed {
        bottom: RoutedHalf {
            layer: bottom_layer,
            tiles: metatile.bottom,
        },
        top: RoutedHalf {
            layer: top_layer,
            tiles: metatile.top,
        },
    }
}

/// Reassemble the original eight-tile layout from routed halves.
#[must_use]
pub fn recompose(decomposed: &Decomposed) -> [TileRef; 8] {
    let mut tiles = [TileRef::default(); 8];
    tiles[..4].copy_from_slice(&decomposed.bottom.tiles);
    tiles[4..].copy_from_slice(&decomposed.top.tiles);
    tiles
}

/// A metatile resolved from a layout cell, with the tileset that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedMetatile {
    pub owner: TilesetCategory,
    pub metatile: Metatile,
}

/// The primary/secondary pair a layout draws from.
#[derive(Debug, Clone, Copy)]
pub struct MetatileSource<'a> {
    pub primary: &'a Tileset,
    pub secondary: Option<&'a Tileset>,
}

impl<'a> MetatileSource<'a> {
    /// Tileset that owns metatiles of `category`.
    #[must_use]
    pub fn tileset(&self, category: TilesetCategory) -> Option<&'a Tileset> {
        match category {
            TilesetCategory::Primary => Some(self.primary),
            TilesetCategory::Secondary => self.secondary,
        }
    }

    /// Resolve a global metatile id (0-1023).
    ///
    /// Ids below 512 index the primary tileset, the rest index the secondary
    /// at `id - 512`.
    pub fn resolve(&self, global_id: u16) -> Result<ResolvedMetatile> {
        let (owner, local_id) = if global_id < NUM_METATILES_IN_PRIMARY {
            (TilesetCategory::Primary, global_id)
        } else {
            (TilesetCategory::Secondary, global_id - NUM_METATILES_IN_PRIMARY)
        };

        let tileset = self.tileset(owner).ok_or_else(|| Error::MetatileOutOfRange {
            tileset: "<none>".to_string(),
            metatile_id: local_id,
            count: 0,
        })?;

        let index = local_id as usize;
        let (Some(record), Some(attrs)) = (tileset.metatiles.get(index), tileset.attributes.get(index))
        else {
            return Err(Error::MetatileOutOfRange {
                tileset: tileset.name.clone(),
                metatile_id: local_id,
                count: tileset.metatiles.len(),
            });
        };

        Ok(ResolvedMetatile {
            owner,
            metatile: Metatile::from_parts(local_id, record, *attrs)?,
        })
    }
}
