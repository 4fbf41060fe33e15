//! Tileset loading
//!
//! A tileset directory holds `metatiles.bin`, `metatile_attributes.bin`,
//! `palettes/` and `tiles.4bpp` or `tiles.png`. Everything is loaded once and
//! shared read-only between workers.

pub mod resolve;

use std::path::{Path, PathBuf};

pub use resolve::{TilesetCategory, TilesetLocator, camel_to_snake, tileset_key};

use crate::error::{Error, Result};
use crate::formats::{
    AttributeFormat, MetatileAttributes, MetatileRecord, PaletteSet, TileGraphics,
    read_attributes, read_metatiles,
};

/// A fully loaded tileset.
#[derive(Debug, Clone)]
pub struct Tileset {
    /// Normalized key (`general`).
    pub name: String,
    pub category: TilesetCategory,
    pub dir: PathBuf,
    pub metatiles: Vec<MetatileRecord>,
    pub attributes: Vec<MetatileAttributes>,
    pub palettes: PaletteSet,
    pub graphics: TileGraphics,
}

impl Tileset {
    /// Load a tileset directory.
    pub fn load(
        name: &str,
        category: TilesetCategory,
        dir: &Path,
        format: AttributeFormat,
    ) -> Result<Self> {
        let metatiles = read_metatiles(require(dir.join("metatiles.bin"))?)?;
        let attributes = read_attributes(require(dir.join("metatile_attributes.bin"))?, format)?;
        if attributes.len() != metatiles.len() {
            return Err(Error::BufferLengthMismatch {
                what: "metatile_attributes.bin",
                expected: metatiles.len() * format.element_size(),
                actual: attributes.len() * format.element_size(),
            });
        }
        let palettes = PaletteSet::load_dir(&dir.join("palettes"))?;
        let graphics = TileGraphics::load_dir(dir)?;

        tracing::debug!(
            "Loaded tileset {} ({}): {} metatiles, {} tiles, {} palettes",
            name,
            category.as_str(),
            metatiles.len(),
            graphics.len(),
            palettes.loaded()
        );

        Ok(Self {
            name: name.to_string(),
            category,
            dir: dir.to_path_buf(),
            metatiles,
            attributes,
            palettes,
            graphics,
        })
    }

    /// Resolve a label through the locator and load it.
    pub fn locate_and_load(
        locator: &TilesetLocator,
        label: &str,
        format: AttributeFormat,
    ) -> Result<Self> {
        let (category, dir) = locator.find(label).ok_or_else(|| Error::TilesetNotFound {
            name: label.to_string(),
        })?;
        Self::load(&tileset_key(label), category, &dir, format)
    }

    #[must_use]
    pub fn is_primary(&self) -> bool {
        self.category == TilesetCategory::Primary
    }

    /// Directory holding animation folders.
    #[must_use]
    pub fn anim_dir(&self) -> PathBuf {
        self.dir.join("anim")
    }
}

fn require(path: PathBuf) -> Result<PathBuf> {
    if path.is_file() {
        Ok(path)
    } else {
        Err(Error::MissingAsset { path })
    }
}
