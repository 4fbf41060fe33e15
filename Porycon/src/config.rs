//! Conversion options (`porycon.toml`)
//!
//! ```toml
//! workers = 0                  # 0 = one per CPU
//! emit_animations = true
//! keep_blank_tiles = false
//! attribute_format = "emerald" # or "firered"
//! atlas_columns = 16
//! animation_catalog = "anims.json"
//! world_start_map = "MAP_LITTLEROOT_TOWN"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::animation::AnimationCatalog;
use crate::atlas::DEFAULT_ATLAS_COLUMNS;
use crate::error::{Error, Result};
use crate::formats::AttributeFormat;

fn default_true() -> bool {
    true
}

fn default_atlas_columns() -> u32 {
    DEFAULT_ATLAS_COLUMNS
}

/// Options for one conversion batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConvertOptions {
    /// Worker threads; 0 uses rayon's default.
    #[serde(default)]
    pub workers: usize,
    /// Bind cataloged tile animations and append their frames to atlases.
    #[serde(default = "default_true")]
    pub emit_animations: bool,
    /// Register tile id 0 like any other tile instead of skipping it.
    #[serde(default)]
    pub keep_blank_tiles: bool,
    #[serde(default)]
    pub attribute_format: AttributeFormat,
    #[serde(default = "default_atlas_columns")]
    pub atlas_columns: u32,
    /// Replacement animation catalog; the built-in one when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation_catalog: Option<PathBuf>,
    /// Map placed at the world origin; the first map when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub world_start_map: Option<String>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            workers: 0,
            emit_animations: true,
            keep_blank_tiles: false,
            attribute_format: AttributeFormat::default(),
            atlas_columns: DEFAULT_ATLAS_COLUMNS,
            animation_catalog: None,
            world_start_map: None,
        }
    }
}

impl ConvertOptions {
    /// Parse options from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let options: Self = toml::from_str(text)?;
        options.validate()?;
        Ok(options)
    }

    /// Load options from a TOML file.
    ///
    /// A relative `animation_catalog` path is resolved against the file's
    /// directory.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut options = Self::from_toml_str(&std::fs::read_to_string(path)?)?;
        if let (Some(catalog), Some(dir)) = (&options.animation_catalog, path.parent()) {
            if catalog.is_relative() {
                options.animation_catalog = Some(dir.join(catalog));
            }
        }
        tracing::debug!("Loaded options from {}", path.display());
        Ok(options)
    }

    fn validate(&self) -> Result<()> {
        if self.atlas_columns == 0 {
            return Err(Error::InvalidConfig("atlas_columns must be positive".into()));
        }
        Ok(())
    }

    /// The animation catalog these options select.
    pub fn catalog(&self) -> Result<AnimationCatalog> {
        match &self.animation_catalog {
            Some(path) => AnimationCatalog::load(path),
            None => AnimationCatalog::builtin(),
        }
    }
}
