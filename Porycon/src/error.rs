//! Error types for `porycon`

use std::path::PathBuf;

use thiserror::Error;

/// The error type for `porycon` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A required asset file does not exist on disk.
    #[error("missing asset: {path}")]
    MissingAsset {
        /// The path that was expected to exist.
        path: PathBuf,
    },

    // ==================== Binary Format Errors ====================
    /// A binary buffer does not have the exact length its declared shape requires.
    #[error("{what}: expected {expected} bytes, found {actual}")]
    BufferLengthMismatch {
        /// Which blob was being decoded (e.g. "map.bin").
        what: &'static str,
        /// Length implied by the declared dimensions.
        expected: usize,
        /// Length actually present.
        actual: usize,
    },

    /// A packed bit-field holds a value outside the format's valid range.
    #[error("{what}: invalid value {value:#x} at record {index}")]
    InvalidBitField {
        /// Which field was being decoded.
        what: &'static str,
        /// Index of the offending record.
        index: usize,
        /// The raw value found.
        value: u32,
    },

    /// A layout cell references a metatile the tileset does not define.
    #[error("metatile {metatile_id} out of range for tileset {tileset} ({count} metatiles)")]
    MetatileOutOfRange {
        /// Tileset the metatile id resolved to.
        tileset: String,
        /// Local metatile id within that tileset.
        metatile_id: u16,
        /// Number of metatiles the tileset defines.
        count: usize,
    },

    /// A palette file could not be decoded.
    #[error("invalid palette {path}: {message}")]
    InvalidPalette {
        /// Palette file path.
        path: PathBuf,
        /// What was wrong with it.
        message: String,
    },

    /// Tile graphics could not be decoded.
    #[error("invalid tile graphics: {0}")]
    InvalidTileGraphics(String),

    /// PNG decoding error.
    #[error("PNG decode error: {0}")]
    Png(String),

    // ==================== Tileset Errors ====================
    /// A palette slot referenced by a tile has no backing palette data.
    #[error("tileset {tileset}: palette {palette_index} has no data")]
    MissingPalette {
        /// Tileset whose atlas was being built.
        tileset: String,
        /// The referenced palette slot (0-15).
        palette_index: u8,
    },

    /// A tileset directory could not be located.
    #[error("tileset not found: {name}")]
    TilesetNotFound {
        /// Tileset name as referenced by the layout.
        name: String,
    },

    // ==================== Defects ====================
    /// A metatile declares a layer type outside Normal/Covered/Split.
    #[error("metatile {metatile_id} has invalid layer type {value}")]
    InvalidLayerType {
        /// Metatile id within its tileset.
        metatile_id: u16,
        /// Raw layer type value.
        value: u8,
    },

    /// A tile variant registered during scanning has no identifier.
    ///
    /// Indicates the scan and build phases disagree about a tileset's usage.
    #[error("tileset {tileset}: no identifier for tile {tile_id} (palette {palette})")]
    IdentifierMissing {
        /// Tileset being looked up.
        tileset: String,
        /// Tile id of the missing variant.
        tile_id: u16,
        /// Palette of the missing variant.
        palette: u8,
    },

    // ==================== Batch Errors ====================
    /// A map references a layout that is not declared.
    #[error("layout not found: {0}")]
    LayoutNotFound(String),

    /// A map could not be converted because a tileset it depends on failed.
    #[error("tileset {tileset} failed: {cause}")]
    TilesetFailed {
        /// The failed tileset.
        tileset: String,
        /// Description of the shared cause.
        cause: String,
    },

    /// The worker pool could not be created.
    #[error("thread pool error: {0}")]
    ThreadPool(String),

    // ==================== Parsing / Config Errors ====================
    /// Invalid configuration value.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// TOML parsing error.
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Image encoding error.
    #[error("image error: {0}")]
    ImageError(#[from] image::ImageError),

    /// Directory traversal error.
    #[error("directory walk error: {0}")]
    WalkDirError(String),
}

/// Coarse classification of an [`Error`], used for batch summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Structurally invalid binary data.
    Format,
    /// Referenced palette slot without data.
    MissingPalette,
    /// Upstream data defect that must not be defaulted.
    Defect,
    /// Missing files, layouts or tilesets.
    Lookup,
    /// Propagated from a failed tileset build.
    Dependency,
    /// Filesystem errors.
    Io,
    /// Configuration or structured-data parse errors.
    Config,
}

impl Error {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BufferLengthMismatch { .. }
            | Self::InvalidBitField { .. }
            | Self::MetatileOutOfRange { .. }
            | Self::InvalidPalette { .. }
            | Self::InvalidTileGraphics(_)
            | Self::Png(_) => ErrorKind::Format,
            Self::MissingPalette { .. } => ErrorKind::MissingPalette,
            Self::InvalidLayerType { .. } | Self::IdentifierMissing { .. } => ErrorKind::Defect,
            Self::MissingAsset { .. } | Self::TilesetNotFound { .. } | Self::LayoutNotFound(_) => {
                ErrorKind::Lookup
            }
            Self::TilesetFailed { .. } => ErrorKind::Dependency,
            Self::Io(_) | Self::WalkDirError(_) | Self::ImageError(_) => ErrorKind::Io,
            Self::ThreadPool(_)
            | Self::InvalidConfig(_)
            | Self::JsonError(_)
            | Self::TomlError(_) => ErrorKind::Config,
        }
    }

    /// Whether this is a structural binary format error.
    #[must_use]
    pub fn is_format_error(&self) -> bool {
        self.kind() == ErrorKind::Format
    }

    /// Whether this error indicates defective upstream data rather than a data-quality issue.
    #[must_use]
    pub fn is_defect(&self) -> bool {
        self.kind() == ErrorKind::Defect
    }
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        Error::WalkDirError(err.to_string())
    }
}

impl From<png::DecodingError> for Error {
    fn from(err: png::DecodingError) -> Self {
        Error::Png(err.to_string())
    }
}

/// A specialized Result type for `porycon` operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let format = Error::BufferLengthMismatch {
            what: "map.bin",
            expected: 8,
            actual: 6,
        };
        assert!(format.is_format_error());
        assert!(!format.is_defect());

        let defect = Error::InvalidLayerType {
            metatile_id: 3,
            value: 7,
        };
        assert!(defect.is_defect());
        assert_eq!(defect.to_string(), "metatile 3 has invalid layer type 7");

        let palette = Error::MissingPalette {
            tileset: "general".into(),
            palette_index: 9,
        };
        assert_eq!(palette.kind(), ErrorKind::MissingPalette);
    }
}
