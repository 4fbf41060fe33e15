//! Tileset name normalization and directory lookup

use std::path::{Path, PathBuf};

/// Whether a tileset supplies the low or high half of the metatile/tile space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TilesetCategory {
    Primary,
    Secondary,
}

impl TilesetCategory {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
        }
    }
}

/// Convert `CamelCase` to `snake_case` (`InsideShip` -> `inside_ship`).
///
/// An underscore goes before an uppercase letter that follows a lowercase
/// letter or digit, and before the last capital of an acronym run that is
/// followed by lowercase (`HTTPServer` -> `http_server`).
#[must_use]
pub fn camel_to_snake(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(char::is_ascii_lowercase);
            let boundary = prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase() && next_lower);
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
        }
        out.push(c.to_ascii_lowercase());
    }
    out
}

/// Normalized key for a tileset label (`gTileset_InsideShip` -> `inside_ship`).
#[must_use]
pub fn tileset_key(label: &str) -> String {
    let trimmed = ["gTileset_", "Tileset_", "g_tileset_"]
        .iter()
        .find_map(|prefix| label.strip_prefix(prefix))
        .unwrap_or(label);
    camel_to_snake(trimmed)
}

/// Finds tileset directories under `<root>/data/tilesets`.
#[derive(Debug, Clone)]
pub struct TilesetLocator {
    root: PathBuf,
}

impl TilesetLocator {
    /// `root` is the project root (the directory containing `data/`).
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn tilesets_dir(&self) -> PathBuf {
        self.root.join("data").join("tilesets")
    }

    /// Find a tileset directory by label, trying primary then secondary for
    /// each name variant.
    #[must_use]
    pub fn find(&self, label: &str) -> Option<(TilesetCategory, PathBuf)> {
        let base = self.tilesets_dir();
        let key = tileset_key(label);
        let stripped = label.trim_start_matches("gTileset_");
        let mut variants = vec![key, stripped.to_lowercase(), stripped.replace('_', "").to_lowercase()];
        variants.dedup();

        for variant in &variants {
            for category in [TilesetCategory::Primary, TilesetCategory::Secondary] {
                let dir = base.join(category.as_str()).join(variant);
                if dir.is_dir() {
                    return Some((category, dir));
                }
            }
        }
        None
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}
