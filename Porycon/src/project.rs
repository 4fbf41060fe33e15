//! Project discovery
//!
//! Reads `data/layouts/layouts.json` and every `data/maps/*/map.json` under a
//! project root into a [`MapSet`]. Documents are deserialized leniently:
//! optional fields default, and ids that may be written either as numbers or
//! as strings deserialize into [`Scalar`].

use std::fmt;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::formats::common::DEFAULT_BORDER_SIZE;

/// A JSON value that may be written as a number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Text(String),
}

impl Scalar {
    /// Integer value, accepting decimal or `0x` hex text.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Text(s) => {
                let s = s.trim();
                match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                    Some(hex) => i64::from_str_radix(hex, 16).ok(),
                    None => s.parse().ok(),
                }
            }
        }
    }
}

impl Default for Scalar {
    fn default() -> Self {
        Self::Int(0)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// One entry of `layouts.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutDef {
    pub id: String,
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub primary_tileset: String,
    pub secondary_tileset: String,
    pub border_filepath: String,
    pub blockdata_filepath: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_height: Option<u32>,
}

impl LayoutDef {
    /// Border dimensions in metatiles (2x2 unless overridden).
    #[must_use]
    pub fn border_size(&self) -> (u32, u32) {
        (
            self.border_width.unwrap_or(DEFAULT_BORDER_SIZE),
            self.border_height.unwrap_or(DEFAULT_BORDER_SIZE),
        )
    }

    /// The secondary tileset label, if any.
    #[must_use]
    pub fn secondary(&self) -> Option<&str> {
        let s = self.secondary_tileset.trim();
        (!s.is_empty() && s != "NULL" && s != "0").then_some(s)
    }
}

#[derive(Debug, Deserialize)]
struct LayoutsDocument {
    #[serde(default)]
    layouts: Vec<LayoutDef>,
}

/// A map connection to a neighbor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDef {
    pub map: String,
    pub direction: String,
    #[serde(default)]
    pub offset: i32,
}

/// A warp declared by a map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarpEventDef {
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub elevation: u8,
    pub dest_map: String,
    #[serde(default)]
    pub dest_warp_id: Scalar,
}

/// A coordinate-triggered event (`trigger` or `weather`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordEventDef {
    #[serde(rename = "type")]
    pub kind: String,
    pub x: i32,
    pub y: i32,
    pub elevation: u8,
    pub var: Option<String>,
    pub var_value: Option<Scalar>,
    pub script: Option<String>,
    pub weather: Option<String>,
}

/// A background event (`sign`, `hidden_item` or `secret_base`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BgEventDef {
    #[serde(rename = "type")]
    pub kind: String,
    pub x: i32,
    pub y: i32,
    pub elevation: u8,
    pub player_facing_dir: Option<String>,
    pub script: Option<String>,
    pub item: Option<String>,
    pub flag: Option<String>,
    pub quantity: Option<Scalar>,
    pub underfoot: Option<bool>,
    pub secret_base_id: Option<String>,
}

/// An object (NPC, item ball, ...) placed on a map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectEventDef {
    /// `object` or `clone`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub local_id: Option<String>,
    pub graphics_id: String,
    pub x: i32,
    pub y: i32,
    pub elevation: u8,
    pub movement_type: String,
    pub movement_range_x: Scalar,
    pub movement_range_y: Scalar,
    pub trainer_type: String,
    pub trainer_sight_or_berry_tree_id: Scalar,
    pub script: String,
    pub flag: String,
    pub target_local_id: Option<Scalar>,
    pub target_map: Option<String>,
}

/// A `map.json` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapDocument {
    pub id: String,
    pub name: String,
    pub layout: String,
    pub music: Option<String>,
    pub region_map_section: Option<String>,
    pub requires_flash: Option<bool>,
    pub weather: Option<String>,
    pub map_type: Option<String>,
    pub allow_cycling: Option<bool>,
    pub allow_escaping: Option<bool>,
    pub allow_running: Option<bool>,
    pub show_map_name: Option<bool>,
    pub battle_scene: Option<String>,
    pub connections: Option<Vec<ConnectionDef>>,
    pub object_events: Vec<ObjectEventDef>,
    pub warp_events: Vec<WarpEventDef>,
    pub coord_events: Vec<CoordEventDef>,
    pub bg_events: Vec<BgEventDef>,
}

impl MapDocument {
    /// Connections, treating `null` as none.
    #[must_use]
    pub fn connections(&self) -> &[ConnectionDef] {
        self.connections.as_deref().unwrap_or(&[])
    }
}

/// A map and the file it came from.
#[derive(Debug, Clone)]
pub struct MapEntry {
    pub source: PathBuf,
    pub document: MapDocument,
}

impl MapEntry {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.document.id
    }
}

/// A `map.json` that could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveryError {
    pub path: PathBuf,
    pub message: String,
}

/// All maps and layouts of a project.
#[derive(Debug, Clone, Default)]
pub struct MapSet {
    pub root: PathBuf,
    pub layouts: IndexMap<String, LayoutDef>,
    pub maps: Vec<MapEntry>,
    /// Map documents skipped during discovery.
    pub skipped: Vec<DiscoveryError>,
}

impl MapSet {
    /// Discover layouts and maps under a project root.
    ///
    /// A missing `layouts.json` is an error. Individual map documents that
    /// fail to parse, or repeat an id already seen, are recorded in
    /// [`MapSet::skipped`].
    pub fn discover<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        let layouts_path = root.join("data").join("layouts").join("layouts.json");
        if !layouts_path.is_file() {
            return Err(Error::MissingAsset { path: layouts_path });
        }
        let doc: LayoutsDocument = serde_json::from_str(&std::fs::read_to_string(&layouts_path)?)?;
        let layouts = doc.layouts;

        let maps_dir = root.join("data").join("maps");
        let mut paths = Vec::new();
        if maps_dir.is_dir() {
            for entry in WalkDir::new(&maps_dir).min_depth(2).max_depth(2) {
                let entry = entry?;
                if entry.file_name() == "map.json" {
                    paths.push(entry.into_path());
                }
            }
        }
        paths.sort();

        let mut maps = Vec::with_capacity(paths.len());
        let mut skipped = Vec::new();
        for path in paths {
            match read_map_document(&path) {
                Ok(document) => maps.push(MapEntry {
                    source: path,
                    document,
                }),
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", path.display(), e);
                    skipped.push(DiscoveryError {
                        path,
                        message: e.to_string(),
                    });
                }
            }
        }

        let mut set = Self::from_entries(root, layouts, maps);
        set.skipped.extend(skipped);
        tracing::info!(
            "Discovered {} maps and {} layouts in {}",
            set.maps.len(),
            set.layouts.len(),
            root.display()
        );
        Ok(set)
    }

    /// Build a map set from already-parsed documents.
    pub fn from_parts<P: AsRef<Path>>(root: P, layouts: Vec<LayoutDef>, maps: Vec<MapDocument>) -> Self {
        let entries = maps
            .into_iter()
            .map(|document| MapEntry {
                source: PathBuf::new(),
                document,
            })
            .collect();
        Self::from_entries(root.as_ref(), layouts, entries)
    }

    fn from_entries(root: &Path, layouts: Vec<LayoutDef>, entries: Vec<MapEntry>) -> Self {
        let layouts = layouts
            .into_iter()
            .filter(|l| !l.id.is_empty())
            .map(|l| (l.id.clone(), l))
            .collect();

        let mut maps: Vec<MapEntry> = Vec::with_capacity(entries.len());
        let mut skipped = Vec::new();
        for entry in entries {
            if maps.iter().any(|m| m.id() == entry.id()) {
                skipped.push(DiscoveryError {
                    path: entry.source.clone(),
                    message: format!("duplicate map id {}", entry.id()),
                });
            } else {
                maps.push(entry);
            }
        }

        Self {
            root: root.to_path_buf(),
            layouts,
            maps,
            skipped,
        }
    }

    /// Layout referenced by a map.
    pub fn layout_for(&self, map: &MapEntry) -> Result<&LayoutDef> {
        self.layouts
            .get(&map.document.layout)
            .ok_or_else(|| Error::LayoutNotFound(map.document.layout.clone()))
    }

    /// Resolve a project-relative path.
    #[must_use]
    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Map lookup by id.
    #[must_use]
    pub fn get(&self, map_id: &str) -> Option<&MapEntry> {
        self.maps.iter().find(|m| m.id() == map_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.maps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}

fn read_map_document(path: &Path) -> Result<MapDocument> {
    let doc: MapDocument = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    if doc.id.is_empty() {
        return Err(Error::InvalidConfig(format!("{} has no map id", path.display())));
    }
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scalar_as_int() {
        assert_eq!(Scalar::Int(3).as_int(), Some(3));
        assert_eq!(Scalar::Text("12".into()).as_int(), Some(12));
        assert_eq!(Scalar::Text("0x1F".into()).as_int(), Some(31));
        assert_eq!(Scalar::Text("WARP_ID_DYNAMIC".into()).as_int(), None);
    }

    #[test]
    fn test_map_document_lenient_fields() {
        let json = r#"{
            "id": "MAP_LITTLEROOT_TOWN",
            "name": "LittlerootTown",
            "layout": "LAYOUT_LITTLEROOT_TOWN",
            "connections": null,
            "warp_events": [
                {"x": 1, "y": 2, "elevation": 0, "dest_map": "MAP_A", "dest_warp_id": "0"},
                {"x": 3, "y": 4, "elevation": 3, "dest_map": "MAP_B", "dest_warp_id": 1}
            ]
        }"#;
        let doc: MapDocument = serde_json::from_str(json).unwrap();
        assert!(doc.connections().is_empty());
        assert_eq!(doc.warp_events[0].dest_warp_id.as_int(), Some(0));
        assert_eq!(doc.warp_events[1].dest_warp_id, Scalar::Int(1));
        assert!(doc.object_events.is_empty());
    }

    #[test]
    fn test_layout_helpers() {
        let layout = LayoutDef {
            secondary_tileset: "NULL".into(),
            border_width: Some(4),
            ..Default::default()
        };
        assert_eq!(layout.secondary(), None);
        assert_eq!(layout.border_size(), (4, 2));
    }

    #[test]
    fn test_discover() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("data/layouts")).unwrap();
        std::fs::write(
            root.join("data/layouts/layouts.json"),
            r#"{"layouts":[{"id":"LAYOUT_A","name":"A","width":1,"height":1,
                "primary_tileset":"gTileset_General","secondary_tileset":"gTileset_Petalburg",
                "border_filepath":"data/layouts/A/border.bin","blockdata_filepath":"data/layouts/A/map.bin"},{}]}"#,
        )
        .unwrap();
        for (dir_name, body) in [
            ("A", r#"{"id":"MAP_A","name":"A","layout":"LAYOUT_A"}"#),
            ("B", "not json"),
        ] {
            let d = root.join("data/maps").join(dir_name);
            std::fs::create_dir_all(&d).unwrap();
            std::fs::write(d.join("map.json"), body).unwrap();
        }

        let set = MapSet::discover(root).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.layouts.len(), 1);
        assert_eq!(set.skipped.len(), 1);
        let map = set.get("MAP_A").unwrap();
        assert_eq!(set.layout_for(map).unwrap().secondary(), Some("gTileset_Petalburg"));
    }

    #[test]
    fn test_from_parts_rejects_duplicate_ids() {
        let doc = MapDocument {
            id: "MAP_A".into(),
            ..Default::default()
        };
        let set = MapSet::from_parts("/tmp", Vec::new(), vec![doc.clone(), doc]);
        assert_eq!(set.len(), 1);
        assert_eq!(set.skipped.len(), 1);
    }

    #[test]
    fn test_missing_layouts_json() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            MapSet::discover(dir.path()),
            Err(Error::MissingAsset { .. })
        ));
    }
}
