use porycon::prelude::*;
use porycon::batch::MapPhase;
use porycon::warning::UnresolvedReason;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

// ---------------------------------------------------------------------------
// Synthetic project
// ---------------------------------------------------------------------------

fn tile(id: u16, palette: u16, flip_h: bool, flip_v: bool) -> u16 {
    id | (u16::from(flip_h) << 10) | (u16::from(flip_v) << 11) | (palette << 12)
}

fn le_bytes(values: &[u16]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn write(path: &Path, data: impl AsRef<[u8]>) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, data).unwrap();
}

/// Write a tileset with `tiles` solid 4bpp tiles and the given palette slots.
fn write_tileset(
    root: &Path,
    category: &str,
    name: &str,
    metatiles: &[([u16; 8], u8)],
    tiles: usize,
    palettes: &[usize],
) {
    let dir = root.join("data/tilesets").join(category).join(name);
    let records: Vec<u16> = metatiles.iter().flat_map(|(m, _)| m.iter().copied()).collect();
    write(&dir.join("metatiles.bin"), le_bytes(&records));
    let attrs: Vec<u16> = metatiles
        .iter()
        .enumerate()
        .map(|(i, (_, layer))| (i as u16 & 0xFF) | (u16::from(*layer) << 12))
        .collect();
    write(&dir.join("metatile_attributes.bin"), le_bytes(&attrs));
    write(&dir.join("tiles.4bpp"), vec![0x11u8; tiles * 32]);
    for &slot in palettes {
        let colors: Vec<u16> = (0..16).map(|c| (c as u16) | ((slot as u16) << 5)).collect();
        write(&dir.join(format!("palettes/{slot:02}.gbapal")), le_bytes(&colors));
    }
}

/// An 8-bit indexed PNG filled with one palette index.
fn indexed_png(width: u32, height: u32, index: u8) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(png::ColorType::Indexed);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_palette(vec![0u8; 16 * 3]);
        let mut writer = encoder.write_header().unwrap();
        writer
            .write_image_data(&vec![index; (width * height) as usize])
            .unwrap();
    }
    out
}

fn write_layout(root: &Path, name: &str, cells: &[u16]) {
    write(&root.join(format!("data/layouts/{name}/map.bin")), le_bytes(cells));
}

fn layout(id: &str, dir: &str, secondary: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": format!("{dir}_Layout"),
        "width": 2,
        "height": 2,
        "primary_tileset": "gTileset_General",
        "secondary_tileset": secondary,
        "border_filepath": "data/layouts/border.bin",
        "blockdata_filepath": format!("data/layouts/{dir}/map.bin"),
    })
}

fn write_map(root: &Path, dir: &str, doc: serde_json::Value) {
    write(
        &root.join(format!("data/maps/{dir}/map.json")),
        serde_json::to_string_pretty(&doc).unwrap(),
    );
}

/// Six 2x2 maps A-F. C's blockdata is truncated; F uses a secondary tileset
/// whose only metatile needs a palette it does not have.
fn build_project(root: &Path) {
    let blank = [0u16; 8];
    let grass = [
        tile(1, 0, false, false),
        tile(2, 0, true, false),
        tile(1, 0, false, false),
        tile(2, 0, false, false),
        0,
        0,
        0,
        0,
    ];
    let flowers = [
        tile(3, 1, false, false),
        tile(3, 1, false, false),
        tile(3, 1, false, false),
        tile(3, 1, false, false),
        tile(508, 0, false, false),
        0,
        0,
        0,
    ];
    write_tileset(root, "primary", "general", &[(blank, 0), (grass, 0), (flowers, 0)], 8, &[0, 1]);

    let roof = [
        tile(512, 6, false, false),
        tile(512, 6, false, false),
        tile(512, 6, false, false),
        tile(512, 6, false, false),
        tile(513, 7, false, true),
        tile(513, 7, false, true),
        tile(513, 7, false, true),
        tile(513, 7, false, true),
    ];
    write_tileset(root, "secondary", "petalburg", &[(roof, 1)], 2, &[6, 7]);

    let bad = [tile(512, 9, false, false); 8];
    write_tileset(root, "secondary", "rustboro", &[(bad, 0)], 1, &[6]);

    write(
        &root.join("data/layouts/layouts.json"),
        serde_json::to_string_pretty(&json!({
            "layouts": [
                layout("LAYOUT_A", "A", "gTileset_Petalburg"),
                layout("LAYOUT_B", "B", "gTileset_Petalburg"),
                layout("LAYOUT_C", "C", "gTileset_Petalburg"),
                layout("LAYOUT_D", "D", "gTileset_Petalburg"),
                layout("LAYOUT_E", "E", "gTileset_Petalburg"),
                layout("LAYOUT_F", "F", "gTileset_Rustboro"),
            ]
        }))
        .unwrap(),
    );
    write(&root.join("data/layouts/border.bin"), le_bytes(&[1, 1, 1, 1]));

    write_layout(root, "A", &[1, 1, 512, 0]);
    write_layout(root, "B", &[1, 0, 0, 0]);
    write(&root.join("data/layouts/C/map.bin"), [1u8, 0, 1]);
    write_layout(root, "D", &[2, 1, 0, 512]);
    write_layout(root, "E", &[1 | (1 << 10) | (3 << 12), 1, 1, 1]);
    write_layout(root, "F", &[1, 512, 0, 0]);

    write_map(
        root,
        "A",
        json!({
            "id": "MAP_A",
            "name": "A",
            "layout": "LAYOUT_A",
            "music": "MUS_LITTLEROOT",
            "connections": [{ "map": "MAP_B", "direction": "right", "offset": 0 }],
            "warp_events": [
                { "x": 0, "y": 0, "elevation": 0, "dest_map": "MAP_B", "dest_warp_id": "0" },
                { "x": 1, "y": 0, "elevation": 0, "dest_map": "MAP_B", "dest_warp_id": 1 },
                { "x": 1, "y": 1, "elevation": 0, "dest_map": "MAP_B", "dest_warp_id": "2" }
            ]
        }),
    );
    write_map(
        root,
        "B",
        json!({
            "id": "MAP_B",
            "name": "B",
            "layout": "LAYOUT_B",
            "connections": [{ "map": "MAP_A", "direction": "left", "offset": 0 }],
            "warp_events": [
                { "x": 0, "y": 1, "elevation": 3, "dest_map": "MAP_A", "dest_warp_id": "0" },
                { "x": 1, "y": 1, "elevation": 3, "dest_map": "MAP_A", "dest_warp_id": "1" }
            ]
        }),
    );
    for dir in ["C", "D", "E", "F"] {
        write_map(
            root,
            dir,
            json!({ "id": format!("MAP_{dir}"), "name": dir, "layout": format!("LAYOUT_{dir}") }),
        );
    }
}

fn convert(root: &Path, workers: usize) -> BatchResult {
    let set = MapSet::discover(root).unwrap();
    let options = ConvertOptions {
        workers,
        ..ConvertOptions::default()
    };
    run(&set, &options).unwrap()
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn test_truncated_map_fails_alone() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();

    let dir = tempdir().unwrap();
    build_project(dir.path());
    let result = convert(dir.path(), 2);

    assert_eq!(result.maps.len(), 6);
    // A, B, D, E convert; C fails to scan; F fails on its tileset.
    assert_eq!(result.success_count(), 4);

    let c = result.map("MAP_C").unwrap();
    match &c.outcome {
        MapOutcome::Failed { phase, error } => {
            assert_eq!(*phase, MapPhase::Scan);
            assert!(error.is_format_error(), "unexpected error: {error}");
        }
        MapOutcome::Converted(_) => panic!("MAP_C should fail"),
    }

    // Usage from the other maps still reaches the shared atlas.
    let general = result.atlas("general").unwrap();
    let tiles: Vec<TileRef> = general.identifiers.iter().map(|(_, t)| t).collect();
    assert_eq!(
        tiles,
        vec![
            TileRef::new(1, 0, false, false),
            TileRef::new(2, 0, false, false),
            TileRef::new(2, 0, true, false),
            TileRef::new(3, 1, false, false),
            TileRef::new(508, 0, false, false),
        ]
    );
}

#[test]
fn test_layers_and_first_gids() {
    let dir = tempdir().unwrap();
    build_project(dir.path());
    let result = convert(dir.path(), 2);
    let a = result.map("MAP_A").unwrap().converted().unwrap();

    assert_eq!(a.tilesets.len(), 2);
    assert_eq!(a.tilesets[0].first_gid, 1);
    assert_eq!(a.tilesets[1].name, "petalburg");
    assert_eq!(a.tilesets[1].first_gid, 6);

    // Grass is Normal: its bottom half lands on Objects.
    let objects = a.layer(Layer::Objects).unwrap();
    assert_eq!((objects.width, objects.height), (4, 4));
    assert_eq!(&objects.data[0..4], &[1, 3, 1, 3]);
    assert_eq!(&objects.data[4..8], &[1, 2, 1, 2]);

    // The roof is Covered: bottom to Ground, top to Objects, never Overhead.
    let ground = a.layer(Layer::Ground).unwrap();
    assert_eq!(ground.get(0, 2), Some(6));
    assert_eq!(ground.get(1, 3), Some(6));
    assert_eq!(objects.get(0, 2), Some(7));
    assert!(a.layer(Layer::Overhead).unwrap().data.iter().all(|&gid| gid == 0));

    assert_eq!(a.grids.behavior, vec![1, 1, 0, 0]);
    assert_eq!(a.border.layers.len(), 3);
    assert_eq!(a.properties.music.as_deref(), Some("MUS_LITTLEROOT"));
}

#[test]
fn test_unresolved_warp_is_a_warning() {
    let dir = tempdir().unwrap();
    build_project(dir.path());
    let result = convert(dir.path(), 2);
    let a = result.map("MAP_A").unwrap();
    let converted = a.converted().unwrap();

    assert_eq!(converted.warps.len(), 3);
    let first = converted.warps[0].destination.unwrap();
    assert_eq!((first.x, first.y, first.elevation), (0, 1, 3));
    assert!(converted.warps[1].destination.is_some());
    assert!(converted.warps[2].destination.is_none());

    let unresolved: Vec<&UnresolvedWarpWarning> = a
        .warnings
        .iter()
        .filter_map(|w| match w {
            Warning::UnresolvedWarp(u) => Some(u),
            _ => None,
        })
        .collect();
    assert_eq!(unresolved.len(), 1);
    assert_eq!(unresolved[0].warp_index, 2);
    assert_eq!(unresolved[0].reason, UnresolvedReason::UnknownSlot);
}

#[test]
fn test_missing_palette_fails_dependent_maps_only() {
    let dir = tempdir().unwrap();
    build_project(dir.path());
    let result = convert(dir.path(), 2);

    let rustboro = &result.tilesets["rustboro"];
    let cause = rustboro.outcome.as_ref().unwrap_err();
    assert_eq!(cause.kind(), ErrorKind::MissingPalette);

    let f = result.map("MAP_F").unwrap();
    match &f.outcome {
        MapOutcome::Failed { phase, error } => {
            assert_eq!(*phase, MapPhase::Build);
            assert!(std::sync::Arc::ptr_eq(error, cause));
        }
        MapOutcome::Converted(_) => panic!("MAP_F should fail"),
    }

    assert!(result.map("MAP_A").unwrap().is_success());
    assert!(result.atlas("petalburg").is_some());
    assert_eq!(result.summary().maps_failed, 2);
}

#[test]
fn test_missing_animation_folder_warns() {
    let dir = tempdir().unwrap();
    build_project(dir.path());
    let result = convert(dir.path(), 2);
    let general = result.atlas("general").unwrap();

    assert!(general.animations.is_empty());
    assert!(general.warnings.iter().any(|w| matches!(
        w,
        Warning::AnimationPatternMissing { pattern, .. } if pattern == "flower"
    )));
}

#[test]
fn test_animation_frames_are_appended() {
    let dir = tempdir().unwrap();
    build_project(dir.path());
    let flower = dir.path().join("data/tilesets/primary/general/anim/flower");
    for frame in 0..3u8 {
        write(&flower.join(format!("{frame}.png")), indexed_png(32, 8, frame + 1));
    }
    let result = convert(dir.path(), 2);
    let general = result.atlas("general").unwrap();

    assert_eq!(general.animations.len(), 1);
    let anim = &general.animations[0];
    assert_eq!(anim.frame_sequence, vec![0, 1, 0, 2]);
    assert_eq!(anim.tiles[0].identifier, 5);
    assert_eq!(general.base_tile_count(), 5);
    assert_eq!(general.total_tile_count(), 8);

    // Frames push the secondary's first gid past them.
    let a = result.map("MAP_A").unwrap().converted().unwrap();
    assert_eq!(a.tilesets[1].first_gid, 9);
}

#[test]
fn test_identifiers_independent_of_scheduling() {
    let dir = tempdir().unwrap();
    build_project(dir.path());
    let serial = convert(dir.path(), 1);
    let parallel = convert(dir.path(), 4);

    for name in ["general", "petalburg"] {
        assert_eq!(
            serial.atlas(name).unwrap().identifiers,
            parallel.atlas(name).unwrap().identifiers
        );
    }
    let a1 = serde_json::to_value(serial.map("MAP_D").unwrap().converted().unwrap()).unwrap();
    let a2 = serde_json::to_value(parallel.map("MAP_D").unwrap().converted().unwrap()).unwrap();
    assert_eq!(a1, a2);
}

#[test]
fn test_world_and_export() {
    let dir = tempdir().unwrap();
    build_project(dir.path());
    let result = convert(dir.path(), 2);

    let world = result.world.as_ref().unwrap();
    let b = world.maps.iter().find(|m| m.map_id == "MAP_B").unwrap();
    assert_eq!((b.x, b.y), (32, 0));

    let out = dir.path().join("out");
    porycon::export::write_batch(&result, &out).unwrap();
    assert!(out.join("tilesets/general/atlas.png").is_file());
    assert!(out.join("tilesets/general/tileset.json").is_file());
    assert!(out.join("maps/MAP_A.json").is_file());
    assert!(!out.join("maps/MAP_C.json").exists());
    assert!(out.join("world.json").is_file());

    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("summary.json")).unwrap()).unwrap();
    assert_eq!(summary["maps_succeeded"], 4);
}
