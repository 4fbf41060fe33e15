//! Map event conversion
//!
//! Turns the raw `object_events`, `coord_events` and `bg_events` of a map
//! document into typed events. Entries with unusable fields are skipped with a
//! [`Warning::InvalidEvent`]; nothing is dropped silently.

use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::project::{BgEventDef, CoordEventDef, MapDocument, ObjectEventDef, Scalar};
use crate::warning::Warning;

/// Cardinal facing direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    North,
    South,
    East,
    West,
}

/// How an object moves, with behavior-specific parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Behavior {
    pub id: String,
    pub params: Map<String, Value>,
}

/// An object placed on the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectEvent {
    /// 1-based position in the map's object list.
    pub local_id: usize,
    /// Symbolic id, when the document gives one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub graphics_id: String,
    pub x: i32,
    pub y: i32,
    pub elevation: u8,
    pub behavior: Behavior,
    pub movement_range: (i64, i64),
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trainer_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sight_range: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility_flag: Option<String>,
    /// For clone objects, the (map, local id) being mirrored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clone_of: Option<(String, Scalar)>,
}

/// A script run when the player steps on a tile and a variable matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerEvent {
    pub x: i32,
    pub y: i32,
    pub elevation: u8,
    pub var: String,
    pub var_value: i64,
    pub script: String,
}

/// A weather change when the player steps on a tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeatherTrigger {
    pub x: i32,
    pub y: i32,
    pub elevation: u8,
    pub weather: String,
}

/// A readable sign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignEvent {
    pub x: i32,
    pub y: i32,
    pub elevation: u8,
    pub script: String,
    /// `None` means readable from any side.
    pub facing: Option<Facing>,
}

/// An item hidden on a tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HiddenItemEvent {
    pub x: i32,
    pub y: i32,
    pub elevation: u8,
    pub item: String,
    pub flag: String,
    pub quantity: i64,
    pub underfoot: bool,
}

/// A secret base entrance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecretBaseEvent {
    pub x: i32,
    pub y: i32,
    pub elevation: u8,
    pub base_id: String,
}

/// All converted events of one map.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MapEvents {
    pub objects: Vec<ObjectEvent>,
    pub triggers: Vec<TriggerEvent>,
    pub weather_triggers: Vec<WeatherTrigger>,
    pub signs: Vec<SignEvent>,
    pub hidden_items: Vec<HiddenItemEvent>,
    pub secret_bases: Vec<SecretBaseEvent>,
}

/// Convert every event list of a map document.
#[must_use]
pub fn convert_events(doc: &MapDocument) -> (MapEvents, Vec<Warning>) {
    let mut events = MapEvents::default();
    let mut warnings = Vec::new();
    let mut invalid = |event: String, message: &str| {
        warnings.push(
            Warning::InvalidEvent {
                map_id: doc.id.clone(),
                event,
                message: message.to_string(),
            }
            .logged(),
        );
    };

    for (i, obj) in doc.object_events.iter().enumerate() {
        events.objects.push(convert_object(i + 1, obj));
    }

    for (i, coord) in doc.coord_events.iter().enumerate() {
        let label = format!("coord_event[{i}]");
        match coord.kind.as_str() {
            "trigger" => match convert_trigger(coord) {
                Ok(Some(trigger)) => events.triggers.push(trigger),
                Ok(None) => tracing::trace!("{}: {} has no script", doc.id, label),
                Err(message) => invalid(label, message),
            },
            "weather" => match non_empty(coord.weather.as_deref()) {
                Some(weather) => events.weather_triggers.push(WeatherTrigger {
                    x: coord.x,
                    y: coord.y,
                    elevation: coord.elevation,
                    weather: weather.to_string(),
                }),
                None => invalid(label, "weather trigger without weather"),
            },
            other => invalid(label, &format!("unknown coord event type {other:?}")),
        }
    }

    for (i, bg) in doc.bg_events.iter().enumerate() {
        let label = format!("bg_event[{i}]");
        match bg.kind.as_str() {
            "sign" => match non_empty(bg.script.as_deref()) {
                Some(script) => events.signs.push(SignEvent {
                    x: bg.x,
                    y: bg.y,
                    elevation: bg.elevation,
                    script: script.to_string(),
                    facing: bg.player_facing_dir.as_deref().and_then(parse_facing),
                }),
                None => invalid(label, "sign without script"),
            },
            "hidden_item" => match convert_hidden_item(bg) {
                Ok(item) => events.hidden_items.push(item),
                Err(message) => invalid(label, message),
            },
            "secret_base" => match non_empty(bg.secret_base_id.as_deref()) {
                Some(base_id) => events.secret_bases.push(SecretBaseEvent {
                    x: bg.x,
                    y: bg.y,
                    elevation: bg.elevation,
                    base_id: base_id.to_string(),
                }),
                None => invalid(label, "secret base without id"),
            },
            other => invalid(label, &format!("unknown bg event type {other:?}")),
        }
    }

    (events, warnings)
}

/// Scripts of `0x0` or `NULL` mean "no script".
fn non_empty(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "0x0" && *s != "NULL" && *s != "0")
}

fn convert_trigger(coord: &CoordEventDef) -> Result<Option<TriggerEvent>, &'static str> {
    let Some(script) = non_empty(coord.script.as_deref()) else {
        return Ok(None);
    };
    let var = non_empty(coord.var.as_deref()).ok_or("trigger without var")?;
    let var_value = coord
        .var_value
        .as_ref()
        .map_or(Some(0), Scalar::as_int)
        .ok_or("var_value is not an integer")?;
    Ok(Some(TriggerEvent {
        x: coord.x,
        y: coord.y,
        elevation: coord.elevation,
        var: var.to_string(),
        var_value,
        script: script.to_string(),
    }))
}

fn convert_hidden_item(bg: &BgEventDef) -> Result<HiddenItemEvent, &'static str> {
    let item = non_empty(bg.item.as_deref()).ok_or("hidden item without item")?;
    let flag = non_empty(bg.flag.as_deref()).ok_or("hidden item without flag")?;
    let quantity = bg
        .quantity
        .as_ref()
        .map_or(Some(1), Scalar::as_int)
        .ok_or("quantity is not an integer")?;
    Ok(HiddenItemEvent {
        x: bg.x,
        y: bg.y,
        elevation: bg.elevation,
        item: item.to_string(),
        flag: flag.to_string(),
        quantity,
        underfoot: bg.underfoot.unwrap_or(false),
    })
}

/// `BG_EVENT_PLAYER_FACING_NORTH` -> North; `..._ANY` -> `None`.
fn parse_facing(value: &str) -> Option<Facing> {
    let upper = value.to_ascii_uppercase();
    if upper.ends_with("NORTH") {
        Some(Facing::North)
    } else if upper.ends_with("SOUTH") {
        Some(Facing::South)
    } else if upper.ends_with("EAST") {
        Some(Facing::East)
    } else if upper.ends_with("WEST") {
        Some(Facing::West)
    } else {
        None
    }
}

fn convert_object(local_id: usize, obj: &ObjectEventDef) -> ObjectEvent {
    let behavior = movement_behavior(&obj.movement_type);
    let trainer_type = Some(obj.trainer_type.trim())
        .filter(|t| !t.is_empty() && *t != "TRAINER_TYPE_NONE")
        .map(str::to_string);
    let sight_range = trainer_type
        .as_ref()
        .and(Some(&obj.trainer_sight_or_berry_tree_id))
        .filter(|s| s.as_int() != Some(0))
        .cloned();
    let clone_of = match (obj.kind.as_deref(), &obj.target_map, &obj.target_local_id) {
        (Some("clone"), Some(map), Some(id)) => Some((map.clone(), id.clone())),
        _ => None,
    };

    ObjectEvent {
        local_id,
        name: obj.local_id.clone().filter(|s| !s.is_empty()),
        graphics_id: obj.graphics_id.clone(),
        x: obj.x,
        y: obj.y,
        elevation: obj.elevation,
        behavior,
        movement_range: (
            obj.movement_range_x.as_int().unwrap_or(0),
            obj.movement_range_y.as_int().unwrap_or(0),
        ),
        trainer_type,
        sight_range,
        script: non_empty(Some(obj.script.as_str())).map(str::to_string),
        visibility_flag: non_empty(Some(obj.flag.as_str())).map(str::to_string),
        clone_of,
    }
}

fn behavior(id: &str, params: Value) -> Behavior {
    Behavior {
        id: id.to_string(),
        params: match params {
            Value::Object(map) => map,
            _ => Map::new(),
        },
    }
}

fn direction_word(word: &str) -> Option<&'static str> {
    match word {
        "UP" => Some("up"),
        "DOWN" => Some("down"),
        "LEFT" => Some("left"),
        "RIGHT" => Some("right"),
        _ => None,
    }
}

/// Classify a four-step walk sequence as a clockwise square, a
/// counterclockwise square, or a zigzag.
fn walk_sequence_pattern(steps: &[&str]) -> &'static str {
    let index = |s: &&str| -> i32 {
        match *s {
            "UP" => 0,
            "RIGHT" => 1,
            "DOWN" => 2,
            _ => 3,
        }
    };
    let turns: Vec<i32> = steps
        .windows(2)
        .map(|w| (index(&w[1]) - index(&w[0])).rem_euclid(4))
        .collect();
    if turns.iter().all(|&t| t == 1) {
        "square_cw"
    } else if turns.iter().all(|&t| t == 3) {
        "square_ccw"
    } else {
        "zigzag"
    }
}

/// Map a `MOVEMENT_TYPE_*` constant to a behavior.
///
/// Unknown movement types become a stationary, down-facing behavior.
#[must_use]
pub fn movement_behavior(movement_type: &str) -> Behavior {
    let name = movement_type
        .strip_prefix("MOVEMENT_TYPE_")
        .unwrap_or(movement_type);

    match name {
        "LOOK_AROUND" => return behavior("look_around", json!({})),
        "WANDER_AROUND" => return behavior("wander", json!({})),
        "WANDER_LEFT_AND_RIGHT" => return behavior("wander_horizontal", json!({})),
        "WANDER_UP_AND_DOWN" => return behavior("wander_vertical", json!({})),
        "WALK_DOWN_AND_UP" | "WALK_UP_AND_DOWN" => {
            return behavior("patrol", json!({"axis": "vertical"}));
        }
        "WALK_LEFT_AND_RIGHT" | "WALK_RIGHT_AND_LEFT" => {
            return behavior("patrol", json!({"axis": "horizontal"}));
        }
        "ROTATE_CLOCKWISE" => return behavior("rotate_clockwise", json!({})),
        "ROTATE_COUNTERCLOCKWISE" => return behavior("rotate_counterclockwise", json!({})),
        "INVISIBLE" => return behavior("hidden", json!({})),
        "BURIED" => return behavior("hidden", json!({"buried": true})),
        "TREE_DISGUISE" => return behavior("hidden", json!({"disguise": "tree"})),
        "MOUNTAIN_DISGUISE" => return behavior("hidden", json!({"disguise": "mountain"})),
        "BERRY_TREE_GROWTH" => return behavior("stationary", json!({"berryTree": true})),
        _ => {}
    }

    if let Some(rest) = name.strip_prefix("COPY_PLAYER") {
        let (rest, in_grass) = match rest.strip_suffix("_IN_GRASS") {
            Some(r) => (r, true),
            None => (rest, false),
        };
        let mode = match rest {
            "" => Some("normal"),
            "_OPPOSITE" => Some("opposite"),
            "_CLOCKWISE" => Some("clockwise"),
            "_COUNTERCLOCKWISE" => Some("counterclockwise"),
            _ => None,
        };
        if let Some(mode) = mode {
            let mut params = json!({"mode": mode});
            if in_grass {
                params["inGrass"] = json!(true);
            }
            return behavior("copy_player", params);
        }
    }

    if let Some(rest) = name.strip_prefix("WALK_SEQUENCE_") {
        let steps: Vec<&str> = rest.split('_').collect();
        if steps.len() == 4 && steps.iter().all(|s| direction_word(s).is_some()) {
            return behavior("patrol", json!({"pattern": walk_sequence_pattern(&steps)}));
        }
    }

    for (prefix, extra) in [
        ("WALK_IN_PLACE_", None),
        ("WALK_SLOWLY_IN_PLACE_", Some("slow")),
        ("JOG_IN_PLACE_", Some("jog")),
        ("RUN_IN_PLACE_", Some("run")),
    ] {
        if let Some(dir) = name.strip_prefix(prefix).and_then(direction_word) {
            let mut params = json!({"direction": dir});
            if let Some(flag) = extra {
                params[flag] = json!(true);
            }
            return behavior("walk_in_place", params);
        }
    }

    if let Some(rest) = name.strip_prefix("FACE_") {
        if let Some(dir) = direction_word(rest) {
            return behavior("stationary", json!({"direction": dir}));
        }
        let directions: Option<Vec<&str>> = rest
            .split('_')
            .filter(|w| *w != "AND")
            .map(direction_word)
            .collect();
        if let Some(directions) = directions.filter(|d| d.len() >= 2) {
            return behavior("look_two_ways", json!({"directions": directions}));
        }
    }

    tracing::debug!("Unknown movement type {}, using stationary", movement_type);
    behavior("stationary", json!({"direction": "down"}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_movement_behavior_families() {
        let b = movement_behavior("MOVEMENT_TYPE_FACE_LEFT");
        assert_eq!(b.id, "stationary");
        assert_eq!(b.params["direction"], "left");

        let b = movement_behavior("MOVEMENT_TYPE_FACE_DOWN_UP_AND_RIGHT");
        assert_eq!(b.id, "look_two_ways");
        assert_eq!(b.params["directions"], json!(["down", "up", "right"]));

        let b = movement_behavior("MOVEMENT_TYPE_JOG_IN_PLACE_UP");
        assert_eq!(b.id, "walk_in_place");
        assert_eq!(b.params["jog"], true);

        let b = movement_behavior("MOVEMENT_TYPE_COPY_PLAYER_CLOCKWISE_IN_GRASS");
        assert_eq!(b.params["mode"], "clockwise");
        assert_eq!(b.params["inGrass"], true);

        let b = movement_behavior("MOVEMENT_TYPE_WALK_UP_AND_DOWN");
        assert_eq!(b.params["axis"], "vertical");
    }

    #[test]
    fn test_walk_sequence_patterns() {
        let pattern = |m: &str| movement_behavior(m).params["pattern"].clone();
        assert_eq!(pattern("MOVEMENT_TYPE_WALK_SEQUENCE_UP_RIGHT_DOWN_LEFT"), "square_cw");
        assert_eq!(pattern("MOVEMENT_TYPE_WALK_SEQUENCE_LEFT_UP_RIGHT_DOWN"), "square_cw");
        assert_eq!(pattern("MOVEMENT_TYPE_WALK_SEQUENCE_DOWN_RIGHT_UP_LEFT"), "square_ccw");
        assert_eq!(pattern("MOVEMENT_TYPE_WALK_SEQUENCE_UP_LEFT_RIGHT_DOWN"), "zigzag");
    }

    #[test]
    fn test_unknown_movement_defaults() {
        let b = movement_behavior("MOVEMENT_TYPE_SOMETHING_NEW");
        assert_eq!(b.id, "stationary");
        assert_eq!(b.params["direction"], "down");
    }

    #[test]
    fn test_convert_events() {
        let doc: MapDocument = serde_json::from_value(json!({
            "id": "MAP_TEST",
            "object_events": [{
                "graphics_id": "OBJ_EVENT_GFX_BOY_1", "x": 3, "y": 4, "elevation": 3,
                "movement_type": "MOVEMENT_TYPE_WANDER_AROUND",
                "movement_range_x": 2, "movement_range_y": 1,
                "trainer_type": "TRAINER_TYPE_NORMAL", "trainer_sight_or_berry_tree_id": "4",
                "script": "Test_EventScript_Boy", "flag": "0"
            }],
            "coord_events": [
                {"type": "trigger", "x": 1, "y": 1, "elevation": 3, "var": "VAR_TEMP_1", "var_value": "2", "script": "S1"},
                {"type": "trigger", "x": 1, "y": 2, "elevation": 3, "var": "VAR_TEMP_1", "var_value": "2", "script": "0x0"},
                {"type": "trigger", "x": 1, "y": 3, "elevation": 3, "var": "VAR_TEMP_1", "var_value": "FOO", "script": "S2"},
                {"type": "weather", "x": 5, "y": 5, "elevation": 0, "weather": "COORD_EVENT_WEATHER_RAIN"}
            ],
            "bg_events": [
                {"type": "sign", "x": 0, "y": 0, "elevation": 0, "player_facing_dir": "BG_EVENT_PLAYER_FACING_NORTH", "script": "Sign"},
                {"type": "sign", "x": 0, "y": 1, "elevation": 0, "player_facing_dir": "BG_EVENT_PLAYER_FACING_ANY", "script": "Sign2"},
                {"type": "hidden_item", "x": 2, "y": 2, "elevation": 3, "item": "ITEM_POTION", "flag": "FLAG_HIDDEN_ITEM_1"},
                {"type": "secret_base", "x": 9, "y": 9, "elevation": 0, "secret_base_id": "SECRET_BASE_RED_CAVE1_1"}
            ]
        }))
        .unwrap();

        let (events, warnings) = convert_events(&doc);

        assert_eq!(events.objects.len(), 1);
        let obj = &events.objects[0];
        assert_eq!(obj.local_id, 1);
        assert_eq!(obj.behavior.id, "wander");
        assert_eq!(obj.movement_range, (2, 1));
        assert_eq!(obj.sight_range, Some(Scalar::Text("4".into())));
        assert_eq!(obj.visibility_flag, None);

        assert_eq!(events.triggers.len(), 1);
        assert_eq!(events.triggers[0].var_value, 2);
        assert_eq!(events.weather_triggers.len(), 1);

        assert_eq!(events.signs.len(), 2);
        assert_eq!(events.signs[0].facing, Some(Facing::North));
        assert_eq!(events.signs[1].facing, None);
        assert_eq!(events.hidden_items[0].quantity, 1);
        assert_eq!(events.secret_bases.len(), 1);

        assert_eq!(warnings.len(), 1);
        assert!(matches!(
            &warnings[0],
            Warning::InvalidEvent { event, .. } if event == "coord_event[2]"
        ));
    }
}
