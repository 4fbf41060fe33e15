//! World placement from map connections
//!
//! Maps are positioned by a breadth-first walk over `up`/`down`/`left`/`right`
//! connections starting from one map at (0, 0). Positions are in pixels with
//! 16-pixel metatiles. Connection offsets are in 8-pixel units; the matching
//! reverse connection's offset is subtracted so both sides agree.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;

use crate::formats::common::{METATILE_SIZE, TILE_SIZE};
use crate::project::ConnectionDef;
use crate::warning::Warning;

/// Map geometry needed for placement.
#[derive(Debug, Clone)]
pub struct WorldNode<'a> {
    pub map_id: &'a str,
    /// Width in metatiles.
    pub width: u32,
    /// Height in metatiles.
    pub height: u32,
    pub connections: &'a [ConnectionDef],
}

/// A placed map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorldMap {
    pub map_id: String,
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

/// Placement result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorldLayout {
    pub start_map: Option<String>,
    /// Placed maps in visit order.
    pub maps: Vec<WorldMap>,
    /// Maps not reachable from the start map.
    pub unplaced: Vec<String>,
    #[serde(skip)]
    pub warnings: Vec<Warning>,
}

fn step(direction: &str) -> Option<(i64, i64)> {
    match direction {
        "up" => Some((0, -1)),
        "down" => Some((0, 1)),
        "left" => Some((-1, 0)),
        "right" => Some((1, 0)),
        _ => None,
    }
}

/// Place maps starting from `start`, or the first node if `start` is `None`
/// or unknown.
#[must_use]
pub fn build_world(nodes: &[WorldNode<'_>], start: Option<&str>) -> WorldLayout {
    let by_id: HashMap<&str, &WorldNode<'_>> = nodes.iter().map(|n| (n.map_id, n)).collect();

    let start_node = match start.and_then(|s| by_id.get(s)) {
        Some(node) => *node,
        None => {
            if let Some(s) = start {
                tracing::warn!("World start map {} not found, using first map", s);
            }
            match nodes.first() {
                Some(node) => node,
                None => return WorldLayout::default(),
            }
        }
    };

    let metatile = i64::from(METATILE_SIZE);
    let unit = i64::from(TILE_SIZE);
    let mut layout = WorldLayout {
        start_map: Some(start_node.map_id.to_string()),
        ..Default::default()
    };
    let mut visited: HashSet<&str> = HashSet::from([start_node.map_id]);
    let mut reported: HashSet<(&str, &str)> = HashSet::new();
    let mut queue = VecDeque::from([(start_node, 0i64, 0i64)]);

    while let Some((current, cx, cy)) = queue.pop_front() {
        layout.maps.push(WorldMap {
            map_id: current.map_id.to_string(),
            x: cx,
            y: cy,
            width: current.width,
            height: current.height,
        });

        for conn in current.connections {
            let Some((dx, dy)) = step(&conn.direction) else {
                continue;
            };
            let Some(&target) = by_id.get(conn.map.as_str()) else {
                if reported.insert((current.map_id, conn.map.as_str())) {
                    layout.warnings.push(
                        Warning::MissingConnection {
                            map_id: current.map_id.to_string(),
                            target: conn.map.clone(),
                        }
                        .logged(),
                    );
                }
                continue;
            };
            if !visited.insert(target.map_id) {
                continue;
            }

            let offset = i64::from(conn.offset) * unit;
            let reverse = target
                .connections
                .iter()
                .find(|c| c.map == current.map_id)
                .map_or(0, |c| i64::from(c.offset) * unit);
            let along = offset - reverse;

            let (nx, ny) = if dx > 0 {
                (cx + i64::from(current.width) * metatile, cy + along)
            } else if dx < 0 {
                (cx - i64::from(target.width) * metatile, cy + along)
            } else if dy > 0 {
                (cx + along, cy + i64::from(current.height) * metatile)
            } else {
                (cx + along, cy - i64::from(target.height) * metatile)
            };
            queue.push_back((target, nx, ny));
        }
    }

    layout.unplaced = nodes
        .iter()
        .filter(|n| !visited.contains(n.map_id))
        .map(|n| n.map_id.to_string())
        .collect();

    tracing::debug!(
        "World placed {} maps, {} unreachable",
        layout.maps.len(),
        layout.unplaced.len()
    );
    layout
}
