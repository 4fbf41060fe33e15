//! Warp resolution
//!
//! Every map's warp list is recorded into a [`WarpLookupBuilder`] while maps
//! are scanned, including maps whose layout later fails, so warps pointing at
//! them can still resolve. The builder is frozen into a [`WarpLookup`] before
//! any map is emitted.

pub mod world;

use std::collections::HashMap;

use serde::Serialize;

pub use world::{WorldLayout, WorldMap, WorldNode, build_world};

use crate::project::WarpEventDef;
use crate::warning::{UnresolvedReason, UnresolvedWarpWarning};

/// Where a warp slot sits on its map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WarpGeometry {
    pub x: i32,
    pub y: i32,
    pub elevation: u8,
}

/// Mutable collector of warp slots.
#[derive(Debug, Default)]
pub struct WarpLookupBuilder {
    maps: HashMap<String, Vec<WarpGeometry>>,
}

impl WarpLookupBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the warp slots of one map. Slot `i` is the `i`th entry.
    pub fn record(&mut self, map_id: &str, warps: &[WarpEventDef]) {
        let slots = warps
            .iter()
            .map(|w| WarpGeometry {
                x: w.x,
                y: w.y,
                elevation: w.elevation,
            })
            .collect();
        self.maps.insert(map_id.to_string(), slots);
    }

    /// Absorb another builder.
    pub fn merge(&mut self, other: WarpLookupBuilder) {
        self.maps.extend(other.maps);
    }

    /// Freeze the collected slots.
    #[must_use]
    pub fn finish(self) -> WarpLookup {
        WarpLookup { maps: self.maps }
    }
}

/// Read-only warp slot table.
#[derive(Debug, Clone, Default)]
pub struct WarpLookup {
    maps: HashMap<String, Vec<WarpGeometry>>,
}

impl WarpLookup {
    #[must_use]
    pub fn contains_map(&self, map_id: &str) -> bool {
        self.maps.contains_key(map_id)
    }

    /// Geometry of `map_id`'s warp slot `index`.
    #[must_use]
    pub fn get(&self, map_id: &str, index: usize) -> Option<WarpGeometry> {
        self.maps.get(map_id).and_then(|slots| slots.get(index)).copied()
    }

    #[must_use]
    pub fn map_count(&self) -> usize {
        self.maps.len()
    }
}

/// A warp with its destination looked up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedWarp {
    pub index: usize,
    pub x: i32,
    pub y: i32,
    pub elevation: u8,
    pub dest_map: String,
    pub dest_warp: String,
    /// `None` when the destination could not be resolved.
    pub destination: Option<WarpGeometry>,
}

/// Resolve all warps declared by `map_id`.
///
/// Unresolvable warps are kept with no destination and reported alongside.
#[must_use]
pub fn resolve_warps(
    map_id: &str,
    warps: &[WarpEventDef],
    lookup: &WarpLookup,
) -> (Vec<ResolvedWarp>, Vec<UnresolvedWarpWarning>) {
    let mut resolved = Vec::with_capacity(warps.len());
    let mut warnings = Vec::new();

    for (index, warp) in warps.iter().enumerate() {
        let dest = resolve_one(warp, lookup);
        if let Err(reason) = dest {
            warnings.push(UnresolvedWarpWarning {
                map_id: map_id.to_string(),
                warp_index: index,
                dest_map: warp.dest_map.clone(),
                dest_warp: warp.dest_warp_id.to_string(),
                reason,
            });
        }
        resolved.push(ResolvedWarp {
            index,
            x: warp.x,
            y: warp.y,
            elevation: warp.elevation,
            dest_map: warp.dest_map.clone(),
            dest_warp: warp.dest_warp_id.to_string(),
            destination: dest.ok(),
        });
    }
    (resolved, warnings)
}

fn resolve_one(warp: &WarpEventDef, lookup: &WarpLookup) -> Result<WarpGeometry, UnresolvedReason> {
    let slot = warp
        .dest_warp_id
        .as_int()
        .and_then(|v| usize::try_from(v).ok())
        .ok_or(UnresolvedReason::NonNumericId)?;
    if !lookup.contains_map(&warp.dest_map) {
        return Err(UnresolvedReason::UnknownMap);
    }
    lookup
        .get(&warp.dest_map, slot)
        .ok_or(UnresolvedReason::UnknownSlot)
}
