//! Tile usage accumulation
//!
//! Workers each fill their own [`LocalUsage`]. At the scan barrier every local
//! set is merged into a [`UsageArena`], which is then consumed by
//! [`UsageArena::seal`]. Only a [`SealedUsage`] can be turned into an
//! identifier table, so a table can never be built from a set that is still
//! growing.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::formats::TileRef;

/// Tile variants registered by one worker (or one map), keyed by tileset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalUsage {
    sets: HashMap<String, HashSet<TileRef>>,
}

impl LocalUsage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a tile variant for `tileset`. Returns `true` if it was new.
    pub fn register(&mut self, tileset: &str, tile: TileRef) -> bool {
        if let Some(set) = self.sets.get_mut(tileset) {
            return set.insert(tile);
        }
        self.sets
            .entry(tileset.to_string())
            .or_default()
            .insert(tile)
    }

    /// Absorb another local set.
    pub fn absorb(&mut self, other: LocalUsage) {
        for (tileset, tiles) in other.sets {
            self.sets.entry(tileset).or_default().extend(tiles);
        }
    }

    /// Distinct variants registered for `tileset`.
    #[must_use]
    pub fn count(&self, tileset: &str) -> usize {
        self.sets.get(tileset).map_or(0, HashSet::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sets.values().all(HashSet::is_empty)
    }

    /// Tilesets with at least one registration.
    pub fn tilesets(&self) -> impl Iterator<Item = &str> {
        self.sets.keys().map(String::as_str)
    }
}

/// The merge target for all local usage sets of a batch.
#[derive(Debug, Default)]
pub struct UsageArena {
    sets: BTreeMap<String, BTreeSet<TileRef>>,
}

impl UsageArena {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure `tileset` is sealed even if no map registers anything for it.
    pub fn declare(&mut self, tileset: &str) {
        self.sets.entry(tileset.to_string()).or_default();
    }

    /// Union a local set into the arena.
    pub fn merge(&mut self, local: LocalUsage) {
        for (tileset, tiles) in local.sets {
            self.sets.entry(tileset).or_default().extend(tiles);
        }
    }

    /// Freeze the arena. No registration is possible afterwards.
    #[must_use]
    pub fn seal(self) -> BTreeMap<String, SealedUsage> {
        self.sets
            .into_iter()
            .map(|(tileset, tiles)| {
                let sealed = SealedUsage {
                    tileset: tileset.clone(),
                    tiles: tiles.into_iter().collect(),
                };
                (tileset, sealed)
            })
            .collect()
    }
}

/// A frozen, sorted usage set for one tileset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedUsage {
    tileset: String,
    /// Sorted by (tile id, palette, flip h, flip v), no duplicates.
    tiles: Vec<TileRef>,
}

impl SealedUsage {
    #[must_use]
    pub fn tileset(&self) -> &str {
        &self.tileset
    }

    #[must_use]
    pub fn tiles(&self) -> &[TileRef] {
        &self.tiles
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_is_idempotent() {
        let mut local = LocalUsage::new();
        let t = TileRef::new(10, 0, false, false);
        assert!(local.register("general", t));
        assert!(!local.register("general", t));
        assert_eq!(local.count("general"), 1);
    }

    #[test]
    fn test_seal_sorts_and_dedups() {
        let mut a = LocalUsage::new();
        a.register("general", TileRef::new(12, 1, false, false));
        a.register("general", TileRef::new(10, 0, true, false));
        let mut b = LocalUsage::new();
        b.register("general", TileRef::new(10, 0, false, false));
        b.register("general", TileRef::new(12, 1, false, false));
        b.register("petalburg", TileRef::new(600, 7, false, false));

        let mut arena = UsageArena::new();
        arena.declare("unused");
        arena.merge(a);
        arena.merge(b);
        let sealed = arena.seal();

        assert_eq!(sealed.len(), 3);
        assert!(sealed["unused"].is_empty());
        assert_eq!(
            sealed["general"].tiles(),
            &[
                TileRef::new(10, 0, false, false),
                TileRef::new(10, 0, true, false),
                TileRef::new(12, 1, false, false),
            ]
        );
        assert_eq!(sealed["petalburg"].len(), 1);
    }
}
