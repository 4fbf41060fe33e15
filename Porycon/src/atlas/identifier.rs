//! Identifier tables
//!
//! Identifiers are assigned 1..=N in the sealed set's sort order, so the table
//! depends only on which variants were registered, never on registration order.

use std::collections::HashMap;

use serde::{Serialize, Serializer};
use serde::ser::SerializeSeq;

use super::usage::SealedUsage;
use crate::formats::TileRef;

/// Immutable mapping from tile variant to identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierTable {
    tileset: String,
    /// `entries[i]` has identifier `i + 1`.
    entries: Vec<TileRef>,
    index: HashMap<TileRef, u32>,
}

impl IdentifierTable {
    /// Build the table for a sealed usage set.
    #[must_use]
    pub fn build(usage: &SealedUsage) -> Self {
        let entries = usage.tiles().to_vec();
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, tile)| (*tile, i as u32 + 1))
            .collect();
        Self {
            tileset: usage.tileset().to_string(),
            entries,
            index,
        }
    }

    #[must_use]
    pub fn tileset(&self) -> &str {
        &self.tileset
    }

    /// Identifier of a variant.
    #[must_use]
    pub fn get(&self, tile: &TileRef) -> Option<u32> {
        self.index.get(tile).copied()
    }

    /// Variant with a given identifier.
    #[must_use]
    pub fn tile(&self, identifier: u32) -> Option<TileRef> {
        identifier
            .checked_sub(1)
            .and_then(|i| self.entries.get(i as usize))
            .copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(identifier, variant)` pairs in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, TileRef)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, t)| (i as u32 + 1, *t))
    }
}

#[derive(Serialize)]
struct Entry {
    id: u32,
    #[serde(flatten)]
    tile: TileRef,
}

impl Serialize for IdentifierTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.entries.len()))?;
        for (id, tile) in self.iter() {
            seq.serialize_element(&Entry { id, tile })?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::usage::{LocalUsage, UsageArena};
    use pretty_assertions::assert_eq;

    fn sealed(order: &[TileRef]) -> SealedUsage {
        let mut local = LocalUsage::new();
        for t in order {
            local.register("general", *t);
        }
        let mut arena = UsageArena::new();
        arena.merge(local);
        arena.seal().remove("general").unwrap()
    }

    #[test]
    fn test_identifiers_independent_of_order() {
        let a = TileRef::new(10, 0, false, false);
        let b = TileRef::new(10, 0, true, false);
        let c = TileRef::new(12, 1, false, false);

        let first = IdentifierTable::build(&sealed(&[c, a, b]));
        let second = IdentifierTable::build(&sealed(&[b, b, c, a, a]));
        assert_eq!(first, second);

        assert_eq!(first.get(&a), Some(1));
        assert_eq!(first.get(&b), Some(2));
        assert_eq!(first.get(&c), Some(3));
        assert_eq!(first.tile(3), Some(c));
        assert_eq!(first.tile(0), None);
        assert_eq!(first.tile(4), None);
    }

    #[test]
    fn test_serialized_form() {
        let table = IdentifierTable::build(&sealed(&[TileRef::new(7, 2, false, true)]));
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"id": 1, "tile_id": 7, "palette": 2, "flip_h": false, "flip_v": true}
            ])
        );
    }
}
