//! Non-fatal conditions raised during conversion
//!
//! Warnings never abort a map or tileset. They are attached to the result they
//! concern and logged at `warn` level when raised.

use serde::Serialize;
use thiserror::Error;

/// A warp whose destination could not be found in the warp lookup.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("warp {warp_index} on {map_id} -> {dest_map}[{dest_warp}]: {reason}")]
pub struct UnresolvedWarpWarning {
    /// Map that owns the warp.
    pub map_id: String,
    /// Index of the warp within its map.
    pub warp_index: usize,
    /// Destination map id as declared.
    pub dest_map: String,
    /// Destination warp id as declared (may be non-numeric).
    pub dest_warp: String,
    /// Why resolution failed.
    pub reason: UnresolvedReason,
}

/// Why a warp could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedReason {
    /// Destination map is not part of the batch.
    UnknownMap,
    /// Destination map exists but has no warp with that index.
    UnknownSlot,
    /// Destination warp id is not numeric (e.g. `WARP_ID_DYNAMIC`).
    NonNumericId,
}

impl std::fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::UnknownMap => "destination map not found",
            Self::UnknownSlot => "destination warp slot not found",
            Self::NonNumericId => "destination warp id is not numeric",
        })
    }
}

/// Any non-fatal condition.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// See [`UnresolvedWarpWarning`].
    #[error(transparent)]
    UnresolvedWarp(UnresolvedWarpWarning),

    /// A cataloged animation's frame folder is absent; the pattern was skipped.
    #[error("tileset {tileset}: animation {pattern} skipped, folder {folder} not found")]
    AnimationPatternMissing {
        /// Tileset being built.
        tileset: String,
        /// Pattern name from the catalog.
        pattern: String,
        /// Folder that was expected.
        folder: String,
    },

    /// A frame image could not be read; the pattern was skipped.
    #[error("tileset {tileset}: animation {pattern} skipped: {message}")]
    AnimationFrameUnreadable {
        /// Tileset being built.
        tileset: String,
        /// Pattern name from the catalog.
        pattern: String,
        /// Underlying failure.
        message: String,
    },

    /// A tile id beyond the loaded graphics; rendered transparent.
    #[error("tileset {tileset}: tile {tile_id} has no graphics, rendered transparent")]
    TileOutOfRange {
        /// Tileset being built.
        tileset: String,
        /// The tile id.
        tile_id: u16,
    },

    /// A secondary tileset is used with more than one primary.
    #[error("secondary tileset {secondary} paired with {chosen} (also used with {others:?})")]
    AmbiguousPrimaryPairing {
        /// The secondary tileset.
        secondary: String,
        /// Primary used for palette and graphics cross-referencing.
        chosen: String,
        /// Other primaries seen.
        others: Vec<String>,
    },

    /// An event entry with unparsable fields was skipped.
    #[error("map {map_id}: {event} skipped: {message}")]
    InvalidEvent {
        /// Owning map.
        map_id: String,
        /// Event description, e.g. `coord_event[2]`.
        event: String,
        /// What was wrong.
        message: String,
    },

    /// A connection targets a map that is not in the batch.
    #[error("map {map_id}: connection to unknown map {target}")]
    MissingConnection {
        /// Map declaring the connection.
        map_id: String,
        /// Target map id.
        target: String,
    },
}

impl Warning {
    /// Emit this warning through `tracing` and hand it back.
    #[must_use]
    pub fn logged(self) -> Self {
        tracing::warn!("{self}");
        self
    }
}

impl From<UnresolvedWarpWarning> for Warning {
    fn from(w: UnresolvedWarpWarning) -> Self {
        Self::UnresolvedWarp(w)
    }
}
