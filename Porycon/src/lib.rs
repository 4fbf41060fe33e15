#![allow(non_snake_case)]
//! # porycon
//!
//! Converts pokeemerald-style map projects into layered, deduplicated tile
//! maps: one atlas per tileset holding exactly the tile variants the maps use,
//! and per-map layers of global tile ids.
//!
//! ## Supported Inputs
//!
//! - **Layouts** - `map.bin` / `border.bin` metatile grids
//! - **Tilesets** - `metatiles.bin`, `metatile_attributes.bin` (Emerald or
//!   FireRed), `tiles.4bpp` or indexed `tiles.png`, `.gbapal`/`.pal` palettes
//! - **Maps** - `map.json` headers, connections, warps and events
//! - **Animations** - numbered frame images under a tileset's `anim/` folder
//!
//! ## Quick Start
//!
//! ### Converting a Project
//!
//! ```no_run
//! use porycon::prelude::*;
//!
//! let set = MapSet::discover("pokeemerald")?;
//! let result = run(&set, &ConvertOptions::default())?;
//! println!("{} maps converted", result.success_count());
//!
//! porycon::export::write_batch(&result, "out/")?;
//! # Ok::<(), porycon::Error>(())
//! ```
//!
//! ### Reading Raw Formats
//!
//! ```no_run
//! use porycon::formats::read_layout;
//!
//! let grid = read_layout("data/layouts/LittlerootTown/map.bin", 20, 20, "map.bin")?;
//! println!("first metatile: {}", grid.cells[0].metatile_id);
//! # Ok::<(), porycon::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `porycon` command-line binary

pub mod error;
pub mod warning;
pub mod formats;
pub mod tileset;
pub mod metatile;
pub mod atlas;
pub mod animation;
pub mod warp;
pub mod events;
pub mod project;
pub mod config;
pub mod batch;
pub mod export;

// Re-exports for convenience
pub use error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{Error, ErrorKind, Result};
    pub use crate::warning::{UnresolvedWarpWarning, Warning};
    pub use crate::formats::{BlockEntry, LayoutGrid, TileRef};
    pub use crate::tileset::{Tileset, TilesetCategory};
    pub use crate::metatile::{Layer, LayerType, Metatile};
    pub use crate::atlas::{IdentifierTable, TilesetAtlas};
    pub use crate::animation::{AnimationCatalog, AnimationDefinition};
    pub use crate::project::MapSet;
    pub use crate::config::ConvertOptions;

    // Batch entry points
    pub use crate::batch::{
        run, run_with_progress, BatchPhase, BatchProgress, BatchResult, ConvertedMap,
        MapConversionResult, MapOutcome,
    };
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;
