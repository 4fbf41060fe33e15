use clap::Subcommand;
use std::path::PathBuf;

pub mod convert;
pub mod execute;
pub mod inspect;

#[derive(Subcommand)]
pub enum Commands {
    /// Convert every map of a project
    Convert {
        /// Project root (the directory containing `data/`)
        project: PathBuf,

        /// Output directory
        out: PathBuf,

        /// Options file (porycon.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Worker threads (0 = one per CPU)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Skip tile animations
        #[arg(long)]
        no_animations: bool,

        /// Register tile 0 like any other tile
        #[arg(long)]
        keep_blank_tiles: bool,

        /// Read FireRed-style 4-byte metatile attributes
        #[arg(long)]
        firered: bool,

        /// Suppress progress bar
        #[arg(short, long)]
        quiet: bool,
    },

    /// Decode a layout grid (map.bin or border.bin)
    InspectMap {
        /// Layout file
        path: PathBuf,

        /// Width in metatiles
        width: u32,

        /// Height in metatiles
        height: u32,
    },

    /// Load a tileset directory and summarize it
    InspectTileset {
        /// Tileset directory (e.g. data/tilesets/primary/general)
        dir: PathBuf,

        /// Read FireRed-style 4-byte metatile attributes
        #[arg(long)]
        firered: bool,
    },
}
