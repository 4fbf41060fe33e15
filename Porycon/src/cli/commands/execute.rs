//! Command execution implementations

use super::Commands;
use super::convert::{self, ConvertArgs};
use super::inspect;

impl Commands {
    /// Execute the selected command.
    ///
    /// # Errors
    /// Returns an error if the underlying command fails.
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            Commands::Convert {
                project,
                out,
                config,
                workers,
                no_animations,
                keep_blank_tiles,
                firered,
                quiet,
            } => convert::execute(&ConvertArgs {
                project,
                out,
                config: config.as_deref(),
                workers: *workers,
                no_animations: *no_animations,
                keep_blank_tiles: *keep_blank_tiles,
                firered: *firered,
                quiet: *quiet,
            }),
            Commands::InspectMap {
                path,
                width,
                height,
            } => inspect::map(path, *width, *height),
            Commands::InspectTileset { dir, firered } => inspect::tileset(dir, *firered),
        }
    }
}
