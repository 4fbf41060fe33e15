//! CLI command for batch conversion

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use anyhow::Context;
use console::style;

use crate::batch::{self, BatchProgress, BatchResult};
use crate::cli::progress::{
    DISK, GEAR, LOOKING_GLASS, PICTURE, phase_bar, print_done, print_step, style_for,
};
use crate::config::ConvertOptions;
use crate::export;
use crate::formats::AttributeFormat;
use crate::project::MapSet;

/// Errors listed before the rest are summarized.
const MAX_LISTED_ERRORS: usize = 10;

/// Parsed `convert` arguments.
pub struct ConvertArgs<'a> {
    pub project: &'a Path,
    pub out: &'a Path,
    pub config: Option<&'a Path>,
    pub workers: Option<usize>,
    pub no_animations: bool,
    pub keep_blank_tiles: bool,
    pub firered: bool,
    pub quiet: bool,
}

fn options(args: &ConvertArgs<'_>) -> anyhow::Result<ConvertOptions> {
    let mut options = match args.config {
        Some(path) => ConvertOptions::load(path)
            .with_context(|| format!("Failed to load options from {}", path.display()))?,
        None => ConvertOptions::default(),
    };
    if let Some(workers) = args.workers {
        options.workers = workers;
    }
    if args.no_animations {
        options.emit_animations = false;
    }
    if args.keep_blank_tiles {
        options.keep_blank_tiles = true;
    }
    if args.firered {
        options.attribute_format = AttributeFormat::FireRed;
    }
    Ok(options)
}

pub fn execute(args: &ConvertArgs<'_>) -> anyhow::Result<()> {
    let start = Instant::now();
    let options = options(args)?;

    print_step(1, 3, LOOKING_GLASS, "Discovering maps...");
    let set = MapSet::discover(args.project)
        .with_context(|| format!("Failed to read project at {}", args.project.display()))?;
    println!(
        "      {} maps, {} layouts",
        set.len(),
        set.layouts.len()
    );

    print_step(2, 3, GEAR, "Converting...");
    let pb = phase_bar(args.quiet);
    let last_phase = AtomicUsize::new(usize::MAX);
    let result = batch::run_with_progress(&set, &options, &|progress: &BatchProgress| {
        let phase = progress.phase as usize;
        if last_phase.swap(phase, Ordering::SeqCst) != phase {
            pb.set_style(style_for(progress.phase));
            pb.set_length(progress.total as u64);
        }
        pb.set_position(progress.current as u64);
        let desc = progress.current_item.as_deref().unwrap_or_default();
        pb.set_message(format!("{} {}", progress.phase.as_str(), desc));
    })
    .context("Conversion failed")?;
    pb.finish_and_clear();

    print_step(3, 3, DISK, "Writing output...");
    export::write_batch(&result, args.out)
        .with_context(|| format!("Failed to write output to {}", args.out.display()))?;

    report(&result);
    print_done(start.elapsed());
    Ok(())
}

fn report(result: &BatchResult) {
    let summary = result.summary();
    println!();
    println!(
        "Maps: {} converted, {} failed",
        style(summary.maps_succeeded).green(),
        style(summary.maps_failed).red()
    );
    if !summary.tilesets.is_empty() {
        println!("{PICTURE}Tilesets:");
    }
    for tileset in &summary.tilesets {
        if tileset.built {
            println!(
                "  {:24} {:>5} tiles  {:>3} animations",
                tileset.name, tileset.unique_tiles, tileset.animations
            );
        } else {
            println!("  {:24} {}", tileset.name, style("failed").red());
        }
    }
    if summary.warnings > 0 {
        println!("Warnings: {}", style(summary.warnings).yellow());
    }

    for error in summary.errors.iter().take(MAX_LISTED_ERRORS) {
        println!("  {} {} {}: {}", style("x").red(), error.scope, error.id, error.message);
    }
    if summary.errors.len() > MAX_LISTED_ERRORS {
        println!("  ... and {} more (see summary.json)", summary.errors.len() - MAX_LISTED_ERRORS);
    }
}
