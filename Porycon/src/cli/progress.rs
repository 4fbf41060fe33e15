//! Terminal output for the `convert` command
//!
//! Numbered step lines, a single bar that restyles itself per batch phase,
//! and a closing timing line.

use std::time::Duration;

use console::{Emoji, style};
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};

use crate::batch::BatchPhase;

pub static LOOKING_GLASS: Emoji<'_, '_> = Emoji("🔍 ", "");
pub static GEAR: Emoji<'_, '_> = Emoji("⚙️  ", "");
pub static DISK: Emoji<'_, '_> = Emoji("💾 ", "");
/// Tileset listing in the final report
pub static PICTURE: Emoji<'_, '_> = Emoji("🖼️  ", "");
pub static SPARKLE: Emoji<'_, '_> = Emoji("✨ ", "");

const TICKS: &str = "⠁⠂⠄⡀⢀⠠⠐⠈ ";

/// `[2/3] ⚙️  Converting...`
pub fn print_step(current: usize, total: usize, emoji: Emoji, msg: &str) {
    let counter = style(format!("[{current}/{total}]")).bold().dim();
    println!("{counter} {emoji}{msg}");
}

/// `✨ Done in 4s`
pub fn print_done(elapsed: Duration) {
    println!("{SPARKLE} Done in {}", HumanDuration(elapsed));
}

/// Style used while world assembly runs, which has no meaningful length.
///
/// # Panics
/// Panics if the template string is invalid (this is a compile-time constant).
#[must_use]
pub fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.cyan} {wide_msg}")
        .expect("valid template")
        .tick_chars(TICKS)
}

/// `Scanning maps MAP_ROUTE101 [#####-----] 120/518`
///
/// # Panics
/// Panics if the template string is invalid (this is a compile-time constant).
#[must_use]
pub fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{msg:40} [{bar:30.cyan/blue}] {pos:>4}/{len}")
        .expect("valid template")
        .progress_chars("#>-")
}

/// The style a phase is drawn with.
#[must_use]
pub fn style_for(phase: BatchPhase) -> ProgressStyle {
    match phase {
        BatchPhase::Assembling => spinner_style(),
        _ => bar_style(),
    }
}

/// The bar shown during conversion; hidden when `quiet`.
#[must_use]
pub fn phase_bar(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(0).with_style(spinner_style());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}
