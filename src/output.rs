//! CLI output formatting for all pipeline stages.
//!
//! Output is **pair-centric**: every line block leads with a positional index
//! and the `variant/size` it concerns, with files shown as indented context
//! lines underneath. Sizes are human-readable (`12.3 kB`, decimal units).
//!
//! # Output Format
//!
//! ## makesprites
//!
//! ```text
//! 001 susan/300x250 → txtsprite.png (2 images, 63x30, 1.2 kB)
//! 002 susan/tablet: skipped (excluded size)
//! Sprites: 1 written, 1 skipped
//! ```
//!
//! ## build
//!
//! ```text
//! 001 susan/300x250 → dev/susan/300x250
//!     Assets: 4 files
//!     screen.css: 3 sources, 1.1 kB
//!     scripts.min.js: 2 sources, 540 B
//!     Template: index.html
//! Built 1 pair
//! ```
//!
//! ## zip
//!
//! ```text
//! 001 Acme Spring susan 300x250 v1.2.0.zip (3.4 kB)
//!     index.html: 1.2 kB → 402 B
//!     assets/logo.png: 2.1 kB → 2.1 kB
//! Archived 1 pair, 3.4 kB
//! ```
//!
//! # Architecture
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::archive::ArchiveReport;
use crate::bundle::PairBuild;
use crate::clean::CleanReport;
use crate::pipeline::{CheckReport, PairSprite, Stage, StageReport};
use crate::sprite::{SkipReason, SpriteOutcome};
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

/// Human-readable byte count, decimal units, three significant digits.
///
/// ```text
/// 512      → 512 B
/// 1500     → 1.5 kB
/// 12345    → 12.3 kB
/// 1234567  → 1.23 MB
/// ```
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "kB", "MB", "GB", "TB"];
    if bytes < 1000 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }
    let decimals = if value < 10.0 {
        2
    } else if value < 100.0 {
        1
    } else {
        0
    };
    let text = format!("{value:.decimals$}");
    let text = if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text.as_str()
    };
    format!("{text} {}", UNITS[unit])
}

/// `path` relative to `root` when it lies below it.
fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Stage banner printed when a stage settles.
pub fn stage_header(stage: Stage) -> String {
    let what = match stage {
        Stage::Clean => "Cleaning build and distribution folders",
        Stage::MakeSprites => "Building sprite sheets",
        Stage::Build => "Building bundles",
        Stage::Zip => "Archiving",
    };
    format!("==> {}: {}", stage.name(), what)
}

// ============================================================================
// clean
// ============================================================================

pub fn format_clean_output(report: &CleanReport) -> Vec<String> {
    vec![format!(
        "Removed {} from dev, {} from dist",
        plural(report.dev, "entry", "entries"),
        plural(report.dist, "entry", "entries"),
    )]
}

// ============================================================================
// makesprites
// ============================================================================

fn skip_reason(reason: SkipReason) -> &'static str {
    match reason {
        SkipReason::NoSourceDir => "no assets/sprites folder",
        SkipReason::NoImages => "no images in assets/sprites",
        SkipReason::ExcludedSize => "excluded size",
    }
}

pub fn format_sprites_output(sprites: &[PairSprite]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut written = 0;
    for (i, sprite) in sprites.iter().enumerate() {
        let index = format_index(i + 1);
        match &sprite.outcome {
            SpriteOutcome::Written {
                image,
                count,
                width,
                height,
                bytes,
                ..
            } => {
                written += 1;
                lines.push(format!(
                    "{index} {} → {} ({}, {width}x{height}, {})",
                    sprite.pair,
                    file_name(image),
                    plural(*count, "image", "images"),
                    format_bytes(*bytes),
                ));
            }
            SpriteOutcome::Skipped(reason) => {
                lines.push(format!(
                    "{index} {}: skipped ({})",
                    sprite.pair,
                    skip_reason(*reason)
                ));
            }
        }
    }
    lines.push(format!(
        "Sprites: {} written, {} skipped",
        written,
        sprites.len() - written
    ));
    lines
}

// ============================================================================
// build
// ============================================================================

pub fn format_build_output(builds: &[PairBuild], root: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, build) in builds.iter().enumerate() {
        lines.push(format!(
            "{} {} → {}",
            format_index(i + 1),
            build.pair,
            display_path(&build.out_dir, root)
        ));
        let ctx = indent(1);
        lines.push(format!("{ctx}Assets: {}", plural(build.assets, "file", "files")));
        for concat in [&build.stylesheet, &build.script] {
            lines.push(format!(
                "{ctx}{}: {}, {}",
                file_name(&concat.path),
                plural(concat.parts.len(), "source", "sources"),
                format_bytes(concat.bytes)
            ));
        }
        lines.push(format!("{ctx}Template: {}", file_name(&build.template)));
    }
    lines.push(format!("Built {}", plural(builds.len(), "pair", "pairs")));
    lines
}

// ============================================================================
// zip
// ============================================================================

pub fn format_zip_output(archives: &[ArchiveReport]) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, archive) in archives.iter().enumerate() {
        lines.push(format!(
            "{} {} ({})",
            format_index(i + 1),
            archive.name,
            format_bytes(archive.bytes)
        ));
        for entry in archive.entries.iter().filter(|e| !e.is_dir) {
            lines.push(format!(
                "{}{}: {} → {}",
                indent(1),
                entry.name,
                format_bytes(entry.size),
                format_bytes(entry.compressed)
            ));
        }
    }
    let total: u64 = archives.iter().map(|a| a.bytes).sum();
    lines.push(format!(
        "Archived {}, {}",
        plural(archives.len(), "pair", "pairs"),
        format_bytes(total)
    ));
    lines
}

// ============================================================================
// check
// ============================================================================

pub fn format_check_output(report: &CheckReport) -> Vec<String> {
    let mut lines = vec!["Pairs".to_string()];
    for (i, pair) in report.pairs.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), pair));
    }
    for (title, items) in [("Problems", &report.problems), ("Warnings", &report.warnings)] {
        if items.is_empty() {
            continue;
        }
        lines.push(String::new());
        lines.push(title.to_string());
        lines.extend(items.iter().map(|item| format!("{}{item}", indent(1))));
    }
    lines.push(String::new());
    lines.push(if report.is_ok() {
        "Ready to build".to_string()
    } else {
        format!("{} found", plural(report.problems.len(), "problem", "problems"))
    });
    lines
}

pub fn print_check_output(report: &CheckReport) {
    for line in format_check_output(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// Lines for any settled stage, header first.
pub fn format_stage_output(report: &StageReport, root: &Path) -> Vec<String> {
    let mut lines = vec![stage_header(report.stage())];
    lines.extend(match report {
        StageReport::Clean(clean) => format_clean_output(clean),
        StageReport::Sprites(sprites) => format_sprites_output(sprites),
        StageReport::Build(builds) => format_build_output(builds, root),
        StageReport::Zip(archives) => format_zip_output(archives),
    });
    lines
}

pub fn print_stage_output(report: &StageReport, root: &Path) {
    for line in format_stage_output(report, root) {
        println!("{}", line);
    }
}
