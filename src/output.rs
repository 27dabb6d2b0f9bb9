//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Every file leads with its positional index and the `source → output`
//! mapping; what happened to it (dimensions, size, quality, cache status) is
//! shown as indented context lines. Budget misses are called out inline so a
//! scan down the right-hand side finds them.
//!
//! # Output Format
//!
//! ## Compress
//!
//! ```text
//! 001 logo.png → logo.webp
//!     1400x700, 83.4 KB at q95
//! 002 hero.jpg → hero.webp
//!     1400x933, 212.9 KB at q60 (over budget 200 KB)
//! 003 menu/banner.png → menu/banner.webp
//!     cached
//! 004 broken.jpg → broken.webp
//!     failed: Image processing failed: Failed to decode image: ...
//!
//! 2 compressed, 1 over budget, 1 failed
//! ```
//!
//! ## Inspect
//!
//! ```text
//! hero.jpg
//!     Format: jpg
//!     File size: 2456.1 KB
//!     Dimensions: 4000x3000
//!     Output dimensions: 1400x1050 (max 1400)
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::batch::{BatchEvent, BatchResult, FileStatus};
use crate::imaging::{Dimensions, Stage, TargetSize, size_in_kb};
use std::path::Path;

/// Format a 0-based job index as a 1-based, 3-digit zero-padded position.
fn format_index(index: usize) -> String {
    format!("{:0>3}", index + 1)
}

fn format_kb(bytes: usize) -> String {
    format!("{:.1} KB", size_in_kb(bytes))
}

fn format_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

// ============================================================================
// Compress
// ============================================================================

/// Format one finished job as display lines.
pub fn format_batch_event(event: &BatchEvent, target: TargetSize) -> Vec<String> {
    let header = format!(
        "{} {} → {}",
        format_index(event.index),
        format_path(&event.source),
        format_path(&event.output)
    );

    let detail = match &event.status {
        FileStatus::Compressed(file) => {
            let mut line = format!(
                "    {}x{}, {}",
                file.width,
                file.height,
                format_kb(file.size_bytes)
            );
            match (file.stage, file.quality) {
                (Stage::Passthrough, _) | (_, None) => line.push_str(" (already WebP)"),
                (_, Some(q)) => line.push_str(&format!(" at {q}")),
            }
            if !file.target_met {
                line.push_str(&format!(" (over budget {} KB)", target.kb()));
            }
            line
        }
        FileStatus::Cached => "    cached".to_string(),
        FileStatus::Copied => "    copied".to_string(),
        FileStatus::Failed(message) => format!("    failed: {message}"),
    };

    vec![header, detail]
}

/// One-line tally of a batch: `3 compressed, 1 over budget, 1 failed`.
///
/// Zero counts other than `compressed` are left out; cached and copied files
/// are reported by the cache line instead.
pub fn format_batch_summary(result: &BatchResult) -> String {
    let mut parts = vec![format!("{} compressed", result.compressed())];
    let over = result.over_budget();
    if over > 0 {
        parts.push(format!("{over} over budget"));
    }
    let failed = result.failed();
    if failed > 0 {
        parts.push(format!("{failed} failed"));
    }
    parts.join(", ")
}

pub fn print_batch_summary(result: &BatchResult) {
    println!();
    println!("{}", format_batch_summary(result));
    println!("Cache: {}", result.cache_stats);
}

// ============================================================================
// Inspect
// ============================================================================

/// What `inspect` knows about an input file.
#[derive(Debug, Clone, PartialEq)]
pub struct InspectReport<'a> {
    pub path: &'a Path,
    pub format: Option<&'static str>,
    pub size_bytes: usize,
    pub dimensions: Dimensions,
    pub clamped: Dimensions,
    pub max_dimension: u32,
}

pub fn format_inspect(report: &InspectReport<'_>) -> Vec<String> {
    let mut lines = vec![format_path(report.path)];
    lines.push(format!(
        "    Format: {}",
        report.format.unwrap_or("unknown")
    ));
    lines.push(format!("    File size: {}", format_kb(report.size_bytes)));
    lines.push(format!(
        "    Dimensions: {}x{}",
        report.dimensions.width, report.dimensions.height
    ));
    let note = if report.clamped == report.dimensions {
        " (unchanged)".to_string()
    } else {
        format!(" (max {})", report.max_dimension)
    };
    lines.push(format!(
        "    Output dimensions: {}x{}{}",
        report.clamped.width, report.clamped.height, note
    ));
    lines
}

pub fn print_inspect(report: &InspectReport<'_>) {
    for line in format_inspect(report) {
        println!("{}", line);
    }
}
