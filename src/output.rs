//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Compress
//!
//! ```text
//! IMG_0042.jpg → IMG_0042_compressed.jpg
//!     Plan: 800x1200 q0.70 jpg, single pass (medium device)
//!     Size: 2.4 MB → 186.25 KB (92% smaller)
//!     Time: 143 ms
//! ```
//!
//! On fallback the original is kept and a notice replaces the size line:
//!
//! ```text
//! broken.jpg → broken.jpg (original)
//!     Plan: 800x1200 q0.70 jpg, single pass (medium device)
//!     Notice: The image could not be compressed. The original file will be attached instead.
//!     Size: 3 MB (unchanged)
//! ```
//!
//! ## Check
//!
//! ```text
//! IMG_0001.HEIC (image/heic, 512 KB)
//!     Accepted
//!     Warning: image/heic file. It will be converted to a standard format ...
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure.

use crate::capability::{CapabilityLevel, HardwareHints};
use crate::compress::{CompressionOutcome, CompressionReport};
use crate::types::RawImage;
use crate::validation::{ValidationOutcome, ValidationWarning};

const SIZE_UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

/// Human-readable binary size with up to two decimals.
///
/// ```
/// # use receipt_press::output::format_file_size;
/// assert_eq!(format_file_size(0), "0 B");
/// assert_eq!(format_file_size(1536), "1.5 KB");
/// assert_eq!(format_file_size(3 * 1024 * 1024), "3 MB");
/// ```
pub fn format_file_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let text = format!("{value:.2}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    format!("{text} {}", SIZE_UNITS[unit])
}

fn warning_lines(warnings: &[ValidationWarning]) -> impl Iterator<Item = String> + '_ {
    warnings.iter().map(|w| format!("    Warning: {w}"))
}

/// Format the summary of one `compress` call.
pub fn format_report(source: &RawImage, report: &CompressionReport) -> Vec<String> {
    let mut lines = Vec::new();
    let plan = &report.plan;
    let path = if plan.staging_enabled {
        "staged"
    } else {
        "single pass"
    };
    let plan_line = format!(
        "    Plan: {}x{} q{:.2} {}, {path} ({} device)",
        plan.max_width,
        plan.max_height,
        plan.quality,
        plan.output_format.extension(),
        report.capability
    );

    match &report.outcome {
        CompressionOutcome::Compressed { image, result } => {
            lines.push(format!("{} → {}", source.name, image.name));
            lines.push(plan_line);
            let change = if result.ratio >= 0 {
                format!("{}% smaller", result.ratio)
            } else {
                format!("{}% larger", -result.ratio)
            };
            lines.push(format!(
                "    Size: {} → {} ({change})",
                format_file_size(result.original_size),
                format_file_size(result.compressed_size)
            ));
            lines.push(format!("    Time: {} ms", result.duration_ms));
        }
        CompressionOutcome::Fallback { image, result, .. } => {
            lines.push(format!("{} → {} (original)", source.name, image.name));
            lines.push(plan_line);
            if let Some(notice) = report.outcome.advisory() {
                lines.push(format!("    Notice: {notice}"));
            }
            lines.push(format!(
                "    Size: {} (unchanged)",
                format_file_size(result.original_size)
            ));
        }
    }
    lines.extend(warning_lines(&report.warnings));
    lines
}

pub fn print_report(source: &RawImage, report: &CompressionReport) {
    for line in format_report(source, report) {
        println!("{}", line);
    }
}

/// Format the validation gate's verdict for `check`.
pub fn format_validation(source: &RawImage, outcome: &ValidationOutcome) -> Vec<String> {
    let mut lines = vec![format!(
        "{} ({}, {})",
        source.name,
        source.mime,
        format_file_size(source.len())
    )];
    match &outcome.error {
        Some(err) => lines.push(format!("    Rejected: {err}")),
        None => {
            lines.push("    Accepted".to_string());
            lines.extend(warning_lines(&outcome.warnings));
        }
    }
    lines
}

pub fn print_validation(source: &RawImage, outcome: &ValidationOutcome) {
    for line in format_validation(source, outcome) {
        println!("{}", line);
    }
}

pub fn format_capability(hints: HardwareHints, level: CapabilityLevel) -> Vec<String> {
    let cores = hints
        .cores
        .map_or_else(|| "unknown".to_string(), |c| c.to_string());
    let memory = hints
        .memory_gb
        .map_or_else(|| "unknown".to_string(), |gb| format!("{gb:.1} GB"));
    vec![
        format!("Capability: {level}"),
        format!("    Cores: {cores}"),
        format!("    Memory: {memory}"),
    ]
}

pub fn print_capability(hints: HardwareHints, level: CapabilityLevel) {
    for line in format_capability(hints, level) {
        println!("{}", line);
    }
}
