//! Pure calculation functions for output dimensions, memory estimates and
//! the last-moment quality adjustment.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::Quality;
use crate::config::FinalizationConfig;
use crate::types::bytes_to_mb;

/// Bytes per RGBA pixel on a rendering surface.
const BYTES_PER_PIXEL: u64 = 4;

/// Bytes per pixel of the uncompressed RGB output used for size estimates.
const RGB_BYTES_PER_PIXEL: u64 = 3;

/// Decoded source plus the surface it is redrawn into.
const SURFACE_OVERHEAD_FACTOR: u64 = 2;

/// Fit `source` inside `max`, preserving aspect ratio and never upscaling.
///
/// Width is checked first: if it exceeds the bound both edges are scaled by
/// `max_w / w`; then, if the height still exceeds its bound, both are scaled
/// by `max_h / h`. Results are rounded to the nearest pixel and kept at
/// least 1.
///
/// # Examples
/// ```
/// # use receipt_press::imaging::target_dimensions;
/// // 4000x3000 landscape into 800x1200 → width-bound
/// assert_eq!(target_dimensions((4000, 3000), (800, 1200)), (800, 600));
///
/// // Already small enough → unchanged
/// assert_eq!(target_dimensions((640, 480), (800, 1200)), (640, 480));
/// ```
pub fn target_dimensions(source: (u32, u32), max: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    if src_w == 0 || src_h == 0 {
        return source;
    }
    let (max_w, max_h) = (f64::from(max.0), f64::from(max.1));

    let mut w = f64::from(src_w);
    let mut h = f64::from(src_h);

    if w > max_w {
        h *= max_w / w;
        w = max_w;
    }
    if h > max_h {
        w *= max_h / h;
        h = max_h;
    }

    let out_w = (w.round() as u32).clamp(1, src_w);
    let out_h = (h.round() as u32).clamp(1, src_h);
    (out_w, out_h)
}

/// Estimated peak memory for redrawing a `width`x`height` image.
pub fn estimate_surface_bytes(width: u32, height: u32) -> u64 {
    u64::from(width) * u64::from(height) * BYTES_PER_PIXEL * SURFACE_OVERHEAD_FACTOR
}

/// Uncompressed RGB size of a `width`x`height` output in KB.
pub fn estimate_rgb_kb(width: u32, height: u32) -> f64 {
    (u64::from(width) * u64::from(height) * RGB_BYTES_PER_PIXEL) as f64 / 1024.0
}

/// Lower `quality` for one pass, just before encoding.
///
/// The first matching rule picks the reduction:
///
/// 1. pass input above `aggressive_input_mb`: `aggressive_delta`
/// 2. pass input above `moderate_input_mb`: `moderate_delta`
/// 3. raw RGB output above `target_size_kb * oversize_factor`: `oversize_delta`
///
/// The result is floored at `min_quality` but never exceeds `quality`, so a
/// plan that already sits below the floor is left alone.
///
/// # Examples
/// ```
/// # use receipt_press::config::FinalizationConfig;
/// # use receipt_press::imaging::{Quality, finalize_quality};
/// let config = FinalizationConfig::default();
///
/// // 800x600 is about 1406 KB of raw RGB, more than twice the 500 KB target
/// let q = finalize_quality(Quality::new(0.7), 300 * 1024, (800, 600), &config);
/// assert_eq!(q.value(), 0.5);
///
/// // 640x480 stays under it
/// let q = finalize_quality(Quality::new(0.7), 300 * 1024, (640, 480), &config);
/// assert_eq!(q.value(), 0.7);
/// ```
pub fn finalize_quality(
    quality: Quality,
    input_bytes: u64,
    output: (u32, u32),
    config: &FinalizationConfig,
) -> Quality {
    let input_mb = bytes_to_mb(input_bytes);
    let delta = if input_mb > config.aggressive_input_mb {
        config.aggressive_delta
    } else if input_mb > config.moderate_input_mb {
        config.moderate_delta
    } else if estimate_rgb_kb(output.0, output.1) > config.target_size_kb * config.oversize_factor
    {
        config.oversize_delta
    } else {
        return quality;
    };

    let q = quality.value();
    let reduced = (q - delta).max(config.min_quality).min(q);
    // two decimals, so 0.7 - 0.2 lands on 0.5 exactly
    Quality::new((reduced * 100.0).round() / 100.0)
}
