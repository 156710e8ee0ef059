//! Parameter types for encode passes.
//!
//! These structs describe *what* one pass should produce, not *how*. They are
//! the interface between the executor (which decides the passes) and the
//! [`codec`](super::codec) (which does the pixel work), so the executor can be
//! tested against a mock codec.
//!
//! ## Types
//!
//! - [`Quality`]: Encoder quality factor in `[0.1, 1.0]`. Clamped on construction.
//! - [`PassParams`]: Resolution bound, quality and output format for one pass.

use crate::config::PassPreset;
use crate::plan::{CompressionPlan, OutputFormat};
use serde::Serialize;

/// Quality factor for lossy encoding (0.1-1.0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quality(f32);

impl Quality {
    pub const MIN: f32 = 0.1;
    pub const MAX: f32 = 1.0;

    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            return Self::default();
        }
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// The factor on the JPEG encoder's 1-100 scale.
    pub fn jpeg_scale(self) -> u8 {
        (self.0 * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(0.7)
    }
}

/// Parameters for one encode pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PassParams {
    pub max_width: u32,
    pub max_height: u32,
    pub quality: Quality,
    pub format: OutputFormat,
}

impl PassParams {
    pub fn from_plan(plan: &CompressionPlan) -> Self {
        Self {
            max_width: plan.max_width,
            max_height: plan.max_height,
            quality: Quality::new(plan.quality),
            format: plan.output_format,
        }
    }

    pub fn from_preset(preset: &PassPreset, format: OutputFormat) -> Self {
        Self {
            max_width: preset.max_width,
            max_height: preset.max_height,
            quality: Quality::new(preset.quality),
            format,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0.0).value(), 0.1);
        assert_eq!(Quality::new(0.5).value(), 0.5);
        assert_eq!(Quality::new(1.5).value(), 1.0);
        assert_eq!(Quality::new(f32::NAN), Quality::default());
    }

    #[test]
    fn quality_default_is_standard() {
        assert_eq!(Quality::default().value(), 0.7);
    }

    #[test]
    fn jpeg_scale_maps_to_percent() {
        assert_eq!(Quality::new(0.3).jpeg_scale(), 30);
        assert_eq!(Quality::new(0.1).jpeg_scale(), 10);
        assert_eq!(Quality::new(1.0).jpeg_scale(), 100);
    }

    #[test]
    fn pass_from_preset_keeps_format() {
        let preset = PassPreset {
            max_width: 1200,
            max_height: 1800,
            quality: 0.5,
        };
        let params = PassParams::from_preset(&preset, OutputFormat::Png);
        assert_eq!((params.max_width, params.max_height), (1200, 1800));
        assert_eq!(params.quality.value(), 0.5);
        assert_eq!(params.format, OutputFormat::Png);
    }
}
