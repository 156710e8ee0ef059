//! Option selector: original size + capability → compression plan.
//!
//! Two phases, both driven by [`PolicyConfig`] tables:
//!
//! 1. **Size**: the first row of `selection.tiers` whose `min_mb` the input
//!    reaches supplies the resolution bound, quality and staging preference.
//! 2. **Capability**: `low` clamps the resolution, lowers quality and drops
//!    staging above the memory-risk size; `high` raises quality; `medium`
//!    leaves the plan alone.

use crate::capability::CapabilityLevel;
use crate::config::{PolicyConfig, SizeTier};
use serde::{Deserialize, Serialize};

/// Raster encodings the pipeline can produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
    /// Lossless WebP; the quality factor is ignored.
    WebP,
}

impl OutputFormat {
    pub fn mime(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::WebP => "image/webp",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::WebP => "webp",
        }
    }
}

/// Concrete settings for one compression invocation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompressionPlan {
    pub max_width: u32,
    pub max_height: u32,
    /// Encoder quality factor in `[0.1, 1.0]`.
    pub quality: f32,
    pub output_format: OutputFormat,
    pub staging_enabled: bool,
}

/// Used only if a hand-built config bypassed [`PolicyConfig::validate`].
const FALLBACK_TIER: SizeTier = SizeTier {
    min_mb: 0.0,
    max_width: 800,
    max_height: 1200,
    quality: 0.7,
    staging: false,
};

/// Round to two decimals so repeated deltas don't accumulate float noise.
fn round_quality(q: f32) -> f32 {
    ((q * 100.0).round() / 100.0).clamp(0.1, 1.0)
}

/// Phase one: pick the size tier.
pub fn size_plan(size_mb: f64, config: &PolicyConfig) -> CompressionPlan {
    let tiers = &config.selection.tiers;
    let tier = tiers
        .iter()
        .find(|t| size_mb >= t.min_mb)
        .or_else(|| tiers.last())
        .copied()
        .unwrap_or(FALLBACK_TIER);

    CompressionPlan {
        max_width: tier.max_width,
        max_height: tier.max_height,
        quality: round_quality(tier.quality),
        output_format: config.selection.output_format,
        staging_enabled: tier.staging && size_mb >= config.staging.min_mb,
    }
}

/// Phase two: adjust a size plan for the device.
pub fn adjust_for_capability(
    mut plan: CompressionPlan,
    size_mb: f64,
    level: CapabilityLevel,
    config: &PolicyConfig,
) -> CompressionPlan {
    let adj = &config.adjustment;
    match level {
        CapabilityLevel::Low => {
            plan.max_width = plan.max_width.min(adj.low_max_resolution.width);
            plan.max_height = plan.max_height.min(adj.low_max_resolution.height);
            plan.quality = round_quality((plan.quality - adj.low_quality_delta).max(adj.min_quality));
            if size_mb > adj.memory_risk_mb {
                plan.staging_enabled = false;
            }
        }
        CapabilityLevel::High => {
            plan.quality = round_quality((plan.quality + adj.high_quality_delta).min(adj.max_quality));
        }
        CapabilityLevel::Medium => {}
    }
    plan
}

/// Build the plan for an input of `size_mb` on a device of `level`.
pub fn select_plan(size_mb: f64, level: CapabilityLevel, config: &PolicyConfig) -> CompressionPlan {
    let plan = adjust_for_capability(size_plan(size_mb, config), size_mb, level, config);
    log::debug!("plan for {size_mb:.1} MB on {level} device: {plan:?}");
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BYTES_PER_MB, bytes_to_mb};
    use proptest::prelude::*;

    fn plan(size_mb: f64, level: CapabilityLevel) -> CompressionPlan {
        select_plan(size_mb, level, &PolicyConfig::default())
    }

    #[test]
    fn small_file_medium_device_uses_default_tier() {
        let p = plan(2.0, CapabilityLevel::Medium);
        assert_eq!((p.max_width, p.max_height), (800, 1200));
        assert_eq!(p.quality, 0.7);
        assert!(!p.staging_enabled);
        assert_eq!(p.output_format, OutputFormat::Jpeg);
    }

    #[test]
    fn medium_tier_never_stages() {
        let p = plan(25.0, CapabilityLevel::Medium);
        assert_eq!((p.max_width, p.max_height), (800, 1200));
        assert_eq!(p.quality, 0.5);
        assert!(!p.staging_enabled);
    }

    #[test]
    fn large_file_stages() {
        let p = plan(55.0, CapabilityLevel::Medium);
        assert_eq!((p.max_width, p.max_height), (700, 1000));
        assert_eq!(p.quality, 0.4);
        assert!(p.staging_enabled);
    }

    #[test]
    fn very_large_file_gets_smallest_bound() {
        let p = plan(90.0, CapabilityLevel::Medium);
        assert_eq!((p.max_width, p.max_height), (600, 900));
        assert_eq!(p.quality, 0.3);
        assert!(p.staging_enabled);
    }

    #[test]
    fn staging_boundary_is_one_byte() {
        let threshold = (50.0 * BYTES_PER_MB) as u64;
        assert!(!plan(bytes_to_mb(threshold - 1), CapabilityLevel::Medium).staging_enabled);
        assert!(plan(bytes_to_mb(threshold + 1), CapabilityLevel::Medium).staging_enabled);
    }

    #[test]
    fn low_capability_very_large_png() {
        // 90 MB on a low device: clamped, quality floored, staging forced off
        let p = plan(90.0, CapabilityLevel::Low);
        assert!(p.max_width <= 600 && p.max_height <= 900);
        assert_eq!(p.quality, 0.3);
        assert!(!p.staging_enabled);
    }

    #[test]
    fn low_capability_small_file_reduces_quality() {
        let p = plan(2.0, CapabilityLevel::Low);
        assert_eq!((p.max_width, p.max_height), (600, 900));
        assert_eq!(p.quality, 0.5);
        assert!(!p.staging_enabled);
    }

    #[test]
    fn low_capability_keeps_staging_below_memory_risk() {
        let mut config = PolicyConfig::default();
        config.staging.min_mb = 10.0;
        config.selection.tiers[2].staging = true;
        let p = select_plan(25.0, CapabilityLevel::Low, &config);
        assert!(p.staging_enabled);
        let risky = select_plan(35.0, CapabilityLevel::Low, &config);
        assert!(!risky.staging_enabled);
    }

    #[test]
    fn high_capability_raises_quality_with_ceiling() {
        assert_eq!(plan(2.0, CapabilityLevel::High).quality, 0.8);
        assert_eq!(plan(55.0, CapabilityLevel::High).quality, 0.5);

        let mut config = PolicyConfig::default();
        config.selection.tiers[3].quality = 0.88;
        assert_eq!(select_plan(1.0, CapabilityLevel::High, &config).quality, 0.9);
    }

    #[test]
    fn high_capability_keeps_resolution_and_staging() {
        let p = plan(55.0, CapabilityLevel::High);
        assert_eq!((p.max_width, p.max_height), (700, 1000));
        assert!(p.staging_enabled);
    }

    #[test]
    fn output_format_follows_config() {
        let mut config = PolicyConfig::default();
        config.selection.output_format = OutputFormat::WebP;
        let p = select_plan(1.0, CapabilityLevel::Medium, &config);
        assert_eq!(p.output_format.extension(), "webp");
        assert_eq!(p.output_format.mime(), "image/webp");
    }

    proptest! {
        #[test]
        fn quality_always_in_range(size in 0.0f64..100.0, lvl in 0usize..3) {
            let level = [CapabilityLevel::Low, CapabilityLevel::Medium, CapabilityLevel::High][lvl];
            let p = plan(size, level);
            prop_assert!((0.1..=1.0).contains(&p.quality));
            prop_assert!(p.max_width > 0 && p.max_height > 0);
        }

        #[test]
        fn staging_requires_large_input(size in 0.0f64..100.0, lvl in 0usize..3) {
            let level = [CapabilityLevel::Low, CapabilityLevel::Medium, CapabilityLevel::High][lvl];
            let p = plan(size, level);
            if p.staging_enabled {
                prop_assert!(size >= 50.0);
                prop_assert!(level != CapabilityLevel::Low);
            }
        }
    }
}
