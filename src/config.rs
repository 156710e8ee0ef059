//! Compression policy configuration.
//!
//! Every threshold, preset and delta the pipeline uses lives here as data, so
//! the selection table can be tuned without touching the state machine in
//! [`compress`](crate::compress). A user `receipt-press.toml` overrides the
//! stock defaults key by key.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [validation]
//! max_file_mb = 100.0           # Hard ceiling, larger inputs are rejected
//! large_file_warning_mb = 50.0  # Advisory above this size
//!
//! [capability]
//! high_cores = 8
//! high_memory_gb = 8.0
//! medium_cores = 4
//! medium_memory_gb = 4.0
//!
//! [selection]
//! output_format = "jpeg"        # jpeg | png | webp
//!
//! [[selection.tiers]]           # First tier whose min_mb <= size wins
//! min_mb = 80.0
//! max_width = 600
//! max_height = 900
//! quality = 0.3
//! staging = true
//!
//! [adjustment]
//! low_quality_delta = 0.2
//! high_quality_delta = 0.1
//! memory_risk_mb = 30.0
//!
//! [staging]
//! min_mb = 50.0
//! refine_limit_mb = 5.0
//!
//! [finalization]                # Applied to every pass, floored at min_quality
//! aggressive_input_mb = 10.0    # Pass input above this: quality - 0.3
//! moderate_input_mb = 5.0       # Pass input above this: quality - 0.2
//! target_size_kb = 500.0        # Estimated RGB output above 2x this: quality - 0.2
//! ```
//!
//! Sizes are binary megabytes (`bytes / 1024 / 1024`). Unknown keys are
//! rejected to catch typos early.

use crate::plan::OutputFormat;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Full compression policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyConfig {
    /// Accept/reject rules and advisory thresholds.
    pub validation: ValidationConfig,
    /// Hardware thresholds for the capability classifier.
    pub capability: CapabilityConfig,
    /// Size-based selection table.
    pub selection: SelectionConfig,
    /// Capability-based adjustments applied after selection.
    pub adjustment: AdjustmentConfig,
    /// Two-pass pipeline presets.
    pub staging: StagingConfig,
    /// Decoder and surface limits.
    pub decoding: DecodingConfig,
    /// Per-pass quality reduction applied by the codec just before encoding.
    pub finalization: FinalizationConfig,
}

/// A named `(width, height)` upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Resolution bound plus quality factor for a fixed encode pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PassPreset {
    pub max_width: u32,
    pub max_height: u32,
    pub quality: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationConfig {
    /// Declared MIME types accepted for upload.
    pub allowed_types: Vec<String>,
    /// Phone-camera formats that get an advisory and the alternate decode path.
    pub legacy_types: Vec<String>,
    /// Inputs larger than this are rejected.
    pub max_file_mb: f64,
    /// Inputs larger than this are accepted with a warning.
    pub large_file_warning_mb: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            allowed_types: [
                "image/jpeg",
                "image/jpg",
                "image/png",
                "image/webp",
                "image/heic",
                "image/heif",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            legacy_types: vec!["image/heic".to_string(), "image/heif".to_string()],
            max_file_mb: 100.0,
            large_file_warning_mb: 50.0,
        }
    }
}

impl ValidationConfig {
    pub fn is_legacy(&self, mime: &str) -> bool {
        self.legacy_types.iter().any(|t| t.eq_ignore_ascii_case(mime))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CapabilityConfig {
    pub high_cores: usize,
    pub high_memory_gb: f64,
    pub medium_cores: usize,
    pub medium_memory_gb: f64,
    /// Substituted when the platform does not report a core count.
    pub default_cores: usize,
    /// Substituted when the platform does not report memory.
    pub default_memory_gb: f64,
}

impl Default for CapabilityConfig {
    fn default() -> Self {
        Self {
            high_cores: 8,
            high_memory_gb: 8.0,
            medium_cores: 4,
            medium_memory_gb: 4.0,
            default_cores: 2,
            default_memory_gb: 4.0,
        }
    }
}

/// One row of the size-based selection table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SizeTier {
    /// Row applies when the input is at least this many MB.
    pub min_mb: f64,
    pub max_width: u32,
    pub max_height: u32,
    pub quality: f32,
    /// Staging preference; only honoured at or above `staging.min_mb`.
    pub staging: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SelectionConfig {
    /// Ordered by descending `min_mb`; the last row must start at 0.
    pub tiers: Vec<SizeTier>,
    pub output_format: OutputFormat,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            tiers: vec![
                SizeTier {
                    min_mb: 80.0,
                    max_width: 600,
                    max_height: 900,
                    quality: 0.3,
                    staging: true,
                },
                SizeTier {
                    min_mb: 50.0,
                    max_width: 700,
                    max_height: 1000,
                    quality: 0.4,
                    staging: true,
                },
                SizeTier {
                    min_mb: 20.0,
                    max_width: 800,
                    max_height: 1200,
                    quality: 0.5,
                    staging: false,
                },
                SizeTier {
                    min_mb: 0.0,
                    max_width: 800,
                    max_height: 1200,
                    quality: 0.7,
                    staging: true,
                },
            ],
            output_format: OutputFormat::Jpeg,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdjustmentConfig {
    /// Resolution ceiling on low-capability devices.
    pub low_max_resolution: Resolution,
    pub low_quality_delta: f32,
    pub high_quality_delta: f32,
    pub min_quality: f32,
    pub max_quality: f32,
    /// On low capability, staging is forced off above this size.
    pub memory_risk_mb: f64,
}

impl Default for AdjustmentConfig {
    fn default() -> Self {
        Self {
            low_max_resolution: Resolution::new(600, 900),
            low_quality_delta: 0.2,
            high_quality_delta: 0.1,
            min_quality: 0.3,
            max_quality: 0.9,
            memory_risk_mb: 30.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StagingConfig {
    /// Staging only applies to inputs at or above this size.
    pub min_mb: f64,
    /// Coarse first pass, independent of the plan.
    pub first_stage: PassPreset,
    /// Stage-one output below this size is refined with the plan's own values.
    pub refine_limit_mb: f64,
    /// Second pass used when stage one is still above `refine_limit_mb`.
    pub aggressive: PassPreset,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            min_mb: 50.0,
            first_stage: PassPreset {
                max_width: 1200,
                max_height: 1800,
                quality: 0.5,
            },
            refine_limit_mb: 5.0,
            aggressive: PassPreset {
                max_width: 600,
                max_height: 900,
                quality: 0.3,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecodingConfig {
    /// Decoded images above this pixel count are refused.
    pub max_decoded_pixels: u64,
    /// Estimated surface memory above this logs a warning.
    pub surface_memory_warning_mb: f64,
}

impl Default for DecodingConfig {
    fn default() -> Self {
        Self {
            max_decoded_pixels: 100_000_000,
            surface_memory_warning_mb: 500.0,
        }
    }
}

/// Quality reduction for one encode pass, chosen from the pass input size and
/// the size of the raw RGB output. The first matching rule wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FinalizationConfig {
    /// Pass inputs larger than this get `aggressive_delta` off.
    pub aggressive_input_mb: f64,
    pub aggressive_delta: f32,
    /// Pass inputs larger than this get `moderate_delta` off.
    pub moderate_input_mb: f64,
    pub moderate_delta: f32,
    /// Output size the encoder aims for.
    pub target_size_kb: f64,
    /// Raw RGB output above `target_size_kb * oversize_factor` gets `oversize_delta` off.
    pub oversize_factor: f64,
    pub oversize_delta: f32,
    /// Reductions never go below this.
    pub min_quality: f32,
}

impl Default for FinalizationConfig {
    fn default() -> Self {
        Self {
            aggressive_input_mb: 10.0,
            aggressive_delta: 0.3,
            moderate_input_mb: 5.0,
            moderate_delta: 0.2,
            target_size_kb: 500.0,
            oversize_factor: 2.0,
            oversize_delta: 0.2,
            min_quality: 0.3,
        }
    }
}

fn check_size(name: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::Validation(format!(
            "{name} must be a finite, non-negative number (got {value})"
        )));
    }
    Ok(())
}

fn check_delta(name: &str, delta: f32) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&delta) {
        return Err(ConfigError::Validation(format!(
            "{name} must be between 0 and 1 (got {delta})"
        )));
    }
    Ok(())
}

fn check_quality(name: &str, q: f32) -> Result<(), ConfigError> {
    if !(0.1..=1.0).contains(&q) {
        return Err(ConfigError::Validation(format!(
            "{name} must be between 0.1 and 1.0 (got {q})"
        )));
    }
    Ok(())
}

fn check_bounds(name: &str, width: u32, height: u32) -> Result<(), ConfigError> {
    if width == 0 || height == 0 {
        return Err(ConfigError::Validation(format!(
            "{name} resolution must be non-zero"
        )));
    }
    Ok(())
}

impl PolicyConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let v = &self.validation;
        if v.allowed_types.is_empty() {
            return Err(ConfigError::Validation(
                "validation.allowed_types must not be empty".into(),
            ));
        }
        if let Some(t) = v
            .legacy_types
            .iter()
            .find(|t| !v.allowed_types.iter().any(|a| a.eq_ignore_ascii_case(t)))
        {
            return Err(ConfigError::Validation(format!(
                "validation.legacy_types entry {t} is not in allowed_types"
            )));
        }
        check_size("validation.max_file_mb", v.max_file_mb)?;
        check_size("validation.large_file_warning_mb", v.large_file_warning_mb)?;
        if v.max_file_mb == 0.0 || v.large_file_warning_mb > v.max_file_mb {
            return Err(ConfigError::Validation(
                "validation.large_file_warning_mb must not exceed a positive max_file_mb".into(),
            ));
        }

        let tiers = &self.selection.tiers;
        if tiers.is_empty() {
            return Err(ConfigError::Validation(
                "selection.tiers must not be empty".into(),
            ));
        }
        if tiers.windows(2).any(|w| w[0].min_mb <= w[1].min_mb) {
            return Err(ConfigError::Validation(
                "selection.tiers must be sorted by descending min_mb".into(),
            ));
        }
        if tiers.last().is_some_and(|t| t.min_mb != 0.0) {
            return Err(ConfigError::Validation(
                "the last selection tier must have min_mb = 0".into(),
            ));
        }
        for (i, tier) in tiers.iter().enumerate() {
            check_size(&format!("selection.tiers[{i}].min_mb"), tier.min_mb)?;
            check_bounds(&format!("selection.tiers[{i}]"), tier.max_width, tier.max_height)?;
            check_quality(&format!("selection.tiers[{i}].quality"), tier.quality)?;
        }

        let a = &self.adjustment;
        check_bounds(
            "adjustment.low_max_resolution",
            a.low_max_resolution.width,
            a.low_max_resolution.height,
        )?;
        check_quality("adjustment.min_quality", a.min_quality)?;
        check_quality("adjustment.max_quality", a.max_quality)?;
        if a.min_quality > a.max_quality {
            return Err(ConfigError::Validation(
                "adjustment.min_quality must not exceed max_quality".into(),
            ));
        }
        check_delta("adjustment.low_quality_delta", a.low_quality_delta)?;
        check_delta("adjustment.high_quality_delta", a.high_quality_delta)?;
        check_size("adjustment.memory_risk_mb", a.memory_risk_mb)?;

        let s = &self.staging;
        check_size("staging.min_mb", s.min_mb)?;
        check_size("staging.refine_limit_mb", s.refine_limit_mb)?;
        let presets = [
            ("staging.first_stage", s.first_stage),
            ("staging.aggressive", s.aggressive),
        ];
        for (name, preset) in presets {
            check_bounds(name, preset.max_width, preset.max_height)?;
            check_quality(&format!("{name}.quality"), preset.quality)?;
        }
        if s.refine_limit_mb <= 0.0 {
            return Err(ConfigError::Validation(
                "staging.refine_limit_mb must be positive".into(),
            ));
        }

        if self.decoding.max_decoded_pixels == 0 {
            return Err(ConfigError::Validation(
                "decoding.max_decoded_pixels must be non-zero".into(),
            ));
        }
        check_size(
            "decoding.surface_memory_warning_mb",
            self.decoding.surface_memory_warning_mb,
        )?;

        let f = &self.finalization;
        check_size("finalization.aggressive_input_mb", f.aggressive_input_mb)?;
        check_size("finalization.moderate_input_mb", f.moderate_input_mb)?;
        check_size("finalization.target_size_kb", f.target_size_kb)?;
        check_size("finalization.oversize_factor", f.oversize_factor)?;
        check_delta("finalization.aggressive_delta", f.aggressive_delta)?;
        check_delta("finalization.moderate_delta", f.moderate_delta)?;
        check_delta("finalization.oversize_delta", f.oversize_delta)?;
        check_quality("finalization.min_quality", f.min_quality)?;
        if f.moderate_input_mb > f.aggressive_input_mb {
            return Err(ConfigError::Validation(
                "finalization.moderate_input_mb must not exceed aggressive_input_mb".into(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(PolicyConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely, so an overlay
///   `tiers` array replaces the whole selection table.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Parse a sparse TOML document over the stock defaults and validate it.
pub fn parse_config(content: &str) -> Result<PolicyConfig, ConfigError> {
    let overlay: toml::Value = toml::from_str(content)?;
    let merged = merge_toml(stock_defaults_value()?, overlay);
    let config: PolicyConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load a policy file; a missing path yields the stock defaults.
pub fn load_config(path: &Path) -> Result<PolicyConfig, ConfigError> {
    if !path.exists() {
        log::debug!("no policy file at {}, using defaults", path.display());
        return Ok(PolicyConfig::default());
    }
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Returns a fully-commented stock policy file.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# receipt-press compression policy
# =================================
#
# Every key is optional; omitted keys keep the values shown here.
# Sizes are binary megabytes (bytes / 1024 / 1024).

[validation]
allowed_types = ["image/jpeg", "image/jpg", "image/png", "image/webp", "image/heic", "image/heif"]
# Phone-camera formats: accepted with an advisory, decoded via content sniffing first.
legacy_types = ["image/heic", "image/heif"]
max_file_mb = 100.0
large_file_warning_mb = 50.0

[capability]
# high: cores >= high_cores AND memory >= high_memory_gb; medium likewise; else low.
high_cores = 8
high_memory_gb = 8.0
medium_cores = 4
medium_memory_gb = 4.0
# Used when the platform does not report a value.
default_cores = 2
default_memory_gb = 4.0

[selection]
output_format = "jpeg"   # jpeg | png | webp (png and webp are lossless; quality is ignored)

# First row whose min_mb <= input size wins. Keep rows sorted by descending
# min_mb and end with min_mb = 0.
[[selection.tiers]]
min_mb = 80.0
max_width = 600
max_height = 900
quality = 0.3
staging = true

[[selection.tiers]]
min_mb = 50.0
max_width = 700
max_height = 1000
quality = 0.4
staging = true

[[selection.tiers]]
min_mb = 20.0
max_width = 800
max_height = 1200
quality = 0.5
staging = false

[[selection.tiers]]
min_mb = 0.0
max_width = 800
max_height = 1200
quality = 0.7
staging = true

[adjustment]
low_max_resolution = { width = 600, height = 900 }
low_quality_delta = 0.2
high_quality_delta = 0.1
min_quality = 0.3
max_quality = 0.9
# Low-capability devices skip the second allocation above this size.
memory_risk_mb = 30.0

[staging]
min_mb = 50.0
first_stage = { max_width = 1200, max_height = 1800, quality = 0.5 }
refine_limit_mb = 5.0
aggressive = { max_width = 600, max_height = 900, quality = 0.3 }

[decoding]
max_decoded_pixels = 100000000
surface_memory_warning_mb = 500.0

[finalization]
# Applied by the encoder to every pass; the first matching rule wins and the
# result never drops below min_quality. Sizes refer to that pass's input.
aggressive_input_mb = 10.0
aggressive_delta = 0.3
moderate_input_mb = 5.0
moderate_delta = 0.2
# Raw RGB output (width * height * 3) above target_size_kb * oversize_factor.
target_size_kb = 500.0
oversize_factor = 2.0
oversize_delta = 0.2
min_quality = 0.3
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_config_is_valid() {
        PolicyConfig::default().validate().unwrap();
    }

    #[test]
    fn stock_toml_matches_defaults() {
        let parsed: PolicyConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(parsed, PolicyConfig::default());
    }

    #[test]
    fn sparse_override_keeps_other_defaults() {
        let config = parse_config(
            r#"
            [adjustment]
            memory_risk_mb = 40.0
            "#,
        )
        .unwrap();
        assert_eq!(config.adjustment.memory_risk_mb, 40.0);
        assert_eq!(config.adjustment.min_quality, 0.3);
        assert_eq!(config.selection.tiers.len(), 4);
    }

    #[test]
    fn tier_array_replaces_whole_table() {
        let config = parse_config(
            r#"
            [[selection.tiers]]
            min_mb = 0.0
            max_width = 1024
            max_height = 1024
            quality = 0.8
            staging = false
            "#,
        )
        .unwrap();
        assert_eq!(config.selection.tiers.len(), 1);
        assert_eq!(config.selection.tiers[0].max_width, 1024);
    }

    #[test]
    fn unknown_keys_rejected() {
        let err = parse_config("[staging]\nfirst_pass = 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn quality_out_of_range_rejected() {
        let mut config = PolicyConfig::default();
        config.staging.aggressive.quality = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(msg)) if msg.contains("staging.aggressive")
        ));
    }

    #[test]
    fn unsorted_tiers_rejected() {
        let mut config = PolicyConfig::default();
        config.selection.tiers.swap(0, 1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn last_tier_must_start_at_zero() {
        let mut config = PolicyConfig::default();
        config.selection.tiers.pop();
        assert!(config.validate().is_err());
    }

    #[test]
    fn legacy_type_must_be_allowed() {
        let mut config = PolicyConfig::default();
        config.validation.legacy_types.push("image/x-raw".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn min_quality_above_max_rejected() {
        let mut config = PolicyConfig::default();
        config.adjustment.min_quality = 0.95;
        assert!(config.validate().is_err());
    }

    #[test]
    fn nan_sizes_rejected() {
        let mut config = PolicyConfig::default();
        config.validation.max_file_mb = f64::NAN;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(msg)) if msg.contains("validation.max_file_mb")
        ));

        let mut config = PolicyConfig::default();
        config.validation.large_file_warning_mb = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = PolicyConfig::default();
        config.staging.refine_limit_mb = f64::INFINITY;
        assert!(config.validate().is_err());

        let mut config = PolicyConfig::default();
        config.selection.tiers[1].min_mb = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn staging_threshold_checked() {
        let mut config = PolicyConfig::default();
        config.staging.min_mb = -1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(msg)) if msg.contains("staging.min_mb")
        ));

        config.staging.min_mb = f64::NAN;
        assert!(config.validate().is_err());

        config.staging.min_mb = 0.0;
        config.validate().unwrap();
    }

    #[test]
    fn finalization_overrides_and_checks() {
        let config = parse_config("[finalization]\nmin_quality = 0.4\n").unwrap();
        assert_eq!(config.finalization.min_quality, 0.4);
        assert_eq!(config.finalization.aggressive_input_mb, 10.0);

        let mut config = PolicyConfig::default();
        config.finalization.moderate_input_mb = 20.0;
        assert!(config.validate().is_err());

        let mut config = PolicyConfig::default();
        config.finalization.oversize_delta = -0.1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(msg)) if msg.contains("finalization.oversize_delta")
        ));
    }

    #[test]
    fn load_missing_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("nope.toml")).unwrap();
        assert_eq!(config, PolicyConfig::default());
    }

    #[test]
    fn load_file_from_disk() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("receipt-press.toml");
        fs::write(&path, "[selection]\noutput_format = \"png\"\n").unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.selection.output_format, OutputFormat::Png);
    }

    #[test]
    fn is_legacy_ignores_case() {
        let v = ValidationConfig::default();
        assert!(v.is_legacy("IMAGE/HEIC"));
        assert!(!v.is_legacy("image/jpeg"));
    }
}
