//! Compression executor: validate, plan, run one or two codec passes.
//!
//! This is the one operation the attachment field calls. Rejected input is the
//! only `Err`; every failure after validation is absorbed into
//! [`CompressionOutcome::Fallback`], which hands the original image back so
//! the attachment still proceeds.
//!
//! ## State machine
//!
//! ```text
//! Start ──(staging off)──► single pass at plan values ─────────────► Done
//!   │
//!   └──(staging on)──► first-stage preset ──► StageOneComplete
//!                                               │
//!                 stage-one < refine limit ─────┼──► plan values ───► Done
//!                 otherwise ────────────────────┴──► aggressive ────► Done
//!
//! any codec error ─────────────────────────────────────────────────► Fallback
//! ```
//!
//! ## Progress
//!
//! A single pass maps its phases straight onto 0-100. A staged run reports
//! stage one inside 20-60 and stage two inside 60-90. Every run ends with 100,
//! emitted after the codec has released its surfaces.

use crate::capability::{CapabilityLevel, CapabilityProvider, SystemCapability};
use crate::config::PolicyConfig;
use crate::imaging::{Codec, CodecError, EncodedImage, PassParams, RustCodec};
use crate::metrics::{self, PerformanceLog, PerformanceStats};
use crate::plan::{CompressionPlan, select_plan};
use crate::progress::{ProgressReporter, Window};
use crate::types::{RawImage, bytes_to_mb};
use crate::validation::{self, ValidationError, ValidationOutcome, ValidationWarning};
use bytes::Bytes;
use serde::Serialize;
use std::sync::mpsc::Sender;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

/// Shown when compression fell back for a reason other than the legacy path.
pub const FALLBACK_NOTICE: &str =
    "The image could not be compressed. The original file will be attached instead.";

/// Before/after metrics for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompressionResult {
    pub original_size: u64,
    pub compressed_size: u64,
    /// Percentage reduction; negative when the output grew.
    pub ratio: i64,
    pub duration_ms: u64,
}

impl CompressionResult {
    pub fn new(original_size: u64, compressed_size: u64, duration_ms: u64) -> Self {
        Self {
            original_size,
            compressed_size,
            ratio: compression_ratio(original_size, compressed_size),
            duration_ms,
        }
    }

    /// Zero-reduction marker for a run that handed back the original.
    pub fn unchanged(original_size: u64, duration_ms: u64) -> Self {
        Self {
            original_size,
            compressed_size: original_size,
            ratio: 0,
            duration_ms,
        }
    }
}

/// `round(100 × (original − compressed) / original)`, or 0 for an empty original.
pub fn compression_ratio(original: u64, compressed: u64) -> i64 {
    if original == 0 {
        return 0;
    }
    let saved = original as f64 - compressed as f64;
    (100.0 * saved / original as f64).round() as i64
}

/// What the caller attaches.
#[derive(Debug, Clone, PartialEq)]
pub enum CompressionOutcome {
    Compressed {
        image: EncodedImage,
        result: CompressionResult,
    },
    Fallback {
        image: RawImage,
        result: CompressionResult,
        error: CodecError,
    },
}

impl CompressionOutcome {
    pub fn result(&self) -> &CompressionResult {
        match self {
            Self::Compressed { result, .. } | Self::Fallback { result, .. } => result,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    /// File name of the payload.
    pub fn name(&self) -> &str {
        match self {
            Self::Compressed { image, .. } => &image.name,
            Self::Fallback { image, .. } => &image.name,
        }
    }

    /// Bytes to attach.
    pub fn payload(&self) -> &Bytes {
        match self {
            Self::Compressed { image, .. } => &image.bytes,
            Self::Fallback { image, .. } => &image.bytes,
        }
    }

    /// Non-blocking notice for the UI. Legacy-format failures keep their own
    /// message so it can suggest a standard format.
    pub fn advisory(&self) -> Option<String> {
        match self {
            Self::Compressed { .. } => None,
            Self::Fallback { error, .. } if error.is_legacy_format() => Some(error.to_string()),
            Self::Fallback { .. } => Some(FALLBACK_NOTICE.to_string()),
        }
    }
}

/// Everything one `compress` call produced.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionReport {
    pub outcome: CompressionOutcome,
    pub warnings: Vec<ValidationWarning>,
    pub plan: CompressionPlan,
    pub capability: CapabilityLevel,
    /// Codec passes attempted, including a failed one.
    pub passes: usize,
}

/// The compression pipeline with its policy, device level and codec.
///
/// The capability level is classified once at construction.
pub struct Compressor<C: Codec = RustCodec> {
    codec: C,
    policy: PolicyConfig,
    level: CapabilityLevel,
    metrics: Mutex<PerformanceLog>,
}

impl Compressor<RustCodec> {
    /// Pure Rust codec, hints from the running machine.
    pub fn new(policy: PolicyConfig) -> Self {
        Self::with_provider(policy, &SystemCapability)
    }

    pub fn with_provider(policy: PolicyConfig, provider: &dyn CapabilityProvider) -> Self {
        let codec = RustCodec::new(&policy);
        Self::with_codec(policy, provider, codec)
    }
}

impl<C: Codec> Compressor<C> {
    pub fn with_codec(policy: PolicyConfig, provider: &dyn CapabilityProvider, codec: C) -> Self {
        let level = provider.level(&policy.capability);
        log::debug!("device capability: {level}");
        Self {
            codec,
            policy,
            level,
            metrics: Mutex::new(PerformanceLog::new()),
        }
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn capability(&self) -> CapabilityLevel {
        self.level
    }

    pub fn validate(&self, raw: &RawImage) -> ValidationOutcome {
        validation::validate(raw, &self.policy.validation)
    }

    pub fn plan_for(&self, raw: &RawImage) -> CompressionPlan {
        select_plan(raw.size_mb(), self.level, &self.policy)
    }

    /// Duration statistics for one of the [`metrics`] labels.
    pub fn performance(&self, label: &str) -> Option<PerformanceStats> {
        self.metrics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .stats(label)
    }

    /// Validate and compress `raw`, reporting progress to `progress` if given.
    pub fn compress(
        &self,
        raw: &RawImage,
        progress: Option<Sender<u8>>,
    ) -> Result<CompressionReport, ValidationError> {
        let started = Instant::now();
        let warnings = self.validate(raw).into_result()?;
        for warning in &warnings {
            log::info!("{}: {warning}", raw.name);
        }

        let plan = self.plan_for(raw);
        let mut reporter = ProgressReporter::new(progress);
        let mut passes = 0;
        let attempt = if plan.staging_enabled {
            self.run_staged(raw, &plan, &mut reporter, &mut passes)
        } else {
            self.run_single(raw, &plan, &mut reporter, &mut passes)
        };
        let duration_ms = started.elapsed().as_millis() as u64;

        let (outcome, label) = match attempt {
            Ok(image) => {
                let result = CompressionResult::new(raw.len(), image.len(), duration_ms);
                log::info!(
                    "{} compressed {} → {} bytes ({}%) in {duration_ms} ms",
                    raw.name,
                    result.original_size,
                    result.compressed_size,
                    result.ratio
                );
                let label = if plan.staging_enabled {
                    metrics::STAGED
                } else {
                    metrics::SINGLE_PASS
                };
                (CompressionOutcome::Compressed { image, result }, label)
            }
            Err(error) => {
                log::warn!("{}: compression failed, attaching original: {error}", raw.name);
                let outcome = CompressionOutcome::Fallback {
                    image: raw.clone(),
                    result: CompressionResult::unchanged(raw.len(), duration_ms),
                    error,
                };
                (outcome, metrics::FALLBACK)
            }
        };
        reporter.emit(100);

        self.metrics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record(label, duration_ms);

        Ok(CompressionReport {
            outcome,
            warnings,
            plan,
            capability: self.level,
            passes,
        })
    }

    fn run_single(
        &self,
        raw: &RawImage,
        plan: &CompressionPlan,
        reporter: &mut ProgressReporter,
        passes: &mut usize,
    ) -> Result<EncodedImage, CodecError> {
        reporter.set_window(Window::FULL);
        *passes += 1;
        self.codec.encode(raw, &PassParams::from_plan(plan), reporter)
    }

    fn run_staged(
        &self,
        raw: &RawImage,
        plan: &CompressionPlan,
        reporter: &mut ProgressReporter,
        passes: &mut usize,
    ) -> Result<EncodedImage, CodecError> {
        let staging = &self.policy.staging;

        reporter.emit(Window::STAGE_ONE.start);
        reporter.set_window(Window::STAGE_ONE);
        let first = PassParams::from_preset(&staging.first_stage, plan.output_format);
        *passes += 1;
        let stage_one = self.codec.encode(raw, &first, reporter)?;

        let stage_one_mb = bytes_to_mb(stage_one.len());
        let second = if stage_one_mb < staging.refine_limit_mb {
            log::debug!("stage one {stage_one_mb:.2} MB, refining with plan values");
            PassParams::from_plan(&CompressionPlan {
                staging_enabled: false,
                ..*plan
            })
        } else {
            log::debug!("stage one {stage_one_mb:.2} MB, using aggressive preset");
            PassParams::from_preset(&staging.aggressive, plan.output_format)
        };

        reporter.set_window(Window::STAGE_TWO);
        *passes += 1;
        self.codec.encode(&stage_one.to_raw(), &second, reporter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::FixedCapability;
    use crate::imaging::codec::tests::MockCodec;
    use crate::types::BYTES_PER_MB;
    use proptest::prelude::*;
    use std::sync::mpsc;

    fn mb(n: f64) -> usize {
        (n * BYTES_PER_MB) as usize
    }

    fn compressor(level: CapabilityLevel, codec: MockCodec) -> Compressor<MockCodec> {
        Compressor::with_codec(PolicyConfig::default(), &FixedCapability::Level(level), codec)
    }

    fn jpeg(size: usize) -> RawImage {
        RawImage::new("receipt.jpg", "image/jpeg", vec![0u8; size])
    }

    #[test]
    fn small_jpeg_single_pass() {
        let c = compressor(CapabilityLevel::Medium, MockCodec::new());
        let raw = jpeg(mb(2.0));
        let report = c.compress(&raw, None).unwrap();

        assert!(!report.plan.staging_enabled);
        assert_eq!(report.passes, 1);
        assert!(report.warnings.is_empty());
        let passes = c.codec().get_passes();
        assert_eq!(passes.len(), 1);
        assert_eq!((passes[0].max_width, passes[0].max_height), (800, 1200));
        assert_eq!(passes[0].quality, 0.7);

        let result = report.outcome.result();
        assert_eq!(result.ratio, 90);
        assert_eq!(report.outcome.name(), "receipt_compressed.jpg");
        assert!(report.outcome.advisory().is_none());
    }

    #[test]
    fn large_jpeg_stages_aggressively() {
        let c = compressor(CapabilityLevel::Medium, MockCodec::new());
        let raw = jpeg(mb(55.0));
        let report = c.compress(&raw, None).unwrap();

        assert_eq!(
            report.warnings,
            vec![ValidationWarning::LargeFile { size_mb: 55.0 }]
        );
        assert!(report.plan.staging_enabled);
        assert_eq!(report.passes, 2);

        let passes = c.codec().get_passes();
        assert_eq!(passes.len(), 2);
        assert_eq!((passes[0].max_width, passes[0].max_height), (1200, 1800));
        assert_eq!(passes[0].quality, 0.5);
        // stage one produced 5.5 MB, above the refine limit
        assert_eq!((passes[1].max_width, passes[1].max_height), (600, 900));
        assert_eq!(passes[1].quality, 0.3);
        assert_eq!(passes[1].source_name, "receipt_compressed.jpg");
        assert_eq!(passes[1].source_len, (mb(55.0) / 10) as u64);

        match &report.outcome {
            CompressionOutcome::Compressed { image, .. } => {
                assert!(image.width <= 700 && image.height <= 1000);
            }
            other => panic!("expected compressed, got {other:?}"),
        }
    }

    #[test]
    fn small_stage_one_output_is_refined_with_plan_values() {
        let codec = MockCodec::scripted(vec![Ok(mb(1.0))]);
        let c = compressor(CapabilityLevel::Medium, codec);
        let report = c.compress(&jpeg(mb(55.0)), None).unwrap();

        let passes = c.codec().get_passes();
        assert_eq!(passes.len(), 2);
        assert_eq!((passes[1].max_width, passes[1].max_height), (700, 1000));
        assert_eq!(passes[1].quality, report.plan.quality);
    }

    #[test]
    fn huge_png_on_low_device_runs_one_clamped_pass() {
        let c = compressor(CapabilityLevel::Low, MockCodec::new());
        let raw = RawImage::new("scan.png", "image/png", vec![0u8; mb(90.0)]);
        let report = c.compress(&raw, None).unwrap();

        assert!(matches!(report.warnings[..], [ValidationWarning::LargeFile { .. }]));
        assert!(!report.plan.staging_enabled);
        let passes = c.codec().get_passes();
        assert_eq!(passes.len(), 1);
        assert!(passes[0].max_width <= 600 && passes[0].max_height <= 900);
        assert_eq!(passes[0].quality, 0.3);
    }

    #[test]
    fn legacy_image_warns_and_runs_one_pass() {
        let c = compressor(CapabilityLevel::Medium, MockCodec::new());
        let raw = RawImage::new("IMG_1.HEIC", "image/heic", vec![0u8; mb(0.5)]);
        let report = c.compress(&raw, None).unwrap();

        assert!(matches!(report.warnings[..], [ValidationWarning::LegacyFormat { .. }]));
        assert_eq!(report.passes, 1);
        assert!(!report.outcome.is_fallback());
    }

    #[test]
    fn oversized_file_is_rejected_before_decode() {
        let c = compressor(CapabilityLevel::Medium, MockCodec::new());
        let err = c.compress(&jpeg(mb(200.0)), None).unwrap_err();
        assert!(matches!(err, ValidationError::TooLarge { .. }));
        assert!(c.codec().get_passes().is_empty());
        assert!(c.performance(metrics::FALLBACK).is_none());
    }

    #[test]
    fn unsupported_type_is_rejected() {
        let c = compressor(CapabilityLevel::Medium, MockCodec::new());
        let raw = RawImage::new("notes.pdf", "application/pdf", vec![1u8; 100]);
        assert!(matches!(
            c.compress(&raw, None),
            Err(ValidationError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn decode_failure_falls_back_to_original() {
        let codec = MockCodec::scripted(vec![Err(CodecError::Decode("bad huffman table".into()))]);
        let c = compressor(CapabilityLevel::Medium, codec);
        let raw = jpeg(mb(3.0));
        let report = c.compress(&raw, None).unwrap();

        assert!(report.outcome.is_fallback());
        assert_eq!(report.outcome.payload(), &raw.bytes);
        assert_eq!(report.outcome.name(), "receipt.jpg");
        let result = report.outcome.result();
        assert_eq!(result.compressed_size, result.original_size);
        assert_eq!(result.ratio, 0);
        assert_eq!(report.outcome.advisory().as_deref(), Some(FALLBACK_NOTICE));
        assert_eq!(c.performance(metrics::FALLBACK).map(|s| s.count), Some(1));
    }

    #[test]
    fn failure_in_stage_two_still_returns_original() {
        let codec = MockCodec::scripted(vec![
            Ok(mb(6.0)),
            Err(CodecError::Encode {
                format: "image/jpeg",
                detail: "writer closed".into(),
            }),
        ]);
        let c = compressor(CapabilityLevel::Medium, codec);
        let raw = jpeg(mb(60.0));
        let report = c.compress(&raw, None).unwrap();

        assert_eq!(report.passes, 2);
        assert_eq!(report.outcome.payload().len(), raw.bytes.len());
        assert_eq!(report.outcome.result().ratio, 0);
    }

    #[test]
    fn legacy_failure_keeps_its_advisory() {
        let codec = MockCodec::scripted(vec![Err(CodecError::LegacyFormat {
            mime: "image/heic".into(),
            detail: "heif container".into(),
        })]);
        let c = compressor(CapabilityLevel::Medium, codec);
        let raw = RawImage::new("IMG_2.HEIC", "image/heic", vec![0u8; 4096]);
        let advisory = c.compress(&raw, None).unwrap().outcome.advisory().unwrap();
        assert!(advisory.contains("JPEG or PNG"));
    }

    #[test]
    fn single_pass_progress_is_the_phase_sequence() {
        let c = compressor(CapabilityLevel::Medium, MockCodec::new());
        let (tx, rx) = mpsc::channel();
        c.compress(&jpeg(4096), Some(tx)).unwrap();
        assert_eq!(rx.iter().collect::<Vec<_>>(), vec![10, 30, 50, 70, 80, 100]);
    }

    #[test]
    fn staged_progress_is_strictly_increasing() {
        let c = compressor(CapabilityLevel::Medium, MockCodec::new());
        let (tx, rx) = mpsc::channel();
        c.compress(&jpeg(mb(55.0)), Some(tx)).unwrap();
        let values: Vec<u8> = rx.iter().collect();

        assert_eq!(values.first(), Some(&20));
        assert_eq!(values.last(), Some(&100));
        assert!(values.windows(2).all(|w| w[0] < w[1]));
        assert!(values.contains(&60) && values.contains(&90));
    }

    #[test]
    fn fallback_progress_still_completes() {
        let codec = MockCodec::scripted(vec![Err(CodecError::Decode("eof".into()))]);
        let c = compressor(CapabilityLevel::Medium, codec);
        let (tx, rx) = mpsc::channel();
        c.compress(&jpeg(4096), Some(tx)).unwrap();
        assert_eq!(rx.iter().collect::<Vec<_>>(), vec![10, 100]);
    }

    #[test]
    fn durations_are_recorded_per_path() {
        let c = compressor(CapabilityLevel::Medium, MockCodec::new());
        c.compress(&jpeg(4096), None).unwrap();
        c.compress(&jpeg(8192), None).unwrap();
        assert_eq!(c.performance(metrics::SINGLE_PASS).map(|s| s.count), Some(2));
        assert!(c.performance(metrics::STAGED).is_none());
    }

    #[test]
    fn ratio_examples() {
        assert_eq!(compression_ratio(1000, 250), 75);
        assert_eq!(compression_ratio(3, 2), 33);
        assert_eq!(compression_ratio(0, 0), 0);
        assert_eq!(compression_ratio(100, 150), -50);
    }

    proptest! {
        #[test]
        fn ratio_matches_formula(original in 1u64..1_000_000_000, compressed in 0u64..1_000_000_000) {
            let expected = (100.0 * (original as f64 - compressed as f64) / original as f64).round() as i64;
            prop_assert_eq!(compression_ratio(original, compressed), expected);
        }
    }
}
