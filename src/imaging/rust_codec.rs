//! Pure Rust codec on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Step | Crate / function |
//! |---|---|
//! | Primary decode | `ImageReader::with_guessed_format`, declared type when unrecognised, decoder `Limits` |
//! | Alternate decode (legacy types) | `infer` sniffing + `ImageReader::with_guessed_format` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | White background | [`Surface`](super::surface::Surface) + `imageops::overlay` |
//! | Quality | [`finalize_quality`] from the pass input size and output dimensions |
//! | Encode | `JpegEncoder` (quality 1-100), `PngEncoder`, lossless `WebPEncoder` |
//!
//! The primary path decodes by content, so a JPEG saved as `.png` still
//! compresses. Phones frequently hand over JPEGs labelled `image/heic`, so
//! legacy types go through the alternate path first. A genuine HEIF
//! container has no pure-Rust decoder here and fails with
//! [`CodecError::LegacyFormat`], which lets the UI suggest a standard format.

use super::calculations::{estimate_surface_bytes, finalize_quality, target_dimensions};
use super::codec::{Codec, CodecError, EncodedImage, derive_output_name};
use super::params::{PassParams, Quality};
use super::surface::{Surface, SurfaceTracker};
use crate::config::{DecodingConfig, FinalizationConfig, PolicyConfig};
use crate::plan::OutputFormat;
use crate::progress::{Phase, ProgressReporter};
use crate::types::{RawImage, bytes_to_mb};
use bytes::Bytes;
use chrono::Utc;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{
    DynamicImage, ExtendedColorType, GenericImageView, ImageEncoder, ImageError, ImageFormat,
    ImageReader, Limits,
};
use std::io::Cursor;

/// Container types `infer` reports for phone-camera formats we cannot decode.
const HEIF_FAMILY: &[&str] = &[
    "image/heif",
    "image/heic",
    "image/heif-sequence",
    "image/heic-sequence",
    "image/avif",
];

/// Pure Rust codec. Owns the surface tracker for its passes.
#[derive(Debug, Clone)]
pub struct RustCodec {
    tracker: SurfaceTracker,
    decoding: DecodingConfig,
    finalization: FinalizationConfig,
    legacy_types: Vec<String>,
}

impl RustCodec {
    pub fn new(policy: &PolicyConfig) -> Self {
        Self {
            tracker: SurfaceTracker::new(),
            decoding: policy.decoding.clone(),
            finalization: policy.finalization.clone(),
            legacy_types: policy.validation.legacy_types.clone(),
        }
    }

    pub fn tracker(&self) -> &SurfaceTracker {
        &self.tracker
    }

    fn is_legacy(&self, mime: &str) -> bool {
        self.legacy_types.iter().any(|t| t.eq_ignore_ascii_case(mime))
    }

    fn limits(&self) -> Limits {
        let mut limits = Limits::default();
        limits.max_alloc = Some(self.decoding.max_decoded_pixels.saturating_mul(4));
        limits
    }

    /// Pick the decode path(s) for the declared type.
    ///
    /// Only decode failures of a legacy type become
    /// [`CodecError::LegacyFormat`]; a resource limit is reported as is.
    fn decode(&self, source: &RawImage) -> Result<DynamicImage, CodecError> {
        let decoded = if self.is_legacy(&source.mime) {
            self.decode_sniffed(&source.bytes).or_else(|alternate| {
                if matches!(alternate, CodecError::ResourceLimit(_)) {
                    return Err(alternate);
                }
                log::debug!("alternate decode failed for {}: {alternate}", source.name);
                self.decode_primary(&source.bytes, &source.mime)
                    .map_err(|primary| match primary {
                        CodecError::ResourceLimit(_) => primary,
                        _ => CodecError::LegacyFormat {
                            mime: source.mime.clone(),
                            detail: alternate.to_string(),
                        },
                    })
            })?
        } else {
            self.decode_primary(&source.bytes, &source.mime)?
        };

        let (w, h) = decoded.dimensions();
        if u64::from(w) * u64::from(h) > self.decoding.max_decoded_pixels {
            return Err(CodecError::ResourceLimit(format!(
                "{w}x{h} exceeds {} pixels",
                self.decoding.max_decoded_pixels
            )));
        }
        Ok(decoded)
    }

    /// Primary path: decode by content. The declared type is only used when
    /// the bytes carry no signature the `image` crate recognises.
    fn decode_primary(&self, bytes: &[u8], mime: &str) -> Result<DynamicImage, CodecError> {
        let mut reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| CodecError::Decode(e.to_string()))?;
        match reader.format() {
            Some(found) => {
                if format_for_mime(mime) != Some(found) {
                    log::debug!("declared {mime}, content is {}", found.to_mime_type());
                }
            }
            None => {
                let declared = format_for_mime(mime)
                    .ok_or_else(|| CodecError::Decode(format!("no decoder for {mime}")))?;
                reader.set_format(declared);
            }
        }
        reader.limits(self.limits());
        reader.decode().map_err(map_image_error)
    }

    /// Alternate path: decide the format from the content.
    fn decode_sniffed(&self, bytes: &[u8]) -> Result<DynamicImage, CodecError> {
        if let Some(kind) = infer::get(bytes) {
            if HEIF_FAMILY.contains(&kind.mime_type()) {
                return Err(CodecError::Decode(format!(
                    "{} containers are not supported",
                    kind.mime_type()
                )));
            }
        }
        let mut reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| CodecError::Decode(e.to_string()))?;
        if reader.format().is_none() {
            return Err(CodecError::Decode("unrecognised image data".into()));
        }
        reader.limits(self.limits());
        reader.decode().map_err(map_image_error)
    }

    /// Redraw `decoded` at `(width, height)` onto a fresh white surface.
    fn render(&self, decoded: DynamicImage, width: u32, height: u32) -> Result<Surface, CodecError> {
        let estimate_mb = bytes_to_mb(estimate_surface_bytes(width, height));
        if estimate_mb > self.decoding.surface_memory_warning_mb {
            log::warn!("rendering {width}x{height} needs about {estimate_mb:.0} MB");
        }

        let mut surface = self.tracker.acquire(width, height)?;
        let pixels = if decoded.dimensions() == (width, height) {
            decoded.into_rgba8()
        } else {
            decoded.resize_exact(width, height, FilterType::Lanczos3).into_rgba8()
        };
        surface.draw(&pixels);
        Ok(surface)
    }
}

fn format_for_mime(mime: &str) -> Option<ImageFormat> {
    match mime {
        "image/jpeg" | "image/jpg" => Some(ImageFormat::Jpeg),
        "image/png" => Some(ImageFormat::Png),
        "image/webp" => Some(ImageFormat::WebP),
        other => ImageFormat::from_mime_type(other),
    }
}

fn map_image_error(err: ImageError) -> CodecError {
    match err {
        ImageError::Limits(e) => CodecError::ResourceLimit(e.to_string()),
        other => CodecError::Decode(other.to_string()),
    }
}

/// Encode the surface contents. PNG and WebP are lossless; quality only
/// applies to JPEG.
fn encode_surface(
    surface: &Surface,
    format: OutputFormat,
    quality: Quality,
) -> Result<Vec<u8>, CodecError> {
    let rgb = surface.to_rgb();
    let (w, h) = rgb.dimensions();
    let mut buf = Vec::new();
    let result = match format {
        OutputFormat::Jpeg => JpegEncoder::new_with_quality(&mut buf, quality.jpeg_scale())
            .write_image(rgb.as_raw(), w, h, ExtendedColorType::Rgb8),
        OutputFormat::Png => {
            PngEncoder::new(&mut buf).write_image(rgb.as_raw(), w, h, ExtendedColorType::Rgb8)
        }
        OutputFormat::WebP => WebPEncoder::new_lossless(&mut buf).write_image(
            rgb.as_raw(),
            w,
            h,
            ExtendedColorType::Rgb8,
        ),
    };
    result.map_err(|e| CodecError::Encode {
        format: format.mime(),
        detail: e.to_string(),
    })?;
    Ok(buf)
}

impl Codec for RustCodec {
    fn encode(
        &self,
        source: &RawImage,
        params: &PassParams,
        progress: &mut ProgressReporter,
    ) -> Result<EncodedImage, CodecError> {
        progress.phase(Phase::DecodeStart);
        let decoded = self.decode(source)?;
        progress.phase(Phase::DecodeComplete);

        let (width, height) =
            target_dimensions(decoded.dimensions(), (params.max_width, params.max_height));
        progress.phase(Phase::DimensionsComputed);

        let surface = self.render(decoded, width, height)?;
        progress.phase(Phase::SurfaceReady);

        let quality = finalize_quality(
            params.quality,
            source.len(),
            (width, height),
            &self.finalization,
        );
        if quality != params.quality {
            log::debug!(
                "{}: quality {:.2} → {:.2}",
                source.name,
                params.quality.value(),
                quality.value()
            );
        }
        progress.phase(Phase::QualityFinalized);

        let bytes = encode_surface(&surface, params.format, quality)?;
        drop(surface);
        progress.phase(Phase::Complete);

        log::debug!(
            "encoded {} → {width}x{height} {} q{:.2}: {} bytes",
            source.name,
            params.format.extension(),
            quality.value(),
            bytes.len()
        );

        Ok(EncodedImage {
            name: derive_output_name(source.stem(), params.format),
            format: params.format,
            bytes: Bytes::from(bytes),
            width,
            height,
            last_modified: Utc::now(),
        })
    }
}
