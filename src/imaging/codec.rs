//! Codec trait and shared types.
//!
//! The [`Codec`] trait turns one source image plus one [`PassParams`] into one
//! encoded payload. The production implementation is
//! [`RustCodec`](super::rust_codec::RustCodec); tests drive the executor with
//! the recording `MockCodec` below.

use super::params::PassParams;
use crate::plan::OutputFormat;
use crate::progress::ProgressReporter;
use crate::types::RawImage;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Suffix added to the stem of every encoded output.
pub const OUTPUT_SUFFIX: &str = "_compressed";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodecError {
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error(
        "Could not read this {mime} image ({detail}). Try taking the photo again or choose a JPEG or PNG file."
    )]
    LegacyFormat { mime: String, detail: String },
    #[error("Could not allocate a {width}x{height} rendering surface")]
    SurfaceAllocation { width: u32, height: u32 },
    #[error("Image exceeds decoding limits: {0}")]
    ResourceLimit(String),
    #[error("Failed to encode {format}: {detail}")]
    Encode { format: &'static str, detail: String },
}

impl CodecError {
    /// True when the failure came from the legacy phone-camera decode path.
    pub fn is_legacy_format(&self) -> bool {
        matches!(self, Self::LegacyFormat { .. })
    }
}

/// Output of one encode pass.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedImage {
    /// Derived file name, see [`derive_output_name`].
    pub name: String,
    pub format: OutputFormat,
    pub bytes: Bytes,
    pub width: u32,
    pub height: u32,
    pub last_modified: DateTime<Utc>,
}

impl EncodedImage {
    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Re-wrap as an input for a further pass.
    pub fn to_raw(&self) -> RawImage {
        RawImage::new(self.name.clone(), self.format.mime(), self.bytes.clone())
    }
}

/// `receipt.HEIC` → `receipt_compressed.jpg`. An existing suffix is not repeated.
pub fn derive_output_name(source_stem: &str, format: OutputFormat) -> String {
    let stem = source_stem.strip_suffix(OUTPUT_SUFFIX).unwrap_or(source_stem);
    format!("{stem}{OUTPUT_SUFFIX}.{}", format.extension())
}

/// Trait for encode backends.
pub trait Codec: Sync {
    /// Decode `source`, fit it inside the pass bounds, and re-encode it.
    ///
    /// Reports the pass phases to `progress` in order. All transient
    /// resources are released before this returns, on success and on error.
    fn encode(
        &self,
        source: &RawImage,
        params: &PassParams,
        progress: &mut ProgressReporter,
    ) -> Result<EncodedImage, CodecError>;
}
