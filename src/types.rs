//! Shared input type and size helpers.

use bytes::Bytes;
use std::path::Path;

/// Bytes per binary megabyte.
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Convert a byte count to binary megabytes.
pub fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB
}

/// Extension → MIME table for the formats a receipt can arrive in.
const EXTENSION_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("webp", "image/webp"),
    ("heic", "image/heic"),
    ("heif", "image/heif"),
];

/// Look up the MIME type for a file extension (case-insensitive).
pub fn mime_for_extension(ext: &str) -> Option<&'static str> {
    EXTENSION_TYPES
        .iter()
        .find(|(e, _)| e.eq_ignore_ascii_case(ext))
        .map(|(_, mime)| *mime)
}

/// An image as handed over by the attachment field.
///
/// The payload is reference counted, so handing the original back on
/// fallback does not copy it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    /// Original file name, e.g. `IMG_0042.HEIC`.
    pub name: String,
    /// Declared MIME type, lower-cased.
    pub mime: String,
    pub bytes: Bytes,
}

impl RawImage {
    pub fn new(name: impl Into<String>, mime: &str, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime: mime.trim().to_ascii_lowercase(),
            bytes: bytes.into(),
        }
    }

    /// Read a file, taking the MIME type from `mime` or else the extension.
    ///
    /// An unknown extension yields `application/octet-stream`, which the
    /// validation gate then rejects.
    pub fn from_path(path: &Path, mime: Option<&str>) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime = mime.unwrap_or_else(|| {
            path.extension()
                .and_then(|e| e.to_str())
                .and_then(mime_for_extension)
                .unwrap_or("application/octet-stream")
        });
        Ok(Self::new(name, mime, bytes))
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn size_mb(&self) -> f64 {
        bytes_to_mb(self.len())
    }

    /// File name without its final extension.
    pub fn stem(&self) -> &str {
        match self.name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => &self.name,
        }
    }
}
