//! Validation gate: accept or reject an image before any decode work.
//!
//! Checks the declared MIME type against the allow-list and the byte length
//! against the hard ceiling. Accepted images may carry advisories: a
//! large-file warning, a legacy-format warning, or both.

use crate::config::ValidationConfig;
use crate::types::{RawImage, bytes_to_mb};
use std::fmt;
use thiserror::Error;

/// Why an image was refused.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Unsupported file type {mime}. Only JPEG, PNG, WebP and HEIC/HEIF images can be attached.")]
    UnsupportedType { mime: String },
    #[error("File is {size_mb:.1} MB. Receipts must be {limit_mb:.0} MB or smaller.")]
    TooLarge { size_mb: f64, limit_mb: f64 },
}

/// Non-blocking advisory attached to an accepted image.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationWarning {
    LargeFile { size_mb: f64 },
    LegacyFormat { mime: String },
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LargeFile { size_mb } => write!(
                f,
                "Large file ({size_mb:.1} MB). Processing may take some time."
            ),
            Self::LegacyFormat { mime } => write!(
                f,
                "{mime} file. It will be converted to a standard format and may not open in every environment."
            ),
        }
    }
}

/// Result of running the gate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationOutcome {
    pub error: Option<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    /// All advisories joined into one user-facing line.
    pub fn warning(&self) -> Option<String> {
        if self.warnings.is_empty() {
            return None;
        }
        Some(
            self.warnings
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" "),
        )
    }

    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ValidationError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.warnings),
        }
    }
}

/// Run the gate. Pure; never panics.
pub fn validate(image: &RawImage, policy: &ValidationConfig) -> ValidationOutcome {
    let allowed = policy
        .allowed_types
        .iter()
        .any(|t| t.eq_ignore_ascii_case(&image.mime));
    if !allowed {
        return ValidationOutcome {
            error: Some(ValidationError::UnsupportedType {
                mime: image.mime.clone(),
            }),
            warnings: Vec::new(),
        };
    }

    let size_mb = bytes_to_mb(image.len());
    if size_mb > policy.max_file_mb {
        return ValidationOutcome {
            error: Some(ValidationError::TooLarge {
                size_mb,
                limit_mb: policy.max_file_mb,
            }),
            warnings: Vec::new(),
        };
    }

    let mut warnings = Vec::new();
    if size_mb > policy.large_file_warning_mb {
        warnings.push(ValidationWarning::LargeFile { size_mb });
    }
    if policy.is_legacy(&image.mime) {
        warnings.push(ValidationWarning::LegacyFormat {
            mime: image.mime.clone(),
        });
    }

    ValidationOutcome {
        error: None,
        warnings,
    }
}
