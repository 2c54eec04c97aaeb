//! Typed job payload definitions.
//!
//! Payloads are validated at submission time, before any job record is
//! created or any worker is involved. A payload that fails validation
//! never becomes a job.

use serde::{Deserialize, Serialize};

use convertly_core::error::AppError;
use convertly_core::result::AppResult;

use super::family::JobFamily;

/// Minimum accepted image quality for `compress`.
pub const MIN_QUALITY: u8 = 1;
/// Maximum accepted image quality for `compress`.
pub const MAX_QUALITY: u8 = 100;
/// Minimum accepted scale percentage for `resize`.
pub const MIN_SCALE_PERCENT: u32 = 25;
/// Maximum accepted scale percentage for `resize`.
pub const MAX_SCALE_PERCENT: u32 = 200;

/// Payload of a document-family job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "task", rename_all = "lowercase")]
pub enum DocumentPayload {
    /// Concatenate two or more PDFs in order.
    Merge {
        /// Object keys of the input PDFs.
        keys: Vec<String>,
    },
    /// Extract an inclusive page range from a PDF.
    Split {
        /// Object key of the input PDF.
        key: String,
        /// First page (1-based, clamped to >= 1).
        start_page: u32,
        /// Last page (clamped to the document's page count).
        end_page: u32,
    },
    /// Convert a document to another format via the office converter.
    Convert {
        /// Object key of the input document.
        key: String,
        /// Target format extension (e.g., "pdf", "docx", "odt").
        target_format: String,
    },
}

/// Payload of an image-family job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "task", rename_all = "lowercase")]
pub enum ImagePayload {
    /// Re-encode an image in another format.
    Convert {
        /// Object key of the input image.
        key: String,
        /// Target format: "png", "jpeg", or "webp".
        target_format: String,
    },
    /// Re-encode an image with a quality setting.
    Compress {
        /// Object key of the input image.
        key: String,
        /// Quality, 1-100.
        quality: u8,
    },
    /// Scale an image by a percentage of its original dimensions.
    Resize {
        /// Object key of the input image.
        key: String,
        /// Scale percentage, 25-200.
        scale_percent: u32,
    },
}

/// A job's typed input, combining family and task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobPayload {
    /// Document-family payload.
    Document(DocumentPayload),
    /// Image-family payload.
    Image(ImagePayload),
}

impl JobPayload {
    /// The family whose worker pool executes this payload.
    pub fn family(&self) -> JobFamily {
        match self {
            Self::Document(_) => JobFamily::Document,
            Self::Image(_) => JobFamily::Image,
        }
    }

    /// The operation name within the family.
    pub fn task(&self) -> &'static str {
        match self {
            Self::Document(DocumentPayload::Merge { .. }) => "merge",
            Self::Document(DocumentPayload::Split { .. }) => "split",
            Self::Document(DocumentPayload::Convert { .. }) => "convert",
            Self::Image(ImagePayload::Convert { .. }) => "convert",
            Self::Image(ImagePayload::Compress { .. }) => "compress",
            Self::Image(ImagePayload::Resize { .. }) => "resize",
        }
    }

    /// Validate the payload before any record creation or I/O.
    ///
    /// Range checks that depend only on the payload itself live here;
    /// checks that need the source object (e.g., a PDF's page count)
    /// happen inside the transformation.
    pub fn validate(&self) -> AppResult<()> {
        match self {
            Self::Document(DocumentPayload::Merge { keys }) => {
                if keys.len() < 2 {
                    return Err(AppError::validation(
                        "merge requires at least two input keys",
                    ));
                }
                if keys.iter().any(|k| k.trim().is_empty()) {
                    return Err(AppError::validation("merge input keys must be non-empty"));
                }
            }
            Self::Document(DocumentPayload::Split {
                key,
                start_page,
                end_page,
            }) => {
                require_key(key)?;
                // start_page is clamped to 1 later, so compare against
                // the effective start rather than the raw value.
                if *end_page < (*start_page).max(1) {
                    return Err(AppError::validation(format!(
                        "end_page {end_page} is before start_page {start_page}"
                    )));
                }
            }
            Self::Document(DocumentPayload::Convert { key, target_format }) => {
                require_key(key)?;
                if target_format.trim().is_empty() {
                    return Err(AppError::validation("target_format must be non-empty"));
                }
            }
            Self::Image(ImagePayload::Convert { key, target_format }) => {
                require_key(key)?;
                if !matches!(target_format.as_str(), "png" | "jpeg" | "jpg" | "webp") {
                    return Err(AppError::validation(format!(
                        "unsupported target format '{target_format}', expected png, jpeg, or webp"
                    )));
                }
            }
            Self::Image(ImagePayload::Compress { key, quality }) => {
                require_key(key)?;
                if !(MIN_QUALITY..=MAX_QUALITY).contains(quality) {
                    return Err(AppError::validation(format!(
                        "quality must be between {MIN_QUALITY} and {MAX_QUALITY}, got {quality}"
                    )));
                }
            }
            Self::Image(ImagePayload::Resize { key, scale_percent }) => {
                require_key(key)?;
                if !(MIN_SCALE_PERCENT..=MAX_SCALE_PERCENT).contains(scale_percent) {
                    return Err(AppError::validation(format!(
                        "scale_percent must be between {MIN_SCALE_PERCENT} and \
                         {MAX_SCALE_PERCENT}, got {scale_percent}"
                    )));
                }
            }
        }
        Ok(())
    }
}

fn require_key(key: &str) -> AppResult<()> {
    if key.trim().is_empty() {
        return Err(AppError::validation("input key must be non-empty"));
    }
    Ok(())
}
