//! Pre-flight checks on a selected file.
//!
//! Runs before any decoding: a file is accepted only when its declared media
//! type is one of the raster formats the transformer can read and its size is
//! within the configured ceiling. Everything here is a pure function of
//! `(declared type, byte length, limits)`.
//!
//! | Check | Rejection |
//! |---|---|
//! | Type not JPEG, PNG or GIF | [`ValidationError::UnsupportedType`] |
//! | Zero bytes | [`ValidationError::Empty`] |
//! | Longer than `max_bytes` | [`ValidationError::TooLarge`] |
//!
//! The type check runs first so a huge text file reports the more useful
//! "unsupported type" message.

use crate::config::LimitsConfig;
use std::path::Path;
use thiserror::Error;

/// Media types the transformer accepts, normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptedType {
    Jpeg,
    Png,
    Gif,
}

impl AcceptedType {
    /// Canonical MIME string.
    pub fn mime(self) -> &'static str {
        match self {
            AcceptedType::Jpeg => "image/jpeg",
            AcceptedType::Png => "image/png",
            AcceptedType::Gif => "image/gif",
        }
    }

    /// Parse a declared media type. Case-insensitive, parameters ignored.
    pub fn from_mime(declared: &str) -> Option<Self> {
        let essence = declared
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(AcceptedType::Jpeg),
            "image/png" => Some(AcceptedType::Png),
            "image/gif" => Some(AcceptedType::Gif),
            _ => None,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unsupported file type '{0}' (expected JPEG, PNG or GIF)")]
    UnsupportedType(String),
    #[error("file is {len} bytes, larger than the {max} byte limit")]
    TooLarge { len: u64, max: u64 },
    #[error("file is empty")]
    Empty,
}

/// Size and type policy applied to every selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_bytes: u64,
}

impl Limits {
    pub fn from_config(config: &LimitsConfig) -> Self {
        Self {
            max_bytes: config.max_bytes,
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self::from_config(&LimitsConfig::default())
    }
}

/// Accept or reject a candidate file.
pub fn validate(declared_type: &str, len: u64, limits: &Limits) -> Result<AcceptedType, ValidationError> {
    let accepted = AcceptedType::from_mime(declared_type)
        .ok_or_else(|| ValidationError::UnsupportedType(declared_type.to_string()))?;
    if len == 0 {
        return Err(ValidationError::Empty);
    }
    if len > limits.max_bytes {
        return Err(ValidationError::TooLarge {
            len,
            max: limits.max_bytes,
        });
    }
    Ok(accepted)
}

/// Guess the declared media type of a file on disk from its extension.
///
/// This stands in for the type a browser attaches to a picked file. Unknown
/// extensions map to `application/octet-stream`, which the validator rejects.
pub fn media_type_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" | "jpe" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "txt" | "md" => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Human-readable byte count for status messages.
pub fn format_size(size: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = size as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", size, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
