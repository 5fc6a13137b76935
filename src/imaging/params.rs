//! Parameter types for image operations.
//!
//! These describe *what* the transformer should produce, not how. They are
//! built once from [`TransformConfig`](crate::config::TransformConfig) and
//! passed down to the codec and stylization passes.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`OutputFormat`]: Target encoding; `Auto` follows the input.
//! - [`Style`]: Which fixed stylization recipe to run, if any.
//! - [`TransformParams`]: Everything the transformer needs in one value.

use crate::config::TransformConfig;
use crate::validate::AcceptedType;
use serde::{Deserialize, Serialize};

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Output encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JPEG stays JPEG, anything else becomes PNG.
    #[default]
    Auto,
    Png,
    Jpeg,
}

/// Concrete encoding after `Auto` has been resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Png,
    Jpeg,
}

impl Encoding {
    pub fn mime(self) -> &'static str {
        match self {
            Encoding::Png => "image/png",
            Encoding::Jpeg => "image/jpeg",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Encoding::Png => "png",
            Encoding::Jpeg => "jpg",
        }
    }
}

impl OutputFormat {
    pub fn resolve(self, input: AcceptedType) -> Encoding {
        match (self, input) {
            (OutputFormat::Png, _) => Encoding::Png,
            (OutputFormat::Jpeg, _) => Encoding::Jpeg,
            (OutputFormat::Auto, AcceptedType::Jpeg) => Encoding::Jpeg,
            (OutputFormat::Auto, _) => Encoding::Png,
        }
    }
}

/// Stylization recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    #[default]
    None,
    Cartoon,
    Comic,
    #[serde(rename = "3d", alias = "relief")]
    Relief,
}

impl Style {
    pub fn label(self) -> &'static str {
        match self {
            Style::None => "none",
            Style::Cartoon => "cartoon",
            Style::Comic => "comic",
            Style::Relief => "3d",
        }
    }
}

/// Everything one transform run needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformParams {
    pub max_dimension: u32,
    pub quality: Quality,
    pub format: OutputFormat,
    pub style: Style,
}

impl TransformParams {
    pub fn from_config(config: &TransformConfig) -> Self {
        Self {
            max_dimension: config.max_dimension,
            quality: Quality::new(config.quality),
            format: config.format,
            style: config.style,
        }
    }
}

impl Default for TransformParams {
    fn default() -> Self {
        Self::from_config(&TransformConfig::default())
    }
}
