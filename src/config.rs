//! Client configuration module.
//!
//! Handles loading, validating, and merging `avatar.toml`. Stock defaults are
//! serialized to a TOML table and the user's file is merged on top, so a
//! config file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [limits]
//! max_bytes = 10485760        # Largest accepted selection (10 MiB)
//!
//! [transform]
//! max_dimension = 800         # Longer edge bound after downscaling
//! quality = 90                # JPEG quality (1-100)
//! format = "auto"             # auto | png | jpeg
//! style = "none"              # none | cartoon | comic | 3d
//!
//! [upload]
//! deadline_secs = 120         # Client-side deadline for the store write
//!
//! [store]
//! local_url = "http://127.0.0.1:4943/avatar"
//! public_url = "https://avatar-store.icp0.io/avatar"
//! request_timeout_secs = 300  # Transport timeout, independent of the deadline
//! get_avatar_shape = "result" # result | optional
//! ```
//!
//! Which of the two store URLs is used is decided at deployment time by the
//! `AVATAR_NETWORK` environment variable (`local` or `ic`), never by the
//! config file.
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{OutputFormat, Style};
use crate::store::GetAvatarShape;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Environment variable selecting the store deployment.
pub const NETWORK_ENV: &str = "AVATAR_NETWORK";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Client configuration loaded from `avatar.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Selection limits checked before any processing.
    pub limits: LimitsConfig,
    /// Decode / resize / stylize / encode settings.
    pub transform: TransformConfig,
    /// Upload deadline.
    pub upload: UploadConfig,
    /// Remote avatar store endpoints.
    pub store: StoreConfig,
}

impl AppConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.limits.max_bytes == 0 {
            return Err(ConfigError::Validation(
                "limits.max_bytes must be non-zero".into(),
            ));
        }
        if self.transform.max_dimension == 0 {
            return Err(ConfigError::Validation(
                "transform.max_dimension must be non-zero".into(),
            ));
        }
        if !(1..=100).contains(&self.transform.quality) {
            return Err(ConfigError::Validation(
                "transform.quality must be 1-100".into(),
            ));
        }
        if self.upload.deadline_secs == 0 {
            return Err(ConfigError::Validation(
                "upload.deadline_secs must be non-zero".into(),
            ));
        }
        for (key, url) in [
            ("store.local_url", &self.store.local_url),
            ("store.public_url", &self.store.public_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Validation(format!(
                    "{key} must be an http(s) URL, got '{url}'"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Maximum accepted file size in bytes.
    pub max_bytes: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransformConfig {
    /// Neither output side exceeds this many pixels.
    pub max_dimension: u32,
    /// Lossy encoding quality (1 = worst, 100 = best).
    pub quality: u32,
    pub format: OutputFormat,
    pub style: Style,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            max_dimension: 800,
            quality: 90,
            format: OutputFormat::Auto,
            style: Style::None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadConfig {
    pub deadline_secs: u64,
}

impl UploadConfig {
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self { deadline_secs: 120 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Gateway of a locally running store replica.
    pub local_url: String,
    /// Gateway of the public deployment.
    pub public_url: String,
    /// Transport-level timeout for every store request.
    pub request_timeout_secs: u64,
    /// Which `getAvatar` response revision the deployment speaks.
    pub get_avatar_shape: GetAvatarShape,
}

impl StoreConfig {
    /// Base URL for the given deployment.
    pub fn endpoint(&self, network: Network) -> &str {
        match network {
            Network::Local => &self.local_url,
            Network::Ic => &self.public_url,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            local_url: "http://127.0.0.1:4943/avatar".to_string(),
            public_url: "https://avatar-store.icp0.io/avatar".to_string(),
            request_timeout_secs: 300,
            get_avatar_shape: GetAvatarShape::Result,
        }
    }
}

/// Store deployment, chosen at deploy time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Local,
    Ic,
}

impl Network {
    /// Parse a network name. Unknown names are an error, absent means local.
    pub fn parse(value: Option<&str>) -> Result<Self, ConfigError> {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            None | Some("") | Some("local") => Ok(Network::Local),
            Some("ic") | Some("public") => Ok(Network::Ic),
            Some(other) => Err(ConfigError::Validation(format!(
                "{NETWORK_ENV} must be 'local' or 'ic', got '{other}'"
            ))),
        }
    }

    /// Read [`NETWORK_ENV`] from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::parse(std::env::var(NETWORK_ENV).ok().as_deref())
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(AppConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
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

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<AppConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: AppConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from a TOML file.
///
/// A missing file is not an error: stock defaults are used. A file that
/// exists but fails to parse or validate is.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return resolve_config(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    resolve_config(Some(value))
}

/// Returns a fully-commented stock `avatar.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Avatar Studio Configuration
# ==========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Selection limits
# ---------------------------------------------------------------------------
[limits]
# Largest accepted file, in bytes. Larger selections are rejected before
# they are decoded.
max_bytes = 10485760

# ---------------------------------------------------------------------------
# Transform
# ---------------------------------------------------------------------------
[transform]
# Images wider or taller than this are downscaled, keeping aspect ratio,
# so the longer edge equals this value.
max_dimension = 800

# JPEG encoding quality (1 = worst, 100 = best). PNG output is lossless.
quality = 90

# Output format: "auto" keeps JPEG as JPEG and writes everything else as PNG.
format = "auto"

# Stylization: "none", "cartoon", "comic" or "3d".
style = "none"

# ---------------------------------------------------------------------------
# Upload
# ---------------------------------------------------------------------------
[upload]
# Give up waiting for the store after this many seconds.
deadline_secs = 120

# ---------------------------------------------------------------------------
# Avatar store
# ---------------------------------------------------------------------------
[store]
# Selected with AVATAR_NETWORK=local (default) or AVATAR_NETWORK=ic.
local_url = "http://127.0.0.1:4943/avatar"
public_url = "https://avatar-store.icp0.io/avatar"

# Transport timeout per request, independent of upload.deadline_secs.
request_timeout_secs = 300

# getAvatar response revision: "result" ({"ok": bytes} | {"err": text})
# or "optional" (the older bare [] | [bytes] form).
get_avatar_shape = "result"
"##
}
