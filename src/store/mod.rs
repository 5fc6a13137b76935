//! Client side of the remote avatar store.
//!
//! The store is an external service with three operations:
//!
//! | Operation | Reply |
//! |---|---|
//! | `uploadAvatar(bytes)` | `{"ok": id}` or `{"err": message}` |
//! | `getAvatar(id)` | `{"ok": bytes}` / `{"err": message}`, or the older bare `[]` / `[bytes]` |
//! | `getAllAvatarIds()` | `[id, ...]` |
//!
//! [`AvatarStore`] returns replies in their wire shape; turning them into
//! typed values is the job of [`crate::outcome`]. Transport problems (no
//! connection, HTTP errors, unparseable bodies) surface as [`StoreError`]
//! directly from the trait.

pub mod http;

pub use http::HttpAvatarStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Identifier assigned by the store to an uploaded avatar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AvatarId(pub u64);

impl fmt::Display for AvatarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for AvatarId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(AvatarId)
    }
}

/// Tagged success/failure as the service returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteResult<T> {
    Ok(T),
    Err(String),
}

/// Revision of the `getAvatar` reply a deployment speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GetAvatarShape {
    /// `{"ok": bytes}` or `{"err": message}`.
    #[default]
    Result,
    /// Bare optional: `[]` or `[bytes]`, no error channel.
    Optional,
}

/// A `getAvatar` reply in whichever revision the store used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvatarReply {
    Result(RemoteResult<Vec<u8>>),
    Optional(Option<Vec<u8>>),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("network error: {0}")]
    Network(String),
    #[error("store API error (status {status}): {message}")]
    Api { status: u16, message: String },
    #[error("malformed store reply: {0}")]
    Malformed(String),
    /// The store answered with an explicit `err`.
    #[error("store rejected the request: {0}")]
    Rejected(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Malformed(err.to_string())
    }
}

/// The three store operations.
#[async_trait]
pub trait AvatarStore: Send + Sync {
    /// Store bytes and return the assigned identifier (or the service's error).
    async fn upload_avatar(&self, bytes: Vec<u8>) -> Result<RemoteResult<u64>, StoreError>;

    /// Fetch stored bytes for an identifier.
    async fn get_avatar(&self, id: AvatarId) -> Result<AvatarReply, StoreError>;

    /// Every identifier the store holds.
    async fn get_all_avatar_ids(&self) -> Result<Vec<AvatarId>, StoreError>;
}
