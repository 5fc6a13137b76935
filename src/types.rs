//! Values that flow between pipeline stages.
//!
//! A [`SelectedFile`] is what the user picked; a [`TransformedImage`] is what
//! gets uploaded. The two are deliberately separate types so raw selection
//! bytes can never be handed to the uploader by accident.

use crate::imaging::Encoding;
use sha2::{Digest, Sha256};
use std::fmt;

/// A file as picked by the user, before any checks.
#[derive(Clone, PartialEq, Eq)]
pub struct SelectedFile {
    /// Display name (file name on disk), if known.
    pub name: Option<String>,
    /// Media type the picker declared. Not verified against the content.
    pub declared_type: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: Option<String>, declared_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name,
            declared_type: declared_type.into(),
            bytes,
        }
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedFile")
            .field("name", &self.name)
            .field("declared_type", &self.declared_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Encoded output of the transformer, ready for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct TransformedImage {
    pub bytes: Vec<u8>,
    pub encoding: Encoding,
    pub width: u32,
    pub height: u32,
    /// Hex SHA-256 of `bytes`.
    pub digest: String,
}

impl TransformedImage {
    pub fn new(bytes: Vec<u8>, encoding: Encoding, width: u32, height: u32) -> Self {
        let digest = sha256_hex(&bytes);
        Self {
            bytes,
            encoding,
            width,
            height,
            digest,
        }
    }

    pub fn media_type(&self) -> &'static str {
        self.encoding.mime()
    }

    /// First 12 hex digits of the digest, for log lines.
    pub fn short_digest(&self) -> &str {
        &self.digest[..12.min(self.digest.len())]
    }
}

impl fmt::Debug for TransformedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformedImage")
            .field("encoding", &self.encoding)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("len", &self.bytes.len())
            .field("digest", &self.short_digest())
            .finish()
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
