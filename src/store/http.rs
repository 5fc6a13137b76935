//! HTTP gateway client for the avatar store.
//!
//! Each store operation is one request against the configured base URL:
//!
//! ```text
//! POST {base}/uploadAvatar        body: raw image bytes
//! GET  {base}/getAvatar/{id}
//! GET  {base}/getAllAvatarIds
//! ```
//!
//! Replies are JSON. The client carries its own request timeout; the
//! uploader's deadline is enforced separately on top of it.

use super::{AvatarId, AvatarReply, AvatarStore, GetAvatarShape, RemoteResult, StoreError};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

pub struct HttpAvatarStore {
    client: reqwest::Client,
    base_url: String,
    shape: GetAvatarShape,
}

impl HttpAvatarStore {
    pub fn new(
        base_url: &str,
        request_timeout: Duration,
        shape: GetAvatarShape,
    ) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self::with_client(client, base_url, shape))
    }

    /// Use a preconfigured client.
    pub fn with_client(client: reqwest::Client, base_url: &str, shape: GetAvatarShape) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            shape,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Send a request and return the body of a successful response.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Vec<u8>, StoreError> {
        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(resp.bytes().await?.to_vec())
    }
}

/// Parse a `getAvatar` body according to the deployment's reply revision.
pub fn decode_avatar_body(shape: GetAvatarShape, body: &[u8]) -> Result<AvatarReply, StoreError> {
    match shape {
        GetAvatarShape::Result => {
            let result: RemoteResult<Vec<u8>> = serde_json::from_slice(body)?;
            Ok(AvatarReply::Result(result))
        }
        GetAvatarShape::Optional => {
            // An optional travels as a zero- or one-element array
            let mut items: Vec<Vec<u8>> = serde_json::from_slice(body)?;
            if items.len() > 1 {
                return Err(StoreError::Malformed(format!(
                    "optional reply has {} elements",
                    items.len()
                )));
            }
            Ok(AvatarReply::Optional(items.pop()))
        }
    }
}

#[async_trait]
impl AvatarStore for HttpAvatarStore {
    async fn upload_avatar(&self, bytes: Vec<u8>) -> Result<RemoteResult<u64>, StoreError> {
        let len = bytes.len();
        let body = self
            .send(
                self.client
                    .post(self.url("uploadAvatar"))
                    .header("Content-Type", "application/octet-stream")
                    .body(bytes),
            )
            .await?;
        debug!(len, reply_len = body.len(), "uploadAvatar replied");
        Ok(serde_json::from_slice(&body)?)
    }

    async fn get_avatar(&self, id: AvatarId) -> Result<AvatarReply, StoreError> {
        let body = self
            .send(self.client.get(self.url(&format!("getAvatar/{id}"))))
            .await?;
        debug!(%id, reply_len = body.len(), "getAvatar replied");
        decode_avatar_body(self.shape, &body)
    }

    async fn get_all_avatar_ids(&self) -> Result<Vec<AvatarId>, StoreError> {
        let body = self.send(self.client.get(self.url("getAllAvatarIds"))).await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
