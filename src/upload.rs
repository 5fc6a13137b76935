//! The uploader: one store write raced against a client-side deadline.
//!
//! Whichever finishes first wins. If the deadline fires, the store future is
//! dropped, so its eventual reply (if any) is never observed. This is
//! independent of the transport's own request timeout.
//!
//! While an upload runs the session's trigger is disabled: [`Uploader::submit`]
//! takes ownership of the [`UploadGuard`] that claimed it, and the trigger
//! comes back when the guard drops, on every exit path.

use crate::error::PipelineError;
use crate::outcome::unwrap_upload;
use crate::session::{RunTicket, UploadGuard};
use crate::store::{AvatarId, AvatarStore};
use crate::types::TransformedImage;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

/// A finished upload, tagged with the run that produced it.
#[derive(Debug, Clone)]
pub struct Uploaded {
    pub ticket: RunTicket,
    pub id: AvatarId,
    pub image: TransformedImage,
}

#[derive(Clone)]
pub struct Uploader {
    store: Arc<dyn AvatarStore>,
    deadline: Duration,
}

impl Uploader {
    pub fn new(store: Arc<dyn AvatarStore>, deadline: Duration) -> Self {
        Self { store, deadline }
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Upload the image captured by `guard`.
    ///
    /// Consumes the guard, so the trigger is re-enabled as soon as the race
    /// settles, whichever way it goes.
    pub async fn submit(&self, guard: UploadGuard) -> Result<Uploaded, PipelineError> {
        let ticket = guard.ticket();
        let image = guard.image().cloned().ok_or(PipelineError::NoSelection)?;
        let id = self.upload(&image).await?;
        drop(guard);
        Ok(Uploaded { ticket, id, image })
    }

    /// Race a single store write against the deadline.
    pub async fn upload(&self, image: &TransformedImage) -> Result<AvatarId, PipelineError> {
        let started = Instant::now();
        let len = image.bytes.len();
        let call = self.store.upload_avatar(image.bytes.clone());

        match tokio::time::timeout(self.deadline, call).await {
            Ok(Ok(reply)) => {
                let id = unwrap_upload(reply)?;
                info!(
                    %id,
                    len,
                    digest = image.short_digest(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "avatar uploaded"
                );
                Ok(id)
            }
            Ok(Err(err)) => {
                warn!(len, error = %err, "upload failed");
                Err(err.into())
            }
            Err(_) => {
                warn!(
                    len,
                    deadline_secs = self.deadline.as_secs(),
                    "upload deadline elapsed"
                );
                Err(PipelineError::Timeout(self.deadline))
            }
        }
    }
}
