//! Wiring: select → validate → transform, then upload → unwrap → read back.
//!
//! [`Pipeline`] owns one [`Session`] and runs the user-triggered flows
//! against it. Each flow starts a new run; progress is reported through an
//! optional event channel (the same shape as a CLI progress printer would
//! consume) and every status change goes through the session's ticket check,
//! so a superseded run cannot overwrite what a newer one reported.

use crate::config::AppConfig;
use crate::error::PipelineError;
use crate::imaging::{TransformError, Transformer, TransformParams};
use crate::outcome::{StoredAvatar, unwrap_avatar};
use crate::present::{MSG_PROCESSING, MSG_SUCCESS, PipelineEvent, nothing_stored_message};
use crate::session::{RunTicket, Session, UiStatus};
use crate::store::{AvatarId, AvatarStore};
use crate::types::{SelectedFile, TransformedImage};
use crate::upload::Uploader;
use crate::validate::{Limits, validate};
use std::sync::Arc;
use std::sync::mpsc::Sender;
use tracing::{info, warn};

/// Result of a completed upload run.
#[derive(Debug, Clone)]
pub struct Created {
    pub id: AvatarId,
    pub image: TransformedImage,
    /// What the read-back found under `id`. `Absent` still keeps the id.
    pub stored: StoredAvatar,
}

pub struct Pipeline {
    limits: Limits,
    transformer: Transformer,
    uploader: Uploader,
    store: Arc<dyn AvatarStore>,
    session: Session,
    events: Option<Sender<PipelineEvent>>,
}

impl Pipeline {
    pub fn new(
        config: &AppConfig,
        store: Arc<dyn AvatarStore>,
        events: Option<Sender<PipelineEvent>>,
    ) -> Self {
        Self {
            limits: Limits::from_config(&config.limits),
            transformer: Transformer::new(TransformParams::from_config(&config.transform)),
            uploader: Uploader::new(store.clone(), config.upload.deadline()),
            store,
            session: Session::new(),
            events,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn emit(&self, event: PipelineEvent) {
        if let Some(tx) = &self.events {
            // Receiver gone means nobody is watching; the run still completes
            let _ = tx.send(event);
        }
    }

    fn report(&self, ticket: RunTicket, status: UiStatus) {
        if self.session.set_status(ticket, status.clone()) {
            self.emit(PipelineEvent::Status(status));
        }
    }

    fn fail(&self, ticket: RunTicket, err: PipelineError) -> PipelineError {
        warn!(run = ticket.seq(), kind = err.kind(), error = %err, "run failed");
        self.report(ticket, UiStatus::Error(Some(err.user_message())));
        err
    }

    /// Handle a new file selection.
    ///
    /// Supersedes any earlier run. On rejection or decode failure the image
    /// slot is cleared so the previous selection cannot be uploaded by
    /// mistake.
    pub async fn select(&self, file: SelectedFile) -> Result<TransformedImage, PipelineError> {
        let ticket = self.session.begin_selection();
        self.emit(PipelineEvent::Selected {
            name: file.name.clone(),
            declared_type: file.declared_type.clone(),
            len: file.len(),
        });

        let accepted = match validate(&file.declared_type, file.len(), &self.limits) {
            Ok(accepted) => accepted,
            Err(err) => return Err(self.fail_selection(ticket, err.into())),
        };
        self.emit(PipelineEvent::Accepted);

        // Decode and pixel passes are CPU-bound; keep them off the event loop
        let transformer = self.transformer;
        let transformed = tokio::task::spawn_blocking(move || transformer.transform(&file, accepted))
            .await
            .map_err(|e| TransformError::DecodeFailed(format!("transform task failed: {e}")))
            .and_then(|r| r);
        let image = match transformed {
            Ok(image) => image,
            Err(err) => return Err(self.fail_selection(ticket, err.into())),
        };

        let status = UiStatus::Ready(None);
        if self
            .session
            .complete_selection(ticket, Some(image.clone()), status.clone())
        {
            self.emit(PipelineEvent::Transformed {
                width: image.width,
                height: image.height,
                media_type: image.media_type(),
                len: image.bytes.len() as u64,
                style: self.transformer.params().style.label(),
                digest: image.digest.clone(),
            });
            self.emit(PipelineEvent::Status(status));
        }
        Ok(image)
    }

    fn fail_selection(&self, ticket: RunTicket, err: PipelineError) -> PipelineError {
        warn!(run = ticket.seq(), kind = err.kind(), error = %err, "selection rejected");
        let status = UiStatus::Error(Some(err.user_message()));
        if self.session.complete_selection(ticket, None, status.clone()) {
            self.emit(PipelineEvent::Status(status));
        }
        err
    }

    /// Upload the current image and read it back.
    pub async fn upload(&self) -> Result<Created, PipelineError> {
        let Some(guard) = self.session.begin_upload() else {
            // The in-flight upload owns the status line; leave it alone
            warn!("upload triggered while another is in flight");
            return Err(PipelineError::Busy);
        };
        let ticket = guard.ticket();
        if guard.image().is_none() {
            drop(guard);
            return Err(self.fail(ticket, PipelineError::NoSelection));
        }

        self.report(ticket, UiStatus::Processing(Some(MSG_PROCESSING.to_string())));
        let uploaded = match self.uploader.submit(guard).await {
            Ok(uploaded) => uploaded,
            Err(err) => return Err(self.fail(ticket, err)),
        };
        self.emit(PipelineEvent::Uploaded { id: uploaded.id });

        let stored = match self.fetch(uploaded.id).await {
            Ok(stored) => stored,
            Err(err) => return Err(self.fail(ticket, err)),
        };
        let status = match &stored {
            StoredAvatar::Found(_) => {
                info!(run = ticket.seq(), id = %uploaded.id, "avatar created");
                UiStatus::Success(Some(MSG_SUCCESS.to_string()))
            }
            StoredAvatar::Absent => {
                // The image stays in the slot, so the user can upload again
                warn!(run = ticket.seq(), id = %uploaded.id, "read-back found nothing stored");
                UiStatus::Ready(Some(nothing_stored_message(uploaded.id)))
            }
        };
        self.report(ticket, status);

        Ok(Created {
            id: uploaded.id,
            image: uploaded.image,
            stored,
        })
    }

    /// Fetch a stored avatar by identifier.
    ///
    /// Absence is a normal answer here, not an error.
    pub async fn fetch(&self, id: AvatarId) -> Result<StoredAvatar, PipelineError> {
        let reply = self.store.get_avatar(id).await?;
        let stored = unwrap_avatar(reply)?;
        self.emit(match &stored {
            StoredAvatar::Found(bytes) => PipelineEvent::Stored {
                id,
                len: bytes.len() as u64,
            },
            StoredAvatar::Absent => PipelineEvent::Absent { id },
        });
        Ok(stored)
    }

    /// Every identifier the store holds.
    pub async fn list(&self) -> Result<Vec<AvatarId>, PipelineError> {
        let ids = self.store.get_all_avatar_ids().await?;
        self.emit(PipelineEvent::Listed { ids: ids.clone() });
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::{Encoding, codec};
    use crate::store::GetAvatarShape;
    use crate::store::tests::MemoryStore;
    use crate::test_helpers::solid_png;
    use std::sync::mpsc;
    use std::time::Duration;

    const MIB: usize = 1024 * 1024;

    fn pipeline(store: Arc<MemoryStore>) -> (Pipeline, mpsc::Receiver<PipelineEvent>) {
        let (tx, rx) = mpsc::channel();
        (Pipeline::new(&AppConfig::default(), store, Some(tx)), rx)
    }

    fn red_png_file() -> SelectedFile {
        SelectedFile::new(
            Some("red.png".into()),
            "image/png",
            solid_png(50, 50, [255, 0, 0, 255]),
        )
    }

    fn statuses(rx: &mpsc::Receiver<PipelineEvent>) -> Vec<UiStatus> {
        rx.try_iter()
            .filter_map(|e| match e {
                PipelineEvent::Status(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn red_png_round_trip() {
        let store = Arc::new(MemoryStore::new());
        let (pipeline, rx) = pipeline(store.clone());

        let image = pipeline.select(red_png_file()).await.unwrap();
        assert!(image.width <= 800 && image.height <= 800);
        assert_eq!(image.encoding, Encoding::Png);
        assert!(matches!(pipeline.session().status(), UiStatus::Ready(_)));

        let created = pipeline.upload().await.unwrap();
        assert_eq!(created.id, AvatarId(0));
        let stored = created.stored.bytes().unwrap();
        assert_eq!(stored, image.bytes.as_slice());
        let decoded = codec::decode(stored).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (50, 50));

        assert_eq!(
            pipeline.session().status(),
            UiStatus::Success(Some(MSG_SUCCESS.into()))
        );
        assert_eq!(
            statuses(&rx),
            vec![
                UiStatus::Ready(None),
                UiStatus::Processing(Some(MSG_PROCESSING.into())),
                UiStatus::Success(Some(MSG_SUCCESS.into())),
            ]
        );
    }

    #[tokio::test]
    async fn oversized_jpeg_rejected_before_transform() {
        let store = Arc::new(MemoryStore::new());
        let (pipeline, rx) = pipeline(store.clone());
        // Not a real JPEG: the validator must reject it before decoding
        let file = SelectedFile::new(Some("big.jpg".into()), "image/jpeg", vec![0u8; 20 * MIB]);

        let err = pipeline.select(file).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Validation(crate::validate::ValidationError::TooLarge { .. })
        ));
        let events: Vec<PipelineEvent> = rx.try_iter().collect();
        assert!(!events.iter().any(|e| matches!(e, PipelineEvent::Transformed { .. })));
        assert!(!events.contains(&PipelineEvent::Accepted));
        match pipeline.session().status() {
            UiStatus::Error(Some(msg)) => assert!(msg.contains("too large"), "{msg}"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(pipeline.session().image().is_none());
    }

    #[tokio::test]
    async fn text_file_is_unsupported() {
        let (pipeline, _rx) = pipeline(Arc::new(MemoryStore::new()));
        let file = SelectedFile::new(Some("notes.txt".into()), "text/plain", b"hello".to_vec());
        let err = pipeline.select(file).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Validation(crate::validate::ValidationError::UnsupportedType(_))
        ));
    }

    #[tokio::test]
    async fn rejected_selection_clears_previous_image() {
        let store = Arc::new(MemoryStore::new());
        let (pipeline, _rx) = pipeline(store.clone());
        pipeline.select(red_png_file()).await.unwrap();
        assert!(pipeline.session().image().is_some());

        let bad = SelectedFile::new(None, "image/png", b"not a png".to_vec());
        let err = pipeline.select(bad).await.unwrap_err();
        assert_eq!(err.kind(), "decode");
        assert!(pipeline.session().image().is_none());

        // Nothing to upload now
        let err = pipeline.upload().await.unwrap_err();
        assert!(matches!(err, PipelineError::NoSelection));
        assert_eq!(store.uploads(), 0);
    }

    #[tokio::test]
    async fn upload_without_selection() {
        let (pipeline, _rx) = pipeline(Arc::new(MemoryStore::new()));
        let err = pipeline.upload().await.unwrap_err();
        assert!(matches!(err, PipelineError::NoSelection));
        assert_eq!(
            pipeline.session().status(),
            UiStatus::Error(Some("Please select a photo first".into()))
        );
        assert!(pipeline.session().trigger_enabled());
    }

    #[tokio::test]
    async fn empty_read_back_keeps_assigned_id() {
        // Upload succeeds but the store answers the read with an empty result
        struct Forgetful(MemoryStore);

        #[async_trait::async_trait]
        impl AvatarStore for Forgetful {
            async fn upload_avatar(
                &self,
                bytes: Vec<u8>,
            ) -> Result<crate::store::RemoteResult<u64>, crate::store::StoreError> {
                self.0.upload_avatar(bytes).await
            }
            async fn get_avatar(
                &self,
                _id: AvatarId,
            ) -> Result<crate::store::AvatarReply, crate::store::StoreError> {
                Ok(crate::store::AvatarReply::Result(crate::store::RemoteResult::Ok(vec![])))
            }
            async fn get_all_avatar_ids(&self) -> Result<Vec<AvatarId>, crate::store::StoreError> {
                self.0.get_all_avatar_ids().await
            }
        }

        let pipeline = Pipeline::new(
            &AppConfig::default(),
            Arc::new(Forgetful(MemoryStore::new())),
            None,
        );
        pipeline.select(red_png_file()).await.unwrap();
        let created = pipeline.upload().await.unwrap();
        assert_eq!(created.id, AvatarId(0));
        assert_eq!(created.stored, StoredAvatar::Absent);

        let status = pipeline.session().status();
        assert_eq!(
            status,
            UiStatus::Ready(Some("Uploaded as avatar 0, but nothing is stored under that id.".into()))
        );
        // Still uploadable: the image was kept and the trigger is back
        assert!(pipeline.session().image().is_some());
        assert!(pipeline.session().trigger_enabled());
    }

    #[tokio::test]
    async fn store_rejection_surfaces_as_error_status() {
        let store = Arc::new(MemoryStore::rejecting("quota exceeded"));
        let (pipeline, _rx) = pipeline(store);
        pipeline.select(red_png_file()).await.unwrap();

        let err = pipeline.upload().await.unwrap_err();
        assert_eq!(err.kind(), "transport");
        assert!(err.to_string().contains("quota exceeded"));
        assert!(matches!(pipeline.session().status(), UiStatus::Error(Some(_))));
        assert!(pipeline.session().trigger_enabled());
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_store_reports_timeout_and_reenables_trigger() {
        let mut config = AppConfig::default();
        config.upload.deadline_secs = 120;
        let pipeline = Pipeline::new(&config, Arc::new(MemoryStore::hanging()), None);
        pipeline.select(red_png_file()).await.unwrap();

        let err = pipeline.upload().await.unwrap_err();
        assert!(matches!(err, PipelineError::Timeout(d) if d == Duration::from_secs(120)));
        assert!(pipeline.session().trigger_enabled());
        assert_eq!(
            pipeline.session().status(),
            UiStatus::Error(Some(err.user_message()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn second_trigger_while_uploading_is_busy() {
        let pipeline = Pipeline::new(
            &AppConfig::default(),
            Arc::new(MemoryStore::hanging()),
            None,
        );
        pipeline.select(red_png_file()).await.unwrap();

        let (first, second) = tokio::join!(pipeline.upload(), pipeline.upload());
        assert!(matches!(first, Err(PipelineError::Timeout(_))));
        assert!(matches!(second, Err(PipelineError::Busy)));
        // The busy refusal did not clobber the first run's status
        assert_eq!(
            pipeline.session().status(),
            UiStatus::Error(Some(PipelineError::Timeout(Duration::from_secs(120)).user_message()))
        );
    }

    #[tokio::test]
    async fn newer_selection_wins_over_older() {
        let (pipeline, _rx) = pipeline(Arc::new(MemoryStore::new()));
        let first = SelectedFile::new(None, "image/png", solid_png(30, 30, [0, 0, 255, 255]));
        let second = SelectedFile::new(None, "image/png", solid_png(40, 20, [0, 255, 0, 255]));

        let (a, b) = tokio::join!(pipeline.select(first), pipeline.select(second));
        let (a, b) = (a.unwrap(), b.unwrap());
        // Both transforms finish, but only the later-started run owns the slot
        let slot = pipeline.session().image().unwrap();
        assert_eq!(slot.digest, b.digest);
        assert_ne!(slot.digest, a.digest);
    }

    #[tokio::test]
    async fn fetch_and_list() {
        let store = Arc::new(MemoryStore::with_shape(GetAvatarShape::Optional));
        let (pipeline, _rx) = pipeline(store.clone());
        pipeline.select(red_png_file()).await.unwrap();
        pipeline.upload().await.unwrap();

        assert_eq!(pipeline.list().await.unwrap(), vec![AvatarId(0)]);
        assert!(matches!(
            pipeline.fetch(AvatarId(0)).await.unwrap(),
            StoredAvatar::Found(_)
        ));
        assert_eq!(
            pipeline.fetch(AvatarId(9)).await.unwrap(),
            StoredAvatar::Absent
        );
    }

    #[tokio::test]
    async fn fetch_transport_failure() {
        let (pipeline, _rx) = pipeline(Arc::new(MemoryStore::offline()));
        let err = pipeline.fetch(AvatarId(0)).await.unwrap_err();
        assert_eq!(err.kind(), "transport");
    }
}
