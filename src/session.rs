//! Session state: the single-slot image, the status line, and run tagging.
//!
//! A session holds exactly one [`TransformedImage`] and one [`UiStatus`].
//! Every selection and every upload trigger starts a new run and is handed a
//! [`RunTicket`] carrying a monotonically increasing sequence number. When an
//! asynchronous step finishes it reports back with its ticket; if a newer run
//! has started meanwhile the completion is stale and is dropped, so a slow
//! old run can never overwrite a newer result.
//!
//! The upload trigger is a separate flag. [`Session::begin_upload`] claims it
//! and returns an [`UploadGuard`]; dropping the guard re-enables the trigger
//! whatever happened to the upload.
//!
//! State is kept behind a `Mutex` and never held across an `.await`.
//!
//! ```text
//! Idle ──select ok──▶ Ready ──upload──▶ Processing ──▶ Success | Error
//!   │                   ▲                                  │
//!   └──rejected──▶ Error└──────────── select ok ───────────┘
//! ```

use crate::types::TransformedImage;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// User-visible state with an optional message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiStatus {
    Idle,
    Ready(Option<String>),
    Processing(Option<String>),
    Success(Option<String>),
    Error(Option<String>),
}

impl UiStatus {
    pub fn label(&self) -> &'static str {
        match self {
            UiStatus::Idle => "idle",
            UiStatus::Ready(_) => "ready",
            UiStatus::Processing(_) => "processing",
            UiStatus::Success(_) => "success",
            UiStatus::Error(_) => "error",
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            UiStatus::Idle => None,
            UiStatus::Ready(m)
            | UiStatus::Processing(m)
            | UiStatus::Success(m)
            | UiStatus::Error(m) => m.as_deref(),
        }
    }
}

impl fmt::Display for UiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(m) => write!(f, "[{}] {}", self.label(), m),
            None => write!(f, "[{}]", self.label()),
        }
    }
}

/// Identifies one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RunTicket(u64);

impl RunTicket {
    pub fn seq(self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
struct State {
    seq: u64,
    image: Option<TransformedImage>,
    status: UiStatus,
    trigger_enabled: bool,
}

/// Shared handle to one session. Cloning shares the state.
#[derive(Debug, Clone)]
pub struct Session {
    state: Arc<Mutex<State>>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                seq: 0,
                image: None,
                status: UiStatus::Idle,
                trigger_enabled: true,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panic while holding the lock leaves plain data behind; keep going.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn status(&self) -> UiStatus {
        self.lock().status.clone()
    }

    pub fn image(&self) -> Option<TransformedImage> {
        self.lock().image.clone()
    }

    pub fn trigger_enabled(&self) -> bool {
        self.lock().trigger_enabled
    }

    pub fn current_seq(&self) -> u64 {
        self.lock().seq
    }

    /// Start a selection run. The new run supersedes anything in flight.
    pub fn begin_selection(&self) -> RunTicket {
        let mut state = self.lock();
        state.seq += 1;
        RunTicket(state.seq)
    }

    /// Claim the upload trigger and start an upload run.
    ///
    /// Returns `None` when the trigger is already disabled by an upload in
    /// flight. On success the image to upload is cloned out of the slot so
    /// the lock is not held during the upload.
    pub fn begin_upload(&self) -> Option<UploadGuard> {
        let mut state = self.lock();
        if !state.trigger_enabled {
            return None;
        }
        state.trigger_enabled = false;
        state.seq += 1;
        Some(UploadGuard {
            session: self.clone(),
            ticket: RunTicket(state.seq),
            image: state.image.clone(),
        })
    }

    /// Set the status if `ticket` is still the current run.
    ///
    /// Returns `false` (and changes nothing) for a stale ticket.
    pub fn set_status(&self, ticket: RunTicket, status: UiStatus) -> bool {
        let mut state = self.lock();
        if ticket.0 != state.seq {
            debug!(
                ticket = ticket.0,
                current = state.seq,
                status = status.label(),
                "discarding stale status"
            );
            return false;
        }
        state.status = status;
        true
    }

    /// Replace the image slot and status together if `ticket` is current.
    pub fn complete_selection(
        &self,
        ticket: RunTicket,
        image: Option<TransformedImage>,
        status: UiStatus,
    ) -> bool {
        let mut state = self.lock();
        if ticket.0 != state.seq {
            debug!(
                ticket = ticket.0,
                current = state.seq,
                "discarding stale selection"
            );
            return false;
        }
        state.image = image;
        state.status = status;
        true
    }
}

/// Held for the duration of an upload; re-enables the trigger on drop.
#[derive(Debug)]
pub struct UploadGuard {
    session: Session,
    ticket: RunTicket,
    image: Option<TransformedImage>,
}

impl UploadGuard {
    pub fn ticket(&self) -> RunTicket {
        self.ticket
    }

    /// The image that was in the slot when the upload was triggered.
    pub fn image(&self) -> Option<&TransformedImage> {
        self.image.as_ref()
    }
}

impl Drop for UploadGuard {
    fn drop(&mut self) {
        self.session.lock().trigger_enabled = true;
    }
}
