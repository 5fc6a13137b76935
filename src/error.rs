//! Pipeline error taxonomy.
//!
//! Every failure a run can hit is converted to one of these kinds before it
//! reaches the presenter. None are retried: the run ends and the user
//! re-triggers. The `Display` text is the diagnostic logged via `tracing`;
//! [`PipelineError::user_message`] is the short line shown as status.
//!
//! An empty read is not here: it is [`crate::outcome::StoredAvatar::Absent`].

use crate::imaging::TransformError;
use crate::store::StoreError;
use crate::validate::{ValidationError, format_size};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Rejected before any processing.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    /// The bytes could not be turned into an image (or back into bytes).
    #[error("transform failed: {0}")]
    Decode(#[from] TransformError),
    /// The store call failed, or the store answered with an error.
    #[error("store call failed: {0}")]
    Transport(#[from] StoreError),
    /// The upload deadline elapsed first.
    #[error("no reply from the store within {0:?}")]
    Timeout(Duration),
    /// Upload triggered with no transformed image in the session.
    #[error("upload requested with no image selected")]
    NoSelection,
    /// Upload triggered while another is still in flight.
    #[error("upload already in progress")]
    Busy,
}

impl PipelineError {
    /// Short identifier used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Validation(_) => "validation",
            PipelineError::Decode(_) => "decode",
            PipelineError::Transport(_) => "transport",
            PipelineError::Timeout(_) => "timeout",
            PipelineError::NoSelection => "no_selection",
            PipelineError::Busy => "busy",
        }
    }

    /// Human-readable status line.
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::Validation(ValidationError::UnsupportedType(_)) => {
                "Please choose a JPEG, PNG or GIF image.".to_string()
            }
            PipelineError::Validation(ValidationError::TooLarge { max, .. }) => {
                format!("Image is too large (maximum {}).", format_size(*max))
            }
            PipelineError::Validation(ValidationError::Empty) => {
                "The selected file is empty.".to_string()
            }
            PipelineError::Decode(_) => "That file could not be read as an image.".to_string(),
            PipelineError::Transport(_) => "Error creating avatar. Please try again.".to_string(),
            PipelineError::Timeout(_) => {
                "The avatar store did not answer in time. Please try again.".to_string()
            }
            PipelineError::NoSelection => "Please select a photo first".to_string(),
            PipelineError::Busy => "An upload is already in progress.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_large_message_names_limit() {
        let err = PipelineError::from(ValidationError::TooLarge {
            len: 20 * 1024 * 1024,
            max: 10 * 1024 * 1024,
        });
        assert_eq!(err.kind(), "validation");
        assert_eq!(err.user_message(), "Image is too large (maximum 10.0 MB).");
    }

    #[test]
    fn transport_keeps_service_text_in_diagnostic() {
        let err = PipelineError::from(StoreError::Rejected("quota exceeded".into()));
        assert_eq!(err.kind(), "transport");
        assert!(err.to_string().contains("quota exceeded"));
        assert_eq!(err.user_message(), "Error creating avatar. Please try again.");
    }

    #[test]
    fn decode_message() {
        let err = PipelineError::from(TransformError::DecodeFailed("bad magic".into()));
        assert_eq!(err.kind(), "decode");
        assert_eq!(err.user_message(), "That file could not be read as an image.");
    }

    #[test]
    fn no_selection_message_matches_page() {
        assert_eq!(
            PipelineError::NoSelection.user_message(),
            "Please select a photo first"
        );
    }
}
