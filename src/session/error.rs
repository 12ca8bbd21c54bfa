//! Error type for review-session operations.

use thiserror::Error;

use super::playback::PlaybackError;
use super::UtteranceId;

/// Errors surfaced by [`ReviewSession`](super::ReviewSession) and job
/// loading.
#[derive(Debug, Error)]
pub enum ReviewError {
    /// Navigation targeted an id that is not part of the job.
    #[error("utterance not found: {0}")]
    UtteranceNotFound(UtteranceId),

    /// The job manifest lists no utterances.
    #[error("job contains no utterances")]
    EmptyJob,

    /// Two utterances in the manifest share an id.
    #[error("duplicate utterance id in job: {0}")]
    DuplicateUtterance(UtteranceId),

    /// The job manifest could not be read or parsed.
    #[error("invalid job manifest: {0}")]
    Manifest(String),

    /// The edited text could not be handed to the outbound transport.
    #[error("submission failed for {utterance}: {reason}")]
    SubmissionFailed {
        utterance: UtteranceId,
        reason: String,
    },

    /// The audio backend refused an operation.
    #[error(transparent)]
    Playback(#[from] PlaybackError),
}
