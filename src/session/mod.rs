//! Review state: the job, one edit buffer per utterance, navigation and
//! playback, threaded through a single [`ReviewSession`].

pub mod buffer;
pub mod error;
pub mod navigator;
pub mod playback;
pub mod review;
pub mod utterance;

pub use buffer::{Direction, EditBuffer, Slot};
pub use error::ReviewError;
pub use playback::{MediaBackend, PlayIcon, PlaybackController, PlaybackError};
pub use review::{ConfirmOutcome, ReviewSession, SessionOptions};
pub use utterance::{Job, Utterance, UtteranceId};
