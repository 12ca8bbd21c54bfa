//! Messages queued for the review server and the reports sent back.

use serde::Serialize;

use crate::session::UtteranceId;

// ---------------------------------------------------------------------------
// ActionKind
// ---------------------------------------------------------------------------

/// Which control the reviewer used.  Serialised as the `button_id` of an
/// `action_register` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    PlayPause,
    Replay,
    Previous,
    Next,
    /// Clicked a position indicator.
    Jump,
    CopyDown,
    AddNewWord,
    /// Focused the suggestion input through the add affordance.
    AddModified,
    /// Clicked or moved onto a word token.
    Modified,
    DeleteWord,
    Tick,
    Common,
    AudioEnded,
}

impl ActionKind {
    /// Wire name, e.g. `"play_pause"`.
    ///
    /// ```
    /// use transcript_review::transport::ActionKind;
    ///
    /// assert_eq!(ActionKind::PlayPause.as_str(), "play_pause");
    /// assert_eq!(ActionKind::AudioEnded.as_str(), "audio_ended");
    /// ```
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::PlayPause => "play_pause",
            ActionKind::Replay => "replay",
            ActionKind::Previous => "previous",
            ActionKind::Next => "next",
            ActionKind::Jump => "jump",
            ActionKind::CopyDown => "copy_down",
            ActionKind::AddNewWord => "add_new_word",
            ActionKind::AddModified => "add_modified",
            ActionKind::Modified => "modified",
            ActionKind::DeleteWord => "delete_word",
            ActionKind::Tick => "tick",
            ActionKind::Common => "common",
            ActionKind::AudioEnded => "audio_ended",
        }
    }
}

// ---------------------------------------------------------------------------
// ServerMessage
// ---------------------------------------------------------------------------

/// One outbound call, queued by the UI thread and delivered by the outbox
/// worker.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    /// `action_register(job_id, button_id, utterance_id, current_time)`.
    Action {
        job_id: String,
        button: ActionKind,
        utterance: UtteranceId,
        current_time: f64,
    },
    /// `update_transcription(job_id, utterance_id, utterance_text)`.
    ///
    /// `revision` counts submissions of one utterance and never reaches the
    /// server; it comes back in the [`DeliveryReport`].
    Update {
        job_id: String,
        utterance: UtteranceId,
        revision: u64,
        text: String,
    },
    /// `add_word(job_id, utterance_id, word)`: a reviewer-added common word.
    CommonWord {
        job_id: String,
        utterance: UtteranceId,
        word: String,
    },
}

// ---------------------------------------------------------------------------
// DeliveryReport
// ---------------------------------------------------------------------------

/// Outcome of an `Update` delivery, sent back to the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryReport {
    Submitted {
        utterance: UtteranceId,
        revision: u64,
    },
    Failed {
        utterance: UtteranceId,
        revision: u64,
        reason: String,
    },
}

impl DeliveryReport {
    pub fn utterance(&self) -> &UtteranceId {
        match self {
            DeliveryReport::Submitted { utterance, .. } => utterance,
            DeliveryReport::Failed { utterance, .. } => utterance,
        }
    }

    pub fn revision(&self) -> u64 {
        match self {
            DeliveryReport::Submitted { revision, .. } => *revision,
            DeliveryReport::Failed { revision, .. } => *revision,
        }
    }
}
