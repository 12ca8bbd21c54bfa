//! Non-blocking handle the UI thread uses to queue outbound calls.
//!
//! Submissions and common words travel on their own queue so a backlog of
//! best-effort action messages can neither fill it nor delay it.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};

use super::{ActionKind, ServerMessage, TransportError};
use crate::session::UtteranceId;

/// Cheap-to-clone sender bound to one job.
///
/// Every method uses `try_send`, so the UI never waits on the network.
#[derive(Debug, Clone)]
pub struct Outbox {
    job_id: String,
    submissions: mpsc::Sender<ServerMessage>,
    actions: mpsc::Sender<ServerMessage>,
}

/// Receiving ends drained by [`run_outbox`](super::run_outbox).
#[derive(Debug)]
pub struct OutboxQueues {
    /// `Update` and `CommonWord` messages.
    pub submissions: mpsc::Receiver<ServerMessage>,
    /// `Action` messages.
    pub actions: mpsc::Receiver<ServerMessage>,
}

impl OutboxQueues {
    /// Take the next queued message without waiting, submissions first.
    pub fn try_recv(&mut self) -> Result<ServerMessage, TryRecvError> {
        match self.submissions.try_recv() {
            Ok(msg) => Ok(msg),
            Err(_) => self.actions.try_recv(),
        }
    }
}

impl Outbox {
    /// Create an outbox and the queues its worker drains.  Each queue holds
    /// up to `capacity` messages.
    pub fn channel(job_id: impl Into<String>, capacity: usize) -> (Self, OutboxQueues) {
        let (submissions_tx, submissions) = mpsc::channel(capacity);
        let (actions_tx, actions) = mpsc::channel(capacity);
        let outbox = Self {
            job_id: job_id.into(),
            submissions: submissions_tx,
            actions: actions_tx,
        };
        (
            outbox,
            OutboxQueues {
                submissions,
                actions,
            },
        )
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Record a UI action.  Best effort: a full or closed queue only logs.
    pub fn action(&self, button: ActionKind, utterance: &UtteranceId, current_time: f64) {
        let msg = ServerMessage::Action {
            job_id: self.job_id.clone(),
            button,
            utterance: utterance.clone(),
            current_time,
        };
        if let Err(e) = send(&self.actions, msg) {
            log::debug!("outbox: dropped {} action: {e}", button.as_str());
        }
    }

    /// Queue revision `revision` of the edited text of `utterance`.
    pub fn submit(
        &self,
        utterance: &UtteranceId,
        revision: u64,
        text: &str,
    ) -> Result<(), TransportError> {
        send(
            &self.submissions,
            ServerMessage::Update {
                job_id: self.job_id.clone(),
                utterance: utterance.clone(),
                revision,
                text: text.to_string(),
            },
        )
    }

    /// Queue a reviewer-added common word.
    pub fn common_word(&self, utterance: &UtteranceId, word: &str) -> Result<(), TransportError> {
        send(
            &self.submissions,
            ServerMessage::CommonWord {
                job_id: self.job_id.clone(),
                utterance: utterance.clone(),
                word: word.to_string(),
            },
        )
    }
}

fn send(tx: &mpsc::Sender<ServerMessage>, msg: ServerMessage) -> Result<(), TransportError> {
    tx.try_send(msg).map_err(|e| match e {
        TrySendError::Full(_) => TransportError::Queue("queue full".into()),
        TrySendError::Closed(_) => TransportError::Queue("worker stopped".into()),
    })
}
