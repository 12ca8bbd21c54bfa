//! Transport used when server access is disabled.

use async_trait::async_trait;

use super::{ActionKind, ReviewTransport, TransportError};
use crate::session::UtteranceId;

/// Logs every call and reports success, so offline review behaves like a
/// connected session.  Word lists cannot be fetched.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTransport;

#[async_trait]
impl ReviewTransport for NullTransport {
    async fn action_register(
        &self,
        job_id: &str,
        button: ActionKind,
        utterance: &UtteranceId,
        current_time: f64,
    ) -> Result<(), TransportError> {
        log::debug!(
            "offline: action {} job={job_id} utterance={utterance} t={current_time:.2}",
            button.as_str()
        );
        Ok(())
    }

    async fn update_transcription(
        &self,
        job_id: &str,
        utterance: &UtteranceId,
        text: &str,
    ) -> Result<(), TransportError> {
        log::info!("offline: update job={job_id} utterance={utterance} text={text:?}");
        Ok(())
    }

    async fn add_word(
        &self,
        job_id: &str,
        utterance: &UtteranceId,
        word: &str,
    ) -> Result<(), TransportError> {
        log::info!("offline: add word job={job_id} utterance={utterance} word={word:?}");
        Ok(())
    }

    async fn fetch_words(&self, _url: &str) -> Result<Vec<String>, TransportError> {
        Err(TransportError::Disabled)
    }
}
