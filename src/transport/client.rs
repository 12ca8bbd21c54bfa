//! Core `ReviewTransport` trait and the HTTP implementation.
//!
//! `HttpTransport` posts JSON bodies to `{base_url}/transcription/<call>/`
//! and expects `{"status": "success"}` back.  All connection details come
//! from [`ServerConfig`]; nothing is hardcoded.

use async_trait::async_trait;
use serde_json::json;

use super::{ActionKind, TransportError};
use crate::config::ServerConfig;
use crate::session::UtteranceId;

// ---------------------------------------------------------------------------
// ReviewTransport trait
// ---------------------------------------------------------------------------

/// Async RPC surface of the review server.
///
/// Implementors must be `Send + Sync` so they can be shared with the outbox
/// worker as `Arc<dyn ReviewTransport>`.
#[async_trait]
pub trait ReviewTransport: Send + Sync {
    /// Record which control the reviewer used.
    async fn action_register(
        &self,
        job_id: &str,
        button: ActionKind,
        utterance: &UtteranceId,
        current_time: f64,
    ) -> Result<(), TransportError>;

    /// Store the reviewer's edited text for one utterance.
    async fn update_transcription(
        &self,
        job_id: &str,
        utterance: &UtteranceId,
        text: &str,
    ) -> Result<(), TransportError>;

    /// Add a word to the job's shared autocomplete list.
    async fn add_word(
        &self,
        job_id: &str,
        utterance: &UtteranceId,
        word: &str,
    ) -> Result<(), TransportError>;

    /// Fetch a JSON array of suggestion words.
    async fn fetch_words(&self, url: &str) -> Result<Vec<String>, TransportError>;
}

// ---------------------------------------------------------------------------
// HttpTransport
// ---------------------------------------------------------------------------

/// Talks to the review server over HTTP.
pub struct HttpTransport {
    client: reqwest::Client,
    config: ServerConfig,
}

impl HttpTransport {
    /// Build an `HttpTransport` from application config.
    ///
    /// The HTTP client carries the per-request timeout from
    /// `config.timeout_secs`.  A default client is used if the builder fails.
    pub fn from_config(config: &ServerConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    fn endpoint(&self, call: &str) -> String {
        format!(
            "{}/transcription/{}/",
            self.config.base_url.trim_end_matches('/'),
            call
        )
    }

    /// POST `body` to `call` and check the `status` field of the reply.
    async fn call(&self, call: &str, body: serde_json::Value) -> Result<(), TransportError> {
        let mut req = self.client.post(self.endpoint(call)).json(&body);

        // Attach Authorization header only when api_key is a non-empty string.
        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;
        let http_status = response.status();
        if !http_status.is_success() {
            return Err(TransportError::Rejected(format!("HTTP {http_status}")));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| TransportError::Parse(e.to_string()))?;

        check_status(&json)
    }
}

/// Interpret the `{"status": ...}` envelope the server returns.
fn check_status(json: &serde_json::Value) -> Result<(), TransportError> {
    match json["status"].as_str() {
        Some("success") => Ok(()),
        Some(other) => Err(TransportError::Rejected(other.to_string())),
        None => Err(TransportError::Parse("missing status field".into())),
    }
}

#[async_trait]
impl ReviewTransport for HttpTransport {
    async fn action_register(
        &self,
        job_id: &str,
        button: ActionKind,
        utterance: &UtteranceId,
        current_time: f64,
    ) -> Result<(), TransportError> {
        self.call(
            "action_register",
            json!({
                "job_id": job_id,
                "button_id": button,
                "transcription_id": utterance,
                "current_time": current_time,
            }),
        )
        .await
    }

    async fn update_transcription(
        &self,
        job_id: &str,
        utterance: &UtteranceId,
        text: &str,
    ) -> Result<(), TransportError> {
        self.call(
            "update_transcription",
            json!({
                "job_id": job_id,
                "transcription_id": utterance,
                "transcription_utterance": text,
            }),
        )
        .await
    }

    async fn add_word(
        &self,
        job_id: &str,
        utterance: &UtteranceId,
        word: &str,
    ) -> Result<(), TransportError> {
        self.call(
            "add_word",
            json!({
                "job_id": job_id,
                "transcription_id": utterance,
                "word": word,
            }),
        )
        .await
    }

    async fn fetch_words(&self, url: &str) -> Result<Vec<String>, TransportError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(TransportError::Rejected(format!("HTTP {}", response.status())));
        }
        response
            .json::<Vec<String>>()
            .await
            .map_err(|e| TransportError::Parse(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
