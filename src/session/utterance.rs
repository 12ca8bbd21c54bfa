//! Utterances and the job manifest that lists them.
//!
//! A job is produced on the server side and handed to the reviewer as a JSON
//! manifest:
//!
//! ```json
//! {
//!   "job_id": "42",
//!   "utterances": [
//!     { "id": "u1", "index": 1, "text": "the cat sat",
//!       "audio_path": "audio/u1.wav", "duration_secs": 1.4 }
//!   ]
//! }
//! ```
//!
//! Relative `audio_path`s are resolved against the manifest's directory.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::ReviewError;

// ---------------------------------------------------------------------------
// UtteranceId
// ---------------------------------------------------------------------------

/// Stable identifier of an utterance; also identifies its audio clip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UtteranceId(String);

impl UtteranceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UtteranceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UtteranceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Utterance
// ---------------------------------------------------------------------------

/// One audio-aligned transcript segment under review.  Read-only for the
/// lifetime of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    pub id: UtteranceId,
    /// 1-based position, display only.
    pub index: usize,
    /// Machine transcript, whitespace-delimited words.
    #[serde(rename = "text")]
    pub original_text: String,
    /// Audio clip for this utterance.
    #[serde(default)]
    pub audio_path: Option<PathBuf>,
    #[serde(rename = "duration_secs", default)]
    pub audio_duration_secs: f32,
}

impl Utterance {
    pub fn new(id: impl Into<String>, index: usize, original_text: impl Into<String>) -> Self {
        Self {
            id: UtteranceId::new(id),
            index,
            original_text: original_text.into(),
            audio_path: None,
            audio_duration_secs: 0.0,
        }
    }

    /// The original transcript split on whitespace.
    pub fn original_words(&self) -> impl Iterator<Item = &str> {
        self.original_text.split_whitespace()
    }
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// A batch of utterances assigned to one reviewer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub job_id: String,
    pub utterances: Vec<Utterance>,
}

impl Job {
    /// Build a job, checking that it has utterances and that ids are unique.
    pub fn new(job_id: impl Into<String>, utterances: Vec<Utterance>) -> Result<Self, ReviewError> {
        let job = Self {
            job_id: job_id.into(),
            utterances,
        };
        job.validate()?;
        Ok(job)
    }

    /// Parse a manifest from JSON text.  Relative audio paths are left as-is.
    pub fn from_json_str(json: &str) -> Result<Self, ReviewError> {
        let job: Self =
            serde_json::from_str(json).map_err(|e| ReviewError::Manifest(e.to_string()))?;
        job.validate()?;
        Ok(job)
    }

    /// Read a manifest file and resolve relative audio paths against its
    /// parent directory.
    pub fn load(path: &Path) -> Result<Self, ReviewError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| ReviewError::Manifest(format!("{}: {e}", path.display())))?;
        let mut job = Self::from_json_str(&data)?;

        if let Some(base) = path.parent() {
            for utt in &mut job.utterances {
                if let Some(audio) = utt.audio_path.as_mut() {
                    if audio.is_relative() {
                        *audio = base.join(&*audio);
                    }
                }
            }
        }

        log::info!(
            "loaded job {} ({} utterances) from {}",
            job.job_id,
            job.utterances.len(),
            path.display()
        );
        Ok(job)
    }

    pub(crate) fn validate(&self) -> Result<(), ReviewError> {
        if self.utterances.is_empty() {
            return Err(ReviewError::EmptyJob);
        }
        let mut seen = HashSet::new();
        for utt in &self.utterances {
            if !seen.insert(&utt.id) {
                return Err(ReviewError::DuplicateUtterance(utt.id.clone()));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
