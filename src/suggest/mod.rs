//! Autocomplete suggestions for the word input.
//!
//! [`SuggestionIndex`] holds a prefetched list of words and phrases and
//! answers prefix queries.  Both the entries and the query are split on
//! whitespace; an entry matches when every query token is a
//! case-insensitive prefix of one of the entry's tokens.  So `"ma"` finds
//! `"mat"` and `"on the mat"`, and `"th ma"` finds only the phrase.
//!
//! The list is loaded from a JSON array of strings (file or URL), seeded with
//! the words and full texts of the current job, and grows when the reviewer
//! adds a common word.

use std::collections::HashSet;
use std::path::Path;

use thiserror::Error;

use crate::session::Job;

// ---------------------------------------------------------------------------
// SuggestError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SuggestError {
    #[error("failed to read word list: {0}")]
    Io(#[from] std::io::Error),

    #[error("word list is not a JSON array of strings: {0}")]
    Parse(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// SuggestionIndex
// ---------------------------------------------------------------------------

/// Ordered, de-duplicated suggestion list.
#[derive(Debug, Clone)]
pub struct SuggestionIndex {
    entries: Vec<String>,
    seen: HashSet<String>,
    limit: usize,
}

impl SuggestionIndex {
    /// An empty index returning at most `limit` suggestions per query.
    pub fn new(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            seen: HashSet::new(),
            limit,
        }
    }

    /// Parse a JSON array of strings.
    pub fn from_json_str(json: &str, limit: usize) -> Result<Self, SuggestError> {
        let words: Vec<String> = serde_json::from_str(json)?;
        let mut index = Self::new(limit);
        index.extend(words);
        Ok(index)
    }

    /// Read a JSON word-list file.
    pub fn load_from(path: &Path, limit: usize) -> Result<Self, SuggestError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data, limit)
    }

    /// Write the current entries as a JSON array, creating parent
    /// directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<(), SuggestError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string(&self.entries)?)?;
        Ok(())
    }

    /// Add every distinct word and every full utterance text of `job`.
    pub fn seed_from_job(&mut self, job: &Job) {
        let before = self.entries.len();
        for utt in &job.utterances {
            let text = utt.original_words().collect::<Vec<_>>().join(" ");
            for word in utt.original_words() {
                self.add(word);
            }
            self.add(&text);
        }
        log::debug!(
            "suggest: seeded {} entries from job {}",
            self.entries.len() - before,
            job.job_id
        );
    }

    pub fn extend<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for w in words {
            self.add(w.as_ref());
        }
    }

    /// Add one entry.  Blank and already-known entries are ignored; returns
    /// whether the entry was new.
    pub fn add(&mut self, word: &str) -> bool {
        let word = word.trim();
        if word.is_empty() || self.seen.contains(word) {
            return false;
        }
        self.seen.insert(word.to_string());
        self.entries.push(word.to_string());
        true
    }

    /// Up to `limit` entries matching `query`.  Entries that start with the
    /// whole query come first; order is otherwise insertion order.
    pub fn query(&self, query: &str) -> Vec<&str> {
        let query = query.to_lowercase();
        let tokens: Vec<&str> = query.split_whitespace().collect();
        if tokens.is_empty() {
            return Vec::new();
        }

        let mut leading = Vec::new();
        let mut rest = Vec::new();
        for entry in &self.entries {
            let lowered = entry.to_lowercase();
            let entry_tokens: Vec<&str> = lowered.split_whitespace().collect();
            let matches = tokens
                .iter()
                .all(|q| entry_tokens.iter().any(|t| t.starts_with(q)));
            if !matches {
                continue;
            }
            if lowered.starts_with(query.trim_start()) {
                leading.push(entry.as_str());
            } else {
                rest.push(entry.as_str());
            }
        }

        leading.extend(rest);
        leading.truncate(self.limit);
        leading
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

impl Default for SuggestionIndex {
    fn default() -> Self {
        Self::new(10)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
