//! The audio deck: one loaded clip per utterance, at most one playing.
//!
//! [`DeckState`] is shared between the UI thread and the cpal callback.  It
//! stores a single `playing` slot, so starting one clip implicitly stops
//! any other.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::session::{Job, MediaBackend, PlaybackError, UtteranceId};

use super::clip::{Clip, ClipError};
use super::output::{lock, open_output, OutputError, OutputStream};

// ---------------------------------------------------------------------------
// DeckState
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Track {
    clip: Clip,
    position: usize,
}

/// Clips, play heads and the currently sounding clip.
#[derive(Debug, Default)]
pub struct DeckState {
    tracks: HashMap<UtteranceId, Track>,
    playing: Option<UtteranceId>,
    ended: Vec<UtteranceId>,
}

impl DeckState {
    /// Fill `out` (interleaved, `channels` wide) from the playing clip.
    /// Frames past the end of the clip are silent.
    pub fn render(&mut self, out: &mut [f32], channels: usize) {
        out.fill(0.0);
        let channels = channels.max(1);

        let Some(id) = self.playing.clone() else {
            return;
        };
        let Some(track) = self.tracks.get_mut(&id) else {
            self.playing = None;
            return;
        };

        let samples = track.clip.samples();
        for frame in out.chunks_mut(channels) {
            let Some(&s) = samples.get(track.position) else {
                break;
            };
            frame.fill(s);
            track.position += 1;
        }

        if track.position >= samples.len() {
            log::debug!("deck: {id} reached its end");
            self.playing = None;
            self.ended.push(id);
        }
    }
}

// ---------------------------------------------------------------------------
// AudioDeck
// ---------------------------------------------------------------------------

/// [`MediaBackend`] over decoded WAV clips and a cpal output stream.
pub struct AudioDeck {
    state: Arc<Mutex<DeckState>>,
    sample_rate: u32,
    output: Option<OutputStream>,
}

impl AudioDeck {
    /// Open the output device (`None` = system default).
    pub fn open(device_name: Option<&str>) -> Result<Self, OutputError> {
        let state = Arc::new(Mutex::new(DeckState::default()));
        let output = open_output(device_name, Arc::clone(&state))?;
        Ok(Self {
            sample_rate: output.sample_rate(),
            state,
            output: Some(output),
        })
    }

    /// A deck with no device.  Play heads only move when [`DeckState::render`]
    /// is driven by hand.
    pub fn detached(sample_rate: u32) -> Self {
        Self {
            state: Arc::new(Mutex::new(DeckState::default())),
            sample_rate,
            output: None,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn has_output(&self) -> bool {
        self.output.is_some()
    }

    /// Shared state, for driving a detached deck.
    pub fn state(&self) -> Arc<Mutex<DeckState>> {
        Arc::clone(&self.state)
    }

    /// Register `clip` for `id`, converted to the deck's rate.
    pub fn insert(&mut self, id: UtteranceId, clip: Clip) {
        let clip = clip.resampled(self.sample_rate);
        lock(&self.state)
            .tracks
            .insert(id, Track { clip, position: 0 });
    }

    pub fn load_file(&mut self, id: UtteranceId, path: &Path) -> Result<(), ClipError> {
        let clip = Clip::load(path)?;
        self.insert(id, clip);
        Ok(())
    }

    /// Load every clip the job references.  Clips that fail to decode are
    /// logged and skipped; playing them later reports
    /// [`PlaybackError::NoClip`].  Returns the number loaded.
    pub fn load_job(&mut self, job: &Job) -> usize {
        let mut loaded = 0;
        for utterance in &job.utterances {
            let Some(path) = &utterance.audio_path else {
                log::warn!("deck: utterance {} has no audio", utterance.id);
                continue;
            };
            match self.load_file(utterance.id.clone(), path) {
                Ok(()) => loaded += 1,
                Err(e) => log::warn!("deck: {}: {e}", path.display()),
            }
        }
        log::info!("deck: {loaded}/{} clips loaded", job.utterances.len());
        loaded
    }
}

impl MediaBackend for AudioDeck {
    fn play(&mut self, id: &UtteranceId) -> Result<(), PlaybackError> {
        let mut st = lock(&self.state);
        let track = st
            .tracks
            .get_mut(id)
            .ok_or_else(|| PlaybackError::NoClip(id.clone()))?;
        if track.position >= track.clip.len() {
            track.position = 0;
        }
        st.playing = Some(id.clone());
        Ok(())
    }

    fn pause(&mut self, id: &UtteranceId) {
        let mut st = lock(&self.state);
        if st.playing.as_ref() == Some(id) {
            st.playing = None;
        }
    }

    fn rewind(&mut self, id: &UtteranceId) {
        if let Some(track) = lock(&self.state).tracks.get_mut(id) {
            track.position = 0;
        }
    }

    fn is_paused(&self, id: &UtteranceId) -> bool {
        lock(&self.state).playing.as_ref() != Some(id)
    }

    fn current_time(&self, id: &UtteranceId) -> f64 {
        lock(&self.state)
            .tracks
            .get(id)
            .map(|t| t.position as f64 / t.clip.sample_rate() as f64)
            .unwrap_or(0.0)
    }

    fn poll_ended(&mut self) -> Vec<UtteranceId> {
        std::mem::take(&mut lock(&self.state).ended)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
