//! Playback controller: one current clip, play/pause/replay, icon state.
//!
//! The controller never tracks "is playing" on its own.  Every query goes to
//! the [`MediaBackend`], so the play/pause icon cannot drift from the real
//! media state however quickly the reviewer toggles.

use thiserror::Error;

use super::UtteranceId;

// ---------------------------------------------------------------------------
// PlaybackError
// ---------------------------------------------------------------------------

/// Errors reported by a [`MediaBackend`].
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// No audio is loaded for this utterance.
    #[error("no audio clip loaded for utterance {0}")]
    NoClip(UtteranceId),

    /// The output device failed.
    #[error("audio output error: {0}")]
    Device(String),
}

// ---------------------------------------------------------------------------
// MediaBackend
// ---------------------------------------------------------------------------

/// The per-utterance media primitive: one playable clip per utterance id.
///
/// Implementations: [`crate::audio::AudioDeck`] (cpal output) and the test
/// double in this module.
pub trait MediaBackend {
    /// Start or resume playback of `id` from its current position.
    fn play(&mut self, id: &UtteranceId) -> Result<(), PlaybackError>;
    /// Pause `id`, keeping its position.
    fn pause(&mut self, id: &UtteranceId);
    /// Move `id` back to the start without changing its paused state.
    fn rewind(&mut self, id: &UtteranceId);
    /// `true` unless `id` is currently playing.
    fn is_paused(&self, id: &UtteranceId) -> bool;
    /// Playback position of `id` in seconds.
    fn current_time(&self, id: &UtteranceId) -> f64;
    /// Drain the ids of clips that reached their end since the last call.
    fn poll_ended(&mut self) -> Vec<UtteranceId>;
}

// ---------------------------------------------------------------------------
// PlayIcon
// ---------------------------------------------------------------------------

/// Two-state play/pause control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayIcon {
    /// Media is paused; the control offers "play".
    Play,
    /// Media is playing; the control offers "pause".
    Pause,
}

impl PlayIcon {
    pub fn label(&self) -> &'static str {
        match self {
            PlayIcon::Play => "▶",
            PlayIcon::Pause => "⏸",
        }
    }
}

// ---------------------------------------------------------------------------
// PlaybackController
// ---------------------------------------------------------------------------

/// Owns the media backend and the id of the current clip.
pub struct PlaybackController {
    backend: Box<dyn MediaBackend>,
    current: UtteranceId,
}

impl PlaybackController {
    pub fn new(backend: Box<dyn MediaBackend>, initial: UtteranceId) -> Self {
        Self {
            backend,
            current: initial,
        }
    }

    pub fn current(&self) -> &UtteranceId {
        &self.current
    }

    /// Stop and rewind the outgoing clip, then make `id` current.
    ///
    /// Selecting the clip that is already current restarts it from the
    /// beginning without pausing it.
    pub fn set_current(&mut self, id: UtteranceId) {
        if id != self.current {
            if !self.backend.is_paused(&self.current) {
                self.backend.pause(&self.current);
            }
            self.backend.rewind(&self.current);
        }
        if !self.backend.is_paused(&id) {
            self.backend.rewind(&id);
        }
        log::debug!("playback: current clip {} -> {}", self.current, id);
        self.current = id;
    }

    /// Play the current clip if paused, pause it otherwise.  Returns the icon
    /// for the new state.
    pub fn toggle(&mut self) -> Result<PlayIcon, PlaybackError> {
        if self.backend.is_paused(&self.current) {
            self.backend.play(&self.current)?;
        } else {
            self.backend.pause(&self.current);
        }
        Ok(self.icon())
    }

    /// Start the current clip if it is not already playing.
    pub fn play(&mut self) -> Result<(), PlaybackError> {
        if self.backend.is_paused(&self.current) {
            self.backend.play(&self.current)?;
        }
        Ok(())
    }

    /// Restart the current clip from the beginning.
    pub fn replay(&mut self) -> Result<(), PlaybackError> {
        self.backend.rewind(&self.current);
        self.play()
    }

    /// Handle a clip reaching its end.  Returns whether it was current.
    pub fn on_ended(&mut self, id: &UtteranceId) -> bool {
        let was_current = *id == self.current;
        if was_current {
            self.backend.rewind(id);
        }
        was_current
    }

    pub fn is_playing(&self) -> bool {
        !self.backend.is_paused(&self.current)
    }

    /// Icon derived from the backend's paused flag.
    pub fn icon(&self) -> PlayIcon {
        if self.is_playing() {
            PlayIcon::Pause
        } else {
            PlayIcon::Play
        }
    }

    pub fn current_time(&self) -> f64 {
        self.backend.current_time(&self.current)
    }

    pub fn poll_ended(&mut self) -> Vec<UtteranceId> {
        self.backend.poll_ended()
    }
}

// ---------------------------------------------------------------------------
// Test double
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod mock {
    use std::cell::RefCell;
    use std::collections::{HashMap, HashSet};
    use std::rc::Rc;

    use super::*;

    /// Observable state of a [`MockBackend`].
    #[derive(Default)]
    pub(crate) struct MockState {
        pub playing: HashSet<UtteranceId>,
        pub positions: HashMap<UtteranceId, f64>,
        pub ended: Vec<UtteranceId>,
        pub missing: HashSet<UtteranceId>,
        /// Highest number of clips ever playing at once.
        pub max_playing: usize,
        pub play_calls: usize,
    }

    /// In-memory backend; clone the handle to inspect it after handing the
    /// backend to a controller.
    #[derive(Clone, Default)]
    pub(crate) struct MockBackend(pub Rc<RefCell<MockState>>);

    impl MockBackend {
        pub fn state(&self) -> std::cell::Ref<'_, MockState> {
            self.0.borrow()
        }

        /// Simulate the clip advancing.
        pub fn advance(&self, id: &str, secs: f64) {
            *self
                .0
                .borrow_mut()
                .positions
                .entry(UtteranceId::from(id))
                .or_default() += secs;
        }

        /// Simulate the clip running out.
        pub fn finish(&self, id: &str) {
            let id = UtteranceId::from(id);
            let mut st = self.0.borrow_mut();
            st.playing.remove(&id);
            st.ended.push(id);
        }
    }

    impl MediaBackend for MockBackend {
        fn play(&mut self, id: &UtteranceId) -> Result<(), PlaybackError> {
            let mut st = self.0.borrow_mut();
            if st.missing.contains(id) {
                return Err(PlaybackError::NoClip(id.clone()));
            }
            st.play_calls += 1;
            st.playing.insert(id.clone());
            st.max_playing = st.max_playing.max(st.playing.len());
            Ok(())
        }

        fn pause(&mut self, id: &UtteranceId) {
            self.0.borrow_mut().playing.remove(id);
        }

        fn rewind(&mut self, id: &UtteranceId) {
            self.0.borrow_mut().positions.insert(id.clone(), 0.0);
        }

        fn is_paused(&self, id: &UtteranceId) -> bool {
            !self.0.borrow().playing.contains(id)
        }

        fn current_time(&self, id: &UtteranceId) -> f64 {
            self.0.borrow().positions.get(id).copied().unwrap_or(0.0)
        }

        fn poll_ended(&mut self) -> Vec<UtteranceId> {
            std::mem::take(&mut self.0.borrow_mut().ended)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
