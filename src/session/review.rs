//! The review session: one value holding all navigation and edit state.
//!
//! Every UI handler receives the [`ReviewSession`] and calls one operation
//! on it; the UI itself only renders what the session exposes.  Outbound
//! calls are queued on the [`Outbox`] and never block.
//!
//! # Edit state per utterance
//!
//! ```text
//! Empty ──copy-down / insert──▶ Populated ──confirm──▶ Confirmed
//!                                   ▲                      │
//!                                   └──────── any edit ────┘
//! ```

use std::cmp::Ordering;

use crate::config::{AppConfig, LeavePolicy};
use crate::shortcuts::Command;
use crate::suggest::SuggestionIndex;
use crate::transport::{ActionKind, DeliveryReport, Outbox};

use super::buffer::{Direction, EditBuffer, Slot};
use super::navigator;
use super::playback::{MediaBackend, PlayIcon, PlaybackController};
use super::{Job, ReviewError, Utterance, UtteranceId};

// ---------------------------------------------------------------------------
// SessionOptions
// ---------------------------------------------------------------------------

/// Behaviour switches, taken from [`AppConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// What navigation does with unconfirmed edits.
    pub leave_policy: LeavePolicy,
    /// Start the incoming clip after every navigation.
    pub play_on_select: bool,
    /// Advance when the current clip finishes.
    pub auto_advance_on_end: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            leave_policy: LeavePolicy::ConfirmPending,
            play_on_select: true,
            auto_advance_on_end: false,
        }
    }
}

impl From<&AppConfig> for SessionOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            leave_policy: config.review.leave_policy,
            play_on_select: config.playback.play_on_select,
            auto_advance_on_end: config.playback.auto_advance_on_end,
        }
    }
}

// ---------------------------------------------------------------------------
// ConfirmOutcome
// ---------------------------------------------------------------------------

/// Result of a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// The text was queued for the server.
    Submitted(String),
    /// The buffer holds no words; nothing was sent.
    NothingToSubmit,
}

// ---------------------------------------------------------------------------
// ReviewSession
// ---------------------------------------------------------------------------

pub struct ReviewSession {
    job_id: String,
    utterances: Vec<Utterance>,
    buffers: Vec<EditBuffer>,
    confirmed: Vec<bool>,
    /// Latest revision queued per utterance; reports for older ones are stale.
    revisions: Vec<u64>,
    current: usize,
    playback: PlaybackController,
    outbox: Outbox,
    suggestions: SuggestionIndex,
    options: SessionOptions,
    last_error: Option<String>,
}

impl ReviewSession {
    /// Start a session on the first utterance of `job`.
    pub fn new(
        job: Job,
        backend: Box<dyn MediaBackend>,
        outbox: Outbox,
        suggestions: SuggestionIndex,
        options: SessionOptions,
    ) -> Result<Self, ReviewError> {
        job.validate()?;
        let Job {
            job_id,
            utterances,
        } = job;

        let count = utterances.len();
        let playback = PlaybackController::new(backend, utterances[0].id.clone());

        log::info!("session: job {job_id} with {count} utterances");

        Ok(Self {
            job_id,
            utterances,
            buffers: vec![EditBuffer::new(); count],
            confirmed: vec![false; count],
            revisions: vec![0; count],
            current: 0,
            playback,
            outbox,
            suggestions,
            options,
            last_error: None,
        })
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn utterances(&self) -> &[Utterance] {
        &self.utterances
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_utterance(&self) -> &Utterance {
        &self.utterances[self.current]
    }

    /// Edit buffer of the current utterance.
    pub fn buffer(&self) -> &EditBuffer {
        &self.buffers[self.current]
    }

    pub fn buffer_at(&self, index: usize) -> Option<&EditBuffer> {
        self.buffers.get(index)
    }

    pub fn is_confirmed(&self, index: usize) -> bool {
        self.confirmed.get(index).copied().unwrap_or(false)
    }

    pub fn confirmed_count(&self) -> usize {
        self.confirmed.iter().filter(|c| **c).count()
    }

    /// Position counter, e.g. `"3 / 50"`.
    pub fn counter_label(&self) -> String {
        navigator::counter_label(self.current_utterance().index, self.utterances.len())
    }

    pub fn icon(&self) -> PlayIcon {
        self.playback.icon()
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_playing()
    }

    pub fn current_time(&self) -> f64 {
        self.playback.current_time()
    }

    pub fn suggestions(&self) -> &SuggestionIndex {
        &self.suggestions
    }

    pub fn options(&self) -> SessionOptions {
        self.options
    }

    /// Most recent failure worth showing to the reviewer.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    // -----------------------------------------------------------------------
    // Command entry point
    // -----------------------------------------------------------------------

    /// Run one reviewer command.
    pub fn apply(&mut self, command: Command) -> Result<(), ReviewError> {
        log::trace!("session: {command:?}");
        match command {
            Command::TogglePlayPause => self.toggle_play_pause(),
            Command::Replay => self.replay(),
            Command::PreviousUtterance => self.go_previous(),
            Command::NextUtterance => self.go_next(),
            Command::JumpTo(id) => self.jump_to(&id),
            Command::CopyDown => {
                self.copy_down();
                Ok(())
            }
            Command::InsertToken(text) => {
                self.insert_token(&text);
                Ok(())
            }
            Command::AddCommonWord(text) => {
                self.add_common_word(&text);
                Ok(())
            }
            Command::DeleteActiveToken => {
                self.delete_active_token();
                Ok(())
            }
            Command::MoveActive(direction) => {
                self.move_active(direction);
                Ok(())
            }
            Command::SelectToken(slot) => {
                self.select_token(slot);
                Ok(())
            }
            Command::FocusInput => {
                self.register(ActionKind::AddModified);
                Ok(())
            }
            Command::Confirm => self.confirm().map(|_| ()),
            Command::ConfirmAndAdvance => self.confirm_and_advance().map(|_| ()),
            Command::QuickConfirm => self.quick_confirm().map(|_| ()),
            Command::Rework => self.rework(),
        }
    }

    // -----------------------------------------------------------------------
    // Playback
    // -----------------------------------------------------------------------

    pub fn toggle_play_pause(&mut self) -> Result<(), ReviewError> {
        self.register(ActionKind::PlayPause);
        self.playback.toggle()?;
        Ok(())
    }

    /// Restart the current clip from the beginning.
    pub fn replay(&mut self) -> Result<(), ReviewError> {
        self.register(ActionKind::Replay);
        self.playback.replay()?;
        Ok(())
    }

    /// Handle a clip that finished on its own.
    pub fn on_playback_ended(&mut self, id: &UtteranceId) -> Result<(), ReviewError> {
        self.outbox.action(ActionKind::AudioEnded, id, 0.0);
        if self.playback.on_ended(id) && self.options.auto_advance_on_end {
            log::debug!("session: {id} ended, advancing");
            return self.go_next();
        }
        Ok(())
    }

    /// Collect end-of-clip events from the backend.  Call once per frame.
    ///
    /// Every drained event is handled; the first error is returned after
    /// the rest have run.
    pub fn poll_playback(&mut self) -> Result<(), ReviewError> {
        let mut first_err = None;
        for id in self.playback.poll_ended() {
            if let Err(e) = self.on_playback_ended(&id) {
                log::warn!("session: handling end of {id}: {e}");
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    pub fn go_next(&mut self) -> Result<(), ReviewError> {
        let target = navigator::next_index(self.current, self.utterances.len());
        self.navigate(target, ActionKind::Next)
    }

    pub fn go_previous(&mut self) -> Result<(), ReviewError> {
        let target = navigator::previous_index(self.current, self.utterances.len());
        self.navigate(target, ActionKind::Previous)
    }

    pub fn jump_to(&mut self, id: &UtteranceId) -> Result<(), ReviewError> {
        let target = self
            .utterances
            .iter()
            .position(|u| u.id == *id)
            .ok_or_else(|| ReviewError::UtteranceNotFound(id.clone()))?;
        self.navigate(target, ActionKind::Jump)
    }

    /// Pre-navigation hook: applies the [`LeavePolicy`] to the current
    /// utterance.  Returns the tick outcome when one was attempted.
    pub fn before_leave(&mut self) -> Result<Option<ConfirmOutcome>, ReviewError> {
        match self.options.leave_policy {
            LeavePolicy::Keep => Ok(None),
            LeavePolicy::ConfirmPending => {
                if self.confirmed[self.current] || self.buffers[self.current].is_empty() {
                    Ok(None)
                } else {
                    self.confirm().map(Some)
                }
            }
        }
    }

    fn navigate(&mut self, target: usize, action: ActionKind) -> Result<(), ReviewError> {
        self.register(action);

        // A failed tick must not trap the reviewer on this utterance; it
        // stays unconfirmed and the error is shown.
        if let Err(e) = self.before_leave() {
            log::warn!("session: leaving {} without submitting: {e}", self.current_id());
            self.last_error = Some(e.to_string());
        }

        let id = self.utterances[target].id.clone();
        self.playback.set_current(id);
        self.current = target;

        if self.options.play_on_select {
            self.playback.play()?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Editing
    // -----------------------------------------------------------------------

    /// Seed the current buffer from the original transcript.  Returns
    /// whether anything was copied.
    pub fn copy_down(&mut self) -> bool {
        self.register(ActionKind::CopyDown);
        let original = &self.utterances[self.current].original_text;
        let copied = self.buffers[self.current].copy_down(original);
        if copied {
            self.mark_edited();
        }
        copied
    }

    /// Insert a word after the active token.  Returns whether it was
    /// inserted.
    pub fn insert_token(&mut self, text: &str) -> bool {
        self.register(ActionKind::AddNewWord);
        let inserted = self.buffers[self.current].insert(text);
        if inserted {
            self.mark_edited();
        }
        inserted
    }

    pub fn delete_active_token(&mut self) -> Option<String> {
        self.register(ActionKind::DeleteWord);
        let removed = self.buffers[self.current].delete_active();
        if removed.is_some() {
            self.mark_edited();
        }
        removed
    }

    pub fn move_active(&mut self, direction: Direction) -> bool {
        let moved = self.buffers[self.current].move_active(direction);
        if moved {
            self.register(ActionKind::Modified);
        }
        moved
    }

    pub fn select_token(&mut self, slot: Slot) -> bool {
        self.register(ActionKind::Modified);
        self.buffers[self.current].select(slot)
    }

    /// Remember a frequently needed word: it joins the suggestion list and
    /// is sent to the server for other reviewers.
    pub fn add_common_word(&mut self, text: &str) -> bool {
        self.register(ActionKind::Common);
        let word = text.trim();
        if word.is_empty() {
            return false;
        }
        self.suggestions.add(word);
        if let Err(e) = self.outbox.common_word(self.current_id(), word) {
            log::warn!("session: common word {word:?} not queued: {e}");
        }
        true
    }

    // -----------------------------------------------------------------------
    // Confirmation
    // -----------------------------------------------------------------------

    /// Tick the current utterance: submit its edited text.
    pub fn confirm(&mut self) -> Result<ConfirmOutcome, ReviewError> {
        self.register(ActionKind::Tick);

        let text = self.buffers[self.current].text();
        if text.is_empty() {
            log::debug!("session: nothing to submit for {}", self.current_id());
            return Ok(ConfirmOutcome::NothingToSubmit);
        }

        let id = self.current_id().clone();
        let revision = self.revisions[self.current] + 1;
        self.outbox
            .submit(&id, revision, &text)
            .map_err(|e| ReviewError::SubmissionFailed {
                utterance: id.clone(),
                reason: e.to_string(),
            })?;

        self.revisions[self.current] = revision;
        self.confirmed[self.current] = true;
        log::info!("session: submitted {id} revision {revision}: {text:?}");
        Ok(ConfirmOutcome::Submitted(text))
    }

    /// Tick, then move to the next utterance.  A failed tick stays put.
    pub fn confirm_and_advance(&mut self) -> Result<ConfirmOutcome, ReviewError> {
        let outcome = self.confirm()?;
        self.go_next()?;
        Ok(outcome)
    }

    /// Copy down when the buffer is empty, then tick and advance.
    pub fn quick_confirm(&mut self) -> Result<ConfirmOutcome, ReviewError> {
        if self.buffers[self.current].is_empty() {
            self.copy_down();
        }
        self.confirm_and_advance()
    }

    /// Listen again with the intent to edit: replay and clear the tick.
    pub fn rework(&mut self) -> Result<(), ReviewError> {
        self.mark_edited();
        self.replay()
    }

    /// Apply the outcome of an asynchronous submission.  Only the report
    /// for the latest queued revision of an utterance counts.
    pub fn handle_delivery(&mut self, report: DeliveryReport) {
        let Some(i) = self
            .utterances
            .iter()
            .position(|u| u.id == *report.utterance())
        else {
            log::warn!("session: report for unknown utterance {}", report.utterance());
            return;
        };
        match report.revision().cmp(&self.revisions[i]) {
            Ordering::Less => {
                log::debug!(
                    "session: ignoring stale report for {} revision {}",
                    report.utterance(),
                    report.revision()
                );
                return;
            }
            Ordering::Greater => {
                log::warn!(
                    "session: report for {} revision {} was never queued",
                    report.utterance(),
                    report.revision()
                );
                return;
            }
            Ordering::Equal => {}
        }

        match report {
            DeliveryReport::Submitted { utterance, revision } => {
                log::debug!("session: server stored {utterance} revision {revision}");
            }
            DeliveryReport::Failed {
                utterance, reason, ..
            } => {
                self.confirmed[i] = false;
                let err = ReviewError::SubmissionFailed { utterance, reason };
                log::warn!("session: {err}");
                self.last_error = Some(err.to_string());
            }
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn current_id(&self) -> &UtteranceId {
        &self.utterances[self.current].id
    }

    fn mark_edited(&mut self) {
        self.confirmed[self.current] = false;
    }

    fn register(&self, action: ActionKind) {
        self.outbox
            .action(action, self.current_id(), self.playback.current_time());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::playback::mock::MockBackend;
    use crate::transport::{OutboxQueues, ServerMessage};

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    struct Harness {
        session: ReviewSession,
        backend: MockBackend,
        rx: OutboxQueues,
    }

    impl Harness {
        /// Updates queued so far, as `(utterance, text)`.
        fn updates(&mut self) -> Vec<(String, String)> {
            let mut out = Vec::new();
            while let Ok(msg) = self.rx.try_recv() {
                if let ServerMessage::Update {
                    utterance, text, ..
                } = msg
                {
                    out.push((utterance.to_string(), text));
                }
            }
            out
        }

        /// Action button ids queued so far.
        fn actions(&mut self) -> Vec<&'static str> {
            let mut out = Vec::new();
            while let Ok(msg) = self.rx.try_recv() {
                if let ServerMessage::Action { button, .. } = msg {
                    out.push(button.as_str());
                }
            }
            out
        }

        fn words(&self) -> Vec<String> {
            self.session.buffer().words().to_vec()
        }
    }

    fn harness_with(options: SessionOptions, capacity: usize) -> Harness {
        let job = Job::new(
            "job-1",
            vec![
                Utterance::new("u1", 1, "the cat sat"),
                Utterance::new("u2", 2, "on the mat"),
                Utterance::new("u3", 3, ""),
            ],
        )
        .unwrap();
        let backend = MockBackend::default();
        let (outbox, rx) = Outbox::channel("job-1", capacity);
        let session = ReviewSession::new(
            job,
            Box::new(backend.clone()),
            outbox,
            SuggestionIndex::new(10),
            options,
        )
        .unwrap();
        Harness {
            session,
            backend,
            rx,
        }
    }

    fn harness() -> Harness {
        harness_with(SessionOptions::default(), 256)
    }

    // -----------------------------------------------------------------------
    // Scenarios
    // -----------------------------------------------------------------------

    #[test]
    fn copy_down_delete_and_confirm() {
        let mut h = harness();
        let s = &mut h.session;

        s.apply(Command::CopyDown).unwrap();
        assert_eq!(s.buffer().words(), ["the", "cat", "sat"]);
        assert_eq!(s.buffer().active_word(), Some("sat"));

        s.apply(Command::MoveActive(Direction::Left)).unwrap();
        s.apply(Command::DeleteActiveToken).unwrap();
        assert_eq!(s.buffer().words(), ["the", "sat"]);
        assert_eq!(s.buffer().active_word(), Some("the"));

        s.apply(Command::Confirm).unwrap();
        assert!(s.is_confirmed(0));
        assert_eq!(h.updates(), vec![("u1".to_string(), "the sat".to_string())]);
    }

    #[test]
    fn typed_word_goes_after_active_token() {
        let mut h = harness();
        let s = &mut h.session;
        s.copy_down();
        s.select_token(Slot::Word(1)); // "cat"

        s.apply(Command::InsertToken("dog".into())).unwrap();
        assert_eq!(h.words(), ["the", "cat", "dog", "sat"]);
        assert_eq!(h.session.buffer().active_word(), Some("dog"));
    }

    #[test]
    fn enter_key_walks_through_the_edit_cycle() {
        use crate::shortcuts::{dispatch, InputContext, Key, Modifiers};

        fn press(h: &mut Harness, input: &str) -> bool {
            let ctx = InputContext {
                input,
                input_focused: true,
                buffer_empty: h.session.buffer().is_empty(),
            };
            let d = dispatch(Key::Enter, Modifiers::NONE, &ctx);
            let command = d.command.unwrap();
            let clears = command.clears_input();
            h.session.apply(command).unwrap();
            clears
        }

        let mut h = harness();

        // Empty buffer: copy-down, not confirm.
        press(&mut h, "");
        assert_eq!(h.words(), ["the", "cat", "sat"]);
        assert!(!h.session.is_confirmed(0));

        h.session.select_token(Slot::Word(1));
        assert!(press(&mut h, "dog"));
        assert_eq!(h.words(), ["the", "cat", "dog", "sat"]);

        press(&mut h, "");
        assert!(h.session.is_confirmed(0));
        assert_eq!(h.session.current_index(), 1);
    }

    #[test]
    fn confirm_on_empty_buffer_sends_nothing() {
        let mut h = harness();
        assert_eq!(
            h.session.confirm().unwrap(),
            ConfirmOutcome::NothingToSubmit
        );
        assert!(!h.session.is_confirmed(0));
        assert!(h.updates().is_empty());
    }

    #[test]
    fn copy_down_twice_equals_once() {
        let mut h = harness();
        h.session.copy_down();
        let once = h.words();
        assert!(!h.session.copy_down());
        assert_eq!(h.words(), once);
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    #[test]
    fn navigation_wraps_both_ways() {
        let mut h = harness();
        h.session.go_previous().unwrap();
        assert_eq!(h.session.current_utterance().id.as_str(), "u3");
        h.session.go_next().unwrap();
        assert_eq!(h.session.current_utterance().id.as_str(), "u1");
        assert_eq!(h.session.counter_label(), "1 / 3");
    }

    #[test]
    fn jump_to_unknown_id_fails() {
        let mut h = harness();
        let err = h.session.jump_to(&UtteranceId::from("nope")).unwrap_err();
        assert!(matches!(err, ReviewError::UtteranceNotFound(_)));
        assert_eq!(h.session.current_index(), 0);
    }

    #[test]
    fn jump_to_selects_and_plays() {
        let mut h = harness();
        h.session
            .apply(Command::JumpTo(UtteranceId::from("u2")))
            .unwrap();
        assert_eq!(h.session.current_index(), 1);
        assert!(h.session.is_playing());
        assert_eq!(h.session.icon(), PlayIcon::Pause);
    }

    #[test]
    fn only_one_clip_ever_plays() {
        let mut h = harness();
        h.session.toggle_play_pause().unwrap();
        for _ in 0..5 {
            h.session.go_next().unwrap();
        }
        h.session.go_previous().unwrap();
        h.session.jump_to(&UtteranceId::from("u1")).unwrap();
        assert_eq!(h.backend.state().max_playing, 1);
        assert_eq!(h.backend.state().playing.len(), 1);
    }

    #[test]
    fn navigation_confirms_pending_edit() {
        let mut h = harness();
        h.session.copy_down();
        h.session.go_next().unwrap();
        assert!(h.session.is_confirmed(0));
        assert_eq!(
            h.updates(),
            vec![("u1".to_string(), "the cat sat".to_string())]
        );
    }

    #[test]
    fn navigation_does_not_resubmit_confirmed_text() {
        let mut h = harness();
        h.session.copy_down();
        h.session.confirm().unwrap();
        h.session.go_next().unwrap();
        assert_eq!(h.updates().len(), 1);
    }

    #[test]
    fn keep_policy_leaves_edits_unsubmitted() {
        let mut h = harness_with(
            SessionOptions {
                leave_policy: LeavePolicy::Keep,
                ..SessionOptions::default()
            },
            256,
        );
        h.session.copy_down();
        h.session.go_next().unwrap();
        assert!(!h.session.is_confirmed(0));
        assert!(h.updates().is_empty());
        assert_eq!(h.session.buffer_at(0).unwrap().len(), 3);
    }

    #[test]
    fn play_on_select_can_be_disabled() {
        let mut h = harness_with(
            SessionOptions {
                play_on_select: false,
                ..SessionOptions::default()
            },
            256,
        );
        h.session.go_next().unwrap();
        assert!(!h.session.is_playing());
    }

    // -----------------------------------------------------------------------
    // Confirmation state
    // -----------------------------------------------------------------------

    #[test]
    fn edit_after_confirm_clears_tick() {
        let mut h = harness();
        h.session.copy_down();
        h.session.confirm().unwrap();
        assert!(h.session.is_confirmed(0));
        h.session.delete_active_token();
        assert!(!h.session.is_confirmed(0));
        h.session.confirm().unwrap();
        assert!(h.session.is_confirmed(0));
    }

    #[test]
    fn confirm_and_advance_moves_on() {
        let mut h = harness();
        h.session.copy_down();
        let outcome = h.session.confirm_and_advance().unwrap();
        assert_eq!(outcome, ConfirmOutcome::Submitted("the cat sat".into()));
        assert_eq!(h.session.current_index(), 1);
    }

    #[test]
    fn quick_confirm_copies_down_first() {
        let mut h = harness();
        h.session.apply(Command::QuickConfirm).unwrap();
        assert!(h.session.is_confirmed(0));
        assert_eq!(h.session.current_index(), 1);
        assert_eq!(
            h.updates(),
            vec![("u1".to_string(), "the cat sat".to_string())]
        );
    }

    #[test]
    fn full_queue_is_a_submission_failure() {
        // Room for one submission, taken by the first tick.
        let mut h = harness_with(SessionOptions::default(), 1);
        h.session.copy_down();
        h.session.confirm().unwrap();
        h.session.delete_active_token();
        let err = h.session.confirm().unwrap_err();
        assert!(matches!(err, ReviewError::SubmissionFailed { .. }));
        assert!(!h.session.is_confirmed(0));
    }

    #[test]
    fn failed_tick_does_not_block_navigation() {
        let mut h = harness_with(SessionOptions::default(), 1);
        h.session.copy_down();
        h.session.confirm().unwrap();
        h.session.delete_active_token();
        h.session.go_next().unwrap();
        assert_eq!(h.session.current_index(), 1);
        assert!(!h.session.is_confirmed(0));
        assert!(h.session.last_error().is_some());
    }

    #[test]
    fn failed_delivery_clears_tick() {
        let mut h = harness();
        h.session.copy_down();
        h.session.confirm().unwrap();
        h.session.handle_delivery(DeliveryReport::Failed {
            utterance: UtteranceId::from("u1"),
            revision: 1,
            reason: "HTTP 500".into(),
        });
        assert!(!h.session.is_confirmed(0));
        assert!(h.session.last_error().unwrap().contains("HTTP 500"));
    }

    #[test]
    fn each_tick_queues_a_new_revision() {
        let mut h = harness();
        h.session.copy_down();
        h.session.confirm().unwrap();
        h.session.delete_active_token();
        h.session.confirm().unwrap();

        let mut revisions = Vec::new();
        while let Ok(msg) = h.rx.try_recv() {
            if let ServerMessage::Update { revision, .. } = msg {
                revisions.push(revision);
            }
        }
        assert_eq!(revisions, [1, 2]);
    }

    #[test]
    fn stale_failure_does_not_untick_newer_submission() {
        let mut h = harness();
        h.session.copy_down();
        h.session.confirm().unwrap();
        h.session.delete_active_token();
        h.session.confirm().unwrap();

        let u1 = UtteranceId::from("u1");
        h.session.handle_delivery(DeliveryReport::Failed {
            utterance: u1.clone(),
            revision: 1,
            reason: "HTTP 500".into(),
        });
        h.session.handle_delivery(DeliveryReport::Submitted {
            utterance: u1,
            revision: 2,
        });
        assert!(h.session.is_confirmed(0));
        assert!(h.session.last_error().is_none());
    }

    #[test]
    fn failure_of_latest_revision_still_unticks() {
        let mut h = harness();
        h.session.copy_down();
        h.session.confirm().unwrap();
        h.session.delete_active_token();
        h.session.confirm().unwrap();

        let u1 = UtteranceId::from("u1");
        h.session.handle_delivery(DeliveryReport::Submitted {
            utterance: u1.clone(),
            revision: 1,
        });
        h.session.handle_delivery(DeliveryReport::Failed {
            utterance: u1,
            revision: 2,
            reason: "locked".into(),
        });
        assert!(!h.session.is_confirmed(0));
    }

    #[test]
    fn report_for_unqueued_revision_is_ignored() {
        let mut h = harness();
        h.session.handle_delivery(DeliveryReport::Failed {
            utterance: UtteranceId::from("u1"),
            revision: 4,
            reason: "HTTP 500".into(),
        });
        assert!(h.session.last_error().is_none());
    }

    #[test]
    fn rework_replays_and_unticks() {
        let mut h = harness();
        h.session.copy_down();
        h.session.confirm().unwrap();
        h.backend.advance("u1", 0.7);

        h.session.apply(Command::Rework).unwrap();
        assert!(!h.session.is_confirmed(0));
        assert!(h.session.is_playing());
        assert_eq!(h.session.current_time(), 0.0);
    }

    // -----------------------------------------------------------------------
    // Playback events
    // -----------------------------------------------------------------------

    #[test]
    fn clip_end_resets_icon_without_advancing() {
        let mut h = harness();
        h.session.toggle_play_pause().unwrap();
        h.backend.finish("u1");
        h.session.poll_playback().unwrap();
        assert_eq!(h.session.icon(), PlayIcon::Play);
        assert_eq!(h.session.current_index(), 0);
    }

    #[test]
    fn clip_end_advances_when_enabled() {
        let mut h = harness_with(
            SessionOptions {
                auto_advance_on_end: true,
                ..SessionOptions::default()
            },
            256,
        );
        h.session.toggle_play_pause().unwrap();
        h.backend.finish("u1");
        h.session.poll_playback().unwrap();
        assert_eq!(h.session.current_index(), 1);
    }

    #[test]
    fn failed_advance_does_not_drop_later_clip_ends() {
        let mut h = harness_with(
            SessionOptions {
                auto_advance_on_end: true,
                ..SessionOptions::default()
            },
            256,
        );
        h.backend
            .0
            .borrow_mut()
            .missing
            .insert(UtteranceId::from("u2"));
        h.session.toggle_play_pause().unwrap();
        h.backend.finish("u1");
        h.backend.finish("u2");

        let err = h.session.poll_playback().unwrap_err();
        assert!(matches!(err, ReviewError::Playback(_)));
        // u2 failed to start but its end was still handled.
        assert_eq!(h.session.current_index(), 2);
        let ended = h
            .actions()
            .into_iter()
            .filter(|a| *a == "audio_ended")
            .count();
        assert_eq!(ended, 2);
    }

    // -----------------------------------------------------------------------
    // Action log / common words
    // -----------------------------------------------------------------------

    #[test]
    fn actions_are_registered() {
        let mut h = harness();
        h.session.toggle_play_pause().unwrap();
        h.session.copy_down();
        h.session.go_next().unwrap();
        let actions = h.actions();
        assert_eq!(actions, ["play_pause", "copy_down", "next", "tick"]);
    }

    #[test]
    fn common_word_joins_suggestions_and_is_sent() {
        let mut h = harness();
        assert!(h.session.add_common_word(" gonna "));
        assert_eq!(h.session.suggestions().query("gon"), ["gonna"]);

        let mut words = Vec::new();
        while let Ok(msg) = h.rx.try_recv() {
            if let ServerMessage::CommonWord { word, .. } = msg {
                words.push(word);
            }
        }
        assert_eq!(words, ["gonna"]);
        assert!(!h.session.add_common_word("  "));
    }
}
