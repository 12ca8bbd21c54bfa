//! Keyboard shortcuts.
//!
//! [`dispatch`] turns one key press into at most one [`Command`] for the
//! [`ReviewSession`](crate::session::ReviewSession).  Many keys do double
//! duty: while the word input holds text, arrows and Backspace edit that
//! text; once it is empty they drive navigation and the token editor.
//!
//! | Key            | Input state              | Command                      |
//! |----------------|--------------------------|------------------------------|
//! | `Ctrl+J`       | any                      | previous utterance           |
//! | `Ctrl+K`       | any                      | copy-down if empty, tick, next |
//! | `Ctrl+Enter`   | focused, non-empty       | add common word              |
//! | `Enter`        | focused, non-empty       | insert word                  |
//! | `Enter`        | otherwise, buffer empty  | copy-down                    |
//! | `Enter`        | otherwise                | tick and next                |
//! | `Up` / `Down`  | empty                    | previous / next utterance    |
//! | `Left`/`Right` | empty                    | move active word             |
//! | `Backspace`    | empty                    | delete active word           |
//! | `Tab`          | any                      | focus input, replay, untick  |

use crate::session::{Direction, Slot, UtteranceId};

// ---------------------------------------------------------------------------
// Key / Modifiers
// ---------------------------------------------------------------------------

/// Physical keys the reviewer UI reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Backspace,
    Tab,
    J,
    K,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub ctrl: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers { ctrl: false };
    pub const CTRL: Modifiers = Modifiers { ctrl: true };
}

// ---------------------------------------------------------------------------
// InputContext
// ---------------------------------------------------------------------------

/// What the dispatcher needs to know about the UI at key-press time.
#[derive(Debug, Clone, Copy)]
pub struct InputContext<'a> {
    /// Current text of the word input.
    pub input: &'a str,
    /// Whether the word input has keyboard focus.
    pub input_focused: bool,
    /// Whether the current utterance's edit buffer holds no words.
    pub buffer_empty: bool,
}

impl InputContext<'_> {
    fn input_empty(&self) -> bool {
        self.input.is_empty()
    }

    fn typed_word(&self) -> Option<String> {
        (self.input_focused && !self.input.trim().is_empty()).then(|| self.input.to_string())
    }
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// Every operation a reviewer can trigger, by key or by mouse.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    TogglePlayPause,
    Replay,
    PreviousUtterance,
    NextUtterance,
    JumpTo(UtteranceId),
    CopyDown,
    InsertToken(String),
    AddCommonWord(String),
    DeleteActiveToken,
    MoveActive(Direction),
    SelectToken(Slot),
    /// The add affordance was clicked.
    FocusInput,
    Confirm,
    ConfirmAndAdvance,
    /// Copy down when empty, then confirm and advance.
    QuickConfirm,
    /// Focus the input, replay the clip and clear the confirmed mark.
    Rework,
}

impl Command {
    /// Whether the word input should be emptied after this command runs.
    pub fn clears_input(&self) -> bool {
        matches!(
            self,
            Command::InsertToken(_)
                | Command::AddCommonWord(_)
                | Command::FocusInput
                | Command::SelectToken(_)
                | Command::MoveActive(_)
                | Command::Rework
        )
    }

    /// Whether the word input should take keyboard focus after this command.
    pub fn focuses_input(&self) -> bool {
        matches!(
            self,
            Command::InsertToken(_)
                | Command::AddCommonWord(_)
                | Command::FocusInput
                | Command::SelectToken(_)
                | Command::MoveActive(_)
                | Command::Rework
        )
    }
}

// ---------------------------------------------------------------------------
// dispatch
// ---------------------------------------------------------------------------

/// Result of dispatching one key press.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub command: Option<Command>,
    /// The key must not reach its default handler (scrolling, focus
    /// traversal, text editing).
    pub suppress_default: bool,
}

impl Dispatch {
    fn run(command: Command) -> Self {
        Self {
            command: Some(command),
            suppress_default: true,
        }
    }

    fn pass() -> Self {
        Self {
            command: None,
            suppress_default: false,
        }
    }

    fn swallow() -> Self {
        Self {
            command: None,
            suppress_default: true,
        }
    }
}

/// Map a key press to a [`Command`].
///
/// ```
/// use transcript_review::shortcuts::{dispatch, Command, InputContext, Key, Modifiers};
///
/// let ctx = InputContext { input: "", input_focused: true, buffer_empty: true };
/// let d = dispatch(Key::Enter, Modifiers::NONE, &ctx);
/// assert_eq!(d.command, Some(Command::CopyDown));
/// ```
pub fn dispatch(key: Key, mods: Modifiers, ctx: &InputContext<'_>) -> Dispatch {
    if mods.ctrl {
        return match key {
            Key::J => Dispatch::run(Command::PreviousUtterance),
            Key::K => Dispatch::run(Command::QuickConfirm),
            Key::Enter => match ctx.typed_word() {
                Some(word) => Dispatch::run(Command::AddCommonWord(word)),
                None => Dispatch::pass(),
            },
            _ => Dispatch::pass(),
        };
    }

    match key {
        Key::Enter => {
            if let Some(word) = ctx.typed_word() {
                Dispatch::run(Command::InsertToken(word))
            } else if ctx.buffer_empty {
                Dispatch::run(Command::CopyDown)
            } else {
                Dispatch::run(Command::ConfirmAndAdvance)
            }
        }
        Key::ArrowUp | Key::ArrowDown if !ctx.input_empty() => Dispatch::swallow(),
        Key::ArrowUp => Dispatch::run(Command::PreviousUtterance),
        Key::ArrowDown => Dispatch::run(Command::NextUtterance),
        Key::ArrowLeft if ctx.input_empty() => {
            Dispatch::run(Command::MoveActive(Direction::Left))
        }
        Key::ArrowRight if ctx.input_empty() => {
            Dispatch::run(Command::MoveActive(Direction::Right))
        }
        Key::Backspace if ctx.input_empty() => Dispatch::run(Command::DeleteActiveToken),
        Key::Tab => Dispatch::run(Command::Rework),
        _ => Dispatch::pass(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
