//! Per-utterance word-token edit buffer.
//!
//! The buffer is an ordered list of word tokens preceded by a fixed
//! sentinel slot ([`Slot::Begin`]).  Exactly one slot is active at any time;
//! new words are inserted directly after it.  The insertion point after the
//! last word (the "add" affordance in the UI) is not a slot and can never be
//! active.
//!
//! ```text
//!   [Begin] [the] [cat] [sat] (+)
//!                  ^^^^^ active
//! ```

// ---------------------------------------------------------------------------
// Slot / Direction
// ---------------------------------------------------------------------------

/// Position of the active marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Slot {
    /// The non-removable leading sentinel.
    #[default]
    Begin,
    /// Word token at the given 0-based index.
    Word(usize),
}

/// Cursor movement over slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

// ---------------------------------------------------------------------------
// EditBuffer
// ---------------------------------------------------------------------------

/// The reviewer's edit of one utterance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditBuffer {
    words: Vec<String>,
    active: Slot,
}

impl EditBuffer {
    /// A buffer holding only the sentinel, with the sentinel active.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn active(&self) -> Slot {
        self.active
    }

    /// The active word, or `None` while the sentinel is active.
    pub fn active_word(&self) -> Option<&str> {
        match self.active {
            Slot::Begin => None,
            Slot::Word(i) => self.words.get(i).map(String::as_str),
        }
    }

    /// `true` when only the sentinel is present.
    ///
    /// ```
    /// use transcript_review::session::EditBuffer;
    ///
    /// let mut buf = EditBuffer::new();
    /// assert!(buf.is_empty());
    /// buf.insert("hello");
    /// assert!(!buf.is_empty());
    /// ```
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Seed an empty buffer from the original transcript.
    ///
    /// Every whitespace-separated word becomes a token and the last one is
    /// made active.  Returns `false` (and leaves the buffer untouched) when
    /// the buffer already holds words or `original` has none.
    pub fn copy_down(&mut self, original: &str) -> bool {
        if !self.words.is_empty() {
            return false;
        }
        self.words = original.split_whitespace().map(str::to_string).collect();
        match self.words.len() {
            0 => false,
            n => {
                self.active = Slot::Word(n - 1);
                true
            }
        }
    }

    /// Insert `text` directly after the active slot and make it active.
    ///
    /// Surrounding whitespace is trimmed; empty or whitespace-only text is
    /// ignored and `false` is returned.
    pub fn insert(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        let at = match self.active {
            Slot::Begin => 0,
            Slot::Word(i) => i + 1,
        };
        self.words.insert(at, text.to_string());
        self.active = Slot::Word(at);
        true
    }

    /// Remove the active word and activate the slot before it.
    ///
    /// Returns the removed word, or `None` when the sentinel is active.
    pub fn delete_active(&mut self) -> Option<String> {
        let Slot::Word(i) = self.active else {
            return None;
        };
        let removed = self.words.remove(i);
        self.active = if i == 0 { Slot::Begin } else { Slot::Word(i - 1) };
        Some(removed)
    }

    /// Move the active marker one slot.  Left stops at the sentinel, right
    /// stops at the last word.  Returns whether the marker moved.
    pub fn move_active(&mut self, direction: Direction) -> bool {
        let next = match (direction, self.active) {
            (Direction::Left, Slot::Begin) => None,
            (Direction::Left, Slot::Word(0)) => Some(Slot::Begin),
            (Direction::Left, Slot::Word(i)) => Some(Slot::Word(i - 1)),
            (Direction::Right, Slot::Begin) if !self.words.is_empty() => Some(Slot::Word(0)),
            (Direction::Right, Slot::Word(i)) if i + 1 < self.words.len() => {
                Some(Slot::Word(i + 1))
            }
            (Direction::Right, _) => None,
        };
        match next {
            Some(slot) => {
                self.active = slot;
                true
            }
            None => false,
        }
    }

    /// Make `slot` active.  Out-of-range word slots are ignored.
    pub fn select(&mut self, slot: Slot) -> bool {
        match slot {
            Slot::Word(i) if i >= self.words.len() => false,
            _ => {
                self.active = slot;
                true
            }
        }
    }

    /// The edited utterance: all words joined by a single space.
    pub fn text(&self) -> String {
        self.words.join(" ")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
