//! Wrap-around movement over the ordered utterance list.

/// Index after `current`; the last utterance wraps to the first.
///
/// ```
/// use transcript_review::session::navigator::next_index;
///
/// assert_eq!(next_index(0, 3), 1);
/// assert_eq!(next_index(2, 3), 0);
/// ```
pub fn next_index(current: usize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    (current + 1) % len
}

/// Index before `current`; the first utterance wraps to the last.
pub fn previous_index(current: usize, len: usize) -> usize {
    match (current, len) {
        (_, 0) => 0,
        (0, n) => n - 1,
        (i, _) => i - 1,
    }
}

/// Counter text shown next to the navigation buttons, e.g. `"3 / 50"`.
pub fn counter_label(display_index: usize, total: usize) -> String {
    format!("{display_index} / {total}")
}
