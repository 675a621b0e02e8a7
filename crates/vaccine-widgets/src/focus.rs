//! Focus trapping for dialogs.

/// Index to focus after Tab inside a dialog with `count` focusable
/// elements, wrapping at both ends. `None` when there is nothing to focus.
///
/// When focus is outside the dialog, Tab enters at the first element and
/// Shift+Tab at the last.
#[must_use]
pub fn next_focus(current: Option<usize>, count: usize, backwards: bool) -> Option<usize> {
    if count == 0 {
        return None;
    }
    let last = count - 1;
    Some(match (current, backwards) {
        (Some(index), false) if index < last => index + 1,
        (Some(index), true) if index > 0 && index <= last => index - 1,
        (Some(_) | None, false) => 0,
        (Some(_) | None, true) => last,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tab_wraps_at_both_ends() {
        assert_eq!(next_focus(Some(0), 3, false), Some(1));
        assert_eq!(next_focus(Some(2), 3, false), Some(0));
        assert_eq!(next_focus(Some(0), 3, true), Some(2));
        assert_eq!(next_focus(Some(2), 3, true), Some(1));
        assert_eq!(next_focus(None, 3, true), Some(2));
        assert_eq!(next_focus(Some(9), 3, true), Some(2));
        assert_eq!(next_focus(None, 0, false), None);
    }
}
