//! Visible sub-range of a message history for a fixed-capacity viewport.
//!
//! The window is centred on the selection and clamped to the history bounds.
//! Each active scroll indicator ("↑ N earlier" / "↓ N more") takes one row of
//! the viewport, so the rendered slice shrinks by one row per indicator.

use std::ops::Range;

/// Rows available to the message list in the message view.
pub const MESSAGE_VIEWPORT_ROWS: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionWindow {
    /// Window before indicator rows are taken out.
    pub start: usize,
    pub end: usize,
    /// Indices of the messages that are actually rendered.
    pub visible: Range<usize>,
    pub show_scroll_up: bool,
    pub show_scroll_down: bool,
    pub earlier_count: usize,
    pub later_count: usize,
}

impl SelectionWindow {
    pub fn compute(total: usize, capacity: usize, selected: usize) -> Self {
        if total <= capacity {
            return Self {
                start: 0,
                end: total,
                visible: 0..total,
                show_scroll_up: false,
                show_scroll_down: false,
                earlier_count: 0,
                later_count: 0,
            };
        }

        let selected = selected.min(total - 1);
        let start = selected
            .saturating_sub(capacity / 2)
            .min(total - capacity);
        let end = start + capacity;

        let show_scroll_up = start > 0;
        let show_scroll_down = end < total;

        let adjusted_start = start + usize::from(show_scroll_up);
        let adjusted_end = end
            .saturating_sub(usize::from(show_scroll_down))
            .max(adjusted_start);

        Self {
            start,
            end,
            visible: adjusted_start..adjusted_end,
            show_scroll_up,
            show_scroll_down,
            earlier_count: adjusted_start,
            later_count: total - end,
        }
    }

    #[cfg(test)]
    pub fn contains(&self, index: usize) -> bool {
        self.visible.contains(&index)
    }

    pub fn is_windowed(&self) -> bool {
        self.show_scroll_up || self.show_scroll_down
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_history_is_shown_whole_without_indicators() {
        for total in 0..=MESSAGE_VIEWPORT_ROWS {
            let window = SelectionWindow::compute(total, MESSAGE_VIEWPORT_ROWS, 0);

            assert_eq!(window.visible, 0..total);
            assert!(!window.show_scroll_up);
            assert!(!window.show_scroll_down);
            assert!(!window.is_windowed());
        }
    }

    #[test]
    fn selection_at_top_anchors_window_to_start() {
        let window = SelectionWindow::compute(20, 15, 0);

        assert_eq!((window.start, window.end), (0, 15));
        assert!(!window.show_scroll_up);
        assert!(window.show_scroll_down);
        assert_eq!(window.visible, 0..14);
        assert_eq!(window.later_count, 5);
    }

    #[test]
    fn selection_at_bottom_anchors_window_to_end() {
        let window = SelectionWindow::compute(20, 15, 19);

        assert_eq!((window.start, window.end), (5, 20));
        assert!(window.show_scroll_up);
        assert!(!window.show_scroll_down);
        assert_eq!(window.visible, 6..20);
        assert_eq!(window.earlier_count, 6);
    }

    #[test]
    fn middle_selection_shows_both_indicators() {
        let window = SelectionWindow::compute(100, 15, 50);

        assert_eq!((window.start, window.end), (43, 58));
        assert_eq!(window.visible, 44..57);
        assert_eq!(window.earlier_count, 44);
        assert_eq!(window.later_count, 42);
        assert!(window.contains(50));
    }

    #[test]
    fn selection_stays_visible_for_every_index_and_capacity_from_three() {
        for capacity in 3..=20 {
            for total in 0..=40 {
                for selected in 0..total {
                    let window = SelectionWindow::compute(total, capacity, selected);
                    assert!(
                        window.contains(selected),
                        "total={total} capacity={capacity} selected={selected} window={window:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn selection_past_the_end_is_clamped() {
        let window = SelectionWindow::compute(20, 15, 99);

        assert_eq!((window.start, window.end), (5, 20));
    }

    #[test]
    fn degenerate_capacity_never_panics() {
        for capacity in 0..3 {
            for selected in 0..10 {
                let window = SelectionWindow::compute(10, capacity, selected);
                assert!(window.visible.start <= window.visible.end);
                assert!(window.visible.end <= 10);
            }
        }
    }
}
