//! Input bar rendering.

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::domain::message_input_state::MessageInputState;

use super::styles;

const PLACEHOLDER_TEXT: &str = "Press 'i' to type a message...";
const NO_CHAT_PLACEHOLDER_TEXT: &str = "Open a chat to start typing";
const PROMPT_SYMBOL: &str = "> ";

pub fn render_message_input(
    frame: &mut Frame<'_>,
    area: Rect,
    input_state: &MessageInputState,
    is_focused: bool,
    has_chat: bool,
) {
    let border_style = if is_focused {
        styles::active_panel_border_style()
    } else {
        styles::inactive_panel_border_style()
    };

    let text_width = usize::from(area.width.saturating_sub(2))
        .saturating_sub(PROMPT_SYMBOL.len())
        .saturating_sub(1);
    let visible_text = visible_tail(input_state.text(), text_width);
    let line = build_input_line(visible_text, is_focused, has_chat);

    let paragraph = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style),
    );
    frame.render_widget(paragraph, area);

    if is_focused {
        let offset = PROMPT_SYMBOL.len() + visible_text.width();
        let cursor_x = area
            .x
            .saturating_add(1)
            .saturating_add(u16::try_from(offset).unwrap_or(u16::MAX));
        let cursor_y = area.y.saturating_add(1);
        frame.set_cursor_position((cursor_x, cursor_y));
    }
}

fn build_input_line(text: &str, is_focused: bool, has_chat: bool) -> Line<'static> {
    let prompt = Span::styled(PROMPT_SYMBOL.to_owned(), styles::input_prompt_style());

    if !is_focused && text.is_empty() {
        let placeholder = if has_chat {
            PLACEHOLDER_TEXT
        } else {
            NO_CHAT_PLACEHOLDER_TEXT
        };
        return Line::from(vec![
            prompt,
            Span::styled(placeholder.to_owned(), styles::input_placeholder_style()),
        ]);
    }

    Line::from(vec![
        prompt,
        Span::styled(text.to_owned(), styles::input_text_style()),
    ])
}

/// Longest suffix of `text` whose display width fits in `max_width` columns,
/// so the end of a long draft stays next to the cursor.
fn visible_tail(text: &str, max_width: usize) -> &str {
    let mut width = 0;
    for (index, ch) in text.char_indices().rev() {
        width += ch.width().unwrap_or(0);
        if width > max_width {
            return &text[index + ch.len_utf8()..];
        }
    }
    text
}
