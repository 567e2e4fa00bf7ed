//! Message view model: the windowed slice of a chat history as styled lines.

use chrono::{Local, TimeZone};
use ratatui::text::{Line, Span};

use crate::domain::{message::Message, selection_window::SelectionWindow};

use super::styles;

const LOADING_OLDER_TEXT: &str = "Loading older messages\u{2026}";

#[derive(Debug, Clone, PartialEq)]
pub struct MessageViewport {
    /// `(i/N)` position marker, present only when the history does not fit.
    pub position: Option<String>,
    pub lines: Vec<Line<'static>>,
}

/// Builds the rows for a message list of `capacity` rows, centred on
/// `selected` (the newest message when `None`). While older messages are
/// loading the first row is given to a loading indicator.
pub fn build_message_viewport(
    messages: &[Message],
    selected: Option<usize>,
    capacity: usize,
    loading_older: bool,
) -> MessageViewport {
    let mut lines = Vec::new();
    let mut capacity = capacity;
    if loading_older {
        lines.push(indicator_line(LOADING_OLDER_TEXT.to_owned()));
        capacity = capacity.saturating_sub(1);
    }

    if messages.is_empty() {
        return MessageViewport {
            position: None,
            lines,
        };
    }

    let selected = selected.unwrap_or(messages.len() - 1);
    let window = SelectionWindow::compute(messages.len(), capacity, selected);

    if window.show_scroll_up {
        lines.push(indicator_line(format!(
            "\u{2191} {} earlier",
            window.earlier_count
        )));
    }
    for index in window.visible.clone() {
        lines.push(message_line(&messages[index], index == selected));
    }
    if window.show_scroll_down {
        lines.push(indicator_line(format!("\u{2193} {} more", window.later_count)));
    }

    let position = window
        .is_windowed()
        .then(|| format!("({}/{})", selected.min(messages.len() - 1) + 1, messages.len()));

    MessageViewport { position, lines }
}

fn indicator_line(text: String) -> Line<'static> {
    Line::from(Span::styled(text, styles::scroll_indicator_style()))
}

/// `[HH:MM] Sender: text`, reversed when selected.
fn message_line(message: &Message, selected: bool) -> Line<'static> {
    let sender_style = if message.is_outgoing {
        styles::outgoing_sender_style()
    } else {
        styles::message_sender_style()
    };

    let line = Line::from(vec![
        Span::styled(
            format!("[{}] ", format_time(message.timestamp_ms)),
            styles::message_time_style(),
        ),
        Span::styled(format!("{}: ", message.display_sender()), sender_style),
        Span::styled(single_line(&message.text), styles::message_text_style()),
    ]);

    if selected {
        line.style(styles::selected_row_style())
    } else {
        line
    }
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn format_time(timestamp_ms: i64) -> String {
    match Local.timestamp_millis_opt(timestamp_ms) {
        chrono::LocalResult::Single(datetime) | chrono::LocalResult::Ambiguous(datetime, _) => {
            datetime.format("%H:%M").to_string()
        }
        chrono::LocalResult::None => "--:--".to_owned(),
    }
}
