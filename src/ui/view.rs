use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::{
    domain::{
        chat::ChatSession,
        selection_window::MESSAGE_VIEWPORT_ROWS,
        shell_state::ShellState,
        state::{AppState, FocusedPanel},
    },
    usecases::session::SessionSettings,
};

use super::{message_input::render_message_input, message_rendering, styles};

const APP_TITLE: &str = "telegram-console";
const GROUP_MARKER: &str = "# ";
const ELLIPSIS: char = '\u{2026}';
/// Message rows plus the panel borders.
const MESSAGE_PANEL_HEIGHT: u16 = MESSAGE_VIEWPORT_ROWS as u16 + 2;

pub fn render(
    frame: &mut Frame<'_>,
    shell: &ShellState,
    state: &AppState,
    settings: &SessionSettings,
) {
    let [header_area, content_area, status_area] = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .areas(frame.area());

    let [chats_area, messages_with_input_area] = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .areas(content_area);

    let [messages_area, input_area, _] = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(MESSAGE_PANEL_HEIGHT),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .areas(messages_with_input_area);

    frame.render_widget(
        Paragraph::new(header_line(state, usize::from(header_area.width)))
            .style(styles::header_style()),
        header_area,
    );
    render_chat_list_panel(frame, chats_area, shell, state);
    render_messages_panel(frame, messages_area, shell, state);
    render_message_input(
        frame,
        input_area,
        shell.input(),
        state.focused_panel == FocusedPanel::Input,
        state.selected_chat_id.is_some(),
    );
    frame.render_widget(Paragraph::new(status_line(state, shell)), status_area);

    if state.focused_panel == FocusedPanel::SettingsMenu {
        render_settings_panel(frame, content_area, settings, state);
    }
}

fn border_style(state: &AppState, panel: FocusedPanel) -> ratatui::style::Style {
    if state.focused_panel == panel {
        styles::active_panel_border_style()
    } else {
        styles::inactive_panel_border_style()
    }
}

fn render_chat_list_panel(frame: &mut Frame<'_>, area: Rect, shell: &ShellState, state: &AppState) {
    let block = Block::default()
        .title(format!("Chats ({})", state.chats.len()))
        .borders(Borders::ALL)
        .border_style(border_style(state, FocusedPanel::ChatList));

    if state.chats.is_empty() {
        frame.render_widget(Paragraph::new("No chats yet").block(block), area);
        return;
    }

    let inner_width = usize::from(area.width.saturating_sub(2));
    let items: Vec<ListItem<'static>> = state
        .chats
        .iter()
        .map(|chat| ListItem::new(chat_list_line(chat, inner_width)))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(styles::selected_row_style());

    let mut list_state = ListState::default();
    list_state.select(Some(shell.chat_cursor().min(state.chats.len() - 1)));
    frame.render_stateful_widget(list, area, &mut list_state);
}

/// `# Title      (3)`: group marker, title truncated to fit, unread badge
/// aligned right.
fn chat_list_line(chat: &ChatSession, width: usize) -> Line<'static> {
    let marker = if chat.is_group { GROUP_MARKER } else { "" };
    let badge = if chat.unread_count > 0 {
        format!(" ({})", chat.unread_count)
    } else {
        String::new()
    };

    let title_width = width.saturating_sub(marker.width() + badge.width());
    let title = truncate_to_width(&chat.title, title_width);
    let padding = title_width.saturating_sub(title.width());

    let mut spans = Vec::with_capacity(4);
    if !marker.is_empty() {
        spans.push(Span::styled(marker.to_owned(), styles::group_marker_style()));
    }
    spans.push(Span::styled(title, styles::chat_name_style()));
    if !badge.is_empty() {
        spans.push(Span::raw(" ".repeat(padding)));
        spans.push(Span::styled(badge, styles::unread_count_style()));
    }
    Line::from(spans)
}

/// Cuts `text` to at most `width` display columns, marking the cut with an
/// ellipsis.
fn truncate_to_width(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_owned();
    }
    if width == 0 {
        return String::new();
    }

    let budget = width - 1;
    let mut used = 0;
    let mut truncated = String::new();
    for ch in text.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if used + ch_width > budget {
            break;
        }
        used += ch_width;
        truncated.push(ch);
    }
    truncated.push(ELLIPSIS);
    truncated
}

fn render_messages_panel(frame: &mut Frame<'_>, area: Rect, shell: &ShellState, state: &AppState) {
    let border_style = border_style(state, FocusedPanel::Messages);

    let Some(chat_id) = state.selected_chat_id.as_ref() else {
        let panel = Paragraph::new("Select a chat to view messages").block(
            Block::default()
                .title("Messages")
                .borders(Borders::ALL)
                .border_style(border_style),
        );
        frame.render_widget(panel, area);
        return;
    };

    let messages = state.messages_for(chat_id);
    let capacity = message_capacity(area);
    let viewport = message_rendering::build_message_viewport(
        messages,
        shell.selected_message_index(messages),
        capacity,
        state.is_loading_older(chat_id),
    );
    let title = messages_title(state, viewport.position.as_deref());

    let body = if viewport.lines.is_empty() {
        Paragraph::new("No messages in this chat")
    } else {
        Paragraph::new(viewport.lines)
    };
    frame.render_widget(
        body.block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(border_style),
        ),
        area,
    );
}

/// The fixed viewport size, cut down only when the terminal is too short to
/// fit the whole panel.
fn message_capacity(area: Rect) -> usize {
    MESSAGE_VIEWPORT_ROWS.min(usize::from(area.height.saturating_sub(2)))
}

fn messages_title(state: &AppState, position: Option<&str>) -> String {
    let mut title = match state.selected_chat() {
        Some(chat) => format!("Messages | {}", chat.title),
        None => "Messages".to_owned(),
    };
    if let Some(position) = position {
        title.push(' ');
        title.push_str(position);
    }
    title
}

fn header_line(state: &AppState, width: usize) -> Line<'static> {
    let chat = state
        .selected_chat()
        .map(|chat| chat.title.as_str())
        .unwrap_or("No chat selected");
    let text = format!(" {APP_TITLE} | {chat}");
    Line::from(truncate_to_width(&text, width))
}

fn render_settings_panel(
    frame: &mut Frame<'_>,
    area: Rect,
    settings: &SessionSettings,
    state: &AppState,
) {
    let popup = centered(area, 50, 9);
    let panel = Paragraph::new(settings_lines(settings, state)).block(
        Block::default()
            .title("Settings")
            .borders(Borders::ALL)
            .border_style(styles::active_panel_border_style()),
    );
    frame.render_widget(Clear, popup);
    frame.render_widget(panel, popup);
}

fn settings_lines(settings: &SessionSettings, state: &AppState) -> Vec<Line<'static>> {
    vec![
        Line::from(vec![
            Span::raw("Connection:      "),
            Span::styled(
                state.connection_state.as_label(),
                styles::connection_style(state.connection_state),
            ),
        ]),
        Line::from(format!("Page size:       {}", settings.page_size)),
        Line::from(format!(
            "Connect timeout: {} ms",
            settings.connect_timeout.as_millis()
        )),
        Line::from(format!(
            "Fetch timeout:   {} ms",
            settings.fetch_timeout.as_millis()
        )),
        Line::from(""),
        Line::from(Span::styled(
            "l: logout | r: reconnect | Esc: back",
            styles::key_hint_style(),
        )),
    ]
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn status_line(state: &AppState, shell: &ShellState) -> Line<'static> {
    let hint = match state.focused_panel {
        FocusedPanel::ChatList => "j/k: navigate | Enter: open | s: settings | Tab: next | q: quit",
        FocusedPanel::Messages => "j/k: scroll | i: compose | Esc: chats | q: quit",
        FocusedPanel::Input => "Enter: send | Esc: chats | Tab: next",
        FocusedPanel::SettingsMenu => "l: logout | r: reconnect | Esc: back | q: quit",
    };

    let mut spans = vec![
        Span::raw(" "),
        Span::styled(
            state.connection_state.as_label(),
            styles::connection_style(state.connection_state),
        ),
        Span::raw(" | "),
        Span::styled(hint, styles::key_hint_style()),
    ];
    if let Some(notice) = shell.notice() {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(notice.to_owned(), styles::notice_style()));
    }
    Line::from(spans)
}
