use std::{collections::HashMap, sync::Arc};

use super::{
    chat::{ChatId, ChatSession},
    message::{Message, MessageCursor},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn as_label(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        }
    }
}

/// UI region that currently receives keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusedPanel {
    #[default]
    ChatList,
    Messages,
    Input,
    SettingsMenu,
}

impl FocusedPanel {
    /// Next panel in the Tab cycle. The settings menu is not part of the cycle.
    pub fn next(self) -> Self {
        match self {
            Self::ChatList => Self::Messages,
            Self::Messages => Self::Input,
            Self::Input | Self::SettingsMenu => Self::ChatList,
        }
    }
}

/// Per-chat message sequence, ascending by id. Shared between state values
/// until a reduction touches that chat.
pub type MessageHistory = Arc<Vec<Message>>;

/// Session view model. Replaced as a whole by every reduction step.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    pub connection_state: ConnectionState,
    pub chats: Arc<Vec<ChatSession>>,
    pub selected_chat_id: Option<ChatId>,
    pub messages: HashMap<ChatId, MessageHistory>,
    pub focused_panel: FocusedPanel,
    pub loading_older_messages: HashMap<ChatId, bool>,
    pub has_more_messages: HashMap<ChatId, bool>,
}

impl AppState {
    /// The selected chat, if the selection refers to a chat in the list.
    /// A dangling selection resolves to `None`.
    pub fn selected_chat(&self) -> Option<&ChatSession> {
        let selected = self.selected_chat_id.as_ref()?;
        self.chat(selected)
    }

    pub fn chat(&self, chat_id: &ChatId) -> Option<&ChatSession> {
        self.chats.iter().find(|chat| &chat.id == chat_id)
    }

    pub fn is_selected(&self, chat_id: &ChatId) -> bool {
        self.selected_chat_id.as_ref() == Some(chat_id)
    }

    pub fn messages_for(&self, chat_id: &ChatId) -> &[Message] {
        self.messages
            .get(chat_id)
            .map(|history| history.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains_message(&self, chat_id: &ChatId, message_id: i64) -> bool {
        self.messages_for(chat_id)
            .binary_search_by_key(&message_id, |message| message.id)
            .is_ok()
    }

    /// Cursor pointing just before the oldest message currently held.
    pub fn oldest_cursor(&self, chat_id: &ChatId) -> Option<MessageCursor> {
        self.messages_for(chat_id)
            .first()
            .map(|message| MessageCursor::before(message.id))
    }

    pub fn is_loading_older(&self, chat_id: &ChatId) -> bool {
        self.loading_older_messages
            .get(chat_id)
            .copied()
            .unwrap_or(false)
    }

    pub fn has_more(&self, chat_id: &ChatId) -> bool {
        self.has_more_messages.get(chat_id).copied().unwrap_or(false)
    }

    /// Whether the history of this chat was ever paged from the service.
    pub fn has_paging_info(&self, chat_id: &ChatId) -> bool {
        self.has_more_messages.contains_key(chat_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(id: i64) -> Message {
        Message {
            id,
            sender_id: "1".to_owned(),
            sender_name: "Test".to_owned(),
            text: format!("message {id}"),
            timestamp_ms: 1000,
            is_outgoing: false,
        }
    }

    #[test]
    fn default_state_matches_session_start() {
        let state = AppState::default();

        assert_eq!(state.connection_state, ConnectionState::Disconnected);
        assert!(state.chats.is_empty());
        assert_eq!(state.selected_chat_id, None);
        assert!(state.messages.is_empty());
        assert_eq!(state.focused_panel, FocusedPanel::ChatList);
    }

    #[test]
    fn dangling_selection_resolves_to_no_chat() {
        let state = AppState {
            chats: Arc::new(vec![ChatSession::new("1", "John")]),
            selected_chat_id: Some(ChatId::from("9")),
            ..AppState::default()
        };

        assert!(state.selected_chat().is_none());
        assert!(state.is_selected(&ChatId::from("9")));
    }

    #[test]
    fn absent_flags_default_to_false() {
        let state = AppState::default();
        let chat = ChatId::from("1");

        assert!(!state.is_loading_older(&chat));
        assert!(!state.has_more(&chat));
        assert!(!state.has_paging_info(&chat));
    }

    #[test]
    fn oldest_cursor_points_before_head() {
        let chat = ChatId::from("1");
        let mut state = AppState::default();
        state
            .messages
            .insert(chat.clone(), Arc::new(vec![message(4), message(5)]));

        assert_eq!(state.oldest_cursor(&chat), Some(MessageCursor::before(4)));
        assert!(state.contains_message(&chat, 5));
        assert!(!state.contains_message(&chat, 6));
    }

    #[test]
    fn tab_cycle_skips_settings_menu() {
        assert_eq!(FocusedPanel::ChatList.next(), FocusedPanel::Messages);
        assert_eq!(FocusedPanel::Messages.next(), FocusedPanel::Input);
        assert_eq!(FocusedPanel::Input.next(), FocusedPanel::ChatList);
        assert_eq!(FocusedPanel::SettingsMenu.next(), FocusedPanel::ChatList);
    }
}
