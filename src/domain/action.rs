use super::{
    chat::{ChatId, ChatSession},
    message::Message,
    state::{ConnectionState, FocusedPanel},
};

/// Closed set of state transitions understood by the reducer.
///
/// Marked non-exhaustive so that newer producers can introduce variants
/// without breaking the store; unknown variants reduce to a no-op.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetConnectionState(ConnectionState),
    SetChats(Vec<ChatSession>),
    /// Selects a chat and moves focus to the message view.
    SelectChat(ChatId),
    SetMessages(ChatId, Vec<Message>),
    AddMessage(ChatId, Message),
    /// Places an older, ascending batch before the current head.
    PrependMessages(ChatId, Vec<Message>),
    SetFocusedPanel(FocusedPanel),
    UpdateUnreadCount(ChatId, u32),
    SetLoadingOlderMessages(ChatId, bool),
    SetHasMoreMessages(ChatId, bool),
}

impl Action {
    /// Short name used in logs; payloads may carry message text and are not logged.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SetConnectionState(_) => "set_connection_state",
            Self::SetChats(_) => "set_chats",
            Self::SelectChat(_) => "select_chat",
            Self::SetMessages(..) => "set_messages",
            Self::AddMessage(..) => "add_message",
            Self::PrependMessages(..) => "prepend_messages",
            Self::SetFocusedPanel(_) => "set_focused_panel",
            Self::UpdateUnreadCount(..) => "update_unread_count",
            Self::SetLoadingOlderMessages(..) => "set_loading_older_messages",
            Self::SetHasMoreMessages(..) => "set_has_more_messages",
        }
    }
}
