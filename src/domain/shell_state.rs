use super::{
    message::{Message, MessageId},
    message_input_state::MessageInputState,
};

/// Result of moving the message selection upwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveUp {
    Moved,
    /// Selection is already on the oldest loaded message.
    AtOldest,
}

/// Presentation-only state owned by the shell: cursors and the input buffer.
/// Conversation data lives in the session store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellState {
    running: bool,
    chat_cursor: usize,
    selected_message: Option<MessageId>,
    input: MessageInputState,
    notice: Option<String>,
}

impl Default for ShellState {
    fn default() -> Self {
        Self {
            running: true,
            chat_cursor: 0,
            selected_message: None,
            input: MessageInputState::default(),
            notice: None,
        }
    }
}

impl ShellState {
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn chat_cursor(&self) -> usize {
        self.chat_cursor
    }

    pub fn select_next_chat(&mut self, chat_count: usize) {
        let last_index = chat_count.saturating_sub(1);
        self.chat_cursor = std::cmp::min(self.chat_cursor.saturating_add(1), last_index);
    }

    pub fn select_previous_chat(&mut self) {
        self.chat_cursor = self.chat_cursor.saturating_sub(1);
    }

    /// Keeps the cursor inside a chat list that may have shrunk.
    pub fn clamp_chat_cursor(&mut self, chat_count: usize) {
        self.chat_cursor = std::cmp::min(self.chat_cursor, chat_count.saturating_sub(1));
    }

    /// Forgets the message selection; the view falls back to the newest message.
    pub fn reset_message_selection(&mut self) {
        self.selected_message = None;
    }

    /// Index of the selected message. The selection is tracked by id so that
    /// older pages prepended above it do not move it.
    pub fn selected_message_index(&self, messages: &[Message]) -> Option<usize> {
        if messages.is_empty() {
            return None;
        }

        self.selected_message
            .and_then(|id| {
                messages
                    .binary_search_by_key(&id, |message| message.id)
                    .ok()
            })
            .or(Some(messages.len() - 1))
    }

    pub fn select_next_message(&mut self, messages: &[Message]) {
        let Some(index) = self.selected_message_index(messages) else {
            return;
        };

        let next = std::cmp::min(index + 1, messages.len() - 1);
        self.selected_message = Some(messages[next].id);
    }

    pub fn select_previous_message(&mut self, messages: &[Message]) -> MoveUp {
        let Some(index) = self.selected_message_index(messages) else {
            return MoveUp::AtOldest;
        };

        if index == 0 {
            self.selected_message = Some(messages[0].id);
            return MoveUp::AtOldest;
        }

        self.selected_message = Some(messages[index - 1].id);
        MoveUp::Moved
    }

    pub fn input(&self) -> &MessageInputState {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut MessageInputState {
        &mut self.input
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }
}
