pub type MessageId = i64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub sender_id: String,
    pub sender_name: String,
    pub text: String,
    pub timestamp_ms: i64,
    pub is_outgoing: bool,
}

impl Message {
    /// Name shown in the message view; outgoing messages are always "You".
    pub fn display_sender(&self) -> &str {
        if self.is_outgoing {
            "You"
        } else {
            &self.sender_name
        }
    }
}

/// Marker for "messages strictly older than this one".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageCursor(MessageId);

impl MessageCursor {
    pub fn before(id: MessageId) -> Self {
        Self(id)
    }

    pub fn message_id(self) -> MessageId {
        self.0
    }

    pub fn admits(self, id: MessageId) -> bool {
        id < self.0
    }
}
