//! Deterministic in-memory chat service used for development and tests.

use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};

use crate::domain::{
    chat::{ChatId, ChatSession},
    message::{Message, MessageCursor, MessageId},
    state::ConnectionState,
};

use super::{
    ChatService, ConnectionCallback, EventChannel, NewMessage, NewMessageCallback, ServiceError,
    Subscription,
};

pub const DEFAULT_CONNECT_DELAY: Duration = Duration::from_millis(100);

const SELF_SENDER_ID: &str = "me";
const SELF_SENDER_NAME: &str = "You";
const WORK_GROUP_HISTORY_LEN: i64 = 40;

#[derive(Debug)]
struct MockState {
    connection: ConnectionState,
    histories: HashMap<ChatId, Vec<Message>>,
}

#[derive(Debug)]
pub struct MockChatService {
    state: Mutex<MockState>,
    chats: Vec<ChatSession>,
    connect_delay: Duration,
    connection_events: EventChannel<ConnectionState>,
    message_events: EventChannel<NewMessage>,
}

impl MockChatService {
    pub fn new() -> Self {
        Self::with_connect_delay(DEFAULT_CONNECT_DELAY)
    }

    pub fn with_connect_delay(connect_delay: Duration) -> Self {
        Self {
            state: Mutex::new(MockState {
                connection: ConnectionState::Disconnected,
                histories: preset_histories(),
            }),
            chats: preset_chats(),
            connect_delay,
            connection_events: EventChannel::new(),
            message_events: EventChannel::new(),
        }
    }

    /// Simulates a message arriving from another participant and publishes it.
    #[cfg(test)]
    pub fn push_incoming(&self, chat_id: &ChatId, sender_name: &str, text: &str) -> Message {
        let message = self.with_state(|state| {
            let history = state.histories.entry(chat_id.clone()).or_default();
            let message = Message {
                id: next_id(history),
                sender_id: sender_name.to_lowercase(),
                sender_name: sender_name.to_owned(),
                text: text.to_owned(),
                timestamp_ms: Utc::now().timestamp_millis(),
                is_outgoing: false,
            };
            history.push(message.clone());
            message
        });

        tracing::debug!(chat_id = %chat_id, message_id = message.id, "mock pushed incoming message");
        self.message_events.publish(&NewMessage {
            chat_id: chat_id.clone(),
            message: message.clone(),
        });
        message
    }

    /// Requests are only served while connected; a connect in progress
    /// reports the service as temporarily unavailable.
    fn ensure_connected(&self) -> Result<(), ServiceError> {
        match self.connection_state() {
            ConnectionState::Connected => Ok(()),
            ConnectionState::Connecting => Err(ServiceError::Unavailable(
                "connection in progress".to_owned(),
            )),
            ConnectionState::Disconnected => Err(ServiceError::NotConnected),
        }
    }

    fn ensure_known_chat(&self, chat_id: &ChatId) -> Result<(), ServiceError> {
        if self.chats.iter().any(|chat| &chat.id == chat_id) {
            Ok(())
        } else {
            Err(ServiceError::ChatNotFound(chat_id.clone()))
        }
    }

    fn set_connection(&self, connection: ConnectionState) {
        self.with_state(|state| state.connection = connection);
        self.connection_events.publish(&connection);
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut MockState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }
}

impl Default for MockChatService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatService for MockChatService {
    async fn connect(&self) -> Result<(), ServiceError> {
        self.set_connection(ConnectionState::Connecting);
        tokio::time::sleep(self.connect_delay).await;
        self.set_connection(ConnectionState::Connected);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), ServiceError> {
        self.set_connection(ConnectionState::Disconnected);
        Ok(())
    }

    fn connection_state(&self) -> ConnectionState {
        self.with_state(|state| state.connection)
    }

    async fn get_chats(&self) -> Result<Vec<ChatSession>, ServiceError> {
        self.ensure_connected()?;
        Ok(self.chats.clone())
    }

    async fn get_messages(
        &self,
        chat_id: &ChatId,
        limit: usize,
        before: Option<MessageCursor>,
    ) -> Result<Vec<Message>, ServiceError> {
        self.ensure_connected()?;
        self.ensure_known_chat(chat_id)?;
        Ok(self.with_state(|state| {
            let history = state
                .histories
                .get(chat_id)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            let older = match before {
                Some(cursor) => {
                    let end = history.partition_point(|message| cursor.admits(message.id));
                    &history[..end]
                }
                None => history,
            };
            older[older.len().saturating_sub(limit)..].to_vec()
        }))
    }

    async fn send_message(&self, chat_id: &ChatId, text: &str) -> Result<Message, ServiceError> {
        self.ensure_connected()?;
        self.ensure_known_chat(chat_id)?;
        Ok(self.with_state(|state| {
            let history = state.histories.entry(chat_id.clone()).or_default();
            let message = Message {
                id: next_id(history),
                sender_id: SELF_SENDER_ID.to_owned(),
                sender_name: SELF_SENDER_NAME.to_owned(),
                text: text.to_owned(),
                timestamp_ms: Utc::now().timestamp_millis(),
                is_outgoing: true,
            };
            history.push(message.clone());
            message
        }))
    }

    fn on_connection_state_change(&self, callback: ConnectionCallback) -> Subscription {
        self.connection_events
            .subscribe(move |connection: &ConnectionState| callback(*connection))
    }

    fn on_new_message(&self, callback: NewMessageCallback) -> Subscription {
        self.message_events.subscribe(callback)
    }
}

fn next_id(history: &[Message]) -> MessageId {
    history.last().map(|message| message.id + 1).unwrap_or(1)
}

fn preset_chats() -> Vec<ChatSession> {
    vec![
        ChatSession::new("1", "John Doe").with_unread(2),
        ChatSession::new("2", "Jane Smith"),
        ChatSession::new("3", "Work Group").with_unread(5).group(),
        ChatSession::new("4", "Family").group(),
    ]
}

fn preset_histories() -> HashMap<ChatId, Vec<Message>> {
    let mut histories = HashMap::new();

    histories.insert(
        ChatId::from("1"),
        vec![
            incoming(1, "1", "John", "Hey, how are you?", at(19, 10, 30)),
            outgoing(2, "I'm good, thanks!", at(19, 10, 31)),
            incoming(3, "1", "John", "Great to hear", at(19, 10, 32)),
        ],
    );
    histories.insert(
        ChatId::from("2"),
        vec![incoming(1, "2", "Jane", "Meeting at 3pm?", at(19, 9, 0))],
    );
    histories.insert(ChatId::from("3"), work_group_history());
    histories.insert(
        ChatId::from("4"),
        vec![incoming(1, "4", "Mom", "Dinner on Sunday?", at(18, 18, 0))],
    );

    histories
}

fn work_group_history() -> Vec<Message> {
    let start = at(18, 8, 0);
    let minute_ms = 60_000;

    (1..=WORK_GROUP_HISTORY_LEN)
        .map(|id| {
            let timestamp_ms = start + id * 15 * minute_ms;
            if id == WORK_GROUP_HISTORY_LEN {
                incoming(id, "3", "Bob", "Project update ready", timestamp_ms)
            } else if id % 3 == 0 {
                outgoing(id, &format!("Ack, item {id} is on my list"), timestamp_ms)
            } else if id % 2 == 0 {
                incoming(id, "5", "Alice", &format!("Status note #{id}"), timestamp_ms)
            } else {
                incoming(id, "3", "Bob", &format!("Build {id} finished"), timestamp_ms)
            }
        })
        .collect()
}

fn incoming(id: MessageId, sender_id: &str, sender_name: &str, text: &str, ts: i64) -> Message {
    Message {
        id,
        sender_id: sender_id.to_owned(),
        sender_name: sender_name.to_owned(),
        text: text.to_owned(),
        timestamp_ms: ts,
        is_outgoing: false,
    }
}

fn outgoing(id: MessageId, text: &str, ts: i64) -> Message {
    Message {
        id,
        sender_id: SELF_SENDER_ID.to_owned(),
        sender_name: SELF_SENDER_NAME.to_owned(),
        text: text.to_owned(),
        timestamp_ms: ts,
        is_outgoing: true,
    }
}

/// Unix milliseconds for a January 2026 day at the given UTC time.
fn at(day: u32, hour: u32, minute: u32) -> i64 {
    NaiveDate::from_ymd_opt(2026, 1, day)
        .and_then(|date| date.and_hms_opt(hour, minute, 0))
        .map(|datetime| datetime.and_utc().timestamp_millis())
        .unwrap_or_default()
}
