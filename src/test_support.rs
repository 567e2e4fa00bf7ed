//! Shared fixtures and a scripted chat service double for session tests.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::{
    domain::{
        chat::{ChatId, ChatSession},
        message::{Message, MessageCursor, MessageId},
        state::ConnectionState,
    },
    service::{
        ChatService, ConnectionCallback, EventChannel, NewMessage, NewMessageCallback,
        ServiceError, Subscription,
    },
};

pub fn message(id: MessageId) -> Message {
    Message {
        id,
        sender_id: "42".to_owned(),
        sender_name: "Alice".to_owned(),
        text: format!("message {id}"),
        timestamp_ms: 1_768_800_000_000 + id * 60_000,
        is_outgoing: false,
    }
}

pub fn messages(ids: impl IntoIterator<Item = MessageId>) -> Vec<Message> {
    ids.into_iter().map(message).collect()
}

pub fn ids(messages: &[Message]) -> Vec<MessageId> {
    messages.iter().map(|message| message.id).collect()
}

pub fn chats() -> Vec<ChatSession> {
    vec![
        ChatSession::new("1", "John Doe").with_unread(2),
        ChatSession::new("2", "Jane Smith"),
        ChatSession::new("3", "Work Group").with_unread(5).group(),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectBehavior {
    Succeed,
    Fail,
    Hang,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub chat_id: ChatId,
    pub limit: usize,
    pub before: Option<MessageCursor>,
}

/// Chat service double whose responses are queued by the test.
///
/// `get_messages` pops the next scripted page (an empty page when none is
/// queued). When gated, each page request signals [`Self::wait_for_request`]
/// and then waits for [`Self::release_page`] before answering.
pub struct ScriptedChatService {
    connection: Mutex<ConnectionState>,
    connect_behavior: Mutex<ConnectBehavior>,
    chats: Mutex<Result<Vec<ChatSession>, ServiceError>>,
    pages: Mutex<VecDeque<Result<Vec<Message>, ServiceError>>>,
    send_failure: Mutex<Option<ServiceError>>,
    gated: Mutex<bool>,
    requested: Notify,
    release: Notify,
    page_requests: Mutex<Vec<PageRequest>>,
    sent: Mutex<Vec<(ChatId, String)>>,
    connection_events: EventChannel<ConnectionState>,
    message_events: EventChannel<NewMessage>,
}

impl ScriptedChatService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            connection: Mutex::new(ConnectionState::Disconnected),
            connect_behavior: Mutex::new(ConnectBehavior::Succeed),
            chats: Mutex::new(Ok(chats())),
            pages: Mutex::new(VecDeque::new()),
            send_failure: Mutex::new(None),
            gated: Mutex::new(false),
            requested: Notify::new(),
            release: Notify::new(),
            page_requests: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            connection_events: EventChannel::new(),
            message_events: EventChannel::new(),
        })
    }

    pub fn set_connect_behavior(&self, behavior: ConnectBehavior) {
        *lock(&self.connect_behavior) = behavior;
    }

    pub fn set_chats(&self, result: Result<Vec<ChatSession>, ServiceError>) {
        *lock(&self.chats) = result;
    }

    pub fn push_page(&self, page: Result<Vec<Message>, ServiceError>) {
        lock(&self.pages).push_back(page);
    }

    pub fn fail_sends_with(&self, error: ServiceError) {
        *lock(&self.send_failure) = Some(error);
    }

    pub fn gate_pages(&self) {
        *lock(&self.gated) = true;
    }

    pub async fn wait_for_request(&self) {
        self.requested.notified().await;
    }

    pub fn release_page(&self) {
        self.release.notify_one();
    }

    pub fn page_requests(&self) -> Vec<PageRequest> {
        lock(&self.page_requests).clone()
    }

    pub fn sent(&self) -> Vec<(ChatId, String)> {
        lock(&self.sent).clone()
    }

    pub fn emit_connection(&self, state: ConnectionState) {
        *lock(&self.connection) = state;
        self.connection_events.publish(&state);
    }

    pub fn emit_message(&self, chat_id: &str, message: Message) -> usize {
        self.message_events.publish(&NewMessage {
            chat_id: ChatId::from(chat_id),
            message,
        })
    }

    pub fn subscriber_counts(&self) -> (usize, usize) {
        (
            self.connection_events.subscriber_count(),
            self.message_events.subscriber_count(),
        )
    }
}

#[async_trait]
impl ChatService for ScriptedChatService {
    async fn connect(&self) -> Result<(), ServiceError> {
        self.emit_connection(ConnectionState::Connecting);
        let behavior = *lock(&self.connect_behavior);
        match behavior {
            ConnectBehavior::Succeed => {
                self.emit_connection(ConnectionState::Connected);
                Ok(())
            }
            ConnectBehavior::Fail => {
                self.emit_connection(ConnectionState::Disconnected);
                Err(ServiceError::Unavailable("connection refused".to_owned()))
            }
            ConnectBehavior::Hang => std::future::pending().await,
        }
    }

    async fn disconnect(&self) -> Result<(), ServiceError> {
        self.emit_connection(ConnectionState::Disconnected);
        Ok(())
    }

    fn connection_state(&self) -> ConnectionState {
        *lock(&self.connection)
    }

    async fn get_chats(&self) -> Result<Vec<ChatSession>, ServiceError> {
        lock(&self.chats).clone()
    }

    async fn get_messages(
        &self,
        chat_id: &ChatId,
        limit: usize,
        before: Option<MessageCursor>,
    ) -> Result<Vec<Message>, ServiceError> {
        lock(&self.page_requests).push(PageRequest {
            chat_id: chat_id.clone(),
            limit,
            before,
        });

        let gated = *lock(&self.gated);
        if gated {
            self.requested.notify_one();
            self.release.notified().await;
        }

        let page = lock(&self.pages).pop_front();
        page.unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn send_message(&self, chat_id: &ChatId, text: &str) -> Result<Message, ServiceError> {
        if let Some(error) = lock(&self.send_failure).clone() {
            return Err(error);
        }

        let mut sent = lock(&self.sent);
        sent.push((chat_id.clone(), text.to_owned()));
        Ok(Message {
            id: 1_000 + sent.len() as MessageId,
            sender_id: "me".to_owned(),
            sender_name: "You".to_owned(),
            text: text.to_owned(),
            timestamp_ms: 1_768_900_000_000,
            is_outgoing: true,
        })
    }

    fn on_connection_state_change(&self, callback: ConnectionCallback) -> Subscription {
        self.connection_events
            .subscribe(move |state: &ConnectionState| callback(*state))
    }

    fn on_new_message(&self, callback: NewMessageCallback) -> Subscription {
        self.message_events.subscribe(callback)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().expect("scripted service lock")
}
