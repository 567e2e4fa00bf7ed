//! Chat service boundary: the contract the session consumes and its
//! implementations.

pub mod channel;
pub mod mock;

use std::{future::Future, time::Duration};

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{
    chat::{ChatId, ChatSession},
    message::{Message, MessageCursor},
    state::ConnectionState,
};

pub use channel::{EventChannel, Subscription};

pub type ConnectionCallback = Box<dyn Fn(ConnectionState) + Send + Sync>;
pub type NewMessageCallback = Box<dyn Fn(&NewMessage) + Send + Sync>;

/// Push event for a message that arrived in some chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub chat_id: ChatId,
    pub message: Message,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("chat service is not connected")]
    NotConnected,
    #[error("chat {0} was not found")]
    ChatNotFound(ChatId),
    #[error("chat service unavailable: {0}")]
    Unavailable(String),
    #[error("{operation} timed out after {timeout_ms} ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },
}

#[async_trait]
pub trait ChatService: Send + Sync {
    /// Moves the service through `Connecting` to `Connected`.
    async fn connect(&self) -> Result<(), ServiceError>;

    async fn disconnect(&self) -> Result<(), ServiceError>;

    fn connection_state(&self) -> ConnectionState;

    async fn get_chats(&self) -> Result<Vec<ChatSession>, ServiceError>;

    /// Returns up to `limit` messages in ascending order, restricted to
    /// messages older than `before` when a cursor is given.
    async fn get_messages(
        &self,
        chat_id: &ChatId,
        limit: usize,
        before: Option<MessageCursor>,
    ) -> Result<Vec<Message>, ServiceError>;

    /// Returns the persisted outgoing message with its service-assigned id
    /// and timestamp.
    async fn send_message(&self, chat_id: &ChatId, text: &str) -> Result<Message, ServiceError>;

    fn on_connection_state_change(&self, callback: ConnectionCallback) -> Subscription;

    fn on_new_message(&self, callback: NewMessageCallback) -> Subscription;
}

/// Bounds a service call so a stalled backend resolves to a failure instead
/// of hanging the caller.
pub async fn with_timeout<T, F>(
    operation: &'static str,
    timeout: Duration,
    call: F,
) -> Result<T, ServiceError>
where
    F: Future<Output = Result<T, ServiceError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(ServiceError::Timeout {
            operation,
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}

/// Returns the service module name for smoke checks.
pub fn module_name() -> &'static str {
    "service"
}
