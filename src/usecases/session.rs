//! Session root: owns the store, the service handle, pagination and the event
//! bridge, and exposes the workflows the shell drives.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use crate::{
    domain::{
        action::Action,
        chat::ChatId,
        message::Message,
        state::{AppState, ConnectionState, FocusedPanel},
    },
    infra::config::ServiceConfig,
    service::{with_timeout, ChatService},
};

use super::{
    event_bridge::EventBridge,
    pagination::{LoadOlderOutcome, PaginationController},
    request_error::{
        map_service_error, LoadOlderError, OpenChatError, RefreshChatsError, SendMessageError,
    },
    store::StateStore,
};

pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const MAX_PAGE_SIZE: usize = 200;

const SESSION_CONNECT_FAILED: &str = "SESSION_CONNECT_FAILED";
const SESSION_REFRESH_FAILED: &str = "SESSION_REFRESH_FAILED";
const SESSION_SEND_FAILED: &str = "SESSION_SEND_FAILED";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub page_size: usize,
    pub connect_timeout: Duration,
    pub fetch_timeout: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            connect_timeout: Duration::from_millis(5_000),
            fetch_timeout: Duration::from_millis(5_000),
        }
    }
}

impl SessionSettings {
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self {
            page_size: normalized_page_size(config.page_size),
            connect_timeout: Duration::from_millis(config.connect_timeout_ms),
            fetch_timeout: Duration::from_millis(config.fetch_timeout_ms),
        }
    }
}

fn normalized_page_size(page_size: usize) -> usize {
    match page_size {
        0 => DEFAULT_PAGE_SIZE,
        value if value > MAX_PAGE_SIZE => MAX_PAGE_SIZE,
        value => value,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenChatOutcome {
    /// History was paged before; nothing was fetched.
    Cached,
    Loaded(LoadOlderOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Sent(Message),
    /// Blank input; nothing was sent.
    Skipped,
}

pub struct Session {
    store: StateStore,
    service: Arc<dyn ChatService>,
    pagination: PaginationController,
    bridge: Mutex<Option<EventBridge>>,
    settings: SessionSettings,
}

impl Session {
    pub fn new(service: Arc<dyn ChatService>, settings: SessionSettings) -> Self {
        let store = StateStore::new();
        let pagination = PaginationController::new(
            store.clone(),
            Arc::clone(&service),
            normalized_page_size(settings.page_size),
            settings.fetch_timeout,
        );

        Self {
            store,
            service,
            pagination,
            bridge: Mutex::new(None),
            settings,
        }
    }

    #[cfg(test)]
    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn snapshot(&self) -> AppState {
        self.store.snapshot()
    }

    pub fn settings(&self) -> SessionSettings {
        self.settings
    }

    /// Attaches the event bridge. Calling it again is a no-op.
    pub fn start(&self) {
        let mut bridge = self.bridge_slot();
        if bridge.is_some() {
            return;
        }

        self.store
            .dispatch(Action::SetConnectionState(self.service.connection_state()));
        *bridge = Some(EventBridge::attach(self.service.as_ref(), &self.store));
        tracing::info!(page_size = self.pagination.page_size(), "session started");
    }

    #[cfg(test)]
    pub fn is_started(&self) -> bool {
        self.bridge_slot().is_some()
    }

    /// Releases the push subscriptions. Later pushes no longer reach the store.
    pub fn teardown(&self) {
        if let Some(bridge) = self.bridge_slot().take() {
            bridge.detach();
            tracing::info!("session torn down");
        }
    }

    /// Connects the service and returns the resulting state. Failures and
    /// timeouts leave the session `Disconnected`.
    pub async fn connect(&self) -> ConnectionState {
        let result = with_timeout(
            "connect",
            self.settings.connect_timeout,
            self.service.connect(),
        )
        .await;

        let state = match result {
            Ok(()) => self.service.connection_state(),
            Err(error) => {
                tracing::warn!(
                    code = SESSION_CONNECT_FAILED,
                    error = %error,
                    "chat service connection failed"
                );
                ConnectionState::Disconnected
            }
        };

        self.store.dispatch(Action::SetConnectionState(state));
        state
    }

    pub async fn disconnect(&self) {
        if let Err(error) = with_timeout(
            "disconnect",
            self.settings.connect_timeout,
            self.service.disconnect(),
        )
        .await
        {
            tracing::warn!(error = %error, "chat service disconnect failed");
        }
        self.store
            .dispatch(Action::SetConnectionState(ConnectionState::Disconnected));
    }

    /// Replaces the chat list with the service's current one.
    pub async fn refresh_chats(&self) -> Result<usize, RefreshChatsError> {
        let chats = with_timeout(
            "get_chats",
            self.settings.fetch_timeout,
            self.service.get_chats(),
        )
        .await
        .map_err(|error| {
            tracing::warn!(code = SESSION_REFRESH_FAILED, error = %error, "chat list refresh failed");
            map_service_error(error)
        })?;

        let count = chats.len();
        self.store.dispatch(Action::SetChats(chats));
        tracing::debug!(count, "chat list refreshed");
        Ok(count)
    }

    /// Selects a chat. Page requests still pending for the previously
    /// selected chat become stale.
    pub fn select_chat(&self, chat_id: ChatId) {
        let previous = self.store.snapshot().selected_chat_id;
        if let Some(previous) = previous.filter(|previous| previous != &chat_id) {
            self.pagination.invalidate(&previous);
        }
        self.store.dispatch(Action::SelectChat(chat_id));
    }

    pub fn set_focus(&self, panel: FocusedPanel) {
        self.store.dispatch(Action::SetFocusedPanel(panel));
    }

    /// Selects the chat, marks it read and loads its newest page unless its
    /// history was paged before.
    ///
    /// If the chat was left and reopened while its first page was pending,
    /// that page is discarded and the reopen sees `AlreadyLoading`; the load
    /// is then repeated so the reselected chat does not stay empty.
    pub async fn open_chat(&self, chat_id: ChatId) -> Result<OpenChatOutcome, OpenChatError> {
        self.select_chat(chat_id.clone());
        self.store
            .dispatch(Action::UpdateUnreadCount(chat_id.clone(), 0));

        if self.store.snapshot().has_paging_info(&chat_id) {
            return Ok(OpenChatOutcome::Cached);
        }

        loop {
            let outcome = self.pagination.load_older(&chat_id, None).await?;
            if outcome != LoadOlderOutcome::Discarded || !self.needs_first_page(&chat_id) {
                return Ok(OpenChatOutcome::Loaded(outcome));
            }
            tracing::debug!(chat_id = %chat_id, "chat reopened while its first page was pending, reloading");
        }
    }

    /// Loads the page preceding the oldest message held for the chat.
    pub async fn load_older(&self, chat_id: &ChatId) -> Result<LoadOlderOutcome, LoadOlderError> {
        let cursor = self.store.snapshot().oldest_cursor(chat_id);
        self.pagination.load_older(chat_id, cursor).await
    }

    pub async fn send_message(
        &self,
        chat_id: &ChatId,
        text: &str,
    ) -> Result<SendOutcome, SendMessageError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(SendOutcome::Skipped);
        }

        let message = with_timeout(
            "send_message",
            self.settings.fetch_timeout,
            self.service.send_message(chat_id, text),
        )
        .await
        .map_err(|error| {
            tracing::warn!(
                code = SESSION_SEND_FAILED,
                chat_id = %chat_id,
                error = %error,
                "message send failed"
            );
            map_service_error(error)
        })?;

        self.store
            .dispatch(Action::AddMessage(chat_id.clone(), message.clone()));
        Ok(SendOutcome::Sent(message))
    }

    fn needs_first_page(&self, chat_id: &ChatId) -> bool {
        let state = self.store.snapshot();
        state.is_selected(chat_id) && !state.has_paging_info(chat_id)
    }

    fn bridge_slot(&self) -> MutexGuard<'_, Option<EventBridge>> {
        self.bridge.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.teardown();
    }
}
