//! Backward history loading for a chat.
//!
//! A load claims the chat's `loading_older_messages` flag, fetches one page
//! older than the cursor and prepends it. The flag is released on every exit
//! path, including cancellation, by [`LoadingFlagRelease`].

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use crate::{
    domain::{action::Action, chat::ChatId, message::MessageCursor, state::AppState},
    service::{with_timeout, ChatService},
};

use super::{
    request_error::{map_service_error, LoadOlderError},
    store::StateStore,
};

const PAGINATION_FETCH_FAILED: &str = "PAGINATION_FETCH_FAILED";
const PAGINATION_STALE_DISCARDED: &str = "PAGINATION_STALE_DISCARDED";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOlderOutcome {
    /// Another load for this chat is still in flight.
    AlreadyLoading,
    Prepended { count: usize, has_more: bool },
    /// The service has nothing older than the cursor.
    Exhausted,
    /// The selection moved while the request was pending; the page was dropped.
    Discarded,
}

pub struct PaginationController {
    store: StateStore,
    service: Arc<dyn ChatService>,
    page_size: usize,
    fetch_timeout: Duration,
    generations: Mutex<HashMap<ChatId, u64>>,
}

impl PaginationController {
    pub fn new(
        store: StateStore,
        service: Arc<dyn ChatService>,
        page_size: usize,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            store,
            service,
            page_size,
            fetch_timeout,
            generations: Mutex::new(HashMap::new()),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn generation(&self, chat_id: &ChatId) -> u64 {
        self.generations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(chat_id)
            .copied()
            .unwrap_or(0)
    }

    /// Marks every request in flight for `chat_id` as stale.
    pub fn invalidate(&self, chat_id: &ChatId) {
        let mut generations = self
            .generations
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *generations.entry(chat_id.clone()).or_insert(0) += 1;
    }

    /// Loads one page of messages older than `cursor`, or the newest page when
    /// no cursor is given.
    pub async fn load_older(
        &self,
        chat_id: &ChatId,
        cursor: Option<MessageCursor>,
    ) -> Result<LoadOlderOutcome, LoadOlderError> {
        let Some(claim) = self.claim(chat_id) else {
            return Ok(LoadOlderOutcome::AlreadyLoading);
        };

        let _release = LoadingFlagRelease {
            store: &self.store,
            chat_id: chat_id.clone(),
        };

        let page = with_timeout(
            "get_messages",
            self.fetch_timeout,
            self.service.get_messages(chat_id, self.page_size, cursor),
        )
        .await
        .map_err(|error| {
            tracing::warn!(
                code = PAGINATION_FETCH_FAILED,
                chat_id = %chat_id,
                before = cursor.map(MessageCursor::message_id),
                error = %error,
                "failed to load older messages"
            );
            map_service_error(error)
        })?;

        let received = page.len();
        let batch: Vec<_> = match cursor {
            Some(cursor) => page
                .into_iter()
                .filter(|message| cursor.admits(message.id))
                .collect(),
            None => page,
        };

        let mut outcome = LoadOlderOutcome::Discarded;
        self.store.dispatch_with(|state| {
            if !self.is_current(&claim, state) {
                return Vec::new();
            }

            if batch.is_empty() {
                outcome = LoadOlderOutcome::Exhausted;
                return vec![Action::SetHasMoreMessages(chat_id.clone(), false)];
            }

            let has_more = received == self.page_size;
            outcome = LoadOlderOutcome::Prepended {
                count: batch.len(),
                has_more,
            };
            vec![
                Action::PrependMessages(chat_id.clone(), batch),
                Action::SetHasMoreMessages(chat_id.clone(), has_more),
            ]
        });

        match outcome {
            LoadOlderOutcome::Discarded => tracing::debug!(
                code = PAGINATION_STALE_DISCARDED,
                chat_id = %chat_id,
                generation = claim.generation,
                "discarded page for a chat that is no longer current"
            ),
            _ => tracing::debug!(chat_id = %chat_id, outcome = ?outcome, "older messages loaded"),
        }

        Ok(outcome)
    }

    /// Sets the chat's loading flag unless a load is already in flight. The
    /// generation and selection are read under the same store lock.
    fn claim(&self, chat_id: &ChatId) -> Option<Claim> {
        let mut claim = None;
        self.store.dispatch_with(|state| {
            if state.is_loading_older(chat_id) {
                return Vec::new();
            }
            claim = Some(Claim {
                chat_id: chat_id.clone(),
                generation: self.generation(chat_id),
                was_selected: state.is_selected(chat_id),
            });
            vec![Action::SetLoadingOlderMessages(chat_id.clone(), true)]
        });
        claim
    }

    fn is_current(&self, claim: &Claim, state: &AppState) -> bool {
        self.generation(&claim.chat_id) == claim.generation
            && (!claim.was_selected || state.is_selected(&claim.chat_id))
    }
}

struct Claim {
    chat_id: ChatId,
    generation: u64,
    was_selected: bool,
}

/// Clears the loading flag of a chat when dropped.
struct LoadingFlagRelease<'a> {
    store: &'a StateStore,
    chat_id: ChatId,
}

impl Drop for LoadingFlagRelease<'_> {
    fn drop(&mut self) {
        self.store.dispatch(Action::SetLoadingOlderMessages(
            self.chat_id.clone(),
            false,
        ));
    }
}
