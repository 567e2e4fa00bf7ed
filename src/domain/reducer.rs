//! Pure reduction of [`AppState`] against [`Action`].
//!
//! Every arm builds a new state value; fields an action does not touch are
//! shared with the input (`Arc` clones), never mutated.

use std::{cmp::Ordering, sync::Arc};

use super::{
    action::Action,
    chat::ChatId,
    message::Message,
    state::{AppState, FocusedPanel},
};

pub fn reduce(state: &AppState, action: Action) -> AppState {
    match action {
        Action::SetConnectionState(connection_state) => AppState {
            connection_state,
            ..state.clone()
        },
        Action::SetChats(chats) => AppState {
            chats: Arc::new(chats),
            ..state.clone()
        },
        Action::SelectChat(chat_id) => AppState {
            selected_chat_id: Some(chat_id),
            focused_panel: FocusedPanel::Messages,
            ..state.clone()
        },
        Action::SetMessages(chat_id, messages) => with_history(state, chat_id, messages),
        Action::AddMessage(chat_id, message) => {
            let merged = merge_history(state.messages_for(&chat_id), vec![message]);
            with_history(state, chat_id, merged)
        }
        Action::PrependMessages(chat_id, older) => {
            let merged = merge_history(state.messages_for(&chat_id), older);
            with_history(state, chat_id, merged)
        }
        Action::SetFocusedPanel(focused_panel) => AppState {
            focused_panel,
            ..state.clone()
        },
        Action::UpdateUnreadCount(chat_id, unread_count) => {
            let chats = state
                .chats
                .iter()
                .map(|chat| {
                    if chat.id == chat_id {
                        let mut updated = chat.clone();
                        updated.unread_count = unread_count;
                        updated
                    } else {
                        chat.clone()
                    }
                })
                .collect();

            AppState {
                chats: Arc::new(chats),
                ..state.clone()
            }
        }
        Action::SetLoadingOlderMessages(chat_id, loading) => {
            let mut loading_older_messages = state.loading_older_messages.clone();
            loading_older_messages.insert(chat_id, loading);
            AppState {
                loading_older_messages,
                ..state.clone()
            }
        }
        Action::SetHasMoreMessages(chat_id, has_more) => {
            let mut has_more_messages = state.has_more_messages.clone();
            has_more_messages.insert(chat_id, has_more);
            AppState {
                has_more_messages,
                ..state.clone()
            }
        }
        // Variants added by newer producers are ignored.
        #[allow(unreachable_patterns)]
        _ => state.clone(),
    }
}

fn with_history(state: &AppState, chat_id: ChatId, history: Vec<Message>) -> AppState {
    let mut messages = state.messages.clone();
    messages.insert(chat_id, Arc::new(history));
    AppState {
        messages,
        ..state.clone()
    }
}

/// Merges an ascending batch into an ascending history.
///
/// Ids already present are skipped, so the result is strictly ascending.
/// Pure appends and pure prepends avoid the general merge.
fn merge_history(existing: &[Message], mut batch: Vec<Message>) -> Vec<Message> {
    batch.sort_by_key(|message| message.id);
    batch.dedup_by_key(|message| message.id);

    let (Some(head), Some(tail)) = (existing.first(), existing.last()) else {
        return batch;
    };

    let first = batch.first().map(|message| message.id);
    let last = batch.last().map(|message| message.id);

    match (first, last) {
        (Some(first), _) if first > tail.id => {
            let mut merged = Vec::with_capacity(existing.len() + batch.len());
            merged.extend_from_slice(existing);
            merged.extend(batch);
            merged
        }
        (_, Some(last)) if last < head.id => {
            batch.extend_from_slice(existing);
            batch
        }
        (Some(_), Some(_)) => interleave(existing, batch),
        _ => existing.to_vec(),
    }
}

fn interleave(existing: &[Message], batch: Vec<Message>) -> Vec<Message> {
    let mut merged = Vec::with_capacity(existing.len() + batch.len());
    let mut current = existing.iter().peekable();
    let mut incoming = batch.into_iter().peekable();

    loop {
        let next = match (current.peek(), incoming.peek()) {
            (Some(held), Some(new)) => match held.id.cmp(&new.id) {
                Ordering::Less => current.next().cloned(),
                Ordering::Greater => incoming.next(),
                Ordering::Equal => {
                    incoming.next();
                    current.next().cloned()
                }
            },
            (Some(_), None) => current.next().cloned(),
            (None, Some(_)) => incoming.next(),
            (None, None) => None,
        };

        match next {
            Some(message) => merged.push(message),
            None => break,
        }
    }

    merged
}
