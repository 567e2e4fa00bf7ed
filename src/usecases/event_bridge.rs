//! Routes service push events into the state store.

use crate::{
    domain::{action::Action, state::AppState},
    service::{ChatService, NewMessage, Subscription},
};

use super::store::StateStore;

/// Owns the push subscriptions of one session. Dropping the bridge releases
/// them as well.
#[derive(Debug)]
pub struct EventBridge {
    connection: Subscription,
    messages: Subscription,
}

impl EventBridge {
    pub fn attach(service: &dyn ChatService, store: &StateStore) -> Self {
        let connection_store = store.clone();
        let connection = service.on_connection_state_change(Box::new(move |connection| {
            tracing::debug!(state = connection.as_label(), "connection state pushed");
            connection_store.dispatch(Action::SetConnectionState(connection));
        }));

        let message_store = store.clone();
        let messages = service.on_new_message(Box::new(move |event| {
            let applied = message_store.dispatch_with(|state| plan_new_message(state, event));
            if applied == 0 {
                tracing::debug!(
                    chat_id = %event.chat_id,
                    message_id = event.message.id,
                    "ignored duplicate message push"
                );
            }
        }));

        tracing::debug!("event bridge attached");
        Self {
            connection,
            messages,
        }
    }

    #[cfg(test)]
    pub fn is_attached(&self) -> bool {
        self.connection.is_active() && self.messages.is_active()
    }

    pub fn detach(self) {
        self.connection.unsubscribe();
        self.messages.unsubscribe();
        tracing::debug!("event bridge detached");
    }
}

/// Actions for an incoming message. A message already present in the chat
/// yields nothing; a chat other than the selected one gets its unread count
/// bumped.
pub fn plan_new_message(state: &AppState, event: &NewMessage) -> Vec<Action> {
    let NewMessage { chat_id, message } = event;
    if state.contains_message(chat_id, message.id) {
        return Vec::new();
    }

    let mut actions = vec![Action::AddMessage(chat_id.clone(), message.clone())];
    if !state.is_selected(chat_id) {
        if let Some(chat) = state.chat(chat_id) {
            actions.push(Action::UpdateUnreadCount(
                chat_id.clone(),
                chat.unread_count.saturating_add(1),
            ));
        }
    }
    actions
}
