use std::{future::Future, sync::Arc};

use anyhow::Result;
use tokio::{runtime::Handle, sync::mpsc, task::JoinHandle};

use crate::domain::{
    chat::ChatId,
    events::{AppEvent, KeyInput},
    shell_state::{MoveUp, ShellState},
    state::{AppState, ConnectionState, FocusedPanel},
};

use super::{
    contracts::ShellOrchestrator,
    pagination::LoadOlderOutcome,
    session::{SendOutcome, Session, SessionSettings},
};

/// Routes key events to the session. Service calls run as tasks on the
/// runtime; their failures come back as notices picked up on the next event.
pub struct DefaultShellOrchestrator {
    state: ShellState,
    session: Arc<Session>,
    runtime: Handle,
    notices: mpsc::UnboundedReceiver<String>,
    notice_sender: mpsc::UnboundedSender<String>,
    pending: Vec<JoinHandle<()>>,
}

impl DefaultShellOrchestrator {
    pub fn new(session: Arc<Session>, runtime: Handle) -> Self {
        let (notice_sender, notices) = mpsc::unbounded_channel();
        Self {
            state: ShellState::default(),
            session,
            runtime,
            notices,
            notice_sender,
            pending: Vec::new(),
        }
    }

    /// Cancels service calls still in flight.
    pub fn abort_pending(&mut self) {
        for task in self.pending.drain(..) {
            task.abort();
        }
    }

    fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = Option<String>> + Send + 'static,
    {
        let notices = self.notice_sender.clone();
        self.pending.retain(|task| !task.is_finished());
        self.pending.push(self.runtime.spawn(async move {
            if let Some(notice) = task.await {
                let _ = notices.send(notice);
            }
        }));
    }

    fn drain_notices(&mut self) {
        while let Ok(notice) = self.notices.try_recv() {
            self.state.set_notice(notice);
        }
    }

    fn handle_key(&mut self, key: KeyInput) {
        let snapshot = self.session.snapshot();
        self.state.clamp_chat_cursor(snapshot.chats.len());

        match key {
            KeyInput::Tab => {
                self.session.set_focus(snapshot.focused_panel.next());
                return;
            }
            KeyInput::Esc => {
                self.session.set_focus(FocusedPanel::ChatList);
                return;
            }
            _ => {}
        }

        match snapshot.focused_panel {
            FocusedPanel::ChatList => self.handle_chat_list_key(key, &snapshot),
            FocusedPanel::Messages => self.handle_messages_key(key, &snapshot),
            FocusedPanel::Input => self.handle_input_key(key, &snapshot),
            FocusedPanel::SettingsMenu => match key {
                KeyInput::Char('l') => self.logout(),
                KeyInput::Char('r') => self.reconnect(),
                KeyInput::Char('q') => self.state.stop(),
                _ => {}
            },
        }
    }

    fn handle_chat_list_key(&mut self, key: KeyInput, snapshot: &AppState) {
        match key {
            KeyInput::Char('j') | KeyInput::Down => self.state.select_next_chat(snapshot.chats.len()),
            KeyInput::Char('k') | KeyInput::Up => self.state.select_previous_chat(),
            KeyInput::Char('s') => self.session.set_focus(FocusedPanel::SettingsMenu),
            KeyInput::Char('q') => self.state.stop(),
            KeyInput::Enter => {
                if let Some(chat) = snapshot.chats.get(self.state.chat_cursor()) {
                    self.open_chat(chat.id.clone());
                }
            }
            _ => {}
        }
    }

    fn handle_messages_key(&mut self, key: KeyInput, snapshot: &AppState) {
        let Some(chat_id) = snapshot.selected_chat_id.clone() else {
            if key == KeyInput::Char('q') {
                self.state.stop();
            }
            return;
        };
        let messages = snapshot.messages_for(&chat_id);

        match key {
            KeyInput::Char('j') | KeyInput::Down => self.state.select_next_message(messages),
            KeyInput::Char('k') | KeyInput::Up => {
                let boundary = self.state.select_previous_message(messages) == MoveUp::AtOldest;
                if boundary && snapshot.has_more(&chat_id) && !snapshot.is_loading_older(&chat_id) {
                    self.load_older(chat_id);
                }
            }
            KeyInput::Char('i') => self.session.set_focus(FocusedPanel::Input),
            KeyInput::Char('q') => self.state.stop(),
            _ => {}
        }
    }

    fn handle_input_key(&mut self, key: KeyInput, snapshot: &AppState) {
        match key {
            KeyInput::Char(ch) => {
                if !self.state.input_mut().push_char(ch) {
                    self.state.set_notice("Message is too long");
                }
            }
            KeyInput::Backspace => self.state.input_mut().pop_char(),
            KeyInput::Enter => {
                let Some(chat_id) = snapshot.selected_chat_id.clone() else {
                    self.state.set_notice("Select a chat first");
                    return;
                };
                let text = self.state.input_mut().take();
                self.send_message(chat_id, text);
            }
            _ => {}
        }
    }

    fn open_chat(&mut self, chat_id: ChatId) {
        self.state.reset_message_selection();
        self.state.clear_notice();
        let session = Arc::clone(&self.session);
        self.spawn(async move {
            session
                .open_chat(chat_id)
                .await
                .err()
                .map(|error| format!("Could not open chat: {error}"))
        });
    }

    fn load_older(&mut self, chat_id: ChatId) {
        let session = Arc::clone(&self.session);
        self.spawn(async move {
            match session.load_older(&chat_id).await {
                Ok(LoadOlderOutcome::Exhausted) => Some("No older messages".to_owned()),
                Ok(_) => None,
                Err(error) => Some(format!("Could not load older messages: {error}")),
            }
        });
    }

    fn logout(&mut self) {
        let session = Arc::clone(&self.session);
        self.spawn(async move {
            session.disconnect().await;
            Some("Logged out".to_owned())
        });
    }

    fn reconnect(&mut self) {
        let session = Arc::clone(&self.session);
        self.spawn(async move {
            if session.connect().await != ConnectionState::Connected {
                return Some("Could not connect to the chat service".to_owned());
            }
            session
                .refresh_chats()
                .await
                .err()
                .map(|error| format!("Could not load chats: {error}"))
        });
    }

    fn send_message(&mut self, chat_id: ChatId, text: String) {
        let session = Arc::clone(&self.session);
        self.state.reset_message_selection();
        self.spawn(async move {
            match session.send_message(&chat_id, &text).await {
                Ok(SendOutcome::Sent(_) | SendOutcome::Skipped) => None,
                Err(error) => Some(format!("Message not sent: {error}")),
            }
        });
    }
}

impl ShellOrchestrator for DefaultShellOrchestrator {
    fn state(&self) -> &ShellState {
        &self.state
    }

    fn snapshot(&self) -> AppState {
        self.session.snapshot()
    }

    fn settings(&self) -> SessionSettings {
        self.session.settings()
    }

    fn handle_event(&mut self, event: AppEvent) -> Result<()> {
        self.drain_notices();

        match event {
            AppEvent::Tick => {
                self.pending.retain(|task| !task.is_finished());
            }
            AppEvent::QuitRequested => self.state.stop(),
            AppEvent::Key(key) => self.handle_key(key),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::action::Action,
        service::{ChatService, ServiceError},
        test_support::{ids, messages, ScriptedChatService},
    };

    fn orchestrator(service: &Arc<ScriptedChatService>) -> DefaultShellOrchestrator {
        let service: Arc<dyn ChatService> = service.clone();
        let session = Arc::new(Session::new(
            service,
            SessionSettings {
                page_size: 3,
                ..SessionSettings::default()
            },
        ));
        session.start();
        DefaultShellOrchestrator::new(session, Handle::current())
    }

    async fn settle(orchestrator: &mut DefaultShellOrchestrator) {
        for task in orchestrator.pending.drain(..) {
            task.await.expect("shell task should not panic");
        }
        orchestrator
            .handle_event(AppEvent::Tick)
            .expect("tick must be handled");
    }

    fn press(orchestrator: &mut DefaultShellOrchestrator, keys: &[KeyInput]) {
        for key in keys {
            orchestrator
                .handle_event(AppEvent::Key(*key))
                .expect("key must be handled");
        }
    }

    fn type_text(orchestrator: &mut DefaultShellOrchestrator, text: &str) {
        let keys: Vec<_> = text.chars().map(KeyInput::Char).collect();
        press(orchestrator, &keys);
    }

    #[tokio::test]
    async fn stops_on_quit_event() {
        let service = ScriptedChatService::new();
        let mut orchestrator = orchestrator(&service);

        orchestrator
            .handle_event(AppEvent::QuitRequested)
            .expect("event must be handled");

        assert!(!orchestrator.state().is_running());
    }

    #[tokio::test]
    async fn q_in_chat_list_quits() {
        let service = ScriptedChatService::new();
        let mut orchestrator = orchestrator(&service);

        press(&mut orchestrator, &[KeyInput::Char('q')]);

        assert!(!orchestrator.state().is_running());
    }

    #[tokio::test]
    async fn tab_cycles_focus_and_esc_returns_to_chat_list() {
        let service = ScriptedChatService::new();
        let mut orchestrator = orchestrator(&service);

        press(&mut orchestrator, &[KeyInput::Tab]);
        assert_eq!(orchestrator.snapshot().focused_panel, FocusedPanel::Messages);
        press(&mut orchestrator, &[KeyInput::Tab]);
        assert_eq!(orchestrator.snapshot().focused_panel, FocusedPanel::Input);
        press(&mut orchestrator, &[KeyInput::Esc]);
        assert_eq!(orchestrator.snapshot().focused_panel, FocusedPanel::ChatList);
    }

    #[tokio::test]
    async fn s_opens_the_settings_menu() {
        let service = ScriptedChatService::new();
        let mut orchestrator = orchestrator(&service);

        press(&mut orchestrator, &[KeyInput::Char('s')]);

        assert_eq!(
            orchestrator.snapshot().focused_panel,
            FocusedPanel::SettingsMenu
        );
    }

    #[tokio::test]
    async fn logout_from_settings_disconnects_the_session() {
        let service = ScriptedChatService::new();
        let mut orchestrator = orchestrator(&service);
        orchestrator.session.connect().await;

        press(&mut orchestrator, &[KeyInput::Char('s'), KeyInput::Char('l')]);
        settle(&mut orchestrator).await;

        assert_eq!(
            orchestrator.snapshot().connection_state,
            ConnectionState::Disconnected
        );
        assert_eq!(service.connection_state(), ConnectionState::Disconnected);
        assert_eq!(orchestrator.state().notice(), Some("Logged out"));
        assert!(orchestrator.state().is_running());
    }

    #[tokio::test]
    async fn reconnect_from_settings_connects_and_reloads_chats() {
        let service = ScriptedChatService::new();
        let mut orchestrator = orchestrator(&service);

        press(&mut orchestrator, &[KeyInput::Char('s'), KeyInput::Char('r')]);
        settle(&mut orchestrator).await;

        let state = orchestrator.snapshot();
        assert_eq!(state.connection_state, ConnectionState::Connected);
        assert_eq!(state.chats.len(), 3);
        assert_eq!(orchestrator.state().notice(), None);
    }

    #[tokio::test]
    async fn enter_opens_the_chat_under_the_cursor() {
        let service = ScriptedChatService::new();
        let mut orchestrator = orchestrator(&service);
        orchestrator
            .session
            .refresh_chats()
            .await
            .expect("refresh should succeed");
        service.push_page(Ok(messages([1, 2])));

        press(&mut orchestrator, &[KeyInput::Char('j'), KeyInput::Enter]);
        settle(&mut orchestrator).await;

        let state = orchestrator.snapshot();
        assert_eq!(state.selected_chat_id, Some(ChatId::from("2")));
        assert_eq!(state.focused_panel, FocusedPanel::Messages);
        assert_eq!(ids(state.messages_for(&ChatId::from("2"))), vec![1, 2]);
    }

    #[tokio::test]
    async fn moving_above_the_oldest_message_loads_older_history() {
        let service = ScriptedChatService::new();
        let mut orchestrator = orchestrator(&service);
        orchestrator
            .session
            .refresh_chats()
            .await
            .expect("refresh should succeed");
        service.push_page(Ok(messages([4, 5, 6])));
        service.push_page(Ok(messages([1, 2, 3])));
        press(&mut orchestrator, &[KeyInput::Enter]);
        settle(&mut orchestrator).await;

        press(
            &mut orchestrator,
            &[KeyInput::Up, KeyInput::Up, KeyInput::Up],
        );
        settle(&mut orchestrator).await;

        let chat = ChatId::from("1");
        assert_eq!(
            ids(orchestrator.snapshot().messages_for(&chat)),
            vec![1, 2, 3, 4, 5, 6]
        );
        let messages = orchestrator.snapshot().messages_for(&chat).to_vec();
        assert_eq!(orchestrator.state().selected_message_index(&messages), Some(3));
    }

    #[tokio::test]
    async fn does_not_page_when_history_is_exhausted() {
        let service = ScriptedChatService::new();
        let mut orchestrator = orchestrator(&service);
        service.push_page(Ok(messages([1])));
        orchestrator
            .session
            .open_chat(ChatId::from("1"))
            .await
            .expect("open should succeed");

        press(&mut orchestrator, &[KeyInput::Up, KeyInput::Up]);
        settle(&mut orchestrator).await;

        assert_eq!(service.page_requests().len(), 1);
    }

    #[tokio::test]
    async fn typing_and_enter_sends_the_message() {
        let service = ScriptedChatService::new();
        let mut orchestrator = orchestrator(&service);
        orchestrator.session.select_chat(ChatId::from("1"));
        orchestrator.session.set_focus(FocusedPanel::Input);

        type_text(&mut orchestrator, "hi q");
        press(&mut orchestrator, &[KeyInput::Backspace, KeyInput::Enter]);
        settle(&mut orchestrator).await;

        assert!(orchestrator.state().is_running());
        assert!(orchestrator.state().input().is_empty());
        assert_eq!(
            service.sent(),
            vec![(ChatId::from("1"), "hi".to_owned())]
        );
    }

    #[tokio::test]
    async fn send_failure_becomes_a_notice() {
        let service = ScriptedChatService::new();
        service.fail_sends_with(ServiceError::NotConnected);
        let mut orchestrator = orchestrator(&service);
        orchestrator.session.select_chat(ChatId::from("1"));
        orchestrator.session.set_focus(FocusedPanel::Input);

        type_text(&mut orchestrator, "hello");
        press(&mut orchestrator, &[KeyInput::Enter]);
        settle(&mut orchestrator).await;

        assert_eq!(
            orchestrator.state().notice(),
            Some("Message not sent: not connected to the chat service")
        );
    }

    #[tokio::test]
    async fn enter_without_selected_chat_sets_notice() {
        let service = ScriptedChatService::new();
        let mut orchestrator = orchestrator(&service);
        orchestrator.session.set_focus(FocusedPanel::Input);

        type_text(&mut orchestrator, "x");
        press(&mut orchestrator, &[KeyInput::Enter]);

        assert_eq!(orchestrator.state().notice(), Some("Select a chat first"));
        assert!(service.sent().is_empty());
    }

    #[tokio::test]
    async fn pushed_state_is_visible_through_snapshot() {
        let service = ScriptedChatService::new();
        let orchestrator = orchestrator(&service);

        service.emit_connection(ConnectionState::Connected);
        orchestrator
            .session
            .store()
            .dispatch(Action::SetChats(crate::test_support::chats()));

        let state = orchestrator.snapshot();
        assert_eq!(state.connection_state, ConnectionState::Connected);
        assert_eq!(state.chats.len(), 3);
    }
}
