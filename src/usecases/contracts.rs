use anyhow::Result;

use crate::{
    domain::{events::AppEvent, shell_state::ShellState, state::AppState},
    usecases::session::SessionSettings,
};

pub trait AppEventSource {
    fn next_event(&mut self) -> Result<Option<AppEvent>>;
}

pub trait ShellOrchestrator {
    fn state(&self) -> &ShellState;
    /// Current session view model to render.
    fn snapshot(&self) -> AppState;
    fn settings(&self) -> SessionSettings;
    fn handle_event(&mut self, event: AppEvent) -> Result<()>;
}
