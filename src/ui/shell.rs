use anyhow::Result;

use crate::{
    domain::{shell_state::ShellState, state::AppState},
    usecases::contracts::{AppEventSource, ShellOrchestrator},
};

use super::{terminal::TerminalSession, view};

pub fn start(
    event_source: &mut dyn AppEventSource,
    orchestrator: &mut dyn ShellOrchestrator,
) -> Result<()> {
    let settings = orchestrator.settings();
    tracing::info!(page_size = settings.page_size, "starting TUI shell");

    let mut terminal = TerminalSession::new()?;
    run_loop(event_source, orchestrator, |shell, state| {
        terminal.draw(|frame| view::render(frame, shell, state, &settings))
    })?;

    tracing::info!("TUI shell stopped");
    Ok(())
}

/// Draws, waits for the next event and dispatches it until the shell stops.
fn run_loop<D>(
    event_source: &mut dyn AppEventSource,
    orchestrator: &mut dyn ShellOrchestrator,
    mut draw: D,
) -> Result<()>
where
    D: FnMut(&ShellState, &AppState) -> Result<()>,
{
    while orchestrator.state().is_running() {
        let snapshot = orchestrator.snapshot();
        draw(orchestrator.state(), &snapshot)?;

        if let Some(event) = event_source.next_event()? {
            orchestrator.handle_event(event)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::runtime::Handle;

    use super::*;
    use crate::{
        domain::{
            events::{AppEvent, KeyInput},
            state::FocusedPanel,
        },
        service::ChatService,
        test_support::ScriptedChatService,
        ui::event_source::MockEventSource,
        usecases::{
            session::{Session, SessionSettings},
            shell::DefaultShellOrchestrator,
        },
    };

    fn orchestrator() -> DefaultShellOrchestrator {
        let service: Arc<dyn ChatService> = ScriptedChatService::new();
        let session = Arc::new(Session::new(service, SessionSettings::default()));
        session.start();
        DefaultShellOrchestrator::new(session, Handle::current())
    }

    #[tokio::test]
    async fn loop_draws_until_quit() {
        let mut source = MockEventSource::from(vec![
            AppEvent::Tick,
            AppEvent::Key(KeyInput::Tab),
            AppEvent::QuitRequested,
        ]);
        let mut orchestrator = orchestrator();
        let mut frames = Vec::new();

        run_loop(&mut source, &mut orchestrator, |_, state| {
            frames.push(state.focused_panel);
            Ok(())
        })
        .expect("loop must finish");

        assert!(!orchestrator.state().is_running());
        assert_eq!(
            frames,
            vec![
                FocusedPanel::ChatList,
                FocusedPanel::ChatList,
                FocusedPanel::Messages
            ]
        );
    }

    #[tokio::test]
    async fn draw_errors_stop_the_loop() {
        let mut source = MockEventSource::from(vec![AppEvent::Tick]);
        let mut orchestrator = orchestrator();

        let result = run_loop(&mut source, &mut orchestrator, |_, _| {
            Err(anyhow::anyhow!("terminal gone"))
        });

        assert!(result.is_err());
    }
}
