use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::runtime::Runtime;

use crate::{
    cli::{Cli, Command},
    domain::{self, chat::ChatSession, state::ConnectionState},
    infra, service,
    ui::{self, CrosstermEventSource},
    usecases::{
        self,
        bootstrap::{self, BootstrapOptions},
        session::{Session, SessionSettings},
        shell::DefaultShellOrchestrator,
    },
};

const SESSION_STARTUP_FAILED: &str = "SESSION_STARTUP_FAILED";

pub fn run(cli: Cli) -> Result<()> {
    let context = bootstrap::bootstrap(BootstrapOptions {
        config_path: cli.config.as_deref(),
        force_mock: cli.mock,
    })?;

    tracing::debug!(
        ui = ui::module_name(),
        domain = domain::module_name(),
        service = service::module_name(),
        usecases = usecases::module_name(),
        infra = infra::module_name(),
        "module boundaries loaded"
    );

    let runtime = build_runtime()?;
    let session = Arc::new(Session::new(
        Arc::clone(&context.service),
        SessionSettings::from_config(&context.config.service),
    ));
    session.start();

    let result = match cli.command_or_default() {
        Command::Run => run_shell(&runtime, &session),
        Command::Chats => print_chats(&runtime, &session),
    };

    runtime.block_on(session.disconnect());
    session.teardown();
    drop(context);
    result
}

fn build_runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build async runtime")
}

fn run_shell(runtime: &Runtime, session: &Arc<Session>) -> Result<()> {
    let startup = Arc::clone(session);
    runtime.spawn(async move {
        if startup.connect().await != ConnectionState::Connected {
            tracing::warn!(code = SESSION_STARTUP_FAILED, "chat service did not connect");
            return;
        }
        if let Err(error) = startup.refresh_chats().await {
            tracing::warn!(code = SESSION_STARTUP_FAILED, error = %error, "initial chat list load failed");
        }
    });

    let mut event_source = CrosstermEventSource;
    let mut orchestrator =
        DefaultShellOrchestrator::new(Arc::clone(session), runtime.handle().clone());
    let result = ui::shell::start(&mut event_source, &mut orchestrator);
    orchestrator.abort_pending();
    result
}

fn print_chats(runtime: &Runtime, session: &Session) -> Result<()> {
    let state = runtime.block_on(session.connect());
    if state != ConnectionState::Connected {
        anyhow::bail!("chat service is {}", state.as_label());
    }

    runtime.block_on(session.refresh_chats())?;
    for line in chat_list_lines(&session.snapshot().chats) {
        println!("{line}");
    }
    Ok(())
}

fn chat_list_lines(chats: &[ChatSession]) -> Vec<String> {
    chats
        .iter()
        .map(|chat| {
            let marker = if chat.is_group { "#" } else { " " };
            let mut line = format!("{marker} {:>4}  {}", chat.id.as_str(), chat.title);
            if chat.unread_count > 0 {
                line.push_str(&format!(" ({})", chat.unread_count));
            }
            line
        })
        .collect()
}
