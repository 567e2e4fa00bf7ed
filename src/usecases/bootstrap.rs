use std::{path::Path, sync::Arc, time::Duration};

use crate::{
    infra::{
        self,
        config::{AppConfig, ServiceBackend},
        error::AppError,
        storage_layout::StorageLayout,
    },
    service::{mock::MockChatService, ChatService},
    usecases::context::AppContext,
};

/// Startup options given on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BootstrapOptions<'a> {
    pub config_path: Option<&'a Path>,
    pub force_mock: bool,
}

pub fn bootstrap(options: BootstrapOptions<'_>) -> Result<AppContext, AppError> {
    let config = load_config(options)?;

    let layout = match &config.logging.directory {
        Some(directory) => StorageLayout::under(directory.clone()),
        None => StorageLayout::resolve()?,
    };
    let log_guard = infra::logging::init(&config.logging, &layout)?;
    tracing::info!(
        log_file = %layout.log_file().display(),
        backend = config.service.backend.as_str(),
        "logging initialized"
    );

    let mut context = build_context(config)?;
    context.log_guard = Some(log_guard);
    Ok(context)
}

fn load_config(options: BootstrapOptions<'_>) -> Result<AppConfig, AppError> {
    let mut config = infra::config::load(options.config_path)?;

    if options.force_mock {
        config.service.backend = ServiceBackend::Mock;
    }

    Ok(config)
}

fn build_context(config: AppConfig) -> Result<AppContext, AppError> {
    let service = build_service(&config)?;
    Ok(AppContext::new(config, service))
}

fn build_service(config: &AppConfig) -> Result<Arc<dyn ChatService>, AppError> {
    match config.service.backend {
        ServiceBackend::Mock => Ok(Arc::new(MockChatService::with_connect_delay(
            Duration::from_millis(config.service.mock_connect_delay_ms),
        ))),
        ServiceBackend::Remote => Err(AppError::BackendUnavailable {
            backend: ServiceBackend::Remote.as_str(),
        }),
    }
}
