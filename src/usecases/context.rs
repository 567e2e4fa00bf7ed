use std::sync::Arc;

use tracing_appender::non_blocking::WorkerGuard;

use crate::{infra::config::AppConfig, service::ChatService};

pub struct AppContext {
    pub config: AppConfig,
    pub service: Arc<dyn ChatService>,
    /// Flushes the log file when the context is dropped.
    pub log_guard: Option<WorkerGuard>,
}

impl AppContext {
    pub fn new(config: AppConfig, service: Arc<dyn ChatService>) -> Self {
        Self {
            config,
            service,
            log_guard: None,
        }
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("config", &self.config)
            .field("connection_state", &self.service.connection_state())
            .field("file_logging", &self.log_guard.is_some())
            .finish()
    }
}
