use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AppConfig {
    pub logging: LogConfig,
    pub service: ServiceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogConfig {
    pub level: String,
    /// Directory for the log file. Defaults to the platform state directory.
    pub directory: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ServiceBackend {
    #[default]
    Mock,
    Remote,
}

impl ServiceBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mock => "mock",
            Self::Remote => "remote",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceConfig {
    pub backend: ServiceBackend,
    pub page_size: usize,
    pub connect_timeout_ms: u64,
    pub fetch_timeout_ms: u64,
    pub mock_connect_delay_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            backend: ServiceBackend::Mock,
            page_size: 50,
            connect_timeout_ms: 5_000,
            fetch_timeout_ms: 5_000,
            mock_connect_delay_ms: 100,
        }
    }
}
