use std::path::PathBuf;

use serde::Deserialize;

use crate::infra::config::{AppConfig, LogConfig, ServiceBackend, ServiceConfig};

#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    pub logging: Option<FileLogConfig>,
    pub service: Option<FileServiceConfig>,
}

impl FileConfig {
    pub fn merge_into(self, config: &mut AppConfig) {
        if let Some(logging) = self.logging {
            logging.merge_into(&mut config.logging);
        }

        if let Some(service) = self.service {
            service.merge_into(&mut config.service);
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileLogConfig {
    pub level: Option<String>,
    pub directory: Option<PathBuf>,
}

impl FileLogConfig {
    fn merge_into(self, config: &mut LogConfig) {
        if let Some(level) = self.level {
            config.level = level;
        }

        if let Some(directory) = self.directory {
            config.directory = Some(directory);
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileServiceConfig {
    pub backend: Option<ServiceBackend>,
    pub page_size: Option<usize>,
    pub connect_timeout_ms: Option<u64>,
    pub fetch_timeout_ms: Option<u64>,
    pub mock_connect_delay_ms: Option<u64>,
}

impl FileServiceConfig {
    fn merge_into(self, config: &mut ServiceConfig) {
        if let Some(backend) = self.backend {
            config.backend = backend;
        }

        if let Some(page_size) = self.page_size {
            config.page_size = page_size;
        }

        if let Some(timeout_ms) = self.connect_timeout_ms {
            config.connect_timeout_ms = timeout_ms;
        }

        if let Some(timeout_ms) = self.fetch_timeout_ms {
            config.fetch_timeout_ms = timeout_ms;
        }

        if let Some(delay_ms) = self.mock_connect_delay_ms {
            config.mock_connect_delay_ms = delay_ms;
        }
    }
}
