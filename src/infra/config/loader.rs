use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::infra::{
    config::{file_config::FileConfig, AppConfig},
    error::AppError,
};

const DEFAULT_CONFIG_PATH: &str = "config.toml";

pub fn load(path: Option<&Path>) -> Result<AppConfig, AppError> {
    let config_path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    let mut config = AppConfig::default();

    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "config file not found, using defaults");
        return Ok(config);
    }

    let raw = fs::read_to_string(&config_path).map_err(|source| AppError::ConfigRead {
        path: config_path.clone(),
        source,
    })?;

    let file_config: FileConfig = toml::from_str(&raw).map_err(|source| AppError::ConfigParse {
        path: config_path,
        source,
    })?;

    file_config.merge_into(&mut config);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::config::ServiceBackend;

    #[test]
    fn returns_defaults_when_file_is_missing() {
        let config = load(Some(Path::new("./missing-config.toml"))).expect("config must load");

        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn merges_file_values_over_defaults() {
        let temp_dir = tempfile::tempdir().expect("must create temp dir");
        let config_path = temp_dir.path().join("config.toml");

        fs::write(
            &config_path,
            r#"[logging]
level = "debug"

[service]
backend = "remote"
page_size = 20
fetch_timeout_ms = 750
"#,
        )
        .expect("must write test config");

        let config = load(Some(&config_path)).expect("config must load");

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.service.backend, ServiceBackend::Remote);
        assert_eq!(config.service.page_size, 20);
        assert_eq!(config.service.fetch_timeout_ms, 750);
        assert_eq!(config.service.connect_timeout_ms, 5_000);
        assert_eq!(config.service.mock_connect_delay_ms, 100);
    }

    #[test]
    fn reports_parse_errors_with_path() {
        let temp_dir = tempfile::tempdir().expect("must create temp dir");
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "[service]\nbackend = \"carrier-pigeon\"\n")
            .expect("must write test config");

        let error = load(Some(&config_path)).expect_err("unknown backend must fail");

        assert!(matches!(error, AppError::ConfigParse { ref path, .. } if path == &config_path));
    }
}
