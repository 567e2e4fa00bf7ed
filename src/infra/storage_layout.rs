use std::{fs, path::PathBuf};

use crate::infra::error::AppError;

const APP_DIR_NAME: &str = "telegram-console";
const LOG_FILE_NAME: &str = "telegram-console.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    pub state_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl StorageLayout {
    /// Resolves the platform state directory, falling back to the local data
    /// directory where the platform has no state directory.
    pub fn resolve() -> Result<Self, AppError> {
        let base = dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .ok_or_else(|| AppError::StoragePathResolution {
                details: "unable to resolve state or local data directory".into(),
            })?;

        Ok(Self::under(base.join(APP_DIR_NAME)))
    }

    /// Layout rooted at an explicit directory.
    pub fn under(state_dir: PathBuf) -> Self {
        Self {
            log_dir: state_dir.clone(),
            state_dir,
        }
    }

    pub fn ensure_dirs(&self) -> Result<(), AppError> {
        for dir in [&self.state_dir, &self.log_dir] {
            fs::create_dir_all(dir).map_err(|source| AppError::StorageDirCreate {
                path: dir.clone(),
                source,
            })?;
        }

        Ok(())
    }

    pub fn log_file_name(&self) -> &'static str {
        LOG_FILE_NAME
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join(LOG_FILE_NAME)
    }
}
