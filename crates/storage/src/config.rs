#![forbid(unsafe_code)]

use crate::StoreError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_DATABASE_FILE: &str = "tracker.db";

const ENV_DATABASE_PATH: &str = "TRACKER_DATABASE_PATH";
const ENV_BUSY_TIMEOUT_MS: &str = "TRACKER_BUSY_TIMEOUT_MS";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// SQLite database file. Parent directories are created on open.
    pub database_path: PathBuf,
    /// How long a unit of work waits for the writer lock before failing.
    pub busy_timeout_ms: u64,
    /// Rows fetched per page when iterating change history.
    pub history_page_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_FILE),
            busy_timeout_ms: 5_000,
            history_page_size: 64,
        }
    }
}

impl StoreConfig {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            database_path: dir.as_ref().join(DEFAULT_DATABASE_FILE),
            ..Self::default()
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
            .map_err(|err| StoreError::Config(format!("{}: {err}", path.display())))
    }

    pub fn from_toml_str(content: &str) -> Result<Self, StoreError> {
        let config: Self =
            toml::from_str(content).map_err(|err| StoreError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_env_overrides(self) -> Result<Self, StoreError> {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Applies `TRACKER_*` overrides looked up through `lookup`.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, StoreError> {
        let value = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        if let Some(path) = value(ENV_DATABASE_PATH) {
            self.database_path = PathBuf::from(path);
        }
        if let Some(raw) = value(ENV_BUSY_TIMEOUT_MS) {
            self.busy_timeout_ms = raw.parse().map_err(|_| {
                StoreError::Config(format!("{ENV_BUSY_TIMEOUT_MS} must be an integer, got {raw:?}"))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        if self.database_path.as_os_str().is_empty() {
            return Err(StoreError::Config("database_path must not be empty".to_string()));
        }
        if self.history_page_size == 0 {
            return Err(StoreError::Config(
                "history_page_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}
