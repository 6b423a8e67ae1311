//! Runtime configuration.
//!
//! Settings come from an optional JSON file; missing fields fall back to
//! defaults, and a few `QUOTEBOOK_*` environment variables override the file.

use crate::sync::remote_client::{
    RemoteSettings, DEFAULT_ENDPOINT, DEFAULT_MAX_ITEMS, DEFAULT_REMOTE_CATEGORY,
};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_DB_PATH: &str = "QUOTEBOOK_DB_PATH";
pub const ENV_ENDPOINT: &str = "QUOTEBOOK_ENDPOINT";
pub const ENV_SYNC_INTERVAL_SECS: &str = "QUOTEBOOK_SYNC_INTERVAL_SECS";

const DEFAULT_DB_FILE_NAME: &str = "quotebook.sqlite3";
const DEFAULT_SYNC_INTERVAL_SECS: u64 = 10;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "cannot access `{}`: {source}", path.display()),
            Self::Parse { path, source } => {
                write!(f, "invalid config file `{}`: {source}", path.display())
            }
            Self::Invalid(message) => write!(f, "invalid configuration: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Invalid(_) => None,
        }
    }
}

/// Application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotebookConfig {
    /// SQLite file backing the durable store.
    pub db_path: PathBuf,
    /// Remote collection endpoint (GET snapshot, POST push).
    pub endpoint: String,
    /// Seconds between scheduled reconciliation cycles.
    pub sync_interval_secs: u64,
    /// Maximum number of remote records taken per snapshot.
    pub max_snapshot_items: usize,
    /// Category given to remote records without one.
    pub default_remote_category: String,
    pub log_level: String,
    /// Rolling log directory. Logging stays off when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for QuotebookConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            sync_interval_secs: DEFAULT_SYNC_INTERVAL_SECS,
            max_snapshot_items: DEFAULT_MAX_ITEMS,
            default_remote_category: DEFAULT_REMOTE_CATEGORY.to_string(),
            log_level: crate::logging::default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl QuotebookConfig {
    /// Loads `path` (when given and present), then applies environment overrides.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.with_overrides(|name| std::env::var(name).ok())
    }

    /// Reads a config file. A missing file yields defaults.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Writes this config as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let raw = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, raw).map_err(io_error)
    }

    /// Applies overrides resolved through `lookup`, then validates.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let non_blank = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(db_path) = non_blank(ENV_DB_PATH) {
            self.db_path = PathBuf::from(db_path);
        }
        if let Some(endpoint) = non_blank(ENV_ENDPOINT) {
            self.endpoint = endpoint;
        }
        if let Some(secs) = non_blank(ENV_SYNC_INTERVAL_SECS) {
            self.sync_interval_secs = secs.parse().map_err(|_| {
                ConfigError::Invalid(format!("{ENV_SYNC_INTERVAL_SECS} must be a number, got `{secs}`"))
            })?;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.sync_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "sync_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.max_snapshot_items == 0 {
            return Err(ConfigError::Invalid(
                "max_snapshot_items must be greater than zero".to_string(),
            ));
        }
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "endpoint must be an http(s) URL, got `{}`",
                self.endpoint
            )));
        }
        if self.default_remote_category.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "default_remote_category must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs)
    }

    pub fn remote_settings(&self) -> RemoteSettings {
        RemoteSettings {
            endpoint: self.endpoint.clone(),
            max_items: self.max_snapshot_items,
            default_category: self.default_remote_category.trim().to_string(),
        }
    }
}
