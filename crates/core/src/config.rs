use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const API_BASE_URL_ENV: &str = "DBQ_API_BASE_URL";
pub const CONFIG_DIR_ENV: &str = "DBQ_CONFIG_DIR";

const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_API_PREFIX: &str = "/api/v1";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_HISTORY_DISPLAY_WIDTH: usize = 80;

/// Client settings. Passed explicitly to the API client at construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    pub server_url: String,
    pub api_prefix: String,
    /// Full base URL; wins over `server_url` + `api_prefix` when set.
    pub api_base_url: Option<String>,
    pub request_timeout_secs: u64,
    pub query_timeout_seconds: Option<u32>,
    pub max_rows: Option<u32>,
    pub history_display_width: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            api_base_url: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            query_timeout_seconds: None,
            max_rows: None,
            history_display_width: DEFAULT_HISTORY_DISPLAY_WIDTH,
        }
    }
}

impl ClientConfig {
    /// Base every endpoint path is appended to, without a trailing slash.
    #[must_use]
    pub fn api_base_url(&self) -> String {
        if let Some(base) = self
            .api_base_url
            .as_deref()
            .map(str::trim)
            .filter(|base| !base.is_empty())
        {
            return base.trim_end_matches('/').to_string();
        }

        let server = self.server_url.trim().trim_end_matches('/');
        let prefix = self.api_prefix.trim().trim_matches('/');
        if prefix.is_empty() {
            server.to_string()
        } else {
            format!("{server}/{prefix}")
        }
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    #[must_use]
    pub fn with_api_base_url(mut self, base: impl Into<String>) -> Self {
        self.api_base_url = Some(base.into());
        self
    }

    /// Applies `DBQ_API_BASE_URL` if it is set and non-blank.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        match env::var(API_BASE_URL_ENV) {
            Ok(base) if !base.trim().is_empty() => self.with_api_base_url(base),
            _ => self,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config directory is unavailable for this platform")]
    ConfigDirUnavailable,
    #[error("failed to read config file at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Loads the config file at `path`. A missing or blank file yields defaults.
pub fn load_from_path(path: &Path) -> Result<ClientConfig, ConfigError> {
    if !path.exists() {
        return Ok(ClientConfig::default());
    }

    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    if raw.trim().is_empty() {
        return Ok(ClientConfig::default());
    }

    toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_default() -> Result<ClientConfig, ConfigError> {
    load_from_path(&default_config_path()?)
}

pub fn default_config_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = if let Some(custom) = env::var_os(CONFIG_DIR_ENV) {
        PathBuf::from(custom)
    } else if cfg!(target_os = "windows") {
        env::var_os("APPDATA")
            .map(PathBuf::from)
            .ok_or(ConfigError::ConfigDirUnavailable)?
    } else if let Some(xdg_config_home) = env::var_os("XDG_CONFIG_HOME") {
        PathBuf::from(xdg_config_home)
    } else {
        let home = env::var_os("HOME").ok_or(ConfigError::ConfigDirUnavailable)?;
        PathBuf::from(home).join(".config")
    };

    Ok(base_dir.join("dbq"))
}

pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    Ok(default_config_dir()?.join("config.toml"))
}
