//! Configuration types.
//!
//! # Configuration
//!
//! ```toml
//! [api]
//! base_url = "https://admin.example.com"
//! timeout_secs = 15
//! refresh_timeout_secs = 30
//! exclude_paths = "(?i)(/auth/login|/auth/refresh-token|/auth/logout)$"
//!
//! [storage]
//! credentials_path = "~/.config/pame/credentials.json"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Result};

/// Base URL used when nothing is configured (local development server).
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:4000";

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Default upper bound on a token refresh call, in seconds.
pub const DEFAULT_REFRESH_TIMEOUT_SECS: u64 = 30;

/// Default credentials filename within the config directory.
pub const CREDENTIALS_FILE: &str = "credentials.json";

/// Environment variable overriding the API base URL.
pub const BASE_URL_ENV: &str = "PAME_API_BASE_URL";

/// Root configuration.
///
/// Every section is optional so that layers can be merged; use the
/// `effective_*` accessors to read values with defaults applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PameConfig {
    /// API connection settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api: Option<ApiConfig>,

    /// Credential storage settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageConfig>,
}

impl PameConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other wins per field).
    pub fn merge(&mut self, other: PameConfig) {
        if let Some(layer) = other.api {
            match self.api.as_mut() {
                Some(base) => base.merge(layer),
                None => self.api = Some(layer),
            }
        }

        if let Some(storage) = other.storage
            && storage.credentials_path.is_some()
        {
            self.storage = Some(storage);
        }
    }

    /// API settings with defaults applied.
    pub fn api(&self) -> ApiConfig {
        self.api.clone().unwrap_or_default()
    }

    /// Effective base URL.
    ///
    /// Resolution order:
    /// 1. `PAME_API_BASE_URL` environment variable
    /// 2. Configured `api.base_url`
    /// 3. [`DEFAULT_BASE_URL`]
    pub fn effective_base_url(&self) -> String {
        if let Ok(url) = std::env::var(BASE_URL_ENV)
            && !url.is_empty()
        {
            return url;
        }

        self.api
            .as_ref()
            .and_then(|api| api.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    /// Effective credentials file path, given the config directory.
    pub fn credentials_path(&self, config_dir: &Path) -> PathBuf {
        self.storage
            .as_ref()
            .and_then(|s| s.credentials_path.as_deref())
            .map(expand_path)
            .unwrap_or_else(|| config_dir.join(CREDENTIALS_FILE))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// [api]
// ─────────────────────────────────────────────────────────────────────────────

/// API connection settings.
///
/// Unset fields stay `None` so a later layer can override an earlier one with
/// any value, defaults included.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server base URL. `None` falls back to [`DEFAULT_BASE_URL`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Per-request timeout in seconds. `None` means [`DEFAULT_TIMEOUT_SECS`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Upper bound on a token refresh call in seconds; `0` disables the bound.
    /// `None` means [`DEFAULT_REFRESH_TIMEOUT_SECS`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_timeout_secs: Option<u64>,

    /// Regex matched against request paths that must never receive a token
    /// or trigger a refresh. `None` uses the client's built-in pattern.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_paths: Option<String>,
}

impl ApiConfig {
    /// Every field explicitly set to its default.
    pub fn with_defaults() -> Self {
        Self {
            base_url: Some(DEFAULT_BASE_URL.to_string()),
            timeout_secs: Some(DEFAULT_TIMEOUT_SECS),
            refresh_timeout_secs: Some(DEFAULT_REFRESH_TIMEOUT_SECS),
            exclude_paths: None,
        }
    }

    fn merge(&mut self, other: ApiConfig) {
        if other.base_url.is_some() {
            self.base_url = other.base_url;
        }
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
        if other.refresh_timeout_secs.is_some() {
            self.refresh_timeout_secs = other.refresh_timeout_secs;
        }
        if other.exclude_paths.is_some() {
            self.exclude_paths = other.exclude_paths;
        }
    }

    /// Configured request timeout in seconds, default applied.
    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)
    }

    /// Configured refresh timeout in seconds, default applied.
    pub fn refresh_timeout_secs(&self) -> u64 {
        self.refresh_timeout_secs
            .unwrap_or(DEFAULT_REFRESH_TIMEOUT_SECS)
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Result<Duration> {
        match self.timeout_secs() {
            0 => Err(ConfigError::InvalidValue {
                field: "api.timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            }),
            secs => Ok(Duration::from_secs(secs)),
        }
    }

    /// Refresh timeout, or `None` when disabled.
    pub fn refresh_timeout(&self) -> Option<Duration> {
        match self.refresh_timeout_secs() {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// [storage]
// ─────────────────────────────────────────────────────────────────────────────

/// Credential storage settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the credentials file. `~/` is expanded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials_path: Option<PathBuf>,
}

/// Expand ~ to home directory in paths.
fn expand_path(path: &Path) -> PathBuf {
    if let Some(s) = path.to_str()
        && let Some(rest) = s.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}
