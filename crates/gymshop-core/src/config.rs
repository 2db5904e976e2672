//! Application configuration management.
//!
//! This module handles loading and saving the user configuration (backend
//! origin, public endpoints, token storage backend, last used username) and
//! turning it into the `ClientConfig` the API client is built from.
//!
//! Configuration is stored at `~/.config/gymshop/config.json`. Environment
//! variables override the file: `GYMSHOP_API_URL`, `GYMSHOP_TIMEOUT_SECS`,
//! `GYMSHOP_TOKEN_STORE`.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::auth::{FileTokenStore, KeyringTokenStore, MemoryTokenStore, TokenStore};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "gymshop";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// HTTP request timeout in seconds.
/// Applies to the original request, the refresh call and the replay alike.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

const DEFAULT_REFRESH_PATH: &str = "/api/token/refresh/";
const DEFAULT_LOGIN_PATH: &str = "/api/token/";

/// Paths served without authentication: catalog and content listings.
const DEFAULT_PUBLIC_ENDPOINTS: &[&str] = &["/api/products/", "/api/articles/", "/api/workouts/"];

pub const ENV_API_URL: &str = "GYMSHOP_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "GYMSHOP_TIMEOUT_SECS";
pub const ENV_TOKEN_STORE: &str = "GYMSHOP_TOKEN_STORE";

/// Settings the `ApiClient` is constructed from.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub public_endpoints: Vec<String>,
    pub refresh_path: String,
    pub login_path: String,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            public_endpoints: DEFAULT_PUBLIC_ENDPOINTS.iter().map(|s| s.to_string()).collect(),
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_public_endpoints<I, S>(mut self, endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.public_endpoints = endpoints
            .into_iter()
            .map(Into::<String>::into)
            .filter(|s| !s.is_empty())
            .collect();
        self
    }

    pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    /// Join the base URL and a path without doubling or dropping the slash.
    pub fn url_for(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStoreKind {
    Memory,
    #[default]
    File,
    Keyring,
}

impl FromStr for TokenStoreKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(TokenStoreKind::Memory),
            "file" => Ok(TokenStoreKind::File),
            "keyring" | "keychain" => Ok(TokenStoreKind::Keyring),
            other => Err(anyhow::anyhow!("Unknown token store: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub public_endpoints: Vec<String>,
    pub refresh_path: String,
    pub login_path: String,
    pub token_store: TokenStoreKind,
    pub last_username: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            public_endpoints: DEFAULT_PUBLIC_ENDPOINTS.iter().map(|s| s.to_string()).collect(),
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            token_store: TokenStoreKind::default(),
            last_username: None,
        }
    }
}

impl Config {
    /// Load from the default location, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Override fields from environment-style lookups. Unparseable values are
    /// ignored with a warning.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.is_empty()) {
            self.base_url = url;
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            match secs.parse::<u64>() {
                Ok(secs) if secs > 0 => self.request_timeout_secs = secs,
                _ => warn!(value = %secs, "Ignoring invalid {}", ENV_TIMEOUT_SECS),
            }
        }
        if let Some(kind) = lookup(ENV_TOKEN_STORE) {
            match kind.parse() {
                Ok(kind) => self.token_store = kind,
                Err(e) => warn!(error = %e, "Ignoring invalid {}", ENV_TOKEN_STORE),
            }
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.base_url.clone())
            .with_timeout(Duration::from_secs(self.request_timeout_secs))
            .with_public_endpoints(self.public_endpoints.clone())
            .with_refresh_path(self.refresh_path.clone())
            .with_login_path(self.login_path.clone())
    }

    /// Build the configured token store backend.
    pub fn token_store(&self) -> Result<Arc<dyn TokenStore>> {
        let store: Arc<dyn TokenStore> = match self.token_store {
            TokenStoreKind::Memory => Arc::new(MemoryTokenStore::new()),
            TokenStoreKind::File => Arc::new(FileTokenStore::new(Self::cache_dir()?)),
            TokenStoreKind::Keyring => Arc::new(KeyringTokenStore::new(APP_NAME)),
        };
        Ok(store)
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}
