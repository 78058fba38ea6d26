//! `AppConfig` struct and TOML read/write.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default auth/my-list backend root.
const DEFAULT_BACKEND_URL: &str = "http://localhost:8000/api";

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// Auth and my-list backend settings.
    #[serde(default)]
    pub backend: BackendConfig,
    /// TMDB credentials.
    #[serde(default)]
    pub tmdb: TmdbConfig,
}

/// Backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackendConfig {
    /// API root URL.
    #[serde(default = "default_backend_url")]
    pub url: String,
    /// Synthesize auth responses locally instead of calling the backend.
    #[serde(default = "default_mock_auth")]
    pub mock_auth: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            mock_auth: default_mock_auth(),
        }
    }
}

fn default_backend_url() -> String {
    String::from(DEFAULT_BACKEND_URL)
}

const fn default_mock_auth() -> bool {
    true
}

/// TMDB configuration. Empty strings mean unset.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct TmdbConfig {
    /// v3 API key.
    #[serde(default)]
    pub api_key: String,
    /// v4 read access token.
    #[serde(default)]
    pub bearer_token: String,
}

impl AppConfig {
    /// Loads config from a TOML file. Returns default if file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Saves config to a TOML file, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation or file write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("failed to serialize config to TOML")?;
        std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
    }

    /// Applies `BACKEND_API_URL`, `USE_MOCK_AUTH`, `TMDB_API_KEY` and
    /// `TMDB_BEARER_TOKEN`. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = var("BACKEND_API_URL") {
            self.backend.url = url;
        }
        if let Some(raw) = var("USE_MOCK_AUTH") {
            match parse_flag(&raw) {
                Some(flag) => self.backend.mock_auth = flag,
                None => tracing::warn!(value = %raw, "ignoring unrecognized USE_MOCK_AUTH"),
            }
        }
        if let Some(key) = var("TMDB_API_KEY") {
            self.tmdb.api_key = key;
        }
        if let Some(token) = var("TMDB_BEARER_TOKEN") {
            self.tmdb.bearer_token = token;
        }
    }

    /// Logs the effective configuration with credentials masked.
    pub fn log_summary(&self) {
        tracing::debug!("Backend URL: {}", self.backend.url);
        tracing::debug!(
            "Auth mode: {}",
            if self.backend.mock_auth { "mock" } else { "remote" }
        );
        tracing::debug!("TMDB API key: {}", mask(&self.tmdb.api_key));
        tracing::debug!("TMDB bearer token: {}", mask(&self.tmdb.bearer_token));
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// `***` plus the last four characters, or `NOT SET`.
fn mask(secret: &str) -> String {
    if secret.is_empty() {
        return String::from("NOT SET");
    }
    let count = secret.chars().count();
    let tail: String = secret.chars().skip(count.saturating_sub(4)).collect();
    format!("***{tail}")
}
