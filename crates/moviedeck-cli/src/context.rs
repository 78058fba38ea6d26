//! Builds stores and clients from the effective configuration.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use url::Url;

use crate::config::{AppConfig, resolve_config_path};
use moviedeck_api::backend::{AuthStrategy, BackendClient, MockAuthBackend};
use moviedeck_api::tmdb::TmdbClient;
use moviedeck_db::{MemoryStore, SqliteStore, StorageBackend};
use moviedeck_store::{CollectionStore, SessionStore};

/// User-Agent sent to every backend.
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Session store used by the CLI.
pub type CliSession = SessionStore<StorageBackend, AuthStrategy>;

/// Collection store used by the CLI.
pub type CliCollection = CollectionStore<StorageBackend, BackendClient>;

/// Effective settings for one CLI invocation.
#[derive(Debug)]
pub struct AppContext {
    dir: Option<PathBuf>,
    ephemeral: bool,
    config: AppConfig,
}

impl AppContext {
    /// Loads the config file, then layers environment variables and the
    /// `--mock`/`--no-mock` override on top.
    ///
    /// # Errors
    ///
    /// Returns an error if the config path cannot be resolved or the file
    /// cannot be parsed.
    pub fn load(dir: Option<PathBuf>, ephemeral: bool, mock_override: Option<bool>) -> Result<Self> {
        let path = resolve_config_path(dir.as_deref())?;
        let mut config = AppConfig::load(&path)?;
        config.apply_env(|key| std::env::var(key).ok());
        if let Some(mock) = mock_override {
            config.backend.mock_auth = mock;
        }
        config.log_summary();
        Ok(Self {
            dir,
            ephemeral,
            config,
        })
    }

    /// Opens storage, picks the auth strategy and restores the persisted session.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be opened, the backend URL is
    /// invalid, or the persisted session cannot be read.
    pub async fn session(&self) -> Result<CliSession> {
        let storage = if self.ephemeral {
            StorageBackend::Memory(MemoryStore::new())
        } else {
            StorageBackend::Sqlite(SqliteStore::open(self.dir.as_deref())?)
        };
        let strategy = if self.config.backend.mock_auth {
            AuthStrategy::Mock(MockAuthBackend::new())
        } else {
            AuthStrategy::Remote(self.backend_client()?)
        };
        if strategy.is_mock() {
            tracing::debug!("mock auth enabled, no auth requests leave this process");
        }

        let session = SessionStore::new(Arc::new(storage), strategy);
        session.initialize().await?;
        Ok(session)
    }

    /// Builds the my-list store sharing the session's storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend client cannot be built.
    pub fn collection(&self, session: &CliSession) -> Result<CliCollection> {
        Ok(CollectionStore::new(
            Arc::clone(session.storage()),
            self.backend_client()?,
            session.subscribe(),
        ))
    }

    /// Builds the TMDB client. The bearer token wins over the API key.
    ///
    /// # Errors
    ///
    /// Returns an error if no TMDB credential is configured.
    pub fn tmdb_client(&self) -> Result<TmdbClient> {
        let tmdb = &self.config.tmdb;
        if tmdb.api_key.is_empty() && tmdb.bearer_token.is_empty() {
            bail!("TMDB credentials not set: set TMDB_API_KEY or TMDB_BEARER_TOKEN");
        }
        let mut builder = TmdbClient::builder().user_agent(USER_AGENT);
        if tmdb.bearer_token.is_empty() {
            builder = builder.api_key(tmdb.api_key.clone());
        } else {
            builder = builder.bearer_token(tmdb.bearer_token.clone());
        }
        builder.build().context("failed to build TMDB client")
    }

    fn backend_client(&self) -> Result<BackendClient> {
        let url = Url::parse(&self.config.backend.url)
            .with_context(|| format!("invalid backend URL: {}", self.config.backend.url))?;
        BackendClient::builder()
            .base_url(url)
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build backend client")
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn context(config: AppConfig) -> AppContext {
        AppContext {
            dir: None,
            ephemeral: true,
            config,
        }
    }

    #[test]
    fn test_tmdb_client_requires_credentials() {
        // Arrange
        let ctx = context(AppConfig::default());

        // Act
        let result = ctx.tmdb_client();

        // Assert
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("TMDB credentials not set")
        );
    }

    #[test]
    fn test_tmdb_client_with_api_key() {
        // Arrange
        let mut config = AppConfig::default();
        config.tmdb.api_key = String::from("abc123");
        let ctx = context(config);

        // Act & Assert
        assert!(ctx.tmdb_client().is_ok());
    }

    #[test]
    fn test_backend_client_rejects_bad_url() {
        // Arrange
        let mut config = AppConfig::default();
        config.backend.url = String::from("not a url");
        let ctx = context(config);

        // Act
        let result = ctx.backend_client();

        // Assert
        assert!(result.unwrap_err().to_string().contains("invalid backend URL"));
    }

    #[tokio::test]
    async fn test_ephemeral_mock_session_starts_signed_out() {
        // Arrange
        let ctx = context(AppConfig::default());

        // Act
        let session = ctx.session().await.unwrap();

        // Assert
        assert!(!session.is_authenticated());
        assert!(session.user().is_none());
    }

    #[tokio::test]
    async fn test_collection_shares_session_storage() {
        // Arrange
        let ctx = context(AppConfig::default());
        let session = ctx.session().await.unwrap();

        // Act
        let list = ctx.collection(&session).unwrap();

        // Assert
        assert!(list.items().is_empty());
        assert!(!list.state().loading);
    }
}
