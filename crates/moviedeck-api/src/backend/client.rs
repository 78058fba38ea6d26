//! `BackendClient` - auth and my-list REST backend client.

use anyhow::{Context, Result};
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use super::api::{LocalAuthBackend, LocalCollectionBackend};
use super::error::BackendError;
use super::types::{
    Favorite, FavoriteRequest, FavoritesResponse, LoginRequest, LoginResponse, MediaKind,
    Registration, User, UserEnvelope, UserUpdate,
};

/// REST backend client.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct BackendClient {
    /// HTTP client.
    http_client: Client,
    /// API root, always ending in `/`.
    base_url: Url,
}

/// Builder for `BackendClient`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct BackendClientBuilder {
    base_url: Option<Url>,
    user_agent: Option<String>,
}

impl BackendClientBuilder {
    /// Creates a new builder.
    const fn new() -> Self {
        Self {
            base_url: None,
            user_agent: None,
        }
    }

    /// Sets the API root, e.g. `https://example.com/api` (required).
    #[must_use]
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Sets the User-Agent (required).
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// - `base_url` is not set.
    /// - `user_agent` is not set.
    /// - `reqwest::Client` build fails.
    pub fn build(self) -> Result<BackendClient> {
        let mut base_url = self.base_url.context("base_url is required")?;
        let user_agent = self.user_agent.context("user_agent is required")?;

        // `Url::join` replaces the last segment unless the path ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http_client = Client::builder()
            .user_agent(&user_agent)
            .gzip(true)
            .build()
            .context("failed to build HTTP client")?;

        Ok(BackendClient {
            http_client,
            base_url,
        })
    }
}

impl BackendClient {
    /// Creates a new builder.
    #[must_use]
    pub const fn builder() -> BackendClientBuilder {
        BackendClientBuilder::new()
    }

    /// API root URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        Ok(self.base_url.join(path)?)
    }

    /// Sends a request with the JSON API headers and maps non-2xx to `BackendError::Status`.
    async fn send(&self, request: RequestBuilder, path: &str) -> Result<Response, BackendError> {
        let response = request
            .header(ACCEPT, "application/json")
            .header("X-Requested-With", "XMLHttpRequest")
            .send()
            .await?;

        let status = response.status();
        tracing::debug!(path, %status, "backend response");

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<failed to read body>"));
            return Err(BackendError::from_response(status, body));
        }

        Ok(response)
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

impl LocalAuthBackend for BackendClient {
    #[instrument(skip_all)]
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, BackendError> {
        let url = self.endpoint("login")?;
        let request = self
            .http_client
            .post(url)
            .json(&LoginRequest { email, password });
        let response = self.send(request, "login").await?;
        Self::read_json(response).await
    }

    #[instrument(skip_all)]
    async fn register(&self, registration: &Registration) -> Result<(), BackendError> {
        let url = self.endpoint("register")?;
        let request = self.http_client.post(url).json(registration);
        self.send(request, "register").await?;
        Ok(())
    }

    #[instrument(skip_all)]
    async fn logout(&self, token: &str) -> Result<(), BackendError> {
        let url = self.endpoint("logout")?;
        let request = self.http_client.post(url).bearer_auth(token);
        self.send(request, "logout").await?;
        Ok(())
    }

    #[instrument(skip_all)]
    async fn current_user(&self, token: &str, _cached: Option<&User>) -> Result<User, BackendError> {
        let url = self.endpoint("user")?;
        let request = self.http_client.get(url).bearer_auth(token);
        let response = self.send(request, "user").await?;
        let envelope: UserEnvelope = Self::read_json(response).await?;
        Ok(envelope.into_user())
    }

    #[instrument(skip_all)]
    async fn update_user(
        &self,
        token: &str,
        _current: Option<&User>,
        updates: &UserUpdate,
    ) -> Result<User, BackendError> {
        let url = self.endpoint("userUpdate")?;
        let request = self.http_client.put(url).bearer_auth(token).json(updates);
        let response = self.send(request, "userUpdate").await?;
        let envelope: UserEnvelope = Self::read_json(response).await?;
        Ok(envelope.into_user())
    }
}

impl LocalCollectionBackend for BackendClient {
    #[instrument(skip_all)]
    async fn retrieve(&self, token: &str) -> Result<Vec<Favorite>, BackendError> {
        let url = self.endpoint("retrieve")?;
        let request = self.http_client.get(url).bearer_auth(token);
        let response = self.send(request, "retrieve").await?;
        let body: FavoritesResponse = Self::read_json(response).await?;
        Ok(body.favorites)
    }

    #[instrument(skip_all, fields(tmdb_id = tmdb_id, kind = %kind))]
    async fn add(&self, token: &str, tmdb_id: u64, kind: MediaKind) -> Result<(), BackendError> {
        let url = self.endpoint("add")?;
        let body = FavoriteRequest {
            tmdb_id: tmdb_id.to_string(),
            media_type: kind,
        };
        let request = self.http_client.post(url).bearer_auth(token).json(&body);
        self.send(request, "add").await?;
        Ok(())
    }

    #[instrument(skip_all, fields(tmdb_id = tmdb_id, kind = %kind))]
    async fn remove(
        &self,
        token: &str,
        tmdb_id: u64,
        kind: MediaKind,
    ) -> Result<(), BackendError> {
        let path = format!("delete/{tmdb_id}");
        let url = self.endpoint(&path)?;
        let body = FavoriteRequest {
            tmdb_id: tmdb_id.to_string(),
            media_type: kind,
        };
        let request = self.http_client.delete(url).bearer_auth(token).json(&body);
        self.send(request, &path).await?;
        Ok(())
    }
}
