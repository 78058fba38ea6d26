//! `TmdbClient` - TMDB API client implementation.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::Client;
use tokio::sync::Mutex;
use tracing::instrument;
use url::Url;

use super::api::{LocalTmdbApi, TimeWindow, TrendingMedia};
use super::endpoints::Endpoint;
use super::rate_limiter::TmdbRateLimiter;
use super::types::{
    TmdbErrorResponse, TmdbGenre, TmdbGenreList, TmdbMedia, TmdbMovieDetails, TmdbPage,
    TmdbTvDetails, TmdbVideoList,
};

/// Default base URL for TMDB API v3.
const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3/";

/// Default response language.
const DEFAULT_LANGUAGE: &str = "en-US";

/// Maximum number of retries for HTTP 429 responses.
const MAX_RETRIES: u32 = 3;

/// Backoff duration between retries.
const RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// How requests are authenticated.
#[derive(Debug, Clone)]
enum Credential {
    /// v4 read access token, sent as `Authorization: Bearer`.
    Bearer(String),
    /// v3 key, sent as the `api_key` query parameter.
    ApiKey(String),
}

/// TMDB API client.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct TmdbClient {
    /// HTTP client.
    http_client: Client,
    /// Base URL for API requests.
    base_url: Url,
    credential: Credential,
    language: String,
    /// Rate limiter.
    rate_limiter: Arc<Mutex<TmdbRateLimiter>>,
}

/// Builder for `TmdbClient`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct TmdbClientBuilder {
    base_url: Option<Url>,
    bearer_token: Option<String>,
    api_key: Option<String>,
    user_agent: Option<String>,
    language: Option<String>,
    min_interval: Option<Duration>,
}

impl TmdbClientBuilder {
    /// Creates a new builder.
    const fn new() -> Self {
        Self {
            base_url: None,
            bearer_token: None,
            api_key: None,
            user_agent: None,
            language: None,
            min_interval: None,
        }
    }

    /// Overrides the base URL (for wiremock in tests).
    #[must_use]
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Sets the bearer read access token. Takes precedence over the API key.
    #[must_use]
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into()).filter(|t: &String| !t.is_empty());
        self
    }

    /// Sets the v3 API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into()).filter(|k: &String| !k.is_empty());
        self
    }

    /// Sets the User-Agent (required).
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Sets the response language (default: `en-US`).
    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Sets the minimum request interval (default: 25ms).
    #[must_use]
    pub const fn min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = Some(interval);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// - neither `bearer_token` nor `api_key` is set.
    /// - `user_agent` is not set.
    /// - `reqwest::Client` build fails.
    pub fn build(self) -> Result<TmdbClient> {
        let credential = self
            .bearer_token
            .map(Credential::Bearer)
            .or_else(|| self.api_key.map(Credential::ApiKey))
            .context("bearer_token or api_key is required")?;
        let user_agent = self.user_agent.context("user_agent is required")?;

        let base_url = if let Some(url) = self.base_url {
            url
        } else {
            let result = Url::parse(DEFAULT_BASE_URL);
            result.context("invalid default base URL")?
        };

        let rate_limiter = self
            .min_interval
            .map_or_else(TmdbRateLimiter::default_interval, TmdbRateLimiter::new);

        let http_client = Client::builder()
            .user_agent(&user_agent)
            .gzip(true)
            .build()
            .context("failed to build HTTP client")?;

        Ok(TmdbClient {
            http_client,
            base_url,
            credential,
            language: self
                .language
                .unwrap_or_else(|| String::from(DEFAULT_LANGUAGE)),
            rate_limiter: Arc::new(Mutex::new(rate_limiter)),
        })
    }
}

impl TmdbClient {
    /// Creates a new builder.
    #[must_use]
    pub const fn builder() -> TmdbClientBuilder {
        TmdbClientBuilder::new()
    }

    /// Sends a GET request with auth, language, query params, and rate limiting.
    /// Retries up to `MAX_RETRIES` times on HTTP 429.
    #[instrument(skip_all, fields(path = path))]
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        self.rate_limiter.lock().await.wait().await;

        let url = self
            .base_url
            .join(path)
            .with_context(|| format!("failed to join URL path: {path}"))?;

        let mut retries = 0u32;
        loop {
            let mut builder = self
                .http_client
                .get(url.clone())
                .query(&[("language", self.language.as_str())])
                .query(query);
            builder = match &self.credential {
                Credential::Bearer(token) => builder.bearer_auth(token),
                Credential::ApiKey(key) => builder.query(&[("api_key", key.as_str())]),
            };
            let request = builder
                .build()
                .with_context(|| format!("failed to build request: {path}"))?;

            tracing::debug!(path, "TMDB API request");

            let result = self.http_client.execute(request).await;
            let response = result.with_context(|| format!("request failed: {path}"))?;

            let status = response.status();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                retries = retries.saturating_add(1);
                if retries > MAX_RETRIES {
                    bail!("TMDB API rate limit exceeded after {MAX_RETRIES} retries: {path}");
                }
                tracing::warn!(
                    retry = retries,
                    max_retries = MAX_RETRIES,
                    "TMDB API rate limited (429). Retrying..."
                );
                tokio::time::sleep(RETRY_BACKOFF.saturating_mul(retries)).await;
                self.rate_limiter.lock().await.wait().await;
                continue;
            }

            let body = response
                .text()
                .await
                .with_context(|| format!("failed to read response body: {path}"))?;

            if !status.is_success() {
                if let Ok(error_response) = serde_json::from_str::<TmdbErrorResponse>(&body) {
                    bail!(
                        "TMDB API error (HTTP {}): code={}, message={}",
                        status,
                        error_response.status_code,
                        error_response.status_message,
                    );
                }
                bail!("TMDB API error (HTTP {status}): {body}");
            }

            let raw_result: std::result::Result<T, _> = serde_json::from_str(&body);
            let parsed =
                raw_result.with_context(|| format!("failed to decode JSON response: {path}"))?;
            return Ok(parsed);
        }
    }
}

impl LocalTmdbApi for TmdbClient {
    #[instrument(skip_all)]
    async fn trending(
        &self,
        media: TrendingMedia,
        window: TimeWindow,
    ) -> Result<TmdbPage<TmdbMedia>> {
        let path = format!("trending/{}/{}", media.as_str(), window.as_str());
        self.get_json(&path, &[]).await
    }

    #[instrument(skip_all, fields(endpoint = %endpoint))]
    async fn fetch_row(&self, endpoint: Endpoint) -> Result<TmdbPage<TmdbMedia>> {
        self.get_json(endpoint.path(), &endpoint.query()).await
    }

    #[instrument(skip_all)]
    async fn movie_details(&self, movie_id: u64) -> Result<TmdbMovieDetails> {
        self.get_json(&format!("movie/{movie_id}"), &[]).await
    }

    #[instrument(skip_all)]
    async fn tv_details(&self, series_id: u64) -> Result<TmdbTvDetails> {
        self.get_json(&format!("tv/{series_id}"), &[]).await
    }

    #[instrument(skip_all)]
    async fn movie_videos(&self, movie_id: u64) -> Result<TmdbVideoList> {
        self.get_json(&format!("movie/{movie_id}/videos"), &[])
            .await
    }

    #[instrument(skip_all)]
    async fn similar_movies(&self, movie_id: u64, page: u32) -> Result<TmdbPage<TmdbMedia>> {
        let query = [("page", page.to_string())];
        self.get_json(&format!("movie/{movie_id}/similar"), &query)
            .await
    }

    #[instrument(skip_all)]
    async fn search_multi(&self, query: &str, page: u32) -> Result<TmdbPage<TmdbMedia>> {
        let query = [
            ("query", String::from(query)),
            ("page", page.to_string()),
            ("include_adult", String::from("false")),
        ];
        self.get_json("search/multi", &query).await
    }

    #[instrument(skip_all)]
    async fn discover_movies(&self, genre_id: u32, page: u32) -> Result<TmdbPage<TmdbMedia>> {
        let query = [
            ("with_genres", genre_id.to_string()),
            ("page", page.to_string()),
        ];
        self.get_json("discover/movie", &query).await
    }

    #[instrument(skip_all)]
    async fn discover_tv_by_network(
        &self,
        network_id: u32,
        page: u32,
    ) -> Result<TmdbPage<TmdbMedia>> {
        let query = [
            ("with_networks", network_id.to_string()),
            ("page", page.to_string()),
        ];
        self.get_json("discover/tv", &query).await
    }

    #[instrument(skip_all)]
    async fn movie_genres(&self) -> Result<Vec<TmdbGenre>> {
        let list: TmdbGenreList = self.get_json("genre/movie/list", &[]).await?;
        Ok(list.genres)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const TRENDING: &str = include_str!("../../../../fixtures/tmdb/trending_all_week.json");
    const EMPTY_PAGE: &str = include_str!("../../../../fixtures/tmdb/search_multi_empty.json");

    fn client_for(server: &MockServer) -> TmdbClient {
        TmdbClient::builder()
            .base_url(format!("{}/3/", server.uri()).parse().unwrap())
            .bearer_token("test-token")
            .user_agent("test/0.0.0")
            .min_interval(Duration::ZERO)
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_requires_credential() {
        // Arrange & Act
        let result = TmdbClient::builder().user_agent("test/0.0.0").build();

        // Assert
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("bearer_token or api_key is required")
        );
    }

    #[test]
    fn test_builder_ignores_empty_credentials() {
        // Arrange & Act
        let result = TmdbClient::builder()
            .bearer_token("")
            .api_key("")
            .user_agent("test/0.0.0")
            .build();

        // Assert
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_requires_user_agent() {
        // Arrange & Act
        let result = TmdbClient::builder().api_key("key").build();

        // Assert
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("user_agent is required")
        );
    }

    #[test]
    fn test_builder_defaults() {
        // Arrange & Act
        let client = TmdbClient::builder()
            .api_key("key")
            .user_agent("test/0.0.0")
            .build()
            .unwrap();

        // Assert
        assert_eq!(client.base_url.as_str(), DEFAULT_BASE_URL);
        assert_eq!(client.language, DEFAULT_LANGUAGE);
        assert!(matches!(client.credential, Credential::ApiKey(_)));
    }

    #[tokio::test]
    async fn test_trending_sends_bearer_and_language() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/3/trending/all/week"))
            .and(header("Authorization", "Bearer test-token"))
            .and(query_param("language", "en-US"))
            .respond_with(ResponseTemplate::new(200).set_body_string(TRENDING))
            .expect(1)
            .mount(&server)
            .await;
        let client = client_for(&server);

        // Act
        let page = client
            .trending(TrendingMedia::All, TimeWindow::Week)
            .await
            .unwrap();

        // Assert
        assert_eq!(page.results.len(), 2);
        assert_eq!(page.results[0].id, 550);
    }

    #[tokio::test]
    async fn test_api_key_sent_as_query_param() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/3/movie/550"))
            .and(query_param("api_key", "v3-key"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(include_str!("../../../../fixtures/tmdb/movie_550.json")),
            )
            .expect(1)
            .mount(&server)
            .await;
        let client = TmdbClient::builder()
            .base_url(format!("{}/3/", server.uri()).parse().unwrap())
            .api_key("v3-key")
            .user_agent("test/0.0.0")
            .min_interval(Duration::ZERO)
            .build()
            .unwrap();

        // Act
        let details = client.movie_details(550).await.unwrap();

        // Assert
        assert_eq!(details.title, "Fight Club");
    }

    #[tokio::test]
    async fn test_fetch_row_netflix_originals() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/3/discover/tv"))
            .and(query_param("with_networks", "213"))
            .respond_with(ResponseTemplate::new(200).set_body_string(EMPTY_PAGE))
            .expect(1)
            .mount(&server)
            .await;
        let client = client_for(&server);

        // Act
        let page = client.fetch_row(Endpoint::NetflixOriginals).await.unwrap();

        // Assert
        assert!(page.results.is_empty());
    }

    #[tokio::test]
    async fn test_search_multi_query() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/3/search/multi"))
            .and(query_param("query", "fight club"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_string(EMPTY_PAGE))
            .expect(1)
            .mount(&server)
            .await;
        let client = client_for(&server);

        // Act
        let page = client.search_multi("fight club", 2).await.unwrap();

        // Assert
        assert_eq!(page.total_results, 0);
    }

    #[tokio::test]
    async fn test_movie_genres_unwraps_list() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/3/genre/movie/list"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(include_str!("../../../../fixtures/tmdb/movie_genres.json")),
            )
            .mount(&server)
            .await;
        let client = client_for(&server);

        // Act
        let genres = client.movie_genres().await.unwrap();

        // Assert
        assert_eq!(genres.len(), 5);
        assert_eq!(genres[0].name, "Action");
    }

    #[tokio::test]
    async fn test_http_error_returns_tmdb_error() {
        // Arrange
        let server = MockServer::start().await;
        let error_body = r#"{"status_code":7,"status_message":"Invalid API key: You must be granted a valid key.","success":false}"#;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string(error_body))
            .mount(&server)
            .await;
        let client = client_for(&server);

        // Act
        let err = client.movie_videos(550).await.unwrap_err().to_string();

        // Assert
        assert!(err.contains("TMDB API error"));
        assert!(err.contains("Invalid API key"));
    }

    #[tokio::test]
    async fn test_http_error_with_plain_body() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;
        let client = client_for(&server);

        // Act
        let err = client.tv_details(1399).await.unwrap_err().to_string();

        // Assert
        assert!(err.contains("502"));
        assert!(err.contains("bad gateway"));
    }

    #[tokio::test]
    async fn test_http_429_retries() {
        // Arrange
        let server = MockServer::start().await;
        let error_body = r#"{"status_code":25,"status_message":"Your request count is over the allowed limit.","success":false}"#;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).set_body_string(error_body))
            .expect(u64::from(MAX_RETRIES) + 1)
            .mount(&server)
            .await;
        let client = client_for(&server);

        // Act
        let result = client.discover_movies(28, 1).await;

        // Assert
        assert!(result.unwrap_err().to_string().contains("rate limit"));
    }
}
