//! Offline auth backend that synthesizes responses locally.

use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use tracing::instrument;

use super::api::LocalAuthBackend;
use super::error::BackendError;
use super::types::{LoginResponse, Registration, User, UserId, UserUpdate};

/// Simulated latency of login and registration.
const DEFAULT_LOGIN_DELAY: Duration = Duration::from_millis(500);

/// Simulated latency of profile updates.
const DEFAULT_UPDATE_DELAY: Duration = Duration::from_millis(300);

/// Display name given to every mock session.
pub const MOCK_USER_NAME: &str = "Mock User";

/// Prefix of synthesized tokens.
pub const MOCK_TOKEN_PREFIX: &str = "mock-jwt-token-";

/// Deterministic auth backend for offline development.
///
/// Login accepts any password, logout and registration always succeed,
/// and profile reads and writes operate on the locally cached record.
#[derive(Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct MockAuthBackend {
    login_delay: Duration,
    update_delay: Duration,
}

impl Default for MockAuthBackend {
    fn default() -> Self {
        Self::with_delays(DEFAULT_LOGIN_DELAY, DEFAULT_UPDATE_DELAY)
    }
}

impl MockAuthBackend {
    /// Creates a mock with the default simulated latency.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock with custom latency (zero in tests).
    #[must_use]
    pub const fn with_delays(login_delay: Duration, update_delay: Duration) -> Self {
        Self {
            login_delay,
            update_delay,
        }
    }

    async fn simulate(delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

impl LocalAuthBackend for MockAuthBackend {
    #[instrument(skip_all)]
    async fn login(&self, email: &str, _password: &str) -> Result<LoginResponse, BackendError> {
        Self::simulate(self.login_delay).await;

        let now = Utc::now();
        let user = User {
            id: UserId::Numeric(1),
            name: String::from(MOCK_USER_NAME),
            email: String::from(email),
            created_at: Some(now.to_rfc3339_opts(SecondsFormat::Millis, true)),
        };
        let token = format!("{MOCK_TOKEN_PREFIX}{}", now.timestamp_millis());
        tracing::debug!(email, "mock login bypassing backend");

        Ok(LoginResponse {
            token: Some(token),
            user,
        })
    }

    #[instrument(skip_all)]
    async fn register(&self, _registration: &Registration) -> Result<(), BackendError> {
        Self::simulate(self.login_delay).await;
        tracing::debug!("mock registration bypassing backend");
        Ok(())
    }

    async fn logout(&self, _token: &str) -> Result<(), BackendError> {
        tracing::debug!("mock logout, no backend call");
        Ok(())
    }

    async fn current_user(&self, _token: &str, cached: Option<&User>) -> Result<User, BackendError> {
        cached.cloned().ok_or(BackendError::MissingUser)
    }

    #[instrument(skip_all)]
    async fn update_user(
        &self,
        _token: &str,
        current: Option<&User>,
        updates: &UserUpdate,
    ) -> Result<User, BackendError> {
        Self::simulate(self.update_delay).await;
        current
            .map(|user| user.merged(updates))
            .ok_or(BackendError::MissingUser)
    }
}
