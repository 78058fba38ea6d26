//! Auth backend selected once at startup.

use super::api::LocalAuthBackend;
use super::client::BackendClient;
use super::error::BackendError;
use super::mock::MockAuthBackend;
use super::types::{LoginResponse, Registration, User, UserUpdate};

/// Mock or real auth backend.
#[derive(Debug, Clone)]
pub enum AuthStrategy {
    /// Locally synthesized responses.
    Mock(MockAuthBackend),
    /// REST backend.
    Remote(BackendClient),
}

impl AuthStrategy {
    /// Whether responses are synthesized locally.
    #[must_use]
    pub const fn is_mock(&self) -> bool {
        matches!(self, Self::Mock(_))
    }
}

impl LocalAuthBackend for AuthStrategy {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, BackendError> {
        match self {
            Self::Mock(backend) => backend.login(email, password).await,
            Self::Remote(backend) => backend.login(email, password).await,
        }
    }

    async fn register(&self, registration: &Registration) -> Result<(), BackendError> {
        match self {
            Self::Mock(backend) => backend.register(registration).await,
            Self::Remote(backend) => backend.register(registration).await,
        }
    }

    async fn logout(&self, token: &str) -> Result<(), BackendError> {
        match self {
            Self::Mock(backend) => backend.logout(token).await,
            Self::Remote(backend) => backend.logout(token).await,
        }
    }

    async fn current_user(&self, token: &str, cached: Option<&User>) -> Result<User, BackendError> {
        match self {
            Self::Mock(backend) => backend.current_user(token, cached).await,
            Self::Remote(backend) => backend.current_user(token, cached).await,
        }
    }

    async fn update_user(
        &self,
        token: &str,
        current: Option<&User>,
        updates: &UserUpdate,
    ) -> Result<User, BackendError> {
        match self {
            Self::Mock(backend) => backend.update_user(token, current, updates).await,
            Self::Remote(backend) => backend.update_user(token, current, updates).await,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::time::Duration;

    use super::*;

    #[test]
    fn test_is_mock() {
        // Arrange
        let mock = AuthStrategy::Mock(MockAuthBackend::new());
        let remote = AuthStrategy::Remote(
            BackendClient::builder()
                .base_url("http://localhost:8000/api".parse().unwrap())
                .user_agent("test/0.0.0")
                .build()
                .unwrap(),
        );

        // Act & Assert
        assert!(mock.is_mock());
        assert!(!remote.is_mock());
    }

    #[tokio::test]
    async fn test_mock_strategy_delegates() {
        // Arrange
        let strategy = AuthStrategy::Mock(MockAuthBackend::with_delays(
            Duration::ZERO,
            Duration::ZERO,
        ));

        // Act
        let response = strategy.login("a@b.com", "x").await.unwrap();

        // Assert
        assert_eq!(response.user.email, "a@b.com");
    }
}
