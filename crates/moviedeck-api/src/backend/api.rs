//! `AuthBackend` and `CollectionBackend` trait definitions.
#![allow(clippy::future_not_send)]

use super::error::BackendError;
use super::types::{Favorite, LoginResponse, MediaKind, Registration, User, UserUpdate};

/// Authentication backend.
///
/// Implemented by the real HTTP client and by the offline mock, so the
/// session store can be handed either one at startup.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(AuthBackend: Send)]
pub trait LocalAuthBackend {
    /// Exchanges credentials for a token and user record.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the request fails.
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, BackendError>;

    /// Creates an account. Does not sign in.
    ///
    /// # Errors
    ///
    /// Returns an error if the registration is rejected or the request fails.
    async fn register(&self, registration: &Registration) -> Result<(), BackendError>;

    /// Invalidates `token` on the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    async fn logout(&self, token: &str) -> Result<(), BackendError>;

    /// Fetches the user owning `token`. `cached` is the locally known record.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is rejected or the request fails.
    async fn current_user(&self, token: &str, cached: Option<&User>) -> Result<User, BackendError>;

    /// Applies `updates` to the user owning `token`. `current` is the locally known record.
    ///
    /// # Errors
    ///
    /// Returns an error if the update is rejected or the request fails.
    async fn update_user(
        &self,
        token: &str,
        current: Option<&User>,
        updates: &UserUpdate,
    ) -> Result<User, BackendError>;
}

/// Remote "my list" collection.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(CollectionBackend: Send)]
pub trait LocalCollectionBackend {
    /// Lists every favorite of the user owning `token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body cannot be decoded.
    async fn retrieve(&self, token: &str) -> Result<Vec<Favorite>, BackendError>;

    /// Adds an item to the collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the item or the request fails.
    async fn add(&self, token: &str, tmdb_id: u64, kind: MediaKind) -> Result<(), BackendError>;

    /// Removes an item from the collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the removal or the request fails.
    async fn remove(&self, token: &str, tmdb_id: u64, kind: MediaKind)
    -> Result<(), BackendError>;
}
