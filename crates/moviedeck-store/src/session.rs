//! Session store: authentication state and its persistence.

use std::sync::Arc;

use moviedeck_api::backend::{LocalAuthBackend, Registration, User, UserId, UserUpdate};
use moviedeck_db::LocalKeyValueStore;
use tokio::sync::watch;
use tracing::instrument;

use crate::error::{StoreError, StoreResult};
use crate::loading::{HasLoading, InFlight, LoadingGuard};

/// Storage key of the bearer token.
pub const TOKEN_KEY: &str = "auth_token";

/// Storage key of the JSON-serialized user record.
pub const USER_KEY: &str = "user";

/// Observable session state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[allow(clippy::module_name_repetitions)]
pub struct SessionState {
    /// Signed-in user.
    pub user: Option<User>,
    /// Whether a session is active.
    pub is_authenticated: bool,
    /// Whether an operation is in flight.
    pub loading: bool,
}

impl SessionState {
    /// Identity of the signed-in user, if any.
    #[must_use]
    pub fn user_id(&self) -> Option<&UserId> {
        self.user.as_ref().map(|u| &u.id)
    }

    fn sign_in(&mut self, user: User) {
        self.user = Some(user);
        self.is_authenticated = true;
    }

    fn sign_out(&mut self) {
        self.user = None;
        self.is_authenticated = false;
    }
}

impl HasLoading for SessionState {
    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }
}

/// Owns the session record and token.
///
/// State changes are published on a `watch` channel; call [`Self::subscribe`]
/// to observe them. The auth backend is injected once, so mock and remote
/// sessions run through the same code paths.
#[allow(clippy::module_name_repetitions)]
pub struct SessionStore<S, B> {
    storage: Arc<S>,
    backend: B,
    state: watch::Sender<SessionState>,
    in_flight: InFlight,
}

impl<S, B> SessionStore<S, B>
where
    S: LocalKeyValueStore,
    B: LocalAuthBackend,
{
    /// Creates a logged-out store. Call [`Self::initialize`] to restore a
    /// persisted session.
    pub fn new(storage: Arc<S>, backend: B) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            storage,
            backend,
            state,
            in_flight: InFlight::default(),
        }
    }

    /// Receiver of state snapshots.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Current state snapshot.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Signed-in user.
    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    /// Whether a session is active.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated
    }

    /// Shared storage handle.
    #[must_use]
    pub const fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    /// Restores the persisted session.
    ///
    /// A missing, empty, `"undefined"`, `"null"` or unparsable user record,
    /// or a missing token, leaves the store logged out with both keys cleared.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Storage` if the key/value store fails.
    #[instrument(skip_all)]
    pub async fn initialize(&self) -> StoreResult<()> {
        let raw_user = self.read(USER_KEY).await?;
        let token = self.read(TOKEN_KEY).await?;

        match (parse_user(raw_user.as_deref()), token) {
            (Some(user), Some(_)) => {
                tracing::debug!(user_id = %user.id, "restored session");
                self.state.send_modify(|s| s.sign_in(user));
                Ok(())
            }
            (user, token) => {
                if raw_user.is_some() || token.is_some() {
                    tracing::warn!(
                        has_user = user.is_some(),
                        has_token = token.is_some(),
                        "discarding incomplete persisted session"
                    );
                }
                self.state.send_modify(SessionState::sign_out);
                self.clear_keys().await
            }
        }
    }

    /// Signs in and persists the session.
    ///
    /// # Errors
    ///
    /// - `RemoteRequestFailed` if the backend rejects the credentials.
    /// - `NetworkFault` if the backend cannot be reached.
    /// - `Storage` if persisting fails.
    #[instrument(skip_all)]
    pub async fn login(&self, email: &str, password: &str) -> StoreResult<User> {
        let _loading = LoadingGuard::raise(&self.state, &self.in_flight);

        let response = self
            .backend
            .login(email, password)
            .await
            .map_err(|err| StoreError::from_backend(err, "Login"))?;

        if let Some(token) = response.token.as_deref() {
            self.write(TOKEN_KEY, token).await?;
        } else {
            tracing::warn!("login response carried no token");
        }
        self.write_user(&response.user).await?;

        tracing::debug!(user_id = %response.user.id, "signed in");
        let user = response.user;
        self.state.send_modify(|s| s.sign_in(user.clone()));
        Ok(user)
    }

    /// Creates an account. Does not sign in.
    ///
    /// # Errors
    ///
    /// - `RemoteRequestFailed` (with [`StoreError::field_errors`]) if the
    ///   backend rejects the registration.
    /// - `NetworkFault` if the backend cannot be reached.
    #[instrument(skip_all)]
    pub async fn register(&self, registration: &Registration) -> StoreResult<()> {
        let _loading = LoadingGuard::raise(&self.state, &self.in_flight);

        self.backend
            .register(registration)
            .await
            .map_err(|err| StoreError::from_backend(err, "Registration"))?;

        tracing::debug!("account created");
        Ok(())
    }

    /// Ends the session.
    ///
    /// Local state is cleared first. The backend is then notified on a
    /// best-effort basis when a token existed; that failure is only logged.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Storage` if the persisted keys cannot be removed.
    /// The published state is logged out even then.
    #[instrument(skip_all)]
    pub async fn logout(&self) -> StoreResult<()> {
        let _loading = LoadingGuard::raise(&self.state, &self.in_flight);

        let token = self.read(TOKEN_KEY).await.unwrap_or_else(|err| {
            tracing::warn!(error = %err, "could not read token during logout");
            None
        });

        self.state.send_modify(SessionState::sign_out);
        let cleared = self.clear_keys().await;
        tracing::debug!("signed out");

        if let Some(token) = token
            && let Err(err) = self.backend.logout(&token).await
        {
            tracing::warn!(error = %err, "backend logout failed");
        }

        cleared
    }

    /// Updates the profile and persists the returned record.
    ///
    /// # Errors
    ///
    /// - `AuthenticationRequired` without a token (no request is made).
    /// - `RemoteRequestFailed` / `NetworkFault` from the backend.
    /// - `NoData` if there is no profile to update in mock mode.
    #[instrument(skip_all)]
    pub async fn update_user(&self, updates: &UserUpdate) -> StoreResult<User> {
        let token = self.require_token().await?;
        let _loading = LoadingGuard::raise(&self.state, &self.in_flight);

        let current = self.user();
        let user = self
            .backend
            .update_user(&token, current.as_ref(), updates)
            .await
            .map_err(|err| StoreError::from_backend(err, "Profile update"))?;

        self.write_user(&user).await?;
        tracing::debug!(user_id = %user.id, "profile updated");
        self.state.send_modify(|s| s.user = Some(user.clone()));
        Ok(user)
    }

    /// Reloads the profile from the backend.
    ///
    /// # Errors
    ///
    /// - `AuthenticationRequired` without a token.
    /// - `SessionExpired` on HTTP 401; the session is cleared. A storage
    ///   failure while clearing is logged, not returned.
    /// - `NoData` if there is no cached profile in mock mode.
    /// - other backend failures as-is, leaving the session untouched.
    #[instrument(skip_all)]
    pub async fn refresh_user(&self) -> StoreResult<User> {
        let token = self.require_token().await?;
        let _loading = LoadingGuard::raise(&self.state, &self.in_flight);

        let cached = self.user();
        let user = match self.backend.current_user(&token, cached.as_ref()).await {
            Ok(user) => user,
            Err(err) if err.is_unauthorized() => {
                tracing::warn!("token rejected, clearing session");
                self.state.send_modify(SessionState::sign_out);
                if let Err(err) = self.clear_keys().await {
                    tracing::warn!(error = %err, "could not clear expired session");
                }
                return Err(StoreError::SessionExpired);
            }
            Err(err) => return Err(StoreError::from_backend(err, "Refresh")),
        };

        self.write_user(&user).await?;
        tracing::debug!(user_id = %user.id, "profile refreshed");
        self.state.send_modify(|s| s.sign_in(user.clone()));
        Ok(user)
    }

    /// Persisted bearer token.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Storage` if the key/value store fails.
    pub async fn token(&self) -> StoreResult<Option<String>> {
        self.read(TOKEN_KEY).await
    }

    async fn require_token(&self) -> StoreResult<String> {
        self.token()
            .await?
            .filter(|t| !t.is_empty())
            .ok_or(StoreError::AuthenticationRequired)
    }

    async fn read(&self, key: &str) -> StoreResult<Option<String>> {
        self.storage
            .get(key)
            .await
            .map_err(|err| StoreError::storage(&err))
    }

    async fn write(&self, key: &str, value: &str) -> StoreResult<()> {
        self.storage
            .set(key, value)
            .await
            .map_err(|err| StoreError::storage(&err))
    }

    async fn write_user(&self, user: &User) -> StoreResult<()> {
        let json =
            serde_json::to_string(user).map_err(|err| StoreError::Storage(err.to_string()))?;
        self.write(USER_KEY, &json).await
    }

    async fn clear_keys(&self) -> StoreResult<()> {
        let token = self.storage.remove(TOKEN_KEY).await;
        let user = self.storage.remove(USER_KEY).await;
        token.and(user).map_err(|err| StoreError::storage(&err))
    }
}

fn parse_user(raw: Option<&str>) -> Option<User> {
    let raw = raw
        .map(str::trim)
        .filter(|r| !r.is_empty() && *r != "undefined" && *r != "null")?;
    serde_json::from_str(raw)
        .inspect_err(|err| tracing::debug!(error = %err, "stored user is not valid JSON"))
        .ok()
}
