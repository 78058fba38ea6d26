//! Auth and my-list backend client module.
//!
//! Handles the REST calls for sign-in, registration, profile updates and
//! the remote "my list" collection, plus an offline mock of the auth side.

mod api;
mod client;
mod error;
mod mock;
mod strategy;
mod types;

#[allow(clippy::module_name_repetitions)]
pub use api::{AuthBackend, CollectionBackend, LocalAuthBackend, LocalCollectionBackend};
#[allow(clippy::module_name_repetitions)]
pub use client::{BackendClient, BackendClientBuilder};
#[allow(clippy::module_name_repetitions)]
pub use error::{BackendError, FieldErrors};
#[allow(clippy::module_name_repetitions)]
pub use mock::{MOCK_TOKEN_PREFIX, MOCK_USER_NAME, MockAuthBackend};
pub use strategy::AuthStrategy;
pub use types::{
    Favorite, LoginResponse, MIN_PASSWORD_LEN, MediaKind, ParseMediaKindError, Registration,
    User, UserId, UserUpdate, ValidationError,
};
