//! State stores for moviedeck.
//!
//! [`SessionStore`] owns authentication state and its persistence;
//! [`CollectionStore`] mirrors the signed-in user's "my list". Both publish
//! state snapshots on `tokio::sync::watch` channels.

/// "My list" store.
pub mod collection;
mod error;
mod loading;
/// Session store.
pub mod session;

pub use collection::{CollectionState, CollectionStore, ItemKey, ListItem, MembershipChange};
pub use error::{StoreError, StoreResult};
pub use loading::HasLoading;
pub use session::{SessionState, SessionStore, TOKEN_KEY, USER_KEY};
