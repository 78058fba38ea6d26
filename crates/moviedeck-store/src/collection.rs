//! "My list" store: a client-side mirror of the saved-items collection.
//!
//! Mutations are applied optimistically and rolled back when the backend
//! rejects them. Operations on the same item are serialized; different
//! items proceed independently.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError};

use chrono::{SecondsFormat, Utc};
use indexmap::IndexMap;
use moviedeck_api::backend::{Favorite, LocalCollectionBackend, MediaKind, UserId};
use moviedeck_db::LocalKeyValueStore;
use tokio::sync::{Mutex, OwnedMutexGuard, watch};
use tracing::instrument;

use crate::error::{StoreError, StoreResult};
use crate::loading::{HasLoading, InFlight, LoadingGuard};
use crate::session::{SessionState, TOKEN_KEY};

/// Identity of a collection entry. Movies and series share one id space,
/// so the kind is part of the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemKey {
    /// TMDB id.
    pub tmdb_id: u64,
    /// Item kind.
    pub kind: MediaKind,
}

impl ItemKey {
    /// Builds a key.
    #[must_use]
    pub const fn new(tmdb_id: u64, kind: MediaKind) -> Self {
        Self { tmdb_id, kind }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind, self.tmdb_id)
    }
}

/// A saved item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    /// TMDB id.
    pub tmdb_id: u64,
    /// Item kind.
    pub media_type: MediaKind,
    /// When the item was saved, if known.
    pub added_at: Option<String>,
}

impl ListItem {
    /// Key of this item.
    #[must_use]
    pub const fn key(&self) -> ItemKey {
        ItemKey::new(self.tmdb_id, self.media_type)
    }
}

impl From<Favorite> for ListItem {
    fn from(favorite: Favorite) -> Self {
        Self {
            tmdb_id: favorite.tmdb_id,
            media_type: favorite.media_type,
            added_at: favorite.created_at,
        }
    }
}

/// Observable collection state. Membership is key presence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[allow(clippy::module_name_repetitions)]
pub struct CollectionState {
    /// Saved items in insertion order.
    pub items: IndexMap<ItemKey, ListItem>,
    /// Whether an operation is in flight.
    pub loading: bool,
}

impl CollectionState {
    /// Whether the key is saved.
    #[must_use]
    pub fn contains(&self, key: &ItemKey) -> bool {
        self.items.contains_key(key)
    }
}

impl HasLoading for CollectionState {
    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }
}

/// Outcome of a successful mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipChange {
    /// The item was saved.
    Added,
    /// The item was already saved; nothing was sent.
    AlreadyPresent,
    /// The item was removed.
    Removed,
    /// The item was not saved; nothing was sent.
    NotPresent,
}

impl MembershipChange {
    /// User-facing message.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Added => "Added to My List",
            Self::AlreadyPresent => "Already in My List",
            Self::Removed => "Removed from My List",
            Self::NotPresent => "Not in My List",
        }
    }
}

impl fmt::Display for MembershipChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Owns the "my list" mirror.
#[allow(clippy::module_name_repetitions)]
pub struct CollectionStore<S, C> {
    storage: Arc<S>,
    backend: C,
    session: watch::Receiver<SessionState>,
    state: watch::Sender<CollectionState>,
    key_locks: KeyLocks,
    in_flight: InFlight,
}

impl<S, C> CollectionStore<S, C>
where
    S: LocalKeyValueStore,
    C: LocalCollectionBackend,
{
    /// Creates an empty store following the given session.
    pub fn new(storage: Arc<S>, backend: C, session: watch::Receiver<SessionState>) -> Self {
        let (state, _) = watch::channel(CollectionState::default());
        Self {
            storage,
            backend,
            session,
            state,
            key_locks: KeyLocks::default(),
            in_flight: InFlight::default(),
        }
    }

    /// Receiver of state snapshots.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CollectionState> {
        self.state.subscribe()
    }

    /// Current state snapshot.
    #[must_use]
    pub fn state(&self) -> CollectionState {
        self.state.borrow().clone()
    }

    /// Saved items in insertion order.
    #[must_use]
    pub fn items(&self) -> Vec<ListItem> {
        self.state.borrow().items.values().cloned().collect()
    }

    /// Whether the item is saved. Never touches the network.
    #[must_use]
    pub fn is_in_my_list(&self, tmdb_id: u64, kind: MediaKind) -> bool {
        self.state.borrow().contains(&ItemKey::new(tmdb_id, kind))
    }

    /// Drops every item.
    pub fn reset(&self) {
        self.state.send_if_modified(|s| {
            let changed = !s.items.is_empty();
            s.items.clear();
            changed
        });
    }

    /// Replaces the mirror with the server's list.
    ///
    /// Without a session the list is reset. Any failure also resets it, so
    /// the mirror is never partially applied.
    ///
    /// # Errors
    ///
    /// Returns the failure that caused the reset (`RemoteRequestFailed`,
    /// `NetworkFault` or `Storage`). A missing session is not an error.
    #[instrument(skip_all)]
    pub async fn fetch_my_list(&self) -> StoreResult<()> {
        let token = match self.session_token().await {
            Ok(Some(token)) => token,
            Ok(None) => {
                self.reset();
                return Ok(());
            }
            Err(err) => {
                self.reset();
                return Err(err);
            }
        };

        let _loading = LoadingGuard::raise(&self.state, &self.in_flight);
        match self.backend.retrieve(&token).await {
            Ok(favorites) => {
                let items: IndexMap<ItemKey, ListItem> = favorites
                    .into_iter()
                    .map(ListItem::from)
                    .map(|item| (item.key(), item))
                    .collect();
                tracing::debug!(count = items.len(), "my list loaded");
                self.state.send_modify(|s| s.items = items);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "my list fetch failed, resetting");
                self.reset();
                Err(StoreError::from_backend(err, "Fetch"))
            }
        }
    }

    /// Saves an item.
    ///
    /// # Errors
    ///
    /// - `AuthenticationRequired` without a session.
    /// - `RemoteRequestFailed` (`Add failed: <status> <body>`) or
    ///   `NetworkFault`; the optimistic entry is rolled back.
    #[instrument(skip_all, fields(key = %ItemKey::new(tmdb_id, kind)))]
    pub async fn add_to_my_list(
        &self,
        tmdb_id: u64,
        kind: MediaKind,
    ) -> StoreResult<MembershipChange> {
        let token = self.require_token().await?;
        let key = ItemKey::new(tmdb_id, kind);
        let _serial = self.lock_key(key).await;

        if self.state.borrow().contains(&key) {
            return Ok(MembershipChange::AlreadyPresent);
        }

        let _loading = LoadingGuard::raise(&self.state, &self.in_flight);
        let item = ListItem {
            tmdb_id,
            media_type: kind,
            added_at: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        };
        self.state.send_modify(|s| {
            s.items.insert(key, item.clone());
        });

        if let Err(err) = self.backend.add(&token, tmdb_id, kind).await {
            self.state.send_modify(|s| {
                s.items.shift_remove(&key);
            });
            tracing::warn!(error = %err, "add rejected, rolled back");
            return Err(StoreError::rejected_mutation(err, "Add failed"));
        }

        self.state.send_modify(|s| {
            if let Some(entry) = s.items.get_mut(&key) {
                *entry = item;
            }
        });
        tracing::debug!("added to my list");
        Ok(MembershipChange::Added)
    }

    /// Removes an item.
    ///
    /// # Errors
    ///
    /// - `AuthenticationRequired` without a session.
    /// - `RemoteRequestFailed` (`Delete failed: <status> <body>`) or
    ///   `NetworkFault`; the removed entry is restored unchanged.
    #[instrument(skip_all, fields(key = %ItemKey::new(tmdb_id, kind)))]
    pub async fn remove_from_my_list(
        &self,
        tmdb_id: u64,
        kind: MediaKind,
    ) -> StoreResult<MembershipChange> {
        let token = self.require_token().await?;
        let key = ItemKey::new(tmdb_id, kind);
        let _serial = self.lock_key(key).await;

        if !self.state.borrow().contains(&key) {
            return Ok(MembershipChange::NotPresent);
        }

        let _loading = LoadingGuard::raise(&self.state, &self.in_flight);
        let mut previous = None;
        self.state.send_if_modified(|s| {
            previous = s.items.shift_remove_full(&key);
            previous.is_some()
        });
        let Some((index, _, previous)) = previous else {
            return Ok(MembershipChange::NotPresent);
        };

        if let Err(err) = self.backend.remove(&token, tmdb_id, kind).await {
            self.state.send_modify(|s| {
                let at = index.min(s.items.len());
                s.items.shift_insert(at, key, previous);
            });
            tracing::warn!(error = %err, "remove rejected, rolled back");
            return Err(StoreError::rejected_mutation(err, "Delete failed"));
        }

        tracing::debug!("removed from my list");
        Ok(MembershipChange::Removed)
    }

    /// Fetches when signed in, resets otherwise.
    ///
    /// # Errors
    ///
    /// Returns the fetch failure; the list has been reset by then.
    pub async fn sync_with_session(&self) -> StoreResult<()> {
        let authenticated = self.session.borrow().is_authenticated;
        if authenticated {
            self.fetch_my_list().await
        } else {
            self.reset();
            Ok(())
        }
    }

    /// Syncs now and again whenever the signed-in identity changes.
    ///
    /// Returns once the session store is dropped. Changes that keep both
    /// `is_authenticated` and the user id (profile edits, `loading` flips)
    /// do not trigger a refetch.
    pub async fn follow_session(&self) {
        let mut session = self.session.clone();
        let mut last = identity(&session.borrow_and_update());
        if let Err(err) = self.sync_with_session().await {
            tracing::debug!(error = %err, "initial my list sync failed");
        }

        while session.changed().await.is_ok() {
            let current = identity(&session.borrow_and_update());
            if current != last {
                tracing::debug!(authenticated = current.0, "session identity changed");
                last = current;
                if let Err(err) = self.sync_with_session().await {
                    tracing::debug!(error = %err, "my list sync failed");
                }
            }
        }
    }

    async fn session_token(&self) -> StoreResult<Option<String>> {
        let authenticated = {
            let session = self.session.borrow();
            session.is_authenticated && session.user.is_some()
        };
        if !authenticated {
            return Ok(None);
        }
        let token = self
            .storage
            .get(TOKEN_KEY)
            .await
            .map_err(|err| StoreError::storage(&err))?;
        Ok(token.filter(|t| !t.is_empty()))
    }

    async fn require_token(&self) -> StoreResult<String> {
        self.session_token()
            .await?
            .ok_or(StoreError::AuthenticationRequired)
    }

    async fn lock_key(&self, key: ItemKey) -> KeySerial<'_> {
        let lock = {
            let mut locks = self.key_locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(key).or_default())
        };
        KeySerial {
            key,
            locks: &self.key_locks,
            guard: Some(lock.lock_owned().await),
        }
    }
}

/// Per-item async locks. Only held entries stay in the map.
type KeyLocks = std::sync::Mutex<HashMap<ItemKey, Arc<Mutex<()>>>>;

/// Exclusive turn on one item; prunes the map entry when no other caller
/// holds or waits on it.
struct KeySerial<'a> {
    key: ItemKey,
    locks: &'a KeyLocks,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeySerial<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks
            .get(&self.key)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.key);
        }
    }
}

fn identity(state: &SessionState) -> (bool, Option<UserId>) {
    (state.is_authenticated, state.user_id().cloned())
}
