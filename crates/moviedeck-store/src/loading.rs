//! In-flight flag handling.

use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::watch;

/// State that carries an in-flight flag.
pub trait HasLoading {
    /// Sets the flag.
    fn set_loading(&mut self, loading: bool);
}

/// Number of operations currently in flight on one store.
#[derive(Debug, Default)]
pub(crate) struct InFlight(AtomicUsize);

/// Holds one slot of an [`InFlight`] count. The first guard raises
/// `loading`; the flag is cleared only when the last guard drops, on every
/// exit path (including `?` and cancellation).
#[must_use = "the slot is released as soon as the guard is dropped"]
pub(crate) struct LoadingGuard<'a, T: HasLoading> {
    state: &'a watch::Sender<T>,
    in_flight: &'a InFlight,
}

impl<'a, T: HasLoading> LoadingGuard<'a, T> {
    pub(crate) fn raise(state: &'a watch::Sender<T>, in_flight: &'a InFlight) -> Self {
        if in_flight.0.fetch_add(1, Ordering::AcqRel) == 0 {
            state.send_modify(|s| s.set_loading(true));
        }
        Self { state, in_flight }
    }
}

impl<T: HasLoading> Drop for LoadingGuard<'_, T> {
    fn drop(&mut self) {
        if self.in_flight.0.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.state.send_modify(|s| s.set_loading(false));
        }
    }
}
