//! Application state shared across handlers.

use std::sync::Arc;

use casanova_tracking::{CustomerStore, CustomerTracking, ReservationStore};

/// Everything a handler needs from storage.
pub trait Store: CustomerStore + ReservationStore + 'static {}

impl<T: CustomerStore + ReservationStore + 'static> Store for T {}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Generic over the store so routes can be
/// exercised against the in-memory store.
pub struct AppState<S> {
    inner: Arc<AppStateInner<S>>,
}

struct AppStateInner<S> {
    tracking: CustomerTracking<S>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Store> AppState<S> {
    #[must_use]
    pub fn new(tracking: CustomerTracking<S>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { tracking }),
        }
    }

    /// Get a reference to the tracking facade.
    #[must_use]
    pub fn tracking(&self) -> &CustomerTracking<S> {
        &self.inner.tracking
    }
}
