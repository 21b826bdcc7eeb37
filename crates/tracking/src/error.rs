//! Error taxonomy for customer tracking.

use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced by the tracking components.
///
/// The ledger and projector never hand these to their callers from their
/// best-effort entry points; they log and degrade instead. The outcome
/// recorder surfaces them for the reservation-side mutation.
#[derive(Debug, Error)]
pub enum TrackingError {
    /// The store could not be reached or did not answer in time.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// A referenced reservation or customer does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Input that tracking cannot act on (e.g. no contact at all, or a status
    /// change that is not allowed through this path).
    #[error("validation failed: {0}")]
    Validation(String),

    /// The create/uniqueness race kept losing.
    #[error("customer creation still conflicting after {attempts} attempts")]
    RetriesExhausted {
        /// Number of create-or-update attempts made.
        attempts: u32,
    },

    /// Any other store failure.
    #[error("store error: {0}")]
    Store(StoreError),
}

impl TrackingError {
    /// Whether the caller may reasonably retry later.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::StoreUnavailable(_) | Self::RetriesExhausted { .. }
        )
    }
}

impl From<StoreError> for TrackingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => Self::StoreUnavailable(msg),
            StoreError::NotFound(what) => Self::NotFound(what),
            other => Self::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_are_classified() {
        assert!(matches!(
            TrackingError::from(StoreError::Unavailable("timeout".to_owned())),
            TrackingError::StoreUnavailable(_)
        ));
        assert!(matches!(
            TrackingError::from(StoreError::NotFound("reservation r1".to_owned())),
            TrackingError::NotFound(_)
        ));
        assert!(matches!(
            TrackingError::from(StoreError::CounterInvariant),
            TrackingError::Store(StoreError::CounterInvariant)
        ));
    }

    #[test]
    fn test_transient() {
        assert!(TrackingError::StoreUnavailable(String::new()).is_transient());
        assert!(TrackingError::RetriesExhausted { attempts: 3 }.is_transient());
        assert!(!TrackingError::NotFound(String::new()).is_transient());
    }
}
