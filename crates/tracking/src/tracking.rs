//! Facade bundling a store with the tracking components.

use std::sync::Arc;

use casanova_core::RestaurantCode;

use crate::config::TrackingConfig;
use crate::contact::Contact;
use crate::error::TrackingError;
use crate::ledger::CustomerLedger;
use crate::matcher::IdentityMatcher;
use crate::models::Customer;
use crate::projector::HistoryProjector;
use crate::recorder::OutcomeRecorder;
use crate::store::{CustomerStore, ReservationStore};

/// Shared entry point for the server and CLI.
///
/// Cheap to clone; components are borrowed views created per call.
pub struct CustomerTracking<S> {
    store: Arc<S>,
    config: TrackingConfig,
}

impl<S> Clone for CustomerTracking<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}

impl<S: CustomerStore + ReservationStore> CustomerTracking<S> {
    #[must_use]
    pub fn new(store: S, config: TrackingConfig) -> Self {
        Self::from_shared(Arc::new(store), config)
    }

    #[must_use]
    pub const fn from_shared(store: Arc<S>, config: TrackingConfig) -> Self {
        Self { store, config }
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub const fn config(&self) -> &TrackingConfig {
        &self.config
    }

    /// Resolve a caller-supplied restaurant code against the configured default.
    #[must_use]
    pub fn restaurant(&self, code: Option<&str>) -> RestaurantCode {
        RestaurantCode::resolve_first(code, &self.config.default_restaurant)
    }

    /// Normalize raw contact fields with the configured default country.
    #[must_use]
    pub fn contact(&self, email: &str, phone: &str) -> Contact {
        Contact::from_raw(email, phone, self.config.default_country)
    }

    #[must_use]
    pub fn matcher(&self) -> IdentityMatcher<'_, S> {
        IdentityMatcher::new(&self.store, self.config.store_timeout)
    }

    #[must_use]
    pub fn ledger(&self) -> CustomerLedger<'_, S> {
        CustomerLedger::new(&self.store, &self.config)
    }

    #[must_use]
    pub fn recorder(&self) -> OutcomeRecorder<'_, S> {
        OutcomeRecorder::new(&self.store, &self.config)
    }

    #[must_use]
    pub fn projector(&self) -> HistoryProjector<'_, S> {
        HistoryProjector::new(&self.store, &self.config)
    }

    /// Read-only customer lookup for operators.
    ///
    /// # Errors
    ///
    /// Returns `TrackingError::Validation` if the contact is empty and
    /// `TrackingError::StoreUnavailable` if the store cannot be reached.
    pub async fn lookup(
        &self,
        restaurant: &RestaurantCode,
        contact: &Contact,
    ) -> Result<Option<Customer>, TrackingError> {
        if contact.is_empty() {
            return Err(TrackingError::Validation(
                "an email or a phone number is required".to_owned(),
            ));
        }
        self.matcher().match_customer(restaurant, contact).await
    }
}
