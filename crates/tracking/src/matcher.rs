//! Identity resolution: contact fields to at most one customer.

use std::time::Duration;

use casanova_core::RestaurantCode;

use crate::contact::Contact;
use crate::error::TrackingError;
use crate::models::Customer;
use crate::store::{CustomerStore, bounded};

/// Finds the customer a contact belongs to.
///
/// Email takes precedence over phone: a contact whose email matches customer
/// A and whose phone matches customer B resolves to A. Pure read, no state.
pub struct IdentityMatcher<'a, S> {
    store: &'a S,
    timeout: Duration,
}

impl<'a, S: CustomerStore> IdentityMatcher<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Resolve `contact` to a customer of `restaurant`.
    ///
    /// An empty contact never matches.
    ///
    /// # Errors
    ///
    /// Returns `TrackingError::StoreUnavailable` if a lookup fails or times
    /// out; infrastructure failure is never reported as "no match".
    pub async fn match_customer(
        &self,
        restaurant: &RestaurantCode,
        contact: &Contact,
    ) -> Result<Option<Customer>, TrackingError> {
        if let Some(email) = &contact.email {
            let found = bounded(
                self.timeout,
                "find_by_email",
                self.store.find_by_email(restaurant, email),
            )
            .await?;
            if found.is_some() {
                return Ok(found);
            }
        }

        if let Some(phone) = &contact.phone {
            return Ok(bounded(
                self.timeout,
                "find_by_phone",
                self.store.find_by_phone(restaurant, phone),
            )
            .await?);
        }

        Ok(None)
    }
}
