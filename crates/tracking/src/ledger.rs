//! Create-or-increment bookkeeping for every new reservation.
//!
//! Tracking is an auxiliary write next to reservation creation: the
//! reservation must go through whether or not the customer could be resolved.
//! [`CustomerLedger::record_reservation`] therefore never fails; it logs and
//! returns `None`. [`CustomerLedger::try_record_reservation`] exposes the
//! underlying error for callers that want it (CLI, tests).

use chrono::{NaiveDate, Utc};
use tracing::{debug, instrument, warn};

use casanova_core::{CustomerId, RestaurantCode};

use crate::config::TrackingConfig;
use crate::contact::Contact;
use crate::error::TrackingError;
use crate::matcher::IdentityMatcher;
use crate::models::{Counter, Customer, NewCustomer};
use crate::store::{CustomerStore, StoreError, bounded};

/// What the ledger did for a reservation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerOutcome {
    /// First reservation for this contact; a customer was created.
    Created(Customer),
    /// Repeat reservation; `total_reservations` was incremented.
    Updated(Customer),
}

impl LedgerOutcome {
    /// The customer after the write.
    #[must_use]
    pub const fn customer(&self) -> &Customer {
        match self {
            Self::Created(c) | Self::Updated(c) => c,
        }
    }

    #[must_use]
    pub const fn customer_id(&self) -> CustomerId {
        self.customer().id
    }
}

/// Records one counted reservation per call against the matching customer.
pub struct CustomerLedger<'a, S> {
    store: &'a S,
    config: &'a TrackingConfig,
}

impl<'a, S: CustomerStore> CustomerLedger<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S, config: &'a TrackingConfig) -> Self {
        Self { store, config }
    }

    /// Best-effort variant: returns the customer id, or `None` if tracking
    /// was skipped or failed.
    #[instrument(skip_all, fields(restaurant = %restaurant, %date))]
    pub async fn record_reservation(
        &self,
        restaurant: &RestaurantCode,
        contact: &Contact,
        name: &str,
        date: NaiveDate,
    ) -> Option<CustomerId> {
        match self
            .try_record_reservation(restaurant, contact, name, date)
            .await
        {
            Ok(outcome) => Some(outcome.customer_id()),
            Err(e) => {
                warn!(error = %e, "Customer tracking skipped for reservation");
                None
            }
        }
    }

    /// Match the contact, then increment the existing customer or create a
    /// new one.
    ///
    /// A create that loses the uniqueness race is retried as an update, up to
    /// `max_create_retries` attempts in total.
    ///
    /// # Errors
    ///
    /// - `TrackingError::Validation` if the contact has neither email nor phone
    /// - `TrackingError::StoreUnavailable` if the store fails or times out
    /// - `TrackingError::RetriesExhausted` if every attempt hit a conflict
    pub async fn try_record_reservation(
        &self,
        restaurant: &RestaurantCode,
        contact: &Contact,
        name: &str,
        date: NaiveDate,
    ) -> Result<LedgerOutcome, TrackingError> {
        if contact.is_empty() {
            return Err(TrackingError::Validation(
                "reservation carries neither a usable email nor phone".to_owned(),
            ));
        }

        let matcher = IdentityMatcher::new(self.store, self.config.store_timeout);
        let attempts = self.config.max_create_retries.max(1);

        for attempt in 1..=attempts {
            if let Some(existing) = matcher.match_customer(restaurant, contact).await? {
                let incremented = bounded(
                    self.config.store_timeout,
                    "increment",
                    self.store.increment(
                        restaurant,
                        existing.id,
                        Counter::TotalReservations,
                        1,
                        Utc::now(),
                    ),
                )
                .await;

                match incremented {
                    Ok(customer) => {
                        debug!(customer_id = %customer.id, attempt, "Incremented customer reservations");
                        return Ok(LedgerOutcome::Updated(customer));
                    }
                    // Removed between match and increment; look again
                    Err(StoreError::NotFound(_)) => continue,
                    Err(e) => return Err(e.into()),
                }
            }

            let created = bounded(
                self.config.store_timeout,
                "create_customer",
                self.store.create_customer(
                    restaurant,
                    NewCustomer {
                        primary_email: contact.email.clone(),
                        primary_phone: contact.phone.clone(),
                        primary_name: name.trim().to_owned(),
                        first_reservation_date: Some(date),
                        created_at: Utc::now(),
                    },
                ),
            )
            .await;

            match created {
                Ok(customer) => {
                    debug!(customer_id = %customer.id, attempt, "Created customer");
                    return Ok(LedgerOutcome::Created(customer));
                }
                Err(StoreError::DuplicateContact(field)) => {
                    debug!(%field, attempt, "Lost customer create race, retrying as update");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(TrackingError::RetriesExhausted { attempts })
    }
}
