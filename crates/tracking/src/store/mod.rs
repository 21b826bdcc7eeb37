//! Storage abstraction for customers and reservations.
//!
//! # Consistency contract
//!
//! Implementations must provide:
//!
//! - **Uniqueness**: at most one customer per `(restaurant, primary_email)` and
//!   per `(restaurant, primary_phone)`. A create that would violate either
//!   fails with [`StoreError::DuplicateContact`] and writes nothing.
//! - **Atomic increments**: [`CustomerStore::increment`] applies the delta in
//!   place. Two concurrent increments are both reflected.
//! - **Counter invariant**: `no_show_count <= total_reservations` after every
//!   write; an increment that would break it fails with
//!   [`StoreError::CounterInvariant`].
//! - **Conditional transitions**: [`ReservationStore::transition_status`]
//!   checks and writes the status in one atomic step.
//!
//! Point lookups return the first match in the store's natural order
//! (creation order) if historical duplicates exist.
//!
//! # Implementations
//!
//! - [`PgStore`] - `PostgreSQL`, unique partial indexes and `UPDATE ... RETURNING`
//! - [`InMemoryStore`] - mutex-guarded vectors, for tests

pub mod memory;
pub mod postgres;

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

use casanova_core::{
    CustomerId, NormalizedEmail, NormalizedPhone, ReservationId, ReservationStatus,
    RestaurantCode,
};

use crate::models::{Counter, Customer, NewCustomer, Reservation};

pub use memory::InMemoryStore;
pub use postgres::PgStore;

/// Which uniqueness constraint a create ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactField {
    Email,
    Phone,
}

impl std::fmt::Display for ContactField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Email => f.write_str("primary_email"),
            Self::Phone => f.write_str("primary_phone"),
        }
    }
}

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transport or infrastructure failure, including timeouts.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A create raced with another create for the same normalized contact.
    #[error("duplicate customer contact on {0}")]
    DuplicateContact(ContactField),

    /// The addressed document does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The write would make `no_show_count` exceed `total_reservations`.
    #[error("no-show count would exceed total reservations")]
    CounterInvariant,

    /// Stored data could not be mapped back to the domain model.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Any other backend error (bad query, permission, ...).
    #[error("backend error: {0}")]
    Backend(String),
}

/// Result of a conditional status transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The reservation was in an allowed status and now has the new one.
    Applied(Reservation),
    /// The reservation was left as is; it carries its current status.
    Unchanged(Reservation),
}

/// Customer documents keyed by id, scoped by restaurant.
pub trait CustomerStore: Send + Sync {
    /// Point lookup on the normalized email.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the store cannot be reached.
    fn find_by_email(
        &self,
        restaurant: &RestaurantCode,
        email: &NormalizedEmail,
    ) -> impl Future<Output = Result<Option<Customer>, StoreError>> + Send;

    /// Point lookup on the normalized phone.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the store cannot be reached.
    fn find_by_phone(
        &self,
        restaurant: &RestaurantCode,
        phone: &NormalizedPhone,
    ) -> impl Future<Output = Result<Option<Customer>, StoreError>> + Send;

    /// Point read by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the store cannot be reached.
    fn get_customer(
        &self,
        restaurant: &RestaurantCode,
        id: CustomerId,
    ) -> impl Future<Output = Result<Option<Customer>, StoreError>> + Send;

    /// Create a customer with one reservation and no no-shows.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateContact`] if another customer already
    /// holds the email or phone at this restaurant.
    fn create_customer(
        &self,
        restaurant: &RestaurantCode,
        customer: NewCustomer,
    ) -> impl Future<Output = Result<Customer, StoreError>> + Send;

    /// Atomically add `delta` to `counter` and set `updated_at = at`.
    ///
    /// Incrementing [`Counter::NoShows`] also sets `last_no_show_date` to
    /// `at`'s date.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown id and
    /// [`StoreError::CounterInvariant`] if the no-show count would exceed the
    /// reservation count.
    fn increment(
        &self,
        restaurant: &RestaurantCode,
        id: CustomerId,
        counter: Counter,
        delta: u32,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<Customer, StoreError>> + Send;

    /// Cheap connectivity check.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the store cannot be reached.
    fn ping(&self) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Read and status access to reservations owned by the reservation subsystem.
pub trait ReservationStore: Send + Sync {
    /// Point read by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the store cannot be reached.
    fn get_reservation(
        &self,
        restaurant: &RestaurantCode,
        id: ReservationId,
    ) -> impl Future<Output = Result<Option<Reservation>, StoreError>> + Send;

    /// Unconditionally set the status.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown id.
    fn set_status(
        &self,
        restaurant: &RestaurantCode,
        id: ReservationId,
        status: ReservationStatus,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<Reservation, StoreError>> + Send;

    /// Set the status to `to` only if it currently is one of `allowed_from`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown id.
    fn transition_status(
        &self,
        restaurant: &RestaurantCode,
        id: ReservationId,
        allowed_from: &[ReservationStatus],
        to: ReservationStatus,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<Transition, StoreError>> + Send;

    /// All reservations of a restaurant, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the store cannot be reached.
    fn list_reservations(
        &self,
        restaurant: &RestaurantCode,
    ) -> impl Future<Output = Result<Vec<Reservation>, StoreError>> + Send;
}

/// Run a store call under a deadline; expiry counts as unavailability.
pub(crate) async fn bounded<T>(
    timeout: Duration,
    operation: &'static str,
    call: impl Future<Output = Result<T, StoreError>>,
) -> Result<T, StoreError> {
    tokio::time::timeout(timeout, call).await.unwrap_or_else(|_| {
        Err(StoreError::Unavailable(format!(
            "{operation} timed out after {}ms",
            timeout.as_millis()
        )))
    })
}
