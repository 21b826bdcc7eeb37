//! In-memory store for fast, deterministic testing.
//!
//! Honors the same consistency contract as [`super::PgStore`]: uniqueness on
//! create, atomic increments, the no-show invariant, and conditional
//! transitions all happen under a single lock.
//!
//! Failure injection (`set_unavailable`, `fail_customer_writes`) and optional
//! per-call latency make it possible to exercise best-effort paths and widen
//! race windows in concurrency tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};

use casanova_core::{
    CustomerId, NormalizedEmail, NormalizedPhone, ReservationId, ReservationStatus,
    RestaurantCode,
};

use super::{ContactField, CustomerStore, ReservationStore, StoreError, Transition};
use crate::models::{Counter, Customer, NewCustomer, NewReservation, Reservation};

/// `Vec`-backed store; vector order is the natural (creation) order.
#[derive(Clone, Debug, Default)]
pub struct InMemoryStore {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    state: Mutex<State>,
    unavailable: AtomicBool,
    fail_customer_writes: AtomicBool,
    latency: Option<Duration>,
}

#[derive(Debug, Default)]
struct State {
    customers: Vec<Customer>,
    reservations: Vec<Reservation>,
}

impl InMemoryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that sleeps for `latency` before every call.
    #[must_use]
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                latency: Some(latency),
                ..Inner::default()
            }),
        }
    }

    /// Make every call fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make customer creates and increments fail with
    /// [`StoreError::Unavailable`] while reads and reservation writes succeed.
    pub fn fail_customer_writes(&self, fail: bool) {
        self.inner.fail_customer_writes.store(fail, Ordering::SeqCst);
    }

    /// Seed a reservation as the reservation subsystem would.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the store lock is poisoned.
    pub fn insert_reservation(
        &self,
        restaurant: &RestaurantCode,
        new: NewReservation,
    ) -> Result<Reservation, StoreError> {
        let now = Utc::now();
        let reservation = Reservation {
            id: ReservationId::generate(),
            restaurant: restaurant.clone(),
            customer_name: new.customer_name,
            customer_email: new.customer_email,
            customer_phone: new.customer_phone,
            reservation_date: new.reservation_date,
            reservation_time: new.reservation_time,
            guest_count: new.guest_count,
            special_notes: new.special_notes,
            status: ReservationStatus::Pending,
            customer_id: new.customer_id,
            created_at: now,
            updated_at: now,
        };
        self.lock()?.reservations.push(reservation.clone());
        Ok(reservation)
    }

    /// Insert a customer without the uniqueness check, to model duplicates
    /// left behind before the constraint existed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the store lock is poisoned.
    pub fn insert_customer_unchecked(&self, customer: Customer) -> Result<(), StoreError> {
        self.lock()?.customers.push(customer);
        Ok(())
    }

    /// Snapshot of all customers of a restaurant, in creation order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the store lock is poisoned.
    pub fn customers(&self, restaurant: &RestaurantCode) -> Result<Vec<Customer>, StoreError> {
        Ok(self
            .lock()?
            .customers
            .iter()
            .filter(|c| &c.restaurant == restaurant)
            .cloned()
            .collect())
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        self.inner
            .state
            .lock()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_owned()))
    }

    async fn enter(&self) -> Result<(), StoreError> {
        if let Some(latency) = self.inner.latency {
            tokio::time::sleep(latency).await;
        }
        if self.inner.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory store offline".to_owned()));
        }
        Ok(())
    }

    async fn enter_customer_write(&self) -> Result<(), StoreError> {
        self.enter().await?;
        if self.inner.fail_customer_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "in-memory customer writes disabled".to_owned(),
            ));
        }
        Ok(())
    }
}

fn find_reservation<'s>(
    state: &'s mut State,
    restaurant: &RestaurantCode,
    id: ReservationId,
) -> Result<&'s mut Reservation, StoreError> {
    state
        .reservations
        .iter_mut()
        .find(|r| r.id == id && &r.restaurant == restaurant)
        .ok_or_else(|| StoreError::NotFound(format!("reservation {id}")))
}

impl CustomerStore for InMemoryStore {
    async fn find_by_email(
        &self,
        restaurant: &RestaurantCode,
        email: &NormalizedEmail,
    ) -> Result<Option<Customer>, StoreError> {
        self.enter().await?;
        Ok(self
            .lock()?
            .customers
            .iter()
            .find(|c| &c.restaurant == restaurant && c.primary_email.as_ref() == Some(email))
            .cloned())
    }

    async fn find_by_phone(
        &self,
        restaurant: &RestaurantCode,
        phone: &NormalizedPhone,
    ) -> Result<Option<Customer>, StoreError> {
        self.enter().await?;
        Ok(self
            .lock()?
            .customers
            .iter()
            .find(|c| &c.restaurant == restaurant && c.primary_phone.as_ref() == Some(phone))
            .cloned())
    }

    async fn get_customer(
        &self,
        restaurant: &RestaurantCode,
        id: CustomerId,
    ) -> Result<Option<Customer>, StoreError> {
        self.enter().await?;
        Ok(self
            .lock()?
            .customers
            .iter()
            .find(|c| c.id == id && &c.restaurant == restaurant)
            .cloned())
    }

    async fn create_customer(
        &self,
        restaurant: &RestaurantCode,
        customer: NewCustomer,
    ) -> Result<Customer, StoreError> {
        self.enter_customer_write().await?;
        let mut state = self.lock()?;

        let same_restaurant = || state.customers.iter().filter(|c| &c.restaurant == restaurant);
        if let Some(email) = &customer.primary_email
            && same_restaurant().any(|c| c.primary_email.as_ref() == Some(email))
        {
            return Err(StoreError::DuplicateContact(ContactField::Email));
        }
        if let Some(phone) = &customer.primary_phone
            && same_restaurant().any(|c| c.primary_phone.as_ref() == Some(phone))
        {
            return Err(StoreError::DuplicateContact(ContactField::Phone));
        }

        let created = Customer {
            id: CustomerId::generate(),
            restaurant: restaurant.clone(),
            primary_email: customer.primary_email,
            primary_phone: customer.primary_phone,
            primary_name: customer.primary_name,
            total_reservations: 1,
            no_show_count: 0,
            last_no_show_date: None,
            first_reservation_date: customer.first_reservation_date,
            created_at: customer.created_at,
            updated_at: customer.created_at,
        };
        state.customers.push(created.clone());
        Ok(created)
    }

    async fn increment(
        &self,
        restaurant: &RestaurantCode,
        id: CustomerId,
        counter: Counter,
        delta: u32,
        at: DateTime<Utc>,
    ) -> Result<Customer, StoreError> {
        self.enter_customer_write().await?;
        let mut state = self.lock()?;
        let customer = state
            .customers
            .iter_mut()
            .find(|c| c.id == id && &c.restaurant == restaurant)
            .ok_or_else(|| StoreError::NotFound(format!("customer {id}")))?;

        let overflow = || StoreError::Backend(format!("{counter} overflow"));
        match counter {
            Counter::TotalReservations => {
                customer.total_reservations = customer
                    .total_reservations
                    .checked_add(delta)
                    .ok_or_else(overflow)?;
            }
            Counter::NoShows => {
                let next = customer.no_show_count.checked_add(delta).ok_or_else(overflow)?;
                if next > customer.total_reservations {
                    return Err(StoreError::CounterInvariant);
                }
                customer.no_show_count = next;
                customer.last_no_show_date = Some(at.date_naive());
            }
        }
        customer.updated_at = at;
        Ok(customer.clone())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.enter().await
    }
}

impl ReservationStore for InMemoryStore {
    async fn get_reservation(
        &self,
        restaurant: &RestaurantCode,
        id: ReservationId,
    ) -> Result<Option<Reservation>, StoreError> {
        self.enter().await?;
        Ok(self
            .lock()?
            .reservations
            .iter()
            .find(|r| r.id == id && &r.restaurant == restaurant)
            .cloned())
    }

    async fn set_status(
        &self,
        restaurant: &RestaurantCode,
        id: ReservationId,
        status: ReservationStatus,
        at: DateTime<Utc>,
    ) -> Result<Reservation, StoreError> {
        self.enter().await?;
        let mut state = self.lock()?;
        let reservation = find_reservation(&mut state, restaurant, id)?;
        reservation.status = status;
        reservation.updated_at = at;
        Ok(reservation.clone())
    }

    async fn transition_status(
        &self,
        restaurant: &RestaurantCode,
        id: ReservationId,
        allowed_from: &[ReservationStatus],
        to: ReservationStatus,
        at: DateTime<Utc>,
    ) -> Result<Transition, StoreError> {
        self.enter().await?;
        let mut state = self.lock()?;
        let reservation = find_reservation(&mut state, restaurant, id)?;
        if !allowed_from.contains(&reservation.status) {
            return Ok(Transition::Unchanged(reservation.clone()));
        }
        reservation.status = to;
        reservation.updated_at = at;
        Ok(Transition::Applied(reservation.clone()))
    }

    async fn list_reservations(
        &self,
        restaurant: &RestaurantCode,
    ) -> Result<Vec<Reservation>, StoreError> {
        self.enter().await?;
        let mut reservations: Vec<Reservation> = self
            .lock()?
            .reservations
            .iter()
            .filter(|r| &r.restaurant == restaurant)
            .cloned()
            .collect();
        // Stable sort keeps insertion order for equal timestamps, reversed below
        reservations.reverse();
        reservations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reservations)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn restaurant() -> RestaurantCode {
        RestaurantCode::default()
    }

    fn new_customer(email: &str) -> NewCustomer {
        NewCustomer {
            primary_email: Some(NormalizedEmail::parse(email).unwrap()),
            primary_phone: None,
            primary_name: String::new(),
            first_reservation_date: None,
            created_at: Utc::now(),
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_email_per_restaurant() {
        let store = InMemoryStore::new();
        store.create_customer(&restaurant(), new_customer("a@b.com")).await.unwrap();

        let err = store
            .create_customer(&restaurant(), new_customer("a@b.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateContact(ContactField::Email)));

        let other = RestaurantCode::new("BISTRO").unwrap();
        assert!(store.create_customer(&other, new_customer("a@b.com")).await.is_ok());
    }

    #[tokio::test]
    async fn test_no_show_increment_respects_invariant() {
        let store = InMemoryStore::new();
        let customer = store
            .create_customer(&restaurant(), new_customer("a@b.com"))
            .await
            .unwrap();
        let now = Utc::now();

        let updated = store
            .increment(&restaurant(), customer.id, Counter::NoShows, 1, now)
            .await
            .unwrap();
        assert_eq!(updated.no_show_count, 1);
        assert_eq!(updated.last_no_show_date, Some(now.date_naive()));

        let err = store
            .increment(&restaurant(), customer.id, Counter::NoShows, 1, now)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::CounterInvariant));
    }

    #[tokio::test]
    async fn test_increment_unknown_customer() {
        let store = InMemoryStore::new();
        let err = store
            .increment(
                &restaurant(),
                CustomerId::generate(),
                Counter::TotalReservations,
                1,
                Utc::now(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_transition_only_from_allowed() {
        let store = InMemoryStore::new();
        let r = store
            .insert_reservation(&restaurant(), NewReservation::new("A", "a@b.com", "", date()))
            .unwrap();
        let allowed = ReservationStatus::NO_SHOW_SOURCES;

        let first = store
            .transition_status(&restaurant(), r.id, &allowed, ReservationStatus::NoShow, Utc::now())
            .await
            .unwrap();
        assert!(matches!(first, Transition::Applied(ref r) if r.status == ReservationStatus::NoShow));

        let second = store
            .transition_status(&restaurant(), r.id, &allowed, ReservationStatus::NoShow, Utc::now())
            .await
            .unwrap();
        assert!(matches!(second, Transition::Unchanged(_)));
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let store = InMemoryStore::new();
        let first = store
            .insert_reservation(&restaurant(), NewReservation::new("A", "a@b.com", "", date()))
            .unwrap();
        let second = store
            .insert_reservation(&restaurant(), NewReservation::new("B", "b@b.com", "", date()))
            .unwrap();

        let listed = store.list_reservations(&restaurant()).await.unwrap();
        let ids: Vec<_> = listed.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn test_unavailable_and_write_failures() {
        let store = InMemoryStore::new();
        store.fail_customer_writes(true);
        assert!(matches!(
            store.create_customer(&restaurant(), new_customer("a@b.com")).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(store.ping().await.is_ok());

        store.set_unavailable(true);
        assert!(matches!(store.ping().await, Err(StoreError::Unavailable(_))));
    }
}
