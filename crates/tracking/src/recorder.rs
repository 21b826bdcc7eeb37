//! Reservation status changes and their effect on customer history.
//!
//! The reservation-side mutation is the operator-visible source of truth and
//! its failures are surfaced. The customer-side increment that follows a
//! no-show is an auxiliary write: its failure is logged as a partial failure
//! and reported in the result, never rolled back into the reservation.

use chrono::Utc;
use tracing::{error, info, instrument};

use casanova_core::{CustomerId, ReservationId, ReservationStatus, RestaurantCode};

use crate::config::TrackingConfig;
use crate::error::TrackingError;
use crate::models::{Counter, Customer, Reservation};
use crate::store::{CustomerStore, ReservationStore, Transition, bounded};

/// What happened to the customer's counters after a no-show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomerUpdate {
    /// `no_show_count` was incremented and `last_no_show_date` stamped.
    Incremented(Customer),
    /// No customer is linked to the reservation.
    Skipped,
    /// The increment failed after the reservation was updated.
    Failed(String),
}

/// Result of the guarded no-show transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoShowOutcome {
    /// The reservation moved to `no_show` on this call.
    Recorded {
        reservation: Reservation,
        customer: CustomerUpdate,
    },
    /// The reservation was already a no-show; nothing was counted.
    AlreadyRecorded(Reservation),
}

pub struct OutcomeRecorder<'a, S> {
    store: &'a S,
    config: &'a TrackingConfig,
}

impl<'a, S: CustomerStore + ReservationStore> OutcomeRecorder<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S, config: &'a TrackingConfig) -> Self {
        Self { store, config }
    }

    /// Set the reservation to `no_show` and count it against `customer_id`.
    ///
    /// Not idempotent: calling this twice for the same reservation counts two
    /// no-shows. Use [`Self::mark_no_show_once`] unless the caller already
    /// guards against repeats.
    ///
    /// # Errors
    ///
    /// Returns `TrackingError::NotFound` for an unknown reservation and
    /// `TrackingError::StoreUnavailable` if the status update fails. A failed
    /// customer increment is not an error; see [`CustomerUpdate::Failed`].
    #[instrument(skip(self, restaurant), fields(restaurant = %restaurant))]
    pub async fn mark_no_show(
        &self,
        restaurant: &RestaurantCode,
        reservation_id: ReservationId,
        customer_id: Option<CustomerId>,
    ) -> Result<CustomerUpdate, TrackingError> {
        bounded(
            self.config.store_timeout,
            "set_status",
            self.store.set_status(
                restaurant,
                reservation_id,
                ReservationStatus::NoShow,
                Utc::now(),
            ),
        )
        .await?;

        Ok(self
            .count_no_show(restaurant, reservation_id, customer_id)
            .await)
    }

    /// Move the reservation from `pending` or `confirmed` to `no_show` and,
    /// only if this call made the transition, count it against the customer.
    ///
    /// `customer_id` defaults to the customer linked on the reservation.
    ///
    /// # Errors
    ///
    /// - `TrackingError::NotFound` for an unknown reservation
    /// - `TrackingError::Validation` if the reservation is seated, completed,
    ///   or cancelled
    /// - `TrackingError::StoreUnavailable` if the transition fails
    #[instrument(skip(self, restaurant), fields(restaurant = %restaurant))]
    pub async fn mark_no_show_once(
        &self,
        restaurant: &RestaurantCode,
        reservation_id: ReservationId,
        customer_id: Option<CustomerId>,
    ) -> Result<NoShowOutcome, TrackingError> {
        let transition = bounded(
            self.config.store_timeout,
            "transition_status",
            self.store.transition_status(
                restaurant,
                reservation_id,
                &ReservationStatus::NO_SHOW_SOURCES,
                ReservationStatus::NoShow,
                Utc::now(),
            ),
        )
        .await?;

        match transition {
            Transition::Applied(reservation) => {
                let customer = self
                    .count_no_show(
                        restaurant,
                        reservation_id,
                        customer_id.or(reservation.customer_id),
                    )
                    .await;
                Ok(NoShowOutcome::Recorded {
                    reservation,
                    customer,
                })
            }
            Transition::Unchanged(reservation) if reservation.status == ReservationStatus::NoShow => {
                info!("Reservation already marked as no-show, nothing counted");
                Ok(NoShowOutcome::AlreadyRecorded(reservation))
            }
            Transition::Unchanged(reservation) => Err(TrackingError::Validation(format!(
                "cannot mark a {} reservation as no_show",
                reservation.status
            ))),
        }
    }

    /// Move the reservation to `status` along the lifecycle.
    ///
    /// The current status is checked and replaced in one store operation, so
    /// a terminal reservation (`completed`, `cancelled`, `no_show`) can never
    /// be reopened and later counted as a second no-show.
    ///
    /// # Errors
    ///
    /// - `TrackingError::Validation` for `no_show` (it has to go through the
    ///   no-show path so the customer is counted) or a move the lifecycle does
    ///   not allow
    /// - `TrackingError::NotFound` for an unknown reservation
    #[instrument(skip(self, restaurant), fields(restaurant = %restaurant))]
    pub async fn update_status(
        &self,
        restaurant: &RestaurantCode,
        reservation_id: ReservationId,
        status: ReservationStatus,
    ) -> Result<Reservation, TrackingError> {
        if !ReservationStatus::OPERATOR_SETTABLE.contains(&status) {
            return Err(TrackingError::Validation(format!(
                "status {status} cannot be set directly"
            )));
        }

        let allowed: Vec<ReservationStatus> = ReservationStatus::ALL
            .into_iter()
            .filter(|from| from.can_transition_to(status))
            .collect();

        let transition = bounded(
            self.config.store_timeout,
            "transition_status",
            self.store
                .transition_status(restaurant, reservation_id, &allowed, status, Utc::now()),
        )
        .await?;

        match transition {
            Transition::Applied(reservation) => Ok(reservation),
            Transition::Unchanged(reservation) if reservation.status.is_terminal() => {
                Err(TrackingError::Validation(format!(
                    "reservation is already {} and cannot change",
                    reservation.status
                )))
            }
            Transition::Unchanged(reservation) => Err(TrackingError::Validation(format!(
                "cannot move a {} reservation to {status}",
                reservation.status
            ))),
        }
    }

    async fn count_no_show(
        &self,
        restaurant: &RestaurantCode,
        reservation_id: ReservationId,
        customer_id: Option<CustomerId>,
    ) -> CustomerUpdate {
        let Some(customer_id) = customer_id else {
            return CustomerUpdate::Skipped;
        };

        let incremented = bounded(
            self.config.store_timeout,
            "increment",
            self.store.increment(
                restaurant,
                customer_id,
                Counter::NoShows,
                1,
                Utc::now(),
            ),
        )
        .await;

        match incremented {
            Ok(customer) => CustomerUpdate::Incremented(customer),
            Err(e) => {
                error!(
                    %reservation_id,
                    %customer_id,
                    error = %e,
                    "Reservation marked as no-show but customer counter was not updated"
                );
                CustomerUpdate::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;

    use casanova_core::CountryCode;

    use super::*;
    use crate::contact::Contact;
    use crate::ledger::CustomerLedger;
    use crate::models::NewReservation;
    use crate::store::InMemoryStore;

    struct Fixture {
        store: InMemoryStore,
        config: TrackingConfig,
        restaurant: RestaurantCode,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                store: InMemoryStore::new(),
                config: TrackingConfig::default(),
                restaurant: RestaurantCode::default(),
            }
        }

        /// Record `visits` reservations for one email and return the last one.
        async fn booked(&self, email: &str, visits: u32) -> (CustomerId, Reservation) {
            let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
            let contact = Contact::from_raw(email, "", CountryCode::FRANCE);
            let ledger = CustomerLedger::new(&self.store, &self.config);
            let mut customer_id = None;
            for _ in 0..visits {
                customer_id = ledger
                    .record_reservation(&self.restaurant, &contact, "", date)
                    .await;
            }
            let reservation = self
                .store
                .insert_reservation(
                    &self.restaurant,
                    NewReservation::new("", email, "", date).with_customer(customer_id),
                )
                .unwrap();
            (customer_id.unwrap(), reservation)
        }

        fn recorder(&self) -> OutcomeRecorder<'_, InMemoryStore> {
            OutcomeRecorder::new(&self.store, &self.config)
        }
    }

    #[tokio::test]
    async fn test_mark_no_show_counts_and_stamps_date() {
        let fx = Fixture::new();
        let (customer_id, reservation) = fx.booked("a@b.com", 1).await;

        let update = fx
            .recorder()
            .mark_no_show(&fx.restaurant, reservation.id, Some(customer_id))
            .await
            .unwrap();

        let CustomerUpdate::Incremented(customer) = &update else {
            panic!("expected increment, got {update:?}");
        };
        assert_eq!(customer.no_show_count, 1);
        assert_eq!(customer.last_no_show_date, Some(Utc::now().date_naive()));

        let stored = fx
            .store
            .get_reservation(&fx.restaurant, reservation.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, ReservationStatus::NoShow);
    }

    #[tokio::test]
    async fn test_mark_no_show_without_customer_only_updates_status() {
        let fx = Fixture::new();
        let (_, reservation) = fx.booked("a@b.com", 1).await;

        let update = fx
            .recorder()
            .mark_no_show(&fx.restaurant, reservation.id, None)
            .await
            .unwrap();
        assert_eq!(update, CustomerUpdate::Skipped);
    }

    #[tokio::test]
    async fn test_mark_no_show_unknown_reservation() {
        let fx = Fixture::new();
        let result = fx
            .recorder()
            .mark_no_show(&fx.restaurant, ReservationId::generate(), None)
            .await;
        assert!(matches!(result, Err(TrackingError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_customer_failure_is_partial_not_fatal() {
        let fx = Fixture::new();
        let (customer_id, reservation) = fx.booked("a@b.com", 1).await;
        fx.store.fail_customer_writes(true);

        let update = fx
            .recorder()
            .mark_no_show(&fx.restaurant, reservation.id, Some(customer_id))
            .await
            .unwrap();
        assert!(matches!(update, CustomerUpdate::Failed(_)));
    }

    #[tokio::test]
    async fn test_mark_no_show_once_counts_once() {
        let fx = Fixture::new();
        let (customer_id, reservation) = fx.booked("a@b.com", 3).await;
        let recorder = fx.recorder();

        let first = recorder
            .mark_no_show_once(&fx.restaurant, reservation.id, None)
            .await
            .unwrap();
        assert!(matches!(
            first,
            NoShowOutcome::Recorded { customer: CustomerUpdate::Incremented(ref c), .. }
                if c.id == customer_id && c.no_show_count == 1
        ));

        let second = recorder
            .mark_no_show_once(&fx.restaurant, reservation.id, None)
            .await
            .unwrap();
        assert!(matches!(second, NoShowOutcome::AlreadyRecorded(_)));

        let customer = fx
            .store
            .get_customer(&fx.restaurant, customer_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(customer.no_show_count, 1);
    }

    #[tokio::test]
    async fn test_mark_no_show_once_rejects_seated() {
        let fx = Fixture::new();
        let (_, reservation) = fx.booked("a@b.com", 1).await;
        let recorder = fx.recorder();

        recorder
            .update_status(&fx.restaurant, reservation.id, ReservationStatus::Confirmed)
            .await
            .unwrap();
        recorder
            .update_status(&fx.restaurant, reservation.id, ReservationStatus::Seated)
            .await
            .unwrap();

        let result = recorder
            .mark_no_show_once(&fx.restaurant, reservation.id, None)
            .await;
        assert!(matches!(result, Err(TrackingError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_status_rejects_no_show() {
        let fx = Fixture::new();
        let (_, reservation) = fx.booked("a@b.com", 1).await;

        let result = fx
            .recorder()
            .update_status(&fx.restaurant, reservation.id, ReservationStatus::NoShow)
            .await;
        assert!(matches!(result, Err(TrackingError::Validation(_))));

        let result = fx
            .recorder()
            .update_status(&fx.restaurant, ReservationId::generate(), ReservationStatus::Cancelled)
            .await;
        assert!(matches!(result, Err(TrackingError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_status_follows_lifecycle() {
        let fx = Fixture::new();
        let (_, reservation) = fx.booked("a@b.com", 1).await;
        let recorder = fx.recorder();

        let skipped = recorder
            .update_status(&fx.restaurant, reservation.id, ReservationStatus::Seated)
            .await;
        assert!(matches!(skipped, Err(TrackingError::Validation(_))));

        for status in [
            ReservationStatus::Confirmed,
            ReservationStatus::Seated,
            ReservationStatus::Completed,
        ] {
            let updated = recorder
                .update_status(&fx.restaurant, reservation.id, status)
                .await
                .unwrap();
            assert_eq!(updated.status, status);
        }

        let reopened = recorder
            .update_status(&fx.restaurant, reservation.id, ReservationStatus::Pending)
            .await;
        assert!(
            matches!(reopened, Err(TrackingError::Validation(ref msg)) if msg.contains("completed"))
        );
    }

    #[tokio::test]
    async fn test_no_show_cannot_be_reopened_and_counted_again() {
        let fx = Fixture::new();
        let (customer_id, reservation) = fx.booked("a@b.com", 3).await;
        let recorder = fx.recorder();

        recorder
            .mark_no_show_once(&fx.restaurant, reservation.id, None)
            .await
            .unwrap();
        let reopened = recorder
            .update_status(&fx.restaurant, reservation.id, ReservationStatus::Pending)
            .await;
        assert!(matches!(reopened, Err(TrackingError::Validation(_))));

        let again = recorder
            .mark_no_show_once(&fx.restaurant, reservation.id, None)
            .await
            .unwrap();
        assert!(matches!(again, NoShowOutcome::AlreadyRecorded(_)));

        let customer = fx
            .store
            .get_customer(&fx.restaurant, customer_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(customer.no_show_count, 1);
    }
}
