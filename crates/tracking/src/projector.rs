//! Read path attaching customer history to a reservation feed.

use std::collections::HashMap;

use async_stream::stream;
use futures::{Stream, StreamExt};
use tracing::{instrument, warn};

use casanova_core::RestaurantCode;

use crate::config::TrackingConfig;
use crate::contact::Contact;
use crate::error::TrackingError;
use crate::matcher::IdentityMatcher;
use crate::models::{HistorySummary, Reservation, ReservationWithHistory};
use crate::store::{CustomerStore, ReservationStore, bounded};

/// Resolves each reservation to its customer by the reservation's own contact
/// fields, not by its stored customer link, so reservations made before
/// tracking existed still get a history.
pub struct HistoryProjector<'a, S> {
    store: &'a S,
    config: &'a TrackingConfig,
}

impl<'a, S: CustomerStore> HistoryProjector<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S, config: &'a TrackingConfig) -> Self {
        Self { store, config }
    }

    /// Lazily pair every reservation with its customer's current history.
    ///
    /// The stream yields exactly one item per input reservation, in order.
    /// Lookups are shared between reservations with the same contact within
    /// this call only. A failed lookup yields `customer_history: None` for
    /// that reservation and is not remembered.
    pub fn project<I>(
        &self,
        restaurant: &'a RestaurantCode,
        reservations: I,
    ) -> impl Stream<Item = ReservationWithHistory> + Send + use<'a, S, I>
    where
        I: IntoIterator<Item = Reservation>,
        I::IntoIter: Send + 'a,
    {
        let matcher = IdentityMatcher::new(self.store, self.config.store_timeout);
        let default_country = self.config.default_country;
        let reservations = reservations.into_iter();

        stream! {
            let mut seen: HashMap<Contact, Option<HistorySummary>> = HashMap::new();

            for reservation in reservations {
                let contact = Contact::from_raw(
                    &reservation.customer_email,
                    &reservation.customer_phone,
                    default_country,
                );

                let customer_history = if let Some(known) = seen.get(&contact) {
                    *known
                } else {
                    match matcher.match_customer(restaurant, &contact).await {
                        Ok(found) => {
                            let history = found.map(|c| c.history());
                            seen.insert(contact, history);
                            history
                        }
                        Err(e) => {
                            warn!(reservation_id = %reservation.id, error = %e, "History lookup failed");
                            None
                        }
                    }
                };

                yield ReservationWithHistory { reservation, customer_history };
            }
        }
    }
}

impl<S: CustomerStore + ReservationStore> HistoryProjector<'_, S> {
    /// The restaurant's reservations, newest first, with history attached.
    ///
    /// # Errors
    ///
    /// Returns `TrackingError::StoreUnavailable` if the reservations cannot be
    /// listed. History lookups never fail the feed.
    #[instrument(skip(self, restaurant), fields(restaurant = %restaurant))]
    pub async fn feed(
        &self,
        restaurant: &RestaurantCode,
    ) -> Result<Vec<ReservationWithHistory>, TrackingError> {
        let reservations = bounded(
            self.config.store_timeout,
            "list_reservations",
            self.store.list_reservations(restaurant),
        )
        .await?;

        let projector = HistoryProjector::new(self.store, self.config);
        Ok(projector.project(restaurant, reservations).collect().await)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;

    use casanova_core::CountryCode;

    use super::*;
    use crate::ledger::CustomerLedger;
    use crate::models::NewReservation;
    use crate::store::InMemoryStore;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[tokio::test]
    async fn test_unmatched_reservation_has_no_summary() {
        let store = InMemoryStore::new();
        let config = TrackingConfig::default();
        let restaurant = RestaurantCode::default();
        store
            .insert_reservation(&restaurant, NewReservation::new("", "ghost@b.com", "", date()))
            .unwrap();

        let feed = HistoryProjector::new(&store, &config)
            .feed(&restaurant)
            .await
            .unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].customer_history, None);
    }

    #[tokio::test]
    async fn test_matched_by_contact_not_link() {
        let store = InMemoryStore::new();
        let config = TrackingConfig::default();
        let restaurant = RestaurantCode::default();
        let ledger = CustomerLedger::new(&store, &config);
        let contact = Contact::from_raw("a@b.com", "", CountryCode::FRANCE);
        ledger.record_reservation(&restaurant, &contact, "", date()).await;
        ledger.record_reservation(&restaurant, &contact, "", date()).await;

        // Made before tracking: no customer link, different case
        let old = NewReservation::new("", "A@B.com", "", date());
        let reservations = vec![
            store.insert_reservation(&restaurant, old.clone()).unwrap(),
            store.insert_reservation(&restaurant, old).unwrap(),
        ];

        let projected: Vec<_> = HistoryProjector::new(&store, &config)
            .project(&restaurant, reservations)
            .collect()
            .await;
        assert_eq!(projected.len(), 2);
        for item in projected {
            assert_eq!(item.customer_history, Some(HistorySummary::new(2, 0)));
        }
    }

    #[tokio::test]
    async fn test_lookup_failure_degrades_per_item() {
        let store = InMemoryStore::new();
        let config = TrackingConfig::default();
        let restaurant = RestaurantCode::default();
        let r = store
            .insert_reservation(&restaurant, NewReservation::new("", "a@b.com", "", date()))
            .unwrap();
        store.set_unavailable(true);

        let projected: Vec<_> = HistoryProjector::new(&store, &config)
            .project(&restaurant, vec![r])
            .collect()
            .await;
        assert_eq!(projected.len(), 1);
        assert_eq!(projected[0].customer_history, None);

        let feed = HistoryProjector::new(&store, &config).feed(&restaurant).await;
        assert!(matches!(feed, Err(TrackingError::StoreUnavailable(_))));
    }
}
