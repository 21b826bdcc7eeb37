//! Reservations as consumed by customer tracking.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use casanova_core::{CustomerId, ReservationId, ReservationStatus, RestaurantCode};

use super::customer::HistorySummary;

/// A reservation owned by the reservation subsystem.
///
/// Contact fields are kept exactly as the guest typed them; tracking
/// normalizes them when it needs a match key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub restaurant: RestaurantCode,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub reservation_date: NaiveDate,
    pub reservation_time: String,
    pub guest_count: u32,
    pub special_notes: String,
    pub status: ReservationStatus,
    /// Customer linked at creation, if tracking succeeded then.
    pub customer_id: Option<CustomerId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for seeding a reservation (CLI, tests).
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub reservation_date: NaiveDate,
    pub reservation_time: String,
    pub guest_count: u32,
    pub special_notes: String,
    pub customer_id: Option<CustomerId>,
}

impl NewReservation {
    /// A pending reservation for `date` with the given contact fields.
    #[must_use]
    pub fn new(name: &str, email: &str, phone: &str, date: NaiveDate) -> Self {
        Self {
            customer_name: name.to_owned(),
            customer_email: email.to_owned(),
            customer_phone: phone.to_owned(),
            reservation_date: date,
            reservation_time: String::new(),
            guest_count: 2,
            special_notes: String::new(),
            customer_id: None,
        }
    }

    /// Link the reservation to an already resolved customer.
    #[must_use]
    pub fn with_customer(mut self, customer_id: Option<CustomerId>) -> Self {
        self.customer_id = customer_id;
        self
    }
}

/// A reservation with the customer's history attached for operators.
///
/// `customer_history` is `None` when no customer matches the reservation's
/// contacts, which is distinct from a zero-valued summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReservationWithHistory {
    #[serde(flatten)]
    pub reservation: Reservation,
    pub customer_history: Option<HistorySummary>,
}
