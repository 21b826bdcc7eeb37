//! Customer records and their derived history.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use casanova_core::{CustomerId, NormalizedEmail, NormalizedPhone, RestaurantCode};

/// A resolved real-world contact aggregating history across reservations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Store-assigned, immutable.
    pub id: CustomerId,
    /// Restaurant the customer booked with.
    pub restaurant: RestaurantCode,
    /// Absent when the customer was identified by phone only.
    pub primary_email: Option<NormalizedEmail>,
    /// Absent when the customer was identified by email only.
    pub primary_phone: Option<NormalizedPhone>,
    /// Name given on the first reservation (may be empty).
    pub primary_name: String,
    pub total_reservations: u32,
    pub no_show_count: u32,
    /// Set only when `no_show_count` increments.
    pub last_no_show_date: Option<NaiveDate>,
    /// Date of the reservation that created this record.
    pub first_reservation_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Derive the read-only summary shown to operators.
    #[must_use]
    pub const fn history(&self) -> HistorySummary {
        HistorySummary::new(self.total_reservations, self.no_show_count)
    }
}

/// Fields for a customer seen for the first time.
///
/// Counters are not part of the input: a new customer always starts at one
/// reservation and zero no-shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
    pub primary_email: Option<NormalizedEmail>,
    pub primary_phone: Option<NormalizedPhone>,
    pub primary_name: String,
    pub first_reservation_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// A counter that can be atomically incremented on a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Counter {
    /// `total_reservations`
    TotalReservations,
    /// `no_show_count`; incrementing it also stamps `last_no_show_date`.
    NoShows,
}

impl Counter {
    /// Column / field name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TotalReservations => "total_reservations",
            Self::NoShows => "no_show_count",
        }
    }
}

impl std::fmt::Display for Counter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reliability summary computed on read. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub total_reservations: u32,
    pub no_show_count: u32,
    pub has_no_shows: bool,
}

impl HistorySummary {
    #[must_use]
    pub const fn new(total_reservations: u32, no_show_count: u32) -> Self {
        Self {
            total_reservations,
            no_show_count,
            has_no_shows: no_show_count > 0,
        }
    }
}
