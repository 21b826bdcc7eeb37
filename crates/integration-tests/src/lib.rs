//! Integration tests for Casanova customer tracking.
//!
//! # Running Tests
//!
//! ```bash
//! # In-memory scenarios and HTTP routes
//! cargo test -p casanova-integration-tests
//!
//! # PostgreSQL scenarios (needs a migrated database)
//! DATABASE_URL=postgres://... cargo test -p casanova-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `repeat_customers` - matching and create-or-increment
//! - `no_shows` - outcome recording and counter invariants
//! - `history_feed` - history attached to reservation lists
//! - `api` - the HTTP surface, driven with `tower::ServiceExt::oneshot`
//! - `postgres` - the same contract against `PostgreSQL` (ignored by default)

use axum::Router;
use chrono::NaiveDate;
use secrecy::SecretString;

use casanova_core::RestaurantCode;
use casanova_server::{app, state::AppState};
use casanova_tracking::{
    CustomerTracking, InMemoryStore, NewReservation, PgStore, Reservation, TrackingConfig,
    store::postgres,
};

/// Restaurant every in-memory scenario books at.
#[must_use]
pub fn restaurant() -> RestaurantCode {
    RestaurantCode::from_default_str()
}

/// Calendar date shorthand.
///
/// # Panics
///
/// Panics on an impossible date.
#[must_use]
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid calendar date")
}

/// Tracking facade over a fresh in-memory store with default settings.
#[must_use]
pub fn memory_tracking() -> CustomerTracking<InMemoryStore> {
    CustomerTracking::new(InMemoryStore::new(), TrackingConfig::default())
}

/// Seed a pending reservation the way the reservation subsystem would.
///
/// # Panics
///
/// Panics if the in-memory store refuses the insert.
#[must_use]
pub fn seed_reservation(
    tracking: &CustomerTracking<InMemoryStore>,
    email: &str,
    phone: &str,
    on: NaiveDate,
) -> Reservation {
    tracking
        .store()
        .insert_reservation(&restaurant(), NewReservation::new("Guest", email, phone, on))
        .expect("seed reservation")
}

/// The HTTP app over an in-memory store, plus a handle to that store.
#[must_use]
pub fn memory_app() -> (Router, CustomerTracking<InMemoryStore>) {
    let tracking = memory_tracking();
    (app(AppState::new(tracking.clone())), tracking)
}

/// Connect to `DATABASE_URL`, run migrations and return a facade scoped to a
/// fresh restaurant code so tests do not see each other's rows.
///
/// # Panics
///
/// Panics if `DATABASE_URL` is unset or the database is unreachable.
pub async fn pg_tracking() -> (CustomerTracking<PgStore>, RestaurantCode) {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = postgres::create_pool(&SecretString::from(url))
        .await
        .expect("Failed to connect to database");
    let store = PgStore::new(pool);
    store.migrate().await.expect("Failed to run migrations");

    let code = format!("TEST{}", casanova_core::CustomerId::generate().as_uuid().simple());
    let restaurant = RestaurantCode::new(&code).expect("non-blank restaurant code");
    (
        CustomerTracking::new(store, TrackingConfig::default()),
        restaurant,
    )
}
