//! Casanova customer tracking.
//!
//! Resolves repeat customers across reservations that carry only loose
//! contact data (email and/or phone), and keeps a running reliability
//! history (total visits, no-shows) per resolved customer.
//!
//! # Components
//!
//! - [`matcher::IdentityMatcher`] - finds at most one customer for a contact,
//!   email before phone
//! - [`ledger::CustomerLedger`] - create-or-increment on every new reservation,
//!   best-effort relative to reservation creation
//! - [`recorder::OutcomeRecorder`] - status changes, folding no-shows into the
//!   customer's counters
//! - [`projector::HistoryProjector`] - attaches a derived history summary to a
//!   reservation feed
//!
//! All of them talk to storage through the [`store::CustomerStore`] and
//! [`store::ReservationStore`] traits. [`store::PgStore`] is the production
//! implementation, [`store::InMemoryStore`] the test double.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod contact;
pub mod error;
pub mod ledger;
pub mod matcher;
pub mod models;
pub mod projector;
pub mod recorder;
pub mod store;
pub mod tracking;

pub use config::{ConfigError, TrackingConfig};
pub use contact::Contact;
pub use error::TrackingError;
pub use ledger::{CustomerLedger, LedgerOutcome};
pub use matcher::IdentityMatcher;
pub use models::{
    Counter, Customer, HistorySummary, NewCustomer, NewReservation, Reservation,
    ReservationWithHistory,
};
pub use projector::HistoryProjector;
pub use recorder::{CustomerUpdate, NoShowOutcome, OutcomeRecorder};
pub use store::{CustomerStore, InMemoryStore, PgStore, ReservationStore, StoreError};
pub use tracking::CustomerTracking;
