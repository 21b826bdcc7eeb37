//! Domain models for customer tracking.

pub mod customer;
pub mod reservation;

pub use customer::{Counter, Customer, HistorySummary, NewCustomer};
pub use reservation::{NewReservation, Reservation, ReservationWithHistory};
