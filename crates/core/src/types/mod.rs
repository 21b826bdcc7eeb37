//! Core types for Casanova.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod phone;
pub mod restaurant;
pub mod status;

pub use email::{EmailError, NormalizedEmail};
pub use id::*;
pub use phone::{CountryCode, NormalizedPhone, PhoneError};
pub use restaurant::RestaurantCode;
pub use status::{ReservationStatus, StatusError};
