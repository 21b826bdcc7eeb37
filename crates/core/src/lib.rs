//! Casanova Core - Shared types library.
//!
//! This crate provides common types used across all Casanova components:
//! - `tracking` - Customer identity resolution and reliability history
//! - `server` - HTTP surface called by the reservation subsystem
//! - `cli` - Command-line tools for migrations and operator lookups
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, normalized contact values,
//!   restaurant codes, and reservation statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
