//! Normalized contact keys used to match customers.

use casanova_core::{CountryCode, NormalizedEmail, NormalizedPhone};

/// The match key of a reservation: a normalized email and/or phone.
///
/// Built leniently from raw guest input. A field that does not normalize is
/// dropped (and logged) rather than failing the reservation, so a contact can
/// end up empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Contact {
    pub email: Option<NormalizedEmail>,
    pub phone: Option<NormalizedPhone>,
}

impl Contact {
    #[must_use]
    pub const fn new(email: Option<NormalizedEmail>, phone: Option<NormalizedPhone>) -> Self {
        Self { email, phone }
    }

    /// Normalize raw contact fields. Blank fields are absent; invalid fields
    /// are dropped with a warning.
    #[must_use]
    pub fn from_raw(email: &str, phone: &str, default_country: CountryCode) -> Self {
        let email = if email.trim().is_empty() {
            None
        } else {
            NormalizedEmail::parse(email)
                .inspect_err(|e| tracing::warn!(error = %e, "Dropping invalid contact email"))
                .ok()
        };

        let phone = if phone.trim().is_empty() {
            None
        } else {
            NormalizedPhone::parse(phone, default_country)
                .inspect_err(|e| tracing::warn!(error = %e, "Dropping invalid contact phone"))
                .ok()
        };

        Self { email, phone }
    }

    /// Whether neither field is usable as a match key.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.email.is_none() && self.phone.is_none()
    }
}
