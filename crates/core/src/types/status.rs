//! Reservation status and its transition rules.

use serde::{Deserialize, Serialize};

/// Error parsing a [`ReservationStatus`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid reservation status: {0}")]
pub struct StatusError(pub String);

/// Lifecycle status of a reservation.
///
/// ```text
/// pending ──► confirmed ──► seated ──► completed
///    │  ▲         │
///    │  └─────────┤
///    ├────────────┴──► cancelled
///    └────────────┴──► no_show
/// ```
///
/// `cancelled`, `no_show` and `completed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    #[default]
    Pending,
    Confirmed,
    Seated,
    Completed,
    Cancelled,
    NoShow,
}

impl ReservationStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::Confirmed,
        Self::Seated,
        Self::Completed,
        Self::Cancelled,
        Self::NoShow,
    ];

    /// Statuses a reservation may be in when it is marked as a no-show.
    pub const NO_SHOW_SOURCES: [Self; 2] = [Self::Pending, Self::Confirmed];

    /// Statuses an operator may set through a plain status update.
    ///
    /// `no_show` is excluded: it has to go through the outcome recorder so the
    /// customer's counter is folded in.
    pub const OPERATOR_SETTABLE: [Self; 5] = [
        Self::Pending,
        Self::Confirmed,
        Self::Seated,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::NoShow)
    }

    /// Whether `self -> next` is a valid lifecycle transition.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (
                Self::Pending,
                Self::Confirmed | Self::Cancelled | Self::NoShow
            ) | (
                Self::Confirmed,
                Self::Pending | Self::Seated | Self::Cancelled | Self::NoShow
            ) | (Self::Seated, Self::Completed)
        )
    }

    /// The wire/database name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Seated => "seated",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::NoShow => "no_show",
        }
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReservationStatus {
    type Err = StatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| StatusError(s.to_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trips_through_str() {
        for status in ReservationStatus::ALL {
            assert_eq!(status.as_str().parse::<ReservationStatus>().unwrap(), status);
        }
        assert!("noshow".parse::<ReservationStatus>().is_err());
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for from in ReservationStatus::ALL.into_iter().filter(|s| s.is_terminal()) {
            for to in ReservationStatus::ALL {
                assert!(!from.can_transition_to(to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_no_show_sources_match_transition_table() {
        for from in ReservationStatus::ALL {
            assert_eq!(
                from.can_transition_to(ReservationStatus::NoShow),
                ReservationStatus::NO_SHOW_SOURCES.contains(&from),
                "{from}"
            );
        }
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&ReservationStatus::NoShow).unwrap();
        assert_eq!(json, "\"no_show\"");
    }
}
