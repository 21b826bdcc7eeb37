//! Reservation outcome commands.

use serde_json::json;

use casanova_core::{CustomerId, ReservationId};
use casanova_tracking::{CustomerUpdate, NoShowOutcome};

use super::{CommandError, print_json, tracking};

/// Mark a reservation as a no-show, counting it against the customer once.
///
/// # Errors
///
/// Returns `CommandError::InvalidArgument` for malformed ids and
/// `CommandError::Tracking` if the reservation is unknown or cannot become a
/// no-show.
pub async fn no_show(
    id: &str,
    customer: Option<&str>,
    restaurant: Option<&str>,
) -> Result<(), CommandError> {
    let reservation_id: ReservationId = id
        .parse()
        .map_err(|_| CommandError::InvalidArgument(format!("invalid reservation id: {id}")))?;
    let customer_id = customer
        .map(|c| {
            c.parse::<CustomerId>()
                .map_err(|_| CommandError::InvalidArgument(format!("invalid customer id: {c}")))
        })
        .transpose()?;

    let tracking = tracking().await?;
    let restaurant = tracking.restaurant(restaurant);

    let outcome = tracking
        .recorder()
        .mark_no_show_once(&restaurant, reservation_id, customer_id)
        .await?;

    let summary = match outcome {
        NoShowOutcome::AlreadyRecorded(reservation) => {
            tracing::info!(%reservation_id, "Already a no-show, nothing counted");
            json!({ "result": "already_recorded", "reservation": reservation })
        }
        NoShowOutcome::Recorded {
            reservation,
            customer,
        } => {
            let customer = match customer {
                CustomerUpdate::Incremented(c) => json!({ "incremented": c.history(), "id": c.id }),
                CustomerUpdate::Skipped => json!("skipped"),
                CustomerUpdate::Failed(reason) => {
                    tracing::warn!(%reservation_id, %reason, "Customer counter not updated");
                    json!({ "failed": reason })
                }
            };
            json!({ "result": "recorded", "reservation": reservation, "customer": customer })
        }
    };

    print_json(&summary)
}
