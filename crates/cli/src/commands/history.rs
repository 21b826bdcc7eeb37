//! Reservation feed with customer history.

use super::{CommandError, print_json, tracking};

/// Print every reservation of the restaurant, newest first, one JSON object
/// per line.
///
/// # Errors
///
/// Returns `CommandError::Tracking` if the reservations cannot be listed.
pub async fn print(restaurant: Option<&str>) -> Result<(), CommandError> {
    let tracking = tracking().await?;
    let restaurant = tracking.restaurant(restaurant);

    let feed = tracking.projector().feed(&restaurant).await?;
    tracing::info!(%restaurant, count = feed.len(), "Loaded reservation feed");

    for item in &feed {
        print_json(item)?;
    }
    Ok(())
}
