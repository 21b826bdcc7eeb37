//! Customer lookup.

use serde_json::json;

use super::{CommandError, print_json, tracking};

/// Print the customer matching `email` and/or `phone` with their history.
///
/// # Errors
///
/// Returns `CommandError::InvalidArgument` if neither field is usable and
/// `CommandError::Tracking` if the store cannot be reached.
pub async fn lookup(email: &str, phone: &str, restaurant: Option<&str>) -> Result<(), CommandError> {
    let tracking = tracking().await?;
    let restaurant = tracking.restaurant(restaurant);
    let contact = tracking.contact(email, phone);
    if contact.is_empty() {
        return Err(CommandError::InvalidArgument(
            "pass a valid --email or --phone".to_string(),
        ));
    }

    match tracking.lookup(&restaurant, &contact).await? {
        Some(customer) => print_json(&json!({
            "history": customer.history(),
            "customer": customer,
        })),
        None => {
            tracing::info!(%restaurant, "No matching customer");
            print_json(&serde_json::Value::Null)
        }
    }
}
