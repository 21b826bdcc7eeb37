//! Customer tracking handlers.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use casanova_core::CustomerId;
use casanova_tracking::{Customer, HistorySummary};

use crate::error::{AppError, Result};
use crate::state::{AppState, Store};

/// Build the customers router.
pub fn router<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/customers/track", post(track::<S>))
        .route("/customers/lookup", get(lookup::<S>))
}

/// A reservation that was just created by the reservation subsystem.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackRequest {
    pub restaurant_code: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub name: String,
    pub date: NaiveDate,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackResponse {
    /// `null` when tracking was skipped or failed.
    pub customer_id: Option<CustomerId>,
}

/// Record a reservation against its customer.
///
/// Always succeeds: tracking must never fail reservation creation.
pub async fn track<S: Store>(
    State(state): State<AppState<S>>,
    Json(body): Json<TrackRequest>,
) -> Json<TrackResponse> {
    let tracking = state.tracking();
    let restaurant = tracking.restaurant(body.restaurant_code.as_deref());
    let contact = tracking.contact(&body.email, &body.phone);

    let customer_id = tracking
        .ledger()
        .record_reservation(&restaurant, &contact, &body.name, body.date)
        .await;

    Json(TrackResponse { customer_id })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupQuery {
    pub restaurant_code: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LookupResponse {
    pub customer: Customer,
    pub history: HistorySummary,
}

/// Look up a customer by email and/or phone.
///
/// # Errors
///
/// Returns 400 if neither field is usable, 404 if no customer matches, and
/// 503 if the store is unreachable.
pub async fn lookup<S: Store>(
    State(state): State<AppState<S>>,
    Query(query): Query<LookupQuery>,
) -> Result<Json<LookupResponse>> {
    let tracking = state.tracking();
    let restaurant = tracking.restaurant(query.restaurant_code.as_deref());
    let contact = tracking.contact(&query.email, &query.phone);

    let customer = tracking
        .lookup(&restaurant, &contact)
        .await?
        .ok_or_else(|| AppError::NotFound("customer".to_string()))?;

    Ok(Json(LookupResponse {
        history: customer.history(),
        customer,
    }))
}
