//! Reservation feed and status handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};

use casanova_core::{CustomerId, ReservationId, ReservationStatus};
use casanova_tracking::{Customer, CustomerUpdate, NoShowOutcome, Reservation, ReservationWithHistory};

use super::RestaurantParam;
use crate::error::{AppError, Result};
use crate::state::{AppState, Store};

/// Build the reservations router.
pub fn router<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/reservations", get(feed::<S>))
        .route("/reservations/{id}/status", put(update_status::<S>))
        .route("/reservations/{id}/no-show", post(no_show::<S>))
}

fn parse_reservation_id(raw: &str) -> Result<ReservationId> {
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("invalid reservation id: {raw}")))
}

/// Reservations of a restaurant, newest first, with customer history.
///
/// # Errors
///
/// Returns 503 if the reservations cannot be listed.
pub async fn feed<S: Store>(
    State(state): State<AppState<S>>,
    Query(param): Query<RestaurantParam>,
) -> Result<Json<Vec<ReservationWithHistory>>> {
    let tracking = state.tracking();
    let restaurant = tracking.restaurant(param.restaurant_code.as_deref());
    Ok(Json(tracking.projector().feed(&restaurant).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest {
    pub restaurant_code: Option<String>,
    pub status: String,
}

/// Set a reservation's status.
///
/// # Errors
///
/// Returns 400 for an unknown status or `no_show`, 404 for an unknown
/// reservation.
pub async fn update_status<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    Json(body): Json<StatusRequest>,
) -> Result<Json<Reservation>> {
    let id = parse_reservation_id(&id)?;
    let status: ReservationStatus = body
        .status
        .parse()
        .map_err(|e| AppError::BadRequest(format!("{e}")))?;

    let tracking = state.tracking();
    let restaurant = tracking.restaurant(body.restaurant_code.as_deref());
    let reservation = tracking
        .recorder()
        .update_status(&restaurant, id, status)
        .await?;

    Ok(Json(reservation))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoShowRequest {
    pub restaurant_code: Option<String>,
    pub customer_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoShowResult {
    Recorded,
    AlreadyRecorded,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerResult {
    Incremented,
    Skipped,
    Failed,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NoShowResponse {
    pub result: NoShowResult,
    pub reservation: Reservation,
    /// Absent when the reservation was already a no-show.
    pub customer_update: Option<CustomerResult>,
    pub customer: Option<Customer>,
}

impl From<NoShowOutcome> for NoShowResponse {
    fn from(outcome: NoShowOutcome) -> Self {
        match outcome {
            NoShowOutcome::AlreadyRecorded(reservation) => Self {
                result: NoShowResult::AlreadyRecorded,
                reservation,
                customer_update: None,
                customer: None,
            },
            NoShowOutcome::Recorded {
                reservation,
                customer,
            } => {
                let (customer_update, customer) = match customer {
                    CustomerUpdate::Incremented(c) => (CustomerResult::Incremented, Some(c)),
                    CustomerUpdate::Skipped => (CustomerResult::Skipped, None),
                    CustomerUpdate::Failed(_) => (CustomerResult::Failed, None),
                };
                Self {
                    result: NoShowResult::Recorded,
                    reservation,
                    customer_update: Some(customer_update),
                    customer,
                }
            }
        }
    }
}

/// Mark a reservation as a no-show, counting it against its customer once.
///
/// The customer defaults to the one linked on the reservation. Repeating the
/// call is harmless.
///
/// # Errors
///
/// Returns 400 if the reservation cannot become a no-show from its current
/// status, 404 for an unknown reservation.
pub async fn no_show<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    body: Option<Json<NoShowRequest>>,
) -> Result<Json<NoShowResponse>> {
    let id = parse_reservation_id(&id)?;
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let customer_id = body
        .customer_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<CustomerId>()
                .map_err(|_| AppError::BadRequest(format!("invalid customer id: {s}")))
        })
        .transpose()?;

    let tracking = state.tracking();
    let restaurant = tracking.restaurant(body.restaurant_code.as_deref());
    let outcome = tracking
        .recorder()
        .mark_no_show_once(&restaurant, id, customer_id)
        .await?;

    Ok(Json(outcome.into()))
}
