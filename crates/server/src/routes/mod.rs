//! HTTP routes.
//!
//! ```text
//! GET  /health                        liveness
//! GET  /health/ready                  store ping
//! POST /customers/track               record a reservation against its customer
//! GET  /customers/lookup              customer and history by email/phone
//! GET  /reservations                  reservation feed with customer history
//! PUT  /reservations/{id}/status      set a status other than no_show
//! POST /reservations/{id}/no-show     guarded no-show
//! ```
//!
//! Every route accepts an optional `restaurantCode`, falling back to the
//! configured default restaurant.

pub mod customers;
pub mod reservations;

use axum::{Router, extract::State, http::StatusCode, routing::get};
use serde::Deserialize;

use crate::state::{AppState, Store};

/// Build the full router (without the Sentry and tracing layers).
pub fn routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness::<S>))
        .merge(customers::router())
        .merge(reservations::router())
}

/// Restaurant scoping shared by query strings and bodies.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantParam {
    pub restaurant_code: Option<String>,
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the customer store is not reachable.
async fn readiness<S: Store>(State(state): State<AppState<S>>) -> StatusCode {
    let timeout = state.tracking().config().store_timeout;
    match tokio::time::timeout(timeout, state.tracking().store().ping()).await {
        Ok(Ok(())) => StatusCode::OK,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
        Err(_) => {
            tracing::warn!("Readiness check timed out");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
