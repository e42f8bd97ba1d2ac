//! Persisted alert policy endpoint (`GET` and `PUT /preferences`).
//!
//! The policy is the `{region_filter, min_magnitude}` pair the alert
//! evaluator runs under. Reads fall back to the built-in defaults when
//! nothing has been stored; a corrupt stored value also serves defaults
//! rather than failing the request, since the next PUT repairs it.

use axum::{
    extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router,
};
use tracing::{error, info, warn};

use super::AppState;
use crate::error::StoreError;
use crate::models::AlertPolicy;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/preferences", get(get_handler).put(put_handler))
}

async fn get_handler(State(state): State<AppState>) -> impl IntoResponse {
    // ---
    info!("GET /preferences");

    match state.store.load_policy().await {
        Ok(Some(policy)) => (StatusCode::OK, Json(policy)).into_response(),
        Ok(None) => (StatusCode::OK, Json(AlertPolicy::default())).into_response(),
        Err(StoreError::Corrupt { .. }) => {
            warn!("Stored preferences are corrupt, serving defaults");
            (StatusCode::OK, Json(AlertPolicy::default())).into_response()
        }
        Err(e) => {
            error!("Failed to load preferences: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json("Failed to load preferences"),
            )
                .into_response()
        }
    }
}

async fn put_handler(
    State(state): State<AppState>,
    Json(policy): Json<AlertPolicy>,
) -> impl IntoResponse {
    // ---
    info!(
        "PUT /preferences - region {}, min magnitude {}",
        policy.region_filter, policy.min_magnitude
    );

    if !(policy.min_magnitude.is_finite() && policy.min_magnitude >= 0.0) {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json("min_magnitude must be a non-negative number"),
        )
            .into_response();
    }

    if let Err(e) = state.store.save_policy(&policy).await {
        error!("Failed to save preferences: {e}");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json("Failed to save preferences"),
        )
            .into_response();
    }

    (StatusCode::OK, Json(policy)).into_response()
}
