// src/routes/health.rs
//! Liveness endpoint for the quakeflow backend.
//!
//! `/health` exists for container orchestrators and CI smoke checks. It
//! answers from memory only and touches no database, feed, or pipeline lock.

use axum::{routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Subrouter with the single `GET /health` route, generic over the gateway's
/// state type so it merges cleanly.
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", get(health))
}
