//! Historical earthquake queries (`GET /earthquakes/history`).
//!
//! Read-only: results are normalized, classified, and sorted the same way as
//! the live feed, but nothing here touches the pipeline state or the
//! notified ledger.

use std::collections::BTreeMap;

use axum::{
    extract::Query, extract::State, http::StatusCode, response::IntoResponse, routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::AppState;
use crate::config;
use crate::models::Event;
use crate::pipeline;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/earthquakes/history", get(handler))
}

/// Query parameters for a historical range.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    // ---
    /// First day of the range (YYYY-MM-DD).
    start_date: NaiveDate,
    /// Last day of the range (YYYY-MM-DD); passed to the upstream API as the
    /// exclusive end instant.
    end_date: NaiveDate,
    /// Magnitude floor (default: 4.0).
    min_magnitude: Option<f64>,
}

#[derive(Serialize)]
struct HistoryResponse {
    // ---
    count: usize,
    dropped_records: usize,
    events: Vec<Event>,
    daily_counts: BTreeMap<NaiveDate, usize>,
}

async fn handler(
    Query(params): Query<HistoryQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    // ---
    info!(
        "GET /earthquakes/history - {} to {}",
        params.start_date, params.end_date
    );

    if params.end_date < params.start_date {
        return (
            StatusCode::BAD_REQUEST,
            Json("end_date must not precede start_date"),
        )
            .into_response();
    }

    let min_magnitude = params
        .min_magnitude
        .filter(|magnitude| magnitude.is_finite())
        .unwrap_or(config::DEFAULT_HISTORY_MIN_MAGNITUDE);

    let features = match state
        .feed
        .query_range(params.start_date, params.end_date, min_magnitude)
        .await
    {
        Ok(features) => features,
        Err(e) => {
            error!("Historical query failed: {e}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json("Failed to fetch historical data"),
            )
                .into_response();
        }
    };

    let (events, dropped_records) = pipeline::normalize_batch(&features);
    let events = pipeline::classify_batch(events, &state.catalog);
    let events = pipeline::sort_newest_first(events);
    let daily_counts = pipeline::daily_counts(&events);

    info!("Returning {} historical events", events.len());
    (
        StatusCode::OK,
        Json(HistoryResponse {
            count: events.len(),
            dropped_records,
            events,
            daily_counts,
        }),
    )
        .into_response()
}
