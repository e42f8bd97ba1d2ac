//! Live earthquake pipeline endpoint (`GET /earthquakes`).
//!
//! Fetches the requested summary feed, runs the batch pipeline under the
//! shared state lock, persists the notified ledger when alerts fired, and
//! returns the classified events with their aggregates. When both feed
//! attempts fail the last good batch is re-served with `source: "cache"`;
//! with no cached batch at all the endpoint answers 503.

use axum::{
    extract::Query, extract::State, http::StatusCode, response::IntoResponse,
    response::Response, routing::get, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::AppState;
use crate::feed::{MagnitudeBand, TimeWindow};
use crate::models::{
    AlertPolicy, BatchSummary, Event, HeatPoint, ImpactAssessment, MagnitudeHistogram,
};
use crate::pipeline::{self, DepthFilter, PipelineRun};
use crate::regions::RegionFilter;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/earthquakes", get(handler))
}

/// Query parameters for the live feed endpoint.
#[derive(Debug, Deserialize)]
pub struct QuakesQuery {
    // ---
    /// Rolling feed window (default: day).
    #[serde(default)]
    window: TimeWindow,
    /// Feed magnitude band (default: 2.5).
    #[serde(default)]
    magnitude: MagnitudeBand,
    /// Optional depth window in km, inclusive on both ends.
    min_depth: Option<f64>,
    max_depth: Option<f64>,
}

#[derive(Serialize)]
struct QuakesResponse {
    // ---
    source: &'static str,
    fetched_at: DateTime<Utc>,
    region_filter: RegionFilter,
    summary: BatchSummary,
    /// Bucket labels matching `summary.magnitude_histogram`, for chart axes.
    histogram_labels: [&'static str; 6],
    impact: ImpactAssessment,
    filtered_count: usize,
    events: Vec<Event>,
    heat_points: Vec<HeatPoint>,
    new_count: usize,
    dropped_records: usize,
    alerts: Vec<Event>,
}

async fn handler(
    Query(params): Query<QuakesQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    // ---
    info!("GET /earthquakes - Starting pipeline");

    let depth = DepthFilter {
        min_km: params.min_depth.filter(|d| d.is_finite()),
        max_km: params.max_depth.filter(|d| d.is_finite()),
    };

    // Step 1: Fetch the summary feed
    debug!("GET /earthquakes - Step 1");

    let features = match state.feed.fetch_feed(params.magnitude, params.window).await {
        Ok(features) => features,
        Err(e) => {
            error!("Both feed attempts failed: {e}");
            return serve_cached(&state, depth).await;
        }
    };

    // Step 2: Load the active alert policy
    debug!("GET /earthquakes - Step 2");

    let policy = load_policy_or_default(&state).await;

    // Step 3: Run the batch under the state lock, persisting the ledger
    // before the lock is released so concurrent polls cannot interleave
    debug!("GET /earthquakes - Step 3");

    let now = Utc::now();
    let run = {
        let mut pipeline_state = state.pipeline.lock().await;
        let run = pipeline::run_batch(
            &mut pipeline_state,
            &features,
            &state.catalog,
            &policy,
            depth,
            now,
        );

        if !run.alerts.is_empty() {
            debug!("GET /earthquakes - Step 4: persisting {} alert ids", run.alerts.len());
            let ids = pipeline_state.ledger.to_ids();
            if let Err(e) = state.store.save_ledger_ids(&ids).await {
                warn!("Failed to persist notified ledger: {e}");
            }
        }

        run
    };

    let response = shape_response("live", now, &policy, run);
    info!(
        "Pipeline complete, returning {} events ({} new, {} alerts, {} dropped)",
        response.filtered_count, response.new_count, response.alerts.len(),
        response.dropped_records
    );
    (StatusCode::OK, Json(response)).into_response()
}

// ---

/// Re-serve the last good batch when the feed is unreachable. No alerts are
/// evaluated and no pipeline state changes.
async fn serve_cached(state: &AppState, depth: DepthFilter) -> Response {
    // ---
    let policy = load_policy_or_default(state).await;

    let (previous, fetched_at) = {
        let pipeline_state = state.pipeline.lock().await;
        match (&pipeline_state.previous, pipeline_state.last_fetched_at) {
            (Some(previous), fetched_at) => (previous.clone(), fetched_at.unwrap_or_else(Utc::now)),
            (None, _) => {
                return (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json("Feed unreachable and no cached batch yet"),
                )
                    .into_response();
            }
        }
    };

    let mut events = previous;
    events.retain(|event| depth.accepts(event.depth_km));

    let summary = pipeline::summarize(&events, &state.catalog, Utc::now());
    let impact = pipeline::assess_impact(&events, policy.region_filter);
    let run = PipelineRun {
        events,
        summary,
        impact,
        alerts: Vec::new(),
        new_count: 0,
        dropped_records: 0,
    };

    let response = shape_response("cache", fetched_at, &policy, run);
    info!("Serving cached batch, returning {} events", response.filtered_count);
    (StatusCode::OK, Json(response)).into_response()
}

async fn load_policy_or_default(state: &AppState) -> AlertPolicy {
    // ---
    match state.store.load_policy().await {
        Ok(Some(policy)) => policy,
        Ok(None) => AlertPolicy::default(),
        Err(e) => {
            warn!("Failed to load alert preferences, using defaults: {e}");
            AlertPolicy::default()
        }
    }
}

/// Assemble the response body: the event list and heat map cover the
/// region-filtered subset, while the summary spans the whole batch.
fn shape_response(
    source: &'static str,
    fetched_at: DateTime<Utc>,
    policy: &AlertPolicy,
    run: PipelineRun,
) -> QuakesResponse {
    // ---
    let events = pipeline::filter_by_region(&run.events, policy.region_filter);
    let heat_points = pipeline::heat_points(&events);

    QuakesResponse {
        source,
        fetched_at,
        region_filter: policy.region_filter,
        summary: run.summary,
        histogram_labels: MagnitudeHistogram::LABELS,
        impact: run.impact,
        filtered_count: events.len(),
        events,
        heat_points,
        new_count: run.new_count,
        dropped_records: run.dropped_records,
        alerts: run.alerts,
    }
}
