//! CSV export of the current batch (`GET /earthquakes/export`).
//!
//! Serves the last fetched batch as a CSV attachment. Refuses with 404 when
//! there is nothing to export, either because no batch has been fetched yet
//! or because the last one was empty.

use axum::{
    extract::State, http::header, http::StatusCode, response::IntoResponse, routing::get,
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use tracing::info;

use super::AppState;
use crate::models::Event;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/earthquakes/export", get(handler))
}

async fn handler(State(state): State<AppState>) -> impl IntoResponse {
    // ---
    info!("GET /earthquakes/export");

    let csv = {
        let pipeline_state = state.pipeline.lock().await;
        match pipeline_state.previous.as_deref() {
            None | Some([]) => {
                return (StatusCode::NOT_FOUND, Json("No earthquake data to export"))
                    .into_response();
            }
            Some(events) => to_csv(events),
        }
    };

    let disposition = format!(
        "attachment; filename=\"earthquakes_{}.csv\"",
        Utc::now().date_naive()
    );
    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
        (header::CONTENT_DISPOSITION, disposition),
    ];

    info!("Exporting {} CSV lines", csv.lines().count() - 1);
    (StatusCode::OK, headers, csv).into_response()
}

/// Render events as CSV rows under the fixed header. Place strings are
/// always quoted, with embedded quotes doubled.
fn to_csv(events: &[Event]) -> String {
    // ---
    let mut csv = String::from("Time,Magnitude,Place,Latitude,Longitude,Depth\n");

    for event in events {
        let place = event.place.replace('"', "\"\"");
        csv.push_str(&format!(
            "{},{},\"{}\",{},{},{}\n",
            event.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            event.magnitude,
            place,
            event.latitude,
            event.longitude,
            event.depth_km,
        ));
    }

    csv
}
