//! The earthquake batch pipeline.
//!
//! One call to [`run_batch`] takes a raw feature array through normalization,
//! the optional depth window, region classification, change detection,
//! aggregation, and alert evaluation. The pipeline does no I/O of its own:
//! feed fetching and ledger persistence belong to the caller, which also
//! holds the lock around [`PipelineState`] so the read-evaluate-record cycle
//! stays a single critical section.

mod aggregate;
mod alert;
mod classify;
mod diff;
mod normalize;

pub use aggregate::{
    assess_impact, daily_counts, filter_by_region, heat_points, is_significant,
    sort_newest_first, summarize,
};
pub use alert::{evaluate_alerts, NotifiedLedger};
pub use classify::{classify, classify_batch};
pub use diff::new_events;
pub use normalize::{normalize, normalize_batch};

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::models::{AlertPolicy, BatchSummary, Event, ImpactAssessment};
use crate::regions::RegionCatalog;

// ---

/// Mutable pipeline memory carried between polls.
///
/// `previous` is `None` until the first batch lands; a first batch never
/// alerts because there is nothing to compare against. `last_fetched_at`
/// records the reference instant of that batch so cached responses can say
/// how stale they are.
#[derive(Debug, Default)]
pub struct PipelineState {
    // ---
    pub previous: Option<Vec<Event>>,
    pub last_fetched_at: Option<DateTime<Utc>>,
    pub ledger: NotifiedLedger,
}

/// Optional depth window, in kilometers, applied right after normalization.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DepthFilter {
    // ---
    pub min_km: Option<f64>,
    pub max_km: Option<f64>,
}

impl DepthFilter {
    pub fn accepts(&self, depth_km: f64) -> bool {
        // ---
        self.min_km.is_none_or(|min| depth_km >= min)
            && self.max_km.is_none_or(|max| depth_km <= max)
    }
}

/// Everything one batch produces.
#[derive(Debug)]
pub struct PipelineRun {
    // ---
    pub events: Vec<Event>,
    pub summary: BatchSummary,
    pub impact: ImpactAssessment,
    pub alerts: Vec<Event>,
    pub new_count: usize,
    pub dropped_records: usize,
}

/// Run one batch through the full pipeline and commit it to `state`.
///
/// Malformed records are skipped and counted, never fatal. Alerts are
/// evaluated only against events that appeared since the previous batch, and
/// the ledger is updated in place; the caller decides whether to persist it.
pub fn run_batch(
    state: &mut PipelineState,
    features: &[Value],
    catalog: &RegionCatalog,
    policy: &AlertPolicy,
    depth: DepthFilter,
    reference: DateTime<Utc>,
) -> PipelineRun {
    // ---
    let (mut events, dropped_records) = normalize::normalize_batch(features);
    events.retain(|event| depth.accepts(event.depth_km));
    let events = classify::classify_batch(events, catalog);
    let events = aggregate::sort_newest_first(events);

    let (alerts, new_count) = match state.previous.as_deref() {
        Some(previous) => {
            let fresh = diff::new_events(previous, &events);
            let alerts = alert::evaluate_alerts(&fresh, policy, &mut state.ledger);
            (alerts, fresh.len())
        }
        // First batch: nothing to diff against, so nothing alerts.
        None => (Vec::new(), 0),
    };

    let summary = aggregate::summarize(&events, catalog, reference);
    let impact = aggregate::assess_impact(&events, policy.region_filter);

    state.previous = Some(events.clone());
    state.last_fetched_at = Some(reference);

    PipelineRun {
        events,
        summary,
        impact,
        alerts,
        new_count,
        dropped_records,
    }
}
