//! Route gateway for the `quakeflow` API (EMBP).
//!
//! Each endpoint lives in its own sibling module and exports a subrouter;
//! this gateway merges them and owns the shared [`AppState`], so `main.rs`
//! never needs to know about individual endpoints.

use std::sync::Arc;

use axum::Router;
use tokio::sync::Mutex;

use crate::feed::FeedClient;
use crate::pipeline::PipelineState;
use crate::regions::RegionCatalog;
use crate::store::StateStore;

mod export;
mod health;
mod history;
mod preferences;
mod quakes;

// ---

/// Shared application state handed to every route.
///
/// The pipeline state sits behind an async mutex because a batch run is a
/// read-evaluate-record-persist critical section; the lock stays held across
/// the ledger write so two concurrent polls cannot interleave their alerts.
#[derive(Clone)]
pub struct AppState {
    // ---
    pub store: Arc<dyn StateStore>,
    pub feed: FeedClient,
    pub catalog: Arc<RegionCatalog>,
    pub pipeline: Arc<Mutex<PipelineState>>,
}

pub fn router(state: AppState) -> Router {
    // ---
    Router::new()
        .merge(quakes::router())
        .merge(history::router())
        .merge(export::router())
        .merge(preferences::router())
        .merge(health::router())
        .with_state(state)
}
