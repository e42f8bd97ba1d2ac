//! Region classification.
//!
//! Tags each event with every catalog region containing its epicenter. Tags
//! are always recomputed from the coordinates, so stale tags cannot survive a
//! pass and running the classifier twice is a no-op.

use crate::models::Event;
use crate::regions::RegionCatalog;

// ---

/// Repopulate `region_tags` from the event's coordinates.
pub fn classify(mut event: Event, catalog: &RegionCatalog) -> Event {
    // ---
    event.region_tags = catalog.regions_containing(event.latitude, event.longitude);
    event
}

/// Classify a whole batch, preserving order.
pub fn classify_batch(events: Vec<Event>, catalog: &RegionCatalog) -> Vec<Event> {
    // ---
    events
        .into_iter()
        .map(|event| classify(event, catalog))
        .collect()
}
