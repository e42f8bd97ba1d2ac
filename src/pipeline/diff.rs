//! Batch-over-batch change detection.
//!
//! Appearance-oriented: reports events present now that were absent from the
//! previous batch, and says nothing about events that disappeared.

use std::collections::HashSet;

use crate::models::Event;

// ---

/// Events in `current` whose id did not occur in `previous`, in current-batch
/// order. Membership is checked against a set of previous ids, one pass each
/// over both slices.
pub fn new_events(previous: &[Event], current: &[Event]) -> Vec<Event> {
    // ---
    let seen: HashSet<&str> = previous.iter().map(|event| event.id.as_str()).collect();

    current
        .iter()
        .filter(|event| !seen.contains(event.id.as_str()))
        .cloned()
        .collect()
}
