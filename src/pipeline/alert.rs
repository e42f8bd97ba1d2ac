//! Alert evaluation over newly appeared events.
//!
//! An event alerts when the active [`AlertPolicy`] permits it and its id is
//! not already in the notified ledger. At most [`MAX_ALERTS_PER_BATCH`] alerts
//! leave a single pass; events cut by the cap are not written to the ledger,
//! so they stay eligible on the next pass. The ledger itself is bounded and
//! evicts its oldest ids first.

use std::collections::VecDeque;

use crate::config::{MAX_ALERTS_PER_BATCH, NOTIFIED_LEDGER_BOUND};
use crate::models::{AlertPolicy, Event};

// ---

/// Insertion-ordered record of event ids that have already alerted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotifiedLedger {
    ids: VecDeque<String>,
}

impl NotifiedLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted ids, oldest first. Anything beyond the bound is
    /// dropped from the old end.
    pub fn from_ids(ids: Vec<String>) -> Self {
        // ---
        let mut ids: VecDeque<String> = ids.into();
        while ids.len() > NOTIFIED_LEDGER_BOUND {
            ids.pop_front();
        }
        Self { ids }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|known| known == id)
    }

    /// Record an alerted id, evicting the oldest entry when full.
    pub fn record(&mut self, id: String) {
        // ---
        if self.ids.len() == NOTIFIED_LEDGER_BOUND {
            self.ids.pop_front();
        }
        self.ids.push_back(id);
    }

    /// Ids oldest first, for persistence.
    pub fn to_ids(&self) -> Vec<String> {
        self.ids.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

// ---

/// Select the alerts for one batch of new events.
///
/// Qualifying events are recorded in the ledger as they are selected; the
/// caller persists the ledger afterwards if anything was selected.
pub fn evaluate_alerts(
    new_events: &[Event],
    policy: &AlertPolicy,
    ledger: &mut NotifiedLedger,
) -> Vec<Event> {
    // ---
    let mut alerts = Vec::new();

    for event in new_events {
        if alerts.len() >= MAX_ALERTS_PER_BATCH {
            break;
        }
        if ledger.contains(&event.id) {
            continue;
        }
        if !policy.permits(event) {
            continue;
        }

        ledger.record(event.id.clone());
        alerts.push(event.clone());
    }

    alerts
}
