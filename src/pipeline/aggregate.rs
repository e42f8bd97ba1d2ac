//! Batch aggregation.
//!
//! Everything here is recomputed from scratch per batch; nothing accumulates
//! across polls. The newest-first presentation order is decided in this
//! module and nowhere else.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::config;
use crate::models::{
    BatchSummary, Event, HeatPoint, ImpactAssessment, ImpactTier, MagnitudeHistogram,
};
use crate::regions::{RegionCatalog, RegionFilter};

// ---

/// Sort a batch newest first. The sort is stable, so same-instant events keep
/// their feed order.
pub fn sort_newest_first(mut events: Vec<Event>) -> Vec<Event> {
    // ---
    events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    events
}

/// Per-UTC-day event counts. Shared by the batch summary and the historical
/// range queries.
pub fn daily_counts(events: &[Event]) -> BTreeMap<NaiveDate, usize> {
    // ---
    let mut counts = BTreeMap::new();
    for event in events {
        *counts.entry(event.timestamp.date_naive()).or_insert(0) += 1;
    }
    counts
}

/// Heat-map points for an event subset, in iteration order.
pub fn heat_points<'a>(events: impl IntoIterator<Item = &'a Event>) -> Vec<HeatPoint> {
    events.into_iter().map(HeatPoint::from).collect()
}

/// Events passing the region filter, in input order.
pub fn filter_by_region(events: &[Event], filter: RegionFilter) -> Vec<Event> {
    // ---
    events
        .iter()
        .filter(|event| filter.matches(&event.region_tags))
        .cloned()
        .collect()
}

// ---

/// Build the batch summary in a single pass over the events.
///
/// `reference` anchors the rolling week: an event counts as recent when it is
/// strictly newer than `reference` minus seven days. An empty batch degrades
/// to zero counts, 0.0 magnitudes, and the `"None"` area sentinel.
///
/// The most active area is the modal final comma-separated segment of the
/// place strings; ties resolve to the area seen first in input order, which
/// under the newest-first sort means the most recently active one.
pub fn summarize(
    events: &[Event],
    catalog: &RegionCatalog,
    reference: DateTime<Utc>,
) -> BatchSummary {
    // ---
    let week_floor = reference - Duration::days(config::ROLLING_WINDOW_DAYS);

    let mut region_counts: BTreeMap<_, usize> = catalog
        .definitions()
        .iter()
        .map(|definition| (definition.id, 0))
        .collect();
    let mut daily: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    let mut histogram = MagnitudeHistogram::default();
    let mut area_counts: HashMap<&str, (usize, usize)> = HashMap::new();

    let mut largest: f64 = 0.0;
    let mut magnitude_sum = 0.0;
    let mut depth_sum = 0.0;
    let mut past_week = 0usize;

    for (index, event) in events.iter().enumerate() {
        largest = largest.max(event.magnitude);
        magnitude_sum += event.magnitude;
        depth_sum += event.depth_km;
        histogram.record(event.magnitude);

        if event.timestamp > week_floor {
            past_week += 1;
        }

        *daily.entry(event.timestamp.date_naive()).or_insert(0) += 1;

        for tag in &event.region_tags {
            *region_counts.entry(*tag).or_insert(0) += 1;
        }

        if let Some(area) = event.place_suffix() {
            area_counts
                .entry(area)
                .and_modify(|(_, count)| *count += 1)
                .or_insert((index, 1));
        }
    }

    let most_active_area = area_counts
        .iter()
        .max_by_key(|(_, (first_seen, count))| (*count, std::cmp::Reverse(*first_seen)))
        .map(|(area, _)| (*area).to_string())
        .unwrap_or_else(|| "None".to_string());

    let total_events = events.len();
    let (average_magnitude, average_depth_km) = if total_events == 0 {
        (0.0, 0.0)
    } else {
        let denominator = total_events as f64;
        (magnitude_sum / denominator, depth_sum / denominator)
    };

    BatchSummary {
        total_events,
        largest_magnitude: largest,
        average_magnitude,
        average_depth_km,
        most_active_area,
        past_week_count: past_week,
        region_counts,
        daily_counts: daily,
        magnitude_histogram: histogram,
    }
}

// ---

/// Whether an event clears the significance thresholds: the global floor, or
/// the lower in-region floor when the active filter matches it. Significance
/// is unrelated to alert eligibility.
pub fn is_significant(event: &Event, filter: RegionFilter) -> bool {
    // ---
    event.magnitude >= config::SIGNIFICANT_MAGNITUDE_GLOBAL
        || (filter.matches(&event.region_tags)
            && event.magnitude >= config::SIGNIFICANT_MAGNITUDE_IN_REGION)
}

/// Impact view over a batch: how many events are significant, the strongest
/// of them (first encountered wins a magnitude tie), and the tier its
/// magnitude falls in. No significant events means `Limited`.
pub fn assess_impact(events: &[Event], filter: RegionFilter) -> ImpactAssessment {
    // ---
    let mut significant_count = 0usize;
    let mut most_significant: Option<&Event> = None;

    for event in events {
        if !is_significant(event, filter) {
            continue;
        }
        significant_count += 1;
        let stronger = most_significant
            .map(|best| event.magnitude > best.magnitude)
            .unwrap_or(true);
        if stronger {
            most_significant = Some(event);
        }
    }

    let tier = most_significant
        .map(|event| ImpactTier::from_magnitude(event.magnitude))
        .unwrap_or(ImpactTier::Limited);

    ImpactAssessment {
        significant_count,
        most_significant: most_significant.cloned(),
        tier,
    }
}
