//! Domain models for the earthquake pipeline.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::config;
use crate::regions::{RegionFilter, RegionId};

// ---

/// Severity band derived from magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Moderate,
    High,
    Severe,
    Extreme,
}

impl Severity {
    /// Band edges are half-open: the boundary magnitude belongs to the
    /// higher band.
    pub fn from_magnitude(magnitude: f64) -> Self {
        // ---
        if magnitude >= 6.0 {
            Severity::Extreme
        } else if magnitude >= 5.0 {
            Severity::Severe
        } else if magnitude >= 4.0 {
            Severity::High
        } else if magnitude >= 3.0 {
            Severity::Moderate
        } else {
            Severity::Low
        }
    }
}

/// Coarse impact classification reported alongside a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactTier {
    Limited,
    Moderate,
    Severe,
}

impl ImpactTier {
    pub fn from_magnitude(magnitude: f64) -> Self {
        // ---
        if magnitude >= config::SEVERE_IMPACT_MAGNITUDE {
            ImpactTier::Severe
        } else if magnitude >= config::MODERATE_IMPACT_MAGNITUDE {
            ImpactTier::Moderate
        } else {
            ImpactTier::Limited
        }
    }
}

// ---

/// A normalized earthquake event.
///
/// Coordinates come off the wire as `[longitude, latitude, depth]`; here they
/// live under named fields so the order cannot be confused again.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    // ---
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub depth_km: f64,
    pub magnitude: f64,
    pub place: String,
    pub timestamp: DateTime<Utc>,
    pub url: Option<String>,
    pub region_tags: BTreeSet<RegionId>,
    pub severity: Severity,
}

impl Event {
    /// Heat-map weight. Negative magnitudes clamp to zero first so the
    /// fractional exponent never produces a NaN.
    pub fn heat_weight(&self) -> f64 {
        // ---
        self.magnitude.max(0.0).powf(config::HEAT_WEIGHT_EXPONENT) / config::HEAT_WEIGHT_DIVISOR
    }

    /// Last comma-separated segment of `place`, trimmed. `None` when the
    /// place string has nothing after its final comma.
    pub fn place_suffix(&self) -> Option<&str> {
        // ---
        self.place
            .rsplit(',')
            .next()
            .map(str::trim)
            .filter(|suffix| !suffix.is_empty())
    }
}

/// `[latitude, longitude, weight]` triple for the heat-map layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeatPoint(pub f64, pub f64, pub f64);

impl From<&Event> for HeatPoint {
    fn from(event: &Event) -> Self {
        HeatPoint(event.latitude, event.longitude, event.heat_weight())
    }
}

// ---

/// Persisted alert preferences.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertPolicy {
    // ---
    pub region_filter: RegionFilter,
    pub min_magnitude: f64,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            region_filter: config::DEFAULT_REGION_FILTER,
            min_magnitude: config::DEFAULT_MIN_ALERT_MAGNITUDE,
        }
    }
}

impl AlertPolicy {
    /// Whether an event qualifies for an alert under this policy.
    pub fn permits(&self, event: &Event) -> bool {
        // ---
        event.magnitude >= self.min_magnitude && self.region_filter.matches(&event.region_tags)
    }
}

// ---

/// Fixed-bucket magnitude histogram. Serializes as a bare count array so the
/// bucket labels stay an API constant rather than repeated per response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MagnitudeHistogram {
    counts: [usize; 6],
}

impl MagnitudeHistogram {
    pub const LABELS: [&'static str; 6] = ["<2", "2-3", "3-4", "4-5", "5-6", "6+"];

    /// Bucket index for a magnitude. Boundary values land in the higher
    /// bucket, matching [`Severity::from_magnitude`].
    pub fn bucket(magnitude: f64) -> usize {
        // ---
        if magnitude < 2.0 {
            0
        } else if magnitude < 3.0 {
            1
        } else if magnitude < 4.0 {
            2
        } else if magnitude < 5.0 {
            3
        } else if magnitude < 6.0 {
            4
        } else {
            5
        }
    }

    pub fn record(&mut self, magnitude: f64) {
        self.counts[Self::bucket(magnitude)] += 1;
    }

    pub fn counts(&self) -> &[usize; 6] {
        &self.counts
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Aggregate statistics for one batch of events.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    // ---
    pub total_events: usize,
    pub largest_magnitude: f64,
    pub average_magnitude: f64,
    pub average_depth_km: f64,
    pub most_active_area: String,
    pub past_week_count: usize,
    pub region_counts: BTreeMap<RegionId, usize>,
    pub daily_counts: BTreeMap<NaiveDate, usize>,
    pub magnitude_histogram: MagnitudeHistogram,
}

/// Impact view over the significant subset of a batch. Significance is a
/// separate threshold from alerting and the two are never combined.
#[derive(Debug, Clone, Serialize)]
pub struct ImpactAssessment {
    // ---
    pub significant_count: usize,
    pub most_significant: Option<Event>,
    pub tier: ImpactTier,
}

#[cfg(test)]
pub(crate) mod tests {
    // ---
    use super::*;
    use chrono::TimeZone;

    pub(crate) fn create_test_event(id: &str, magnitude: f64, place: &str) -> Event {
        // ---
        Event {
            id: id.to_string(),
            latitude: 21.9,
            longitude: 96.0,
            depth_km: 10.0,
            magnitude,
            place: place.to_string(),
            timestamp: Utc.with_ymd_and_hms(2025, 3, 28, 6, 20, 0).unwrap(),
            url: None,
            region_tags: [RegionId::Myanmar].into_iter().collect(),
            severity: Severity::from_magnitude(magnitude),
        }
    }

    #[test]
    fn test_severity_band_boundaries() {
        // ---
        assert_eq!(Severity::from_magnitude(2.9), Severity::Low);
        assert_eq!(Severity::from_magnitude(3.0), Severity::Moderate);
        assert_eq!(Severity::from_magnitude(3.9), Severity::Moderate);
        assert_eq!(Severity::from_magnitude(4.0), Severity::High);
        assert_eq!(Severity::from_magnitude(5.0), Severity::Severe);
        assert_eq!(Severity::from_magnitude(6.0), Severity::Extreme);
        assert_eq!(Severity::from_magnitude(7.7), Severity::Extreme);
    }

    #[test]
    fn test_impact_tier_boundaries() {
        // ---
        assert_eq!(ImpactTier::from_magnitude(4.9), ImpactTier::Limited);
        assert_eq!(ImpactTier::from_magnitude(5.0), ImpactTier::Moderate);
        assert_eq!(ImpactTier::from_magnitude(5.9), ImpactTier::Moderate);
        assert_eq!(ImpactTier::from_magnitude(6.0), ImpactTier::Severe);
    }

    #[test]
    fn test_heat_weight() {
        // ---
        let event = create_test_event("q1", 5.0, "Myanmar");

        // 5.0^1.8 / 8 is roughly 2.2647
        assert!((event.heat_weight() - 2.2647).abs() < 1e-3);

        // Negative magnitudes clamp to a zero weight instead of NaN
        let micro = create_test_event("q2", -0.4, "Myanmar");
        assert_eq!(micro.heat_weight(), 0.0);
    }

    #[test]
    fn test_heat_point_order_is_lat_lng_weight() {
        // ---
        let event = create_test_event("q1", 4.0, "Myanmar");
        let HeatPoint(lat, lng, weight) = HeatPoint::from(&event);

        assert_eq!(lat, 21.9);
        assert_eq!(lng, 96.0);
        assert!((weight - event.heat_weight()).abs() < f64::EPSILON);
    }

    #[test]
    fn test_place_suffix() {
        // ---
        let full = create_test_event("q1", 4.0, "23 km ENE of Falam, Myanmar");
        assert_eq!(full.place_suffix(), Some("Myanmar"));

        // No comma keeps the whole string
        let bare = create_test_event("q2", 4.0, "Bay of Bengal");
        assert_eq!(bare.place_suffix(), Some("Bay of Bengal"));

        let empty = create_test_event("q3", 4.0, "");
        assert_eq!(empty.place_suffix(), None);

        let trailing = create_test_event("q4", 4.0, "somewhere, ");
        assert_eq!(trailing.place_suffix(), None);
    }

    #[test]
    fn test_histogram_boundaries() {
        // ---
        let mut histogram = MagnitudeHistogram::default();
        for magnitude in [1.9, 2.0, 3.5, 4.0, 5.9, 6.0, 8.2] {
            histogram.record(magnitude);
        }

        assert_eq!(histogram.counts(), &[1, 1, 1, 1, 1, 2]);
        assert_eq!(histogram.total(), 7);

        // A boundary magnitude lands in the higher bucket
        assert_eq!(MagnitudeHistogram::bucket(4.0), 3);
        assert_eq!(MagnitudeHistogram::LABELS[3], "4-5");
    }

    #[test]
    fn test_alert_policy_permits() {
        // ---
        let policy = AlertPolicy::default();
        assert_eq!(policy.min_magnitude, 4.5);
        assert_eq!(policy.region_filter, RegionFilter::Within(RegionId::Myanmar));

        let strong = create_test_event("q1", 5.1, "Myanmar");
        assert!(policy.permits(&strong));

        // Below the magnitude floor
        let weak = create_test_event("q2", 4.4, "Myanmar");
        assert!(!policy.permits(&weak));

        // Outside the filter region
        let mut elsewhere = create_test_event("q3", 6.0, "southern Pacific Ocean");
        elsewhere.region_tags.clear();
        assert!(!policy.permits(&elsewhere));

        let anywhere = AlertPolicy {
            region_filter: RegionFilter::All,
            min_magnitude: 4.5,
        };
        assert!(anywhere.permits(&elsewhere));
    }
}
