//! USGS earthquake feed client.
//!
//! Two data paths: the rolling summary feeds (`{band}_{window}.geojson` under
//! the summary base URL) and the fdsnws query endpoint for historical date
//! ranges. Every attempt runs under the configured timeout budget; summary
//! fetches retry once against the fallback base before the caller falls back
//! to its cached batch.

use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::FeedError;
use crate::Config;

// ---

/// Rolling window of the summary feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeWindow {
    Hour,
    #[default]
    Day,
    Week,
    Month,
}

impl TimeWindow {
    pub fn as_str(&self) -> &'static str {
        // ---
        match self {
            TimeWindow::Hour => "hour",
            TimeWindow::Day => "day",
            TimeWindow::Week => "week",
            TimeWindow::Month => "month",
        }
    }
}

/// Magnitude band of the summary feed, as USGS names them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum MagnitudeBand {
    #[serde(rename = "all")]
    All,
    #[serde(rename = "significant")]
    Significant,
    #[serde(rename = "1.0")]
    M10,
    #[default]
    #[serde(rename = "2.5")]
    M25,
    #[serde(rename = "4.5")]
    M45,
}

impl MagnitudeBand {
    pub fn as_str(&self) -> &'static str {
        // ---
        match self {
            MagnitudeBand::All => "all",
            MagnitudeBand::Significant => "significant",
            MagnitudeBand::M10 => "1.0",
            MagnitudeBand::M25 => "2.5",
            MagnitudeBand::M45 => "4.5",
        }
    }
}

/// File name of a summary feed: band first, then window.
pub fn feed_path(band: MagnitudeBand, window: TimeWindow) -> String {
    format!("{}_{}.geojson", band.as_str(), window.as_str())
}

// ---

/// HTTP client for the earthquake feeds.
#[derive(Debug, Clone)]
pub struct FeedClient {
    // ---
    client: reqwest::Client,
    base_url: String,
    fallback_url: String,
    query_url: String,
    timeout: Duration,
}

impl FeedClient {
    pub fn new(config: &Config) -> Self {
        // ---
        Self {
            client: reqwest::Client::new(),
            base_url: config.feed_base_url.trim_end_matches('/').to_string(),
            fallback_url: config.feed_fallback_url.trim_end_matches('/').to_string(),
            query_url: config.feed_query_url.clone(),
            timeout: config.feed_timeout(),
        }
    }

    /// Fetch a summary feed, falling back to the secondary base when the
    /// primary attempt fails for any reason.
    pub async fn fetch_feed(
        &self,
        band: MagnitudeBand,
        window: TimeWindow,
    ) -> Result<Vec<Value>, FeedError> {
        // ---
        let path = feed_path(band, window);

        match self.fetch_features(&format!("{}/{path}", self.base_url)).await {
            Ok(features) => Ok(features),
            Err(err) => {
                warn!("Primary feed fetch failed ({err}), trying fallback");
                self.fetch_features(&format!("{}/{path}", self.fallback_url))
                    .await
            }
        }
    }

    /// Historical range query against the fdsnws endpoint. Dates are whole
    /// UTC days; `end` is exclusive per the upstream API.
    pub async fn query_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        min_magnitude: f64,
    ) -> Result<Vec<Value>, FeedError> {
        // ---
        let url = format!(
            "{}?format=geojson&starttime={start}&endtime={end}&minmagnitude={min_magnitude}",
            self.query_url
        );
        self.fetch_features(&url).await
    }

    /// One attempt against one URL, bounded by the timeout budget.
    async fn fetch_features(&self, url: &str) -> Result<Vec<Value>, FeedError> {
        // ---
        debug!("Fetching feed from: {url}");

        let body = tokio::time::timeout(self.timeout, self.get_json(url))
            .await
            .map_err(|_| FeedError::Timeout(self.timeout))??;

        extract_features(body)
    }

    async fn get_json(&self, url: &str) -> Result<Value, FeedError> {
        // ---
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(FeedError::Status(response.status()));
        }
        Ok(response.json::<Value>().await?)
    }
}

/// Pull the feature array out of a GeoJSON feature collection.
fn extract_features(mut body: Value) -> Result<Vec<Value>, FeedError> {
    // ---
    match body.get_mut("features").map(Value::take) {
        Some(Value::Array(features)) => Ok(features),
        _ => Err(FeedError::MalformedBody),
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use serde_json::json;

    #[test]
    fn test_feed_path_is_band_then_window() {
        // ---
        assert_eq!(feed_path(MagnitudeBand::M25, TimeWindow::Day), "2.5_day.geojson");
        assert_eq!(
            feed_path(MagnitudeBand::Significant, TimeWindow::Week),
            "significant_week.geojson"
        );
        assert_eq!(feed_path(MagnitudeBand::All, TimeWindow::Hour), "all_hour.geojson");
        assert_eq!(feed_path(MagnitudeBand::M45, TimeWindow::Month), "4.5_month.geojson");
        assert_eq!(feed_path(MagnitudeBand::M10, TimeWindow::Day), "1.0_day.geojson");
    }

    #[test]
    fn test_band_and_window_parse_from_query_strings() {
        // ---
        let window: TimeWindow = serde_json::from_value(json!("week")).unwrap();
        assert_eq!(window, TimeWindow::Week);

        let band: MagnitudeBand = serde_json::from_value(json!("2.5")).unwrap();
        assert_eq!(band, MagnitudeBand::M25);

        let band: MagnitudeBand = serde_json::from_value(json!("significant")).unwrap();
        assert_eq!(band, MagnitudeBand::Significant);

        assert!(serde_json::from_value::<TimeWindow>(json!("fortnight")).is_err());
        assert!(serde_json::from_value::<MagnitudeBand>(json!("9.9")).is_err());
    }

    #[test]
    fn test_defaults_are_the_daily_m25_feed() {
        // ---
        assert_eq!(TimeWindow::default(), TimeWindow::Day);
        assert_eq!(MagnitudeBand::default(), MagnitudeBand::M25);
    }

    #[test]
    fn test_extract_features() {
        // ---
        let body = json!({
            "type": "FeatureCollection",
            "features": [{"id": "a"}, {"id": "b"}]
        });
        let features = extract_features(body).unwrap();
        assert_eq!(features.len(), 2);

        // An empty feature array is a valid (quiet) feed.
        let empty = json!({"type": "FeatureCollection", "features": []});
        assert!(extract_features(empty).unwrap().is_empty());

        // No feature array at all is malformed.
        let malformed = json!({"error": "service unavailable"});
        assert!(matches!(
            extract_features(malformed),
            Err(FeedError::MalformedBody)
        ));
    }
}
