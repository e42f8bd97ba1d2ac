//! Feed-record normalization.
//!
//! Translates raw GeoJSON features into [`Event`] values. Field access is
//! tolerant: numbers may arrive as JSON numbers or numeric strings, optional
//! fields may be missing or null. A record missing any required numeric field
//! fails on its own; the batch itself never aborts.

use chrono::{TimeZone, Utc};
use serde_json::Value;
use tracing::debug;

use crate::error::RecordError;
use crate::models::{Event, Severity};

// ---

/// Read a required finite number. Accepts JSON numbers and numeric strings.
fn require_f64(value: Option<&Value>, name: &'static str) -> Result<f64, RecordError> {
    // ---
    let value = match value {
        None | Some(Value::Null) => return Err(RecordError::MissingField(name)),
        Some(value) => value,
    };

    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(number) if number.is_finite() => Ok(number),
        _ => Err(RecordError::NonNumeric(name)),
    }
}

/// Like [`require_f64`] but absence is fine.
fn optional_f64(value: Option<&Value>) -> Option<f64> {
    // ---
    let parsed = match value? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|number| number.is_finite())
}

fn require_epoch_millis(value: Option<&Value>, name: &'static str) -> Result<i64, RecordError> {
    // ---
    let value = match value {
        None | Some(Value::Null) => return Err(RecordError::MissingField(name)),
        Some(value) => value,
    };

    let millis = match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    };

    millis.ok_or(RecordError::NonNumeric(name))
}

fn nonempty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
}

// ---

/// Normalize one raw feature into a canonical [`Event`].
///
/// The coordinate array is `[longitude, latitude, depth]`; the first two
/// entries and `properties.mag` / `properties.time` are required. Depth
/// defaults to 0.0 and place to an empty string. Region tags start empty and
/// are populated by the classifier.
///
/// Identity falls back from the feed `id` to `properties.code` to a
/// deterministic composite of rounded coordinates, depth, and timestamp.
pub fn normalize(raw: &Value) -> Result<Event, RecordError> {
    // ---
    let properties = raw.get("properties");
    let coordinates = raw
        .get("geometry")
        .and_then(|geometry| geometry.get("coordinates"));

    let longitude = require_f64(coordinates.and_then(|c| c.get(0)), "longitude")?;
    let latitude = require_f64(coordinates.and_then(|c| c.get(1)), "latitude")?;
    let depth_km = optional_f64(coordinates.and_then(|c| c.get(2))).unwrap_or(0.0);

    let magnitude = require_f64(properties.and_then(|p| p.get("mag")), "mag")?;
    let timestamp_ms = require_epoch_millis(properties.and_then(|p| p.get("time")), "time")?;
    let timestamp = Utc
        .timestamp_millis_opt(timestamp_ms)
        .single()
        .ok_or(RecordError::TimestampOutOfRange(timestamp_ms))?;

    let place = nonempty_str(properties.and_then(|p| p.get("place")))
        .unwrap_or("")
        .to_string();
    let url = nonempty_str(properties.and_then(|p| p.get("url"))).map(str::to_string);

    let id = nonempty_str(raw.get("id"))
        .or_else(|| nonempty_str(properties.and_then(|p| p.get("code"))))
        .map(str::to_string)
        .unwrap_or_else(|| {
            format!("{latitude:.4}:{longitude:.4}:{depth_km:.1}:{timestamp_ms}")
        });

    Ok(Event {
        id,
        latitude,
        longitude,
        depth_km,
        magnitude,
        place,
        timestamp,
        url,
        region_tags: Default::default(),
        severity: Severity::from_magnitude(magnitude),
    })
}

/// Normalize a whole feature array, skipping malformed records.
///
/// Returns the surviving events in feed order together with the number of
/// records dropped.
pub fn normalize_batch(features: &[Value]) -> (Vec<Event>, usize) {
    // ---
    let mut events = Vec::with_capacity(features.len());
    let mut dropped = 0usize;

    for feature in features {
        match normalize(feature) {
            Ok(event) => events.push(event),
            Err(err) => {
                debug!("Skipping malformed feed record: {err}");
                dropped += 1;
            }
        }
    }

    (events, dropped)
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use serde_json::json;

    fn create_test_feature() -> Value {
        // ---
        json!({
            "id": "us7000abcd",
            "properties": {
                "mag": 5.2,
                "place": "23 km ENE of Falam, Myanmar",
                "time": 1743142800000i64,
                "url": "https://earthquake.usgs.gov/earthquakes/eventpage/us7000abcd",
                "code": "7000abcd"
            },
            "geometry": {
                "coordinates": [93.7, 23.0, 12.4]
            }
        })
    }

    #[test]
    fn test_normalizes_complete_feature() {
        // ---
        let event = normalize(&create_test_feature()).unwrap();

        assert_eq!(event.id, "us7000abcd");
        assert_eq!(event.longitude, 93.7);
        assert_eq!(event.latitude, 23.0);
        assert_eq!(event.depth_km, 12.4);
        assert_eq!(event.magnitude, 5.2);
        assert_eq!(event.place, "23 km ENE of Falam, Myanmar");
        assert_eq!(event.timestamp.timestamp_millis(), 1743142800000);
        assert_eq!(event.severity, Severity::Severe);
        assert!(event.region_tags.is_empty());
    }

    #[test]
    fn test_coordinate_order_is_lng_lat_depth() {
        // ---
        // A transposed reading would land this event in the Indian Ocean.
        let event = normalize(&create_test_feature()).unwrap();
        assert!(event.latitude < event.longitude);
        assert_eq!((event.latitude, event.longitude), (23.0, 93.7));
    }

    #[test]
    fn test_missing_required_fields_fail() {
        // ---
        let mut feature = create_test_feature();
        feature["properties"]
            .as_object_mut()
            .unwrap()
            .remove("mag");
        assert!(matches!(
            normalize(&feature),
            Err(RecordError::MissingField("mag"))
        ));

        let mut feature = create_test_feature();
        feature["properties"]["time"] = Value::Null;
        assert!(matches!(
            normalize(&feature),
            Err(RecordError::MissingField("time"))
        ));

        let mut feature = create_test_feature();
        feature["geometry"]["coordinates"] = json!([93.7]);
        assert!(matches!(
            normalize(&feature),
            Err(RecordError::MissingField("latitude"))
        ));
    }

    #[test]
    fn test_numeric_strings_parse() {
        // ---
        let mut feature = create_test_feature();
        feature["properties"]["mag"] = json!("4.5");
        let event = normalize(&feature).unwrap();
        assert_eq!(event.magnitude, 4.5);

        let mut feature = create_test_feature();
        feature["properties"]["mag"] = json!("not a number");
        assert!(matches!(
            normalize(&feature),
            Err(RecordError::NonNumeric("mag"))
        ));
    }

    #[test]
    fn test_depth_defaults_to_zero() {
        // ---
        let mut feature = create_test_feature();
        feature["geometry"]["coordinates"] = json!([93.7, 23.0]);
        let event = normalize(&feature).unwrap();
        assert_eq!(event.depth_km, 0.0);

        let mut feature = create_test_feature();
        feature["geometry"]["coordinates"] = json!([93.7, 23.0, null]);
        assert_eq!(normalize(&feature).unwrap().depth_km, 0.0);
    }

    #[test]
    fn test_id_fallback_chain() {
        // ---
        // No feed id: properties.code steps in.
        let mut feature = create_test_feature();
        feature.as_object_mut().unwrap().remove("id");
        assert_eq!(normalize(&feature).unwrap().id, "7000abcd");

        // Neither: a deterministic composite of position and time.
        let mut feature = create_test_feature();
        feature.as_object_mut().unwrap().remove("id");
        feature["properties"].as_object_mut().unwrap().remove("code");
        let event = normalize(&feature).unwrap();
        assert_eq!(event.id, "23.0000:93.7000:12.4:1743142800000");

        // Same record again yields the same id.
        assert_eq!(normalize(&feature).unwrap().id, event.id);
    }

    #[test]
    fn test_batch_skips_malformed_records() {
        // ---
        let good = create_test_feature();
        let mut bad = create_test_feature();
        bad["properties"].as_object_mut().unwrap().remove("mag");

        let (events, dropped) = normalize_batch(&[good, bad.clone(), bad]);

        assert_eq!(events.len(), 1);
        assert_eq!(dropped, 2);
        assert_eq!(events[0].id, "us7000abcd");
    }

    #[test]
    fn test_empty_place_and_url() {
        // ---
        let mut feature = create_test_feature();
        feature["properties"]["place"] = Value::Null;
        feature["properties"]["url"] = json!("");
        let event = normalize(&feature).unwrap();

        assert_eq!(event.place, "");
        assert_eq!(event.url, None);
    }
}
