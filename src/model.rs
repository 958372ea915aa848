/// Core data types for the CruiseCast service layer.
///
/// This module defines the shared domain model imported by all other
/// modules. It contains no logic beyond small accessors, no I/O, and no
/// external collaborators — only types and their error taxonomy.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Dataset record
// ---------------------------------------------------------------------------

/// Highest stop index the bulk dataset populates. Stop sub-fields are
/// indexed `stop_1_*` .. `stop_20_*` and any index may be absent.
pub const MAX_STOP_FIELDS: usize = 20;

/// One row of the bulk cruise-sailing dataset.
///
/// The fixed columns are typed; the indexed stop sub-fields
/// (`stop_i_text`, `stop_i_date`) arrive as arbitrary extra keys and are
/// captured through the flattened `extra` map. Use `stop_text` /
/// `stop_date` instead of reading `extra` directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SailingRecord {
    #[serde(default)]
    pub id: String,
    pub ship_name: Option<String>,
    /// Textual sail date label, e.g. "2025 Nov 09".
    pub cruise_date: Option<String>,
    pub cruise_title: Option<String>,
    pub cruise_line: Option<String>,
    pub cruise_price: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl SailingRecord {
    fn stop_field(&self, index: usize, suffix: &str) -> Option<&str> {
        let key = format!("stop_{}_{}", index, suffix);
        self.extra
            .get(&key)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Stop description for a 1-based index, if populated.
    pub fn stop_text(&self, index: usize) -> Option<&str> {
        self.stop_field(index, "text")
    }

    /// Stop date fragment for a 1-based index (e.g. "Sun 09 Nov"), if
    /// populated. Sea days typically carry text but no date.
    pub fn stop_date(&self, index: usize) -> Option<&str> {
        self.stop_field(index, "date")
    }

    /// Number of populated `stop_i_text` fields. Used to pick the most
    /// complete record among duplicates describing the same sailing.
    pub fn populated_stop_count(&self) -> usize {
        (1..=MAX_STOP_FIELDS)
            .filter(|i| self.stop_text(*i).is_some())
            .count()
    }
}

// ---------------------------------------------------------------------------
// Search / itinerary types
// ---------------------------------------------------------------------------

/// De-duplicated projection of one logical sailing (same ship, same
/// departure date, same title). Constructed per search query; never
/// persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct CruiseSummary {
    pub id: String,
    pub title: String,
    pub cruise_line: String,
    pub ship_name: String,
    pub depart_iso: NaiveDate,
    pub raw: SailingRecord,
}

/// One normalized itinerary day. After normalization, `day_number` is
/// 1-based and contiguous, and dates increase by exactly one calendar day
/// between consecutive entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CruiseDay {
    pub day_number: usize,
    pub date: NaiveDate,
    pub port_name: String,
    pub raw_stop_text: String,
}

/// A port label resolved to a forecast location and optional
/// climate-normals station.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPort {
    /// Human-readable location label, e.g. "Fort Lauderdale, FL".
    pub location: String,
    pub lat: f64,
    pub lon: f64,
    /// NCEI climate-normals station id, e.g. "USW00012849".
    pub station_id: Option<String>,
}

impl ResolvedPort {
    /// "lat,lon" query parameter for the forecast API.
    pub fn coordinate_param(&self) -> String {
        format!("{},{}", self.lat, self.lon)
    }
}

// ---------------------------------------------------------------------------
// Weather types
// ---------------------------------------------------------------------------

/// Four-icon condition summary used by the timeline UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherIcon {
    Sunny,
    Partly,
    Cloudy,
    Rain,
}

/// Where a day's weather numbers came from. A date never holds both:
/// `Forecast` entries come from the short-range API, `Climatology`
/// entries are backfilled from 30-year monthly normals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherSource {
    Forecast,
    Climatology,
}

/// Resolved weather for a single calendar date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyForecast {
    pub high: i32,
    pub low: i32,
    /// Chance of precipitation, 0–100.
    pub rain_chance: u8,
    pub icon: WeatherIcon,
    pub description: String,
    pub source: WeatherSource,
}

/// Display model: one cruise day merged with its weather, if any. Days
/// without weather keep `None` fields and a placeholder description.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItineraryDay {
    pub day: usize,
    pub date: NaiveDate,
    pub location: String,
    pub high: Option<i32>,
    pub low: Option<i32>,
    pub rain_chance: Option<u8>,
    pub icon: Option<WeatherIcon>,
    pub description: String,
    pub source: Option<WeatherSource>,
}

// ---------------------------------------------------------------------------
// Saved cruises
// ---------------------------------------------------------------------------

/// One bookmarked cruise, scoped to a user. Uniquely identified by the
/// composite (user, line, ship, sail date).
#[derive(Debug, Clone, PartialEq)]
pub struct SavedCruise {
    pub id: i64,
    pub user_id: String,
    pub cruise_line: String,
    pub ship_name: String,
    pub sail_date: NaiveDate,
    pub title: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors fetching or decoding the bulk sailing dataset. These are the
/// required path: they propagate to the caller and are never cached.
#[derive(Debug, PartialEq)]
pub enum DatasetError {
    /// The request never completed (DNS, connect, timeout).
    Network(String),
    /// Non-2xx HTTP response from the dataset endpoint.
    Http(u16),
    /// The response body could not be deserialized.
    Parse(String),
}

impl std::fmt::Display for DatasetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetError::Network(msg) => write!(f, "Dataset request failed: {}", msg),
            DatasetError::Http(code) => write!(f, "Dataset HTTP error: {}", code),
            DatasetError::Parse(msg) => write!(f, "Dataset parse error: {}", msg),
        }
    }
}

impl std::error::Error for DatasetError {}

/// Errors building an itinerary for a (ship, sail date) selection.
#[derive(Debug, PartialEq)]
pub enum ItineraryError {
    Dataset(DatasetError),
    /// No dataset record matches the requested ship and sail date. The
    /// caller decides how to surface this; the builder never substitutes
    /// an unrelated sailing.
    NoMatchingSailing { ship: String, sail_date: NaiveDate },
}

impl std::fmt::Display for ItineraryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItineraryError::Dataset(err) => write!(f, "{}", err),
            ItineraryError::NoMatchingSailing { ship, sail_date } => {
                write!(f, "No sailing found for ship '{}' on {}", ship, sail_date)
            }
        }
    }
}

impl std::error::Error for ItineraryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ItineraryError::Dataset(err) => Some(err),
            ItineraryError::NoMatchingSailing { .. } => None,
        }
    }
}

impl From<DatasetError> for ItineraryError {
    fn from(err: DatasetError) -> Self {
        ItineraryError::Dataset(err)
    }
}

/// Errors on the weather enrichment path. These never propagate out of
/// the forecast resolver — every variant degrades to climatology-only or
/// an empty result and is logged for diagnostics.
#[derive(Debug, PartialEq)]
pub enum ForecastError {
    /// No forecast API key configured; only climatology is possible.
    MissingApiKey,
    Network(String),
    Http(u16),
    Parse(String),
}

impl std::fmt::Display for ForecastError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ForecastError::MissingApiKey => write!(f, "Forecast API key is not configured"),
            ForecastError::Network(msg) => write!(f, "Forecast request failed: {}", msg),
            ForecastError::Http(code) => write!(f, "Forecast HTTP error: {}", code),
            ForecastError::Parse(msg) => write!(f, "Forecast parse error: {}", msg),
        }
    }
}

impl std::error::Error for ForecastError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_stops(pairs: &[(usize, &str, Option<&str>)]) -> SailingRecord {
        let mut extra = BTreeMap::new();
        for (i, text, date) in pairs {
            extra.insert(
                format!("stop_{}_text", i),
                serde_json::Value::String((*text).to_string()),
            );
            if let Some(d) = date {
                extra.insert(
                    format!("stop_{}_date", i),
                    serde_json::Value::String((*d).to_string()),
                );
            }
        }
        SailingRecord {
            id: "r1".to_string(),
            ship_name: Some("Allure Of The Seas".to_string()),
            cruise_date: Some("2025 Nov 09".to_string()),
            cruise_title: Some("7 Night Western Caribbean".to_string()),
            cruise_line: Some("Royal Caribbean Cruises".to_string()),
            cruise_price: None,
            extra,
        }
    }

    #[test]
    fn test_stop_accessors_skip_missing_and_empty_fields() {
        let mut record =
            record_with_stops(&[(1, "Departing from Miami, Florida", Some("Sun 09 Nov"))]);
        record.extra.insert(
            "stop_2_text".to_string(),
            serde_json::Value::String("  ".to_string()),
        );

        assert_eq!(record.stop_text(1), Some("Departing from Miami, Florida"));
        assert_eq!(record.stop_date(1), Some("Sun 09 Nov"));
        assert_eq!(record.stop_text(2), None, "whitespace-only text is not populated");
        assert_eq!(record.stop_text(3), None);
        assert_eq!(record.stop_date(3), None);
    }

    #[test]
    fn test_populated_stop_count_ignores_sparse_indices() {
        // Indices 1, 3, 7 populated — count is 3 even though the range is sparse.
        let record = record_with_stops(&[
            (1, "Miami, Florida", None),
            (3, "Cozumel, Mexico", None),
            (7, "At sea", None),
        ]);
        assert_eq!(record.populated_stop_count(), 3);
    }

    #[test]
    fn test_sailing_record_deserializes_flattened_stop_fields() {
        let json = r#"{
            "id": "abc",
            "ship_name": "Allure Of The Seas",
            "cruise_date": "2025 Nov 09",
            "cruise_title": "7 Night Western Caribbean",
            "cruise_line": "Royal Caribbean Cruises",
            "cruise_price": "$599",
            "stop_1_text": "Departing from Miami, Florida",
            "stop_1_date": "Sun 09 Nov",
            "stop_2_text": "At sea"
        }"#;
        let record: SailingRecord = serde_json::from_str(json).expect("record should deserialize");
        assert_eq!(record.stop_text(1), Some("Departing from Miami, Florida"));
        assert_eq!(record.stop_text(2), Some("At sea"));
        assert_eq!(record.stop_date(2), None);
        assert_eq!(record.populated_stop_count(), 2);
    }

    #[test]
    fn test_weather_icon_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&WeatherIcon::Sunny).unwrap(), "\"sunny\"");
        assert_eq!(
            serde_json::to_string(&WeatherSource::Climatology).unwrap(),
            "\"climatology\""
        );
    }

    #[test]
    fn test_no_matching_sailing_display_names_ship_and_date() {
        let err = ItineraryError::NoMatchingSailing {
            ship: "Allure Of The Seas".to_string(),
            sail_date: NaiveDate::from_ymd_opt(2025, 11, 9).unwrap(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Allure Of The Seas"));
        assert!(msg.contains("2025-11-09"));
    }
}
