/// Daily forecast client with climate-normals backfill.
///
/// Retrieves a short-range daily forecast series (Tomorrow.io-shaped API)
/// for an itinerary's dates, then backfills any date outside the forecast
/// horizon from NOAA/NCEI 30-year monthly normals served through a
/// station-keyed proxy.
///
/// Nothing on this path is allowed to fail the itinerary load: a missing
/// API key, network failure, HTTP error, or unparseable body degrades to
/// climatology-only, and climatology problems leave the affected dates
/// absent from the result. Failures are logged with classification so an
/// expected outage reads differently from a broken integration.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, SecondsFormat, Utc};
use serde::Deserialize;

use crate::cache::Cache;
use crate::config::Config;
use crate::logging::{self, DataSource};
use crate::model::{DailyForecast, ForecastError, WeatherIcon, WeatherSource};

/// Description attached to every climatology-derived day.
pub const CLIMATOLOGY_DESCRIPTION: &str =
    "Typical conditions for this time of year (30-year average).";

// ============================================================================
// Forecast API Response Structures
// ============================================================================

/// Top-level forecast response body.
#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    #[serde(default)]
    pub timelines: Timelines,
}

#[derive(Debug, Default, Deserialize)]
pub struct Timelines {
    #[serde(default)]
    pub daily: Vec<DailyPoint>,
}

/// One daily point in the forecast series.
#[derive(Debug, Deserialize)]
pub struct DailyPoint {
    /// ISO 8601 timestamp; the date key is its first ten characters.
    pub time: String,
    #[serde(default)]
    pub values: DailyValues,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyValues {
    pub temperature_max: Option<f64>,
    pub temperature_min: Option<f64>,
    pub precipitation_probability_max: Option<f64>,
    pub precipitation_probability_avg: Option<f64>,
    pub weather_code_max: Option<i64>,
    pub weather_code_min: Option<i64>,
    pub weather_code: Option<i64>,
}

// ============================================================================
// Climate Normals
// ============================================================================

/// One month's 30-year normals for a station, parsed out of the proxy's
/// loosely-shaped rows. Temperatures are °F, precipitation is inches.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyNormal {
    pub month: u32,
    pub tmax: Option<f64>,
    pub tmin: Option<f64>,
    pub tavg: Option<f64>,
    pub precip_in: Option<f64>,
}

// ============================================================================
// Caches
// ============================================================================

/// The two weather memoization points, owned by the pipeline entry point.
pub struct ForecastCaches {
    /// Keyed by (normalized location, sorted dates, station id).
    pub forecasts: Cache<String, BTreeMap<NaiveDate, DailyForecast>>,
    /// Keyed by station id; one proxy fetch per station per process.
    pub normals: Cache<String, Vec<MonthlyNormal>>,
}

impl ForecastCaches {
    pub fn new() -> Self {
        Self {
            forecasts: Cache::default(),
            normals: Cache::default(),
        }
    }
}

impl Default for ForecastCaches {
    fn default() -> Self {
        Self::new()
    }
}

fn forecast_cache_key(location: &str, dates: &[NaiveDate], station_id: Option<&str>) -> String {
    let mut sorted: Vec<NaiveDate> = dates.to_vec();
    sorted.sort();
    let date_part: Vec<String> = sorted.iter().map(|d| d.to_string()).collect();
    format!(
        "{}|{}|{}",
        location.trim().to_lowercase(),
        date_part.join(","),
        station_id.unwrap_or("")
    )
}

// ============================================================================
// Icon Mapping
// ============================================================================

/// Condition code → 4-icon mapping.
pub fn map_weather_code(code: i64) -> WeatherIcon {
    // Clear / mostly clear
    if code == 1000 || code == 1100 {
        return WeatherIcon::Sunny;
    }

    // Partly cloudy family
    if code == 1101 || code == 1102 || code == 1103 {
        return WeatherIcon::Partly;
    }

    // Cloudy & fog-type conditions
    if code == 1001 || (2000..3000).contains(&code) {
        return WeatherIcon::Cloudy;
    }

    // Everything else (drizzle, rain, snow, storms, etc.)
    WeatherIcon::Rain
}

/// Final icon for a day: the precipitation-probability override beats the
/// code-based mapping in both directions.
pub fn resolve_icon(code: i64, rain_chance: u8) -> WeatherIcon {
    if rain_chance >= 50 {
        WeatherIcon::Rain
    } else if rain_chance >= 30 {
        WeatherIcon::Partly
    } else {
        map_weather_code(code)
    }
}

// ============================================================================
// Forecast Fetch + Parse
// ============================================================================

fn day_start_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn day_end_utc(date: NaiveDate) -> DateTime<Utc> {
    day_start_utc(date) + Duration::seconds(86_399)
}

fn fetch_forecast_series(
    client: &reqwest::blocking::Client,
    config: &Config,
    api_key: &str,
    location: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<DailyPoint>, ForecastError> {
    let start_param = start.to_rfc3339_opts(SecondsFormat::Secs, true);
    let end_param = end.to_rfc3339_opts(SecondsFormat::Secs, true);

    let response = client
        .get(&config.forecast_url)
        .query(&[
            ("location", location),
            ("timesteps", "1d"),
            ("apikey", api_key),
            ("units", config.units.as_str()),
            ("startTime", start_param.as_str()),
            ("endTime", end_param.as_str()),
        ])
        .send()
        .map_err(|e| ForecastError::Network(e.to_string()))?;

    if !response.status().is_success() {
        return Err(ForecastError::Http(response.status().as_u16()));
    }

    let body: ForecastResponse = response
        .json()
        .map_err(|e| ForecastError::Parse(e.to_string()))?;

    Ok(body.timelines.daily)
}

/// Maps the returned daily series onto the requested dates. Points
/// outside the requested set, or missing a temperature bound, are
/// skipped.
fn forecasts_from_series(
    series: Vec<DailyPoint>,
    requested: &BTreeSet<NaiveDate>,
) -> BTreeMap<NaiveDate, DailyForecast> {
    let mut forecasts = BTreeMap::new();

    for point in series {
        let Some(date) = point
            .time
            .get(..10)
            .and_then(|s| s.parse::<NaiveDate>().ok())
        else {
            continue;
        };
        if !requested.contains(&date) {
            continue;
        }

        let values = point.values;
        let (Some(high), Some(low)) = (values.temperature_max, values.temperature_min) else {
            continue;
        };

        let pop_raw = values
            .precipitation_probability_max
            .or(values.precipitation_probability_avg)
            .unwrap_or(0.0);
        let rain_chance = pop_raw.round().clamp(0.0, 100.0) as u8;

        let code = values
            .weather_code_max
            .or(values.weather_code_min)
            .or(values.weather_code)
            .unwrap_or(1000);

        let high = high.round() as i32;
        let low = low.round() as i32;

        forecasts.insert(
            date,
            DailyForecast {
                high,
                low,
                rain_chance,
                icon: resolve_icon(code, rain_chance),
                description: format!(
                    "High {}°, low {}°, {}% chance of precipitation.",
                    high, low, rain_chance
                ),
                source: WeatherSource::Forecast,
            },
        );
    }

    forecasts
}

// ============================================================================
// Climate Normals Fetch + Parse
// ============================================================================

fn value_as_f64(value: Option<&serde_json::Value>) -> Option<f64> {
    match value? {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn month_from_row(row: &serde_json::Value) -> Option<u32> {
    // Prefer an explicit MONTH field, 1-12.
    if let Some(month) = value_as_f64(row.get("MONTH")) {
        let month = month as u32;
        if (1..=12).contains(&month) {
            return Some(month);
        }
    }
    // Fall back to a representative DATE, e.g. "2010-04-01T00:00:00".
    let date = row.get("DATE")?.as_str()?;
    let parsed: NaiveDate = date.get(..10)?.parse().ok()?;
    Some(parsed.month())
}

/// Normalizes the proxy body — a JSON array of monthly rows, or a single
/// row object — into typed normals. Rows with no resolvable month are
/// dropped.
fn parse_normals_body(body: &serde_json::Value) -> Vec<MonthlyNormal> {
    let rows: Vec<&serde_json::Value> = match body {
        serde_json::Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };

    rows.into_iter()
        .filter_map(|row| {
            let month = month_from_row(row)?;
            Some(MonthlyNormal {
                month,
                tmax: value_as_f64(row.get("MLY-TMAX-NORMAL")),
                tmin: value_as_f64(row.get("MLY-TMIN-NORMAL")),
                tavg: value_as_f64(row.get("MLY-TAVG-NORMAL")),
                precip_in: value_as_f64(row.get("MLY-PRCP-NORMAL")),
            })
        })
        .collect()
}

/// Fetches (or serves from cache) the monthly normals for one station.
/// One network call per station per process; fetch errors are logged and
/// yield an empty list without being cached, so a later load can retry.
fn fetch_station_normals(
    client: &reqwest::blocking::Client,
    config: &Config,
    cache: &Cache<String, Vec<MonthlyNormal>>,
    station_id: &str,
) -> Vec<MonthlyNormal> {
    let result = cache.get_or_try_insert_with(station_id.to_string(), || {
        let url = config
            .normals_url(station_id)
            .ok_or_else(|| ForecastError::Network("normals proxy base URL is not configured".to_string()))?;

        let response = client
            .get(&url)
            .send()
            .map_err(|e| ForecastError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ForecastError::Http(response.status().as_u16()));
        }

        let body: serde_json::Value = response
            .json()
            .map_err(|e| ForecastError::Parse(e.to_string()))?;

        let rows = parse_normals_body(&body);
        logging::info(
            DataSource::Normals,
            Some(station_id),
            &format!("Loaded {} monthly normal rows", rows.len()),
        );
        Ok(rows)
    });

    match result {
        Ok(rows) => rows,
        Err(err) => {
            logging::log_normals_failure(station_id, "Normals fetch", &err);
            Vec::new()
        }
    }
}

// ============================================================================
// Climatology Backfill
// ============================================================================

/// Fills every requested date still missing a forecast from the station's
/// monthly normals. Dates whose month has no usable temperature data stay
/// absent — the presentation layer shows them as pending, not as zeroes.
fn fill_missing_with_climatology(
    client: &reqwest::blocking::Client,
    config: &Config,
    normals_cache: &Cache<String, Vec<MonthlyNormal>>,
    dates: &[NaiveDate],
    existing: &mut BTreeMap<NaiveDate, DailyForecast>,
    station_id: &str,
) {
    let missing: Vec<NaiveDate> = dates
        .iter()
        .filter(|d| !existing.contains_key(d))
        .copied()
        .collect();
    if missing.is_empty() {
        return;
    }

    let rows = fetch_station_normals(client, config, normals_cache, station_id);
    if rows.is_empty() {
        logging::warn(
            DataSource::Normals,
            Some(station_id),
            "No normals available; dates left pending",
        );
        return;
    }

    let mut by_month: HashMap<u32, &MonthlyNormal> = HashMap::new();
    for row in &rows {
        by_month.entry(row.month).or_insert(row);
    }

    let mut filled = 0usize;
    for date in &missing {
        let Some(normal) = by_month.get(&date.month()) else {
            continue;
        };

        let high = normal.tmax.or(normal.tavg);
        let low = normal.tmin.or(normal.tavg);
        let (Some(high), Some(low)) = (high, low) else {
            logging::debug(
                DataSource::Normals,
                Some(station_id),
                &format!("Skipping {}: month {} has no usable temperatures", date, normal.month),
            );
            continue;
        };
        if !high.is_finite() || !low.is_finite() {
            continue;
        }

        // Monthly precipitation normal (inches) scaled to a rough
        // rain-likelihood percentage.
        let rain_chance = (normal.precip_in.unwrap_or(0.0) * 10.0)
            .round()
            .clamp(0.0, 100.0) as u8;

        existing.insert(
            *date,
            DailyForecast {
                high: high.round() as i32,
                low: low.round() as i32,
                rain_chance,
                icon: WeatherIcon::Partly,
                description: CLIMATOLOGY_DESCRIPTION.to_string(),
                source: WeatherSource::Climatology,
            },
        );
        filled += 1;
    }

    logging::log_backfill_summary(station_id, missing.len(), filled, missing.len() - filled);
}

// ============================================================================
// Main Entry Point
// ============================================================================

/// Resolves a `DailyForecast` per requested date for one location,
/// preferring the live forecast and backfilling gaps from climatology.
/// Total over its error space: returns an empty or partial map instead of
/// failing. Results are memoized per (location, dates, station).
pub fn daily_forecasts(
    client: &reqwest::blocking::Client,
    config: &Config,
    caches: &ForecastCaches,
    location: &str,
    dates: &[NaiveDate],
    station_id: Option<&str>,
) -> BTreeMap<NaiveDate, DailyForecast> {
    daily_forecasts_at(client, config, caches, location, dates, station_id, Utc::now())
}

/// Clock-injected variant: `now` clamps the forecast window's start so a
/// request whose earliest date is already past does not ask the API for
/// history.
pub fn daily_forecasts_at(
    client: &reqwest::blocking::Client,
    config: &Config,
    caches: &ForecastCaches,
    location: &str,
    dates: &[NaiveDate],
    station_id: Option<&str>,
    now: DateTime<Utc>,
) -> BTreeMap<NaiveDate, DailyForecast> {
    if dates.is_empty() {
        logging::warn(DataSource::Forecast, Some(location), "No dates requested");
        return BTreeMap::new();
    }

    // No API key: climatology is the best we can do, and only with a station.
    let Some(api_key) = config.forecast_api_key.clone() else {
        logging::log_forecast_failure(location, "Forecast fetch", &ForecastError::MissingApiKey);
        let mut climatology_only = BTreeMap::new();
        if let Some(station) = station_id {
            fill_missing_with_climatology(
                client,
                config,
                &caches.normals,
                dates,
                &mut climatology_only,
                station,
            );
        }
        return climatology_only;
    };

    let cache_key = forecast_cache_key(location, dates, station_id);
    if let Some(cached) = caches.forecasts.get(&cache_key) {
        return cached;
    }

    let requested: BTreeSet<NaiveDate> = dates.iter().copied().collect();
    let (Some(&earliest), Some(&latest)) = (requested.iter().next(), requested.iter().next_back())
    else {
        return BTreeMap::new();
    };

    // Clamp the window start forward to now; never past the window end.
    let end = day_end_utc(latest);
    let mut start = day_start_utc(earliest).max(now);
    if start > end {
        start = end;
    }

    let mut forecasts =
        match fetch_forecast_series(client, config, &api_key, location, start, end) {
            Ok(series) => forecasts_from_series(series, &requested),
            Err(err) => {
                logging::log_forecast_failure(location, "Forecast fetch", &err);
                if station_id.is_none() {
                    // Nothing to backfill from; don't cache the failure.
                    return BTreeMap::new();
                }
                BTreeMap::new()
            }
        };

    if let Some(station) = station_id {
        fill_missing_with_climatology(
            client,
            config,
            &caches.normals,
            dates,
            &mut forecasts,
            station,
        );
    }

    caches.forecasts.insert(cache_key, forecasts.clone());
    forecasts
}

// ============================================================================
// Tests
// ============================================================================
