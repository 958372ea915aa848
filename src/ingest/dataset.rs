/// Bulk cruise-sailing dataset client.
///
/// The dataset is one big JSON array fetched once per process lifetime
/// and served from memory afterwards: option lists, date searches, and
/// ship lookups are all linear scans over the cached rows. The fetch is
/// single-flight — concurrent callers before the first load resolves
/// share one request — and a failed fetch is never cached.
///
/// Date labels in the dataset are textual ("2025 Nov 09"); conversion
/// helpers here are shared with the itinerary builder.

use chrono::{Datelike, Duration, NaiveDate, Utc};

use crate::cache::Cache;
use crate::config::Config;
use crate::logging::{self, DataSource};
use crate::model::{CruiseSummary, DatasetError, SailingRecord};

// ============================================================================
// Cruise line allow-list
// ============================================================================

/// Only sailings from these lines appear in option lists. The raw dataset
/// carries charter and river operators the product does not support.
pub static ALLOWED_CRUISE_LINES: &[&str] = &[
    "Carnival Cruise Line Cruises",
    "Celebrity Cruises",
    "Disney Cruise Line Cruises",
    "Holland America Cruises",
    "Margaritaville at Sea Cruises",
    "MSC Cruises",
    "Norwegian Cruise Line Cruises",
    "Princess Cruises",
    "Royal Caribbean Cruises",
    "Silversea Cruises",
    "Viking Cruises",
    "Virgin Voyages Cruises",
];

/// A selectable cruise line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CruiseLineOption {
    pub id: String,
    pub name: String,
}

/// A selectable ship. `id` is namespaced by line so two lines operating a
/// ship of the same name do not collide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipOption {
    pub id: String,
    pub name: String,
    pub line_id: String,
}

// ============================================================================
// Name / date helpers
// ============================================================================

const MONTH_ABBREVS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Month number (1-12) for a three-letter abbreviation, case-insensitive.
pub fn month_from_abbrev(abbrev: &str) -> Option<u32> {
    MONTH_ABBREVS
        .iter()
        .position(|m| m.eq_ignore_ascii_case(abbrev))
        .map(|i| i as u32 + 1)
}

/// Parses a dataset date label like "2025 Nov 09" into a calendar date.
pub fn date_label_to_iso(label: &str) -> Option<NaiveDate> {
    let mut parts = label.split_whitespace();
    let year: i32 = parts.next()?.parse().ok()?;
    let month = month_from_abbrev(parts.next()?)?;
    let day: u32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Formats a calendar date as a dataset label, "2025 Nov 09".
pub fn iso_to_date_label(date: NaiveDate) -> String {
    format!(
        "{} {} {:02}",
        date.year(),
        MONTH_ABBREVS[date.month0() as usize],
        date.day()
    )
}

/// Normalizes ship / line names for fuzzy matching: lowercase, "&" spelled
/// out, punctuation and whitespace stripped.
pub fn normalize_name(input: &str) -> String {
    input
        .to_lowercase()
        .replace('&', "and")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Stable slug id for option lists: lowercase, "&" spelled out, runs of
/// non-alphanumerics collapsed to single dashes.
pub fn slugify_id(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;
    for c in input.to_lowercase().replace('&', "and").chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    slug
}

// ============================================================================
// Fetch + cache
// ============================================================================

/// One uncached fetch of the bulk dataset. Non-2xx is a hard failure.
pub fn fetch_dataset(
    client: &reqwest::blocking::Client,
    config: &Config,
) -> Result<Vec<SailingRecord>, DatasetError> {
    let url = config.dataset_items_url();

    let response = client
        .get(&url)
        .header("Accept", "application/json")
        .send()
        .map_err(|e| DatasetError::Network(e.to_string()))?;

    if !response.status().is_success() {
        return Err(DatasetError::Http(response.status().as_u16()));
    }

    response
        .json::<Vec<SailingRecord>>()
        .map_err(|e| DatasetError::Parse(e.to_string()))
}

/// True once a sailing's computed end date has passed. Cruise length is
/// approximated as stop count plus the embark day.
fn has_ended(depart: NaiveDate, record: &SailingRecord, today: NaiveDate) -> bool {
    let duration_days = record.populated_stop_count() as i64 + 1;
    depart + Duration::days(duration_days) < today
}

/// Loads the dataset through the cache, fetching at most once per process.
/// Completed sailings (ended before today) are filtered out before
/// caching. Errors propagate uncached so a later call can retry.
pub fn load_dataset(
    client: &reqwest::blocking::Client,
    config: &Config,
    cache: &Cache<(), Vec<SailingRecord>>,
) -> Result<Vec<SailingRecord>, DatasetError> {
    load_dataset_at(client, config, cache, Utc::now().date_naive())
}

/// Clock-injected variant: `today` anchors the completion filter.
pub fn load_dataset_at(
    client: &reqwest::blocking::Client,
    config: &Config,
    cache: &Cache<(), Vec<SailingRecord>>,
    today: NaiveDate,
) -> Result<Vec<SailingRecord>, DatasetError> {
    let result = cache.get_or_try_insert_with((), || {
        let records = fetch_dataset(client, config)?;
        let total = records.len();

        let current: Vec<SailingRecord> = records
            .into_iter()
            .filter(|record| {
                let Some(label) = record.cruise_date.as_deref() else {
                    return false;
                };
                let Some(depart) = date_label_to_iso(label) else {
                    return false;
                };
                !has_ended(depart, record, today)
            })
            .collect();

        logging::info(
            DataSource::Dataset,
            None,
            &format!(
                "Dataset loaded: {} rows fetched, {} current after completion filter",
                total,
                current.len()
            ),
        );
        Ok(current)
    });

    if let Err(ref err) = result {
        logging::log_dataset_failure("Bulk dataset fetch", err);
    }
    result
}

// ============================================================================
// Option derivation
// ============================================================================

/// Distinct cruise-line and ship options from the cached dataset,
/// restricted to the allow-list. Lines sort by name; ships sort by line
/// then name.
pub fn cruise_options(records: &[SailingRecord]) -> (Vec<CruiseLineOption>, Vec<ShipOption>) {
    let mut lines: Vec<CruiseLineOption> = Vec::new();
    let mut ships: Vec<ShipOption> = Vec::new();

    for record in records {
        let Some(line_name) = record.cruise_line.as_deref().map(str::trim) else {
            continue;
        };
        let Some(ship_name) = record.ship_name.as_deref().map(str::trim) else {
            continue;
        };
        if line_name.is_empty() || ship_name.is_empty() {
            continue;
        }
        if !ALLOWED_CRUISE_LINES.contains(&line_name) {
            continue;
        }

        let line_id = slugify_id(line_name);
        if !lines.iter().any(|l| l.id == line_id) {
            lines.push(CruiseLineOption {
                id: line_id.clone(),
                name: line_name.to_string(),
            });
        }

        let ship_id = slugify_id(&format!("{}-{}", line_name, ship_name));
        if !ships.iter().any(|s| s.id == ship_id) {
            ships.push(ShipOption {
                id: ship_id,
                name: ship_name.to_string(),
                line_id,
            });
        }
    }

    lines.sort_by(|a, b| a.name.cmp(&b.name));
    ships.sort_by(|a, b| a.line_id.cmp(&b.line_id).then(a.name.cmp(&b.name)));

    (lines, ships)
}

// ============================================================================
// Search
// ============================================================================

fn summary_from_record(record: &SailingRecord, depart: NaiveDate) -> CruiseSummary {
    CruiseSummary {
        id: record.id.clone(),
        title: record.cruise_title.clone().unwrap_or_default(),
        cruise_line: record.cruise_line.clone().unwrap_or_default(),
        ship_name: record.ship_name.clone().unwrap_or_default(),
        depart_iso: depart,
        raw: record.clone(),
    }
}

/// De-duplicates summaries describing the same logical sailing, keeping
/// the record with the most populated stop fields.
fn dedupe_summaries(summaries: Vec<CruiseSummary>) -> Vec<CruiseSummary> {
    let mut by_key: Vec<(String, CruiseSummary)> = Vec::new();

    for summary in summaries {
        let key = format!(
            "{}|{}|{}",
            normalize_name(&summary.ship_name),
            summary.depart_iso,
            summary.title.trim()
        );

        match by_key.iter_mut().find(|(k, _)| *k == key) {
            None => by_key.push((key, summary)),
            Some((_, existing)) => {
                if summary.raw.populated_stop_count() > existing.raw.populated_stop_count() {
                    *existing = summary;
                }
            }
        }
    }

    by_key.into_iter().map(|(_, s)| s).collect()
}

/// All sailings departing on the given date, de-duplicated and sorted by
/// ship then title for display.
pub fn search_by_date(records: &[SailingRecord], sail_date: NaiveDate) -> Vec<CruiseSummary> {
    let matches: Vec<CruiseSummary> = records
        .iter()
        .filter_map(|record| {
            let label = record.cruise_date.as_deref()?;
            let depart = date_label_to_iso(label)?;
            (depart == sail_date).then(|| summary_from_record(record, depart))
        })
        .collect();

    let mut deduped = dedupe_summaries(matches);
    deduped.sort_by(|a, b| a.ship_name.cmp(&b.ship_name).then(a.title.cmp(&b.title)));
    deduped
}

/// All sailings for a ship name, tolerating minor naming differences: an
/// exact normalized match, or substring containment in either direction.
/// Sorted by departure date.
pub fn sailings_for_ship(records: &[SailingRecord], ship_name: &str) -> Vec<CruiseSummary> {
    let target = normalize_name(ship_name);
    if target.is_empty() {
        return Vec::new();
    }

    let candidates: Vec<CruiseSummary> = records
        .iter()
        .filter_map(|record| {
            let record_ship = normalize_name(record.ship_name.as_deref()?);
            if record_ship.is_empty() {
                return None;
            }
            let matches = record_ship == target
                || record_ship.contains(&target)
                || target.contains(&record_ship);
            if !matches {
                return None;
            }

            let depart = date_label_to_iso(record.cruise_date.as_deref()?)?;
            Some(summary_from_record(record, depart))
        })
        .collect();

    if candidates.is_empty() {
        logging::warn(
            DataSource::Dataset,
            Some(ship_name),
            "No sailings matched ship name",
        );
        return Vec::new();
    }

    let mut deduped = dedupe_summaries(candidates);
    deduped.sort_by_key(|s| s.depart_iso);
    deduped
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn record(
        id: &str,
        line: &str,
        ship: &str,
        date_label: &str,
        title: &str,
        stop_count: usize,
    ) -> SailingRecord {
        let mut extra = BTreeMap::new();
        for i in 1..=stop_count {
            extra.insert(
                format!("stop_{}_text", i),
                serde_json::Value::String(format!("Port {}", i)),
            );
        }
        SailingRecord {
            id: id.to_string(),
            ship_name: Some(ship.to_string()),
            cruise_date: Some(date_label.to_string()),
            cruise_title: Some(title.to_string()),
            cruise_line: Some(line.to_string()),
            cruise_price: None,
            extra,
        }
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // --- Date labels --------------------------------------------------------

    #[test]
    fn test_date_label_round_trip() {
        let date = ymd(2025, 11, 9);
        assert_eq!(iso_to_date_label(date), "2025 Nov 09");
        assert_eq!(date_label_to_iso("2025 Nov 09"), Some(date));
    }

    #[test]
    fn test_date_label_rejects_malformed_input() {
        assert_eq!(date_label_to_iso("Nov 09"), None);
        assert_eq!(date_label_to_iso("2025 Frb 09"), None);
        assert_eq!(date_label_to_iso("2025 Nov 32"), None);
        assert_eq!(date_label_to_iso("2025 Nov 09 extra"), None);
        assert_eq!(date_label_to_iso(""), None);
    }

    #[test]
    fn test_month_abbrev_is_case_insensitive() {
        assert_eq!(month_from_abbrev("NOV"), Some(11));
        assert_eq!(month_from_abbrev("nov"), Some(11));
        assert_eq!(month_from_abbrev("november"), None);
    }

    // --- Name normalization -------------------------------------------------

    #[test]
    fn test_normalize_name_strips_punctuation_and_case() {
        assert_eq!(normalize_name("Allure Of The Seas"), "allureoftheseas");
        assert_eq!(normalize_name("Queen Mary 2"), "queenmary2");
        assert_eq!(normalize_name("P&O Arvia"), "pandoarvia");
    }

    #[test]
    fn test_slugify_id_collapses_separators() {
        assert_eq!(slugify_id("Royal Caribbean Cruises"), "royal-caribbean-cruises");
        assert_eq!(slugify_id("  Margaritaville at Sea  "), "margaritaville-at-sea");
        assert_eq!(slugify_id("P&O Cruises"), "pando-cruises");
    }

    // --- Completion filter --------------------------------------------------

    #[test]
    fn test_has_ended_uses_stop_count_plus_embark_day() {
        let r = record("a", "Royal Caribbean Cruises", "Allure Of The Seas", "2025 Nov 09", "t", 5);
        let depart = ymd(2025, 11, 9);
        // End date is depart + 6; strictly before today means ended.
        assert!(!has_ended(depart, &r, ymd(2025, 11, 15)));
        assert!(has_ended(depart, &r, ymd(2025, 11, 16)));
    }

    // --- Options ------------------------------------------------------------

    #[test]
    fn test_cruise_options_respects_allow_list() {
        let records = vec![
            record("a", "Royal Caribbean Cruises", "Allure Of The Seas", "2025 Nov 09", "t", 3),
            record("b", "Backyard Boat Tours", "Dinghy", "2025 Nov 09", "t", 1),
        ];
        let (lines, ships) = cruise_options(&records);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].name, "Royal Caribbean Cruises");
        assert_eq!(ships.len(), 1);
        assert_eq!(ships[0].name, "Allure Of The Seas");
    }

    #[test]
    fn test_ship_ids_are_namespaced_by_line() {
        // Two lines operating a ship with the same name must not collide.
        let records = vec![
            record("a", "Princess Cruises", "Discovery", "2025 Nov 09", "t", 3),
            record("b", "Viking Cruises", "Discovery", "2025 Nov 10", "t", 3),
        ];
        let (lines, ships) = cruise_options(&records);
        assert_eq!(lines.len(), 2);
        assert_eq!(ships.len(), 2);
        assert_ne!(ships[0].id, ships[1].id);
        assert!(ships.iter().all(|s| s.id.contains("discovery")));
    }

    #[test]
    fn test_duplicate_records_produce_one_option() {
        let records = vec![
            record("a", "MSC Cruises", "MSC Seascape", "2025 Nov 09", "t", 3),
            record("b", "MSC Cruises", "MSC Seascape", "2025 Dec 01", "t", 4),
        ];
        let (lines, ships) = cruise_options(&records);
        assert_eq!(lines.len(), 1);
        assert_eq!(ships.len(), 1);
    }

    // --- Search by date -----------------------------------------------------

    #[test]
    fn test_search_by_date_matches_exact_day_only() {
        let records = vec![
            record("a", "Royal Caribbean Cruises", "Allure Of The Seas", "2025 Nov 09", "Western", 3),
            record("b", "Royal Caribbean Cruises", "Allure Of The Seas", "2025 Nov 16", "Eastern", 3),
        ];
        let found = search_by_date(&records, ymd(2025, 11, 9));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Western");
        assert_eq!(found[0].depart_iso, ymd(2025, 11, 9));
    }

    #[test]
    fn test_search_by_date_dedupes_keeping_most_stops() {
        let records = vec![
            record("sparse", "Royal Caribbean Cruises", "Allure Of The Seas", "2025 Nov 09", "Western", 2),
            record("full", "Royal Caribbean Cruises", "Allure Of The Seas", "2025 Nov 09", "Western", 6),
        ];
        let found = search_by_date(&records, ymd(2025, 11, 9));
        assert_eq!(found.len(), 1, "same ship/date/title should collapse to one");
        assert_eq!(found[0].id, "full", "the record with more stops wins");
    }

    // --- Ship search --------------------------------------------------------

    #[test]
    fn test_sailings_for_ship_tolerates_name_variations() {
        let records = vec![record(
            "a",
            "Royal Caribbean Cruises",
            "Allure Of The Seas",
            "2025 Nov 09",
            "t",
            3,
        )];
        // Exact, different case/punctuation, and substring all match.
        assert_eq!(sailings_for_ship(&records, "Allure Of The Seas").len(), 1);
        assert_eq!(sailings_for_ship(&records, "allure of the seas!").len(), 1);
        assert_eq!(sailings_for_ship(&records, "Allure").len(), 1);
    }

    #[test]
    fn test_sailings_for_ship_sorted_by_departure() {
        let records = vec![
            record("b", "Royal Caribbean Cruises", "Allure Of The Seas", "2025 Dec 01", "t", 3),
            record("a", "Royal Caribbean Cruises", "Allure Of The Seas", "2025 Nov 09", "t", 3),
        ];
        let found = sailings_for_ship(&records, "Allure Of The Seas");
        assert_eq!(found.len(), 2);
        assert!(found[0].depart_iso < found[1].depart_iso);
    }

    #[test]
    fn test_sailings_for_unknown_ship_is_empty() {
        let records = vec![record(
            "a",
            "Royal Caribbean Cruises",
            "Allure Of The Seas",
            "2025 Nov 09",
            "t",
            3,
        )];
        assert!(sailings_for_ship(&records, "Queen Mary 2").is_empty());
        assert!(sailings_for_ship(&records, "").is_empty());
    }

    // --- Cached load --------------------------------------------------------

    #[test]
    fn test_load_dataset_failure_is_not_cached() {
        // Point at an unroutable address so the fetch fails fast, then
        // confirm nothing was cached.
        let mut config = Config::default();
        config.dataset_url = "http://127.0.0.1:9/items?format=json".to_string();
        config.request_timeout_secs = 1;
        let client = config.build_client().expect("client should build");
        let cache = Cache::default();

        let result = load_dataset_at(&client, &config, &cache, ymd(2025, 11, 9));
        assert!(result.is_err());
        assert!(cache.is_empty(), "failed fetches must not populate the cache");
    }
}
