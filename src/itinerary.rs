/// Itinerary builder: converts one selected dataset record into a
/// contiguous, gap-filled day sequence anchored to a requested sail date.
///
/// The builder is pure — it operates on an in-memory record slice with no
/// I/O — and proceeds in four passes:
///   1. candidate selection (most complete record for the ship + date)
///   2. stop extraction with date synthesis for undated stops
///   3. sail-date alignment and renumbering
///   4. sea-day synthesis to close calendar gaps, and final renumbering
///
/// When no record matches the requested ship and date the builder returns
/// `NoMatchingSailing` instead of silently substituting another sailing.

use chrono::{Datelike, Duration, NaiveDate};

use crate::ingest::dataset::{date_label_to_iso, iso_to_date_label, month_from_abbrev, normalize_name};
use crate::model::{CruiseDay, ItineraryError, MAX_STOP_FIELDS, SailingRecord};

/// Label used for synthesized gap days and undated stops at sea.
pub const AT_SEA_LABEL: &str = "At sea";

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Builds the normalized itinerary for `ship_name` departing `sail_date`.
///
/// Output guarantee: day numbers are 1-based and contiguous, and dates
/// increase by exactly one calendar day between consecutive entries,
/// starting at or after the requested sail date.
pub fn build_itinerary(
    records: &[SailingRecord],
    ship_name: &str,
    sail_date: NaiveDate,
) -> Result<Vec<CruiseDay>, ItineraryError> {
    let record = select_candidate(records, ship_name, sail_date).ok_or_else(|| {
        ItineraryError::NoMatchingSailing {
            ship: ship_name.to_string(),
            sail_date,
        }
    })?;

    let extracted = extract_stop_days(record, sail_date);
    let aligned = align_to_sail_date(extracted, sail_date);
    let filled = fill_sea_days(aligned);
    Ok(renumber(filled))
}

// ---------------------------------------------------------------------------
// Pass 1: candidate selection
// ---------------------------------------------------------------------------

/// Picks the record matching (normalized ship name) and (textual date
/// label OR equivalent calendar date) with the most populated stop
/// fields. `None` when nothing matches.
fn select_candidate<'a>(
    records: &'a [SailingRecord],
    ship_name: &str,
    sail_date: NaiveDate,
) -> Option<&'a SailingRecord> {
    let target_ship = normalize_name(ship_name);
    let target_label = iso_to_date_label(sail_date);

    records
        .iter()
        .filter(|record| {
            let Some(ship) = record.ship_name.as_deref() else {
                return false;
            };
            let Some(label) = record.cruise_date.as_deref() else {
                return false;
            };
            if normalize_name(ship) != target_ship {
                return false;
            }
            label == target_label || date_label_to_iso(label) == Some(sail_date)
        })
        .max_by_key(|record| record.populated_stop_count())
}

// ---------------------------------------------------------------------------
// Pass 2: stop extraction
// ---------------------------------------------------------------------------

/// Turns "Departing from Miami, Florida" into "Miami, Florida".
fn extract_port_name(text: &str) -> String {
    let trimmed = text.trim();
    let lower = trimmed.to_lowercase();
    match lower.strip_prefix("departing from") {
        Some(_) => trimmed["departing from".len()..].trim().to_string(),
        None => trimmed.to_string(),
    }
}

/// Parses a stop date fragment like "Sun 09 Nov" or "9 Nov" against the
/// sailing's year: the first (day-number, month-abbreviation) token pair
/// found wins.
fn parse_stop_date(fragment: &str, year: i32) -> Option<NaiveDate> {
    let tokens: Vec<&str> = fragment.split_whitespace().collect();
    for pair in tokens.windows(2) {
        let Ok(day) = pair[0].parse::<u32>() else {
            continue;
        };
        if !(1..=31).contains(&day) {
            continue;
        }
        let Some(abbrev) = pair[1].get(..3) else {
            continue;
        };
        if let Some(month) = month_from_abbrev(abbrev) {
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                return Some(date);
            }
        }
    }
    None
}

/// Extracts one `CruiseDay` per populated stop index. Stops with an
/// explicit date are parsed against the sailing's year; undated stops get
/// the previous stop's date plus one day, or the requested sail date when
/// there is no previous stop.
fn extract_stop_days(record: &SailingRecord, sail_date: NaiveDate) -> Vec<CruiseDay> {
    let year = record
        .cruise_date
        .as_deref()
        .and_then(date_label_to_iso)
        .map(|d| d.year())
        .unwrap_or_else(|| sail_date.year());

    let mut days: Vec<CruiseDay> = Vec::new();
    let mut last: Option<NaiveDate> = None;

    for index in 1..=MAX_STOP_FIELDS {
        // Text is required; the date sub-field is optional (sea days).
        let Some(stop_text) = record.stop_text(index) else {
            continue;
        };

        let date = match record.stop_date(index).and_then(|f| parse_stop_date(f, year)) {
            Some(parsed) => parsed,
            None => match last {
                Some(prev) => prev + Duration::days(1),
                None => sail_date,
            },
        };
        last = Some(date);

        days.push(CruiseDay {
            day_number: days.len() + 1,
            date,
            port_name: extract_port_name(stop_text),
            raw_stop_text: stop_text.to_string(),
        });
    }

    days
}

// ---------------------------------------------------------------------------
// Pass 3: sail-date alignment
// ---------------------------------------------------------------------------

/// Drops extracted days dated strictly before the requested sail date.
/// Some dataset records are reused across near departure dates; the early
/// stops belong to the other departure. If filtering would drop
/// everything, the unfiltered list is kept.
fn align_to_sail_date(days: Vec<CruiseDay>, sail_date: NaiveDate) -> Vec<CruiseDay> {
    let filtered: Vec<CruiseDay> = days
        .iter()
        .filter(|d| d.date >= sail_date)
        .cloned()
        .collect();

    if filtered.is_empty() { days } else { filtered }
}

// ---------------------------------------------------------------------------
// Pass 4: sea-day synthesis
// ---------------------------------------------------------------------------

/// Inserts synthetic "At sea" days for every calendar date skipped
/// between consecutive stops.
fn fill_sea_days(days: Vec<CruiseDay>) -> Vec<CruiseDay> {
    let mut expanded: Vec<CruiseDay> = Vec::with_capacity(days.len());

    for (i, day) in days.iter().enumerate() {
        expanded.push(day.clone());

        if let Some(next) = days.get(i + 1) {
            let mut cursor = day.date + Duration::days(1);
            while cursor < next.date {
                expanded.push(CruiseDay {
                    day_number: 0, // renumbered below
                    date: cursor,
                    port_name: AT_SEA_LABEL.to_string(),
                    raw_stop_text: AT_SEA_LABEL.to_string(),
                });
                cursor += Duration::days(1);
            }
        }
    }

    expanded
}

fn renumber(days: Vec<CruiseDay>) -> Vec<CruiseDay> {
    days.into_iter()
        .enumerate()
        .map(|(i, mut day)| {
            day.day_number = i + 1;
            day
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
