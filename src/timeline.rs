/// Presentation mapping: merges the normalized itinerary with resolved
/// weather into the display records the timeline UI consumes.
///
/// The merge contract is the boundary of this crate — rendering happens
/// elsewhere. Days with no weather entry keep `None` numeric fields and a
/// fixed placeholder description; the UI treats them as pending, never as
/// an error.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::model::{CruiseDay, DailyForecast, ItineraryDay};

/// Shown for dates the forecast horizon and climatology both missed.
pub const WEATHER_PENDING: &str =
    "Weather not available yet — check again closer to sail date.";

/// Merges cruise days with their forecasts by date key.
pub fn merge_timeline(
    days: &[CruiseDay],
    forecasts: &BTreeMap<NaiveDate, DailyForecast>,
) -> Vec<ItineraryDay> {
    days.iter()
        .map(|day| match forecasts.get(&day.date) {
            Some(forecast) => ItineraryDay {
                day: day.day_number,
                date: day.date,
                location: day.port_name.clone(),
                high: Some(forecast.high),
                low: Some(forecast.low),
                rain_chance: Some(forecast.rain_chance),
                icon: Some(forecast.icon),
                description: forecast.description.clone(),
                source: Some(forecast.source),
            },
            None => ItineraryDay {
                day: day.day_number,
                date: day.date,
                location: day.port_name.clone(),
                high: None,
                low: None,
                rain_chance: None,
                icon: None,
                description: WEATHER_PENDING.to_string(),
                source: None,
            },
        })
        .collect()
}

/// True when at least one merged day carries weather data. The UI uses
/// this to decide whether to show the forecast legend.
pub fn has_any_weather(days: &[ItineraryDay]) -> bool {
    days.iter().any(|d| d.source.is_some())
}
