/// Packing checklist derivation.
///
/// Turns the merged forecast timeline into an ordered checklist: a few
/// sections are unconditional, the rest switch on weather features
/// derived from the itinerary (hot days, cool nights, rain likelihood).
/// Thresholds are °F and mirror what the timeline shows the user.

use crate::model::ItineraryDay;

// ---------------------------------------------------------------------------
// Checklist types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistItem {
    pub id: &'static str,
    pub label: &'static str,
    /// Optional qualifier rendered after the label.
    pub note: Option<String>,
}

impl ChecklistItem {
    fn new(id: &'static str, label: &'static str) -> Self {
        Self { id, label, note: None }
    }

    fn with_note(id: &'static str, label: &'static str, note: String) -> Self {
        Self { id, label, note: Some(note) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistSection {
    pub id: &'static str,
    pub title: &'static str,
    pub items: Vec<ChecklistItem>,
}

// ---------------------------------------------------------------------------
// Weather features
// ---------------------------------------------------------------------------

/// Booleans the sections switch on, derived in one pass over the days.
/// Days without weather data contribute nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WeatherFeatures {
    hot_days: bool,       // any high >= 85
    very_hot_days: bool,  // any high >= 90
    mild_days: bool,      // any high in 70..85
    cool_nights: bool,    // any low <= 65
    rainy_days: bool,     // any rain chance >= 50
    maybe_rain: bool,     // any rain chance in 30..50
    rainy_day_count: usize,
}

fn derive_features(days: &[ItineraryDay]) -> WeatherFeatures {
    let highs = || days.iter().filter_map(|d| d.high);
    let lows = || days.iter().filter_map(|d| d.low);
    let rain = || days.iter().filter_map(|d| d.rain_chance);

    WeatherFeatures {
        hot_days: highs().any(|h| h >= 85),
        very_hot_days: highs().any(|h| h >= 90),
        mild_days: highs().any(|h| (70..85).contains(&h)),
        cool_nights: lows().any(|l| l <= 65),
        rainy_days: rain().any(|r| r >= 50),
        maybe_rain: rain().any(|r| (30..50).contains(&r)),
        rainy_day_count: rain().filter(|r| *r >= 50).count(),
    }
}

// ---------------------------------------------------------------------------
// Checklist assembly
// ---------------------------------------------------------------------------

/// Builds the packing checklist for a merged itinerary. Empty input
/// produces an empty checklist — there is nothing to pack for.
pub fn build_checklist(days: &[ItineraryDay]) -> Vec<ChecklistSection> {
    if days.is_empty() {
        return Vec::new();
    }

    let features = derive_features(days);
    let mut sections = Vec::new();

    sections.push(ChecklistSection {
        id: "essentials",
        title: "Trip essentials",
        items: vec![
            ChecklistItem::new("passport", "Passport / government ID"),
            ChecklistItem::new("docs", "Cruise documents & luggage tags"),
            ChecklistItem::new("wallet", "Wallet, credit card, and some cash"),
            ChecklistItem::new("meds", "Prescription meds & pain reliever"),
            ChecklistItem::new("chargers", "Phone and device chargers"),
        ],
    });

    if features.hot_days || features.mild_days {
        let sun_hat = if features.very_hot_days {
            ChecklistItem::with_note(
                "sun-hat",
                "Sun hat or cap",
                "Especially helpful on very hot port days.".to_string(),
            )
        } else {
            ChecklistItem::new("sun-hat", "Sun hat or cap")
        };
        sections.push(ChecklistSection {
            id: "warm-weather",
            title: "Warm-weather clothing",
            items: vec![
                ChecklistItem::new("shirts", "Breathable shirts / tops"),
                ChecklistItem::new("shorts", "Shorts or lightweight pants"),
                ChecklistItem::new("swimsuits", "Swimsuit(s) & cover-up"),
                sun_hat,
                ChecklistItem::new("shoes", "Comfortable walking shoes or sandals"),
            ],
        });
    }

    if features.cool_nights {
        sections.push(ChecklistSection {
            id: "cool-evenings",
            title: "Cool evenings & ship interiors",
            items: vec![
                ChecklistItem::new("hoodie", "Light sweater or hoodie"),
                ChecklistItem::new("pants", "Long pants or jeans"),
                ChecklistItem::with_note(
                    "ac-layer",
                    "Extra layer for dining rooms & theaters",
                    "Ship interiors can feel chilly.".to_string(),
                ),
            ],
        });
    }

    if features.rainy_days || features.maybe_rain {
        let rain_jacket = if features.rainy_day_count > 1 {
            ChecklistItem::with_note(
                "rain-jacket",
                "Packable rain jacket or poncho",
                format!("Rain expected on about {} day(s).", features.rainy_day_count),
            )
        } else {
            ChecklistItem::new("rain-jacket", "Packable rain jacket or poncho")
        };
        sections.push(ChecklistSection {
            id: "rain",
            title: "Rain & wet-weather gear",
            items: vec![
                rain_jacket,
                ChecklistItem::new("umbrella", "Compact umbrella"),
                ChecklistItem::new("dry-bag", "Waterproof phone pouch"),
                ChecklistItem::new("extra-socks", "Extra socks"),
            ],
        });
    }

    sections.push(ChecklistSection {
        id: "nice-to-have",
        title: "Nice-to-have cruise items",
        items: vec![
            ChecklistItem::new("daypack", "Small daypack or tote"),
            ChecklistItem::new("water-bottle", "Reusable water bottle"),
            ChecklistItem::new("sea-sick", "Sea-sickness medication or bands"),
            ChecklistItem::new("luggage-tags", "Extra luggage tags / zip ties"),
        ],
    });

    sections
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(high: Option<i32>, low: Option<i32>, rain: Option<u8>) -> ItineraryDay {
        ItineraryDay {
            day: 1,
            date: NaiveDate::from_ymd_opt(2025, 11, 9).unwrap(),
            location: "Miami, FL".to_string(),
            high,
            low,
            rain_chance: rain,
            icon: None,
            description: String::new(),
            source: None,
        }
    }

    fn section_ids(sections: &[ChecklistSection]) -> Vec<&'static str> {
        sections.iter().map(|s| s.id).collect()
    }

    #[test]
    fn test_empty_itinerary_has_no_checklist() {
        assert!(build_checklist(&[]).is_empty());
    }

    #[test]
    fn test_essentials_and_nice_to_have_are_unconditional() {
        // No weather data at all: only the unconditional sections appear.
        let sections = build_checklist(&[day(None, None, None)]);
        assert_eq!(section_ids(&sections), vec!["essentials", "nice-to-have"]);
    }

    #[test]
    fn test_warm_weather_section_for_hot_or_mild_days() {
        let hot = build_checklist(&[day(Some(88), Some(75), Some(10))]);
        assert!(section_ids(&hot).contains(&"warm-weather"));

        let mild = build_checklist(&[day(Some(72), Some(68), Some(10))]);
        assert!(section_ids(&mild).contains(&"warm-weather"));

        let cold = build_checklist(&[day(Some(55), Some(48), Some(10))]);
        assert!(!section_ids(&cold).contains(&"warm-weather"));
    }

    #[test]
    fn test_very_hot_days_annotate_the_sun_hat() {
        let scorching = build_checklist(&[day(Some(93), Some(78), Some(5))]);
        let warm = scorching.iter().find(|s| s.id == "warm-weather").unwrap();
        let hat = warm.items.iter().find(|i| i.id == "sun-hat").unwrap();
        assert!(hat.note.is_some());

        let merely_hot = build_checklist(&[day(Some(86), Some(75), Some(5))]);
        let warm = merely_hot.iter().find(|s| s.id == "warm-weather").unwrap();
        let hat = warm.items.iter().find(|i| i.id == "sun-hat").unwrap();
        assert!(hat.note.is_none());
    }

    #[test]
    fn test_cool_evening_section_exactly_when_some_low_at_most_65() {
        let cool = build_checklist(&[day(Some(80), Some(65), Some(10))]);
        assert!(section_ids(&cool).contains(&"cool-evenings"));

        let warm_nights = build_checklist(&[day(Some(80), Some(66), Some(10))]);
        assert!(!section_ids(&warm_nights).contains(&"cool-evenings"));
    }

    #[test]
    fn test_rain_gear_exactly_when_some_day_reaches_30_percent() {
        let maybe = build_checklist(&[day(Some(80), Some(70), Some(30))]);
        assert!(section_ids(&maybe).contains(&"rain"));

        let dry = build_checklist(&[day(Some(80), Some(70), Some(29))]);
        assert!(!section_ids(&dry).contains(&"rain"));
    }

    #[test]
    fn test_multiple_rainy_days_annotate_the_jacket() {
        let days = vec![
            day(Some(84), Some(74), Some(60)),
            day(Some(84), Some(74), Some(55)),
            day(Some(84), Some(74), Some(10)),
        ];
        let sections = build_checklist(&days);
        let rain = sections.iter().find(|s| s.id == "rain").unwrap();
        let jacket = rain.items.iter().find(|i| i.id == "rain-jacket").unwrap();
        assert_eq!(
            jacket.note.as_deref(),
            Some("Rain expected on about 2 day(s).")
        );
    }

    #[test]
    fn test_sections_keep_stable_order() {
        let days = vec![day(Some(88), Some(60), Some(70))];
        let sections = build_checklist(&days);
        assert_eq!(
            section_ids(&sections),
            vec!["essentials", "warm-weather", "cool-evenings", "rain", "nice-to-have"]
        );
    }
}
