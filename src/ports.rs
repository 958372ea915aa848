/// Port registry for the cruise-planning service.
///
/// Defines the canonical table of cruise ports this service can resolve,
/// along with their forecast coordinates and, where one exists, the NCEI
/// climate-normals station used for long-range backfill. This is the
/// single source of truth for port resolution — other modules should call
/// `resolve_port` rather than hardcoding coordinates.
///
/// Resolution is a pure function: normalize the label, try an exact key
/// match, then substring containment with candidate keys ordered by
/// descending length so the most specific key wins deterministically, and
/// finally fall back to Miami with its known station.

use crate::model::ResolvedPort;

// ---------------------------------------------------------------------------
// Port metadata
// ---------------------------------------------------------------------------

/// Metadata for a single resolvable port.
pub struct Port {
    /// Lowercase lookup key matched against normalized stop labels.
    pub key: &'static str,
    /// Display / geocoding label, e.g. "Fort Lauderdale, FL".
    pub location: &'static str,
    /// WGS84 latitude.
    pub lat: f64,
    /// WGS84 longitude.
    pub lon: f64,
    /// NCEI monthly-normals station, where one is mapped. Most non-US
    /// ports have none; their out-of-range days stay pending.
    pub station_id: Option<&'static str>,
}

/// All ports known to the resolver, grouped by region.
///
/// Sources:
///   - Coordinates: port authority / city coordinates as shipped in the UI
///   - Stations: NOAA NCEI normals-monthly station identifiers
pub static PORT_REGISTRY: &[Port] = &[
    // -------------------------
    // UNITED STATES — HOME PORTS
    // -------------------------
    Port { key: "miami", location: "Miami, FL", lat: 25.7617, lon: -80.1918, station_id: Some("USW00012839") },
    Port { key: "fort lauderdale", location: "Fort Lauderdale, FL", lat: 26.1224, lon: -80.1373, station_id: Some("USW00012849") },
    Port { key: "port canaveral", location: "Port Canaveral, FL", lat: 28.4101, lon: -80.6372, station_id: Some("USW00012815") },
    Port { key: "tampa", location: "Tampa, FL", lat: 27.9506, lon: -82.4572, station_id: Some("USW00012842") },
    Port { key: "jacksonville", location: "Jacksonville, FL", lat: 30.3322, lon: -81.6557, station_id: None },
    Port { key: "mobile", location: "Mobile, AL", lat: 30.6954, lon: -88.0399, station_id: None },
    Port { key: "new orleans", location: "New Orleans, LA", lat: 29.9511, lon: -90.0715, station_id: None },
    Port { key: "galveston", location: "Galveston, TX", lat: 29.3013, lon: -94.7977, station_id: Some("USW00012923") },
    Port { key: "los angeles", location: "Los Angeles, CA", lat: 34.0522, lon: -118.2437, station_id: None },
    Port { key: "san pedro", location: "San Pedro, CA", lat: 33.7361, lon: -118.2923, station_id: None },
    Port { key: "long beach", location: "Long Beach, CA", lat: 33.7701, lon: -118.1937, station_id: None },
    Port { key: "san diego", location: "San Diego, CA", lat: 32.7157, lon: -117.1611, station_id: None },
    Port { key: "seattle", location: "Seattle, WA", lat: 47.6062, lon: -122.3321, station_id: None },
    Port { key: "new york", location: "New York, NY", lat: 40.7128, lon: -74.0060, station_id: None },
    Port { key: "cape liberty", location: "Bayonne, NJ", lat: 40.6687, lon: -74.1143, station_id: None },
    Port { key: "boston", location: "Boston, MA", lat: 42.3601, lon: -71.0589, station_id: None },
    Port { key: "baltimore", location: "Baltimore, MD", lat: 39.2904, lon: -76.6122, station_id: None },
    // -------------------------
    // BAHAMAS
    // -------------------------
    Port { key: "nassau", location: "Nassau, Bahamas", lat: 25.047984, lon: -77.355413, station_id: None },
    Port { key: "coco cay", location: "Coco Cay, Bahamas", lat: 25.816, lon: -77.945, station_id: None },
    Port { key: "half moon cay", location: "Half Moon Cay, Bahamas", lat: 24.5743, lon: -75.9513, station_id: None },
    Port { key: "princess cays", location: "Princess Cays, Bahamas", lat: 25.1436, lon: -77.259, station_id: None },
    Port { key: "bimini", location: "Bimini, Bahamas", lat: 25.728, lon: -79.298, station_id: None },
    // -------------------------
    // CARIBBEAN
    // -------------------------
    Port { key: "cozumel", location: "Cozumel, Mexico", lat: 20.4229839, lon: -86.9223432, station_id: None },
    Port { key: "costa maya", location: "Costa Maya, Mexico", lat: 18.7334, lon: -87.7006, station_id: None },
    Port { key: "progreso", location: "Progreso, Mexico", lat: 21.2833, lon: -89.6667, station_id: None },
    Port { key: "amber cove", location: "Amber Cove, Dominican Republic", lat: 19.757, lon: -70.568, station_id: None },
    Port { key: "puerto plata", location: "Puerto Plata, Dominican Republic", lat: 19.7808, lon: -70.6871, station_id: None },
    Port { key: "ocho rios", location: "Ocho Rios, Jamaica", lat: 18.4057, lon: -77.1048, station_id: None },
    Port { key: "falmouth", location: "Falmouth, Jamaica", lat: 18.4937, lon: -77.6550, station_id: None },
    Port { key: "montego bay", location: "Montego Bay, Jamaica", lat: 18.4762, lon: -77.8939, station_id: None },
    Port { key: "grand cayman", location: "George Town, Cayman Islands", lat: 19.2869, lon: -81.3678, station_id: None },
    Port { key: "roatan", location: "Roatán, Honduras", lat: 16.316, lon: -86.54, station_id: None },
    Port { key: "mahogany bay", location: "Mahogany Bay, Honduras", lat: 16.316, lon: -86.54, station_id: None },
    Port { key: "belize", location: "Belize City, Belize", lat: 17.5046, lon: -88.1962, station_id: None },
    Port { key: "grand turk", location: "Cockburn Town, Turks and Caicos", lat: 21.467458, lon: -71.13891, station_id: None },
    Port { key: "st thomas", location: "Charlotte Amalie, USVI", lat: 18.3419, lon: -64.9307, station_id: None },
    Port { key: "st maarten", location: "Philipsburg, St. Maarten", lat: 18.0260, lon: -63.0458, station_id: None },
    Port { key: "antigua", location: "St. John's, Antigua", lat: 17.1274, lon: -61.8468, station_id: None },
    Port { key: "st kitts", location: "Basseterre, St. Kitts", lat: 17.3026, lon: -62.7177, station_id: None },
    Port { key: "martinique", location: "Fort-de-France, Martinique", lat: 14.6104, lon: -61.08, station_id: None },
    Port { key: "grenada", location: "St. George's, Grenada", lat: 12.0561, lon: -61.7486, station_id: None },
    Port { key: "barbados", location: "Bridgetown, Barbados", lat: 13.1132, lon: -59.5988, station_id: None },
    // -------------------------
    // BERMUDA
    // -------------------------
    Port { key: "king's wharf", location: "Dockyard, Bermuda", lat: 32.325, lon: -64.837, station_id: None },
    // -------------------------
    // PANAMA / CENTRAL AMERICA
    // -------------------------
    Port { key: "cartagena", location: "Cartagena, Colombia", lat: 10.391, lon: -75.4794, station_id: None },
    Port { key: "colon", location: "Colón, Panama", lat: 9.3589, lon: -79.9001, station_id: None },
    Port { key: "puerto limon", location: "Puerto Limón, Costa Rica", lat: 9.99, lon: -83.036, station_id: None },
    // -------------------------
    // MEDITERRANEAN
    // -------------------------
    Port { key: "barcelona", location: "Barcelona, Spain", lat: 41.3851, lon: 2.1734, station_id: None },
    Port { key: "civitavecchia", location: "Civitavecchia, Italy", lat: 42.0924, lon: 11.7835, station_id: None },
    Port { key: "naples", location: "Naples, Italy", lat: 40.8518, lon: 14.2681, station_id: None },
    Port { key: "athens", location: "Piraeus, Greece", lat: 37.948, lon: 23.643, station_id: None },
    Port { key: "istanbul", location: "Istanbul, Türkiye", lat: 41.0082, lon: 28.9784, station_id: None },
    Port { key: "malta", location: "Valletta, Malta", lat: 35.8989, lon: 14.5146, station_id: None },
    Port { key: "kotor", location: "Kotor, Montenegro", lat: 42.4247, lon: 18.7712, station_id: None },
    // -------------------------
    // NORTHERN EUROPE / NORWAY
    // -------------------------
    Port { key: "bergen", location: "Bergen, Norway", lat: 60.3913, lon: 5.3221, station_id: None },
    Port { key: "flam", location: "Flåm, Norway", lat: 60.8611, lon: 7.1134, station_id: None },
    Port { key: "alesund", location: "Ålesund, Norway", lat: 62.4722, lon: 6.1549, station_id: None },
    Port { key: "geiranger", location: "Geiranger, Norway", lat: 62.1024, lon: 7.2057, station_id: None },
    Port { key: "maloy", location: "Måløy, Norway", lat: 61.9354, lon: 5.1139, station_id: None },
    Port { key: "floro", location: "Florø, Norway", lat: 61.5994, lon: 5.0328, station_id: None },
    // -------------------------
    // MIDDLE EAST
    // -------------------------
    Port { key: "dubai", location: "Dubai, UAE", lat: 25.2048, lon: 55.2708, station_id: None },
    Port { key: "abu dhabi", location: "Abu Dhabi, UAE", lat: 24.4539, lon: 54.3773, station_id: None },
    Port { key: "doha", location: "Doha, Qatar", lat: 25.2854, lon: 51.5310, station_id: None },
    // -------------------------
    // ASIA
    // -------------------------
    Port { key: "singapore", location: "Singapore", lat: 1.3521, lon: 103.8198, station_id: None },
    Port { key: "tokyo", location: "Tokyo, Japan", lat: 35.6762, lon: 139.6503, station_id: None },
    Port { key: "osaka", location: "Osaka, Japan", lat: 34.6937, lon: 135.5023, station_id: None },
    Port { key: "hong kong", location: "Hong Kong", lat: 22.3193, lon: 114.1694, station_id: None },
    Port { key: "seoul", location: "Incheon, South Korea", lat: 37.4563, lon: 126.7052, station_id: None },
    // -------------------------
    // AUSTRALIA / NEW ZEALAND
    // -------------------------
    Port { key: "sydney", location: "Sydney, Australia", lat: -33.8688, lon: 151.2093, station_id: None },
    Port { key: "melbourne", location: "Melbourne, Australia", lat: -37.8136, lon: 144.9631, station_id: None },
    Port { key: "brisbane", location: "Brisbane, Australia", lat: -27.4698, lon: 153.0251, station_id: None },
    Port { key: "auckland", location: "Auckland, New Zealand", lat: -36.8485, lon: 174.7633, station_id: None },
    Port { key: "wellington", location: "Wellington, New Zealand", lat: -41.2865, lon: 174.7762, station_id: None },
    // -------------------------
    // HAWAII
    // -------------------------
    Port { key: "honolulu", location: "Honolulu, HI", lat: 21.3099, lon: -157.8581, station_id: None },
    Port { key: "kahului", location: "Kahului, Maui", lat: 20.889, lon: -156.47, station_id: None },
    Port { key: "hilo", location: "Hilo, Big Island", lat: 19.7297, lon: -155.09, station_id: None },
    Port { key: "kona", location: "Kailua-Kona, Big Island", lat: 19.63999, lon: -155.99693, station_id: None },
    Port { key: "nawiliwili", location: "Nawiliwili, Kauai", lat: 21.9639, lon: -159.352, station_id: None },
    // -------------------------
    // ALASKA
    // -------------------------
    Port { key: "juneau", location: "Juneau, AK", lat: 58.3019, lon: -134.4197, station_id: Some("USW00025309") },
    Port { key: "skagway", location: "Skagway, AK", lat: 59.4583, lon: -135.3139, station_id: None },
    Port { key: "ketchikan", location: "Ketchikan, AK", lat: 55.3422, lon: -131.6461, station_id: None },
    Port { key: "sitka", location: "Sitka, AK", lat: 57.0531, lon: -135.33, station_id: None },
    // -------------------------
    // CANADA / NEW ENGLAND
    // -------------------------
    Port { key: "halifax", location: "Halifax, Nova Scotia", lat: 44.6488, lon: -63.5752, station_id: None },
    Port { key: "saint john", location: "Saint John, New Brunswick", lat: 45.2733, lon: -66.0633, station_id: None },
    Port { key: "quebec city", location: "Québec City, Canada", lat: 46.8139, lon: -71.2082, station_id: None },
    Port { key: "charlottetown", location: "Charlottetown, PEI", lat: 46.2382, lon: -63.1311, station_id: None },
    Port { key: "portland maine", location: "Portland, ME", lat: 43.6591, lon: -70.2568, station_id: None },
    // -------------------------
    // SOUTH AMERICA
    // -------------------------
    Port { key: "buenos aires", location: "Buenos Aires, Argentina", lat: -34.6037, lon: -58.3816, station_id: None },
    Port { key: "rio de janeiro", location: "Rio de Janeiro, Brazil", lat: -22.9068, lon: -43.1729, station_id: None },
    Port { key: "valparaiso", location: "Valparaíso, Chile", lat: -33.0472, lon: -71.6127, station_id: None },
    // -------------------------
    // TRANSATLANTIC FAVORITES
    // -------------------------
    Port { key: "southampton", location: "Southampton, UK", lat: 50.9097, lon: -1.4043, station_id: None },
    Port { key: "lisbon", location: "Lisbon, Portugal", lat: 38.7223, lon: -9.1393, station_id: None },
    Port { key: "funchal", location: "Funchal, Madeira", lat: 32.6669, lon: -16.9241, station_id: None },
];

/// Fallback when nothing in the registry matches: Miami, with its station.
const DEFAULT_PORT: Port = Port {
    key: "miami",
    location: "Miami, FL",
    lat: 25.7617,
    lon: -80.1918,
    station_id: Some("USW00012839"),
};

// ---------------------------------------------------------------------------
// Home-port climate stations
// ---------------------------------------------------------------------------

/// Embarkation cities mapped to NCEI normals stations. Consulted when a
/// resolved registry entry carries no station of its own — normals
/// coverage is far better for US home ports than for ports of call.
static HOME_PORT_STATIONS: &[(&str, &str)] = &[
    ("miami", "USW00012839"),
    ("fort lauderdale", "USW00012849"),
    ("port everglades", "USW00012849"),
    ("tampa", "USW00012842"),
    ("galveston", "USW00012923"),
    ("new orleans", "USW00012916"),
    ("los angeles", "USW00023174"),
    ("long beach", "USW00023129"),
    ("san diego", "USW00023188"),
    ("seattle", "USW00024233"),
    ("san francisco", "USW00023272"),
    ("cape liberty", "USW00014734"),
    ("bayonne", "USW00014734"),
    ("charleston", "USW00013782"),
    ("jacksonville", "USW00013889"),
    ("port canaveral", "USW00012815"),
    ("orlando", "USW00012815"),
    ("mobile", "USW00013896"),
];

// ---------------------------------------------------------------------------
// Label normalization
// ---------------------------------------------------------------------------

/// Normalizes a raw stop label for registry matching: strips the
/// "Departing from" prefix and any parenthesized qualifiers (e.g.
/// "(Embarkation)"), lowercases, and collapses whitespace.
pub fn normalize_port_label(raw: &str) -> String {
    let lower = raw.to_lowercase();
    let stripped = lower
        .trim()
        .strip_prefix("departing from")
        .unwrap_or(lower.trim());

    // Drop (...) blocks without regex: copy everything outside parens.
    let mut out = String::with_capacity(stripped.len());
    let mut depth = 0usize;
    for ch in stripped.chars() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(ch),
            _ => {}
        }
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

fn registry_lookup(normalized: &str) -> Option<&'static Port> {
    if normalized.is_empty() {
        return None;
    }

    // 1) Exact key match.
    if let Some(port) = PORT_REGISTRY.iter().find(|p| p.key == normalized) {
        return Some(port);
    }

    // 2) Substring containment. Longest matching key wins so that e.g.
    //    "portland maine" beats any shorter overlapping key.
    PORT_REGISTRY
        .iter()
        .filter(|p| normalized.contains(p.key))
        .max_by_key(|p| p.key.len())
}

/// Resolves a free-text port label to a forecast location and optional
/// climate station. Pure function; total — unknown labels resolve to the
/// Miami default rather than failing.
pub fn resolve_port(raw: &str) -> ResolvedPort {
    let normalized = normalize_port_label(raw);
    let port = registry_lookup(&normalized).unwrap_or(&DEFAULT_PORT);
    ResolvedPort {
        location: port.location.to_string(),
        lat: port.lat,
        lon: port.lon,
        station_id: port.station_id.map(String::from),
    }
}

/// Looks up an NCEI station for an embarkation city label. Exact match
/// first, then longest-key containment. Returns `None` for cities with no
/// mapped station.
pub fn station_for_city(city: &str) -> Option<&'static str> {
    let normalized = normalize_port_label(city);
    if normalized.is_empty() {
        return None;
    }

    if let Some((_, station)) = HOME_PORT_STATIONS.iter().find(|(key, _)| *key == normalized) {
        return Some(*station);
    }

    HOME_PORT_STATIONS
        .iter()
        .filter(|(key, _)| normalized.contains(key))
        .max_by_key(|(key, _)| key.len())
        .map(|(_, station)| *station)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_keys_are_normalized_and_unique() {
        let mut seen = std::collections::HashSet::new();
        for port in PORT_REGISTRY {
            assert_eq!(
                port.key,
                port.key.to_lowercase(),
                "registry key '{}' must be lowercase",
                port.key
            );
            assert_eq!(
                port.key,
                port.key.trim(),
                "registry key '{}' must be trimmed",
                port.key
            );
            assert!(
                seen.insert(port.key),
                "duplicate registry key '{}'",
                port.key
            );
        }
    }

    #[test]
    fn test_registry_coordinates_are_in_range() {
        for port in PORT_REGISTRY {
            assert!(
                (-90.0..=90.0).contains(&port.lat),
                "latitude out of range for '{}'",
                port.key
            );
            assert!(
                (-180.0..=180.0).contains(&port.lon),
                "longitude out of range for '{}'",
                port.key
            );
        }
    }

    #[test]
    fn test_station_ids_look_like_ncei_identifiers() {
        // NCEI normals stations are 11 characters, e.g. "USW00012839".
        let registry_stations = PORT_REGISTRY.iter().filter_map(|p| p.station_id);
        let home_stations = HOME_PORT_STATIONS.iter().map(|(_, s)| *s);
        for station in registry_stations.chain(home_stations) {
            assert_eq!(station.len(), 11, "station id '{}' has wrong length", station);
            assert!(
                station.chars().all(|c| c.is_ascii_alphanumeric()),
                "station id '{}' should be alphanumeric",
                station
            );
        }
    }

    #[test]
    fn test_resolution_is_pure_and_case_insensitive() {
        let a = resolve_port("Cozumel, Mexico");
        let b = resolve_port("cozumel");
        assert_eq!(a, b, "different casings of the same port must resolve identically");
        assert_eq!(a.location, "Cozumel, Mexico");
    }

    #[test]
    fn test_departing_from_prefix_is_stripped() {
        let resolved = resolve_port("Departing from Fort Lauderdale, Florida");
        assert_eq!(resolved.location, "Fort Lauderdale, FL");
        assert_eq!(resolved.lat, 26.1224);
        assert_eq!(resolved.lon, -80.1373);
        assert_eq!(resolved.station_id.as_deref(), Some("USW00012849"));
    }

    #[test]
    fn test_parenthesized_qualifiers_are_ignored() {
        let resolved = resolve_port("Nassau (Bahamas)");
        assert_eq!(resolved.location, "Nassau, Bahamas");
    }

    #[test]
    fn test_unknown_port_falls_back_to_miami_default() {
        let resolved = resolve_port("Somewhere Nobody Sails");
        assert_eq!(resolved.location, "Miami, FL");
        assert_eq!(resolved.station_id.as_deref(), Some("USW00012839"));

        let empty = resolve_port("");
        assert_eq!(empty, resolved);
    }

    #[test]
    fn test_longest_matching_key_wins() {
        // "portland maine" contains no other registry key, so fabricate the
        // overlap the other way: a label containing both "san diego" and a
        // shorter key cannot exist in the registry, so check ordering with
        // "saint john" vs "san" style overlaps directly.
        let label = "portland maine cruise terminal";
        let resolved = resolve_port(label);
        assert_eq!(resolved.location, "Portland, ME");

        // "cape liberty cruise port, bayonne" contains both "cape liberty"
        // (12 chars) and no shorter key — resolves to Bayonne coordinates.
        let liberty = resolve_port("Cape Liberty Cruise Port");
        assert_eq!(liberty.location, "Bayonne, NJ");
    }

    #[test]
    fn test_station_for_city_exact_and_substring() {
        assert_eq!(station_for_city("miami"), Some("USW00012839"));
        assert_eq!(
            station_for_city("Port Everglades (Fort Lauderdale, Florida)"),
            Some("USW00012849")
        );
        assert_eq!(station_for_city("miami, florida"), Some("USW00012839"));
        assert_eq!(station_for_city("atlantis"), None);
    }

    #[test]
    fn test_home_port_station_substring_prefers_longest_key() {
        // "fort lauderdale" (15) and "port everglades" (15) both map to the
        // same station, so any tie is invisible; "miami" (5) inside a longer
        // label must not shadow a longer match.
        assert_eq!(
            station_for_city("port canaveral near orlando"),
            Some("USW00012815"),
            "longest containment match should win"
        );
    }
}
