/// Service configuration.
///
/// Values load from an optional TOML file and are then overridden by
/// environment variables (loaded through dotenv, so a local `.env` works
/// the same as real environment). API keys never live in the TOML file —
/// they come from the environment only:
///
///   CRUISECAST_DATASET_URL   bulk dataset endpoint override
///   TOMORROW_API_KEY         short-range forecast API key
///   NCEI_PROXY_BASE_URL      climate-normals proxy base URL
///
/// Every outbound HTTP call shares one deadline, `request_timeout_secs`.
/// The original client issued unbounded requests; bounding them here means
/// a hung upstream stalls one itinerary load for at most the deadline.

use std::error::Error;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const DEFAULT_DATASET_URL: &str =
    "https://api.apify.com/v2/datasets/UMBo39qEIxobhPEUY/items?format=json&clean=true";

const DEFAULT_FORECAST_URL: &str = "https://api.tomorrow.io/v4/weather/forecast";

/// Fixed result-count cap on the bulk dataset fetch. There is no paging;
/// one request returns at most this many rows.
const DEFAULT_DATASET_CAP: u32 = 5000;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bulk dataset endpoint, without the result cap parameter.
    pub dataset_url: String,
    /// Result-count cap appended to the dataset URL.
    pub dataset_result_cap: u32,
    /// Daily forecast endpoint.
    pub forecast_url: String,
    /// Forecast API key. `None` means climatology-only operation.
    pub forecast_api_key: Option<String>,
    /// Base URL of the climate-normals proxy. `None` disables backfill.
    pub normals_proxy_base: Option<String>,
    /// Unit system passed to the forecast API.
    pub units: String,
    /// Deadline for every outbound HTTP request, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataset_url: DEFAULT_DATASET_URL.to_string(),
            dataset_result_cap: DEFAULT_DATASET_CAP,
            forecast_url: DEFAULT_FORECAST_URL.to_string(),
            forecast_api_key: None,
            normals_proxy_base: None,
            units: "imperial".to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Loads configuration from a TOML file, then applies environment
    /// overrides. A missing file is not an error — defaults apply.
    pub fn load(path: &Path) -> Result<Config, Box<dyn Error>> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str(&contents)?
        } else {
            Config::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Defaults plus environment overrides, no file involved.
    pub fn from_env() -> Config {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        // Load .env if present; real environment still wins inside dotenv.
        let _ = dotenv::dotenv();

        if let Ok(url) = std::env::var("CRUISECAST_DATASET_URL") {
            if !url.trim().is_empty() {
                self.dataset_url = url;
            }
        }
        if let Ok(key) = std::env::var("TOMORROW_API_KEY") {
            if !key.trim().is_empty() {
                self.forecast_api_key = Some(key);
            }
        }
        if let Ok(base) = std::env::var("NCEI_PROXY_BASE_URL") {
            if !base.trim().is_empty() {
                self.normals_proxy_base = Some(base);
            }
        }
    }

    /// Dataset URL with the result cap applied.
    pub fn dataset_items_url(&self) -> String {
        format!("{}&limit={}", self.dataset_url, self.dataset_result_cap)
    }

    /// Normals proxy URL for one station, if a proxy base is configured.
    pub fn normals_url(&self, station_id: &str) -> Option<String> {
        let base = self.normals_proxy_base.as_deref()?;
        let trimmed = base.strip_suffix('/').unwrap_or(base);
        Some(format!("{}/ncei-normals?stationId={}", trimmed, station_id))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Blocking HTTP client with this config's deadline applied to every
    /// request.
    pub fn build_client(&self) -> Result<reqwest::blocking::Client, reqwest::Error> {
        reqwest::blocking::Client::builder()
            .timeout(self.request_timeout())
            .build()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_point_at_known_endpoints() {
        let config = Config::default();
        assert!(config.dataset_url.contains("api.apify.com"));
        assert!(config.forecast_url.contains("tomorrow.io"));
        assert_eq!(config.units, "imperial");
        assert_eq!(config.request_timeout_secs, 30);
        assert!(config.forecast_api_key.is_none());
    }

    #[test]
    fn test_dataset_items_url_appends_cap() {
        let mut config = Config::default();
        config.dataset_result_cap = 100;
        assert!(config.dataset_items_url().ends_with("&limit=100"));
    }

    #[test]
    fn test_toml_file_overrides_defaults() {
        let parsed: Config = toml::from_str(
            r#"
            dataset_result_cap = 250
            request_timeout_secs = 5
            normals_proxy_base = "https://proxy.example.com/api/"
            "#,
        )
        .expect("config TOML should parse");
        assert_eq!(parsed.dataset_result_cap, 250);
        assert_eq!(parsed.request_timeout_secs, 5);
        // Unspecified fields keep defaults.
        assert!(parsed.dataset_url.contains("api.apify.com"));
    }

    #[test]
    fn test_normals_url_strips_trailing_slash_from_base() {
        let mut config = Config::default();
        config.normals_proxy_base = Some("https://proxy.example.com/api/".to_string());
        assert_eq!(
            config.normals_url("USW00012839").as_deref(),
            Some("https://proxy.example.com/api/ncei-normals?stationId=USW00012839")
        );
    }

    #[test]
    fn test_normals_url_requires_proxy_base() {
        let config = Config::default();
        assert_eq!(config.normals_url("USW00012839"), None);
    }

    #[test]
    fn test_missing_config_file_falls_back_to_defaults() {
        let config =
            Config::load(Path::new("/nonexistent/cruisecast.toml")).expect("missing file is fine");
        assert_eq!(config.dataset_result_cap, DEFAULT_DATASET_CAP);
    }
}
