/// Pipeline orchestration.
///
/// `CruisePlanner` owns the HTTP client, the configuration, and the cache
/// holder, and sequences the forward data flow for one selection:
/// dataset → itinerary → port resolution → forecast + climatology →
/// timeline merge. Construct one planner per process (caches live as long
/// as the planner) or a fresh one per test for isolation.
///
/// Error policy follows the pipeline's split: dataset problems surface as
/// errors; weather problems degrade to a partial timeline.

use chrono::{DateTime, NaiveDate, Utc};

use crate::cache::Cache;
use crate::config::Config;
use crate::ingest::dataset::{self, CruiseLineOption, ShipOption};
use crate::ingest::forecast::{self, ForecastCaches};
use crate::itinerary;
use crate::model::{
    CruiseSummary, DatasetError, ItineraryDay, ItineraryError, ResolvedPort, SailingRecord,
};
use crate::ports;
use crate::timeline;

// ---------------------------------------------------------------------------
// Cache holder
// ---------------------------------------------------------------------------

/// All of the pipeline's memoization state, bundled so entry points (and
/// tests) can create isolated instances instead of sharing process-wide
/// globals.
pub struct PipelineCaches {
    pub dataset: Cache<(), Vec<SailingRecord>>,
    pub weather: ForecastCaches,
}

impl PipelineCaches {
    pub fn new() -> Self {
        Self {
            dataset: Cache::default(),
            weather: ForecastCaches::new(),
        }
    }
}

impl Default for PipelineCaches {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Planner
// ---------------------------------------------------------------------------

pub struct CruisePlanner {
    client: reqwest::blocking::Client,
    config: Config,
    caches: PipelineCaches,
}

impl CruisePlanner {
    /// Builds a planner with fresh caches. Fails only if the HTTP client
    /// cannot be constructed.
    pub fn new(config: Config) -> Result<Self, reqwest::Error> {
        let client = config.build_client()?;
        Ok(Self {
            client,
            config,
            caches: PipelineCaches::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn records(&self) -> Result<Vec<SailingRecord>, DatasetError> {
        dataset::load_dataset(&self.client, &self.config, &self.caches.dataset)
    }

    fn records_at(&self, today: NaiveDate) -> Result<Vec<SailingRecord>, DatasetError> {
        dataset::load_dataset_at(&self.client, &self.config, &self.caches.dataset, today)
    }

    /// Cruise line and ship options for the selection form.
    pub fn cruise_options(&self) -> Result<(Vec<CruiseLineOption>, Vec<ShipOption>), DatasetError> {
        Ok(dataset::cruise_options(&self.records()?))
    }

    /// All sailings departing on a date, for the calendar view.
    pub fn search_by_date(&self, sail_date: NaiveDate) -> Result<Vec<CruiseSummary>, DatasetError> {
        Ok(dataset::search_by_date(&self.records()?, sail_date))
    }

    /// Upcoming sailings for one ship, for the sailings calendar.
    pub fn sailings_for_ship(&self, ship_name: &str) -> Result<Vec<CruiseSummary>, DatasetError> {
        Ok(dataset::sailings_for_ship(&self.records()?, ship_name))
    }

    /// The full pipeline for one (ship, sail date) selection: normalized
    /// itinerary merged with whatever weather could be resolved.
    pub fn itinerary_with_forecasts(
        &self,
        ship_name: &str,
        sail_date: NaiveDate,
    ) -> Result<Vec<ItineraryDay>, ItineraryError> {
        self.itinerary_with_forecasts_at(ship_name, sail_date, Utc::now())
    }

    /// Clock-injected variant: `now` anchors both the dataset completion
    /// filter and the forecast window clamp.
    pub fn itinerary_with_forecasts_at(
        &self,
        ship_name: &str,
        sail_date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Vec<ItineraryDay>, ItineraryError> {
        let records = self.records_at(now.date_naive())?;
        let days = itinerary::build_itinerary(&records, ship_name, sail_date)?;
        if days.is_empty() {
            return Ok(Vec::new());
        }

        // The embarkation port anchors the whole forecast: one location,
        // one station, all itinerary dates.
        let port = self.embarkation_port(&days[0].port_name);
        let dates: Vec<NaiveDate> = days.iter().map(|d| d.date).collect();

        let forecasts = forecast::daily_forecasts_at(
            &self.client,
            &self.config,
            &self.caches.weather,
            &port.coordinate_param(),
            &dates,
            port.station_id.as_deref(),
            now,
        );

        Ok(timeline::merge_timeline(&days, &forecasts))
    }

    /// Resolves the embarkation port, borrowing a home-port station when
    /// the registry entry has none of its own.
    fn embarkation_port(&self, first_port_label: &str) -> ResolvedPort {
        let mut port = ports::resolve_port(first_port_label);
        if port.station_id.is_none() {
            port.station_id = ports::station_for_city(first_port_label).map(String::from);
        }
        port
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
