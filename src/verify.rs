//! External Interface Verification Module
//!
//! Framework for testing the configured external collaborators — the bulk
//! dataset endpoint, the forecast API, and the climate-normals proxy —
//! to determine which are reachable and returning usable data.
//!
//! Use this after changing configuration or credentials to validate the
//! deployment before users hit a degraded pipeline.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;

use crate::config::Config;
use crate::ingest::dataset;
use crate::ports::PORT_REGISTRY;

// ============================================================================
// Verification Results
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub timestamp: String,
    pub dataset_result: DatasetVerification,
    pub forecast_result: ForecastVerification,
    pub normals_results: Vec<NormalsVerification>,
    pub summary: VerificationSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationSummary {
    pub dataset_working: bool,
    pub forecast_working: bool,
    pub normals_total: usize,
    pub normals_working: usize,
    pub normals_failed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetVerification {
    pub status: VerificationStatus,
    pub endpoint_reachable: bool,
    pub record_count: usize,
    pub records_with_ship_name: usize,
    pub records_with_parseable_date: usize,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastVerification {
    pub status: VerificationStatus,
    pub api_key_present: bool,
    pub api_responsive: bool,
    pub sample_point_count: usize,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalsVerification {
    pub station_id: String,
    pub status: VerificationStatus,
    pub proxy_responsive: bool,
    pub monthly_row_count: usize,
    pub months_covered: Vec<u32>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum VerificationStatus {
    Success,
    PartialSuccess,
    Failed,
}

// ============================================================================
// Dataset Verification
// ============================================================================

pub fn verify_dataset_endpoint(
    client: &reqwest::blocking::Client,
    config: &Config,
) -> DatasetVerification {
    let mut result = DatasetVerification {
        status: VerificationStatus::Failed,
        endpoint_reachable: false,
        record_count: 0,
        records_with_ship_name: 0,
        records_with_parseable_date: 0,
        error_message: None,
    };

    match dataset::fetch_dataset(client, config) {
        Ok(records) => {
            result.endpoint_reachable = true;
            result.record_count = records.len();
            result.records_with_ship_name = records
                .iter()
                .filter(|r| r.ship_name.as_deref().is_some_and(|s| !s.trim().is_empty()))
                .count();
            result.records_with_parseable_date = records
                .iter()
                .filter(|r| {
                    r.cruise_date
                        .as_deref()
                        .and_then(dataset::date_label_to_iso)
                        .is_some()
                })
                .count();
        }
        Err(e) => {
            result.error_message = Some(e.to_string());
        }
    }

    // Determine status
    if result.endpoint_reachable && result.record_count > 0 {
        if result.records_with_parseable_date == result.record_count {
            result.status = VerificationStatus::Success;
        } else {
            result.status = VerificationStatus::PartialSuccess;
        }
    }

    result
}

// ============================================================================
// Forecast Verification
// ============================================================================

pub fn verify_forecast_api(
    client: &reqwest::blocking::Client,
    config: &Config,
) -> ForecastVerification {
    let mut result = ForecastVerification {
        status: VerificationStatus::Failed,
        api_key_present: config.forecast_api_key.is_some(),
        api_responsive: false,
        sample_point_count: 0,
        error_message: None,
    };

    let Some(api_key) = config.forecast_api_key.as_deref() else {
        result.error_message = Some("No API key configured".to_string());
        return result;
    };

    // Test: request a 3-day Miami window
    let start = Utc::now();
    let end = start + Duration::days(3);
    let response = client
        .get(&config.forecast_url)
        .query(&[
            ("location", "25.7617,-80.1918"),
            ("timesteps", "1d"),
            ("apikey", api_key),
            ("units", config.units.as_str()),
            ("startTime", start.to_rfc3339().as_str()),
            ("endTime", end.to_rfc3339().as_str()),
        ])
        .send();

    match response {
        Ok(response) => {
            if response.status().is_success() {
                result.api_responsive = true;
                match response.json::<crate::ingest::forecast::ForecastResponse>() {
                    Ok(body) => {
                        result.sample_point_count = body.timelines.daily.len();
                    }
                    Err(e) => {
                        result.error_message = Some(format!("Parse error: {}", e));
                    }
                }
            } else {
                result.error_message = Some(format!("HTTP {}", response.status()));
            }
        }
        Err(e) => {
            result.error_message = Some(format!("Request failed: {}", e));
        }
    }

    // Determine status
    if result.api_responsive {
        if result.sample_point_count > 0 {
            result.status = VerificationStatus::Success;
        } else {
            result.status = VerificationStatus::PartialSuccess;
        }
    }

    result
}

// ============================================================================
// Normals Proxy Verification
// ============================================================================

pub fn verify_normals_station(
    client: &reqwest::blocking::Client,
    config: &Config,
    station_id: &str,
) -> NormalsVerification {
    let mut result = NormalsVerification {
        station_id: station_id.to_string(),
        status: VerificationStatus::Failed,
        proxy_responsive: false,
        monthly_row_count: 0,
        months_covered: Vec::new(),
        error_message: None,
    };

    let Some(url) = config.normals_url(station_id) else {
        result.error_message = Some("No proxy base URL configured".to_string());
        return result;
    };

    match client.get(&url).send() {
        Ok(response) => {
            if response.status().is_success() {
                result.proxy_responsive = true;

                // Parse as generic JSON and count month coverage
                match response.json::<serde_json::Value>() {
                    Ok(body) => {
                        let rows = match &body {
                            serde_json::Value::Array(items) => items.clone(),
                            other => vec![other.clone()],
                        };
                        result.monthly_row_count = rows.len();
                        for row in &rows {
                            let month = row
                                .get("MONTH")
                                .and_then(|m| m.as_str())
                                .and_then(|m| m.parse::<u32>().ok())
                                .or_else(|| {
                                    row.get("DATE")
                                        .and_then(|d| d.as_str())
                                        .and_then(|d| d.get(5..7))
                                        .and_then(|m| m.parse::<u32>().ok())
                                });
                            if let Some(m) = month {
                                if (1..=12).contains(&m) && !result.months_covered.contains(&m) {
                                    result.months_covered.push(m);
                                }
                            }
                        }
                        result.months_covered.sort_unstable();
                    }
                    Err(e) => {
                        result.error_message = Some(format!("Parse error: {}", e));
                    }
                }
            } else {
                result.error_message = Some(format!("HTTP {}", response.status()));
            }
        }
        Err(e) => {
            result.error_message = Some(format!("Request failed: {}", e));
        }
    }

    // Determine status
    if result.proxy_responsive {
        if result.months_covered.len() == 12 {
            result.status = VerificationStatus::Success;
        } else if !result.months_covered.is_empty() {
            result.status = VerificationStatus::PartialSuccess;
        }
    }

    result
}

// ============================================================================
// Full Verification Runner
// ============================================================================

pub fn run_full_verification(config: &Config) -> Result<VerificationReport, Box<dyn Error>> {
    let client = config.build_client()?;

    println!("Verifying dataset endpoint...");
    let dataset_result = verify_dataset_endpoint(&client, config);
    match dataset_result.status {
        VerificationStatus::Success => println!(
            "  ✓ OK ({} records)",
            dataset_result.record_count
        ),
        VerificationStatus::PartialSuccess => println!(
            "  ⚠ Partial ({}/{} records with parseable dates)",
            dataset_result.records_with_parseable_date, dataset_result.record_count
        ),
        VerificationStatus::Failed => println!(
            "  ✗ FAILED: {}",
            dataset_result.error_message.as_deref().unwrap_or("Unknown")
        ),
    }

    println!("\nVerifying forecast API...");
    let forecast_result = verify_forecast_api(&client, config);
    match forecast_result.status {
        VerificationStatus::Success => println!(
            "  ✓ OK ({} daily points)",
            forecast_result.sample_point_count
        ),
        VerificationStatus::PartialSuccess => println!("  ⚠ Responsive but empty series"),
        VerificationStatus::Failed => println!(
            "  ✗ FAILED: {}",
            forecast_result.error_message.as_deref().unwrap_or("Unknown")
        ),
    }

    // Verify every station the port registry can hand to the backfill
    println!("\nVerifying climate-normals proxy...");
    let mut normals_results = Vec::new();
    let mut stations: Vec<&str> = PORT_REGISTRY.iter().filter_map(|p| p.station_id).collect();
    stations.sort_unstable();
    stations.dedup();

    for station_id in stations {
        print!("  {} ... ", station_id);
        let result = verify_normals_station(&client, config, station_id);

        match result.status {
            VerificationStatus::Success => {
                println!("✓ OK ({} rows, 12 months)", result.monthly_row_count);
            }
            VerificationStatus::PartialSuccess => {
                println!(
                    "⚠ Partial ({} rows, months: {:?})",
                    result.monthly_row_count, result.months_covered
                );
            }
            VerificationStatus::Failed => {
                println!(
                    "✗ FAILED: {}",
                    result.error_message.as_deref().unwrap_or("Unknown")
                );
            }
        }

        normals_results.push(result);
    }

    let summary = VerificationSummary {
        dataset_working: dataset_result.status != VerificationStatus::Failed,
        forecast_working: forecast_result.status != VerificationStatus::Failed,
        normals_total: normals_results.len(),
        normals_working: normals_results
            .iter()
            .filter(|r| r.status != VerificationStatus::Failed)
            .count(),
        normals_failed: normals_results
            .iter()
            .filter(|r| r.status == VerificationStatus::Failed)
            .count(),
    };

    Ok(VerificationReport {
        timestamp: Utc::now().to_rfc3339(),
        dataset_result,
        forecast_result,
        normals_results,
        summary,
    })
}

pub fn print_summary(report: &VerificationReport) {
    println!("\n═══════════════════════════════════════════════════════════");
    println!("VERIFICATION SUMMARY");
    println!("═══════════════════════════════════════════════════════════");
    println!();
    println!(
        "Dataset endpoint:  {}",
        if report.summary.dataset_working { "working" } else { "FAILED" }
    );
    println!(
        "Forecast API:      {}",
        if report.summary.forecast_working { "working" } else { "FAILED" }
    );
    println!(
        "Normals stations:  {}/{} working  ({} failed)",
        report.summary.normals_working, report.summary.normals_total, report.summary.normals_failed
    );
    println!("═══════════════════════════════════════════════════════════");
}
