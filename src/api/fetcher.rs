//! Air quality acquisition for a coordinate pair.
//!
//! `AirQualityFetcher::fetch` never fails: network errors, non-2xx statuses
//! and malformed payloads all resolve to the fallback dataset. Results for
//! superseded requests are returned to their caller but never committed.

use crate::api::{fallback_dataset, fetch_with_retry, AirQualitySource, RetryPolicy};
use crate::clock::Clock;
use crate::critical;
use crate::error::{AppError, Result};
use crate::lock;
use crate::models::{
    coerce_number, hour_label, AirQualityDataset, AirQualityResponse, HourlyEntry, Pollutant,
    PollutantReadings, HOURS_PER_DAY,
};
use chrono::{DateTime, NaiveDateTime, Timelike};
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Coordinates closer than this (in degrees, ~100m) count as the same place.
pub const COORDINATE_TOLERANCE: f64 = 0.001;

/// How a fetch call was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    /// Fetched (or fell back) and committed as the held dataset.
    Fresh,
    /// Same place as the last live fetch; the held dataset was returned and
    /// any fetch still in flight will come back `Superseded`.
    Cached,
    /// A newer request started meanwhile; this result was not committed.
    Superseded,
}

/// Outcome of one fetch call.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub data: Arc<AirQualityDataset>,
    pub latitude: f64,
    pub longitude: f64,
    /// Attempts used against the upstream (for "retrying" feedback).
    pub attempts: u32,
    pub is_fallback: bool,
    pub status: FetchStatus,
}

#[derive(Default)]
struct FetcherState {
    held: Option<FetchResult>,
    /// Coordinates of the held dataset when it came from the live source.
    live_coordinates: Option<(f64, f64)>,
    generation: u64,
}

/// Fetches, memoizes and guards the hourly dataset for the user's location.
pub struct AirQualityFetcher {
    source: Arc<dyn AirQualitySource>,
    policy: RetryPolicy,
    clock: Arc<dyn Clock>,
    state: Mutex<FetcherState>,
}

impl AirQualityFetcher {
    pub fn new(source: Arc<dyn AirQualitySource>, policy: RetryPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            policy,
            clock,
            state: Mutex::new(FetcherState::default()),
        }
    }

    /// The currently held result, if any.
    pub fn current(&self) -> Option<FetchResult> {
        lock(&self.state).held.clone()
    }

    /// Fetches the dataset for a coordinate pair.
    ///
    /// Without `force_refresh`, a request within [`COORDINATE_TOLERANCE`] of
    /// the last live fetch returns the held dataset untouched.
    pub async fn fetch(&self, latitude: f64, longitude: f64, force_refresh: bool) -> FetchResult {
        let generation = {
            let mut state = lock(&self.state);
            let cached = match (&state.held, state.live_coordinates) {
                (Some(held), Some(previous))
                    if !force_refresh && same_place(previous, (latitude, longitude)) =>
                {
                    Some(FetchResult {
                        status: FetchStatus::Cached,
                        ..held.clone()
                    })
                },
                _ => None,
            };
            // Every request, memo hits included, supersedes fetches in flight.
            state.generation += 1;
            if let Some(cached) = cached {
                debug!(
                    "Coordinates ({}, {}) unchanged, keeping held dataset",
                    latitude, longitude
                );
                return cached;
            }
            state.generation
        };

        let (dataset, attempts, live) = self.acquire(latitude, longitude).await;
        let result = FetchResult {
            is_fallback: dataset.is_fallback,
            data: Arc::new(dataset),
            latitude,
            longitude,
            attempts,
            status: FetchStatus::Fresh,
        };

        let mut state = lock(&self.state);
        if state.generation != generation {
            info!(
                "Discarding stale air quality result for ({}, {})",
                latitude, longitude
            );
            return FetchResult {
                status: FetchStatus::Superseded,
                ..result
            };
        }
        state.live_coordinates = live.then_some((latitude, longitude));
        state.held = Some(result.clone());
        result
    }

    /// Returns (dataset, attempts, came_from_live_source).
    async fn acquire(&self, latitude: f64, longitude: f64) -> (AirQualityDataset, u32, bool) {
        let source = Arc::clone(&self.source);
        let retried = fetch_with_retry(&self.policy, "air quality request", |_| {
            let source = Arc::clone(&source);
            async move { source.hourly(latitude, longitude).await }
        })
        .await;

        let current_hour = self.clock.hour();
        match retried {
            Ok(retried) => match build_dataset(&retried.value, current_hour) {
                Ok(dataset) => (dataset, retried.attempts, true),
                Err(e) => {
                    warn!("Upstream payload unusable ({}), using fallback dataset", e);
                    (fallback_dataset(current_hour), retried.attempts, false)
                },
            },
            Err(e) => {
                critical!(
                    "Air quality unavailable for ({}, {}) after {} attempts: {}. Showing fallback data",
                    latitude,
                    longitude,
                    self.policy.max_attempts,
                    e
                );
                (fallback_dataset(current_hour), self.policy.max_attempts.max(1), false)
            },
        }
    }
}

fn same_place(a: (f64, f64), b: (f64, f64)) -> bool {
    (a.0 - b.0).abs() < COORDINATE_TOLERANCE && (a.1 - b.1).abs() < COORDINATE_TOLERANCE
}

/// Turns an upstream payload into a 24-slot dataset.
///
/// Requires both the AQI and the time series. Hours whose AQI is missing or
/// non-numeric are skipped; other missing readings become 0. Slots the
/// upstream did not fill are zero entries so the series is always complete.
pub fn build_dataset(response: &AirQualityResponse, current_hour: u32) -> Result<AirQualityDataset> {
    let hourly = response
        .hourly
        .as_ref()
        .ok_or_else(|| AppError::MalformedResponse("missing hourly".to_string()))?;
    let aqi = hourly
        .european_aqi
        .as_ref()
        .ok_or_else(|| AppError::MalformedResponse("missing hourly.european_aqi".to_string()))?;
    let times = hourly
        .time
        .as_ref()
        .ok_or_else(|| AppError::MalformedResponse("missing hourly.time".to_string()))?;

    let mut slots: Vec<Option<HourlyEntry>> = vec![None; HOURS_PER_DAY];
    for (index, stamp) in times.iter().take(HOURS_PER_DAY).enumerate() {
        let Some(aqi_value) = aqi.get(index).and_then(coerce_number) else {
            debug!("Skipping hour {} without AQI", index);
            continue;
        };
        let hour = parse_hour(stamp).unwrap_or(index as u32);

        let mut readings = PollutantReadings::default();
        for pollutant in Pollutant::ALL {
            let value = hourly
                .field(pollutant.api_field())
                .and_then(|series| series.get(index))
                .and_then(coerce_number)
                .unwrap_or(0.0);
            readings.set(pollutant, value);
        }

        let slot = &mut slots[hour as usize];
        if slot.is_none() {
            *slot = Some(HourlyEntry {
                time: hour_label(hour),
                hour,
                aqi: aqi_value,
                readings,
            });
        }
    }

    if slots.iter().all(Option::is_none) {
        return Err(AppError::MalformedResponse(
            "no hourly entry has an AQI value".to_string(),
        ));
    }

    let entries = slots
        .into_iter()
        .enumerate()
        .map(|(hour, entry)| entry.unwrap_or_else(|| HourlyEntry::empty(hour as u32)))
        .collect();
    Ok(AirQualityDataset::from_hourly(entries, current_hour, false))
}

/// Hour of day from an ISO-like timestamp such as `2024-05-01T13:00`.
///
/// Reads the digits after the `T` separator; otherwise falls back to full
/// date-time parsing.
pub fn parse_hour(stamp: &Value) -> Option<u32> {
    let text = stamp.as_str()?.trim();

    if let Some((_, time)) = text.split_once('T') {
        let hour = time.split(':').next().and_then(|h| h.parse::<u32>().ok());
        if let Some(hour) = hour.filter(|h| *h < 24) {
            return Some(hour);
        }
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.hour());
    }
    ["%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|parsed| parsed.hour())
}
