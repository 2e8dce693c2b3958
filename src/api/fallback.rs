//! Provides the fixed fallback dataset.
//!
//! Used when the live source is unreachable or returns a payload without the
//! required series. The values are a plausible urban day (traffic peaks around
//! 08:00 and 19:00, ozone peaking in the afternoon) and never change between
//! calls, so the dashboard stays stable while offline.

use crate::models::{hour_label, AirQualityDataset, HourlyEntry, PollutantReadings};
use tracing::debug;

/// One row per hour: aqi, pm2.5, pm10, no2, o3, so2, co.
const FALLBACK_HOURLY: [[f64; 7]; 24] = [
    [20.0, 9.6, 18.9, 15.4, 34.0, 4.2, 275.0],
    [19.0, 9.3, 18.5, 14.8, 33.0, 4.1, 268.0],
    [18.0, 9.1, 18.2, 14.3, 32.5, 4.0, 262.0],
    [18.0, 9.0, 18.0, 14.0, 32.0, 4.0, 260.0],
    [19.0, 9.5, 18.8, 15.1, 32.5, 4.2, 272.0],
    [22.0, 11.2, 21.4, 18.7, 35.0, 4.8, 310.0],
    [30.0, 15.1, 27.6, 27.1, 35.0, 6.2, 400.0],
    [42.0, 20.4, 35.9, 38.4, 35.0, 8.1, 520.0],
    [52.0, 23.0, 40.0, 44.0, 49.2, 9.0, 580.0],
    [42.0, 20.4, 35.9, 38.4, 62.5, 8.1, 520.0],
    [30.0, 15.1, 27.6, 27.1, 73.9, 6.2, 400.0],
    [33.0, 11.2, 21.4, 18.7, 82.6, 4.8, 310.0],
    [35.0, 9.5, 18.8, 15.1, 88.1, 4.2, 272.0],
    [36.0, 9.1, 18.2, 14.3, 90.0, 4.0, 263.0],
    [35.0, 9.2, 18.4, 14.5, 88.1, 4.1, 265.0],
    [33.0, 10.0, 19.5, 16.1, 82.6, 4.3, 282.0],
    [30.0, 12.0, 22.7, 20.4, 73.9, 5.1, 328.0],
    [31.0, 15.6, 28.4, 28.2, 62.5, 6.4, 412.0],
    [39.0, 19.7, 34.9, 37.0, 49.2, 7.8, 505.0],
    [46.0, 21.6, 37.8, 41.0, 35.0, 8.5, 548.0],
    [39.0, 19.7, 34.9, 37.0, 35.0, 7.8, 505.0],
    [31.0, 15.6, 28.4, 28.2, 35.0, 6.4, 412.0],
    [24.0, 12.0, 22.7, 20.4, 35.0, 5.1, 328.0],
    [20.0, 10.0, 19.5, 16.1, 35.0, 4.3, 282.0],
];

/// The 24 fallback entries, indexed by hour of day.
pub fn fallback_hourly() -> Vec<HourlyEntry> {
    FALLBACK_HOURLY
        .iter()
        .enumerate()
        .map(|(hour, row)| {
            let hour = hour as u32;
            HourlyEntry {
                time: hour_label(hour),
                hour,
                aqi: row[0],
                readings: PollutantReadings {
                    pm25: row[1],
                    pm10: row[2],
                    no2: row[3],
                    o3: row[4],
                    so2: row[5],
                    co: row[6],
                },
            }
        })
        .collect()
}

/// Builds the fallback dataset with "current" at `current_hour`.
pub fn fallback_dataset(current_hour: u32) -> AirQualityDataset {
    debug!("Building fallback dataset for hour {}", current_hour);
    AirQualityDataset::from_hourly(fallback_hourly(), current_hour, true)
}
