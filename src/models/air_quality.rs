//! Air quality dataset types produced by the fetcher and consumed by
//! charts and derived metrics.

use crate::analysis::AqiStatus;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of hourly entries in every dataset.
pub const HOURS_PER_DAY: usize = 24;

/// The six pollutants tracked by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pollutant {
    Pm25,
    Pm10,
    No2,
    O3,
    So2,
    Co,
}

impl Pollutant {
    pub const ALL: [Pollutant; 6] = [
        Pollutant::Pm25,
        Pollutant::Pm10,
        Pollutant::No2,
        Pollutant::O3,
        Pollutant::So2,
        Pollutant::Co,
    ];

    /// Display name, e.g. "PM2.5".
    pub fn name(&self) -> &'static str {
        match self {
            Pollutant::Pm25 => "PM2.5",
            Pollutant::Pm10 => "PM10",
            Pollutant::No2 => "NO2",
            Pollutant::O3 => "O3",
            Pollutant::So2 => "SO2",
            Pollutant::Co => "CO",
        }
    }

    /// Field name of the hourly series in the upstream API.
    pub fn api_field(&self) -> &'static str {
        match self {
            Pollutant::Pm25 => "pm2_5",
            Pollutant::Pm10 => "pm10",
            Pollutant::No2 => "nitrogen_dioxide",
            Pollutant::O3 => "ozone",
            Pollutant::So2 => "sulphur_dioxide",
            Pollutant::Co => "carbon_monoxide",
        }
    }

    /// Accepts display names and API field names, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace(['.', '_'], "");
        match normalized.as_str() {
            "pm25" => Some(Pollutant::Pm25),
            "pm10" => Some(Pollutant::Pm10),
            "no2" | "nitrogendioxide" => Some(Pollutant::No2),
            "o3" | "ozone" => Some(Pollutant::O3),
            "so2" | "sulphurdioxide" | "sulfurdioxide" => Some(Pollutant::So2),
            "co" | "carbonmonoxide" => Some(Pollutant::Co),
            _ => None,
        }
    }

    pub fn unit(&self) -> &'static str {
        "μg/m³"
    }

    /// Colour used for this pollutant's bars and lines.
    pub fn display_color(&self) -> &'static str {
        match self {
            Pollutant::Pm25 => "#8884d8",
            Pollutant::Pm10 => "#82ca9d",
            Pollutant::No2 => "#ffc658",
            Pollutant::O3 => "#ff7c7c",
            Pollutant::So2 => "#8dd1e1",
            Pollutant::Co => "#d084d0",
        }
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Concentrations of all six pollutants at one point in time, in μg/m³.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PollutantReadings {
    pub pm25: f64,
    pub pm10: f64,
    pub no2: f64,
    pub o3: f64,
    pub so2: f64,
    pub co: f64,
}

impl PollutantReadings {
    pub fn get(&self, pollutant: Pollutant) -> f64 {
        match pollutant {
            Pollutant::Pm25 => self.pm25,
            Pollutant::Pm10 => self.pm10,
            Pollutant::No2 => self.no2,
            Pollutant::O3 => self.o3,
            Pollutant::So2 => self.so2,
            Pollutant::Co => self.co,
        }
    }

    pub fn set(&mut self, pollutant: Pollutant, value: f64) {
        match pollutant {
            Pollutant::Pm25 => self.pm25 = value,
            Pollutant::Pm10 => self.pm10 = value,
            Pollutant::No2 => self.no2 = value,
            Pollutant::O3 => self.o3 = value,
            Pollutant::So2 => self.so2 = value,
            Pollutant::Co => self.co = value,
        }
    }
}

/// Snapshot at the "now" index of the hourly series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentSnapshot {
    pub aqi: f64,
    pub status: AqiStatus,
    pub readings: PollutantReadings,
}

/// One hour of the 24-hour series. `hour` is the hour of day (0..=23).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyEntry {
    pub time: String,
    pub hour: u32,
    pub aqi: f64,
    pub readings: PollutantReadings,
}

impl HourlyEntry {
    /// An all-zero entry for an hour the upstream did not report.
    pub fn empty(hour: u32) -> Self {
        Self {
            time: hour_label(hour),
            hour,
            aqi: 0.0,
            readings: PollutantReadings::default(),
        }
    }
}

/// Latest value of one pollutant, for snapshot bar displays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollutantSeries {
    pub pollutant: Pollutant,
    pub name: &'static str,
    pub value: f64,
    pub unit: &'static str,
    pub color: &'static str,
}

/// A complete dataset for one coordinate pair. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirQualityDataset {
    pub current: CurrentSnapshot,
    pub hourly: Vec<HourlyEntry>,
    pub pollutants: Vec<PollutantSeries>,
    pub is_fallback: bool,
}

impl AirQualityDataset {
    /// Assembles a dataset from a 24-entry series, taking "current" from
    /// `current_hour` clamped to the last entry.
    pub fn from_hourly(hourly: Vec<HourlyEntry>, current_hour: u32, is_fallback: bool) -> Self {
        let index = current_index(current_hour, hourly.len());
        let (aqi, readings) = hourly
            .get(index)
            .map(|entry| (entry.aqi, entry.readings))
            .unwrap_or_default();

        let pollutants = Pollutant::ALL
            .iter()
            .map(|&pollutant| PollutantSeries {
                pollutant,
                name: pollutant.name(),
                value: readings.get(pollutant),
                unit: pollutant.unit(),
                color: pollutant.display_color(),
            })
            .collect();

        Self {
            current: CurrentSnapshot {
                aqi,
                status: AqiStatus::from_aqi(aqi),
                readings,
            },
            hourly,
            pollutants,
            is_fallback,
        }
    }

    /// Values of one pollutant across the hourly series.
    pub fn series(&self, pollutant: Pollutant) -> Vec<f64> {
        self.hourly.iter().map(|h| h.readings.get(pollutant)).collect()
    }

    pub fn aqi_series(&self) -> Vec<f64> {
        self.hourly.iter().map(|h| h.aqi).collect()
    }
}

/// Index of the "current" entry: the wall-clock hour, clamped to the series.
pub fn current_index(current_hour: u32, len: usize) -> usize {
    let max = len.saturating_sub(1).min(HOURS_PER_DAY - 1);
    (current_hour as usize).min(max)
}

/// "HH:00" label for an hour of day.
pub fn hour_label(hour: u32) -> String {
    format!("{:02}:00", hour)
}
