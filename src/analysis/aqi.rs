//! AQI status labels and colour palettes.
//!
//! Both are keyed to the same thresholds (20/40/60/80/100) so that a
//! palette can be swapped without touching the banding.

use crate::error::{AppError, Result};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Upper bounds (inclusive) of the first five bands.
pub const AQI_THRESHOLDS: [f64; 5] = [20.0, 40.0, 60.0, 80.0, 100.0];

/// Severity band of an AQI value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AqiStatus {
    VeryGood,
    Good,
    Moderate,
    Poor,
    VeryPoor,
    Hazardous,
}

impl AqiStatus {
    pub fn from_aqi(aqi: f64) -> Self {
        match band_index(aqi) {
            0 => AqiStatus::VeryGood,
            1 => AqiStatus::Good,
            2 => AqiStatus::Moderate,
            3 => AqiStatus::Poor,
            4 => AqiStatus::VeryPoor,
            _ => AqiStatus::Hazardous,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AqiStatus::VeryGood => "very good",
            AqiStatus::Good => "good",
            AqiStatus::Moderate => "moderate",
            AqiStatus::Poor => "poor",
            AqiStatus::VeryPoor => "very poor",
            AqiStatus::Hazardous => "hazardous",
        }
    }

    pub fn band(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for AqiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for AqiStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Band 0..=5 for an AQI value. NaN is treated as 0.
fn band_index(aqi: f64) -> usize {
    let aqi = if aqi.is_nan() { 0.0 } else { aqi };
    AQI_THRESHOLDS
        .iter()
        .position(|&upper| aqi <= upper)
        .unwrap_or(AQI_THRESHOLDS.len())
}

/// Status label for an AQI value.
pub fn status_label(aqi: f64) -> &'static str {
    AqiStatus::from_aqi(aqi).label()
}

/// Colour scheme for AQI bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Palette {
    #[default]
    Bright,
    Muted,
}

const BRIGHT: [&str; 6] = ["#50F0E6", "#50CCAA", "#F0E641", "#FF5050", "#960032", "#7D2181"];
const MUTED: [&str; 6] = ["#2A9D8F", "#5C8A6E", "#B8A038", "#C0504D", "#7A2E3B", "#4B2D5C"];

impl Palette {
    pub fn colors(&self) -> &'static [&'static str; 6] {
        match self {
            Palette::Bright => &BRIGHT,
            Palette::Muted => &MUTED,
        }
    }

    /// Hex colour for an AQI value.
    pub fn color(&self, aqi: f64) -> &'static str {
        self.colors()[band_index(aqi)]
    }

    pub fn status_color(&self, status: AqiStatus) -> &'static str {
        self.colors()[status.band()]
    }
}

impl FromStr for Palette {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bright" => Ok(Palette::Bright),
            "muted" | "dark" => Ok(Palette::Muted),
            other => Err(AppError::Config(format!(
                "palette must be 'bright' or 'muted', got '{}'",
                other
            ))),
        }
    }
}
