//! Per-pollutant metrics: guideline ratios, sub-indices, dominant pollutant.

use crate::analysis::AqiStatus;
use crate::models::{Pollutant, PollutantReadings};
use serde::Serialize;

/// Sub-index values at each breakpoint.
pub const SUB_INDEX_LEVELS: [f64; 6] = [0.0, 20.0, 40.0, 60.0, 80.0, 100.0];

/// Guideline concentration (μg/m³) used to compute exceedance ratios.
pub fn guideline(pollutant: Pollutant) -> f64 {
    match pollutant {
        Pollutant::Pm25 => 15.0,
        Pollutant::Pm10 => 45.0,
        Pollutant::No2 => 25.0,
        Pollutant::O3 => 60.0,
        Pollutant::So2 => 40.0,
        Pollutant::Co => 4000.0,
    }
}

/// Concentrations (μg/m³) mapping onto [`SUB_INDEX_LEVELS`].
pub fn breakpoints(pollutant: Pollutant) -> [f64; 6] {
    match pollutant {
        Pollutant::Pm25 => [0.0, 10.0, 20.0, 25.0, 50.0, 75.0],
        Pollutant::Pm10 => [0.0, 20.0, 40.0, 50.0, 100.0, 150.0],
        Pollutant::No2 => [0.0, 40.0, 90.0, 120.0, 230.0, 340.0],
        Pollutant::O3 => [0.0, 50.0, 100.0, 130.0, 240.0, 380.0],
        Pollutant::So2 => [0.0, 100.0, 200.0, 350.0, 500.0, 750.0],
        Pollutant::Co => [0.0, 2000.0, 4000.0, 7000.0, 10000.0, 15000.0],
    }
}

/// Status of a guideline ratio (value / guideline).
pub fn pollutant_status(ratio: f64) -> AqiStatus {
    if ratio <= 0.5 {
        AqiStatus::VeryGood
    } else if ratio <= 0.8 {
        AqiStatus::Good
    } else if ratio <= 1.0 {
        AqiStatus::Moderate
    } else if ratio <= 1.5 {
        AqiStatus::Poor
    } else {
        AqiStatus::VeryPoor
    }
}

/// Sub-index of one pollutant by piecewise-linear interpolation.
///
/// Values outside the table clamp to the end levels.
pub fn sub_index(pollutant: Pollutant, value: f64) -> f64 {
    let points = breakpoints(pollutant);
    let last = points.len() - 1;

    if value.is_nan() || value <= points[0] {
        return SUB_INDEX_LEVELS[0];
    }
    if value >= points[last] {
        return SUB_INDEX_LEVELS[last];
    }

    for i in 0..last {
        let (low, high) = (points[i], points[i + 1]);
        if value >= low && value <= high {
            let fraction = (value - low) / (high - low);
            return SUB_INDEX_LEVELS[i] + fraction * (SUB_INDEX_LEVELS[i + 1] - SUB_INDEX_LEVELS[i]);
        }
    }
    SUB_INDEX_LEVELS[last]
}

/// Sub-index by pollutant name. Unknown names yield 0.
pub fn individual_aqi(name: &str, value: f64) -> f64 {
    Pollutant::from_name(name)
        .map(|pollutant| sub_index(pollutant, value))
        .unwrap_or(0.0)
}

/// Sub-indices for all six pollutants of a reading.
pub fn individual_aqis(readings: &PollutantReadings) -> Vec<(Pollutant, f64)> {
    Pollutant::ALL
        .iter()
        .map(|&p| (p, sub_index(p, readings.get(p))))
        .collect()
}

/// The pollutant furthest above (or closest to) its guideline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MainPollutant {
    pub pollutant: Pollutant,
    pub value: f64,
    pub ratio: f64,
    pub status: AqiStatus,
}

impl MainPollutant {
    pub fn exceeds_guideline(&self) -> bool {
        self.ratio > 1.0
    }
}

/// Picks the dominant pollutant of a snapshot.
///
/// Prefers the highest ratio among pollutants over their guideline; when
/// none exceed it, the highest ratio overall. Ties go to the earlier
/// pollutant in [`Pollutant::ALL`].
pub fn main_pollutant(readings: &PollutantReadings) -> MainPollutant {
    let ratios: Vec<(Pollutant, f64, f64)> = Pollutant::ALL
        .iter()
        .map(|&p| {
            let value = readings.get(p);
            let ratio = value / guideline(p);
            (p, value, if ratio.is_nan() { 0.0 } else { ratio })
        })
        .collect();

    let (pollutant, value, ratio) = highest(ratios.iter().filter(|(_, _, r)| *r > 1.0))
        .or_else(|| highest(ratios.iter()))
        .unwrap_or((Pollutant::Pm25, 0.0, 0.0));

    MainPollutant {
        pollutant,
        value,
        ratio,
        status: pollutant_status(ratio),
    }
}

/// First entry with the highest ratio.
fn highest<'a>(
    candidates: impl Iterator<Item = &'a (Pollutant, f64, f64)>,
) -> Option<(Pollutant, f64, f64)> {
    candidates.fold(None, |best, &item| match best {
        Some(b) if b.2 >= item.2 => Some(b),
        _ => Some(item),
    })
}
