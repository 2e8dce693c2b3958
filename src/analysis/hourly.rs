//! Metrics over the hourly series.

use crate::models::HourlyEntry;
use serde::Serialize;

/// Pearson correlation coefficient of two paired series.
///
/// Only the common prefix is used when lengths differ. Returns 0 when either
/// series is constant or empty.
pub fn correlation(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }
    let (a, b) = (&a[..n], &b[..n]);
    let mean_a = a.iter().sum::<f64>() / n as f64;
    let mean_b = b.iter().sum::<f64>() / n as f64;

    let mut covariance = 0.0;
    let mut variance_a = 0.0;
    let mut variance_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        covariance += dx * dy;
        variance_a += dx * dx;
        variance_b += dy * dy;
    }

    let denominator = (variance_a * variance_b).sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        return 0.0;
    }
    covariance / denominator
}

/// Cleanest and dirtiest hour of day in a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ExtremeHours {
    pub cleanest: Option<u32>,
    pub dirtiest: Option<u32>,
}

/// Hours with minimum and maximum AQI; ties resolve to the first occurrence.
pub fn extreme_hours(hourly: &[HourlyEntry]) -> ExtremeHours {
    let mut iter = hourly.iter();
    let Some(first) = iter.next() else {
        return ExtremeHours::default();
    };

    let (mut min, mut max) = (first, first);
    for entry in iter {
        if entry.aqi < min.aqi {
            min = entry;
        }
        if entry.aqi > max.aqi {
            max = entry;
        }
    }

    ExtremeHours {
        cleanest: Some(min.hour),
        dirtiest: Some(max.hour),
    }
}

/// Advice for being outdoors right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutdoorAdvice {
    Safe,
    Caution,
    Avoid,
}

impl OutdoorAdvice {
    pub fn from_aqi(aqi: f64) -> Self {
        if aqi < 40.0 {
            OutdoorAdvice::Safe
        } else if aqi < 60.0 {
            OutdoorAdvice::Caution
        } else {
            OutdoorAdvice::Avoid
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OutdoorAdvice::Safe => "safe",
            OutdoorAdvice::Caution => "caution",
            OutdoorAdvice::Avoid => "avoid",
        }
    }
}

const SPORTS_MAX_AQI: f64 = 50.0;
const SPORTS_SLOTS: usize = 6;
const CHILDREN_MAX_AQI: f64 = 40.0;
const CHILDREN_SLOTS: usize = 4;
const WALKING_MAX_AQI: f64 = 60.0;
const WALKING_SLOTS: usize = 8;

/// Suitable hours per activity, plus advice for the current hour.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityRecommendations {
    pub sports: Vec<u32>,
    pub children: Vec<u32>,
    pub walking: Vec<u32>,
    /// `None` when the series has no entry for the current hour.
    pub current: Option<OutdoorAdvice>,
}

pub fn activity_recommendations(hourly: &[HourlyEntry], current_hour: u32) -> ActivityRecommendations {
    let hours_below = |limit: f64, slots: usize| -> Vec<u32> {
        hourly
            .iter()
            .filter(|h| h.aqi < limit)
            .take(slots)
            .map(|h| h.hour)
            .collect()
    };

    ActivityRecommendations {
        sports: hours_below(SPORTS_MAX_AQI, SPORTS_SLOTS),
        children: hours_below(CHILDREN_MAX_AQI, CHILDREN_SLOTS),
        walking: hours_below(WALKING_MAX_AQI, WALKING_SLOTS),
        current: hourly
            .iter()
            .find(|h| h.hour == current_hour)
            .map(|h| OutdoorAdvice::from_aqi(h.aqi)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{hour_label, PollutantReadings};

    fn entries(aqis: &[f64]) -> Vec<HourlyEntry> {
        aqis.iter()
            .enumerate()
            .map(|(i, &aqi)| HourlyEntry {
                time: hour_label(i as u32),
                hour: i as u32,
                aqi,
                readings: PollutantReadings::default(),
            })
            .collect()
    }

    #[test]
    fn test_correlation_with_itself_is_one() {
        let x = [1.0, 4.0, 2.0, 8.0, 5.0];
        assert!((correlation(&x, &x) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_correlation_inverse_is_minus_one() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [8.0, 6.0, 4.0, 2.0];
        assert!((correlation(&x, &y) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_correlation_constant_is_zero() {
        let x = [3.0, 3.0, 3.0];
        let y = [1.0, 2.0, 3.0];
        assert_eq!(correlation(&x, &y), 0.0);
        assert_eq!(correlation(&y, &x), 0.0);
        assert_eq!(correlation(&[], &[]), 0.0);
    }

    #[test]
    fn test_extreme_hours_first_occurrence_wins() {
        let hourly = entries(&[30.0, 10.0, 50.0, 10.0, 50.0]);
        let extremes = extreme_hours(&hourly);
        assert_eq!(extremes.cleanest, Some(1));
        assert_eq!(extremes.dirtiest, Some(2));
    }

    #[test]
    fn test_extreme_hours_empty() {
        assert_eq!(extreme_hours(&[]), ExtremeHours::default());
    }

    #[test]
    fn test_activity_recommendations() {
        let mut aqis = vec![70.0; 24];
        for (hour, aqi) in [(2, 35.0), (5, 45.0), (9, 55.0), (14, 20.0), (20, 39.9)] {
            aqis[hour] = aqi;
        }
        let recs = activity_recommendations(&entries(&aqis), 9);
        assert_eq!(recs.children, vec![2, 14, 20]);
        assert_eq!(recs.sports, vec![2, 5, 14, 20]);
        assert_eq!(recs.walking, vec![2, 5, 9, 14, 20]);
        assert_eq!(recs.current, Some(OutdoorAdvice::Caution));
    }

    #[test]
    fn test_activity_slots_are_capped() {
        let recs = activity_recommendations(&entries(&[10.0; 24]), 0);
        assert_eq!(recs.sports.len(), 6);
        assert_eq!(recs.children.len(), 4);
        assert_eq!(recs.walking.len(), 8);
        assert_eq!(recs.children, vec![0, 1, 2, 3]);
        assert_eq!(recs.current, Some(OutdoorAdvice::Safe));
    }

    #[test]
    fn test_current_advice_missing_hour() {
        let recs = activity_recommendations(&entries(&[10.0, 80.0]), 12);
        assert_eq!(recs.current, None);
        assert_eq!(OutdoorAdvice::from_aqi(80.0), OutdoorAdvice::Avoid);
    }
}
