//! Current AQI for a fixed roster of reference cities, for comparison with
//! the user's location.

use crate::analysis::Palette;
use crate::api::{fetch_with_retry, AirQualitySource, RetryPolicy};
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

pub const CURRENT_LOCATION_NAME: &str = "Current location";

/// A city with a known position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceCity {
    pub name: &'static str,
    pub latitude: f64,
    pub longitude: f64,
}

pub const REFERENCE_CITIES: [ReferenceCity; 9] = [
    ReferenceCity {
        name: "Istanbul",
        latitude: 41.0082,
        longitude: 28.9784,
    },
    ReferenceCity {
        name: "Ankara",
        latitude: 39.9334,
        longitude: 32.8597,
    },
    ReferenceCity {
        name: "Izmir",
        latitude: 38.4237,
        longitude: 27.1428,
    },
    ReferenceCity {
        name: "Bursa",
        latitude: 40.1885,
        longitude: 29.061,
    },
    ReferenceCity {
        name: "Antalya",
        latitude: 36.8969,
        longitude: 30.7133,
    },
    ReferenceCity {
        name: "Adana",
        latitude: 37.0,
        longitude: 35.3213,
    },
    ReferenceCity {
        name: "Konya",
        latitude: 37.8746,
        longitude: 32.4932,
    },
    ReferenceCity {
        name: "Gaziantep",
        latitude: 37.0662,
        longitude: 37.3833,
    },
    ReferenceCity {
        name: "Trabzon",
        latitude: 41.0027,
        longitude: 39.7168,
    },
];

/// One row of the city comparison chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityComparisonEntry {
    pub name: String,
    pub aqi: f64,
    pub is_current_location: bool,
    pub display_color: &'static str,
}

/// Fetches reference cities in parallel and merges them with the user's AQI.
pub struct CityComparisonFetcher {
    source: Arc<dyn AirQualitySource>,
    policy: RetryPolicy,
    palette: Palette,
    cities: Vec<ReferenceCity>,
}

impl CityComparisonFetcher {
    pub fn new(source: Arc<dyn AirQualitySource>, policy: RetryPolicy, palette: Palette) -> Self {
        Self {
            source,
            policy,
            palette,
            cities: REFERENCE_CITIES.to_vec(),
        }
    }

    /// Replaces the reference roster.
    pub fn with_cities(mut self, cities: Vec<ReferenceCity>) -> Self {
        self.cities = cities;
        self
    }

    /// Comparison sorted ascending by AQI. Cities that fail are left out;
    /// the current location is always present.
    pub async fn fetch(&self, current_aqi: f64) -> Vec<CityComparisonEntry> {
        let mut tasks = JoinSet::new();
        for city in self.cities.iter().copied() {
            let source = Arc::clone(&self.source);
            let policy = self.policy;
            tasks.spawn(async move {
                let result = fetch_with_retry(&policy, city.name, |_| {
                    let source = Arc::clone(&source);
                    async move { source.current_aqi(city.latitude, city.longitude).await }
                })
                .await;
                (city, result)
            });
        }

        let mut entries = vec![self.entry(CURRENT_LOCATION_NAME.to_string(), current_aqi, true)];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((city, Ok(retried))) => {
                    debug!("{} AQI: {}", city.name, retried.value);
                    entries.push(self.entry(city.name.to_string(), retried.value, false));
                },
                Ok((city, Err(e))) => {
                    warn!("Leaving {} out of the comparison: {}", city.name, e);
                },
                Err(e) => {
                    error!("City comparison task failed: {}", e);
                },
            }
        }

        entries.sort_by(|a, b| a.aqi.total_cmp(&b.aqi).then_with(|| a.name.cmp(&b.name)));
        entries
    }

    fn entry(&self, name: String, aqi: f64, is_current_location: bool) -> CityComparisonEntry {
        CityComparisonEntry {
            name,
            aqi,
            is_current_location,
            display_color: self.palette.color(aqi),
        }
    }
}
