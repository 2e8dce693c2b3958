//! Ties the pieces together: coordinates from the permission state machine,
//! the hourly dataset for them, the derived metrics and the city comparison.

use crate::analysis::{
    activity_recommendations, correlation, extreme_hours, individual_aqis, main_pollutant,
    ActivityRecommendations, ExtremeHours, MainPollutant, Palette,
};
use crate::api::{AirQualityFetcher, CityComparisonEntry, CityComparisonFetcher, FetchResult};
use crate::clock::Clock;
use crate::geolocation::PermissionStateMachine;
use crate::lock;
use crate::models::{AirQualityDataset, Pollutant};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Presentation-ready values computed from one dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedMetrics {
    pub status_color: &'static str,
    pub main_pollutant: MainPollutant,
    pub individual_aqis: Vec<(Pollutant, f64)>,
    pub extremes: ExtremeHours,
    pub recommendations: ActivityRecommendations,
    /// Pearson correlation of each pollutant series with the AQI series.
    pub correlations: Vec<(Pollutant, f64)>,
}

impl DerivedMetrics {
    pub fn compute(dataset: &AirQualityDataset, current_hour: u32, palette: Palette) -> Self {
        let aqi = dataset.aqi_series();
        Self {
            status_color: palette.color(dataset.current.aqi),
            main_pollutant: main_pollutant(&dataset.current.readings),
            individual_aqis: individual_aqis(&dataset.current.readings),
            extremes: extreme_hours(&dataset.hourly),
            recommendations: activity_recommendations(&dataset.hourly, current_hour),
            correlations: Pollutant::ALL
                .iter()
                .map(|&p| (p, correlation(&dataset.series(p), &aqi)))
                .collect(),
        }
    }
}

/// Everything a dashboard render needs.
#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    pub fetch: FetchResult,
    pub metrics: DerivedMetrics,
    pub cities: Arc<Vec<CityComparisonEntry>>,
}

impl DashboardSnapshot {
    pub fn dataset(&self) -> &AirQualityDataset {
        &self.fetch.data
    }
}

struct Comparison {
    aqi: f64,
    entries: Arc<Vec<CityComparisonEntry>>,
}

pub struct Dashboard {
    location: Arc<PermissionStateMachine>,
    air_quality: AirQualityFetcher,
    cities: CityComparisonFetcher,
    palette: Palette,
    clock: Arc<dyn Clock>,
    comparison: Mutex<Option<Comparison>>,
}

impl Dashboard {
    pub fn new(
        location: Arc<PermissionStateMachine>,
        air_quality: AirQualityFetcher,
        cities: CityComparisonFetcher,
        palette: Palette,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            location,
            air_quality,
            cities,
            palette,
            clock,
            comparison: Mutex::new(None),
        }
    }

    pub fn location(&self) -> &Arc<PermissionStateMachine> {
        &self.location
    }

    /// Fetches (or reuses) the dataset for the current coordinates and
    /// derives everything shown on the dashboard.
    ///
    /// `None` while no coordinates are known.
    pub async fn refresh(&self, force: bool) -> Option<DashboardSnapshot> {
        let Some((latitude, longitude)) = self.location.state().coordinates() else {
            debug!("No coordinates yet, nothing to refresh");
            return None;
        };

        let fetch = self.air_quality.fetch(latitude, longitude, force).await;
        let metrics = DerivedMetrics::compute(&fetch.data, self.clock.hour(), self.palette);
        let cities = self.compare(fetch.data.current.aqi).await;

        Some(DashboardSnapshot {
            fetch,
            metrics,
            cities,
        })
    }

    /// City comparison for `aqi`, refetched only when the AQI changed.
    async fn compare(&self, aqi: f64) -> Arc<Vec<CityComparisonEntry>> {
        if let Some(previous) = lock(&self.comparison).as_ref() {
            if previous.aqi == aqi {
                return Arc::clone(&previous.entries);
            }
        }

        info!("Comparing current AQI {} with reference cities", aqi);
        let entries = Arc::new(self.cities.fetch(aqi).await);
        *lock(&self.comparison) = Some(Comparison {
            aqi,
            entries: Arc::clone(&entries),
        });
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{hourly_payload, ScriptedSource};
    use crate::api::{FetchStatus, ReferenceCity, RetryPolicy, CURRENT_LOCATION_NAME};
    use crate::clock::FixedClock;
    use crate::geolocation::ManualGeolocation;
    use crate::models::Position;
    use std::time::Duration;

    const HOME: Position = Position {
        latitude: 41.0,
        longitude: 29.0,
        accuracy: 20.0,
    };

    const CITIES: [ReferenceCity; 2] = [
        ReferenceCity {
            name: "Alpha",
            latitude: 1.0,
            longitude: 1.0,
        },
        ReferenceCity {
            name: "Beta",
            latitude: 2.0,
            longitude: 2.0,
        },
    ];

    fn quick_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 2,
            base_delay: Duration::from_millis(1),
        }
    }

    fn dashboard(
        source: &Arc<ScriptedSource>,
        platform: ManualGeolocation,
    ) -> (Dashboard, Arc<PermissionStateMachine>) {
        let location = Arc::new(PermissionStateMachine::new(Arc::new(platform), None));
        let clock = Arc::new(FixedClock(12));
        let dashboard = Dashboard::new(
            Arc::clone(&location),
            AirQualityFetcher::new(source.clone(), quick_policy(), clock.clone()),
            CityComparisonFetcher::new(source.clone(), quick_policy(), Palette::Bright)
                .with_cities(CITIES.to_vec()),
            Palette::Bright,
            clock,
        );
        (dashboard, location)
    }

    fn scripted_source(base_aqi: f64) -> Arc<ScriptedSource> {
        let source = ScriptedSource::with_hourly(hourly_payload(move |h| base_aqi + h as f64));
        source.set_current_aqi(1.0, 70.0);
        source.set_current_aqi(2.0, 10.0);
        Arc::new(source)
    }

    #[tokio::test]
    async fn test_refresh_without_coordinates_does_nothing() {
        let source = scripted_source(20.0);
        let (dashboard, _) = dashboard(&source, ManualGeolocation::new());

        assert!(dashboard.refresh(false).await.is_none());
        assert_eq!(source.hourly_calls(), 0);
        assert_eq!(source.current_calls(), 0);
    }

    #[tokio::test]
    async fn test_refresh_derives_metrics_and_compares_cities() {
        let source = scripted_source(20.0);
        let (dashboard, location) = dashboard(&source, ManualGeolocation::granted(HOME));
        location.request_permission().await.unwrap();

        let snapshot = dashboard.refresh(false).await.expect("coordinates known");

        assert_eq!(snapshot.fetch.status, FetchStatus::Fresh);
        assert_eq!(snapshot.dataset().current.aqi, 32.0);
        assert_eq!(snapshot.metrics.status_color, Palette::Bright.color(32.0));
        assert_eq!(snapshot.metrics.extremes.cleanest, Some(0));
        assert_eq!(snapshot.metrics.extremes.dirtiest, Some(23));
        assert_eq!(snapshot.metrics.individual_aqis.len(), 6);

        let correlations: Vec<Pollutant> =
            snapshot.metrics.correlations.iter().map(|(p, _)| *p).collect();
        assert_eq!(correlations, Pollutant::ALL.to_vec());
        let pm25 = snapshot.metrics.correlations[0].1;
        assert!((pm25 - 1.0).abs() < 1e-9);
        let so2 = snapshot
            .metrics
            .correlations
            .iter()
            .find(|(p, _)| *p == Pollutant::So2)
            .map(|(_, r)| *r);
        assert_eq!(so2, Some(0.0));

        let names: Vec<&str> = snapshot.cities.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Beta", CURRENT_LOCATION_NAME, "Alpha"]);
    }

    #[tokio::test]
    async fn test_cities_are_not_refetched_for_the_same_aqi() {
        let source = scripted_source(20.0);
        let (dashboard, location) = dashboard(&source, ManualGeolocation::granted(HOME));
        location.request_permission().await.unwrap();

        dashboard.refresh(false).await.unwrap();
        let calls = source.current_calls();
        let second = dashboard.refresh(false).await.unwrap();

        assert_eq!(second.fetch.status, FetchStatus::Cached);
        assert_eq!(source.hourly_calls(), 1);
        assert_eq!(source.current_calls(), calls);
    }

    #[tokio::test]
    async fn test_cities_are_refetched_when_aqi_changes() {
        let source = scripted_source(20.0);
        let (dashboard, location) = dashboard(&source, ManualGeolocation::granted(HOME));
        location.request_permission().await.unwrap();

        dashboard.refresh(false).await.unwrap();
        let calls = source.current_calls();

        source.set_hourly(hourly_payload(|h| 50.0 + h as f64));
        let snapshot = dashboard.refresh(true).await.unwrap();

        assert_eq!(snapshot.dataset().current.aqi, 62.0);
        assert_eq!(source.current_calls(), calls * 2);
        let current = snapshot
            .cities
            .iter()
            .find(|c| c.is_current_location)
            .map(|c| c.aqi);
        assert_eq!(current, Some(62.0));
    }

    #[tokio::test]
    async fn test_fallback_dataset_still_renders() {
        let source = Arc::new(ScriptedSource::failing());
        let (dashboard, location) = dashboard(&source, ManualGeolocation::granted(HOME));
        location.request_permission().await.unwrap();

        let snapshot = dashboard.refresh(false).await.unwrap();

        assert!(snapshot.fetch.is_fallback);
        assert_eq!(snapshot.fetch.attempts, 2);
        assert_eq!(snapshot.dataset().hourly.len(), 24);
        // Every reference city failed, only the current location remains.
        assert_eq!(snapshot.cities.len(), 1);
        assert!(snapshot.cities[0].is_current_location);
    }
}
