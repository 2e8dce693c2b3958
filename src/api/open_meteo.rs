//! Provides a client for the Open-Meteo air-quality API.
//!
//! This module defines the `AirQualitySource` seam used by the fetchers and
//! `OpenMeteoClient`, its HTTP implementation.

use crate::error::{AppError, Result};
use crate::models::{coerce_number, AirQualityResponse, CurrentAqiResponse};
use async_trait::async_trait;
use reqwest::{Client, Response};
use tracing::{debug, error, info};

pub const DEFAULT_AIR_QUALITY_URL: &str = "https://air-quality-api.open-meteo.com/v1/air-quality";

/// Hourly fields requested for the dashboard.
pub const HOURLY_FIELDS: &str =
    "pm10,pm2_5,carbon_monoxide,nitrogen_dioxide,sulphur_dioxide,ozone,european_aqi";

/// Upstream air quality data, abstracted so fetchers can be tested offline.
#[async_trait]
pub trait AirQualitySource: Send + Sync {
    /// One day of hourly pollutant and AQI series for a coordinate pair.
    async fn hourly(&self, latitude: f64, longitude: f64) -> Result<AirQualityResponse>;

    /// The current composite AQI only.
    async fn current_aqi(&self, latitude: f64, longitude: f64) -> Result<f64>;
}

/// An asynchronous client for the Open-Meteo air-quality endpoint.
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: Client,
    base_url: String,
}

impl Default for OpenMeteoClient {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenMeteoClient {
    /// Creates a client against the public Open-Meteo endpoint.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_AIR_QUALITY_URL)
    }

    /// Creates a client against a custom endpoint URL (configuration or a mock server).
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.to_string(),
        }
    }

    async fn get(&self, query: &[(&str, String)]) -> Result<Response> {
        let response = self
            .client
            .get(&self.base_url)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                error!("Error calling {}: {}", self.base_url, e);
                AppError::from(e)
            })?;

        // Any non-2xx status counts as a failed attempt
        match response.error_for_status() {
            Ok(resp) => Ok(resp),
            Err(e) => {
                let status = e.status().unwrap_or_default();
                let url = e
                    .url()
                    .map(|u| u.as_str().to_string())
                    .unwrap_or_else(|| self.base_url.clone());
                error!("API request to {} failed with status {}", url, status);
                Err(AppError::HttpStatus { status, url })
            },
        }
    }
}

#[async_trait]
impl AirQualitySource for OpenMeteoClient {
    async fn hourly(&self, latitude: f64, longitude: f64) -> Result<AirQualityResponse> {
        info!("Fetching hourly air quality for ({}, {})", latitude, longitude);

        let response = self
            .get(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("hourly", HOURLY_FIELDS.to_string()),
                ("forecast_days", "1".to_string()),
                ("timezone", "auto".to_string()),
            ])
            .await?;

        let payload: AirQualityResponse = response.json().await.map_err(|e| {
            error!("Error parsing air quality response JSON: {}", e);
            AppError::MalformedResponse(e.to_string())
        })?;

        debug!(
            "Received {} hourly timestamps for ({}, {})",
            payload
                .hourly
                .as_ref()
                .and_then(|h| h.time.as_ref())
                .map_or(0, |t| t.len()),
            latitude,
            longitude
        );
        Ok(payload)
    }

    async fn current_aqi(&self, latitude: f64, longitude: f64) -> Result<f64> {
        debug!("Fetching current AQI for ({}, {})", latitude, longitude);

        let response = self
            .get(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("current", "european_aqi".to_string()),
            ])
            .await?;

        let payload: CurrentAqiResponse = response.json().await.map_err(|e| {
            error!("Error parsing current AQI response JSON: {}", e);
            AppError::MalformedResponse(e.to_string())
        })?;

        payload
            .current
            .as_ref()
            .and_then(|c| c.european_aqi.as_ref())
            .and_then(coerce_number)
            .ok_or_else(|| AppError::MalformedResponse("missing current.european_aqi".to_string()))
    }
}
