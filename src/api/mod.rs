//! Provides clients and utilities for acquiring air quality data.
//!
//! Includes:
//! - `open_meteo`: the `AirQualitySource` seam and its Open-Meteo HTTP client.
//! - `retry`: retry with linear backoff shared by every upstream call.
//! - `fallback`: the fixed dataset used when live data is unavailable.
//! - `fetcher`: memoized, staleness-guarded hourly dataset acquisition.
//! - `cities`: parallel best-effort reference city comparison.

mod cities;
mod fallback;
mod fetcher;
mod open_meteo;
mod retry;


pub use cities::*;
pub use fallback::*;
pub use fetcher::*;
pub use open_meteo::*;
pub use retry::*;
