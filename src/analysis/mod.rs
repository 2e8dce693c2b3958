//! Pure functions deriving presentation-ready values from an air quality dataset.
//!
//! - `aqi`: status labels and colour palettes for composite AQI values.
//! - `pollutants`: per-pollutant ratios, sub-indices and the dominant pollutant.
//! - `hourly`: correlations, extreme hours and activity recommendations.

mod aqi;
mod hourly;
mod pollutants;

pub use aqi::*;
pub use hourly::*;
pub use pollutants::*;
