//! Defines the data structures and models used throughout the application.
//!
//! This includes structures representing data fetched from the upstream
//! air-quality API, the dataset handed to presentation consumers, and the
//! location permission state.

mod air_quality;
mod location;
mod open_meteo;

pub use air_quality::*;
pub use location::*;
pub use open_meteo::*;
