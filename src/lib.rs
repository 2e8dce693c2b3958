//! Core of a location-aware air quality dashboard.
//!
//! Tracks the user's location permission and coordinates, fetches hourly
//! air quality for that location (with retries and a fixed fallback), derives
//! presentation metrics and compares the result against reference cities.

pub mod analysis;
pub mod api;
pub mod cli;
pub mod clock;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod geolocation;
pub mod logging;
pub mod models;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks a mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
