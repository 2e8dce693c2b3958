//! Location permission state and the views handed to map and dialog consumers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Browser-level geolocation permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    Granted,
    Denied,
    Prompt,
    #[default]
    Unknown,
}

impl fmt::Display for PermissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PermissionState::Granted => "granted",
            PermissionState::Denied => "denied",
            PermissionState::Prompt => "prompt",
            PermissionState::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// A position fix reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    /// Accuracy radius in meters.
    pub accuracy: f64,
}

/// Options passed with every position request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// How old a cached fix may be.
    pub maximum_age: Duration,
}

impl PositionOptions {
    /// One-shot request: high accuracy, 15s timeout, no cached fixes.
    pub fn one_shot() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(15),
            maximum_age: Duration::ZERO,
        }
    }

    /// Continuous tracking: fixes up to 10s old are acceptable.
    pub fn watch() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(15),
            maximum_age: Duration::from_secs(10),
        }
    }
}

/// Everything the UI knows about location access.
///
/// `latitude`/`longitude`/`accuracy` are only populated while
/// `permission_state` is `Granted`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LocationPermissionState {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub accuracy: Option<f64>,
    pub permission_state: PermissionState,
    pub error: Option<String>,
    pub loading: bool,
    pub is_watching: bool,
}

impl LocationPermissionState {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }

    pub fn has_coordinates(&self) -> bool {
        self.coordinates().is_some()
    }

    pub(crate) fn set_position(&mut self, position: &Position) {
        self.latitude = Some(position.latitude);
        self.longitude = Some(position.longitude);
        self.accuracy = Some(position.accuracy);
    }

    pub(crate) fn clear_position(&mut self) {
        self.latitude = None;
        self.longitude = None;
        self.accuracy = None;
    }

    pub fn map_view(&self) -> MapView {
        MapView {
            latitude: self.latitude,
            longitude: self.longitude,
            accuracy_meters: self.accuracy,
            permission_granted: self.permission_state == PermissionState::Granted,
        }
    }

    pub fn dialog_view(&self) -> DialogView {
        DialogView {
            permission_state: self.permission_state,
            error: self.error.clone(),
            loading: self.loading,
            has_coordinates: self.has_coordinates(),
        }
    }
}

/// What the map consumer renders.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapView {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub accuracy_meters: Option<f64>,
    pub permission_granted: bool,
}

impl MapView {
    /// The map is only drawn with a granted permission and a known position.
    pub fn is_renderable(&self) -> bool {
        self.permission_granted && self.latitude.is_some() && self.longitude.is_some()
    }
}

/// What the permission dialog consumer renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DialogView {
    pub permission_state: PermissionState,
    pub error: Option<String>,
    pub loading: bool,
    #[serde(skip)]
    has_coordinates: bool,
}

impl DialogView {
    /// Whether the dialog asking for location access should be visible.
    pub fn should_prompt(&self) -> bool {
        match self.permission_state {
            PermissionState::Granted => false,
            PermissionState::Prompt | PermissionState::Denied => true,
            PermissionState::Unknown => !self.has_coordinates,
        }
    }
}

/// Last known coordinates persisted between renders of one session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CachedCoordinate {
    pub lat: f64,
    pub lon: f64,
}
