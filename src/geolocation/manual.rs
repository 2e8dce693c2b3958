//! A geolocation platform driven by explicit user input.
//!
//! Backs the CLI, where there is no browser: the user grants or denies access
//! and types coordinates. Watches and permission subscribers are notified just
//! as a browser would notify them.

use crate::error::GeolocationError;
use crate::geolocation::{
    GeolocationAccessor, PermissionCallback, SubscriptionId, WatchCallback, WatchId,
};
use crate::lock;
use crate::models::{PermissionState, Position, PositionOptions};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

struct ManualState {
    permission: PermissionState,
    position: Option<Position>,
    watches: HashMap<u64, WatchCallback>,
    subscribers: HashMap<u64, PermissionCallback>,
    next_id: u64,
}

pub struct ManualGeolocation {
    state: Mutex<ManualState>,
}

impl Default for ManualGeolocation {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualGeolocation {
    /// Starts in the `prompt` state with no position.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ManualState {
                permission: PermissionState::Prompt,
                position: None,
                watches: HashMap::new(),
                subscribers: HashMap::new(),
                next_id: 1,
            }),
        }
    }

    /// Starts already granted at `position`.
    pub fn granted(position: Position) -> Self {
        let platform = Self::new();
        {
            let mut state = lock(&platform.state);
            state.permission = PermissionState::Granted;
            state.position = Some(position);
        }
        platform
    }

    pub fn permission(&self) -> PermissionState {
        lock(&self.state).permission
    }

    /// The user allows access and the device reports `position`.
    pub fn grant(&self, position: Position) {
        let (changed, subscribers, watches) = {
            let mut state = lock(&self.state);
            let changed = state.permission != PermissionState::Granted;
            state.permission = PermissionState::Granted;
            state.position = Some(position);
            (changed, collect(&state.subscribers), collect(&state.watches))
        };
        if changed {
            notify_permission(&subscribers, PermissionState::Granted);
        }
        for watch in watches {
            watch(Ok(position));
        }
    }

    /// The user revokes (or refuses) access.
    pub fn deny(&self) {
        let (changed, subscribers, watches) = {
            let mut state = lock(&self.state);
            let changed = state.permission != PermissionState::Denied;
            state.permission = PermissionState::Denied;
            state.position = None;
            (changed, collect(&state.subscribers), collect(&state.watches))
        };
        if changed {
            notify_permission(&subscribers, PermissionState::Denied);
        }
        for watch in watches {
            watch(Err(GeolocationError::PermissionDenied));
        }
    }

    /// The device moved. Ignored unless access is granted.
    pub fn move_to(&self, position: Position) {
        let watches = {
            let mut state = lock(&self.state);
            if state.permission != PermissionState::Granted {
                return;
            }
            state.position = Some(position);
            collect(&state.watches)
        };
        for watch in watches {
            watch(Ok(position));
        }
    }

    pub fn active_watches(&self) -> usize {
        lock(&self.state).watches.len()
    }
}

fn collect<T: Clone>(map: &HashMap<u64, T>) -> Vec<T> {
    map.values().cloned().collect()
}

fn notify_permission(subscribers: &[PermissionCallback], permission: PermissionState) {
    debug!("Permission changed to {}", permission);
    for subscriber in subscribers {
        subscriber(permission);
    }
}

#[async_trait]
impl GeolocationAccessor for ManualGeolocation {
    async fn query_permission(&self) -> Option<PermissionState> {
        Some(self.permission())
    }

    async fn current_position(&self, _options: PositionOptions) -> Result<Position, GeolocationError> {
        let state = lock(&self.state);
        match state.permission {
            PermissionState::Granted => state.position.ok_or(GeolocationError::PositionUnavailable),
            _ => Err(GeolocationError::PermissionDenied),
        }
    }

    fn watch_position(&self, _options: PositionOptions, callback: WatchCallback) -> WatchId {
        let (id, initial) = {
            let mut state = lock(&self.state);
            let id = state.next_id;
            state.next_id += 1;
            state.watches.insert(id, callback.clone());
            let initial = match state.permission {
                PermissionState::Granted => state.position,
                _ => None,
            };
            (id, initial)
        };
        if let Some(position) = initial {
            callback(Ok(position));
        }
        WatchId(id)
    }

    fn clear_watch(&self, id: WatchId) {
        lock(&self.state).watches.remove(&id.0);
    }

    fn subscribe_permission_changes(&self, callback: PermissionCallback) -> Option<SubscriptionId> {
        let mut state = lock(&self.state);
        let id = state.next_id;
        state.next_id += 1;
        state.subscribers.insert(id, callback);
        Some(SubscriptionId(id))
    }

    fn unsubscribe_permission_changes(&self, id: SubscriptionId) {
        lock(&self.state).subscribers.remove(&id.0);
    }
}
