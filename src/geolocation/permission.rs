//! The location permission state machine.
//!
//! Owns [`LocationPermissionState`] and is the only writer of it. Every
//! change is published on a `tokio::sync::watch` channel so map and dialog
//! consumers can follow along.
//!
//! States move `unknown -> {granted, denied, prompt}`; `granted` degrades to
//! `denied` when the platform reports a revocation. There are no retries
//! here: a failed acquisition is classified, surfaced through `error`, and
//! left for the user to act on.

use crate::critical;
use crate::error::{GeolocationError, PREVIOUSLY_DENIED_MESSAGE};
use crate::geolocation::{
    GeolocationAccessor, LocationStore, PermissionCallback, SubscriptionId, WatchCallback, WatchId,
};
use crate::lock;
use crate::models::{LocationPermissionState, PermissionState, Position, PositionOptions};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

struct ActiveWatch {
    token: u64,
    /// `None` while the platform registration is still in progress.
    id: Option<WatchId>,
}

struct Inner {
    state: LocationPermissionState,
    watch: Option<ActiveWatch>,
    next_token: u64,
}

/// State shared with watch callbacks.
struct Shared {
    inner: Mutex<Inner>,
    tx: watch::Sender<LocationPermissionState>,
}

impl Shared {
    /// Applies `f` under the lock and publishes the state if it changed.
    fn update<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> R {
        let mut inner = lock(&self.inner);
        let before = inner.state.clone();
        let result = f(&mut inner);
        if inner.state != before {
            self.tx.send_replace(inner.state.clone());
        }
        result
    }
}

struct Listener {
    subscription: SubscriptionId,
    task: JoinHandle<()>,
}

pub struct PermissionStateMachine {
    accessor: Arc<dyn GeolocationAccessor>,
    store: Option<LocationStore>,
    shared: Arc<Shared>,
    listener: Mutex<Option<Listener>>,
}

impl PermissionStateMachine {
    pub fn new(accessor: Arc<dyn GeolocationAccessor>, store: Option<LocationStore>) -> Self {
        let (tx, _rx) = watch::channel(LocationPermissionState::default());
        Self {
            accessor,
            store,
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    state: LocationPermissionState::default(),
                    watch: None,
                    next_token: 1,
                }),
                tx,
            }),
            listener: Mutex::new(None),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> LocationPermissionState {
        lock(&self.shared.inner).state.clone()
    }

    /// Receiver that sees every state change.
    pub fn subscribe(&self) -> watch::Receiver<LocationPermissionState> {
        self.shared.tx.subscribe()
    }

    /// Queries the platform permission registry. Never fails: a missing
    /// registry or a failed query reads as `Unknown`.
    pub async fn check_permission_state(&self) -> PermissionState {
        self.accessor
            .query_permission()
            .await
            .unwrap_or(PermissionState::Unknown)
    }

    /// Asks for a one-shot position and, on success, starts tracking.
    ///
    /// When permission is already known to be denied the position API is not
    /// called at all.
    pub async fn request_permission(&self) -> Result<Position, GeolocationError> {
        self.shared.update(|inner| {
            inner.state.loading = true;
            inner.state.error = None;
        });

        if self.check_permission_state().await == PermissionState::Denied {
            info!("Location permission previously denied, not requesting position");
            self.forget_stored();
            self.shared.update(|inner| {
                inner.state.permission_state = PermissionState::Denied;
                inner.state.clear_position();
                inner.state.error = Some(PREVIOUSLY_DENIED_MESSAGE.to_string());
                inner.state.loading = false;
            });
            return Err(GeolocationError::PermissionDenied);
        }

        let options = PositionOptions::one_shot();
        let outcome = tokio::time::timeout(options.timeout, self.accessor.current_position(options))
            .await
            .unwrap_or(Err(GeolocationError::Timeout));

        match outcome {
            Ok(position) => {
                info!(
                    "Location acquired: ({}, {}) ±{}m",
                    position.latitude, position.longitude, position.accuracy
                );
                self.shared.update(|inner| {
                    inner.state.set_position(&position);
                    inner.state.permission_state = PermissionState::Granted;
                    inner.state.error = None;
                    inner.state.loading = false;
                });
                self.remember(&position);
                self.start_watching();
                Ok(position)
            },
            Err(kind) => {
                warn!("Location request failed: {:?}", kind);
                let permission = self.check_permission_state().await;
                if permission == PermissionState::Denied {
                    self.forget_stored();
                }
                self.shared.update(|inner| {
                    inner.state.error = Some(kind.to_string());
                    inner.state.loading = false;
                    inner.state.permission_state = permission;
                    if permission != PermissionState::Granted {
                        inner.state.clear_position();
                    }
                });
                Err(kind)
            },
        }
    }

    /// Starts continuous tracking. No-op while a watch is active.
    pub fn start_watching(&self) {
        let token = {
            let mut inner = lock(&self.shared.inner);
            if inner.watch.is_some() {
                debug!("Already watching position");
                return;
            }
            let token = inner.next_token;
            inner.next_token += 1;
            inner.watch = Some(ActiveWatch { token, id: None });
            token
        };

        let callback = watch_callback(
            Arc::clone(&self.shared),
            Arc::clone(&self.accessor),
            self.store.clone(),
            token,
        );
        let id = self.accessor.watch_position(PositionOptions::watch(), callback);

        let registered = self.shared.update(|inner| match &mut inner.watch {
            Some(active) if active.token == token => {
                active.id = Some(id);
                inner.state.is_watching = true;
                true
            },
            _ => false,
        });
        if registered {
            debug!("Watching position ({:?})", id);
        } else {
            // Cancelled while registering.
            self.accessor.clear_watch(id);
        }
    }

    /// Stops continuous tracking. Callbacks arriving afterwards are ignored.
    pub fn stop_watching(&self) {
        let id = self.shared.update(|inner| {
            inner.state.is_watching = false;
            inner.watch.take().and_then(|active| active.id)
        });
        if let Some(id) = id {
            debug!("Stopped watching position ({:?})", id);
            self.accessor.clear_watch(id);
        }
    }

    /// Stops tracking and resets to the initial `unknown` state.
    pub fn clear_permissions(&self) {
        self.stop_watching();
        self.forget_stored();
        self.shared.update(|inner| {
            inner.state = LocationPermissionState::default();
        });
        info!("Location permission state cleared");
    }

    /// Initial permission check plus the change listener.
    ///
    /// Within the same session, stored coordinates are restored and tracking
    /// resumes. Otherwise, if permission is already granted, a one-shot fetch
    /// runs immediately.
    pub async fn mount(self: &Arc<Self>) {
        let restored = self.store.as_ref().and_then(LocationStore::load);
        let permission = self.check_permission_state().await;
        debug!("Initial location permission: {}", permission);

        match (permission, restored) {
            (PermissionState::Granted | PermissionState::Unknown, Some(position)) => {
                info!("Restored location from this session");
                self.shared.update(|inner| {
                    inner.state.set_position(&position);
                    inner.state.permission_state = PermissionState::Granted;
                });
                self.start_watching();
            },
            (permission, restored) => {
                if restored.is_some() {
                    self.forget_stored();
                }
                self.shared.update(|inner| inner.state.permission_state = permission);
                if permission == PermissionState::Granted {
                    let _ = self.request_permission().await;
                }
            },
        }

        self.listen_for_changes();
    }

    /// Cancels the change listener and any active watch.
    pub fn unmount(&self) {
        if let Some(listener) = lock(&self.listener).take() {
            self.accessor.unsubscribe_permission_changes(listener.subscription);
            listener.task.abort();
        }
        self.stop_watching();
    }

    /// Reacts to a platform permission change notification.
    pub async fn handle_permission_change(&self, notified: PermissionState) {
        let permission = match self.check_permission_state().await {
            PermissionState::Unknown => notified,
            queried => queried,
        };
        info!("Location permission changed to {}", permission);

        match permission {
            PermissionState::Granted => {
                let needs_position = self.shared.update(|inner| {
                    inner.state.permission_state = PermissionState::Granted;
                    !inner.state.has_coordinates()
                });
                if needs_position {
                    let _ = self.request_permission().await;
                }
            },
            other => {
                self.stop_watching();
                if other == PermissionState::Denied {
                    self.forget_stored();
                }
                self.shared.update(|inner| {
                    inner.state.permission_state = other;
                    inner.state.clear_position();
                });
            },
        }
    }

    fn listen_for_changes(self: &Arc<Self>) {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let callback: PermissionCallback = Arc::new(move |state| {
            let _ = tx.send(state);
        });
        let Some(subscription) = self.accessor.subscribe_permission_changes(callback) else {
            debug!("Platform does not report permission changes");
            return;
        };

        let machine = Arc::downgrade(self);
        let task = tokio::spawn(async move {
            while let Some(notified) = rx.recv().await {
                let Some(machine) = machine.upgrade() else {
                    break;
                };
                machine.handle_permission_change(notified).await;
            }
        });

        let previous = lock(&self.listener).replace(Listener { subscription, task });
        if let Some(previous) = previous {
            self.accessor.unsubscribe_permission_changes(previous.subscription);
            previous.task.abort();
        }
    }

    fn remember(&self, position: &Position) {
        if let Some(store) = &self.store {
            if let Err(e) = store.save(position) {
                critical!("Failed to persist location: {}", e);
            }
        }
    }

    fn forget_stored(&self) {
        if let Some(store) = &self.store {
            if let Err(e) = store.clear() {
                critical!("Failed to clear persisted location: {}", e);
            }
        }
    }
}

impl Drop for PermissionStateMachine {
    fn drop(&mut self) {
        self.unmount();
    }
}

enum WatchAction {
    Ignore,
    Persist(Position),
    Cancel(Option<WatchId>),
}

/// Callback for one watch registration, identified by `token`.
fn watch_callback(
    shared: Arc<Shared>,
    accessor: Arc<dyn GeolocationAccessor>,
    store: Option<LocationStore>,
    token: u64,
) -> WatchCallback {
    Arc::new(move |update| {
        let action = shared.update(|inner| {
            let active = matches!(&inner.watch, Some(w) if w.token == token);
            if !active {
                return WatchAction::Ignore;
            }
            match update {
                Ok(position) => {
                    inner.state.set_position(&position);
                    inner.state.permission_state = PermissionState::Granted;
                    inner.state.is_watching = true;
                    inner.state.error = None;
                    WatchAction::Persist(position)
                },
                Err(e) if e.is_permission_denied() => {
                    inner.state.error = Some(e.to_string());
                    inner.state.permission_state = PermissionState::Denied;
                    inner.state.is_watching = false;
                    inner.state.clear_position();
                    WatchAction::Cancel(inner.watch.take().and_then(|w| w.id))
                },
                Err(e) => {
                    inner.state.error = Some(e.to_string());
                    WatchAction::Ignore
                },
            }
        });

        match action {
            WatchAction::Ignore => {},
            WatchAction::Persist(position) => {
                debug!("Live location: ({}, {})", position.latitude, position.longitude);
                if let Some(store) = &store {
                    if let Err(e) = store.save(&position) {
                        warn!("Failed to persist live location: {}", e);
                    }
                }
            },
            WatchAction::Cancel(id) => {
                warn!("Location permission revoked while watching");
                if let Some(id) = id {
                    accessor.clear_watch(id);
                }
                if let Some(store) = &store {
                    if let Err(e) = store.clear() {
                        warn!("Failed to clear persisted location: {}", e);
                    }
                }
            },
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geolocation::{temp_store_path, ManualGeolocation};
    use async_trait::async_trait;
    use std::time::Duration;

    const HOME: Position = Position {
        latitude: 41.0082,
        longitude: 28.9784,
        accuracy: 15.0,
    };

    // --- Fake platform ---
    // Delegates to ManualGeolocation, records calls and allows overrides.
    #[derive(Default)]
    struct FakeState {
        query_override: Option<Option<PermissionState>>,
        position_override: Option<Result<Position, GeolocationError>>,
        position_delay: Option<Duration>,
        position_calls: u32,
        watch_calls: u32,
        clear_calls: u32,
        last_watch: Option<WatchCallback>,
    }

    struct FakeGeolocation {
        platform: ManualGeolocation,
        state: Mutex<FakeState>,
    }

    impl FakeGeolocation {
        fn new(platform: ManualGeolocation) -> Arc<Self> {
            Arc::new(Self {
                platform,
                state: Mutex::new(FakeState::default()),
            })
        }

        fn emit(&self, update: Result<Position, GeolocationError>) {
            let callback = lock(&self.state).last_watch.clone();
            if let Some(callback) = callback {
                callback(update);
            }
        }

        fn position_calls(&self) -> u32 {
            lock(&self.state).position_calls
        }

        fn watch_calls(&self) -> u32 {
            lock(&self.state).watch_calls
        }

        fn clear_calls(&self) -> u32 {
            lock(&self.state).clear_calls
        }
    }

    #[async_trait]
    impl GeolocationAccessor for FakeGeolocation {
        async fn query_permission(&self) -> Option<PermissionState> {
            let query_override = lock(&self.state).query_override;
            match query_override {
                Some(result) => result,
                None => self.platform.query_permission().await,
            }
        }

        async fn current_position(&self, options: PositionOptions) -> Result<Position, GeolocationError> {
            let (delay, position_override) = {
                let mut state = lock(&self.state);
                state.position_calls += 1;
                (state.position_delay, state.position_override)
            };
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            match position_override {
                Some(result) => result,
                None => self.platform.current_position(options).await,
            }
        }

        fn watch_position(&self, options: PositionOptions, callback: WatchCallback) -> WatchId {
            {
                let mut state = lock(&self.state);
                state.watch_calls += 1;
                state.last_watch = Some(callback.clone());
            }
            self.platform.watch_position(options, callback)
        }

        fn clear_watch(&self, id: WatchId) {
            lock(&self.state).clear_calls += 1;
            self.platform.clear_watch(id);
        }

        fn subscribe_permission_changes(&self, callback: PermissionCallback) -> Option<SubscriptionId> {
            self.platform.subscribe_permission_changes(callback)
        }

        fn unsubscribe_permission_changes(&self, id: SubscriptionId) {
            self.platform.unsubscribe_permission_changes(id);
        }
    }

    fn machine(fake: &Arc<FakeGeolocation>) -> Arc<PermissionStateMachine> {
        Arc::new(PermissionStateMachine::new(fake.clone(), None))
    }

    async fn wait_until(
        machine: &PermissionStateMachine,
        predicate: impl FnMut(&LocationPermissionState) -> bool,
    ) -> LocationPermissionState {
        let mut rx = machine.subscribe();
        let state = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(predicate))
            .await
            .expect("state change within timeout")
            .expect("sender alive")
            .clone();
        state
    }

    #[tokio::test]
    async fn test_check_permission_state_defaults_to_unknown() {
        let fake = FakeGeolocation::new(ManualGeolocation::new());
        lock(&fake.state).query_override = Some(None);
        let machine = machine(&fake);
        assert_eq!(machine.check_permission_state().await, PermissionState::Unknown);
    }

    #[tokio::test]
    async fn test_request_when_denied_never_asks_for_position() {
        let platform = ManualGeolocation::new();
        platform.deny();
        let fake = FakeGeolocation::new(platform);
        let machine = machine(&fake);

        let result = machine.request_permission().await;

        assert_eq!(result, Err(GeolocationError::PermissionDenied));
        assert_eq!(fake.position_calls(), 0);
        let state = machine.state();
        assert_eq!(state.permission_state, PermissionState::Denied);
        assert_eq!(state.error.as_deref(), Some(PREVIOUSLY_DENIED_MESSAGE));
        assert!(!state.loading);
        assert!(state.coordinates().is_none());
    }

    #[tokio::test]
    async fn test_request_success_populates_and_starts_watching() {
        let fake = FakeGeolocation::new(ManualGeolocation::granted(HOME));
        let machine = machine(&fake);

        let position = machine.request_permission().await.unwrap();

        assert_eq!(position, HOME);
        let state = machine.state();
        assert_eq!(state.permission_state, PermissionState::Granted);
        assert_eq!(state.coordinates(), Some((HOME.latitude, HOME.longitude)));
        assert_eq!(state.accuracy, Some(HOME.accuracy));
        assert!(!state.loading);
        assert!(state.is_watching);
        assert!(state.error.is_none());
        assert_eq!(fake.watch_calls(), 1);
    }

    #[tokio::test]
    async fn test_request_failure_is_classified() {
        let fake = FakeGeolocation::new(ManualGeolocation::granted(HOME));
        lock(&fake.state).position_override = Some(Err(GeolocationError::PositionUnavailable));
        let machine = machine(&fake);

        let result = machine.request_permission().await;

        assert_eq!(result, Err(GeolocationError::PositionUnavailable));
        let state = machine.state();
        assert_eq!(
            state.error,
            Some(GeolocationError::PositionUnavailable.to_string())
        );
        assert_eq!(state.permission_state, PermissionState::Granted);
        assert!(!state.loading);
        assert!(!state.is_watching);
        assert_eq!(fake.watch_calls(), 0);
    }

    #[tokio::test]
    async fn test_request_failure_rechecks_permission() {
        let platform = ManualGeolocation::new();
        let fake = FakeGeolocation::new(platform);
        let machine = machine(&fake);

        // Prompt state: the manual platform refuses the position.
        let result = machine.request_permission().await;
        assert_eq!(result, Err(GeolocationError::PermissionDenied));
        let state = machine.state();
        assert_eq!(state.permission_state, PermissionState::Prompt);
        assert_eq!(state.error, Some(GeolocationError::PermissionDenied.to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_times_out_after_fifteen_seconds() {
        let fake = FakeGeolocation::new(ManualGeolocation::granted(HOME));
        lock(&fake.state).position_delay = Some(Duration::from_secs(60));
        let machine = machine(&fake);

        let started = tokio::time::Instant::now();
        let result = machine.request_permission().await;

        assert_eq!(result, Err(GeolocationError::Timeout));
        assert!(started.elapsed() >= Duration::from_secs(15));
        assert!(started.elapsed() < Duration::from_secs(16));
        assert_eq!(machine.state().error, Some(GeolocationError::Timeout.to_string()));
    }

    #[tokio::test]
    async fn test_request_clears_previous_error() {
        let fake = FakeGeolocation::new(ManualGeolocation::granted(HOME));
        lock(&fake.state).position_override = Some(Err(GeolocationError::Unknown));
        let machine = machine(&fake);
        let _ = machine.request_permission().await;
        assert!(machine.state().error.is_some());

        lock(&fake.state).position_override = None;
        machine.request_permission().await.unwrap();
        assert!(machine.state().error.is_none());
    }

    #[tokio::test]
    async fn test_start_watching_is_idempotent() {
        let fake = FakeGeolocation::new(ManualGeolocation::granted(HOME));
        let machine = machine(&fake);

        machine.start_watching();
        machine.start_watching();
        assert_eq!(fake.watch_calls(), 1);
        assert_eq!(fake.platform.active_watches(), 1);
        assert!(machine.state().is_watching);

        machine.stop_watching();
        machine.stop_watching();
        assert_eq!(fake.clear_calls(), 1);
        assert!(!machine.state().is_watching);

        machine.start_watching();
        assert_eq!(fake.watch_calls(), 2);
    }

    #[tokio::test]
    async fn test_watch_updates_coordinates() {
        let fake = FakeGeolocation::new(ManualGeolocation::granted(HOME));
        let machine = machine(&fake);
        machine.start_watching();

        let moved = Position {
            latitude: 41.05,
            longitude: 29.01,
            accuracy: 8.0,
        };
        fake.platform.move_to(moved);

        let state = machine.state();
        assert_eq!(state.coordinates(), Some((41.05, 29.01)));
        assert_eq!(state.accuracy, Some(8.0));
        assert_eq!(state.permission_state, PermissionState::Granted);
        assert!(state.is_watching);
    }

    #[tokio::test]
    async fn test_callbacks_after_stop_are_ignored() {
        let fake = FakeGeolocation::new(ManualGeolocation::granted(HOME));
        let machine = machine(&fake);
        machine.start_watching();
        machine.stop_watching();
        let before = machine.state();

        fake.emit(Ok(Position {
            latitude: 1.0,
            longitude: 2.0,
            accuracy: 3.0,
        }));
        fake.emit(Err(GeolocationError::PermissionDenied));

        assert_eq!(machine.state(), before);
    }

    #[tokio::test]
    async fn test_watch_denial_cancels_watch() {
        let fake = FakeGeolocation::new(ManualGeolocation::granted(HOME));
        let machine = machine(&fake);
        machine.start_watching();

        fake.emit(Err(GeolocationError::PermissionDenied));

        let state = machine.state();
        assert!(!state.is_watching);
        assert_eq!(state.permission_state, PermissionState::Denied);
        assert!(state.coordinates().is_none());
        assert_eq!(fake.clear_calls(), 1);
        assert_eq!(fake.platform.active_watches(), 0);

        // The handle was cleared, so watching can start again.
        machine.start_watching();
        assert_eq!(fake.watch_calls(), 2);
    }

    #[tokio::test]
    async fn test_watch_non_denial_error_keeps_watching() {
        let fake = FakeGeolocation::new(ManualGeolocation::granted(HOME));
        let machine = machine(&fake);
        machine.start_watching();

        fake.emit(Err(GeolocationError::Timeout));

        let state = machine.state();
        assert!(state.is_watching);
        assert_eq!(state.error, Some(GeolocationError::Timeout.to_string()));
        assert_eq!(fake.clear_calls(), 0);

        fake.emit(Ok(HOME));
        assert!(machine.state().error.is_none());
    }

    #[tokio::test]
    async fn test_clear_permissions_resets_everything() {
        let fake = FakeGeolocation::new(ManualGeolocation::granted(HOME));
        let machine = machine(&fake);
        machine.request_permission().await.unwrap();

        machine.clear_permissions();

        assert_eq!(machine.state(), LocationPermissionState::default());
        assert_eq!(fake.platform.active_watches(), 0);
    }

    #[tokio::test]
    async fn test_mount_with_granted_permission_fetches_immediately() {
        let fake = FakeGeolocation::new(ManualGeolocation::granted(HOME));
        let machine = machine(&fake);

        machine.mount().await;

        let state = machine.state();
        assert_eq!(state.coordinates(), Some((HOME.latitude, HOME.longitude)));
        assert_eq!(fake.position_calls(), 1);
        assert!(state.is_watching);
        machine.unmount();
        assert_eq!(fake.platform.active_watches(), 0);
    }

    #[tokio::test]
    async fn test_mount_with_prompt_waits_for_grant_notification() {
        let fake = FakeGeolocation::new(ManualGeolocation::new());
        let machine = machine(&fake);

        machine.mount().await;
        assert_eq!(machine.state().permission_state, PermissionState::Prompt);
        assert_eq!(fake.position_calls(), 0);

        fake.platform.grant(HOME);
        let state = wait_until(&machine, |s| s.has_coordinates() && !s.loading).await;

        assert_eq!(state.permission_state, PermissionState::Granted);
        assert_eq!(state.coordinates(), Some((HOME.latitude, HOME.longitude)));
        machine.unmount();
    }

    #[tokio::test]
    async fn test_revocation_notification_clears_coordinates() {
        let fake = FakeGeolocation::new(ManualGeolocation::granted(HOME));
        let machine = machine(&fake);
        machine.mount().await;
        assert!(machine.state().has_coordinates());

        fake.platform.deny();
        let state = wait_until(&machine, |s| {
            s.permission_state == PermissionState::Denied && !s.has_coordinates()
        })
        .await;

        assert!(!state.is_watching);
        assert_eq!(fake.platform.active_watches(), 0);
        machine.unmount();
    }

    #[tokio::test]
    async fn test_mount_restores_same_session_location() {
        let path = temp_store_path("restore");
        let store = LocationStore::open(&path, "session-a").unwrap();
        store.save(&HOME).unwrap();

        let fake = FakeGeolocation::new(ManualGeolocation::granted(HOME));
        let machine = Arc::new(PermissionStateMachine::new(fake.clone(), Some(store)));
        machine.mount().await;

        let state = machine.state();
        assert_eq!(state.coordinates(), Some((HOME.latitude, HOME.longitude)));
        assert_eq!(state.permission_state, PermissionState::Granted);
        assert_eq!(fake.position_calls(), 0);
        assert!(state.is_watching);
        machine.unmount();
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_mount_drops_stored_location_when_denied() {
        let path = temp_store_path("restore-denied");
        let store = LocationStore::open(&path, "session-b").unwrap();
        store.save(&HOME).unwrap();

        let platform = ManualGeolocation::new();
        platform.deny();
        let fake = FakeGeolocation::new(platform);
        let machine = Arc::new(PermissionStateMachine::new(fake.clone(), Some(store.clone())));
        machine.mount().await;

        assert_eq!(machine.state().permission_state, PermissionState::Denied);
        assert!(machine.state().coordinates().is_none());
        assert_eq!(store.load(), None);
        machine.unmount();
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_successful_request_is_persisted() {
        let path = temp_store_path("persist");
        let store = LocationStore::open(&path, "session-c").unwrap();
        let fake = FakeGeolocation::new(ManualGeolocation::granted(HOME));
        let machine = Arc::new(PermissionStateMachine::new(fake.clone(), Some(store.clone())));

        machine.request_permission().await.unwrap();
        assert_eq!(store.load(), Some(HOME));

        machine.clear_permissions();
        assert_eq!(store.load(), None);
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_state_changes_are_published() {
        let fake = FakeGeolocation::new(ManualGeolocation::granted(HOME));
        let machine = machine(&fake);
        let mut rx = machine.subscribe();

        machine.request_permission().await.unwrap();

        assert!(rx.has_changed().unwrap());
        let published = rx.borrow_and_update().clone();
        assert_eq!(published, machine.state());
    }
}
