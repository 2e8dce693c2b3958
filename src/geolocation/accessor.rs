//! The platform seam for position and permission APIs.

use crate::error::GeolocationError;
use crate::models::{PermissionState, Position, PositionOptions};
use async_trait::async_trait;
use std::sync::Arc;

/// Handle of an active continuous position subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(pub u64);

/// Handle of a permission-change subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Invoked for every position update or error of a watch.
pub type WatchCallback = Arc<dyn Fn(Result<Position, GeolocationError>) + Send + Sync>;

/// Invoked whenever the platform reports a new permission state.
pub type PermissionCallback = Arc<dyn Fn(PermissionState) + Send + Sync>;

/// One-shot and continuous position access plus the permission registry.
#[async_trait]
pub trait GeolocationAccessor: Send + Sync {
    /// Current geolocation permission. `None` when the platform has no
    /// permission registry or the query failed.
    async fn query_permission(&self) -> Option<PermissionState>;

    /// Requests a single position fix.
    async fn current_position(&self, options: PositionOptions) -> Result<Position, GeolocationError>;

    /// Starts continuous tracking. The callback may fire any number of times
    /// until [`GeolocationAccessor::clear_watch`] is called.
    fn watch_position(&self, options: PositionOptions, callback: WatchCallback) -> WatchId;

    fn clear_watch(&self, id: WatchId);

    /// Subscribes to permission changes. `None` when the platform cannot
    /// report them.
    fn subscribe_permission_changes(&self, callback: PermissionCallback) -> Option<SubscriptionId>;

    fn unsubscribe_permission_changes(&self, id: SubscriptionId);
}
