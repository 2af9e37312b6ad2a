//! Store and subscription traits the reconciler runs against.
//!
//! These traits are the boundary to the cluster: a production deployment
//! backs them with the cluster resource API, tests and the default server
//! wiring use the in-memory backend.

use async_trait::async_trait;

use pipecov_core::Activity;
use tokio::sync::broadcast;

use crate::error::StoreError;
use crate::event::WatchEvent;

/// Versioned read/update access to the shared activity collection.
///
/// Implementations must be thread-safe (`Send + Sync`). `update` performs
/// the atomic compare-on-version check: it succeeds only when the
/// activity's `resource_version` matches the stored one, and returns the
/// activity with a fresh token on success.
#[async_trait]
pub trait ActivityStore: Send + Sync {
    /// Reads an activity by namespace and name.
    ///
    /// Returns `None` if the activity does not exist; errors are reserved
    /// for infrastructure failures.
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Activity>, StoreError>;

    /// Writes back a mutated activity.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` iff the supplied resource-version
    /// token is stale, `StoreError::NotFound` if the activity vanished.
    async fn update(&self, activity: Activity) -> Result<Activity, StoreError>;

    /// Creates a new activity. Producers use this to seed pipeline runs.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::AlreadyExists` for duplicate namespace/name.
    async fn insert(&self, activity: Activity) -> Result<Activity, StoreError>;

    /// Lists all activities in a namespace, used for periodic resync.
    async fn list(&self, namespace: &str) -> Result<Vec<Activity>, StoreError>;
}

/// Change-event subscription over the activity collection.
///
/// Delivery is at-least-once: the same activity state may be redelivered,
/// and consumers must tolerate redundant notifications without side
/// effects.
pub trait ActivityEvents: Send + Sync {
    /// Subscribes to create/update events.
    fn subscribe(&self) -> broadcast::Receiver<WatchEvent>;
}
