use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use papaya::HashMap as PapayaHashMap;
use tokio::sync::{Mutex, broadcast};

use pipecov_core::Activity;
use pipecov_storage::{ActivityEvents, ActivityStore, StoreError, WatchEvent};

pub type StorageKey = String; // Format: "namespace/name"

fn make_storage_key(namespace: &str, name: &str) -> StorageKey {
    format!("{namespace}/{name}")
}

/// In-memory activity store with optimistic concurrency.
///
/// Every successful write bumps a monotonic version counter and stamps the
/// stored activity with the fresh token. `update` rejects writers whose
/// token no longer matches, which is exactly the conflict signal the
/// reconciler's backoff loop retries on.
#[derive(Debug)]
pub struct InMemoryActivityStore {
    data: Arc<PapayaHashMap<StorageKey, Activity>>,
    version_counter: AtomicU64,
    /// Serializes writers; the version check and insert must be atomic.
    write_lock: Mutex<()>,
    events: broadcast::Sender<WatchEvent>,
}

impl InMemoryActivityStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            data: Arc::new(PapayaHashMap::new()),
            version_counter: AtomicU64::new(1),
            write_lock: Mutex::new(()),
            events,
        }
    }

    fn next_version(&self) -> String {
        self.version_counter
            .fetch_add(1, Ordering::SeqCst)
            .to_string()
    }

    fn publish(&self, activity: &Activity) {
        // Nobody listening is fine; the resync pass covers missed events.
        let _ = self.events.send(WatchEvent::Applied(activity.clone()));
    }
}

impl Default for InMemoryActivityStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ActivityStore for InMemoryActivityStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Activity>, StoreError> {
        let key = make_storage_key(namespace, name);
        let guard = self.data.pin();
        Ok(guard.get(&key).cloned())
    }

    async fn update(&self, mut activity: Activity) -> Result<Activity, StoreError> {
        let key = make_storage_key(&activity.namespace, &activity.name);
        let _write = self.write_lock.lock().await;

        let current = {
            let guard = self.data.pin();
            guard
                .get(&key)
                .cloned()
                .ok_or_else(|| StoreError::not_found(&activity.namespace, &activity.name))?
        };

        if activity.resource_version != current.resource_version {
            return Err(StoreError::conflict(
                &activity.namespace,
                &activity.name,
                activity.resource_version.clone(),
                current.resource_version.unwrap_or_default(),
            ));
        }

        activity.resource_version = Some(self.next_version());
        let guard = self.data.pin();
        guard.insert(key, activity.clone());
        drop(guard);

        self.publish(&activity);
        Ok(activity)
    }

    async fn insert(&self, mut activity: Activity) -> Result<Activity, StoreError> {
        let key = make_storage_key(&activity.namespace, &activity.name);
        let _write = self.write_lock.lock().await;

        {
            let guard = self.data.pin();
            if guard.get(&key).is_some() {
                return Err(StoreError::already_exists(
                    &activity.namespace,
                    &activity.name,
                ));
            }
        }

        activity.resource_version = Some(self.next_version());
        let guard = self.data.pin();
        guard.insert(key, activity.clone());
        drop(guard);

        self.publish(&activity);
        Ok(activity)
    }

    async fn list(&self, namespace: &str) -> Result<Vec<Activity>, StoreError> {
        let prefix = format!("{namespace}/");
        let guard = self.data.pin();
        let mut activities: Vec<Activity> = guard
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(_, activity)| activity.clone())
            .collect();
        activities.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(activities)
    }
}

impl ActivityEvents for InMemoryActivityStore {
    fn subscribe(&self) -> broadcast::Receiver<WatchEvent> {
        self.events.subscribe()
    }
}
