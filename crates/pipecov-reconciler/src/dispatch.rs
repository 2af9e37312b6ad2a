//! Change dispatch: subscription events and resync, fanned out to workers.
//!
//! Snapshots flow into bounded per-worker queues; same-resource events hash
//! to the same worker, so updates to one activity are handled in delivery
//! order. Events for different activities proceed in parallel.

use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use pipecov_core::Activity;
use pipecov_storage::{ActivityStore, WatchEvent};

use crate::reconciler::Reconciler;

/// Interval of the periodic full resync.
pub const RESYNC_INTERVAL: Duration = Duration::from_secs(600);

/// Dispatcher tuning.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Namespace whose activities are watched and resynced.
    pub namespace: String,
    /// Number of reconciliation workers.
    pub workers: usize,
    /// Capacity of each worker's queue.
    pub queue_capacity: usize,
    /// How often the full activity list is replayed.
    pub resync_interval: Duration,
}

impl DispatchConfig {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            workers: 4,
            queue_capacity: 64,
            resync_interval: RESYNC_INTERVAL,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_resync_interval(mut self, interval: Duration) -> Self {
        self.resync_interval = interval;
        self
    }
}

/// Handle over the running dispatcher and its workers.
pub struct DispatcherHandle {
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl DispatcherHandle {
    /// Stops the dispatcher and waits for workers to drain their queues.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for task in self.tasks {
            let _ = task.await;
        }
    }
}

/// Spawns the dispatcher and its worker pool.
///
/// Runs until the returned handle is shut down; subscription lag is
/// tolerated because the periodic resync replays every activity.
pub fn spawn(
    reconciler: Arc<Reconciler>,
    store: Arc<dyn ActivityStore>,
    events: broadcast::Receiver<WatchEvent>,
    config: DispatchConfig,
) -> DispatcherHandle {
    let cancel = CancellationToken::new();
    // The worker count is also a public field; routing needs at least one.
    let workers = config.workers.max(1);
    let mut tasks = Vec::with_capacity(workers + 1);
    let mut senders = Vec::with_capacity(workers);

    for worker_id in 0..workers {
        let (tx, rx) = mpsc::channel::<Activity>(config.queue_capacity);
        senders.push(tx);
        tasks.push(tokio::spawn(run_worker(worker_id, rx, reconciler.clone())));
    }

    tasks.push(tokio::spawn(run_dispatcher(
        store,
        events,
        senders,
        config,
        cancel.clone(),
    )));

    DispatcherHandle { cancel, tasks }
}

async fn run_dispatcher(
    store: Arc<dyn ActivityStore>,
    mut events: broadcast::Receiver<WatchEvent>,
    senders: Vec<mpsc::Sender<Activity>>,
    config: DispatchConfig,
    cancel: CancellationToken,
) {
    let mut resync = tokio::time::interval(config.resync_interval);
    resync.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    info!(
        namespace = %config.namespace,
        workers = senders.len(),
        resync_secs = config.resync_interval.as_secs(),
        "dispatcher started"
    );

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            // The first tick fires immediately and doubles as initial sync.
            _ = resync.tick() => {
                resync_namespace(&store, &config.namespace, &senders).await;
            }
            event = events.recv() => match event {
                Ok(WatchEvent::Applied(activity)) => {
                    // The subscription is store-wide; only the configured
                    // namespace is watched.
                    if activity.namespace == config.namespace {
                        route(&senders, activity).await;
                    } else {
                        debug!(activity = %activity.key(), "activity outside watched namespace, ignoring");
                    }
                }
                Ok(WatchEvent::Unknown(kind)) => {
                    warn!(kind, "unexpected object delivered by subscription, ignoring");
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "subscription lagged, relying on resync");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }
    // Dropping the senders lets workers drain and exit.
    info!("dispatcher stopped");
}

async fn resync_namespace(
    store: &Arc<dyn ActivityStore>,
    namespace: &str,
    senders: &[mpsc::Sender<Activity>],
) {
    match store.list(namespace).await {
        Ok(activities) => {
            debug!(namespace, count = activities.len(), "resyncing activities");
            for activity in activities {
                route(senders, activity).await;
            }
        }
        Err(err) => warn!(namespace, %err, "resync list failed"),
    }
}

async fn route(senders: &[mpsc::Sender<Activity>], activity: Activity) {
    let mut hasher = DefaultHasher::new();
    activity.key().hash(&mut hasher);
    let slot = (hasher.finish() as usize) % senders.len();
    if senders[slot].send(activity).await.is_err() {
        warn!(worker = slot, "worker queue closed, dropping event");
    }
}

async fn run_worker(worker_id: usize, mut rx: mpsc::Receiver<Activity>, reconciler: Arc<Reconciler>) {
    debug!(worker_id, "worker started");
    while let Some(activity) = rx.recv().await {
        reconciler.reconcile(&activity).await;
    }
    debug!(worker_id, "worker stopped");
}
