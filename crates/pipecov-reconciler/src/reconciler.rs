//! The reconciliation core: decide, fetch, normalize, merge.

use std::sync::Arc;

use tracing::{debug, error, info};

use pipecov_core::{Activity, COVERAGE_ATTACHMENT, Fact};
use pipecov_report::{Report, ReportFetcher, base_url, versioned_url};
use pipecov_storage::{ActivityStore, StoreError};

use crate::error::ReconcileError;
use crate::retry::{BackoffPolicy, apply_with_backoff};

/// Reconciles one activity snapshot against the shared store.
///
/// Instances are cheap to share: reconciliations for different activities
/// run concurrently with no coordination beyond the store's version token.
pub struct Reconciler {
    store: Arc<dyn ActivityStore>,
    fetcher: ReportFetcher,
    policy: BackoffPolicy,
}

impl Reconciler {
    pub fn new(store: Arc<dyn ActivityStore>, fetcher: ReportFetcher) -> Self {
        Self {
            store,
            fetcher,
            policy: BackoffPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: BackoffPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Processes one delivered activity snapshot.
    ///
    /// Never fails the caller: every per-URL error is logged and the next
    /// URL processed, so one broken report cannot block the rest.
    pub async fn reconcile(&self, activity: &Activity) {
        debug!(activity = %activity.key(), "processing activity");
        for attachment in &activity.attachments {
            if attachment.name != COVERAGE_ATTACHMENT {
                continue;
            }
            for url in &attachment.urls {
                self.process_url(activity, url).await;
            }
        }
    }

    async fn process_url(&self, activity: &Activity, url: &str) {
        if already_processed(activity, url) {
            debug!(activity = %activity.key(), url, "report already recorded, skipping");
            return;
        }

        let request_url = versioned_url(url);
        let raw = match self.fetcher.fetch(&request_url).await {
            Ok(raw) => raw,
            Err(err) => {
                error!(activity = %activity.key(), url, %err, "unable to retrieve report");
                return;
            }
        };
        let report = match Report::parse(&raw) {
            Ok(report) => report,
            Err(err) => {
                error!(activity = %activity.key(), url, %err, "unable to parse report");
                return;
            }
        };

        let fact = Fact::coverage(&request_url, report.measurements());
        match self
            .merge_fact(&activity.namespace, &activity.name, fact)
            .await
        {
            Ok(updated) => {
                info!(activity = %updated.key(), url, "recorded coverage fact");
            }
            Err(err) => {
                error!(activity = %activity.key(), url, %err, "error updating activity");
            }
        }
    }

    /// Merges a coverage fact into the activity under the backoff policy.
    ///
    /// Each attempt re-reads the activity so concurrent writers lose at
    /// most the race, never their data: a stale token fails the write and
    /// the whole read-mutate-write sequence runs again.
    pub async fn merge_fact(
        &self,
        namespace: &str,
        name: &str,
        fact: Fact,
    ) -> Result<Activity, ReconcileError> {
        apply_with_backoff(&self.policy, || {
            let fact = fact.clone();
            async move { self.attempt_merge(namespace, name, fact).await }
        })
        .await
    }

    async fn attempt_merge(
        &self,
        namespace: &str,
        name: &str,
        fact: Fact,
    ) -> Result<Activity, ReconcileError> {
        let mut current = self
            .store
            .get(namespace, name)
            .await?
            .ok_or_else(|| StoreError::not_found(namespace, name))?;

        let indices = current.coverage_fact_indices();
        match indices.as_slice() {
            [] => current.facts.push(fact),
            [index] => current.facts[*index] = fact,
            _ => {
                return Err(ReconcileError::DuplicateFacts {
                    activity: current.key(),
                    count: indices.len(),
                });
            }
        }

        Ok(self.store.update(current).await?)
    }
}

/// Idempotence check against the delivered snapshot.
///
/// The fact records the versioned request URL, so the comparison strips
/// the cache-busting parameter and matches on the attachment URL itself;
/// a resync redelivering an unchanged activity is a no-op.
fn already_processed(activity: &Activity, url: &str) -> bool {
    activity
        .facts
        .iter()
        .any(|fact| fact.is_coverage_fact() && base_url(&fact.original.url) == url)
}
