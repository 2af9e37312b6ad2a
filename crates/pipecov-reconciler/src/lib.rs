//! Reconciliation core for PipeCov.
//!
//! Connects the change subscription to the merge-and-update loop: the
//! [`dispatch`] module fans delivered activity snapshots out to workers,
//! each of which drives a [`Reconciler`] through filter → fetch →
//! normalize → merge, with the store update retried under
//! [`retry::apply_with_backoff`].

pub mod dispatch;
pub mod error;
pub mod reconciler;
pub mod retry;

pub use dispatch::{DispatchConfig, DispatcherHandle, RESYNC_INTERVAL, spawn};
pub use error::ReconcileError;
pub use reconciler::Reconciler;
pub use retry::{BackoffPolicy, RetryClass, apply_with_backoff};
