//! Reconciliation errors and their retry classification.

use pipecov_storage::StoreError;

use crate::retry::RetryClass;

/// Errors surfaced by the merge-and-update step.
///
/// Fetch and parse failures never appear here: they are handled where they
/// occur, logged, and the offending URL skipped.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// The activity already carries more than one coverage fact. That is a
    /// corruption state the reconciler must not repair by guessing which
    /// entry to replace; surfaced to the operator, never retried.
    #[error("{count} coverage facts already attached to activity {activity}")]
    DuplicateFacts { activity: String, count: usize },

    /// A store read or write failed; conflicts and transient backend errors
    /// are retried under the backoff budget.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RetryClass for ReconcileError {
    fn is_permanent(&self) -> bool {
        matches!(self, Self::DuplicateFacts { .. })
    }
}
