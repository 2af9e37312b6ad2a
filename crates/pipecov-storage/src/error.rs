//! Error types for the activity store abstraction.

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested activity was not found.
    #[error("activity not found: {namespace}/{name}")]
    NotFound {
        /// Namespace the lookup ran in.
        namespace: String,
        /// Name of the missing activity.
        name: String,
    },

    /// The supplied resource-version token is stale: another writer updated
    /// the activity between read and write.
    #[error("version conflict on {namespace}/{name}: supplied {supplied:?}, current {current}")]
    Conflict {
        namespace: String,
        name: String,
        /// Token supplied by the writer, `None` if the activity carried none.
        supplied: Option<String>,
        /// Token the store currently holds.
        current: String,
    },

    /// Attempted to insert an activity that already exists.
    #[error("activity already exists: {namespace}/{name}")]
    AlreadyExists { namespace: String, name: String },

    /// The backend could not serve the request for a reason that is expected
    /// to clear up on retry.
    #[error("store backend error: {message}")]
    Backend {
        /// Description of the backend failure.
        message: String,
    },
}

impl StoreError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Creates a new `Conflict` error.
    #[must_use]
    pub fn conflict(
        namespace: impl Into<String>,
        name: impl Into<String>,
        supplied: Option<String>,
        current: impl Into<String>,
    ) -> Self {
        Self::Conflict {
            namespace: namespace.into(),
            name: name.into(),
            supplied,
            current: current.into(),
        }
    }

    /// Creates a new `AlreadyExists` error.
    #[must_use]
    pub fn already_exists(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::AlreadyExists {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Creates a new `Backend` error.
    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// True when the error signals a lost optimistic-concurrency race.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}
