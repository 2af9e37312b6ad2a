//! Subscription payloads.

use pipecov_core::Activity;

/// Payload delivered by the change subscription.
///
/// The subscription transport is untyped at its outer edge; collapsing the
/// payload into this sum type turns the "is this actually an activity?"
/// runtime check into a variant match. Unknown kinds are logged and
/// ignored by consumers, never fatal.
#[derive(Debug, Clone)]
pub enum WatchEvent {
    /// An activity was created or updated; carries the full snapshot.
    Applied(Activity),
    /// The transport delivered something other than an activity.
    Unknown(String),
}

impl WatchEvent {
    /// Store key of the affected resource, used for per-resource routing.
    pub fn key(&self) -> Option<String> {
        match self {
            Self::Applied(activity) => Some(activity.key()),
            Self::Unknown(_) => None,
        }
    }
}
