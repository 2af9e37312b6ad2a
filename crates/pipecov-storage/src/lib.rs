//! Activity store abstraction for the PipeCov coverage reconciler.
//!
//! The reconciler never talks to the cluster directly; it goes through
//! [`ActivityStore`] for versioned read/update access and
//! [`ActivityEvents`] for change notifications.

pub mod error;
pub mod event;
pub mod traits;

pub use error::StoreError;
pub use event::WatchEvent;
pub use traits::{ActivityEvents, ActivityStore};
