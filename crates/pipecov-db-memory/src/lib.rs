//! In-memory versioned activity store.
//!
//! Stands in for the cluster resource store in tests and the default
//! server wiring. Reads are lock-free via `papaya`; writes are serialized
//! so the resource-version check and the insert happen atomically, which
//! is the contract the reconciler's optimistic retry loop depends on.

mod storage;

pub use storage::InMemoryActivityStore;
