//! Domain model for the PipeCov coverage reconciler.
//!
//! An [`Activity`] is the shared pipeline-run record. CI producers attach
//! coverage report URLs to it; the reconciler merges the normalized
//! measurements back in as a single coverage [`Fact`].

pub mod activity;
pub mod coverage;

pub use activity::{Activity, Attachment, Fact, Measurement, Original};
pub use coverage::{CounterKind, MeasurementAspect, project_counter};

/// Attachment name that marks a JaCoCo coverage report.
pub const COVERAGE_ATTACHMENT: &str = "jacoco";

/// Fact type discriminator for coverage facts.
pub const FACT_TYPE_COVERAGE: &str = "jx.coverage";

/// Tag identifying this subsystem as the producer of a fact.
pub const PRODUCER_TAG: &str = "jacoco";
