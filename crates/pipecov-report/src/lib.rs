//! Report retrieval and normalization.
//!
//! A coverage report lives at an attachment URL in object storage or a
//! repository. [`ReportFetcher`] pulls the raw bytes (with a cache-busting
//! `version` parameter per request) and [`Report`] turns them into the
//! typed counter model and its flat measurement projection.

pub mod error;
pub mod fetch;
pub mod model;

pub use error::ReportError;
pub use fetch::{FETCH_TIMEOUT, ReportFetcher, base_url, versioned_url};
pub use model::{Counter, Report};
