//! Errors raised while retrieving or normalizing a report.
//!
//! All of these are non-fatal for the enclosing reconciliation: the caller
//! logs them, skips the offending URL, and moves on.

/// Errors that can occur while fetching or parsing a coverage report.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Network-level failure or timeout while fetching the report.
    #[error("report request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The report endpoint answered with a non-2xx status.
    #[error("unexpected status {status} fetching {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    /// The fetched document is not valid UTF-8.
    #[error("report is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    /// The fetched document does not deserialize as a JaCoCo report.
    #[error("malformed report document: {0}")]
    Parse(#[from] quick_xml::DeError),
}
