//! Report retrieval over HTTP.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use tracing::debug;
use url::Url;

use crate::error::ReportError;

/// Default per-request timeout.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Query parameter appended to every request to defeat intermediate caches.
pub const VERSION_PARAM: &str = "version";

/// HTTP fetcher for externally stored coverage reports.
///
/// The same attachment URL is requested repeatedly over the lifetime of an
/// activity, so every request URL carries a fresh `?version=<unix-millis>`
/// parameter; reports may sit behind aggressively caching object storage.
#[derive(Debug, Clone)]
pub struct ReportFetcher {
    client: reqwest::Client,
}

impl ReportFetcher {
    /// Creates a fetcher with the default 30 second timeout.
    pub fn new() -> Result<Self, ReportError> {
        Self::with_timeout(FETCH_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, ReportError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Fetches raw report bytes from an already-versioned URL.
    ///
    /// Non-2xx statuses are classified as errors; the caller treats every
    /// failure here as non-fatal for the enclosing reconciliation.
    pub async fn fetch(&self, url: &str) -> Result<Bytes, ReportError> {
        debug!(url, "fetching report");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ReportError::Status {
                status,
                url: url.to_string(),
            });
        }
        Ok(response.bytes().await?)
    }
}

/// Appends the cache-busting `version` parameter to an attachment URL.
pub fn versioned_url(url: &str) -> String {
    versioned_url_at(url, unix_millis())
}

fn versioned_url_at(url: &str, millis: u128) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{VERSION_PARAM}={millis}")
}

/// Strips the `version` parameter again, recovering the attachment URL a
/// versioned request URL was built from. Unparseable URLs pass through
/// unchanged.
pub fn base_url(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };
    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| k != VERSION_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        let query: Vec<String> = kept.iter().map(|(k, v)| format!("{k}={v}")).collect();
        parsed.set_query(Some(&query.join("&")));
    }
    parsed.to_string()
}

fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}
