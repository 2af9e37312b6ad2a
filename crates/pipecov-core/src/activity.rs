use serde::{Deserialize, Serialize};

use crate::coverage::{CounterKind, MEASUREMENT_PERCENT, MeasurementAspect};
use crate::{FACT_TYPE_COVERAGE, PRODUCER_TAG};

/// A pipeline-run record held in the shared resource store.
///
/// Activities are never owned by the reconciler: every mutation goes
/// through a fresh read-modify-write cycle, with `resource_version` acting
/// as the optimistic-concurrency token checked by the store on update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub name: String,
    pub namespace: String,
    #[serde(rename = "resourceVersion", skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub attachments: Vec<Attachment>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub facts: Vec<Fact>,
}

impl Activity {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            resource_version: None,
            attachments: Vec::new(),
            facts: Vec::new(),
        }
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn with_fact(mut self, fact: Fact) -> Self {
        self.facts.push(fact);
        self
    }

    /// Store key in `namespace/name` form, used for logging and routing.
    pub fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }

    /// Indices of coverage facts produced by this subsystem.
    pub fn coverage_fact_indices(&self) -> Vec<usize> {
        self.facts
            .iter()
            .enumerate()
            .filter(|(_, f)| f.is_coverage_fact())
            .map(|(i, _)| i)
            .collect()
    }
}

/// A named, URL-bearing reference to an externally stored artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    #[serde(default)]
    pub urls: Vec<String>,
}

impl Attachment {
    pub fn new(name: impl Into<String>, urls: Vec<String>) -> Self {
        Self {
            name: name.into(),
            urls,
        }
    }
}

/// Provenance of the source report a fact was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Original {
    pub url: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Vec<String>,
}

/// The persisted coverage summary attached to an Activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    #[serde(rename = "factType")]
    pub fact_type: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Vec<String>,
    pub original: Original,
    #[serde(default)]
    pub measurements: Vec<Measurement>,
}

impl Fact {
    /// Builds a coverage fact for a report fetched from `url`.
    ///
    /// The URL recorded here is the versioned request URL actually fetched,
    /// including the cache-busting query parameter.
    pub fn coverage(url: impl Into<String>, measurements: Vec<Measurement>) -> Self {
        Self {
            fact_type: FACT_TYPE_COVERAGE.to_string(),
            tags: vec![PRODUCER_TAG.to_string()],
            original: Original {
                url: url.into(),
                mime_type: "application/xml".to_string(),
                tags: vec!["jacoco.xml".to_string()],
            },
            measurements,
        }
    }

    /// True for coverage facts carrying this subsystem's producer tag.
    pub fn is_coverage_fact(&self) -> bool {
        self.fact_type == FACT_TYPE_COVERAGE && self.tags.iter().any(|t| t == PRODUCER_TAG)
    }
}

/// One named numeric observation derived from a counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measurement {
    pub name: String,
    #[serde(rename = "measurementType")]
    pub measurement_type: String,
    #[serde(rename = "measurementValue")]
    pub value: i64,
}

impl Measurement {
    pub fn new(kind: &CounterKind, aspect: MeasurementAspect, value: i64) -> Self {
        Self {
            name: format!("{}-{}", kind.label(), aspect),
            measurement_type: MEASUREMENT_PERCENT.to_string(),
            value,
        }
    }
}
