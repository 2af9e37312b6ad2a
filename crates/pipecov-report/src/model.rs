//! Typed model of the JaCoCo XML report document.
//!
//! The full nested structure is accepted so any well-formed report
//! deserializes, but only the root-level counters feed into measurements.

use serde::Deserialize;

use pipecov_core::{CounterKind, Measurement, project_counter};

use crate::error::ReportError;

/// Top-level `<report>` element.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Report {
    #[serde(rename = "@name", default)]
    pub name: String,
    #[serde(rename = "sessioninfo", default)]
    pub session_info: Vec<SessionInfo>,
    #[serde(rename = "package", default)]
    pub packages: Vec<Package>,
    #[serde(rename = "group", default)]
    pub groups: Vec<Group>,
    #[serde(rename = "counter", default)]
    pub counters: Vec<Counter>,
}

impl Report {
    /// Deserializes raw report bytes.
    pub fn parse(raw: &[u8]) -> Result<Self, ReportError> {
        let text = std::str::from_utf8(raw)?;
        Ok(quick_xml::de::from_str(text)?)
    }

    /// Projects every root counter into its three measurements.
    ///
    /// An empty counter list yields an empty measurement list; that is a
    /// valid report, not an error.
    pub fn measurements(&self) -> Vec<Measurement> {
        self.counters
            .iter()
            .flat_map(|c| project_counter(&c.kind, c.missed, c.covered))
            .collect()
    }
}

/// A raw covered/missed count for one coverage dimension.
#[derive(Debug, Clone, Deserialize)]
pub struct Counter {
    #[serde(rename = "@type")]
    pub kind: CounterKind,
    #[serde(rename = "@missed")]
    pub missed: u64,
    #[serde(rename = "@covered")]
    pub covered: u64,
}

/// Execution session the report was taken from.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionInfo {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@start", default)]
    pub start: u64,
    #[serde(rename = "@dump", default)]
    pub dump: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Group {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "package", default)]
    pub packages: Vec<Package>,
    #[serde(rename = "group", default)]
    pub groups: Vec<Group>,
    #[serde(rename = "counter", default)]
    pub counters: Vec<Counter>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Package {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "class", default)]
    pub classes: Vec<Class>,
    #[serde(rename = "sourcefile", default)]
    pub source_files: Vec<SourceFile>,
    #[serde(rename = "counter", default)]
    pub counters: Vec<Counter>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Class {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@sourcefilename", default)]
    pub source_file_name: String,
    #[serde(rename = "method", default)]
    pub methods: Vec<Method>,
    #[serde(rename = "counter", default)]
    pub counters: Vec<Counter>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Method {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@desc", default)]
    pub desc: String,
    #[serde(rename = "@line", default)]
    pub line: u32,
    #[serde(rename = "counter", default)]
    pub counters: Vec<Counter>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceFile {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "line", default)]
    pub lines: Vec<Line>,
    #[serde(rename = "counter", default)]
    pub counters: Vec<Counter>,
}

/// Per-line instruction/branch counts.
#[derive(Debug, Clone, Deserialize)]
pub struct Line {
    #[serde(rename = "@nr")]
    pub nr: u32,
    #[serde(rename = "@mi", default)]
    pub mi: u32,
    #[serde(rename = "@ci", default)]
    pub ci: u32,
    #[serde(rename = "@mb", default)]
    pub mb: u32,
    #[serde(rename = "@cb", default)]
    pub cb: u32,
}
