use serde::{Deserialize, Serialize};

use crate::activity::Measurement;

/// Unit discriminator recorded on every coverage measurement.
pub const MEASUREMENT_PERCENT: &str = "percent";

/// The coverage dimensions a JaCoCo counter can track.
///
/// Counter types outside the fixed six are kept as [`CounterKind::Unknown`]
/// and projected with an empty display label rather than dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CounterKind {
    Instruction,
    Line,
    Method,
    Complexity,
    Branch,
    Class,
    #[serde(other)]
    Unknown,
}

impl CounterKind {
    /// Display label used as the measurement-name prefix.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Instruction => "Instructions",
            Self::Line => "Lines",
            Self::Method => "Methods",
            Self::Complexity => "Complexity",
            Self::Branch => "Branches",
            Self::Class => "Classes",
            Self::Unknown => "",
        }
    }
}

/// The three observations derived from every counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasurementAspect {
    Coverage,
    Missed,
    Total,
}

impl std::fmt::Display for MeasurementAspect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Coverage => write!(f, "Coverage"),
            Self::Missed => write!(f, "Missed"),
            Self::Total => write!(f, "Total"),
        }
    }
}

/// Projects one counter into its covered, missed, and total measurements.
///
/// Total is always the arithmetic sum and is never independently stored.
pub fn project_counter(kind: &CounterKind, missed: u64, covered: u64) -> [Measurement; 3] {
    [
        Measurement::new(kind, MeasurementAspect::Coverage, covered as i64),
        Measurement::new(kind, MeasurementAspect::Missed, missed as i64),
        Measurement::new(kind, MeasurementAspect::Total, (covered + missed) as i64),
    ]
}
