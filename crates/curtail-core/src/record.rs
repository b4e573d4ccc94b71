//! Row types flowing through the pipeline.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::period::Period;
use crate::units::{Hours, MegawattHours, Megawatts};

/// One raw telemetry row after column-alias resolution, before any parsing.
///
/// Every field is the untouched cell text; `None` means the source file has
/// no column for that logical field at all. The normalizer decides what is
/// parseable and what gets dropped.
#[derive(Debug, Clone, Default)]
pub struct RawSample {
    pub timestamp: Option<String>,
    pub entity: Option<String>,
    pub restriction: Option<String>,
    pub generation: Option<String>,
    pub reference: Option<String>,
    pub availability: Option<String>,
    pub limited: Option<String>,
}

/// One normalized telemetry sample, ready for the curtailment calculator.
///
/// Ephemeral; produced and consumed within one aggregation run.
#[derive(Debug, Clone)]
pub struct IntervalRecord {
    pub timestamp: NaiveDateTime,
    pub entity: String,
    /// Upstream restriction reason, uppercased. `None` for sources without
    /// restriction codes.
    pub restriction_code: Option<String>,
    pub generation: Megawatts,
    pub reference: Megawatts,
    pub availability: Option<Megawatts>,
    /// Explicit limited-generation value; presence marks the interval as
    /// restricted for sources without restriction codes.
    pub limited: Option<Megawatts>,
    /// Estimated or configured interval length.
    pub duration: Hours,
}

/// One persisted output row: monthly totals for a grouping key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyAggregate {
    pub period: Period,
    pub entity: String,
    pub restriction_code: Option<String>,
    pub curtailed_mwh: f64,
    pub generated_mwh: f64,
    /// `curtailed / generated`, absent whenever `generated <= 0`.
    pub ratio: Option<f64>,
    /// Latest timestamp seen in the group, `YYYY-MM-DD HH:MM:SS`.
    pub last_timestamp: Option<String>,
}

impl MonthlyAggregate {
    /// Sort key for the persisted history: period, then entity, then
    /// restriction code.
    pub fn sort_key(&self) -> (Period, &str, Option<&str>) {
        (self.period, &self.entity, self.restriction_code.as_deref())
    }
}

/// Division-safe curtailment ratio.
///
/// Returns `None` whenever generated energy is not strictly positive; a zero
/// denominator must never become a computed zero or a fault.
pub fn safe_ratio(curtailed: MegawattHours, generated: MegawattHours) -> Option<f64> {
    if generated.value() > 0.0 {
        Some(curtailed / generated)
    } else {
        None
    }
}
