//! Raw sample normalization.
//!
//! Turns [`RawSample`]s into typed [`IntervalRecord`]s: timestamps are
//! parsed against the formats the feeds have actually shipped, numeric cells
//! are coerced (decimal comma tolerated), and every row gets an interval
//! duration, either the source's fixed cadence or an estimate from the data.
//!
//! Rows with an unparseable timestamp or no entity are dropped and counted;
//! they are never fatal.

use chrono::{NaiveDate, NaiveDateTime};
use curtail_core::{Hours, IntervalRecord, Megawatts, RawSample};
use std::collections::HashMap;
use tracing::debug;

/// Forward deltas outside this range (hours) are treated as gaps, not
/// cadence.
const MAX_PLAUSIBLE_DELTA_H: f64 = 6.0;

/// Fill-in duration when an entity yields no plausible delta at all.
const DEFAULT_INTERVAL_H: f64 = 0.5;

/// Result of one normalization pass.
#[derive(Debug)]
pub struct NormalizeOutcome {
    pub records: Vec<IntervalRecord>,
    /// Rows dropped for an unparseable timestamp or missing entity.
    pub dropped: usize,
}

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M",
];

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    for format in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(ts);
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

fn parse_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .parse::<f64>()
        .or_else(|_| trimmed.replace(',', ".").parse::<f64>())
        .ok()
        .filter(|v| v.is_finite())
}

/// Normalize raw samples into interval records.
///
/// `fixed_interval_hours` bypasses duration estimation for sources with a
/// known cadence; otherwise the duration is estimated per entity from the
/// median of plausible forward timestamp deltas.
pub fn normalize_samples(
    samples: &[RawSample],
    fixed_interval_hours: Option<f64>,
) -> NormalizeOutcome {
    let mut records = Vec::with_capacity(samples.len());
    let mut dropped = 0usize;

    for sample in samples {
        let Some(timestamp) = sample.timestamp.as_deref().and_then(parse_timestamp) else {
            dropped += 1;
            continue;
        };
        let Some(entity) = sample
            .entity
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
        else {
            dropped += 1;
            continue;
        };

        records.push(IntervalRecord {
            timestamp,
            entity: entity.to_string(),
            restriction_code: sample
                .restriction
                .as_deref()
                .map(|code| code.trim().to_uppercase())
                .filter(|code| !code.is_empty()),
            generation: Megawatts(
                sample
                    .generation
                    .as_deref()
                    .and_then(parse_number)
                    .unwrap_or(0.0),
            ),
            reference: Megawatts(
                sample
                    .reference
                    .as_deref()
                    .and_then(parse_number)
                    .unwrap_or(0.0),
            ),
            availability: sample
                .availability
                .as_deref()
                .and_then(parse_number)
                .map(Megawatts),
            limited: sample
                .limited
                .as_deref()
                .and_then(parse_number)
                .map(Megawatts),
            duration: Hours(0.0),
        });
    }

    match fixed_interval_hours {
        Some(hours) => {
            for record in &mut records {
                record.duration = Hours(hours);
            }
        }
        None => estimate_durations(&mut records),
    }

    if dropped > 0 {
        debug!("dropped {dropped} unparseable raw row(s)");
    }
    NormalizeOutcome { records, dropped }
}

/// Per-entity duration estimation.
///
/// For each entity: sort its rows by timestamp, take forward deltas, accept
/// only deltas in `(0, 6]` hours, and use the median of accepted deltas as
/// the fill value (0.5 h when none is accepted). Rows without a valid
/// forward delta, including each entity's last row, get the fill value.
fn estimate_durations(records: &mut [IntervalRecord]) {
    let mut by_entity: HashMap<String, Vec<usize>> = HashMap::new();
    for (idx, record) in records.iter().enumerate() {
        by_entity.entry(record.entity.clone()).or_default().push(idx);
    }

    for indices in by_entity.values_mut() {
        indices.sort_by_key(|&idx| records[idx].timestamp);

        let mut deltas: Vec<Option<f64>> = Vec::with_capacity(indices.len());
        for pair in indices.windows(2) {
            let gap = records[pair[1]].timestamp - records[pair[0]].timestamp;
            let hours = gap.num_seconds() as f64 / 3600.0;
            if hours > 0.0 && hours <= MAX_PLAUSIBLE_DELTA_H {
                deltas.push(Some(hours));
            } else {
                deltas.push(None);
            }
        }
        // Last row of the entity has no forward delta.
        deltas.push(None);

        let accepted: Vec<f64> = deltas.iter().flatten().copied().collect();
        let fill = median(&accepted).unwrap_or(DEFAULT_INTERVAL_H);

        for (&idx, delta) in indices.iter().zip(&deltas) {
            records[idx].duration = Hours(delta.unwrap_or(fill));
        }
    }
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}
