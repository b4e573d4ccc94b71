//! # curtail-check: Drift Verdict Engine
//!
//! Compares two independently produced monthly snapshots of the same
//! dataset (the published baseline and a freshly recomputed candidate) and
//! classifies the difference:
//!
//! - [`Verdict::NoChange`] — no period differs;
//! - [`Verdict::AutoOk`] — only the most recent shared period differs, and
//!   its curtailed energy moved by less than the tolerance; the recompute
//!   can be trusted without human review;
//! - [`Verdict::Review`] — anything else.
//!
//! Pure comparison, no write side effects.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use anyhow::Context;
use curtail_core::{safe_ratio, CurtailError, CurtailResult, MegawattHours, Period};

/// Relative change (percent) in a period's curtailed energy below which a
/// latest-period-only drift is accepted without review. Heuristic business
/// rule carried over as-is; override per call when policy changes.
pub const DEFAULT_AUTO_OK_TOLERANCE_PCT: f64 = 2.0;

/// Classification of a snapshot comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    NoChange,
    AutoOk,
    Review,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::NoChange => "NO_CHANGE",
            Verdict::AutoOk => "AUTO_OK",
            Verdict::Review => "REVIEW",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One snapshot reduced to a single row per period.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodTotals {
    pub period: Period,
    pub curtailed_mwh: f64,
    pub generated_mwh: f64,
    /// `curtailed / generated`, absent when nothing was generated.
    pub pct: Option<f64>,
}

/// Per-period comparison detail.
#[derive(Debug, Clone)]
pub struct PeriodDelta {
    pub period: Period,
    pub baseline_curtailed_mwh: f64,
    pub candidate_curtailed_mwh: f64,
    /// `(candidate/baseline - 1) x 100`; absent when the baseline is zero.
    pub curtailed_diff_pct: Option<f64>,
    /// Difference of the two pct values in percentage points; absent when
    /// either is null.
    pub pct_diff_pp: Option<f64>,
    pub changed: bool,
}

/// Outcome of one comparison; created fresh per call, never persisted.
#[derive(Debug)]
pub struct DiffVerdict {
    pub verdict: Verdict,
    pub changed_periods: Vec<Period>,
    pub summary: String,
    pub deltas: Vec<PeriodDelta>,
}

impl DiffVerdict {
    /// The `changed_months=` payload: comma-separated periods, empty when
    /// nothing changed.
    pub fn changed_list(&self) -> String {
        self.changed_periods
            .iter()
            .map(Period::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Load a persisted monthly history and reduce it to per-period totals.
///
/// Requires the period and both energy columns (aliases tolerated for
/// snapshots produced by older revisions); a missing required column is
/// fatal. Non-numeric energy cells coerce to zero.
pub fn load_monthly_totals(path: &Path) -> CurtailResult<Vec<PeriodTotals>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening snapshot '{}'", path.display()))
        .map_err(CurtailError::from)?;
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();

    let find = |field: &str, aliases: &[&str]| -> CurtailResult<usize> {
        aliases
            .iter()
            .find_map(|alias| headers.iter().position(|h| h == alias))
            .ok_or_else(|| CurtailError::MissingColumn {
                field: field.to_string(),
                tried: aliases.iter().map(|a| a.to_string()).collect(),
            })
    };
    let period_col = find("period", &["period", "mes"])?;
    let curtailed_col = find("curtailed_mwh", &["curtailed_mwh", "curtailment_mwh"])?;
    let generated_col = find("generated_mwh", &["generated_mwh", "generation_mwh"])?;

    let mut totals: BTreeMap<Period, (f64, f64)> = BTreeMap::new();
    for record in reader.records() {
        let Ok(record) = record else { continue };
        let Some(period) = record
            .get(period_col)
            .and_then(|s| s.parse::<Period>().ok())
        else {
            continue;
        };
        let number = |col: usize| -> f64 {
            record
                .get(col)
                .and_then(|s| s.trim().parse::<f64>().ok())
                .unwrap_or(0.0)
        };
        let entry = totals.entry(period).or_insert((0.0, 0.0));
        entry.0 += number(curtailed_col);
        entry.1 += number(generated_col);
    }

    Ok(totals
        .into_iter()
        .map(|(period, (curtailed, generated))| PeriodTotals {
            period,
            curtailed_mwh: curtailed,
            generated_mwh: generated,
            pct: safe_ratio(MegawattHours(curtailed), MegawattHours(generated)),
        })
        .collect())
}

fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

fn pct_equal(a: Option<f64>, b: Option<f64>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => round_to(a, 6) == round_to(b, 6),
        _ => false,
    }
}

/// Compare two snapshots over their shared period range.
///
/// `label` names the dataset family in the human summary. A period counts as
/// changed when its curtailed energy differs after rounding to 2 decimals or
/// its pct differs after rounding to 6 decimals.
pub fn compare(
    label: &str,
    baseline: &[PeriodTotals],
    candidate: &[PeriodTotals],
    tolerance_pct: f64,
) -> DiffVerdict {
    let baseline_by_period: BTreeMap<Period, &PeriodTotals> =
        baseline.iter().map(|t| (t.period, t)).collect();
    let candidate_by_period: BTreeMap<Period, &PeriodTotals> =
        candidate.iter().map(|t| (t.period, t)).collect();

    let shared: Vec<Period> = baseline_by_period
        .keys()
        .filter(|p| candidate_by_period.contains_key(p))
        .copied()
        .collect();

    let mut deltas = Vec::with_capacity(shared.len());
    for &period in &shared {
        let old = baseline_by_period[&period];
        let new = candidate_by_period[&period];
        let changed = round_to(old.curtailed_mwh, 2) != round_to(new.curtailed_mwh, 2)
            || !pct_equal(old.pct, new.pct);
        let curtailed_diff_pct = if old.curtailed_mwh != 0.0 {
            Some((new.curtailed_mwh / old.curtailed_mwh - 1.0) * 100.0)
        } else {
            None
        };
        let pct_diff_pp = match (old.pct, new.pct) {
            (Some(old_pct), Some(new_pct)) => Some((new_pct - old_pct) * 100.0),
            _ => None,
        };
        deltas.push(PeriodDelta {
            period,
            baseline_curtailed_mwh: old.curtailed_mwh,
            candidate_curtailed_mwh: new.curtailed_mwh,
            curtailed_diff_pct,
            pct_diff_pp,
            changed,
        });
    }

    let changed_periods: Vec<Period> = deltas
        .iter()
        .filter(|d| d.changed)
        .map(|d| d.period)
        .collect();

    if changed_periods.is_empty() {
        return DiffVerdict {
            verdict: Verdict::NoChange,
            changed_periods,
            summary: format!("{label}: no per-period differences."),
            deltas,
        };
    }

    let last_shared = shared.last().copied();
    let only_last = changed_periods.len() == 1 && last_shared == Some(changed_periods[0]);

    let last_delta = last_shared.and_then(|p| deltas.iter().find(|d| d.period == p));
    let within_tolerance = last_delta
        .and_then(|d| d.curtailed_diff_pct)
        .map(|diff| diff.abs() < tolerance_pct)
        .unwrap_or(false);

    let verdict = if only_last && within_tolerance {
        Verdict::AutoOk
    } else {
        Verdict::Review
    };

    let summary = match (only_last, last_delta) {
        (true, Some(delta)) => {
            let cut = delta
                .curtailed_diff_pct
                .map(|d| format!("{d:.2}%"))
                .unwrap_or_else(|| "n/a".to_string());
            let pct = delta
                .pct_diff_pp
                .map(|d| format!("{d:.3} pp"))
                .unwrap_or_else(|| "n/a".to_string());
            format!(
                "{label}: only {} changed. curtailed delta={cut} | pct delta={pct} -> {verdict}",
                delta.period
            )
        }
        _ => format!(
            "{label}: {} period(s) changed: {} -> {verdict}",
            changed_periods.len(),
            changed_periods
                .iter()
                .map(Period::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        ),
    };

    DiffVerdict {
        verdict,
        changed_periods,
        summary,
        deltas,
    }
}
