//! Incremental merge of freshly computed months into persisted history.
//!
//! Two independent knobs drive the recompute set:
//!
//! - the resume floor: recomputation starts at the most recent persisted
//!   period (or a configured fallback when the store is empty);
//! - the refresh window: the most recent N periods are always recomputed,
//!   even when already persisted, because the upstream source revises recent
//!   months after publication.
//!
//! The merge itself is replace-not-append: every persisted row of a
//! recomputed period is discarded in favor of the fresh rows, and periods
//! outside the recompute set are never touched. Applying the same fresh set
//! twice is a no-op the second time.

use std::collections::BTreeSet;

use curtail_core::{MonthlyAggregate, Period};

/// Periods to recompute for one update run.
///
/// Union of `resume ..= current` (falling back to `fallback_start` when the
/// store is empty) and the trailing `refresh_last` periods ending at
/// `current`. The trailing window never reaches below `fallback_start`.
pub fn recompute_window(
    resume: Option<Period>,
    fallback_start: Period,
    current: Period,
    refresh_last: usize,
) -> Vec<Period> {
    let start = resume.unwrap_or(fallback_start);
    let mut window: BTreeSet<Period> = start.through(current).into_iter().collect();

    let mut period = current;
    for _ in 0..refresh_last {
        if period < fallback_start {
            break;
        }
        window.insert(period);
        period = period.pred();
    }

    window.into_iter().collect()
}

/// Replace recomputed periods in the history with fresh rows.
///
/// Rows of any period present in `fresh` are dropped from `history` before
/// the fresh rows are appended; everything else is untouched. The result is
/// sorted by (period, entity, restriction code).
pub fn merge_history(
    history: Vec<MonthlyAggregate>,
    fresh: Vec<MonthlyAggregate>,
) -> Vec<MonthlyAggregate> {
    let replaced: BTreeSet<Period> = fresh.iter().map(|row| row.period).collect();
    let mut merged: Vec<MonthlyAggregate> = history
        .into_iter()
        .filter(|row| !replaced.contains(&row.period))
        .collect();
    merged.extend(fresh);
    merged.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    merged
}
