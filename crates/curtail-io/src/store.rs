//! Persisted monthly history.
//!
//! The history is a plain CSV, one row per (period, entity[, restriction
//! code]), sorted by period then key. The store is an explicit handle with a
//! load / merge / persist lifecycle: callers pass it around, nothing in the
//! core reaches for a fixed path.
//!
//! Loading tolerates a missing file and a malformed file without a `period`
//! column; both yield an empty baseline so the pipeline can rebuild from its
//! fallback start period. Persisting goes through a staged sibling file that
//! is renamed into place, so an interrupted run never leaves a half-written
//! history behind.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use curtail_core::{CurtailResult, MonthlyAggregate, Period};
use tracing::warn;

/// In-memory image of the persisted monthly history.
#[derive(Debug, Default)]
pub struct HistoryStore {
    rows: Vec<MonthlyAggregate>,
}

impl HistoryStore {
    pub fn from_rows(rows: Vec<MonthlyAggregate>) -> Self {
        HistoryStore { rows }
    }

    pub fn rows(&self) -> &[MonthlyAggregate] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<MonthlyAggregate> {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Most recent period present, the resume point for incremental updates.
    pub fn max_period(&self) -> Option<Period> {
        self.rows.iter().map(|row| row.period).max()
    }

    /// Load the history from disk.
    ///
    /// Missing file or missing `period` column are recoverable: both return
    /// an empty store. Individual unparseable rows are skipped.
    pub fn load(path: &Path) -> CurtailResult<Self> {
        if !path.exists() {
            return Ok(HistoryStore::default());
        }
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("opening history '{}'", path.display()))
            .map_err(curtail_core::CurtailError::from)?;
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_lowercase())
            .collect();

        let col = |name: &str| headers.iter().position(|h| h == name);
        let Some(period_col) = col("period") else {
            warn!(
                "history '{}' has no period column; treating as empty baseline",
                path.display()
            );
            return Ok(HistoryStore::default());
        };
        let entity_col = col("entity");
        let restriction_col = col("restriction_code");
        let curtailed_col = col("curtailed_mwh");
        let generated_col = col("generated_mwh");
        let ratio_col = col("ratio");
        let last_ts_col = col("last_timestamp");

        let mut rows = Vec::new();
        let mut skipped = 0usize;
        for record in reader.records() {
            let Ok(record) = record else {
                skipped += 1;
                continue;
            };
            let text = |idx: Option<usize>| -> Option<String> {
                idx.and_then(|i| record.get(i))
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            };
            let number = |idx: Option<usize>| -> Option<f64> {
                text(idx).and_then(|s| s.parse::<f64>().ok())
            };
            let Some(period) = record
                .get(period_col)
                .and_then(|s| s.parse::<Period>().ok())
            else {
                skipped += 1;
                continue;
            };
            rows.push(MonthlyAggregate {
                period,
                entity: text(entity_col).unwrap_or_default(),
                restriction_code: text(restriction_col),
                curtailed_mwh: number(curtailed_col).unwrap_or(0.0),
                generated_mwh: number(generated_col).unwrap_or(0.0),
                ratio: number(ratio_col),
                last_timestamp: text(last_ts_col),
            });
        }
        if skipped > 0 {
            warn!(
                "skipped {} unparseable history row(s) in '{}'",
                skipped,
                path.display()
            );
        }
        Ok(HistoryStore { rows })
    }

    /// Persist the history, sorted by (period, entity, restriction code).
    ///
    /// Writes to a staged sibling file and renames it into place.
    pub fn persist(&mut self, path: &Path) -> CurtailResult<()> {
        self.rows
            .sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating '{}'", parent.display()))
                    .map_err(curtail_core::CurtailError::from)?;
            }
        }
        let staged = staged_path(path);
        {
            let mut writer = csv::Writer::from_path(&staged)
                .with_context(|| format!("creating staged history '{}'", staged.display()))
                .map_err(curtail_core::CurtailError::from)?;
            for row in &self.rows {
                writer.serialize(row)?;
            }
            writer.flush().map_err(curtail_core::CurtailError::Io)?;
        }
        fs::rename(&staged, path)
            .with_context(|| {
                format!(
                    "moving staged history '{}' to '{}'",
                    staged.display(),
                    path.display()
                )
            })
            .map_err(curtail_core::CurtailError::from)?;
        Ok(())
    }
}

fn staged_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "history.csv".to_string());
    name.push_str(".staged");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn row(period: &str, entity: &str, curtailed: f64, generated: f64) -> MonthlyAggregate {
        MonthlyAggregate {
            period: period.parse().unwrap(),
            entity: entity.to_string(),
            restriction_code: Some("CNF".to_string()),
            curtailed_mwh: curtailed,
            generated_mwh: generated,
            ratio: curtail_core::safe_ratio(
                curtail_core::MegawattHours(curtailed),
                curtail_core::MegawattHours(generated),
            ),
            last_timestamp: Some("2025-01-31 23:30:00".to_string()),
        }
    }

    #[test]
    fn missing_file_is_an_empty_baseline() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::load(&dir.path().join("nope.csv")).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.max_period(), None);
    }

    #[test]
    fn missing_period_column_is_an_empty_baseline() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.csv");
        fs::write(&path, "entity,curtailed_mwh\nPARQUE A,10.0\n").unwrap();
        let store = HistoryStore::load(&path).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn persist_then_load_round_trips_sorted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.csv");
        let mut store = HistoryStore::from_rows(vec![
            row("2025-02", "B", 3.0, 30.0),
            row("2025-01", "A", 1.0, 10.0),
        ]);
        store.persist(&path).unwrap();

        let loaded = HistoryStore::load(&path).unwrap();
        assert_eq!(loaded.rows().len(), 2);
        assert_eq!(loaded.rows()[0].period.to_string(), "2025-01");
        assert_eq!(loaded.rows()[1].period.to_string(), "2025-02");
        assert_eq!(loaded.rows()[0].ratio, Some(0.1));
        assert_eq!(loaded.max_period().unwrap().to_string(), "2025-02");
        assert!(!path.with_file_name("history.csv.staged").exists());
    }

    #[test]
    fn null_ratio_survives_the_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.csv");
        let mut store = HistoryStore::from_rows(vec![row("2025-01", "A", 5.0, 0.0)]);
        store.persist(&path).unwrap();
        let loaded = HistoryStore::load(&path).unwrap();
        assert_eq!(loaded.rows()[0].ratio, None);
    }
}
