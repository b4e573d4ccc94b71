//! One full `update` run over a source feed.
//!
//! Order matters: the recompute window is derived from the persisted store,
//! raw months are fetched (or taken from cache), every month is read and
//! validated, and only then is anything merged and persisted. A fatal
//! condition (unresolvable required column, no data for any period) aborts
//! before the store is touched, so a partial month is never written.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Context;
use curtail_core::{CurtailError, CurtailResult, IntervalRecord, Period};
use curtail_io::{read_raw_samples, CompanyMap, HistoryStore, MonthFetcher, SourceSpec};
use serde::Serialize;
use tracing::{info, warn};

use crate::merge::{merge_history, recompute_window};
use crate::monthly::{aggregate_monthly, company_view};
use crate::normalize::normalize_samples;

/// Everything one update run needs; callers own all paths and knobs.
pub struct UpdateConfig {
    pub spec: &'static SourceSpec,
    /// Directory holding the monthly history and the `raw/` cache.
    pub data_dir: PathBuf,
    /// Resume floor when the store is empty (and the lower bound of the
    /// refresh window).
    pub fallback_start: Period,
    /// Trailing periods re-fetched and recomputed even when persisted.
    pub refresh_last: usize,
    /// The period "today" falls into; upper bound of the recompute window.
    pub current: Period,
    /// Build from cached raw files only; months without a cached file are
    /// skipped.
    pub offline: bool,
    /// When present, the history is persisted at company level.
    pub company_map: Option<CompanyMap>,
    /// Also write the normalized per-interval rows for inspection.
    pub write_audit: bool,
}

/// What an update run did, for logging and tests.
#[derive(Debug)]
pub struct UpdateSummary {
    pub window: Vec<Period>,
    pub processed: Vec<Period>,
    pub skipped: Vec<Period>,
    pub rows_dropped: usize,
    pub rows_persisted: usize,
    pub history_path: PathBuf,
}

pub fn run_update(config: &UpdateConfig) -> CurtailResult<UpdateSummary> {
    let history_path = config.data_dir.join(config.spec.monthly_file);
    let store = HistoryStore::load(&history_path)?;

    let window = recompute_window(
        store.max_period(),
        config.fallback_start,
        config.current,
        config.refresh_last,
    );
    info!(
        "recompute window for {}: {}",
        config.spec.kind,
        window
            .iter()
            .map(Period::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );

    // The trailing periods of the window are the ones upstream still
    // revises; those are re-fetched even when cached.
    let refresh_start = window.len().saturating_sub(config.refresh_last);
    let forced: BTreeSet<Period> = window[refresh_start..].iter().copied().collect();

    let fetcher = MonthFetcher::new(config.spec, &config.data_dir.join("raw"));
    let mut records: Vec<IntervalRecord> = Vec::new();
    let mut processed = Vec::new();
    let mut skipped = Vec::new();
    let mut rows_dropped = 0usize;

    for &period in &window {
        let raw_path = if config.offline {
            fetcher.cached_month(period)
        } else {
            match fetcher.ensure_month(period, forced.contains(&period)) {
                Ok(path) => Some(path),
                Err(err) => {
                    warn!("skipping {period}: {err:#}");
                    None
                }
            }
        };
        let Some(raw_path) = raw_path else {
            if config.offline {
                warn!("skipping {period}: no cached raw file");
            }
            skipped.push(period);
            continue;
        };

        // MissingColumn here is fatal for the whole run, by policy.
        let samples = read_raw_samples(&raw_path, &config.spec.schema)?;
        let outcome = normalize_samples(&samples, config.spec.fixed_interval_hours);
        rows_dropped += outcome.dropped;
        records.extend(outcome.records);
        processed.push(period);
    }

    if processed.is_empty() {
        return Err(CurtailError::NoData);
    }

    if config.write_audit {
        let audit_path = config
            .data_dir
            .join("raw")
            .join(format!("{}_intervals_audit.csv", config.spec.kind));
        write_audit(&audit_path, &records)?;
        info!("interval audit written to '{}'", audit_path.display());
    }

    let mut fresh = aggregate_monthly(&records, config.spec.variant, &config.spec.restriction);
    if let Some(map) = &config.company_map {
        fresh = company_view(&fresh, |entity| map.resolve(entity).to_string());
    }

    let merged = merge_history(store.into_rows(), fresh);
    let rows_persisted = merged.len();
    let mut store = HistoryStore::from_rows(merged);
    store.persist(&history_path)?;

    info!(
        "updated '{}': {} period(s) recomputed, {} skipped, {} row(s) persisted, {} raw row(s) dropped",
        history_path.display(),
        processed.len(),
        skipped.len(),
        rows_persisted,
        rows_dropped
    );

    Ok(UpdateSummary {
        window,
        processed,
        skipped,
        rows_dropped,
        rows_persisted,
        history_path,
    })
}

#[derive(Serialize)]
struct AuditRow<'a> {
    timestamp: String,
    entity: &'a str,
    restriction_code: Option<&'a str>,
    generation_mw: f64,
    reference_mw: f64,
    availability_mw: Option<f64>,
    limited_mw: Option<f64>,
    duration_h: f64,
}

fn write_audit(path: &Path, records: &[IntervalRecord]) -> CurtailResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating '{}'", parent.display()))
            .map_err(CurtailError::from)?;
    }
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating audit file '{}'", path.display()))
        .map_err(CurtailError::from)?;
    for record in records {
        writer.serialize(AuditRow {
            timestamp: record.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            entity: &record.entity,
            restriction_code: record.restriction_code.as_deref(),
            generation_mw: record.generation.value(),
            reference_mw: record.reference.value(),
            availability_mw: record.availability.map(|v| v.value()),
            limited_mw: record.limited.map(|v| v.value()),
            duration_h: record.duration.value(),
        })?;
    }
    writer.flush().map_err(CurtailError::Io)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use curtail_io::source::WIND;
    use std::fs;
    use tempfile::tempdir;

    const RAW_JAN: &str = "\
din_instante;nom_usina;val_geracao;val_geracaoreferencia;val_disponibilidade;cod_razaorestricao
2025-01-01 00:00:00;PARQUE A;4.0;12.0;10.0;CNF
2025-01-01 00:30:00;PARQUE A;8.0;12.0;10.0;CNF
2025-01-01 00:00:00;PARQUE B;5.0;5.0;5.0;
";

    fn seed_cache(data_dir: &Path, period: &str, content: &str) {
        let period: Period = period.parse().unwrap();
        let cache = data_dir.join("raw").join(WIND.dataset);
        fs::create_dir_all(&cache).unwrap();
        fs::write(cache.join(WIND.raw_file_name(period)), content).unwrap();
    }

    fn config(data_dir: &Path, current: &str) -> UpdateConfig {
        UpdateConfig {
            spec: &WIND,
            data_dir: data_dir.to_path_buf(),
            fallback_start: "2025-01".parse().unwrap(),
            refresh_last: 0,
            current: current.parse().unwrap(),
            offline: true,
            company_map: None,
            write_audit: false,
        }
    }

    #[test]
    fn offline_update_builds_history_from_cache() {
        let dir = tempdir().unwrap();
        seed_cache(dir.path(), "2025-01", RAW_JAN);

        let summary = run_update(&config(dir.path(), "2025-02")).unwrap();
        assert_eq!(summary.processed.len(), 1);
        assert_eq!(summary.skipped.len(), 1); // 2025-02 has no cached file
        assert!(summary.history_path.exists());

        let store = HistoryStore::load(&summary.history_path).unwrap();
        // PARQUE A with CNF, PARQUE B without a code.
        assert_eq!(store.rows().len(), 2);
        let parque_a = store
            .rows()
            .iter()
            .find(|r| r.entity == "PARQUE A")
            .unwrap();
        // Capacity min(10, 12) = 10; curtailed (6 + 2) x 0.5 = 4 MWh.
        assert!((parque_a.curtailed_mwh - 4.0).abs() < 1e-9);
        assert!((parque_a.generated_mwh - 10.0).abs() < 1e-9);
    }

    #[test]
    fn rerunning_the_same_cache_is_a_no_op() {
        let dir = tempdir().unwrap();
        seed_cache(dir.path(), "2025-01", RAW_JAN);

        let first = run_update(&config(dir.path(), "2025-01")).unwrap();
        let after_first = fs::read_to_string(&first.history_path).unwrap();
        let second = run_update(&config(dir.path(), "2025-01")).unwrap();
        let after_second = fs::read_to_string(&second.history_path).unwrap();
        assert_eq!(after_first, after_second);
    }

    #[test]
    fn update_preserves_periods_outside_the_window() {
        let dir = tempdir().unwrap();
        seed_cache(dir.path(), "2025-01", RAW_JAN);
        let summary = run_update(&config(dir.path(), "2025-01")).unwrap();

        // Second run resumes from 2025-01 with new data for it; an older
        // period planted in the history must survive untouched.
        let mut rows = HistoryStore::load(&summary.history_path)
            .unwrap()
            .into_rows();
        rows.push(curtail_core::MonthlyAggregate {
            period: "2024-12".parse().unwrap(),
            entity: "LEGACY".to_string(),
            restriction_code: None,
            curtailed_mwh: 42.0,
            generated_mwh: 84.0,
            ratio: Some(0.5),
            last_timestamp: None,
        });
        HistoryStore::from_rows(rows)
            .persist(&summary.history_path)
            .unwrap();

        let summary = run_update(&config(dir.path(), "2025-01")).unwrap();
        let store = HistoryStore::load(&summary.history_path).unwrap();
        let legacy = store.rows().iter().find(|r| r.entity == "LEGACY").unwrap();
        assert_eq!(legacy.curtailed_mwh, 42.0);
    }

    #[test]
    fn missing_required_column_aborts_without_writing() {
        let dir = tempdir().unwrap();
        seed_cache(
            dir.path(),
            "2025-01",
            "din_instante;nom_usina;val_geracao\n2025-01-01 00:00:00;P;1.0\n",
        );
        let err = run_update(&config(dir.path(), "2025-01")).unwrap_err();
        assert!(matches!(err, CurtailError::MissingColumn { .. }));
        assert!(!dir.path().join(WIND.monthly_file).exists());
    }

    #[test]
    fn no_usable_month_is_fatal() {
        let dir = tempdir().unwrap();
        let err = run_update(&config(dir.path(), "2025-02")).unwrap_err();
        assert!(matches!(err, CurtailError::NoData));
    }

    #[test]
    fn company_map_switches_the_history_to_company_level() {
        let dir = tempdir().unwrap();
        seed_cache(dir.path(), "2025-01", RAW_JAN);
        let mut cfg = config(dir.path(), "2025-01");
        cfg.company_map = Some(CompanyMap::from_pairs([
            ("PARQUE A", "ACME"),
            ("PARQUE B", "ACME"),
        ]));
        let summary = run_update(&cfg).unwrap();
        let store = HistoryStore::load(&summary.history_path).unwrap();
        assert_eq!(store.rows().len(), 1);
        assert_eq!(store.rows()[0].entity, "ACME");
    }
}
