use std::path::Path;

use anyhow::Context;
use chrono::Local;
use curtail_agg::{run_update, UpdateConfig};
use curtail_core::Period;
use curtail_io::{CompanyMap, SourceKind, SourceSpec};
use tracing::{info, warn};

#[allow(clippy::too_many_arguments)]
pub fn handle(
    source: &str,
    data_dir: &Path,
    start: &str,
    refresh_last: usize,
    offline: bool,
    company_map: Option<&Path>,
    audit: bool,
) -> anyhow::Result<()> {
    let kind: SourceKind = source.parse()?;
    let spec = SourceSpec::get(kind);
    let fallback_start: Period = start.parse()?;
    let current = Period::from_date(Local::now().date_naive());

    let company_map = match company_map {
        Some(path) => {
            let map = CompanyMap::load(path).context("loading company map")?;
            if map.is_empty() {
                warn!(
                    "company map '{}' resolved to an empty mapping; entity ids pass through unchanged",
                    path.display()
                );
            }
            Some(map)
        }
        None => None,
    };

    info!(
        "updating {} history in '{}' (current period {current})",
        kind,
        data_dir.display()
    );

    let summary = run_update(&UpdateConfig {
        spec,
        data_dir: data_dir.to_path_buf(),
        fallback_start,
        refresh_last,
        current,
        offline,
        company_map,
        write_audit: audit,
    })?;

    println!(
        "{}: {} period(s) recomputed, {} skipped, {} row(s) written to {}",
        kind,
        summary.processed.len(),
        summary.skipped.len(),
        summary.rows_persisted,
        summary.history_path.display()
    );
    Ok(())
}
