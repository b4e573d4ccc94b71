use std::path::{Path, PathBuf};

use anyhow::Context;
use curtail_check::{compare, load_monthly_totals};
use curtail_io::{SourceKind, SourceSpec};
use tracing::info;

pub fn handle(
    source: &str,
    data_dir: &Path,
    baseline: Option<&Path>,
    candidate: Option<&Path>,
    tolerance: f64,
) -> anyhow::Result<()> {
    let kind: SourceKind = source.parse()?;
    let spec = SourceSpec::get(kind);

    let baseline_path = baseline
        .map(Path::to_path_buf)
        .unwrap_or_else(|| data_dir.join(spec.monthly_file));
    let candidate_path = candidate
        .map(Path::to_path_buf)
        .unwrap_or_else(|| test_sibling(&baseline_path));

    info!(
        "comparing '{}' against '{}'",
        baseline_path.display(),
        candidate_path.display()
    );

    let baseline = load_monthly_totals(&baseline_path)
        .with_context(|| format!("loading baseline '{}'", baseline_path.display()))?;
    let candidate = load_monthly_totals(&candidate_path)
        .with_context(|| format!("loading candidate '{}'", candidate_path.display()))?;

    let label = kind.to_string().to_uppercase();
    let diff = compare(&label, &baseline, &candidate, tolerance);

    println!("verdict={}", diff.verdict);
    println!("summary={}", diff.summary);
    println!("changed_months={}", diff.changed_list());
    Ok(())
}

/// `<stem>_test.<ext>` next to the baseline; the conventional location for a
/// recomputed candidate snapshot.
fn test_sibling(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("monthly");
    let name = match path.extension().and_then(|s| s.to_str()) {
        Some(ext) => format!("{stem}_test.{ext}"),
        None => format!("{stem}_test"),
    };
    path.with_file_name(name)
}
