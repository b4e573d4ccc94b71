//! Month-keyed download with a local cache.
//!
//! Raw monthly files are fetched sequentially with a bounded timeout and
//! kept under `<cache_dir>/<dataset>/`. A month already in the cache is not
//! re-fetched unless the caller forces a refresh (the upstream source revises
//! recent months after publication). A failed fetch for one month is
//! recoverable: the caller skips the month and the next scheduled run retries.

use std::fs::{self, File};
use std::io::{copy, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use curtail_core::Period;
use tracing::info;

use crate::source::SourceSpec;

const FETCH_TIMEOUT: Duration = Duration::from_secs(120);

/// Fetches and caches one source feed's monthly raw files.
pub struct MonthFetcher {
    spec: &'static SourceSpec,
    cache_dir: PathBuf,
}

impl MonthFetcher {
    pub fn new(spec: &'static SourceSpec, cache_root: &Path) -> Self {
        MonthFetcher {
            spec,
            cache_dir: cache_root.join(spec.dataset),
        }
    }

    /// Local cache path for one month, whether or not it exists yet.
    pub fn cache_path(&self, period: Period) -> PathBuf {
        self.cache_dir.join(self.spec.raw_file_name(period))
    }

    /// Ensure one month's raw file is present locally.
    ///
    /// Returns the cached path. Downloads when the file is absent or when
    /// `force` is set (months inside the refresh window).
    pub fn ensure_month(&self, period: Period, force: bool) -> Result<PathBuf> {
        let target = self.cache_path(period);
        if target.exists() && !force {
            return Ok(target);
        }
        fs::create_dir_all(&self.cache_dir).with_context(|| {
            format!("creating cache directory '{}'", self.cache_dir.display())
        })?;
        let url = self.spec.month_url(period);
        info!("fetching {period} from {url}");
        download_to_path(&url, &target)?;
        Ok(target)
    }

    /// Cached path for one month, `None` when nothing was ever fetched.
    pub fn cached_month(&self, period: Period) -> Option<PathBuf> {
        let target = self.cache_path(period);
        target.exists().then_some(target)
    }
}

/// Perform a simple HTTP GET and stream the response into `dest`.
fn download_to_path(url: &str, dest: &Path) -> Result<()> {
    let response = match ureq::get(url).timeout(FETCH_TIMEOUT).call() {
        Ok(response) => response,
        Err(ureq::Error::Status(code, _)) => {
            bail!("failed to download {url}: HTTP {code}")
        }
        Err(err) => {
            return Err(err).with_context(|| format!("requesting {url}"));
        }
    };
    write_staged(response.into_reader(), dest)
}

/// Stream a reader into `dest` through a staged sibling file.
///
/// The final path only ever holds a complete download: a failure mid-stream
/// removes the staged file and leaves `dest` untouched, so an interrupted
/// fetch is never mistaken for a cached month on the next run.
fn write_staged(mut reader: impl Read, dest: &Path) -> Result<()> {
    let staged = staged_path(dest);
    let written = (|| -> Result<()> {
        let mut file = File::create(&staged)
            .with_context(|| format!("creating download target '{}'", staged.display()))?;
        copy(&mut reader, &mut file)
            .with_context(|| format!("writing raw file to '{}'", staged.display()))?;
        Ok(())
    })();
    if let Err(err) = written {
        let _ = fs::remove_file(&staged);
        return Err(err);
    }
    fs::rename(&staged, dest).with_context(|| {
        format!(
            "moving staged download '{}' to '{}'",
            staged.display(),
            dest.display()
        )
    })?;
    Ok(())
}

fn staged_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "download".to_string());
    name.push_str(".part");
    path.with_file_name(name)
}
