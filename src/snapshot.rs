// Daily snapshot freshness bookkeeping.
//
// The scenes directory carries at most one dated marker file; its presence
// means the index has already been refreshed today. The marker is written
// only after a successful split, so a run that dies downloading or splitting
// never stops the next one from retrying.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use landsat2parquet_core::split_scenes;
use tracing::{debug, info};

use crate::fetch::Fetcher;

/// File name of the compressed index inside the scenes directory.
const INDEX_FILE: &str = "l_index.csv.gz";

/// Prefix of the dated freshness marker.
const MARKER_PREFIX: &str = "scenes_";

const DATE_FMT: &str = "%Y%m%d";

/// Keeps the per-spacecraft partitions in `scenes_dir` at most one day old.
pub struct SnapshotManager {
    scenes_dir: PathBuf,
    url: String,
    chunk_rows: usize,
}

impl SnapshotManager {
    pub fn new(scenes_dir: impl Into<PathBuf>, url: impl Into<String>, chunk_rows: usize) -> Self {
        Self {
            scenes_dir: scenes_dir.into(),
            url: url.into(),
            chunk_rows,
        }
    }

    /// Today's marker path; one refresh per calendar day at most.
    pub fn marker_path(&self) -> PathBuf {
        self.scenes_dir
            .join(format!("{MARKER_PREFIX}{}", Utc::now().format(DATE_FMT)))
    }

    /// Where the compressed index lands between download and split.
    pub fn index_path(&self) -> PathBuf {
        self.scenes_dir.join(INDEX_FILE)
    }

    /// Refresh the snapshot unless today's marker says it is already done.
    ///
    /// Stale markers and leftover compressed sources are removed either way.
    pub async fn refresh(&self, fetcher: &impl Fetcher) -> Result<()> {
        fs::create_dir_all(&self.scenes_dir).with_context(|| {
            format!(
                "failed to create scenes directory {}",
                self.scenes_dir.display()
            )
        })?;

        let marker = self.marker_path();
        self.remove_stale(&marker)?;
        if marker.exists() {
            info!("scene metadata is fresh, skipping download");
            return Ok(());
        }

        let index = self.index_path();
        fetcher
            .fetch(&self.url, &index)
            .await
            .with_context(|| format!("failed to download {}", self.url))?;

        split_scenes(&index, &self.scenes_dir, self.chunk_rows)
            .context("failed to split scene metadata")?;

        // the compressed source is only needed for the split; the marker
        // records the completed refresh
        remove_if_exists(&index).context("failed to remove compressed index")?;
        fs::write(&marker, "")
            .with_context(|| format!("failed to write marker {}", marker.display()))?;
        info!(marker = %marker.display(), "snapshot refreshed");
        Ok(())
    }

    /// Delete prior-day markers and leftover compressed sources.
    fn remove_stale(&self, today: &Path) -> Result<()> {
        for entry in fs::read_dir(&self.scenes_dir)? {
            let entry = entry?;
            let path = entry.path();
            let name = entry.file_name();
            let name = name.to_string_lossy();

            let stale_marker = name.starts_with(MARKER_PREFIX) && path != today;
            let stale_source = name == INDEX_FILE;
            if stale_marker || stale_source {
                debug!(file = %path.display(), "removing stale cache file");
                remove_if_exists(&path)?;
            }
        }
        Ok(())
    }
}

/// Absence is success for cleanup deletes.
pub(crate) fn remove_if_exists(path: &Path) -> std::io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}
