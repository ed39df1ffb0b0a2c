// WRS descending reference grids.
//
// The grids are install-once: each expected file either exists or its
// archive is fetched and unpacked. The transient archive never survives an
// attempt, successful or not.

use std::fs::{self, File};
use std::path::Path;

use anyhow::{Context, Result};
use landsat2parquet_config::GridSource;
use tracing::{debug, info};
use zip::ZipArchive;

use crate::fetch::{FetchError, Fetcher};
use crate::snapshot::remove_if_exists;

/// Transient archive name inside the wrs directory.
const ARCHIVE_FILE: &str = "wrs.zip";

/// Ensure every expected reference-grid file exists in `wrs_dir`.
pub async fn ensure_reference_grids(
    wrs_dir: &Path,
    sources: &[GridSource],
    fetcher: &impl Fetcher,
) -> Result<()> {
    fs::create_dir_all(wrs_dir)
        .with_context(|| format!("failed to create wrs directory {}", wrs_dir.display()))?;

    let archive_path = wrs_dir.join(ARCHIVE_FILE);
    for source in sources {
        let expected = wrs_dir.join(&source.file);
        if expected.exists() {
            debug!(file = %expected.display(), "reference grid already present");
            continue;
        }

        fetcher
            .fetch(&source.url, &archive_path)
            .await
            .with_context(|| format!("failed to download {}", source.url))?;

        let extracted = extract_zip(&archive_path, wrs_dir);
        remove_if_exists(&archive_path).context("failed to remove transient archive")?;
        extracted.with_context(|| format!("failed to extract {}", source.url))?;
        info!(file = %expected.display(), "reference grid installed");
    }

    Ok(())
}

fn extract_zip(archive_path: &Path, dest: &Path) -> Result<(), FetchError> {
    // TODO: USGS has served KML in place of these zips before; if that comes
    // back, convert the placemarks into the grid files instead of erroring.
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file).map_err(|source| FetchError::Archive {
        path: archive_path.to_path_buf(),
        source,
    })?;
    archive.extract(dest).map_err(|source| FetchError::Archive {
        path: archive_path.to_path_buf(),
        source,
    })?;
    Ok(())
}
