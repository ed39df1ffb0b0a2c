// landsat2parquet - fetch and repartition public Landsat scene metadata
//
// Sequential pipeline: keep a daily snapshot of the scene-metadata index,
// split it into per-spacecraft Parquet partitions, and keep the WRS
// descending reference grids cached locally. One writer, no concurrency;
// everything runs to completion or propagates its error.

use std::path::Path;

use anyhow::{Context, Result};
use landsat2parquet_config::RuntimeConfig;

pub mod fetch;
pub mod grids;
mod init;
pub mod snapshot;

pub use init::init_tracing;

use fetch::Fetcher;
use snapshot::SnapshotManager;

/// Refresh the metadata snapshot, then make sure the reference grids exist.
pub async fn run_update(config: &RuntimeConfig, fetcher: &impl Fetcher) -> Result<()> {
    let snapshot = SnapshotManager::new(
        config.scenes_dir(),
        config.metadata.url.clone(),
        config.metadata.chunk_rows,
    );
    snapshot.refresh(fetcher).await?;
    grids::ensure_reference_grids(&config.wrs_dir(), &config.grids.sources, fetcher).await
}

/// Split an already-downloaded index file into partitions.
pub fn run_split(config: &RuntimeConfig, input: &Path) -> Result<()> {
    let out_dir = config.scenes_dir();
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create scenes directory {}", out_dir.display()))?;
    landsat2parquet_core::split_scenes(input, &out_dir, config.metadata.chunk_rows)
        .with_context(|| format!("failed to split {}", input.display()))?;
    Ok(())
}

/// Fetch the reference grids only.
pub async fn run_grids(config: &RuntimeConfig, fetcher: &impl Fetcher) -> Result<()> {
    grids::ensure_reference_grids(&config.wrs_dir(), &config.grids.sources, fetcher).await
}
