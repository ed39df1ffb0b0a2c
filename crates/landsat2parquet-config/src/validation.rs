// Configuration validation
//
// Validates that required fields are present and values are sensible

use crate::*;
use anyhow::{bail, Result};
use tracing::warn;

pub fn validate_config(config: &RuntimeConfig) -> Result<()> {
    validate_metadata_config(&config.metadata)?;
    validate_grids_config(&config.grids)?;
    validate_storage_config(&config.storage)?;
    Ok(())
}

fn validate_metadata_config(config: &MetadataConfig) -> Result<()> {
    if config.url.is_empty() {
        bail!("metadata.url must not be empty");
    }

    if config.chunk_rows == 0 {
        bail!("metadata.chunk_rows must be greater than 0");
    }

    // Warn about chunk sizes that defeat the memory bound
    if config.chunk_rows > 10_000_000 {
        warn!(
            chunk_rows = config.chunk_rows,
            "metadata.chunk_rows is very large; may cause memory issues"
        );
    }

    Ok(())
}

fn validate_grids_config(config: &GridsConfig) -> Result<()> {
    if config.sources.is_empty() {
        bail!("grids.sources must list at least one archive");
    }

    for source in &config.sources {
        if source.url.is_empty() {
            bail!("grids.sources entries require a url");
        }
        if source.file.is_empty() {
            bail!("grids.sources entries require a file name");
        }
        if source.file.contains(['/', '\\']) {
            bail!(
                "grids.sources file '{}' must be a bare file name",
                source.file
            );
        }
    }

    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<()> {
    if config.data_dir.is_empty() {
        bail!("storage.data_dir must not be empty");
    }

    Ok(())
}
