// landsat2parquet-config - Unified configuration
//
// Supports configuration from multiple sources:
// 1. Explicit file path (CLI --config flag)
// 2. Config file path from LANDSAT2PARQUET_CONFIG env var
// 3. Config file contents from LANDSAT2PARQUET_CONFIG_CONTENT env var
// 4. Default config file locations (./landsat2parquet.toml, ./.landsat2parquet.toml)
// 5. Built-in defaults (lowest priority)

use anyhow::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};

mod sources;
mod validation;

/// Main runtime configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub metadata: MetadataConfig,

    #[serde(default)]
    pub grids: GridsConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub log: LogConfig,
}

/// Metadata-index configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MetadataConfig {
    /// URL of the gzip-compressed scene index
    pub url: String,
    /// Rows per chunk while splitting; the memory bound
    pub chunk_rows: usize,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            url: "http://storage.googleapis.com/gcp-public-data-landsat/index.csv.gz".to_string(),
            chunk_rows: 250_000,
        }
    }
}

/// One reference-grid archive and the file proving it is installed
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct GridSource {
    pub url: String,
    pub file: String,
}

/// Reference-grid configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GridsConfig {
    pub sources: Vec<GridSource>,
}

impl Default for GridsConfig {
    fn default() -> Self {
        Self {
            sources: vec![
                GridSource {
                    url: "https://d9-wret.s3.us-west-2.amazonaws.com/assets/palladium/production/s3fs-public/atoms/files/WRS1_descending_0.zip".to_string(),
                    file: "wrs1_descending.shp".to_string(),
                },
                GridSource {
                    url: "https://d9-wret.s3.us-west-2.amazonaws.com/assets/palladium/production/s3fs-public/atoms/files/WRS2_descending_0.zip".to_string(),
                    file: "wrs2_descending.shp".to_string(),
                },
            ],
        }
    }
}

/// Local storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the scenes/ and wrs/ caches
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

impl RuntimeConfig {
    /// Load configuration from env-var and default-file sources with priority
    pub fn load() -> Result<Self> {
        sources::load_config()
    }

    /// Load configuration from a specific file path (CLI --config flag)
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        sources::load_from_file_path(path)
    }

    /// Load configuration with graceful fallback to defaults
    pub fn load_or_default() -> Result<Self> {
        sources::load_or_default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    /// Directory holding the dated marker and the partition files
    pub fn scenes_dir(&self) -> PathBuf {
        Path::new(&self.storage.data_dir).join("scenes")
    }

    /// Directory holding the extracted reference grids
    pub fn wrs_dir(&self) -> PathBuf {
        Path::new(&self.storage.data_dir).join("wrs")
    }
}
