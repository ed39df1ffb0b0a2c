// Configuration source loading.
//
// Priority order:
// 1. Config file path from LANDSAT2PARQUET_CONFIG
// 2. Inline config content from LANDSAT2PARQUET_CONFIG_CONTENT
// 3. Default config files (./landsat2parquet.toml, ./.landsat2parquet.toml)
// 4. Built-in defaults

use crate::RuntimeConfig;
use anyhow::{Context, Result};
use std::env;
use std::path::Path;

/// Load configuration from env-var and default-file sources.
pub fn load_config() -> Result<RuntimeConfig> {
    let config = load_from_sources()?.unwrap_or_default();
    config.validate()?;
    Ok(config)
}

fn load_from_sources() -> Result<Option<RuntimeConfig>> {
    if let Ok(path) = env::var("LANDSAT2PARQUET_CONFIG") {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        let config: RuntimeConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;
        return Ok(Some(config));
    }

    if let Ok(content) = env::var("LANDSAT2PARQUET_CONFIG_CONTENT") {
        let config: RuntimeConfig = toml::from_str(&content)
            .context("Failed to parse inline config from LANDSAT2PARQUET_CONFIG_CONTENT")?;
        return Ok(Some(config));
    }

    for path in &["./landsat2parquet.toml", "./.landsat2parquet.toml"] {
        if Path::new(path).exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path))?;
            let config: RuntimeConfig = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path))?;
            return Ok(Some(config));
        }
    }

    Ok(None)
}

/// Load configuration from a specific file path (for CLI --config flag).
/// Returns an error if the file doesn't exist or can't be parsed.
pub fn load_from_file_path(path: impl AsRef<Path>) -> Result<RuntimeConfig> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: RuntimeConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    config.validate()?;
    Ok(config)
}

/// Load configuration with graceful fallback to defaults.
pub fn load_or_default() -> Result<RuntimeConfig> {
    let config = load_from_sources().unwrap_or(None).unwrap_or_default();
    config.validate()?;
    Ok(config)
}
