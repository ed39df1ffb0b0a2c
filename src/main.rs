use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use landsat2parquet::fetch::HttpFetcher;
use landsat2parquet_config::RuntimeConfig;
use std::path::PathBuf;

/// Fetch and repartition public Landsat scene metadata
#[derive(Parser)]
#[command(name = "landsat2parquet")]
#[command(version)]
#[command(about = "Fetch and repartition public Landsat scene metadata", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Data directory holding the scenes/ and wrs/ caches
    #[arg(short, long, value_name = "DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Rows per chunk when splitting the index
    #[arg(long, value_name = "ROWS", global = true)]
    chunk_rows: Option<usize>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short = 'v', long, value_name = "LEVEL", global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh the metadata snapshot and reference grids (default)
    Update,
    /// Split an already-downloaded index file into partitions
    Split {
        /// Path to the CSV index, gzip-compressed or plain
        input: PathBuf,
    },
    /// Fetch the WRS reference grids only
    Grids,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Sequential pipeline; a single-threaded runtime is all it needs
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?
        .block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    let mut config = if let Some(config_path) = &cli.config {
        RuntimeConfig::load_from_path(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else {
        RuntimeConfig::load_or_default().context("Failed to load configuration")?
    };

    apply_cli_overrides(&mut config, &cli)?;
    config.validate()?;

    landsat2parquet::init_tracing(&config);
    display_startup_info(&config);

    let fetcher = HttpFetcher::new();
    match cli.command {
        Some(Commands::Split { input }) => landsat2parquet::run_split(&config, &input),
        Some(Commands::Grids) => landsat2parquet::run_grids(&config, &fetcher).await,
        Some(Commands::Update) | None => landsat2parquet::run_update(&config, &fetcher).await,
    }
}

fn apply_cli_overrides(config: &mut RuntimeConfig, cli: &Cli) -> Result<()> {
    if let Some(dir) = &cli.data_dir {
        config.storage.data_dir = dir.to_string_lossy().to_string();
    }

    if let Some(rows) = cli.chunk_rows {
        if rows == 0 {
            anyhow::bail!("--chunk-rows must be greater than 0");
        }
        config.metadata.chunk_rows = rows;
    }

    if let Some(level) = &cli.log_level {
        config.log.level = level.clone();
    }

    Ok(())
}

fn display_startup_info(config: &RuntimeConfig) {
    use tracing::info;

    info!("landsat2parquet v{}", env!("CARGO_PKG_VERSION"));
    info!("Data directory: {}", config.storage.data_dir);
    info!("Index url: {}", config.metadata.url);
    info!("Chunk rows: {}", config.metadata.chunk_rows);
    info!("Reference grids: {}", config.grids.sources.len());
}
