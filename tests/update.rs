// Integration tests for snapshot freshness and reference-grid fetching.
//
// The network seam is replaced with recording fetchers; the split path runs
// for real against gzip fixtures and is read back through the Parquet
// reader.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use arrow::array::cast::AsArray;
use async_trait::async_trait;
use flate2::write::GzEncoder;
use flate2::Compression;
use landsat2parquet::fetch::{FetchError, Fetcher};
use landsat2parquet::grids::ensure_reference_grids;
use landsat2parquet::snapshot::SnapshotManager;
use landsat2parquet_config::GridSource;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use tempfile::TempDir;

const INDEX_URL: &str = "http://example.invalid/index.csv.gz";

/// Fetcher that serves a fixed payload and counts calls.
struct MockFetcher {
    payload: Vec<u8>,
    calls: AtomicUsize,
}

impl MockFetcher {
    fn new(payload: Vec<u8>) -> Self {
        Self {
            payload,
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, _url: &str, dest: &Path) -> Result<(), FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        fs::write(dest, &self.payload)?;
        Ok(())
    }
}

/// Fetcher that fails every request with a non-success status.
struct FailingFetcher;

#[async_trait]
impl Fetcher for FailingFetcher {
    async fn fetch(&self, url: &str, _dest: &Path) -> Result<(), FetchError> {
        Err(FetchError::BadStatus {
            status: reqwest::StatusCode::BAD_GATEWAY,
            url: url.to_string(),
        })
    }
}

fn gzipped(content: &str) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(content.as_bytes()).unwrap();
    encoder.finish().unwrap()
}

const INDEX_CSV: &str = "\
SPACECRAFT_ID,COLLECTION_NUMBER,SCENE_ID
LANDSAT_8,01,s1
LANDSAT_7,01,s2
LANDSAT_8,PRE,s3
";

fn scene_ids(path: &Path) -> Vec<String> {
    let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(path).unwrap())
        .unwrap()
        .build()
        .unwrap();
    let mut ids = Vec::new();
    for batch in reader {
        let batch = batch.unwrap();
        let col = batch.column_by_name("SCENE_ID").unwrap().as_string::<i32>();
        ids.extend(col.iter().map(|v| v.unwrap().to_string()));
    }
    ids
}

fn scenes_manager(dir: &TempDir) -> (SnapshotManager, PathBuf) {
    let scenes = dir.path().join("scenes");
    (
        SnapshotManager::new(scenes.clone(), INDEX_URL, 2),
        scenes,
    )
}

#[tokio::test]
async fn refresh_downloads_splits_and_marks() {
    let dir = TempDir::new().unwrap();
    let (manager, scenes) = scenes_manager(&dir);
    let fetcher = MockFetcher::new(gzipped(INDEX_CSV));

    manager.refresh(&fetcher).await.unwrap();

    assert_eq!(fetcher.calls(), 1);
    assert!(manager.marker_path().exists());
    assert!(!manager.index_path().exists(), "compressed source removed");
    assert_eq!(scene_ids(&scenes.join("LANDSAT_8.parquet")), vec!["s1"]);
    assert_eq!(scene_ids(&scenes.join("LANDSAT_7.parquet")), vec!["s2"]);
}

#[tokio::test]
async fn refresh_skips_download_when_marker_is_fresh() {
    let dir = TempDir::new().unwrap();
    let (manager, scenes) = scenes_manager(&dir);
    fs::create_dir_all(&scenes).unwrap();
    fs::write(manager.marker_path(), "").unwrap();

    let fetcher = MockFetcher::new(gzipped(INDEX_CSV));
    manager.refresh(&fetcher).await.unwrap();

    assert_eq!(fetcher.calls(), 0, "fresh cache must not hit the network");
    assert!(manager.marker_path().exists());
}

#[tokio::test]
async fn refresh_removes_stale_artifacts() {
    let dir = TempDir::new().unwrap();
    let (manager, scenes) = scenes_manager(&dir);
    fs::create_dir_all(&scenes).unwrap();
    let stale_marker = scenes.join("scenes_19990101");
    fs::write(&stale_marker, "").unwrap();
    fs::write(scenes.join("l_index.csv.gz"), b"leftover").unwrap();
    fs::write(manager.marker_path(), "").unwrap();

    let fetcher = MockFetcher::new(Vec::new());
    manager.refresh(&fetcher).await.unwrap();

    assert_eq!(fetcher.calls(), 0);
    assert!(!stale_marker.exists());
    assert!(!scenes.join("l_index.csv.gz").exists());
    assert!(manager.marker_path().exists());
}

#[tokio::test]
async fn failed_download_leaves_no_marker() {
    let dir = TempDir::new().unwrap();
    let (manager, _scenes) = scenes_manager(&dir);

    let result = manager.refresh(&FailingFetcher).await;

    assert!(result.is_err());
    assert!(
        !manager.marker_path().exists(),
        "a failed refresh must not look fresh on the next run"
    );
}

#[tokio::test]
async fn failed_split_leaves_no_marker() {
    let dir = TempDir::new().unwrap();
    let (manager, _scenes) = scenes_manager(&dir);
    // payload is not gzip, so the split blows up after the download
    let fetcher = MockFetcher::new(b"not a gzip file".to_vec());

    let result = manager.refresh(&fetcher).await;

    assert!(result.is_err());
    assert_eq!(fetcher.calls(), 1);
    assert!(!manager.marker_path().exists());
}

fn zip_with_file(name: &str, content: &[u8]) -> Vec<u8> {
    let mut buf = std::io::Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut buf);
        writer
            .start_file(name, zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(content).unwrap();
        writer.finish().unwrap();
    }
    buf.into_inner()
}

fn grid_sources() -> Vec<GridSource> {
    vec![GridSource {
        url: "http://example.invalid/WRS1_descending_0.zip".to_string(),
        file: "wrs1_descending.shp".to_string(),
    }]
}

#[tokio::test]
async fn grids_download_and_extract() {
    let dir = TempDir::new().unwrap();
    let wrs = dir.path().join("wrs");
    let fetcher = MockFetcher::new(zip_with_file("wrs1_descending.shp", b"shapefile bytes"));

    ensure_reference_grids(&wrs, &grid_sources(), &fetcher)
        .await
        .unwrap();

    assert_eq!(fetcher.calls(), 1);
    assert_eq!(fs::read(wrs.join("wrs1_descending.shp")).unwrap(), b"shapefile bytes");
    assert!(!wrs.join("wrs.zip").exists(), "transient archive removed");
}

#[tokio::test]
async fn grids_skip_when_files_exist() {
    let dir = TempDir::new().unwrap();
    let wrs = dir.path().join("wrs");
    fs::create_dir_all(&wrs).unwrap();
    let sources = landsat2parquet_config::GridsConfig::default().sources;
    for source in &sources {
        fs::write(wrs.join(&source.file), b"already here").unwrap();
    }

    let fetcher = MockFetcher::new(Vec::new());
    ensure_reference_grids(&wrs, &sources, &fetcher)
        .await
        .unwrap();

    assert_eq!(fetcher.calls(), 0, "present grids must not hit the network");
}

/// Fetcher that routes urls to distinct payloads, 404ing the rest.
struct RoutingFetcher {
    routes: std::collections::HashMap<String, Vec<u8>>,
    calls: AtomicUsize,
}

#[async_trait]
impl Fetcher for RoutingFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.routes.get(url) {
            Some(payload) => {
                fs::write(dest, payload)?;
                Ok(())
            }
            None => Err(FetchError::BadStatus {
                status: reqwest::StatusCode::NOT_FOUND,
                url: url.to_string(),
            }),
        }
    }
}

/// Full `update` pipeline: snapshot refresh, split, grids, then a no-op
/// second run against the fresh cache.
#[tokio::test]
async fn update_pipeline_end_to_end() {
    let dir = TempDir::new().unwrap();
    let mut config = landsat2parquet_config::RuntimeConfig::default();
    config.storage.data_dir = dir.path().to_string_lossy().to_string();
    config.metadata.chunk_rows = 2;

    let mut routes = std::collections::HashMap::new();
    routes.insert(config.metadata.url.clone(), gzipped(INDEX_CSV));
    for source in &config.grids.sources {
        routes.insert(
            source.url.clone(),
            zip_with_file(&source.file, b"grid bytes"),
        );
    }
    let fetcher = RoutingFetcher {
        routes,
        calls: AtomicUsize::new(0),
    };

    landsat2parquet::run_update(&config, &fetcher).await.unwrap();

    let scenes = config.scenes_dir();
    assert_eq!(scene_ids(&scenes.join("LANDSAT_8.parquet")), vec!["s1"]);
    assert_eq!(scene_ids(&scenes.join("LANDSAT_7.parquet")), vec!["s2"]);
    for source in &config.grids.sources {
        assert!(config.wrs_dir().join(&source.file).exists());
    }
    let first_run_calls = fetcher.calls.load(Ordering::SeqCst);
    assert_eq!(first_run_calls, 1 + config.grids.sources.len());

    // everything is cached now; a second update touches nothing
    landsat2parquet::run_update(&config, &fetcher).await.unwrap();
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), first_run_calls);
}

#[tokio::test]
async fn grids_reject_non_zip_payload_and_clean_up() {
    let dir = TempDir::new().unwrap();
    let wrs = dir.path().join("wrs");
    let fetcher = MockFetcher::new(b"<kml>not a zip</kml>".to_vec());

    let result = ensure_reference_grids(&wrs, &grid_sources(), &fetcher).await;

    assert!(result.is_err());
    assert!(!wrs.join("wrs.zip").exists(), "transient archive removed");
    assert!(!wrs.join("wrs1_descending.shp").exists());
}
