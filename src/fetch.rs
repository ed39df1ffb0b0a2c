// Streamed HTTP retrieval.
//
// Downloads go straight from the response stream to their destination file.
// The trait seam exists so freshness and grid logic can be exercised without
// a network.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

/// Errors raised while retrieving or unpacking remote artifacts
#[derive(Debug, Error)]
pub enum FetchError {
    /// Non-success response; fatal for the invocation, never retried
    #[error("bad response {status} from {url}")]
    BadStatus {
        status: reqwest::StatusCode,
        url: String,
    },

    /// Transport-level failure
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Download could not be stored
    #[error("failed to store download: {0}")]
    Io(#[from] std::io::Error),

    /// Payload was not the archive format it claimed to be
    #[error("archive {path} is not a valid zip: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
}

/// Network seam for everything that downloads.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Stream `url` into `dest`, creating or truncating the file.
    async fn fetch(&self, url: &str, dest: &Path) -> Result<(), FetchError>;
}

/// Production fetcher backed by reqwest.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
        let mut response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::BadStatus {
                status: response.status(),
                url: url.to_string(),
            });
        }

        info!(url, dest = %dest.display(), "downloading");
        let mut file = File::create(dest)?;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk)?;
        }
        file.flush()?;
        Ok(())
    }
}
