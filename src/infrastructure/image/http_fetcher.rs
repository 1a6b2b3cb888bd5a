//! Network image fetcher.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Semaphore;
use tracing::debug;

use crate::domain::entities::{AssetKey, CachedImage};
use crate::domain::errors::{AssetError, AssetResult};
use crate::domain::ports::ImageFetcherPort;

/// Configuration for the HTTP fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcherConfig {
    /// Maximum concurrent downloads.
    pub max_concurrent_downloads: usize,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// User agent sent with every request.
    pub user_agent: String,
}

impl Default for HttpFetcherConfig {
    fn default() -> Self {
        Self {
            max_concurrent_downloads: 4,
            timeout_secs: 30,
            user_agent: concat!("modio-asset-cache/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Downloads images over HTTP and decodes them off the async runtime.
pub struct HttpImageFetcher {
    http_client: reqwest::Client,
    semaphore: Arc<Semaphore>,
}

impl std::fmt::Debug for HttpImageFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpImageFetcher")
            .field("available_permits", &self.semaphore.available_permits())
            .finish_non_exhaustive()
    }
}

impl HttpImageFetcher {
    /// Creates a fetcher with the given configuration.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(config: &HttpFetcherConfig) -> AssetResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| AssetError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent_downloads.max(1))),
        })
    }

    /// Downloads image bytes from a URL.
    async fn download(&self, url: &str) -> AssetResult<Bytes> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| AssetError::Dropped)?;

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| AssetError::network(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AssetError::Http {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        response
            .bytes()
            .await
            .map_err(|e| AssetError::network(format!("Failed to read body: {e}")))
    }
}

#[async_trait]
impl ImageFetcherPort for HttpImageFetcher {
    async fn fetch(&self, key: &AssetKey) -> AssetResult<CachedImage> {
        debug!(key = %key, "Downloading image");

        let bytes = self.download(key.as_str()).await?;
        let size = bytes.len();

        let image = tokio::task::spawn_blocking(move || CachedImage::decode(bytes))
            .await
            .map_err(|e| AssetError::decode(format!("Decode task panicked: {e}")))?
            .map_err(|e| AssetError::decode(e.to_string()))?;

        debug!(
            key = %key,
            size,
            width = image.width(),
            height = image.height(),
            "Image downloaded"
        );
        Ok(image)
    }
}
