//! Port for downloading images.

use async_trait::async_trait;

use crate::domain::entities::{AssetKey, CachedImage};
use crate::domain::errors::AssetResult;

/// Downloads and decodes the image behind a key.
#[async_trait]
pub trait ImageFetcherPort: Send + Sync {
    /// Fetches and decodes one image.
    async fn fetch(&self, key: &AssetKey) -> AssetResult<CachedImage>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use crate::domain::errors::AssetError;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Semaphore;

    /// Encodes a solid PNG of the given size.
    pub fn png(width: u32, height: u32) -> CachedImage {
        let image = image::DynamicImage::new_rgb8(width, height);
        let mut bytes = std::io::Cursor::new(Vec::new());
        image
            .write_to(&mut bytes, image::ImageFormat::Png)
            .expect("encode png");
        CachedImage::new(image, bytes.into_inner())
    }

    /// Fetcher whose downloads stay in flight until released.
    pub struct GatedFetcher {
        gate: Arc<Semaphore>,
        calls: Mutex<HashMap<AssetKey, usize>>,
        total: AtomicUsize,
        failures: Mutex<HashMap<AssetKey, AssetError>>,
    }

    impl GatedFetcher {
        /// Creates a fetcher with a closed gate.
        pub fn new() -> Self {
            Self {
                gate: Arc::new(Semaphore::new(0)),
                calls: Mutex::new(HashMap::new()),
                total: AtomicUsize::new(0),
                failures: Mutex::new(HashMap::new()),
            }
        }

        /// Creates a fetcher that never blocks.
        pub fn open() -> Self {
            let fetcher = Self::new();
            fetcher.gate.add_permits(Semaphore::MAX_PERMITS / 2);
            fetcher
        }

        /// Lets `n` downloads finish.
        pub fn release(&self, n: usize) {
            self.gate.add_permits(n);
        }

        /// Makes every fetch of `key` fail with `error`.
        pub fn fail(&self, key: &AssetKey, error: AssetError) {
            self.failures.lock().insert(key.clone(), error);
        }

        /// Stops failing `key`.
        pub fn heal(&self, key: &AssetKey) {
            self.failures.lock().remove(key);
        }

        /// Number of fetches started for `key`.
        pub fn calls(&self, key: &AssetKey) -> usize {
            self.calls.lock().get(key).copied().unwrap_or(0)
        }

        /// Number of fetches started overall.
        pub fn total_calls(&self) -> usize {
            self.total.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ImageFetcherPort for GatedFetcher {
        async fn fetch(&self, key: &AssetKey) -> AssetResult<CachedImage> {
            *self.calls.lock().entry(key.clone()).or_insert(0) += 1;
            self.total.fetch_add(1, Ordering::SeqCst);

            let permit = self.gate.acquire().await.map_err(|_| AssetError::Dropped)?;
            permit.forget();

            if let Some(error) = self.failures.lock().get(key).cloned() {
                return Err(error);
            }
            Ok(png(8, 8))
        }
    }
}
