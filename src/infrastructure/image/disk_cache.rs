//! Disk-based image cache for persistence across sessions.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::{debug, error, trace, warn};

use crate::domain::entities::{CacheLocation, CachedImage};
use crate::domain::errors::{AssetError, AssetResult};
use crate::domain::ports::PersistentStorePort;

/// Maximum disk cache size in bytes (200 MB default).
pub const DEFAULT_MAX_CACHE_SIZE: u64 = 200 * 1024 * 1024;

const ENTRY_EXTENSION: &str = "img";

/// Disk-based image cache that persists raw image bytes under
/// per-mod and per-user directories.
pub struct DiskImageCache {
    cache_dir: PathBuf,
    max_size: u64,
    current_size: AtomicU64,
    item_count: AtomicUsize,
}

impl DiskImageCache {
    /// Creates a new disk cache in the specified directory.
    ///
    /// # Errors
    /// Returns error if cache directory cannot be created.
    pub async fn new(cache_dir: PathBuf, max_size: u64) -> AssetResult<Self> {
        fs::create_dir_all(&cache_dir)
            .await
            .map_err(|e| AssetError::io(format!("Failed to create cache dir: {e}")))?;

        let entries = collect_entries(&cache_dir).await;
        let total_size = entries.iter().map(|(_, _, size)| size).sum();

        let cache = Self {
            cache_dir,
            max_size,
            current_size: AtomicU64::new(total_size),
            item_count: AtomicUsize::new(entries.len()),
        };

        cache.cleanup_if_needed().await;

        Ok(cache)
    }

    /// Creates a cache in the default location.
    ///
    /// # Errors
    /// Returns error if cache directory cannot be created.
    pub async fn default_location() -> AssetResult<Self> {
        Self::new(default_cache_dir(), DEFAULT_MAX_CACHE_SIZE).await
    }

    /// Root directory of the cache.
    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the path for a cached image.
    #[must_use]
    pub fn cache_path(&self, location: &CacheLocation) -> PathBuf {
        self.cache_dir.join(location.relative_path())
    }

    /// Gets raw image bytes from disk cache.
    pub async fn get_bytes(&self, location: &CacheLocation) -> Option<Vec<u8>> {
        let path = self.cache_path(location);
        if let Ok(bytes) = fs::read(&path).await {
            trace!(path = %path.display(), "Disk cache hit");
            Some(bytes)
        } else {
            trace!(path = %path.display(), "Disk cache miss");
            None
        }
    }

    /// Stores raw bytes in the disk cache.
    ///
    /// # Errors
    /// Returns error if file cannot be created or written.
    pub async fn put_bytes(&self, location: &CacheLocation, bytes: &[u8]) -> AssetResult<()> {
        self.write_entry(location, Bytes::copy_from_slice(bytes)).await
    }

    /// Writes through a temporary file in the same directory and renames it
    /// into place, so readers never observe a partial entry.
    async fn write_entry(&self, location: &CacheLocation, bytes: Bytes) -> AssetResult<()> {
        let path = self.cache_path(location);
        let parent = path
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| AssetError::io("Cache path has no parent"))?;

        fs::create_dir_all(&parent)
            .await
            .map_err(|e| AssetError::io(format!("Failed to create cache dir: {e}")))?;

        let old_size = fs::metadata(&path).await.map(|m| m.len()).ok();
        let new_size = bytes.len() as u64;

        let target = path.clone();
        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            let mut file = tempfile::NamedTempFile::new_in(&parent)?;
            file.write_all(&bytes)?;
            file.flush()?;
            file.persist(&target).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| AssetError::io(format!("Cache write task failed: {e}")))?
        .map_err(|e| AssetError::io(format!("Failed to write cache file: {e}")))?;

        if let Some(old) = old_size {
            if new_size > old {
                self.current_size
                    .fetch_add(new_size - old, Ordering::Relaxed);
            } else {
                self.release(old - new_size, 0);
            }
        } else {
            self.current_size.fetch_add(new_size, Ordering::Relaxed);
            self.item_count.fetch_add(1, Ordering::Relaxed);
        }

        debug!(path = %path.display(), size = new_size, "Stored image in disk cache");

        self.cleanup_if_needed().await;

        Ok(())
    }

    /// Subtracts freed space from the counters without wrapping.
    fn release(&self, size: u64, count: usize) {
        let _ = self
            .current_size
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                Some(current.saturating_sub(size))
            });
        let _ = self
            .item_count
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                Some(current.saturating_sub(count))
            });
    }

    /// Removes an image from disk cache.
    pub async fn evict(&self, location: &CacheLocation) {
        let path = self.cache_path(location);
        let size = fs::metadata(&path).await.map(|m| m.len()).ok();
        if let Err(e) = fs::remove_file(&path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), error = %e, "Failed to evict from disk cache");
            }
        } else if let Some(s) = size {
            self.release(s, 1);
            debug!(path = %path.display(), "Evicted from disk cache");
        }
    }

    /// Removes every cached image belonging to a mod.
    pub async fn evict_mod(&self, mod_id: u64) {
        let dir = self.cache_dir.join("mods").join(mod_id.to_string());
        let entries = collect_entries(&dir).await;
        let freed_size: u64 = entries.iter().map(|(_, _, size)| size).sum();

        match fs::remove_dir_all(&dir).await {
            Ok(()) => {
                self.release(freed_size, entries.len());
                debug!(mod_id, count = entries.len(), "Evicted mod images from disk cache");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(mod_id, error = %e, "Failed to evict mod images"),
        }
    }

    /// Clears the entire disk cache.
    ///
    /// # Errors
    /// Returns error if cache directory cannot be read.
    pub async fn clear(&self) -> AssetResult<()> {
        let mut entries = fs::read_dir(&self.cache_dir)
            .await
            .map_err(|e| AssetError::io(format!("Failed to read cache dir: {e}")))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| AssetError::io(format!("Failed to read entry: {e}")))?
        {
            let path = entry.path();
            let is_dir = entry.file_type().await.is_ok_and(|t| t.is_dir());
            let removed = if is_dir {
                fs::remove_dir_all(&path).await
            } else {
                fs::remove_file(&path).await
            };
            if removed.is_err() {
                warn!(path = %path.display(), "Failed to remove cache entry");
            }
        }
        self.current_size.store(0, Ordering::Relaxed);
        self.item_count.store(0, Ordering::Relaxed);
        debug!("Cleared disk cache");
        Ok(())
    }

    /// Returns the current cache size in bytes.
    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.current_size.load(Ordering::Relaxed)
    }

    /// Returns the number of cached files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.item_count.load(Ordering::Relaxed)
    }

    /// Returns true if the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks if an image is cached.
    pub async fn contains(&self, location: &CacheLocation) -> bool {
        let path = self.cache_path(location);
        fs::try_exists(&path).await.unwrap_or(false)
    }

    /// Cleans up least recently accessed entries if over size limit.
    async fn cleanup_if_needed(&self) {
        let current_size = self.current_size();
        if current_size <= self.max_size {
            return;
        }

        debug!(
            current_size = current_size,
            max_size = self.max_size,
            "Disk cache over limit, cleaning up"
        );

        let mut files = collect_entries(&self.cache_dir).await;
        files.sort_by_key(|(_, time, _)| *time);

        let mut freed_size = 0u64;
        let mut freed_count = 0usize;
        let target = current_size - self.max_size + (self.max_size / 10);

        for (path, _, size) in files {
            if freed_size >= target {
                break;
            }

            if let Err(e) = fs::remove_file(&path).await {
                warn!(path = %path.display(), error = %e, "Failed to remove old cache file");
            } else {
                debug!(path = %path.display(), "Removed old cache file");
                freed_size += size;
                freed_count += 1;
            }
        }
        self.release(freed_size, freed_count);

        debug!(
            freed_size = freed_size,
            freed_count = freed_count,
            "Disk cache cleanup complete"
        );
    }
}

#[async_trait]
impl PersistentStorePort for DiskImageCache {
    async fn load(&self, location: &CacheLocation) -> Option<CachedImage> {
        let bytes = self.get_bytes(location).await?;

        let result = tokio::task::spawn_blocking(move || CachedImage::decode(bytes)).await;

        match result {
            Ok(Ok(img)) => {
                debug!(location = ?location, "Decoded image from disk cache");
                Some(img)
            }
            Ok(Err(e)) => {
                warn!(location = ?location, error = %e, "Failed to decode cached image, evicting");
                self.evict(location).await;
                None
            }
            Err(e) => {
                error!(location = ?location, error = %e, "Decode task panicked");
                None
            }
        }
    }

    async fn save(&self, location: &CacheLocation, image: &CachedImage) -> AssetResult<()> {
        self.write_entry(location, image.bytes.clone()).await
    }

    async fn remove(&self, location: &CacheLocation) {
        self.evict(location).await;
    }
}

/// Walks the cache tree and returns every entry with its access time and size.
async fn collect_entries(root: &Path) -> Vec<(PathBuf, std::time::SystemTime, u64)> {
    let mut files = Vec::new();
    let mut dirs = vec![root.to_path_buf()];

    while let Some(dir) = dirs.pop() {
        let Ok(mut entries) = fs::read_dir(&dir).await else {
            continue;
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            let Ok(meta) = entry.metadata().await else {
                continue;
            };
            if meta.is_dir() {
                dirs.push(path);
            } else if path.extension().is_some_and(|ext| ext == ENTRY_EXTENSION) {
                let accessed = meta.accessed().unwrap_or(std::time::SystemTime::UNIX_EPOCH);
                files.push((path, accessed, meta.len()));
            }
        }
    }

    files
}

/// Returns the default cache directory path.
#[must_use]
pub fn default_cache_dir() -> PathBuf {
    directories::ProjectDirs::from("io", "modio", "modio-asset-cache").map_or_else(
        || {
            std::env::temp_dir()
                .join("modio-asset-cache")
                .join("cache")
                .join("images")
        },
        |dirs| dirs.cache_dir().join("images"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{AssetKey, ImageSize};
    use crate::domain::ports::mocks::png;
    use tempfile::TempDir;

    async fn create_test_cache() -> (DiskImageCache, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let cache = DiskImageCache::new(temp_dir.path().to_path_buf(), 1024 * 1024)
            .await
            .unwrap();
        (cache, temp_dir)
    }

    fn logo(mod_id: u64) -> CacheLocation {
        CacheLocation::ModLogo {
            mod_id,
            size: ImageSize::Thumb320x180,
        }
    }

    #[tokio::test]
    async fn test_put_and_get_bytes() {
        let (cache, _temp) = create_test_cache().await;
        let data = b"test image data";

        cache.put_bytes(&logo(1), data).await.unwrap();
        let retrieved = cache.get_bytes(&logo(1)).await;

        assert_eq!(retrieved.unwrap(), data);
        assert!(
            cache
                .cache_path(&logo(1))
                .ends_with("mods/1/logo/thumb_320x180.img")
        );
    }

    #[tokio::test]
    async fn test_cache_miss() {
        let (cache, _temp) = create_test_cache().await;
        assert!(cache.get_bytes(&logo(99)).await.is_none());
        assert!(cache.load(&logo(99)).await.is_none());
    }

    #[tokio::test]
    async fn test_store_round_trip_decodes() {
        let (cache, _temp) = create_test_cache().await;
        let location = CacheLocation::UserAvatar {
            user_id: 5,
            size: ImageSize::Thumb50x50,
        };

        cache.save(&location, &png(50, 50)).await.unwrap();
        let loaded = cache.load(&location).await.unwrap();

        assert_eq!((loaded.width(), loaded.height()), (50, 50));
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_evicted() {
        let (cache, _temp) = create_test_cache().await;
        let location = CacheLocation::Url(AssetKey::new("https://a/b.png"));

        cache.put_bytes(&location, b"not an image").await.unwrap();
        assert!(cache.load(&location).await.is_none());
        assert!(!cache.contains(&location).await);
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test]
    async fn test_evict_mod() {
        let (cache, _temp) = create_test_cache().await;
        let gallery = CacheLocation::ModGalleryImage {
            mod_id: 1,
            file_name: "a.png".to_string(),
            size: ImageSize::Original,
        };

        cache.put_bytes(&logo(1), b"aa").await.unwrap();
        cache.put_bytes(&gallery, b"bbb").await.unwrap();
        cache.put_bytes(&logo(2), b"c").await.unwrap();

        cache.evict_mod(1).await;

        assert!(!cache.contains(&gallery).await);
        assert!(cache.contains(&logo(2)).await);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.current_size(), 1);
    }

    #[tokio::test]
    async fn test_counters_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        {
            let cache = DiskImageCache::new(temp_dir.path().to_path_buf(), 1024)
                .await
                .unwrap();
            cache.put_bytes(&logo(1), b"hello").await.unwrap();
            cache.put_bytes(&logo(2), b"world!").await.unwrap();
        }

        let cache = DiskImageCache::new(temp_dir.path().to_path_buf(), 1024)
            .await
            .unwrap();
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.current_size(), 11);
    }

    #[tokio::test]
    async fn test_atomic_counters_sync() {
        let (cache, _temp) = create_test_cache().await;

        cache.put_bytes(&logo(1), b"hello").await.unwrap();
        cache.put_bytes(&logo(2), b"world!").await.unwrap();
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.current_size(), 11);

        cache.put_bytes(&logo(1), b"hey").await.unwrap();
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.current_size(), 9);

        cache.evict(&logo(2)).await;
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.current_size(), 3);

        cache.clear().await.unwrap();
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.current_size(), 0);
        assert!(!cache.contains(&logo(1)).await);
    }

    #[tokio::test]
    async fn test_cleanup_updates_counters() {
        let temp_dir = TempDir::new().unwrap();
        let cache = DiskImageCache::new(temp_dir.path().to_path_buf(), 10)
            .await
            .unwrap();

        cache.put_bytes(&logo(1), b"123456").await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        cache.put_bytes(&logo(2), b"123456").await.unwrap();

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.current_size(), 6);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_overwrite_never_exposes_partial_entry() {
        let temp_dir = TempDir::new().unwrap();
        let cache = std::sync::Arc::new(
            DiskImageCache::new(temp_dir.path().to_path_buf(), DEFAULT_MAX_CACHE_SIZE)
                .await
                .unwrap(),
        );
        let image = png(64, 64);
        cache.save(&logo(1), &image).await.unwrap();

        let writer = {
            let cache = cache.clone();
            let image = image.clone();
            tokio::spawn(async move {
                for _ in 0..25 {
                    cache.save(&logo(1), &image).await.unwrap();
                }
            })
        };
        for _ in 0..25 {
            assert!(cache.load(&logo(1)).await.is_some());
        }
        writer.await.unwrap();

        let dir = cache.cache_path(&logo(1)).parent().unwrap().to_path_buf();
        let names: Vec<_> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("thumb_320x180.img")]);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_counters_never_wrap() {
        let (cache, _temp) = create_test_cache().await;
        cache.put_bytes(&logo(1), b"abc").await.unwrap();

        cache.release(1_000, 10);

        assert_eq!(cache.current_size(), 0);
        assert_eq!(cache.len(), 0);
    }
}
