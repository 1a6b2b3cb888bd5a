//! In-memory image cache.

use std::num::NonZeroUsize;

use lru::LruCache;
use tracing::{debug, trace};

use crate::domain::entities::{AssetKey, CachedImage};

/// Decoded images keyed by asset key.
///
/// Unbounded unless a capacity is given, in which case the least recently
/// used entry makes room. Not internally synchronised: the owner holds it
/// behind the same lock as its pending requests.
pub struct MemoryImageCache {
    cache: LruCache<AssetKey, CachedImage>,
    hits: u64,
    misses: u64,
}

impl MemoryImageCache {
    /// Creates a cache; `None` means unbounded.
    #[must_use]
    pub fn new(capacity: Option<usize>) -> Self {
        let cache = match capacity {
            Some(cap) => LruCache::new(NonZeroUsize::new(cap).unwrap_or(NonZeroUsize::MIN)),
            None => LruCache::unbounded(),
        };
        Self {
            cache,
            hits: 0,
            misses: 0,
        }
    }

    /// Creates an unbounded cache.
    #[must_use]
    pub fn unbounded() -> Self {
        Self::new(None)
    }

    /// Returns a cached image and marks it recently used.
    pub fn get(&mut self, key: &AssetKey) -> Option<CachedImage> {
        if let Some(img) = self.cache.get(key) {
            self.hits += 1;
            trace!(key = %key, "Memory cache hit");
            Some(img.clone())
        } else {
            self.misses += 1;
            trace!(key = %key, "Memory cache miss");
            None
        }
    }

    /// Looks at an image without touching recency or statistics.
    #[must_use]
    pub fn peek(&self, key: &AssetKey) -> Option<&CachedImage> {
        self.cache.peek(key)
    }

    /// Returns true if `key` is cached.
    #[must_use]
    pub fn contains(&self, key: &AssetKey) -> bool {
        self.cache.contains(key)
    }

    /// Stores an image, replacing any previous entry for the key.
    pub fn put(&mut self, key: AssetKey, image: CachedImage) {
        debug!(key = %key, "Storing image in memory cache");
        self.cache.put(key, image);
    }

    /// Removes one image.
    pub fn evict(&mut self, key: &AssetKey) {
        if self.cache.pop(key).is_some() {
            debug!(key = %key, "Evicted image from memory cache");
        }
    }

    /// Removes every image.
    pub fn clear(&mut self) {
        let count = self.cache.len();
        self.cache.clear();
        debug!(count, "Cleared memory image cache");
    }

    /// Number of cached images.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Returns cache statistics.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> CacheStats {
        let total = self.hits + self.misses;
        let hit_rate = if total > 0 {
            (self.hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            hit_rate,
            size: self.len(),
        }
    }
}

impl Default for MemoryImageCache {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// Statistics about cache performance.
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Hit rate as a percentage.
    pub hit_rate: f64,
    /// Current number of cached images.
    pub size: usize,
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Cache: {} images, {:.1}% hit rate ({} hits, {} misses)",
            self.size, self.hit_rate, self.hits, self.misses
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn img(side: u32) -> CachedImage {
        CachedImage::new(image::DynamicImage::new_rgb8(side, side), Vec::new())
    }

    #[test]
    fn test_cache_put_and_get() {
        let mut cache = MemoryImageCache::unbounded();
        let key = AssetKey::new("https://a/1.png");

        cache.put(key.clone(), img(100));
        let retrieved = cache.get(&key);

        assert_eq!(retrieved.unwrap().width(), 100);
    }

    #[test]
    fn test_put_overwrites() {
        let mut cache = MemoryImageCache::unbounded();
        let key = AssetKey::new("https://a/1.png");

        cache.put(key.clone(), img(10));
        cache.put(key.clone(), img(20));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.peek(&key).unwrap().width(), 20);
    }

    #[test]
    fn test_bounded_cache_eviction() {
        let mut cache = MemoryImageCache::new(Some(2));
        let k1 = AssetKey::new("1");
        let k2 = AssetKey::new("2");
        let k3 = AssetKey::new("3");

        cache.put(k1.clone(), img(1));
        cache.put(k2.clone(), img(1));
        cache.put(k3.clone(), img(1));

        assert!(cache.get(&k1).is_none());
        assert!(cache.get(&k2).is_some());
        assert!(cache.get(&k3).is_some());
    }

    #[test]
    fn test_unbounded_keeps_everything() {
        let mut cache = MemoryImageCache::unbounded();
        for i in 0..500 {
            cache.put(AssetKey::new(i.to_string()), img(1));
        }
        assert_eq!(cache.len(), 500);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_stats() {
        let mut cache = MemoryImageCache::unbounded();
        let key = AssetKey::new("1");
        cache.put(key.clone(), img(1));

        let _ = cache.get(&key);
        let _ = cache.get(&AssetKey::new("missing"));
        let _ = cache.peek(&AssetKey::new("missing"));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 1);
    }
}
