//! Image handling infrastructure.
//!
//! This module provides:
//! - Memory caching, unbounded or LRU-capped
//! - Disk caching for persistence
//! - HTTP fetching with bounded concurrency
//! - mod.io and YouTube URL helpers

pub mod disk_cache;
pub mod http_fetcher;
pub mod memory_cache;
pub mod modio_cdn;

pub use disk_cache::{DEFAULT_MAX_CACHE_SIZE, DiskImageCache, default_cache_dir};
pub use http_fetcher::{HttpFetcherConfig, HttpImageFetcher};
pub use memory_cache::{CacheStats, MemoryImageCache};
pub use modio_cdn::{
    extract_youtube_id, is_modio_image_url, youtube_thumbnail_for_link, youtube_thumbnail_url,
};
