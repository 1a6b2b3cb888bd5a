//! Infrastructure layer with adapters for the network, disk and configuration.

/// Application configuration.
pub mod config;
/// Image handling (caching, fetching, CDN helpers).
pub mod image;
/// Subscribed mod tracking.
pub mod subscriptions;

pub use config::{AppConfig, CacheConfig, CliArgs, LogLevel, NetworkConfig, StorageManager};
pub use image::{
    CacheStats, DiskImageCache, HttpFetcherConfig, HttpImageFetcher, MemoryImageCache,
    extract_youtube_id, is_modio_image_url, youtube_thumbnail_for_link,
};
pub use subscriptions::SubscribedMods;
