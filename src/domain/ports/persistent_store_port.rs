//! Port for the persistent image store.

use async_trait::async_trait;

use crate::domain::entities::{CacheLocation, CachedImage};
use crate::domain::errors::AssetResult;

/// Durable key to image storage consulted between memory and network.
#[async_trait]
pub trait PersistentStorePort: Send + Sync {
    /// Loads an image. Missing or unreadable entries are `None`.
    async fn load(&self, location: &CacheLocation) -> Option<CachedImage>;

    /// Saves an image, overwriting any previous entry.
    async fn save(&self, location: &CacheLocation, image: &CachedImage) -> AssetResult<()>;

    /// Removes an entry if present.
    async fn remove(&self, location: &CacheLocation);
}
