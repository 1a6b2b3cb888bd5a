//! Deduplicating image request manager.
//!
//! Resolves image requests in tiers: Memory -> Persistent store -> Network.
//! Concurrent requests for one key share a single fetch, and a cached
//! lower-resolution variant is handed out while a larger one downloads.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::join_all;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use super::fallback_resolver::resolve_fallback;
use super::pending_requests::{PendingRequests, PersistTarget, Waiter};
use crate::domain::entities::{
    AssetKey, CachedImage, ImageLocator, ImageRequest, ImageSize, ImageSource, PersistPolicy,
    ResolvedImage,
};
use crate::domain::errors::{AssetError, AssetResult};
use crate::domain::ports::{ImageFetcherPort, PersistentStorePort, SubscriptionPort};
use crate::infrastructure::image::{CacheStats, MemoryImageCache};

/// Configuration for the request manager.
#[derive(Debug, Clone)]
pub struct ImageRequestConfig {
    /// Memory cache capacity; `None` keeps everything until cleared.
    pub memory_capacity: Option<usize>,
    /// Clear the memory cache on disable and stop caching late results.
    pub clear_cache_on_disable: bool,
}

impl Default for ImageRequestConfig {
    fn default() -> Self {
        Self {
            memory_capacity: None,
            clear_cache_on_disable: true,
        }
    }
}

/// Handle returned for every request.
#[derive(Debug)]
pub enum ImageTicket {
    /// Resolved without waiting.
    Ready(ResolvedImage),
    /// Waiting on a fetch.
    Pending(PendingImage),
}

impl ImageTicket {
    /// Returns true if the result is already available.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Interim lower-resolution image, if one was cached.
    #[must_use]
    pub const fn fallback(&self) -> Option<&CachedImage> {
        match self {
            Self::Ready(_) => None,
            Self::Pending(pending) => pending.fallback(),
        }
    }

    /// Waits for the final result.
    ///
    /// # Errors
    /// Returns the fetch error shared by every caller of this key.
    pub async fn resolve(self) -> AssetResult<ResolvedImage> {
        match self {
            Self::Ready(resolved) => Ok(resolved),
            Self::Pending(pending) => pending.wait().await,
        }
    }
}

/// A request waiting on an in-flight fetch.
#[derive(Debug)]
pub struct PendingImage {
    key: AssetKey,
    fallback: Option<CachedImage>,
    waiter: Waiter,
}

impl PendingImage {
    /// Requested key.
    #[must_use]
    pub const fn key(&self) -> &AssetKey {
        &self.key
    }

    /// Interim lower-resolution image, if one was cached.
    #[must_use]
    pub const fn fallback(&self) -> Option<&CachedImage> {
        self.fallback.as_ref()
    }

    /// Takes the interim image out of the ticket.
    pub fn take_fallback(&mut self) -> Option<CachedImage> {
        self.fallback.take()
    }

    /// Waits for the fetch to complete.
    ///
    /// # Errors
    /// Returns the fetch error, or `Dropped` if the fetch never reported back.
    pub async fn wait(self) -> AssetResult<ResolvedImage> {
        self.waiter.await.unwrap_or(Err(AssetError::Dropped))
    }
}

struct ManagerState {
    memory: MemoryImageCache,
    pending: PendingRequests,
    enabled: bool,
}

impl ManagerState {
    fn accepts_results(&self, config: &ImageRequestConfig) -> bool {
        self.enabled || !config.clear_cache_on_disable
    }
}

struct Inner {
    state: Mutex<ManagerState>,
    fetcher: Arc<dyn ImageFetcherPort>,
    store: Option<Arc<dyn PersistentStorePort>>,
    subscriptions: Arc<dyn SubscriptionPort>,
    config: ImageRequestConfig,
    /// Spawned fetch, prefetch and save tasks.
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

/// Resolves image requests through memory, persistent store and network.
///
/// Cheap to clone; clones share caches and in-flight fetches. The internal
/// lock is never held across an await point.
#[derive(Clone)]
pub struct ImageRequestManager {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ImageRequestManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageRequestManager")
            .field("config", &self.inner.config)
            .field("pending", &self.pending_count())
            .finish_non_exhaustive()
    }
}

impl ImageRequestManager {
    /// Creates an enabled manager.
    #[must_use]
    pub fn new(
        config: ImageRequestConfig,
        fetcher: Arc<dyn ImageFetcherPort>,
        store: Option<Arc<dyn PersistentStorePort>>,
        subscriptions: Arc<dyn SubscriptionPort>,
    ) -> Self {
        let state = ManagerState {
            memory: MemoryImageCache::new(config.memory_capacity),
            pending: PendingRequests::new(),
            enabled: true,
        };
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(state),
                fetcher,
                store,
                subscriptions,
                config,
                tasks: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Requests one image variant.
    ///
    /// Empty keys and memory hits resolve immediately. Otherwise the request
    /// joins an in-flight fetch, is served from the persistent store, or
    /// starts a new fetch.
    pub async fn request(&self, request: ImageRequest) -> ImageTicket {
        let ImageRequest {
            key,
            fallbacks,
            location,
            persist,
        } = request;

        if key.is_empty() {
            trace!("Empty image key, resolving without a fetch");
            return ImageTicket::Ready(ResolvedImage::empty(key));
        }

        let target = PersistTarget::new(location.clone(), persist);

        if let Some(ticket) = self.lookup(&key, &fallbacks, target.as_ref()) {
            return ticket;
        }

        if let (Some(store), Some(location)) = (&self.inner.store, &location)
            && let Some(image) = store.load(location).await
        {
            debug!(key = %key, "Serving image from persistent store");
            self.remember(&key, &image);
            return ImageTicket::Ready(ResolvedImage {
                key,
                image: Some(image),
                source: ImageSource::DiskCache,
            });
        }

        self.start_or_join(key, &fallbacks, target)
    }

    /// Requests an image and reports through callbacks.
    ///
    /// Ready results call `on_success` before returning. A fallback calls
    /// `on_fallback` before returning, so it always precedes the final
    /// callback, which is delivered from a spawned task.
    pub async fn request_with_callbacks<S, F, E>(
        &self,
        request: ImageRequest,
        on_success: S,
        on_fallback: F,
        on_error: E,
    ) where
        S: FnOnce(ResolvedImage) + Send + 'static,
        F: FnOnce(CachedImage),
        E: FnOnce(AssetError) + Send + 'static,
    {
        match self.request(request).await {
            ImageTicket::Ready(resolved) => on_success(resolved),
            ImageTicket::Pending(mut pending) => {
                if let Some(fallback) = pending.take_fallback() {
                    on_fallback(fallback);
                }
                tokio::spawn(async move {
                    match pending.wait().await {
                        Ok(resolved) => on_success(resolved),
                        Err(e) => on_error(e),
                    }
                });
            }
        }
    }

    /// Requests a mod logo.
    pub async fn request_mod_logo(
        &self,
        mod_id: u64,
        locator: &ImageLocator,
        size: ImageSize,
    ) -> ImageTicket {
        self.request(ImageRequest::mod_logo(mod_id, locator, size))
            .await
    }

    /// Requests one gallery image of a mod.
    pub async fn request_mod_gallery_image(
        &self,
        mod_id: u64,
        locator: &ImageLocator,
        size: ImageSize,
    ) -> ImageTicket {
        self.request(ImageRequest::mod_gallery_image(mod_id, locator, size))
            .await
    }

    /// Requests a user avatar.
    pub async fn request_user_avatar(
        &self,
        user_id: u64,
        locator: &ImageLocator,
        size: ImageSize,
    ) -> ImageTicket {
        self.request(ImageRequest::user_avatar(user_id, locator, size))
            .await
    }

    /// Requests the thumbnail of a YouTube video linked from a mod.
    pub async fn request_youtube_thumbnail(&self, mod_id: u64, video_id: &str) -> ImageTicket {
        self.request(ImageRequest::youtube_thumbnail(mod_id, video_id))
            .await
    }

    /// Warms the caches without waiting for results.
    pub fn prefetch(&self, requests: Vec<ImageRequest>) {
        for request in requests {
            let manager = self.clone();
            self.track(tokio::spawn(async move {
                let _ = manager.request(request).await;
            }));
        }
    }

    /// Waits for every background fetch and save started so far, including
    /// work those tasks start while this runs.
    ///
    /// Call before shutting the runtime down, or persisted images may never
    /// reach the store.
    pub async fn flush(&self) {
        loop {
            let tasks = std::mem::take(&mut *self.inner.tasks.lock());
            if tasks.is_empty() {
                break;
            }
            trace!(count = tasks.len(), "Waiting on background image tasks");
            for outcome in join_all(tasks).await {
                if let Err(e) = outcome {
                    warn!(error = %e, "Background image task failed");
                }
            }
        }
    }

    /// Marks the manager active again.
    pub fn enable(&self) {
        self.inner.state.lock().enabled = true;
        debug!("Image request manager enabled");
    }

    /// Marks the manager inactive.
    ///
    /// With `clear_cache_on_disable`, the memory cache is dropped and results
    /// arriving while disabled are delivered but not cached. In-flight
    /// fetches always complete.
    pub fn disable(&self) {
        let mut state = self.inner.state.lock();
        state.enabled = false;
        if self.inner.config.clear_cache_on_disable {
            state.memory.clear();
        }
        debug!(
            pending = state.pending.len(),
            "Image request manager disabled"
        );
    }

    /// Returns true while enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.inner.state.lock().enabled
    }

    /// Drops every image from the memory cache.
    pub fn clear(&self) {
        self.inner.state.lock().memory.clear();
        info!("Cleared image memory cache");
    }

    /// Returns a cached image without touching statistics.
    #[must_use]
    pub fn cached(&self, key: &AssetKey) -> Option<CachedImage> {
        self.inner.state.lock().memory.peek(key).cloned()
    }

    /// Returns true if a fetch for `key` is in flight.
    #[must_use]
    pub fn is_pending(&self, key: &AssetKey) -> bool {
        self.inner.state.lock().pending.contains(key)
    }

    /// Number of fetches in flight.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.state.lock().pending.len()
    }

    /// Memory cache statistics.
    #[must_use]
    pub fn memory_stats(&self) -> CacheStats {
        self.inner.state.lock().memory.stats()
    }

    /// Memory hit or join of an in-flight fetch.
    fn lookup(
        &self,
        key: &AssetKey,
        fallbacks: &[AssetKey],
        target: Option<&PersistTarget>,
    ) -> Option<ImageTicket> {
        let mut state = self.inner.state.lock();

        if let Some(image) = state.memory.get(key) {
            return Some(ImageTicket::Ready(ResolvedImage {
                key: key.clone(),
                image: Some(image),
                source: ImageSource::MemoryCache,
            }));
        }

        let waiter = state.pending.join(key, target.cloned())?;
        let fallback = resolve_fallback(&state.memory, fallbacks);
        Some(ImageTicket::Pending(PendingImage {
            key: key.clone(),
            fallback,
            waiter,
        }))
    }

    /// Registers a new fetch unless another caller won the race
    /// while the persistent store was consulted.
    fn start_or_join(
        &self,
        key: AssetKey,
        fallbacks: &[AssetKey],
        target: Option<PersistTarget>,
    ) -> ImageTicket {
        let mut state = self.inner.state.lock();

        if let Some(image) = state.memory.peek(&key).cloned() {
            return ImageTicket::Ready(ResolvedImage {
                key,
                image: Some(image),
                source: ImageSource::MemoryCache,
            });
        }

        let waiter = match state.pending.join(&key, target.clone()) {
            Some(waiter) => waiter,
            None => {
                let waiter = state.pending.start(key.clone(), target);
                debug!(key = %key, "Starting image fetch");
                self.spawn_fetch(key.clone());
                waiter
            }
        };
        let fallback = resolve_fallback(&state.memory, fallbacks);
        drop(state);

        ImageTicket::Pending(PendingImage {
            key,
            fallback,
            waiter,
        })
    }

    fn spawn_fetch(&self, key: AssetKey) {
        let manager = self.clone();
        self.track(tokio::spawn(async move {
            let fetch = AssertUnwindSafe(manager.inner.fetcher.fetch(&key)).catch_unwind();
            let result = fetch.await.unwrap_or_else(|_| {
                warn!(key = %key, "Image fetch panicked");
                Err(AssetError::Dropped)
            });
            manager.complete(&key, result);
        }));
    }

    /// Caches a finished fetch and fans it out to its waiters.
    ///
    /// The save is queued before any waiter wakes, so a caller that resolves
    /// its ticket and then calls `flush` always waits for it.
    fn complete(&self, key: &AssetKey, result: AssetResult<CachedImage>) {
        let pending = {
            let mut state = self.inner.state.lock();
            if let Ok(image) = &result
                && state.accepts_results(&self.inner.config)
            {
                state.memory.put(key.clone(), image.clone());
            }
            state.pending.take(key)
        };

        let Some(pending) = pending else {
            warn!(key = %key, "Fetch completed with no pending request");
            return;
        };

        if let (Ok(image), Some(target)) = (&result, pending.persist_target()) {
            self.persist(key, target.clone(), image.clone());
        }

        let resolved = result.map(|image| ResolvedImage {
            key: key.clone(),
            image: Some(image),
            source: ImageSource::Network,
        });

        let delivered = pending.deliver(&resolved);
        match &resolved {
            Ok(_) => debug!(key = %key, delivered, "Image fetch completed"),
            Err(e) => warn!(key = %key, delivered, error = %e, "Image fetch failed"),
        }
    }

    /// Saves a fetched image in the background if its policy allows it.
    fn persist(&self, key: &AssetKey, target: PersistTarget, image: CachedImage) {
        let Some(store) = self.inner.store.clone() else {
            return;
        };
        if !self.should_persist(target.policy) {
            trace!(key = %key, policy = ?target.policy, "Skipping persistence");
            return;
        }

        let key = key.clone();
        self.track(tokio::spawn(async move {
            if let Err(e) = store.save(&target.location, &image).await {
                warn!(key = %key, error = %e, "Failed to persist image");
            }
        }));
    }

    fn track(&self, task: JoinHandle<()>) {
        let mut tasks = self.inner.tasks.lock();
        tasks.retain(|running| !running.is_finished());
        tasks.push(task);
    }

    fn remember(&self, key: &AssetKey, image: &CachedImage) {
        let mut state = self.inner.state.lock();
        if state.accepts_results(&self.inner.config) {
            state.memory.put(key.clone(), image.clone());
        }
    }

    fn should_persist(&self, policy: PersistPolicy) -> bool {
        match policy {
            PersistPolicy::Never => false,
            PersistPolicy::Always => true,
            PersistPolicy::IfSubscribed(mod_id) => self.inner.subscriptions.is_subscribed(mod_id),
        }
    }
}
