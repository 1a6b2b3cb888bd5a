//! Bookkeeping for in-flight image fetches.

use std::collections::HashMap;

use tokio::sync::oneshot;
use tracing::trace;

use crate::domain::entities::{AssetKey, CacheLocation, PersistPolicy, ResolvedImage};
use crate::domain::errors::AssetResult;

/// Receiving half handed to each caller waiting on a fetch.
pub type Waiter = oneshot::Receiver<AssetResult<ResolvedImage>>;

/// Where and under which policy a fetched image should be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistTarget {
    /// Persistent store entry.
    pub location: CacheLocation,
    /// Policy checked once the image arrives.
    pub policy: PersistPolicy,
}

impl PersistTarget {
    /// Builds a target unless the policy never persists.
    #[must_use]
    pub fn new(location: Option<CacheLocation>, policy: PersistPolicy) -> Option<Self> {
        match (location, policy) {
            (_, PersistPolicy::Never) | (None, _) => None,
            (Some(location), policy) => Some(Self { location, policy }),
        }
    }
}

/// One in-flight fetch and everyone waiting on it.
#[derive(Debug, Default)]
pub struct PendingRequest {
    waiters: Vec<oneshot::Sender<AssetResult<ResolvedImage>>>,
    persist: Option<PersistTarget>,
}

impl PendingRequest {
    /// Number of callers waiting.
    #[must_use]
    pub fn waiter_count(&self) -> usize {
        self.waiters.len()
    }

    /// Persist target registered for this fetch.
    #[must_use]
    pub const fn persist_target(&self) -> Option<&PersistTarget> {
        self.persist.as_ref()
    }

    /// Sends the result to every waiter exactly once.
    /// Returns how many waiters were still listening.
    pub fn deliver(self, result: &AssetResult<ResolvedImage>) -> usize {
        self.waiters
            .into_iter()
            .map(|waiter| waiter.send(result.clone()))
            .filter(Result::is_ok)
            .count()
    }
}

/// In-flight fetches keyed by asset key.
#[derive(Debug, Default)]
pub struct PendingRequests {
    entries: HashMap<AssetKey, PendingRequest>,
}

impl PendingRequests {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if a fetch for `key` is in flight.
    #[must_use]
    pub fn contains(&self, key: &AssetKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of in-flight fetches.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Joins the fetch for `key` if one is in flight.
    ///
    /// A persist target is only taken when the fetch has none yet.
    pub fn join(&mut self, key: &AssetKey, persist: Option<PersistTarget>) -> Option<Waiter> {
        let entry = self.entries.get_mut(key)?;
        let (tx, rx) = oneshot::channel();
        entry.waiters.push(tx);
        if entry.persist.is_none() {
            entry.persist = persist;
        }
        trace!(key = %key, waiters = entry.waiters.len(), "Joined pending request");
        Some(rx)
    }

    /// Registers a new fetch for `key` with one waiter.
    ///
    /// The caller must have checked that nothing is in flight for `key`.
    pub fn start(&mut self, key: AssetKey, persist: Option<PersistTarget>) -> Waiter {
        let (tx, rx) = oneshot::channel();
        let previous = self.entries.insert(
            key,
            PendingRequest {
                waiters: vec![tx],
                persist,
            },
        );
        debug_assert!(previous.is_none(), "fetch already in flight");
        rx
    }

    /// Removes and returns the fetch for `key`.
    pub fn take(&mut self, key: &AssetKey) -> Option<PendingRequest> {
        self.entries.remove(key)
    }
}
