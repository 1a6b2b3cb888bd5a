//! In-memory record of the user's mod subscriptions.

use std::collections::HashSet;

use parking_lot::RwLock;
use tracing::debug;

use crate::domain::ports::SubscriptionPort;

/// Set of subscribed mod ids.
#[derive(Debug, Default)]
pub struct SubscribedMods {
    ids: RwLock<HashSet<u64>>,
}

impl SubscribedMods {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to a mod. Returns false if already subscribed.
    pub fn subscribe(&self, mod_id: u64) -> bool {
        let added = self.ids.write().insert(mod_id);
        if added {
            debug!(mod_id, "Subscribed to mod");
        }
        added
    }

    /// Unsubscribes from a mod. Returns false if not subscribed.
    pub fn unsubscribe(&self, mod_id: u64) -> bool {
        let removed = self.ids.write().remove(&mod_id);
        if removed {
            debug!(mod_id, "Unsubscribed from mod");
        }
        removed
    }

    /// Replaces the whole set.
    pub fn replace(&self, ids: impl IntoIterator<Item = u64>) {
        let mut guard = self.ids.write();
        *guard = ids.into_iter().collect();
        debug!(count = guard.len(), "Replaced subscriptions");
    }

    /// Subscribed ids, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.ids.read().iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Number of subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.read().len()
    }

    /// Returns true if there are no subscriptions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<u64> for SubscribedMods {
    fn from_iter<T: IntoIterator<Item = u64>>(iter: T) -> Self {
        Self {
            ids: RwLock::new(iter.into_iter().collect()),
        }
    }
}

impl SubscriptionPort for SubscribedMods {
    fn is_subscribed(&self, mod_id: u64) -> bool {
        self.ids.read().contains(&mod_id)
    }
}
