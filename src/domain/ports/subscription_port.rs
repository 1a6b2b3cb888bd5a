//! Port answering whether the user is subscribed to a mod.

/// Source of the current user's mod subscriptions.
#[cfg_attr(test, mockall::automock)]
pub trait SubscriptionPort: Send + Sync {
    /// Returns true if the user is subscribed to `mod_id`.
    fn is_subscribed(&self, mod_id: u64) -> bool;
}
