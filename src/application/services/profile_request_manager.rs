//! Cache of mod profiles fed by paged API requests.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::domain::entities::{ImageRequest, ImageSize, ModProfile, PageQuery, RequestPage};
use crate::domain::errors::ProfileError;
use crate::domain::ports::ModProfileSource;

/// Serves mod profiles from memory and fetches only what is missing.
#[derive(Clone)]
pub struct ProfileRequestManager {
    source: Arc<dyn ModProfileSource>,
    profiles: Arc<RwLock<HashMap<u64, ModProfile>>>,
}

impl std::fmt::Debug for ProfileRequestManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileRequestManager")
            .field("cached", &self.len())
            .finish_non_exhaustive()
    }
}

impl ProfileRequestManager {
    /// Creates a manager with an empty cache.
    #[must_use]
    pub fn new(source: Arc<dyn ModProfileSource>) -> Self {
        Self {
            source,
            profiles: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Fetches one page and caches every profile on it.
    ///
    /// # Errors
    /// Returns the source error.
    pub async fn fetch_page(&self, query: &PageQuery) -> Result<RequestPage<ModProfile>, ProfileError> {
        let page = self.source.fetch_page(query).await?;
        debug!(
            offset = page.result_offset,
            count = page.result_count,
            total = page.result_total,
            "Fetched mod profile page"
        );
        self.store(page.data.iter().cloned());
        Ok(page)
    }

    /// Returns one profile, fetching it if not cached.
    ///
    /// # Errors
    /// Returns `NotFound` if the source does not know the id.
    pub async fn request_mod_profile(&self, mod_id: u64) -> Result<ModProfile, ProfileError> {
        if let Some(profile) = self.cached(mod_id) {
            trace!(mod_id, "Profile cache hit");
            return Ok(profile);
        }

        self.source
            .fetch_by_ids(&[mod_id])
            .await?
            .into_iter()
            .find(|profile| profile.id == mod_id)
            .map(|profile| {
                self.store([profile.clone()]);
                profile
            })
            .ok_or(ProfileError::NotFound { mod_id })
    }

    /// Returns profiles in the requested order, fetching missing ones in a
    /// single call. Ids the source doesn't know are left out.
    ///
    /// # Errors
    /// Returns the source error if the missing profiles cannot be fetched.
    pub async fn request_mod_profiles(&self, ids: &[u64]) -> Result<Vec<ModProfile>, ProfileError> {
        let missing: Vec<u64> = {
            let profiles = self.profiles.read();
            let mut missing: Vec<u64> = ids
                .iter()
                .copied()
                .filter(|id| !profiles.contains_key(id))
                .collect();
            missing.sort_unstable();
            missing.dedup();
            missing
        };

        if !missing.is_empty() {
            debug!(requested = ids.len(), missing = missing.len(), "Fetching missing profiles");
            let fetched = self.source.fetch_by_ids(&missing).await?;
            self.store(fetched);
        }

        let profiles = self.profiles.read();
        Ok(ids
            .iter()
            .filter_map(|id| profiles.get(id).cloned())
            .collect())
    }

    /// Returns a cached profile.
    #[must_use]
    pub fn cached(&self, mod_id: u64) -> Option<ModProfile> {
        self.profiles.read().get(&mod_id).cloned()
    }

    /// Logo request for a cached profile.
    #[must_use]
    pub fn logo_request(&self, mod_id: u64, size: ImageSize) -> Option<ImageRequest> {
        self.profiles
            .read()
            .get(&mod_id)
            .map(|profile| profile.logo_request(size))
    }

    /// Number of cached profiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.read().len()
    }

    /// Returns true if no profile is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every cached profile.
    pub fn clear(&self) {
        self.profiles.write().clear();
        debug!("Cleared profile cache");
    }

    fn store(&self, profiles: impl IntoIterator<Item = ModProfile>) {
        let mut cache = self.profiles.write();
        for profile in profiles {
            cache.insert(profile.id, profile);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ImageLocator;
    use crate::domain::ports::mocks::MockModProfileSource;

    fn profile(id: u64) -> ModProfile {
        ModProfile {
            id,
            name: format!("Mod {id}"),
            name_id: format!("mod-{id}"),
            summary: String::new(),
            date_updated: 0,
            logo: ImageLocator {
                filename: "logo.png".to_string(),
                original: Some(format!("https://thumb.modcdn.io/{id}/logo.png")),
                ..ImageLocator::default()
            },
            media: crate::domain::entities::ModMedia::default(),
        }
    }

    #[tokio::test]
    async fn test_fetch_page_populates_cache() {
        let mut source = MockModProfileSource::new();
        source
            .expect_fetch_page()
            .times(1)
            .returning(|query| {
                Ok(RequestPage::new(
                    vec![profile(1), profile(2)],
                    query.offset,
                    query.limit,
                    2,
                ))
            });
        source.expect_fetch_by_ids().never();

        let manager = ProfileRequestManager::new(Arc::new(source));
        let page = manager.fetch_page(&PageQuery::new(0, 20)).await.unwrap();

        assert_eq!(page.result_count, 2);
        assert_eq!(manager.len(), 2);
        assert_eq!(manager.request_mod_profile(2).await.unwrap().name, "Mod 2");
    }

    #[tokio::test]
    async fn test_only_missing_ids_are_fetched() {
        let mut source = MockModProfileSource::new();
        source
            .expect_fetch_page()
            .returning(|_| Ok(RequestPage::new(vec![profile(1)], 0, 1, 1)));
        source
            .expect_fetch_by_ids()
            .withf(|ids| ids.to_vec() == vec![2u64, 3])
            .times(1)
            .returning(|_| Ok(vec![profile(3), profile(2)]));

        let manager = ProfileRequestManager::new(Arc::new(source));
        manager.fetch_page(&PageQuery::new(0, 1)).await.unwrap();

        let profiles = manager.request_mod_profiles(&[3, 1, 2, 3]).await.unwrap();
        let ids: Vec<u64> = profiles.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![3, 1, 2, 3]);

        let again = manager.request_mod_profiles(&[1, 2]).await.unwrap();
        assert_eq!(again.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_profile_is_not_found() {
        let mut source = MockModProfileSource::new();
        source.expect_fetch_by_ids().returning(|_| Ok(Vec::new()));

        let manager = ProfileRequestManager::new(Arc::new(source));
        let err = manager.request_mod_profile(42).await.unwrap_err();

        assert!(matches!(err, ProfileError::NotFound { mod_id: 42 }));
        assert!(manager.request_mod_profiles(&[42]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_source_errors_propagate() {
        let mut source = MockModProfileSource::new();
        source
            .expect_fetch_by_ids()
            .returning(|_| Err(ProfileError::network("timeout")));

        let manager = ProfileRequestManager::new(Arc::new(source));
        assert!(matches!(
            manager.request_mod_profiles(&[1]).await,
            Err(ProfileError::Network { .. })
        ));
        assert!(manager.is_empty());
    }

    #[tokio::test]
    async fn test_logo_request_and_clear() {
        let mut source = MockModProfileSource::new();
        source
            .expect_fetch_by_ids()
            .times(2)
            .returning(|ids| Ok(ids.iter().map(|id| profile(*id)).collect()));

        let manager = ProfileRequestManager::new(Arc::new(source));
        manager.request_mod_profile(5).await.unwrap();

        let request = manager.logo_request(5, ImageSize::Original).unwrap();
        assert_eq!(request.key.as_str(), "https://thumb.modcdn.io/5/logo.png");

        manager.clear();
        assert!(manager.logo_request(5, ImageSize::Original).is_none());
        manager.request_mod_profile(5).await.unwrap();
    }
}
