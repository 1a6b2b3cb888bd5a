//! Port for fetching mod profiles from the API.

use async_trait::async_trait;

use crate::domain::entities::{ModProfile, PageQuery, RequestPage};
use crate::domain::errors::ProfileError;

/// Remote source of mod profiles.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModProfileSource: Send + Sync {
    /// Fetches one page of profiles.
    async fn fetch_page(&self, query: &PageQuery) -> Result<RequestPage<ModProfile>, ProfileError>;

    /// Fetches the profiles with the given ids. Unknown ids are omitted.
    async fn fetch_by_ids(&self, ids: &[u64]) -> Result<Vec<ModProfile>, ProfileError>;
}
