//! Mod profile entity.

use serde::{Deserialize, Serialize};

use super::{ImageLocator, ImageRequest, ImageSize, extract_youtube_id};

/// Media attached to a mod profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModMedia {
    /// Gallery images.
    pub images: Vec<ImageLocator>,
    /// YouTube video URLs.
    pub youtube: Vec<String>,
}

/// The subset of a mod.io mod object the image layer cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModProfile {
    /// Mod id.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// URL slug.
    #[serde(default)]
    pub name_id: String,
    /// Short description.
    #[serde(default)]
    pub summary: String,
    /// Unix timestamp of the last update.
    #[serde(default)]
    pub date_updated: i64,
    /// Logo variants.
    #[serde(default)]
    pub logo: ImageLocator,
    /// Gallery and video links.
    #[serde(default)]
    pub media: ModMedia,
}

impl ModProfile {
    /// Request for this mod's logo.
    #[must_use]
    pub fn logo_request(&self, size: ImageSize) -> ImageRequest {
        ImageRequest::mod_logo(self.id, &self.logo, size)
    }

    /// Requests for every gallery image at `size`.
    #[must_use]
    pub fn gallery_requests(&self, size: ImageSize) -> Vec<ImageRequest> {
        self.media
            .images
            .iter()
            .map(|locator| ImageRequest::mod_gallery_image(self.id, locator, size))
            .collect()
    }

    /// Thumbnail requests for the linked YouTube videos.
    /// Links without a recognisable video id are skipped.
    #[must_use]
    pub fn youtube_requests(&self) -> Vec<ImageRequest> {
        self.media
            .youtube
            .iter()
            .filter_map(|link| extract_youtube_id(link))
            .map(|video_id| ImageRequest::youtube_thumbnail(self.id, &video_id))
            .collect()
    }
}
