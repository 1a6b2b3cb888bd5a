//! Requests for a single image variant.

use super::{AssetKey, CacheLocation, ImageLocator, ImageSize, PersistPolicy, youtube_thumbnail_url};

/// Everything the request manager needs to resolve one image variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    /// Key of the requested variant.
    pub key: AssetKey,
    /// Lower-resolution variants of the same image, best first.
    pub fallbacks: Vec<AssetKey>,
    /// Persistent store entry, if this image is persisted at all.
    pub location: Option<CacheLocation>,
    /// Whether a fetched result is saved to `location`.
    pub persist: PersistPolicy,
}

impl ImageRequest {
    /// Plain URL request: no fallback and memory caching only.
    #[must_use]
    pub fn url(key: impl Into<AssetKey>) -> Self {
        Self {
            key: key.into(),
            fallbacks: Vec::new(),
            location: None,
            persist: PersistPolicy::Never,
        }
    }

    /// A mod logo. Persisted while the mod is subscribed.
    #[must_use]
    pub fn mod_logo(mod_id: u64, locator: &ImageLocator, size: ImageSize) -> Self {
        Self {
            key: locator.key(size),
            fallbacks: fallback_keys(locator, size),
            location: Some(CacheLocation::ModLogo { mod_id, size }),
            persist: PersistPolicy::IfSubscribed(mod_id),
        }
    }

    /// One gallery image of a mod. Persisted while the mod is subscribed.
    #[must_use]
    pub fn mod_gallery_image(mod_id: u64, locator: &ImageLocator, size: ImageSize) -> Self {
        Self {
            key: locator.key(size),
            fallbacks: fallback_keys(locator, size),
            location: Some(CacheLocation::ModGalleryImage {
                mod_id,
                file_name: locator.filename.clone(),
                size,
            }),
            persist: PersistPolicy::IfSubscribed(mod_id),
        }
    }

    /// A user avatar. Always persisted.
    #[must_use]
    pub fn user_avatar(user_id: u64, locator: &ImageLocator, size: ImageSize) -> Self {
        Self {
            key: locator.key(size),
            fallbacks: fallback_keys(locator, size),
            location: Some(CacheLocation::UserAvatar { user_id, size }),
            persist: PersistPolicy::Always,
        }
    }

    /// Thumbnail of a YouTube video linked from a mod.
    #[must_use]
    pub fn youtube_thumbnail(mod_id: u64, video_id: &str) -> Self {
        let video_id = video_id.trim();
        let key = if video_id.is_empty() {
            AssetKey::empty()
        } else {
            AssetKey::new(youtube_thumbnail_url(video_id))
        };
        Self {
            key,
            fallbacks: Vec::new(),
            location: Some(CacheLocation::YouTubeThumbnail {
                mod_id,
                video_id: video_id.to_string(),
            }),
            persist: PersistPolicy::IfSubscribed(mod_id),
        }
    }

    /// Persists to the store under the URL digest.
    #[must_use]
    pub fn persisted(mut self) -> Self {
        if self.location.is_none() {
            self.location = Some(CacheLocation::Url(self.key.clone()));
        }
        self.persist = PersistPolicy::Always;
        self
    }

    /// Overrides the persist policy.
    #[must_use]
    pub const fn with_persist(mut self, persist: PersistPolicy) -> Self {
        self.persist = persist;
        self
    }
}

fn fallback_keys(locator: &ImageLocator, size: ImageSize) -> Vec<AssetKey> {
    locator
        .fallback_variants(size)
        .into_iter()
        .map(|(_, key)| key)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gallery_locator() -> ImageLocator {
        ImageLocator {
            filename: "shot.png".to_string(),
            original: Some("https://thumb.modcdn.io/g/shot.png".to_string()),
            thumb_320x180: Some("https://thumb.modcdn.io/g/crop_320x180/shot.png".to_string()),
            thumb_1280x720: Some("https://thumb.modcdn.io/g/crop_1280x720/shot.png".to_string()),
            ..ImageLocator::default()
        }
    }

    #[test]
    fn test_gallery_request() {
        let request = ImageRequest::mod_gallery_image(12, &gallery_locator(), ImageSize::Original);
        assert_eq!(request.key.as_str(), "https://thumb.modcdn.io/g/shot.png");
        assert_eq!(request.fallbacks.len(), 2);
        assert_eq!(
            request.fallbacks[0].as_str(),
            "https://thumb.modcdn.io/g/crop_1280x720/shot.png"
        );
        assert_eq!(request.persist, PersistPolicy::IfSubscribed(12));
    }

    #[test]
    fn test_missing_variant_is_empty_key() {
        let request = ImageRequest::mod_logo(1, &gallery_locator(), ImageSize::Thumb640x360);
        assert!(request.key.is_empty());
        assert_eq!(request.fallbacks.len(), 1);
    }

    #[test]
    fn test_youtube_request() {
        let request = ImageRequest::youtube_thumbnail(4, "dQw4w9WgXcQ");
        assert_eq!(
            request.key.as_str(),
            "https://img.youtube.com/vi/dQw4w9WgXcQ/hqdefault.jpg"
        );
        assert!(ImageRequest::youtube_thumbnail(4, "  ").key.is_empty());
    }

    #[test]
    fn test_persisted_url_request() {
        let request = ImageRequest::url("https://example.com/a.png").persisted();
        assert_eq!(request.persist, PersistPolicy::Always);
        assert!(matches!(request.location, Some(CacheLocation::Url(_))));
    }
}
