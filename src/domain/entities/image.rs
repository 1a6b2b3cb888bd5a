//! Domain types for mod.io images.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, LazyLock};

use bytes::Bytes;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::AssetKey;

/// Sized variants mod.io serves for an image, smallest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ImageSize {
    /// Avatar thumbnail.
    #[serde(rename = "thumb_50x50")]
    Thumb50x50,
    /// Avatar thumbnail.
    #[serde(rename = "thumb_100x100")]
    Thumb100x100,
    /// Logo and gallery thumbnail.
    #[serde(rename = "thumb_320x180")]
    Thumb320x180,
    /// Logo thumbnail.
    #[serde(rename = "thumb_640x360")]
    Thumb640x360,
    /// Logo and gallery thumbnail.
    #[serde(rename = "thumb_1280x720")]
    Thumb1280x720,
    /// Full resolution upload.
    #[serde(rename = "original")]
    Original,
}

impl ImageSize {
    /// Every size, smallest first.
    pub const ALL: [Self; 6] = [
        Self::Thumb50x50,
        Self::Thumb100x100,
        Self::Thumb320x180,
        Self::Thumb640x360,
        Self::Thumb1280x720,
        Self::Original,
    ];

    /// Field name used by the mod.io API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Thumb50x50 => "thumb_50x50",
            Self::Thumb100x100 => "thumb_100x100",
            Self::Thumb320x180 => "thumb_320x180",
            Self::Thumb640x360 => "thumb_640x360",
            Self::Thumb1280x720 => "thumb_1280x720",
            Self::Original => "original",
        }
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown size name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown image size: {0}")]
pub struct ParseImageSizeError(String);

impl FromStr for ImageSize {
    type Err = ParseImageSizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let prefixed = format!("thumb_{normalized}");
        Self::ALL
            .into_iter()
            .find(|size| size.as_str() == normalized || size.as_str() == prefixed)
            .ok_or_else(|| ParseImageSizeError(s.to_string()))
    }
}

/// Image object as returned by the mod.io API: one URL per available size.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageLocator {
    /// Uploaded file name.
    pub filename: String,
    /// Full resolution URL.
    pub original: Option<String>,
    /// 50x50 URL (avatars).
    pub thumb_50x50: Option<String>,
    /// 100x100 URL (avatars).
    pub thumb_100x100: Option<String>,
    /// 320x180 URL (logos, gallery).
    pub thumb_320x180: Option<String>,
    /// 640x360 URL (logos).
    pub thumb_640x360: Option<String>,
    /// 1280x720 URL (logos, gallery).
    pub thumb_1280x720: Option<String>,
}

impl ImageLocator {
    /// Returns the URL of a variant, if the variant exists.
    #[must_use]
    pub fn url(&self, size: ImageSize) -> Option<&str> {
        let url = match size {
            ImageSize::Thumb50x50 => self.thumb_50x50.as_deref(),
            ImageSize::Thumb100x100 => self.thumb_100x100.as_deref(),
            ImageSize::Thumb320x180 => self.thumb_320x180.as_deref(),
            ImageSize::Thumb640x360 => self.thumb_640x360.as_deref(),
            ImageSize::Thumb1280x720 => self.thumb_1280x720.as_deref(),
            ImageSize::Original => self.original.as_deref(),
        };
        url.filter(|u| !u.trim().is_empty())
    }

    /// Key of a variant. Missing variants yield the empty key.
    #[must_use]
    pub fn key(&self, size: ImageSize) -> AssetKey {
        AssetKey::from(self.url(size))
    }

    /// Sizes that have a URL, smallest first.
    #[must_use]
    pub fn available_sizes(&self) -> Vec<ImageSize> {
        ImageSize::ALL
            .into_iter()
            .filter(|size| self.url(*size).is_some())
            .collect()
    }

    /// Lower-resolution variants of `size`, best first.
    #[must_use]
    pub fn fallback_variants(&self, size: ImageSize) -> Vec<(ImageSize, AssetKey)> {
        ImageSize::ALL
            .into_iter()
            .rev()
            .filter(|candidate| *candidate < size)
            .filter_map(|candidate| {
                self.url(candidate)
                    .map(|url| (candidate, AssetKey::new(url)))
            })
            .collect()
    }
}

/// Where an image's encoded bytes live in the persistent store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheLocation {
    /// A mod's logo.
    ModLogo { mod_id: u64, size: ImageSize },
    /// One image from a mod's gallery.
    ModGalleryImage {
        mod_id: u64,
        file_name: String,
        size: ImageSize,
    },
    /// A user's avatar.
    UserAvatar { user_id: u64, size: ImageSize },
    /// Thumbnail of a YouTube video attached to a mod.
    YouTubeThumbnail { mod_id: u64, video_id: String },
    /// Any other image, stored by URL digest.
    Url(AssetKey),
}

impl CacheLocation {
    /// Path of this entry relative to the store root.
    #[must_use]
    pub fn relative_path(&self) -> PathBuf {
        match self {
            Self::ModLogo { mod_id, size } => PathBuf::from("mods")
                .join(mod_id.to_string())
                .join("logo")
                .join(format!("{size}.img")),
            Self::ModGalleryImage {
                mod_id,
                file_name,
                size,
            } => PathBuf::from("mods")
                .join(mod_id.to_string())
                .join("gallery")
                .join(size.as_str())
                .join(format!("{}.img", sanitize_component(file_name))),
            Self::UserAvatar { user_id, size } => PathBuf::from("users")
                .join(user_id.to_string())
                .join("avatar")
                .join(format!("{size}.img")),
            Self::YouTubeThumbnail { mod_id, video_id } => PathBuf::from("mods")
                .join(mod_id.to_string())
                .join("youtube")
                .join(format!("{}.img", sanitize_component(video_id))),
            Self::Url(key) => PathBuf::from("urls").join(format!("{}.img", key.digest())),
        }
    }

    /// Mod that owns this entry, if any.
    #[must_use]
    pub const fn mod_id(&self) -> Option<u64> {
        match self {
            Self::ModLogo { mod_id, .. }
            | Self::ModGalleryImage { mod_id, .. }
            | Self::YouTubeThumbnail { mod_id, .. } => Some(*mod_id),
            Self::UserAvatar { .. } | Self::Url(_) => None,
        }
    }
}

/// Replaces anything that could escape a directory.
fn sanitize_component(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Thumbnail URL YouTube serves for a video id.
#[must_use]
pub fn youtube_thumbnail_url(video_id: &str) -> String {
    format!("https://img.youtube.com/vi/{video_id}/hqdefault.jpg")
}

static YOUTUBE_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:youtube\.com/(?:watch\?(?:.*&)?v=|embed/|shorts/|v/)|youtu\.be/)([A-Za-z0-9_-]{11})",
    )
    .expect("valid regex")
});

/// Extracts the video id from a YouTube link.
#[must_use]
pub fn extract_youtube_id(url: &str) -> Option<String> {
    YOUTUBE_ID_RE
        .captures(url.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Whether a freshly fetched image is written to the persistent store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PersistPolicy {
    /// Memory only.
    #[default]
    Never,
    /// Always persist.
    Always,
    /// Persist only while the user is subscribed to the mod.
    IfSubscribed(u64),
}

/// A decoded image together with the bytes it was decoded from.
#[derive(Clone)]
pub struct CachedImage {
    /// Decoded pixels.
    pub image: Arc<image::DynamicImage>,
    /// Original encoded bytes.
    pub bytes: Bytes,
}

impl CachedImage {
    /// Wraps a decoded image and its encoded bytes.
    #[must_use]
    pub fn new(image: image::DynamicImage, bytes: impl Into<Bytes>) -> Self {
        Self {
            image: Arc::new(image),
            bytes: bytes.into(),
        }
    }

    /// Decodes encoded bytes.
    ///
    /// # Errors
    /// Returns the decoder error if the bytes are not a supported image.
    pub fn decode(bytes: impl Into<Bytes>) -> image::ImageResult<Self> {
        let bytes = bytes.into();
        let image = image::load_from_memory(&bytes)?;
        Ok(Self {
            image: Arc::new(image),
            bytes,
        })
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Returns true if both handles share the same decoded image.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.image, &other.image)
    }
}

impl std::fmt::Debug for CachedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedImage")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Where a resolved image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    /// Empty key, nothing was loaded.
    Empty,
    /// Loaded from the in-memory cache.
    MemoryCache,
    /// Loaded from the persistent store.
    DiskCache,
    /// Downloaded from the network.
    Network,
}

impl std::fmt::Display for ImageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty"),
            Self::MemoryCache => write!(f, "memory"),
            Self::DiskCache => write!(f, "disk"),
            Self::Network => write!(f, "network"),
        }
    }
}

/// Final outcome of an image request.
#[derive(Debug, Clone)]
pub struct ResolvedImage {
    /// Requested key.
    pub key: AssetKey,
    /// The image; `None` only for the empty key.
    pub image: Option<CachedImage>,
    /// Where it came from.
    pub source: ImageSource,
}

impl ResolvedImage {
    /// Result for the empty key.
    #[must_use]
    pub fn empty(key: AssetKey) -> Self {
        Self {
            key,
            image: None,
            source: ImageSource::Empty,
        }
    }
}
