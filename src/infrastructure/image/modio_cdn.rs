//! mod.io and YouTube URL helpers.

pub use crate::domain::entities::{extract_youtube_id, youtube_thumbnail_url};

/// Hosts mod.io serves images from.
const MODIO_IMAGE_HOSTS: &[&str] = &["thumb.modcdn.io", "image.modcdn.io", "static.mod.io"];

/// Checks if a URL points at a mod.io image host.
#[must_use]
pub fn is_modio_image_url(url: &str) -> bool {
    reqwest::Url::parse(url).is_ok_and(|parsed| {
        parsed
            .host_str()
            .is_some_and(|host| MODIO_IMAGE_HOSTS.contains(&host))
    })
}

/// Thumbnail URL for a YouTube link, if the link carries a video id.
#[must_use]
pub fn youtube_thumbnail_for_link(url: &str) -> Option<String> {
    extract_youtube_id(url).map(|id| youtube_thumbnail_url(&id))
}
