//! Domain entity definitions.

mod asset_key;
mod image;
mod image_request;
mod mod_profile;
mod request_page;

pub use asset_key::AssetKey;
pub use image::{
    CacheLocation, CachedImage, ImageLocator, ImageSize, ImageSource, ParseImageSizeError,
    PersistPolicy, ResolvedImage, extract_youtube_id, youtube_thumbnail_url,
};
pub use image_request::ImageRequest;
pub use mod_profile::{ModMedia, ModProfile};
pub use request_page::{MAX_PAGE_SIZE, PageQuery, RequestPage};
