//! Domain layer with core entities, errors and port definitions.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Port definitions.
pub mod ports;

pub use entities::{AssetKey, CachedImage, ImageLocator, ImageRequest, ImageSize, ResolvedImage};
pub use errors::{AssetError, ProfileError};
pub use ports::{ImageFetcherPort, ModProfileSource, PersistentStorePort, SubscriptionPort};
