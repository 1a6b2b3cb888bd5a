mod image_fetcher_port;
mod mod_profile_source;
mod persistent_store_port;
mod subscription_port;

pub use image_fetcher_port::ImageFetcherPort;
pub use mod_profile_source::ModProfileSource;
pub use persistent_store_port::PersistentStorePort;
pub use subscription_port::SubscriptionPort;
