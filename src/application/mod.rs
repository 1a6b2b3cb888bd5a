//! Application layer with the request managers.

/// Request deduplication, fallback and profile caching services.
pub mod services;

pub use services::{
    ImageRequestConfig, ImageRequestManager, ImageTicket, PendingImage, ProfileRequestManager,
};
