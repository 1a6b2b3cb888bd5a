//! modio-asset-cache - keyed image cache for mod.io assets.
//!
//! This crate resolves mod logos, gallery images, avatars and YouTube
//! thumbnails through a memory cache, an optional disk cache and a
//! deduplicating network fetch, serving lower-resolution fallbacks while a
//! download is in flight.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing the request managers.
pub mod application;
/// Domain layer containing entities, errors, and port definitions.
pub mod domain;
/// Infrastructure layer containing adapters for external services.
pub mod infrastructure;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "modio-asset-cache";
