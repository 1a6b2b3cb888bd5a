//! Domain error types.

mod asset_error;
mod profile_error;

pub use asset_error::{AssetError, AssetResult};
pub use profile_error::ProfileError;
