//! Mod profile error types.

use thiserror::Error;

/// Errors returned while requesting mod profiles.
#[derive(Debug, Clone, Error)]
#[allow(missing_docs)]
pub enum ProfileError {
    #[error("mod {mod_id} not found")]
    NotFound { mod_id: u64 },

    #[error("network error while requesting profiles: {message}")]
    Network { message: String },

    #[error("invalid response: {message}")]
    InvalidResponse { message: String },
}

impl ProfileError {
    /// Creates network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates invalid response error.
    #[must_use]
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }
}
