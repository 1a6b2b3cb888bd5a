//! Image fetch and cache error types.

use thiserror::Error;

/// Result alias for image operations.
pub type AssetResult<T> = std::result::Result<T, AssetError>;

/// Errors surfaced by the image pipeline.
///
/// `Clone` so one failed fetch can be delivered to every waiting caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum AssetError {
    #[error("network error: {message}")]
    Network { message: String },

    #[error("HTTP {status} fetching {url}")]
    Http { status: u16, url: String },

    #[error("failed to decode image: {message}")]
    Decode { message: String },

    #[error("io error: {message}")]
    Io { message: String },

    #[error("fetch ended without delivering a result")]
    Dropped,
}

impl AssetError {
    /// Creates network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates decode error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Creates io error.
    #[must_use]
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Returns whether the error came from fetching the image.
    #[must_use]
    pub const fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::Http { .. } | Self::Decode { .. }
        )
    }

    /// Returns whether retrying later could succeed.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::Network { .. } | Self::Dropped => true,
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            Self::Decode { .. } | Self::Io { .. } => false,
        }
    }
}

impl From<std::io::Error> for AssetError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable() {
        assert!(AssetError::network("reset").is_recoverable());
        assert!(
            AssetError::Http {
                status: 503,
                url: String::new()
            }
            .is_recoverable()
        );
        assert!(
            !AssetError::Http {
                status: 404,
                url: String::new()
            }
            .is_recoverable()
        );
        assert!(!AssetError::decode("bad magic").is_recoverable());
    }

    #[test]
    fn test_fetch_failure_grouping() {
        assert!(AssetError::decode("x").is_fetch_failure());
        assert!(!AssetError::io("x").is_fetch_failure());
        assert!(!AssetError::Dropped.is_fetch_failure());
    }
}
