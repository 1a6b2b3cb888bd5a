//! Canonical asset keys.

/// Canonical key of one sized image variant: its download URL.
///
/// An empty key is valid and stands for "no asset"; requesting it resolves
/// to an empty result without touching any cache or the network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetKey(String);

impl AssetKey {
    /// Creates a key from a URL. Surrounding whitespace is dropped.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let trimmed = url.trim();
        if trimmed.len() == url.len() {
            Self(url)
        } else {
            Self(trimmed.to_string())
        }
    }

    /// Returns the empty key.
    #[must_use]
    pub const fn empty() -> Self {
        Self(String::new())
    }

    /// Returns true for the empty key.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the URL.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short stable digest of the URL, safe to use as a file name.
    #[must_use]
    pub fn digest(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(self.0.as_bytes());
        let result = hasher.finalize();
        hex::encode(&result[..16])
    }
}

impl std::fmt::Display for AssetKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AssetKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for AssetKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<Option<&str>> for AssetKey {
    fn from(s: Option<&str>) -> Self {
        s.map_or_else(Self::empty, Self::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_only_is_empty() {
        assert!(AssetKey::new("   ").is_empty());
        assert!(AssetKey::from(None).is_empty());
    }

    #[test]
    fn test_digest_is_stable() {
        let url = "https://thumb.modcdn.io/mods/1/2/logo.png";
        let a = AssetKey::new(url);
        let b = AssetKey::new(format!(" {url} "));
        assert_eq!(a, b);
        assert_eq!(a.digest(), b.digest());
        assert_eq!(a.digest().len(), 32);
    }
}
