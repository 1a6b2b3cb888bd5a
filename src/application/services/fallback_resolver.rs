//! Picks an interim image while a higher resolution is in flight.

use crate::domain::entities::{AssetKey, CachedImage};
use crate::infrastructure::image::MemoryImageCache;

/// Returns the best cached variant among `candidates`.
///
/// Candidates are ordered best first; the first one present in memory wins.
/// Peeking keeps fallbacks from skewing recency or hit statistics.
#[must_use]
pub fn resolve_fallback(memory: &MemoryImageCache, candidates: &[AssetKey]) -> Option<CachedImage> {
    candidates
        .iter()
        .filter(|key| !key.is_empty())
        .find_map(|key| memory.peek(key).cloned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn img(side: u32) -> CachedImage {
        CachedImage::new(image::DynamicImage::new_rgb8(side, side), Vec::new())
    }

    #[test]
    fn test_prefers_first_cached_candidate() {
        let mut memory = MemoryImageCache::unbounded();
        let large = AssetKey::new("1280");
        let small = AssetKey::new("320");
        memory.put(small.clone(), img(320));
        memory.put(large.clone(), img(1280));

        let fallback = resolve_fallback(&memory, &[large, small]).unwrap();
        assert_eq!(fallback.width(), 1280);
    }

    #[test]
    fn test_skips_uncached_candidates() {
        let mut memory = MemoryImageCache::unbounded();
        let small = AssetKey::new("320");
        memory.put(small.clone(), img(320));

        let fallback = resolve_fallback(&memory, &[AssetKey::new("1280"), small]).unwrap();
        assert_eq!(fallback.width(), 320);
    }

    #[test]
    fn test_no_candidates() {
        let memory = MemoryImageCache::unbounded();
        assert!(resolve_fallback(&memory, &[]).is_none());
        assert!(resolve_fallback(&memory, &[AssetKey::empty()]).is_none());
        assert_eq!(memory.stats().misses, 0);
    }
}
