//! Memoised markdown rendering keyed by body content.

use crate::markdown::{MarkdownProcessor, PIPELINE_VERSION};
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;

type CacheKey = [u8; 32];

/// LRU cache in front of [`MarkdownProcessor::render`].
///
/// Keys hash the pipeline version together with the raw body, so a changed
/// article or a pipeline change is a miss. Rendering is pure, so a hit is
/// byte-identical to a fresh render.
pub struct RenderCache {
    processor: MarkdownProcessor,
    entries: Option<Mutex<LruCache<CacheKey, String>>>,
}

impl RenderCache {
    /// A capacity of 0 disables caching
    pub fn new(capacity: usize) -> Self {
        Self {
            processor: MarkdownProcessor::new(),
            entries: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
        }
    }

    pub fn render(&self, raw_body: &str) -> String {
        let Some(entries) = &self.entries else {
            return self.processor.render(raw_body);
        };

        let key = cache_key(raw_body);
        if let Some(html) = entries.lock().get(&key) {
            tracing::debug!("Render cache hit");
            return html.clone();
        }

        // Render outside the lock; concurrent misses on one body store equal values
        let html = self.processor.render(raw_body);
        entries.lock().put(key, html.clone());
        html
    }

    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, |entries| entries.lock().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for RenderCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderCache")
            .field("enabled", &self.entries.is_some())
            .field("len", &self.len())
            .finish()
    }
}

fn cache_key(raw_body: &str) -> CacheKey {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&PIPELINE_VERSION.to_le_bytes());
    hasher.update(raw_body.as_bytes());
    *hasher.finalize().as_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_matches_fresh_render() {
        let cache = RenderCache::new(4);
        let body = "# Title\n\nSome *text*.\n\n```csv\na,b\n1,2\n```";

        let first = cache.render(body);
        let second = cache.render(body);
        assert_eq!(first, second);
        assert_eq!(first, MarkdownProcessor::new().render(body));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let cache = RenderCache::new(2);
        cache.render("one");
        cache.render("two");
        cache.render("three");
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_zero_capacity_disables() {
        let cache = RenderCache::new(0);
        assert_eq!(cache.render("hello"), "<p>hello</p>\n");
        assert!(cache.is_empty());
    }

    #[test]
    fn test_key_depends_on_body() {
        assert_eq!(cache_key("a"), cache_key("a"));
        assert_ne!(cache_key("a"), cache_key("b"));
    }
}
