//! Item cache seam
//!
//! Folder listings record which internal item id belongs to each
//! `(site, author, url)` triple. The client only writes to the cache.

use std::collections::HashMap;
use std::sync::Mutex;

/// Namespace of entries recorded by this client, shared with other
/// gallery sites that write to the same cache.
pub const SITE_SLUG: &str = "deviantart";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub site: String,
    pub author: String,
    pub url: String,
}

impl CacheKey {
    pub fn new(site: impl Into<String>, author: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            site: site.into(),
            author: author.into(),
            url: url.into(),
        }
    }
}

pub trait ItemCache: Send + Sync {
    fn record(&self, key: CacheKey, item_id: &str);
}

/// Process-local cache.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<CacheKey, String>>,
}

impl MemoryCache {
    pub fn get(&self, key: &CacheKey) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ItemCache for MemoryCache {
    fn record(&self, key: CacheKey, item_id: &str) {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key, item_id.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_record_overwrites() {
        let cache = MemoryCache::default();
        let key = CacheKey::new(SITE_SLUG, "artist", "https://www.deviantart.com/artist/art/piece-1");
        cache.record(key.clone(), "id-1");
        cache.record(key.clone(), "id-2");
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&key).as_deref(), Some("id-2"));
    }

    #[test]
    fn sites_do_not_share_entries() {
        let cache = MemoryCache::default();
        let url = "https://example.com/artist/art/piece-1";
        cache.record(CacheKey::new(SITE_SLUG, "artist", url), "da-1");
        cache.record(CacheKey::new("othersite", "artist", url), "other-1");

        assert_eq!(cache.len(), 2);
        assert_eq!(
            cache.get(&CacheKey::new(SITE_SLUG, "artist", url)).as_deref(),
            Some("da-1")
        );
    }
}
