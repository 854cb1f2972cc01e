use dashmap::DashMap;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::debug;

/// Key-value store for raw extractor responses, keyed by chunk content.
pub trait ExtractionCache: Send + Sync {
    fn get(&self, content: &str) -> Option<String>;
    fn put(&self, content: &str, response: String);
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone)]
pub struct MemoryCache {
    responses: Arc<DashMap<String, String>>,
    max_entries: usize,
}

impl MemoryCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            responses: Arc::new(DashMap::new()),
            max_entries,
        }
    }

    fn hash_text(text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        hex::encode(hasher.finalize())
    }

    // Simple eviction: drop 25% when full
    fn evict(&self) {
        let to_remove: Vec<_> = self
            .responses
            .iter()
            .take((self.max_entries / 4).max(1))
            .map(|r| r.key().clone())
            .collect();
        for key in &to_remove {
            self.responses.remove(key);
        }
        debug!(evicted = to_remove.len(), "Evicted cached responses");
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            responses_cached: self.responses.len(),
            max_entries: self.max_entries,
        }
    }

    pub fn clear(&self) {
        self.responses.clear();
    }
}

impl ExtractionCache for MemoryCache {
    fn get(&self, content: &str) -> Option<String> {
        self.responses
            .get(&Self::hash_text(content))
            .map(|r| r.value().clone())
    }

    fn put(&self, content: &str, response: String) {
        if self.max_entries == 0 {
            return;
        }
        if self.responses.len() >= self.max_entries {
            self.evict();
        }
        self.responses.insert(Self::hash_text(content), response);
    }

    fn len(&self) -> usize {
        self.responses.len()
    }
}

#[derive(Debug, Serialize)]
pub struct CacheStats {
    pub responses_cached: usize,
    pub max_entries: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_put() {
        let cache = MemoryCache::new(10);
        assert!(cache.get("tardigrades survive").is_none());

        cache.put("tardigrades survive", "[]".to_string());
        assert_eq!(cache.get("tardigrades survive").as_deref(), Some("[]"));
        assert!(cache.get("Tardigrades survive").is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_eviction_keeps_bound() {
        let cache = MemoryCache::new(8);
        for i in 0..20 {
            cache.put(&format!("chunk {i}"), i.to_string());
            assert!(cache.len() <= 8);
        }
        assert_eq!(cache.get("chunk 19").as_deref(), Some("19"));
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let cache = MemoryCache::new(0);
        cache.put("chunk", "[]".to_string());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear() {
        let cache = MemoryCache::new(4);
        cache.put("a", "1".to_string());
        cache.clear();
        assert_eq!(cache.stats().responses_cached, 0);
    }
}
