use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;

/// Process-lifetime memo of text -> vector.
///
/// Keys are the raw text, so `"Cemento"` and `"cemento"` are cached
/// separately. There is no per-entry eviction; [`clear`](Self::clear) drops
/// everything and is called whenever the corpus changes.
#[derive(Debug, Default)]
pub struct EmbeddingCache {
    entries: DashMap<String, Arc<Vec<f32>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Point-in-time cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

impl EmbeddingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, text: &str) -> Option<Arc<Vec<f32>>> {
        match self.entries.get(text) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(Arc::clone(entry.value()))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store `vector` under `text`. Last write wins; values are pure functions
    /// of the key so concurrent writers agree.
    pub fn insert(&self, text: &str, vector: Vec<f32>) -> Arc<Vec<f32>> {
        let vector = Arc::new(vector);
        self.entries.insert(text.to_owned(), Arc::clone(&vector));
        vector
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
