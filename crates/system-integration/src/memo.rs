//! Single-slot memoization keyed by value equality

use std::sync::Arc;

#[derive(Debug)]
pub struct Memo<K, V> {
    slot: Option<(K, Arc<V>)>,
    hits: u64,
    misses: u64,
}

impl<K, V> Default for Memo<K, V> {
    fn default() -> Self {
        Self {
            slot: None,
            hits: 0,
            misses: 0,
        }
    }
}

impl<K: PartialEq, V> Memo<K, V> {
    /// Cached value for `key`, recomputing when the key differs from the
    /// one the cached value was built from
    pub fn get_or_compute(&mut self, key: K, compute: impl FnOnce() -> V) -> Arc<V> {
        if let Some((cached_key, value)) = &self.slot {
            if *cached_key == key {
                self.hits += 1;
                return value.clone();
            }
        }
        self.misses += 1;
        let value = Arc::new(compute());
        self.slot = Some((key, value.clone()));
        value
    }

    /// Cached value for `key` without computing on a miss
    pub fn peek(&mut self, key: &K) -> Option<Arc<V>> {
        match &self.slot {
            Some((cached_key, value)) if cached_key == key => {
                self.hits += 1;
                Some(value.clone())
            }
            _ => None,
        }
    }

    pub fn invalidate(&mut self) {
        self.slot = None;
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
