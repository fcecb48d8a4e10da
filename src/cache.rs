//! In-memory translation cache shared across calls.
//!
//! The map grows until `capacity`; an insert at capacity clears it entirely
//! before storing the new entry.

use crate::language::Language;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    source: Language,
    target: Language,
    text: String,
}

/// Snapshot of cache counters
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub clears: u64,
}

#[derive(Debug)]
pub struct TranslationCache {
    capacity: usize,
    entries: Mutex<HashMap<CacheKey, String>>,
    hits: AtomicU64,
    misses: AtomicU64,
    clears: AtomicU64,
}

impl TranslationCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            clears: AtomicU64::new(0),
        }
    }

    fn key(text: &str, source: Language, target: Language) -> CacheKey {
        CacheKey {
            source,
            target,
            text: text.trim().to_string(),
        }
    }

    pub fn get(&self, text: &str, source: Language, target: Language) -> Option<String> {
        let key = Self::key(text, source, target);
        let entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        match entries.get(&key) {
            Some(hit) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(hit.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn insert(&self, text: &str, source: Language, target: Language, translation: String) {
        // A zero capacity disables caching
        if self.capacity == 0 {
            return;
        }

        let key = Self::key(text, source, target);
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            debug!("Translation cache full ({} entries), clearing", entries.len());
            entries.clear();
            self.clears.fetch_add(1, Ordering::Relaxed);
        }

        entries.insert(key, translation);
    }

    pub fn len(&self) -> usize {
        match self.entries.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            capacity: self.capacity,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            clears: self.clears.load(Ordering::Relaxed),
        }
    }
}
