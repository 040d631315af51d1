/*!
 * Translation caching functionality.
 *
 * Each adapter owns one `TranslationCache` with two independent spaces:
 * translations keyed by (text, source language, target language) and
 * language detections keyed by the raw text.
 *
 * Entries expire after a fixed TTL, checked lazily on read; stale entries are
 * not removed until capacity pressure or an explicit clear. When a space is
 * full the earliest inserted entry is evicted (FIFO, not LRU: reads do not
 * refresh an entry's position).
 */

use log::debug;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;

use crate::language_utils::LanguageDescriptor;
use crate::translation::adapter::TranslationResult;

/// Cache key combining source text, source language, and target language
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    /// SHA-256 of the source text
    text_hash: String,

    /// Source language code, `auto` when not given
    source_language: String,

    /// Target language code
    target_language: String,
}

impl CacheKey {
    fn new(source_text: &str, source_language: &str, target_language: &str) -> Self {
        Self {
            text_hash: hash_text(source_text),
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
        }
    }
}

/// Hex SHA-256 of a text
fn hash_text(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

struct Entry<V> {
    data: V,
    inserted_at: Instant,
}

/// Capacity-bounded map evicting in insertion order
struct FifoMap<K, V> {
    entries: HashMap<K, Entry<V>>,
    order: VecDeque<K>,
}

impl<K: Eq + Hash + Clone, V: Clone> FifoMap<K, V> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    fn get(&self, key: &K, ttl: Duration) -> Option<V> {
        self.entries
            .get(key)
            .filter(|entry| entry.inserted_at.elapsed() < ttl)
            .map(|entry| entry.data.clone())
    }

    fn insert(&mut self, key: K, data: V, capacity: usize) {
        if capacity == 0 {
            return;
        }

        let entry = Entry {
            data,
            inserted_at: Instant::now(),
        };

        // Overwrites keep their original position in the eviction order
        if let Some(existing) = self.entries.get_mut(&key) {
            *existing = entry;
            return;
        }

        while self.entries.len() >= capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }

        self.order.push_back(key.clone());
        self.entries.insert(key, entry);
    }

    fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

struct Spaces {
    translations: FifoMap<CacheKey, TranslationResult>,
    detections: FifoMap<String, LanguageDescriptor>,
}

/// Hit/miss counters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub hit_rate: f64,
}

/// Per-adapter cache for translations and detections
pub struct TranslationCache {
    spaces: Mutex<Spaces>,

    /// Maximum entries per space
    capacity: usize,

    /// Entry lifetime
    ttl: Duration,

    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl TranslationCache {
    /// Create a new cache; capacity and TTL are fixed for its lifetime
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            spaces: Mutex::new(Spaces {
                translations: FifoMap::new(),
                detections: FifoMap::new(),
            }),
            capacity,
            ttl,
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    /// Get a translation from the cache
    pub fn get_translation(&self, source_text: &str, source_language: &str, target_language: &str) -> Option<TranslationResult> {
        let key = CacheKey::new(source_text, source_language, target_language);
        let found = self.spaces.lock().translations.get(&key, self.ttl);
        self.record(found.is_some());

        if found.is_some() {
            debug!(
                "Cache hit for '{}' ({} -> {})",
                truncate_text(source_text, 30),
                source_language,
                target_language
            );
        } else {
            debug!(
                "Cache miss for '{}' ({} -> {})",
                truncate_text(source_text, 30),
                source_language,
                target_language
            );
        }

        found
    }

    /// Store a translation in the cache
    pub fn set_translation(&self, source_text: &str, source_language: &str, target_language: &str, result: TranslationResult) {
        let key = CacheKey::new(source_text, source_language, target_language);
        self.spaces.lock().translations.insert(key, result, self.capacity);
    }

    /// Get a detected language from the cache
    pub fn get_detection(&self, text: &str) -> Option<LanguageDescriptor> {
        let found = self.spaces.lock().detections.get(&hash_text(text), self.ttl);
        self.record(found.is_some());
        found
    }

    /// Store a detected language in the cache
    pub fn set_detection(&self, text: &str, language: LanguageDescriptor) {
        self.spaces.lock().detections.insert(hash_text(text), language, self.capacity);
    }

    /// Whether a translation entry exists, expired or not
    pub fn contains_translation(&self, source_text: &str, source_language: &str, target_language: &str) -> bool {
        let key = CacheKey::new(source_text, source_language, target_language);
        self.spaces.lock().translations.contains(&key)
    }

    fn record(&self, hit: bool) {
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        CacheStats { hits, misses, hit_rate }
    }

    /// Clear both spaces and the counters
    pub fn clear(&self) {
        let mut spaces = self.spaces.lock();
        spaces.translations.clear();
        spaces.detections.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);

        debug!("Translation cache cleared");
    }

    /// Number of translation entries, stale ones included
    pub fn translation_len(&self) -> usize {
        self.spaces.lock().translations.len()
    }

    /// Number of detection entries, stale ones included
    pub fn detection_len(&self) -> usize {
        self.spaces.lock().detections.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

/// Truncate text to a maximum number of characters with ellipsis
fn truncate_text(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        text.to_string()
    } else {
        format!("{}...", text.chars().take(max_length).collect::<String>())
    }
}
