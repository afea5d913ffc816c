//! Bounded in-memory cache of assembled datasets.
//!
//! Entries are keyed by a fingerprint of the input records plus a hash of
//! the assembly settings, so a change to either produces a miss. The cache
//! is a plain value owned by whoever needs it (the MCP server holds one);
//! there is no process-wide instance.

use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use siphasher::sip::SipHasher13;

use super::dataset::{assemble_with, Dataset};
use super::document::RawValue;
use crate::config::DatasetConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    /// SipHash of the serialized input records (detects data changes).
    pub content_hash: u64,
    /// SipHash of the serialized settings (detects config changes).
    pub args_hash: u64,
}

impl CacheKey {
    pub fn new(records: &[Value], config: &DatasetConfig) -> Self {
        Self {
            content_hash: content_hash(records),
            args_hash: args_hash(config),
        }
    }
}

/// Metadata stored alongside each cached dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMeta {
    pub key: CacheKey,
    pub row_count: usize,
    /// Unix timestamp when the entry was created.
    pub created_at: u64,
}

impl CacheMeta {
    pub fn new(key: CacheKey, row_count: usize) -> Self {
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self {
            key,
            row_count,
            created_at,
        }
    }
}

/// Fingerprint of the input records, order-sensitive.
pub fn content_hash(records: &[Value]) -> u64 {
    let mut hasher = SipHasher13::new();
    records.len().hash(&mut hasher);
    for record in records {
        record.to_string().hash(&mut hasher);
    }
    hasher.finish()
}

/// Hash of any serializable argument set.
pub fn args_hash(args: &impl Serialize) -> u64 {
    let json = serde_json::to_string(args).unwrap_or_default();
    let mut hasher = SipHasher13::new();
    json.hash(&mut hasher);
    hasher.finish()
}

struct CacheEntry {
    meta: CacheMeta,
    dataset: Arc<Dataset>,
}

/// Least-recently-used cache holding at most `capacity` datasets.
pub struct DatasetCache {
    capacity: usize,
    entries: HashMap<CacheKey, CacheEntry>,
    /// Front is least recently used.
    recency: VecDeque<CacheKey>,
}

impl DatasetCache {
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            recency: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn meta(&self, key: &CacheKey) -> Option<&CacheMeta> {
        self.entries.get(key).map(|e| &e.meta)
    }

    pub fn get(&mut self, key: &CacheKey) -> Option<Arc<Dataset>> {
        let dataset = self.entries.get(key).map(|e| Arc::clone(&e.dataset))?;
        self.touch(key);
        Some(dataset)
    }

    pub fn insert(&mut self, key: CacheKey, dataset: Dataset) -> Arc<Dataset> {
        let dataset = Arc::new(dataset);
        let meta = CacheMeta::new(key, dataset.rows.len());
        let replaced = self
            .entries
            .insert(
                key,
                CacheEntry {
                    meta,
                    dataset: Arc::clone(&dataset),
                },
            )
            .is_some();
        if replaced {
            self.touch(&key);
        } else {
            self.recency.push_back(key);
        }

        while self.entries.len() > self.capacity {
            let Some(oldest) = self.recency.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
            tracing::debug!(
                content_hash = oldest.content_hash,
                "evicted dataset from cache"
            );
        }
        dataset
    }

    /// Return the cached dataset for these records and settings, assembling
    /// and caching it on a miss. The flag is true on a hit.
    pub fn get_or_assemble(
        &mut self,
        records: &[Value],
        config: &DatasetConfig,
    ) -> (Arc<Dataset>, bool) {
        let key = CacheKey::new(records, config);
        if let Some(dataset) = self.get(&key) {
            tracing::debug!(content_hash = key.content_hash, "dataset cache hit");
            return (dataset, true);
        }
        tracing::debug!(content_hash = key.content_hash, "dataset cache miss");
        let documents: Vec<RawValue> = records.iter().cloned().map(RawValue::from_json).collect();
        let dataset = assemble_with(&documents, config);
        (self.insert(key, dataset), false)
    }

    /// Drop one entry. Returns whether it was present.
    pub fn invalidate(&mut self, key: &CacheKey) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.recency.retain(|k| k != key);
        }
        removed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
    }

    fn touch(&mut self, key: &CacheKey) {
        if let Some(pos) = self.recency.iter().position(|k| k == key) {
            self.recency.remove(pos);
        }
        self.recency.push_back(*key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::flatten::FlattenDepth;
    use serde_json::json;

    fn records(tag: &str) -> Vec<Value> {
        vec![json!({"tag": tag, "n": 1}), json!({"tag": tag, "n": 2})]
    }

    #[test]
    fn content_hash_deterministic() {
        assert_eq!(content_hash(&records("a")), content_hash(&records("a")));
    }

    #[test]
    fn content_hash_changes_with_data() {
        assert_ne!(content_hash(&records("a")), content_hash(&records("b")));
    }

    #[test]
    fn content_hash_is_order_sensitive() {
        let mut r = records("a");
        let h1 = content_hash(&r);
        r.reverse();
        assert_ne!(h1, content_hash(&r));
    }

    #[test]
    fn args_hash_changes_with_config() {
        let shallow = DatasetConfig::default();
        let deep = DatasetConfig {
            flatten: FlattenDepth::Deep,
            ..DatasetConfig::default()
        };
        assert_eq!(args_hash(&shallow), args_hash(&DatasetConfig::default()));
        assert_ne!(args_hash(&shallow), args_hash(&deep));
    }

    #[test]
    fn second_lookup_hits() {
        let mut cache = DatasetCache::new(4);
        let config = DatasetConfig::default();
        let (first, hit) = cache.get_or_assemble(&records("a"), &config);
        assert!(!hit);
        let (second, hit) = cache.get_or_assemble(&records("a"), &config);
        assert!(hit);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn config_change_misses() {
        let mut cache = DatasetCache::new(4);
        let deep = DatasetConfig {
            flatten: FlattenDepth::Deep,
            ..DatasetConfig::default()
        };
        cache.get_or_assemble(&records("a"), &DatasetConfig::default());
        let (_, hit) = cache.get_or_assemble(&records("a"), &deep);
        assert!(!hit);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn evicts_least_recently_used() {
        let mut cache = DatasetCache::new(2);
        let config = DatasetConfig::default();
        let key_a = CacheKey::new(&records("a"), &config);
        let key_b = CacheKey::new(&records("b"), &config);
        let key_c = CacheKey::new(&records("c"), &config);

        cache.get_or_assemble(&records("a"), &config);
        cache.get_or_assemble(&records("b"), &config);
        // touch a so b becomes the oldest
        assert!(cache.get(&key_a).is_some());
        cache.get_or_assemble(&records("c"), &config);

        assert_eq!(cache.len(), 2);
        assert!(cache.contains(&key_a));
        assert!(!cache.contains(&key_b));
        assert!(cache.contains(&key_c));
    }

    #[test]
    fn invalidate_and_clear() {
        let mut cache = DatasetCache::new(4);
        let config = DatasetConfig::default();
        let key = CacheKey::new(&records("a"), &config);
        cache.get_or_assemble(&records("a"), &config);
        assert_eq!(cache.meta(&key).unwrap().row_count, 2);
        assert!(cache.invalidate(&key));
        assert!(!cache.invalidate(&key));
        assert!(cache.is_empty());

        cache.get_or_assemble(&records("a"), &config);
        cache.get_or_assemble(&records("b"), &config);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn zero_capacity_is_raised() {
        let mut cache = DatasetCache::new(0);
        assert_eq!(cache.capacity(), 1);
        let config = DatasetConfig::default();
        cache.get_or_assemble(&records("a"), &config);
        cache.get_or_assemble(&records("b"), &config);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn reinsert_does_not_duplicate_recency() {
        let mut cache = DatasetCache::new(2);
        let config = DatasetConfig::default();
        let key = CacheKey::new(&records("a"), &config);
        cache.insert(key, Dataset::empty());
        cache.insert(key, Dataset::empty());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.recency.len(), 1);
    }
}
