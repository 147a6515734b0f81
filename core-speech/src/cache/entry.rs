//! Cache entries and the in-memory index.
//!
//! `CacheEntry` is the metadata record for one artifact; `CacheIndex` is the
//! authoritative in-memory view, persisted wholesale as an `IndexSnapshot`.
//! The index is advisory: on load, entries whose backing file is missing are
//! dropped, because the filesystem is authoritative for existence.

use crate::cache::key::CacheKey;
use crate::script::{Emotion, Utterance};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Version stamp of the on-disk snapshot layout.
pub const INDEX_FORMAT_VERSION: u32 = 1;

/// Metadata for one cached artifact. Owned exclusively by the cache manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Key this entry is addressed by.
    pub key: CacheKey,
    /// Artifact file name within the cache directory.
    pub file_name: String,
    /// Original (un-normalized) request text.
    pub text: String,
    /// Emotional tone the artifact was rendered with.
    pub emotion: Emotion,
    /// Voice identity the artifact was rendered with, if any.
    pub voice_id: Option<String>,
    /// Artifact size in bytes.
    pub byte_size: u64,
    /// When the artifact was created.
    pub created_at: DateTime<Utc>,
    /// When the artifact was last served from cache.
    pub last_accessed_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Create a fresh entry for a just-written artifact.
    pub fn new(utterance: &Utterance, key: CacheKey, byte_size: u64, now: DateTime<Utc>) -> Self {
        let file_name = key.file_name();
        Self {
            key,
            file_name,
            text: utterance.text.clone(),
            emotion: utterance.emotion,
            voice_id: utterance.voice_id.clone(),
            byte_size,
            created_at: now,
            last_accessed_at: now,
        }
    }

    /// Record a successful lookup.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_accessed_at = now;
    }
}

/// On-disk snapshot: one record per entry, written wholesale on every
/// mutation batch and read wholesale at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub version: u32,
    pub entries: Vec<CacheEntry>,
}

impl IndexSnapshot {
    /// An empty snapshot at the current format version.
    pub fn empty() -> Self {
        Self {
            version: INDEX_FORMAT_VERSION,
            entries: Vec::new(),
        }
    }
}

/// Authoritative in-memory key→entry mapping with a running byte total.
#[derive(Debug, Default)]
pub struct CacheIndex {
    entries: HashMap<CacheKey, CacheEntry>,
    total_bytes: u64,
}

impl CacheIndex {
    /// Build an index from loaded entries.
    pub fn from_entries(entries: Vec<CacheEntry>) -> Self {
        let mut index = Self::default();
        for entry in entries {
            index.insert(entry);
        }
        index
    }

    /// Insert or overwrite an entry, returning the displaced one if any.
    pub fn insert(&mut self, entry: CacheEntry) -> Option<CacheEntry> {
        self.total_bytes += entry.byte_size;
        let displaced = self.entries.insert(entry.key.clone(), entry);
        if let Some(old) = &displaced {
            self.total_bytes -= old.byte_size;
        }
        displaced
    }

    /// Remove an entry.
    pub fn remove(&mut self, key: &CacheKey) -> Option<CacheEntry> {
        let removed = self.entries.remove(key);
        if let Some(entry) = &removed {
            self.total_bytes -= entry.byte_size;
        }
        removed
    }

    /// Look up an entry.
    pub fn get(&self, key: &CacheKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Returns `true` if the key is present.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Bump an entry's last-accessed time. Returns `false` if absent.
    pub fn touch(&mut self, key: &CacheKey, now: DateTime<Utc>) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.touch(now);
                true
            }
            None => false,
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the index holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of artifact sizes.
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Iterate entries in unspecified order.
    pub fn entries(&self) -> impl Iterator<Item = &CacheEntry> {
        self.entries.values()
    }

    /// Keys ordered least-recently-used first. Ties are broken by creation
    /// time, then file name, so eviction order is deterministic.
    pub fn lru_order(&self) -> Vec<CacheKey> {
        let mut ordered: Vec<&CacheEntry> = self.entries.values().collect();
        ordered.sort_by(|a, b| {
            a.last_accessed_at
                .cmp(&b.last_accessed_at)
                .then_with(|| a.created_at.cmp(&b.created_at))
                .then_with(|| a.file_name.cmp(&b.file_name))
        });
        ordered.into_iter().map(|e| e.key.clone()).collect()
    }

    /// Remove and return all entries.
    pub fn drain(&mut self) -> Vec<CacheEntry> {
        self.total_bytes = 0;
        self.entries.drain().map(|(_, entry)| entry).collect()
    }

    /// Earliest creation time across entries.
    pub fn oldest_created_at(&self) -> Option<DateTime<Utc>> {
        self.entries.values().map(|e| e.created_at).min()
    }

    /// Latest creation time across entries.
    pub fn newest_created_at(&self) -> Option<DateTime<Utc>> {
        self.entries.values().map(|e| e.created_at).max()
    }

    /// Serializable snapshot of the current state, entries in deterministic
    /// (file name) order.
    pub fn snapshot(&self) -> IndexSnapshot {
        let mut entries: Vec<CacheEntry> = self.entries.values().cloned().collect();
        entries.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        IndexSnapshot {
            version: INDEX_FORMAT_VERSION,
            entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::Emotion;
    use chrono::TimeZone;

    fn entry(text: &str, size: u64, accessed_secs: i64) -> CacheEntry {
        let utterance = Utterance::new(text, Emotion::Neutral, Some("v1".to_string()));
        let key = CacheKey::for_utterance(&utterance);
        let created = Utc.timestamp_opt(accessed_secs, 0).unwrap();
        let mut e = CacheEntry::new(&utterance, key, size, created);
        e.last_accessed_at = created;
        e
    }

    #[test]
    fn insert_tracks_byte_totals() {
        let mut index = CacheIndex::default();
        index.insert(entry("one", 100, 1));
        index.insert(entry("two", 250, 2));
        assert_eq!(index.len(), 2);
        assert_eq!(index.total_bytes(), 350);

        // Overwriting the same key replaces its size contribution.
        index.insert(entry("one", 40, 3));
        assert_eq!(index.len(), 2);
        assert_eq!(index.total_bytes(), 290);
    }

    #[test]
    fn remove_adjusts_totals() {
        let mut index = CacheIndex::default();
        let a = entry("one", 100, 1);
        let key = a.key.clone();
        index.insert(a);
        index.insert(entry("two", 50, 2));

        let removed = index.remove(&key).unwrap();
        assert_eq!(removed.byte_size, 100);
        assert_eq!(index.total_bytes(), 50);
        assert!(index.remove(&key).is_none());
    }

    #[test]
    fn lru_order_is_oldest_access_first() {
        let mut index = CacheIndex::default();
        index.insert(entry("newest", 10, 30));
        index.insert(entry("oldest", 10, 10));
        index.insert(entry("middle", 10, 20));

        let order = index.lru_order();
        let oldest_key = CacheKey::derive("oldest", Emotion::Neutral, Some("v1"));
        let newest_key = CacheKey::derive("newest", Emotion::Neutral, Some("v1"));
        assert_eq!(order.first(), Some(&oldest_key));
        assert_eq!(order.last(), Some(&newest_key));
    }

    #[test]
    fn touch_updates_lru_position() {
        let mut index = CacheIndex::default();
        index.insert(entry("a", 10, 10));
        index.insert(entry("b", 10, 20));

        let a_key = CacheKey::derive("a", Emotion::Neutral, Some("v1"));
        assert!(index.touch(&a_key, Utc.timestamp_opt(99, 0).unwrap()));

        let order = index.lru_order();
        assert_eq!(order.last(), Some(&a_key));
    }

    #[test]
    fn snapshot_round_trip() {
        let mut index = CacheIndex::default();
        index.insert(entry("one", 100, 1));
        index.insert(entry("two", 250, 2));

        let snapshot = index.snapshot();
        assert_eq!(snapshot.version, INDEX_FORMAT_VERSION);

        let json = serde_json::to_vec(&snapshot).unwrap();
        let restored: IndexSnapshot = serde_json::from_slice(&json).unwrap();
        let rebuilt = CacheIndex::from_entries(restored.entries);

        assert_eq!(rebuilt.len(), 2);
        assert_eq!(rebuilt.total_bytes(), 350);
    }

    #[test]
    fn drain_empties_the_index() {
        let mut index = CacheIndex::default();
        index.insert(entry("one", 100, 1));
        let drained = index.drain();
        assert_eq!(drained.len(), 1);
        assert!(index.is_empty());
        assert_eq!(index.total_bytes(), 0);
    }
}
