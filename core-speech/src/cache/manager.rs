//! # Audio Cache Manager
//!
//! Owns the artifact store: a directory of rendered audio files plus a
//! serialized index snapshot, addressed by deterministic cache keys.
//!
//! Responsibilities:
//! - key→file lookups with last-accessed tracking
//! - artifact writes with size accounting
//! - LRU eviction under a byte cap and age expiry at startup
//! - wholesale index persistence on a background task
//!
//! All index mutations happen under one `tokio::sync::Mutex`, so the index
//! has a single logical owner. Index persistence is decoupled: mutations
//! serialize a snapshot and hand it to a flusher task over a `watch`
//! channel (last-writer-wins, coalescing), so `get`/`put` callers never
//! block on disk flush latency. A crash between a mutation and the next
//! flush loses only index entries, never audio files; files without an
//! index entry are swept as orphans on the next `initialize`.

use crate::cache::{
    config::CacheConfig,
    entry::{CacheEntry, CacheIndex, IndexSnapshot, INDEX_FORMAT_VERSION},
    key::CacheKey,
    stats::CacheStatistics,
};
use crate::error::{Result, SpeechError};
use crate::script::Utterance;
use bridge_traits::{storage::FileSystemAccess, time::Clock};
use bytes::Bytes;
use core_runtime::events::{CacheEvent, CoreEvent, EventBus};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, instrument, warn};

/// Serialized snapshot handed to the background flusher.
#[derive(Debug, Clone)]
struct FlushPayload {
    path: PathBuf,
    bytes: Bytes,
}

#[derive(Default)]
struct ManagerState {
    index: CacheIndex,
    cache_dir: Option<PathBuf>,
    flush_tx: Option<watch::Sender<Option<FlushPayload>>>,
}

/// Durable, size- and age-bounded store for synthesized audio artifacts.
pub struct AudioCacheManager {
    config: CacheConfig,
    fs: Arc<dyn FileSystemAccess>,
    clock: Arc<dyn Clock>,
    events: EventBus,
    state: Mutex<ManagerState>,
}

impl AudioCacheManager {
    /// Create a new cache manager. Call [`AudioCacheManager::initialize`]
    /// before use.
    pub fn new(
        config: CacheConfig,
        fs: Arc<dyn FileSystemAccess>,
        clock: Arc<dyn Clock>,
        events: EventBus,
    ) -> Self {
        Self {
            config,
            fs,
            clock,
            events,
            state: Mutex::new(ManagerState::default()),
        }
    }

    /// Initialize the cache: create the directory, load the persisted index,
    /// drop entries without a backing file, expire stale entries, sweep
    /// orphaned files and start the background index flusher.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> Result<()> {
        self.config
            .validate()
            .map_err(|e| SpeechError::Cache(format!("Invalid cache configuration: {}", e)))?;

        let cache_root = self.fs.get_cache_directory().await.map_err(|e| {
            SpeechError::Cache(format!("Failed to resolve cache directory: {}", e))
        })?;
        let cache_dir = cache_root.join(&self.config.cache_directory);

        self.fs.create_dir_all(&cache_dir).await.map_err(|e| {
            SpeechError::Cache(format!("Failed to create cache directory: {}", e))
        })?;

        let loaded = self.load_snapshot(&cache_dir).await;
        let now = self.clock.now();

        // The index is advisory; the filesystem is authoritative. Entries
        // whose backing file is gone are dropped silently.
        let mut kept: Vec<CacheEntry> = Vec::with_capacity(loaded.len());
        let mut expired: Vec<CacheEntry> = Vec::new();
        for entry in loaded {
            let path = cache_dir.join(&entry.file_name);
            match self.fs.exists(&path).await {
                Ok(true) => {
                    let idle = now.signed_duration_since(entry.last_accessed_at);
                    if idle.to_std().unwrap_or_default() > self.config.max_entry_age {
                        expired.push(entry);
                    } else {
                        kept.push(entry);
                    }
                }
                Ok(false) => {
                    debug!(file = %entry.file_name, "dropping index entry without backing file");
                }
                Err(e) => {
                    warn!(file = %entry.file_name, "could not probe cache file: {}", e);
                }
            }
        }

        let mut bytes_expired = 0u64;
        for entry in &expired {
            bytes_expired += entry.byte_size;
            let path = cache_dir.join(&entry.file_name);
            if let Err(e) = self.fs.delete_file(&path).await {
                warn!(file = %entry.file_name, "failed to delete expired artifact: {}", e);
            }
        }

        self.sweep_orphans(&cache_dir, &kept).await;

        let expired_count = expired.len();
        {
            let mut state = self.state.lock().await;
            state.cache_dir = Some(cache_dir.clone());
            state.index = CacheIndex::from_entries(kept);
            if state.flush_tx.is_none() {
                state.flush_tx = Some(self.spawn_flusher());
            }
            self.schedule_flush(&state);
            info!(
                entries = state.index.len(),
                total_bytes = state.index.total_bytes(),
                expired = expired_count,
                "audio cache initialized at {:?}",
                cache_dir
            );
        }

        if expired_count > 0 {
            self.events
                .emit(CoreEvent::Cache(CacheEvent::EntriesEvicted {
                    entries_removed: expired_count,
                    bytes_freed: bytes_expired,
                }))
                .ok();
        }

        Ok(())
    }

    /// Look up the artifact for `utterance`.
    ///
    /// A hit bumps the entry's last-accessed time and schedules a
    /// non-blocking index flush. A hit whose backing file has disappeared
    /// self-heals: the stale entry is removed and the lookup reports a miss.
    pub async fn get(&self, utterance: &Utterance) -> Option<PathBuf> {
        self.get_by_key(&CacheKey::for_utterance(utterance)).await
    }

    /// Look up the artifact for a precomputed key. See
    /// [`AudioCacheManager::get`].
    pub async fn get_by_key(&self, key: &CacheKey) -> Option<PathBuf> {
        let mut state = self.state.lock().await;
        let cache_dir = state.cache_dir.clone()?;
        if !state.index.contains(key) {
            return None;
        }

        let path = cache_dir.join(key.file_name());
        match self.fs.exists(&path).await {
            Ok(true) => {
                state.index.touch(key, self.clock.now());
                self.schedule_flush(&state);
                Some(path)
            }
            Ok(false) => {
                warn!(%key, "cached artifact missing on disk, removing stale entry");
                state.index.remove(key);
                self.schedule_flush(&state);
                None
            }
            Err(e) => {
                warn!(%key, "could not probe cached artifact: {}", e);
                None
            }
        }
    }

    /// Store `data` as the artifact for `utterance` and return its location.
    ///
    /// The artifact file is written first; only then is the index mutated, so
    /// a failed write leaves the existing index intact. Size eviction runs
    /// before returning; index persistence is scheduled, not awaited.
    #[instrument(skip(self, data, utterance), fields(bytes = data.len()))]
    pub async fn put(&self, data: Bytes, utterance: &Utterance) -> Result<PathBuf> {
        let key = CacheKey::for_utterance(utterance);
        let byte_size = data.len() as u64;

        let cache_dir = {
            let state = self.state.lock().await;
            state
                .cache_dir
                .clone()
                .ok_or_else(|| SpeechError::Cache("Cache not initialized".to_string()))?
        };

        let path = cache_dir.join(key.file_name());
        self.fs
            .write_file(&path, data)
            .await
            .map_err(|e| SpeechError::StorageWrite(e.to_string()))?;

        let evicted = {
            let mut state = self.state.lock().await;
            let entry = CacheEntry::new(utterance, key.clone(), byte_size, self.clock.now());
            state.index.insert(entry);
            let evicted = self.collect_size_evictions(&mut state.index);
            self.schedule_flush(&state);
            evicted
        };

        if !evicted.is_empty() {
            let mut bytes_freed = 0u64;
            for entry in &evicted {
                bytes_freed += entry.byte_size;
                let victim = cache_dir.join(&entry.file_name);
                // One failed delete must not abort the rest of the sweep.
                if let Err(e) = self.fs.delete_file(&victim).await {
                    warn!(file = %entry.file_name, "failed to delete evicted artifact: {}", e);
                }
            }
            debug!(
                evicted = evicted.len(),
                bytes_freed, "size eviction after put"
            );
            self.events
                .emit(CoreEvent::Cache(CacheEvent::EntriesEvicted {
                    entries_removed: evicted.len(),
                    bytes_freed,
                }))
                .ok();
        }

        debug!(%key, "artifact cached");
        Ok(path)
    }

    /// Delete every cached artifact and persist an empty index.
    ///
    /// Per-file deletion failures are logged and swallowed. Calling `clear`
    /// on an already empty (or uninitialized) cache is a no-op.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<usize> {
        let (drained, cache_dir, empty_payload) = {
            let mut state = self.state.lock().await;
            let Some(cache_dir) = state.cache_dir.clone() else {
                return Ok(0);
            };
            let drained = state.index.drain();
            // Push the empty snapshot through the flusher too, so a stale
            // pending payload cannot win over the clear.
            self.schedule_flush(&state);
            let payload = serde_json::to_vec_pretty(&IndexSnapshot::empty())
                .map_err(|e| SpeechError::Cache(format!("Failed to serialize index: {}", e)))?;
            (drained, cache_dir, payload)
        };

        for entry in &drained {
            let path = cache_dir.join(&entry.file_name);
            if let Err(e) = self.fs.delete_file(&path).await {
                warn!(file = %entry.file_name, "failed to delete artifact during clear: {}", e);
            }
        }

        let index_path = cache_dir.join(&self.config.index_file_name);
        if let Err(e) = self
            .fs
            .write_file(&index_path, Bytes::from(empty_payload))
            .await
        {
            warn!("failed to persist empty index: {}", e);
        }

        info!(entries_removed = drained.len(), "cache cleared");
        self.events
            .emit(CoreEvent::Cache(CacheEvent::Cleared {
                entries_removed: drained.len(),
            }))
            .ok();
        Ok(drained.len())
    }

    /// Current cache statistics. Pure read, no side effects.
    pub async fn statistics(&self) -> CacheStatistics {
        let state = self.state.lock().await;
        CacheStatistics {
            item_count: state.index.len(),
            total_bytes: state.index.total_bytes(),
            max_bytes: self.config.max_cache_size_bytes,
            oldest_created_at: state.index.oldest_created_at(),
            newest_created_at: state.index.newest_created_at(),
        }
    }

    /// The cache configuration this manager runs with.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    async fn load_snapshot(&self, cache_dir: &std::path::Path) -> Vec<CacheEntry> {
        let index_path = cache_dir.join(&self.config.index_file_name);
        match self.fs.exists(&index_path).await {
            Ok(true) => {}
            _ => return Vec::new(),
        }

        let bytes = match self.fs.read_file(&index_path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("failed to read index snapshot, starting empty: {}", e);
                return Vec::new();
            }
        };

        match serde_json::from_slice::<IndexSnapshot>(&bytes) {
            Ok(snapshot) if snapshot.version == INDEX_FORMAT_VERSION => snapshot.entries,
            Ok(snapshot) => {
                warn!(
                    version = snapshot.version,
                    "unsupported index snapshot version, starting empty"
                );
                Vec::new()
            }
            Err(e) => {
                warn!("corrupt index snapshot, starting empty: {}", e);
                Vec::new()
            }
        }
    }

    /// Delete files in the cache directory that no index entry references.
    async fn sweep_orphans(&self, cache_dir: &std::path::Path, kept: &[CacheEntry]) {
        let listing = match self.fs.list_directory(cache_dir).await {
            Ok(listing) => listing,
            Err(e) => {
                warn!("could not list cache directory for orphan sweep: {}", e);
                return;
            }
        };

        let known: HashSet<&str> = kept
            .iter()
            .map(|e| e.file_name.as_str())
            .chain(std::iter::once(self.config.index_file_name.as_str()))
            .collect();

        for path in listing {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if known.contains(name) {
                continue;
            }
            debug!(file = name, "deleting orphaned cache file");
            if let Err(e) = self.fs.delete_file(&path).await {
                warn!(file = name, "failed to delete orphaned file: {}", e);
            }
        }
    }

    /// Remove least-recently-used entries until the byte total is at or
    /// below the eviction watermark. Only index bookkeeping happens here;
    /// the caller deletes the backing files.
    fn collect_size_evictions(&self, index: &mut CacheIndex) -> Vec<CacheEntry> {
        if index.total_bytes() <= self.config.max_cache_size_bytes {
            return Vec::new();
        }

        let target = self.config.eviction_target_bytes();
        let mut removed = Vec::new();
        for key in index.lru_order() {
            if index.total_bytes() <= target {
                break;
            }
            if let Some(entry) = index.remove(&key) {
                removed.push(entry);
            }
        }
        removed
    }

    /// Serialize the current index and hand it to the flusher. Never blocks
    /// on disk I/O.
    fn schedule_flush(&self, state: &ManagerState) {
        let (Some(cache_dir), Some(flush_tx)) = (&state.cache_dir, &state.flush_tx) else {
            return;
        };

        match serde_json::to_vec_pretty(&state.index.snapshot()) {
            Ok(bytes) => {
                flush_tx
                    .send(Some(FlushPayload {
                        path: cache_dir.join(&self.config.index_file_name),
                        bytes: Bytes::from(bytes),
                    }))
                    .ok();
            }
            Err(e) => warn!("failed to serialize index snapshot: {}", e),
        }
    }

    /// Start the background task that writes index snapshots. The `watch`
    /// channel coalesces bursts: the task always writes the latest snapshot,
    /// at least once per mutation batch.
    fn spawn_flusher(&self) -> watch::Sender<Option<FlushPayload>> {
        let (tx, mut rx) = watch::channel::<Option<FlushPayload>>(None);
        let fs = Arc::clone(&self.fs);
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let payload = rx.borrow_and_update().clone();
                if let Some(payload) = payload {
                    if let Err(e) = fs.write_file(&payload.path, payload.bytes).await {
                        warn!("failed to persist cache index: {}", e);
                    }
                }
            }
        });
        tx
    }
}
