//! Shared test doubles: an in-memory filesystem, a manual clock, a counting
//! synthesizer and a scriptable audio sink.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::audio::AudioSink;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::storage::{FileMetadata, FileSystemAccess};
use bridge_traits::synthesis::{SpeechSynthesizer, SynthesisError, SynthesisRequest};
use bridge_traits::time::Clock;
use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex as StdMutex;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex as AsyncMutex};

// ============================================================================
// In-memory filesystem
// ============================================================================

/// `FileSystemAccess` backed by a hash map. Deterministic and inspectable.
pub struct MemoryFileSystem {
    files: StdMutex<HashMap<PathBuf, Bytes>>,
    dirs: StdMutex<HashSet<PathBuf>>,
    fail_writes: AtomicBool,
    fail_deletes: AtomicBool,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        let mut dirs = HashSet::new();
        dirs.insert(PathBuf::from("/cache"));
        dirs.insert(PathBuf::from("/data"));
        Self {
            files: StdMutex::new(HashMap::new()),
            dirs: StdMutex::new(dirs),
            fail_writes: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
        }
    }

    /// Make subsequent `write_file` calls fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent `delete_file` calls fail.
    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Seed a file directly, bypassing the trait.
    pub fn insert_file(&self, path: impl Into<PathBuf>, data: impl Into<Bytes>) {
        self.files.lock().unwrap().insert(path.into(), data.into());
    }

    /// Remove a file out-of-band, as if another process deleted it.
    pub fn remove_file(&self, path: &Path) {
        self.files.lock().unwrap().remove(path);
    }

    /// Current contents of a file, if present.
    pub fn file(&self, path: &Path) -> Option<Bytes> {
        self.files.lock().unwrap().get(path).cloned()
    }

    /// Number of stored files.
    pub fn file_count(&self) -> usize {
        self.files.lock().unwrap().len()
    }

    /// All stored file paths.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl FileSystemAccess for MemoryFileSystem {
    async fn get_cache_directory(&self) -> BridgeResult<PathBuf> {
        Ok(PathBuf::from("/cache"))
    }

    async fn get_data_directory(&self) -> BridgeResult<PathBuf> {
        Ok(PathBuf::from("/data"))
    }

    async fn exists(&self, path: &Path) -> BridgeResult<bool> {
        Ok(self.files.lock().unwrap().contains_key(path)
            || self.dirs.lock().unwrap().contains(path))
    }

    async fn metadata(&self, path: &Path) -> BridgeResult<FileMetadata> {
        if self.dirs.lock().unwrap().contains(path) {
            return Ok(FileMetadata {
                size: 0,
                created_at: None,
                modified_at: None,
                is_directory: true,
            });
        }
        match self.files.lock().unwrap().get(path) {
            Some(data) => Ok(FileMetadata {
                size: data.len() as u64,
                created_at: None,
                modified_at: None,
                is_directory: false,
            }),
            None => Err(BridgeError::OperationFailed(format!(
                "no such file: {}",
                path.display()
            ))),
        }
    }

    async fn create_dir_all(&self, path: &Path) -> BridgeResult<()> {
        self.dirs.lock().unwrap().insert(path.to_path_buf());
        Ok(())
    }

    async fn read_file(&self, path: &Path) -> BridgeResult<Bytes> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| BridgeError::OperationFailed(format!("no such file: {}", path.display())))
    }

    async fn write_file(&self, path: &Path, data: Bytes) -> BridgeResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BridgeError::OperationFailed("simulated write failure".to_string()));
        }
        self.files.lock().unwrap().insert(path.to_path_buf(), data);
        Ok(())
    }

    async fn delete_file(&self, path: &Path) -> BridgeResult<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(BridgeError::OperationFailed("simulated delete failure".to_string()));
        }
        self.files.lock().unwrap().remove(path);
        Ok(())
    }

    async fn list_directory(&self, path: &Path) -> BridgeResult<Vec<PathBuf>> {
        Ok(self
            .files
            .lock()
            .unwrap()
            .keys()
            .filter(|p| p.parent() == Some(path))
            .cloned()
            .collect())
    }
}

// ============================================================================
// Manual clock
// ============================================================================

/// `Clock` whose time only moves when the test advances it.
pub struct ManualClock {
    now: StdMutex<DateTime<Utc>>,
}

impl ManualClock {
    /// A clock pinned to an arbitrary fixed instant.
    pub fn new() -> Self {
        Self::at(Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap())
    }

    pub fn at(start: DateTime<Utc>) -> Self {
        Self {
            now: StdMutex::new(start),
        }
    }

    pub fn advance(&self, delta: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += chrono::Duration::from_std(delta).unwrap();
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

// ============================================================================
// Counting synthesizer
// ============================================================================

/// `SpeechSynthesizer` returning deterministic bytes per text, with an
/// optional artificial latency and per-text scripted failures.
pub struct FakeSynthesizer {
    calls: AtomicUsize,
    delay: Duration,
    failures: StdMutex<HashMap<String, SynthesisError>>,
}

impl FakeSynthesizer {
    pub fn new() -> Self {
        Self::with_delay(Duration::ZERO)
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            delay,
            failures: StdMutex::new(HashMap::new()),
        }
    }

    /// Script a failure for requests with exactly this text.
    pub fn fail_for(&self, text: &str, error: SynthesisError) {
        self.failures.lock().unwrap().insert(text.to_string(), error);
    }

    /// Clear a scripted failure.
    pub fn succeed_for(&self, text: &str) {
        self.failures.lock().unwrap().remove(text);
    }

    /// Number of `synthesize` invocations so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The deterministic payload produced for `text`.
    pub fn payload_for(text: &str) -> Bytes {
        Bytes::from(format!("pcm:{}", text))
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeSynthesizer {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<Bytes, SynthesisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(error) = self.failures.lock().unwrap().get(&request.text) {
            return Err(error.clone());
        }
        Ok(Self::payload_for(&request.text))
    }
}

// ============================================================================
// Scriptable audio sink
// ============================================================================

/// `AudioSink` that records every interaction. In `auto` mode each item
/// completes immediately; in `gated` mode the test releases completions one
/// at a time (or fails them), which keeps control tests fully deterministic.
pub struct ScriptedSink {
    auto_complete: bool,
    started: StdMutex<Vec<PathBuf>>,
    start_count: watch::Sender<usize>,
    completions: AsyncMutex<mpsc::UnboundedReceiver<Result<(), String>>>,
    completions_tx: mpsc::UnboundedSender<Result<(), String>>,
    pauses: AtomicUsize,
    resumes: AtomicUsize,
    stops: AtomicUsize,
}

impl ScriptedSink {
    /// Sink where every item plays to completion instantly.
    pub fn auto() -> Self {
        Self::build(true)
    }

    /// Sink where each item finishes only when the test says so.
    pub fn gated() -> Self {
        Self::build(false)
    }

    fn build(auto_complete: bool) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let (start_count, _) = watch::channel(0usize);
        Self {
            auto_complete,
            started: StdMutex::new(Vec::new()),
            start_count,
            completions: AsyncMutex::new(completions_rx),
            completions_tx,
            pauses: AtomicUsize::new(0),
            resumes: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
        }
    }

    /// Let the currently playing (or next) item finish successfully.
    pub fn complete_next(&self) {
        self.completions_tx.send(Ok(())).ok();
    }

    /// Fail the currently playing (or next) item.
    pub fn fail_next(&self, message: &str) {
        self.completions_tx.send(Err(message.to_string())).ok();
    }

    /// Wait until at least `n` items have started playing.
    pub async fn wait_for_starts(&self, n: usize) {
        let mut rx = self.start_count.subscribe();
        rx.wait_for(|count| *count >= n)
            .await
            .expect("sink start counter dropped");
    }

    /// Paths handed to the sink, in order.
    pub fn started_paths(&self) -> Vec<PathBuf> {
        self.started.lock().unwrap().clone()
    }

    pub fn pause_count(&self) -> usize {
        self.pauses.load(Ordering::SeqCst)
    }

    pub fn resume_count(&self) -> usize {
        self.resumes.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AudioSink for ScriptedSink {
    async fn play_to_completion(&self, path: &Path) -> BridgeResult<()> {
        self.started.lock().unwrap().push(path.to_path_buf());
        self.start_count.send_modify(|count| *count += 1);
        if self.auto_complete {
            return Ok(());
        }
        let mut completions = self.completions.lock().await;
        match completions.recv().await {
            Some(Ok(())) => Ok(()),
            Some(Err(message)) => Err(BridgeError::OperationFailed(message)),
            None => Err(BridgeError::OperationFailed("sink torn down".to_string())),
        }
    }

    async fn pause(&self) -> BridgeResult<()> {
        self.pauses.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn resume(&self) -> BridgeResult<()> {
        self.resumes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) -> BridgeResult<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn seek(&self, _position: Duration) -> BridgeResult<()> {
        Ok(())
    }
}
