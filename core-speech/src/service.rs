//! # Speech Service Facade
//!
//! Explicitly constructed, dependency-injected wiring of the voice core.
//! There are no process-wide singletons: the host builds one `SpeechService`
//! per cache it wants, injecting its platform bridges, and passes the
//! service (or handles to it) to consumers.
//!
//! ## Usage
//!
//! ```ignore
//! use core_speech::{CacheConfig, SpeechService};
//! use std::sync::Arc;
//!
//! let service = SpeechService::builder()
//!     .file_system(Arc::new(MyFileSystem))
//!     .audio_sink(Arc::new(MyAudioSink))
//!     .synthesizer(Arc::new(MySynthesizer))
//!     .voice_source(Arc::new(MyVoiceSource))
//!     .cache_config(CacheConfig::default())
//!     .build()?;
//!
//! service.initialize().await?;
//! service.play(script).await?;
//! ```

use crate::cache::{AudioCacheManager, CacheConfig, CacheStatistics};
use crate::coordinator::SynthesisCoordinator;
use crate::error::{Result, SpeechError};
use crate::playback::{PlaybackProgress, ScriptPlaybackEngine};
use crate::prefetch::{PrewarmReport, ScriptPrefetcher};
use crate::script::{Emotion, InterventionScript, Utterance};
use bridge_traits::audio::AudioSink;
use bridge_traits::storage::FileSystemAccess;
use bridge_traits::synthesis::SpeechSynthesizer;
use bridge_traits::time::{Clock, SystemClock};
use bridge_traits::voice::VoiceProfileSource;
use bytes::Bytes;
use core_runtime::events::EventBus;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;

/// The assembled voice core: cache, coordinator, playback engine and
/// prefetcher sharing one event bus.
pub struct SpeechService {
    cache: Arc<AudioCacheManager>,
    coordinator: Arc<SynthesisCoordinator>,
    engine: Arc<ScriptPlaybackEngine>,
    prefetcher: Arc<ScriptPrefetcher>,
    events: EventBus,
}

impl SpeechService {
    /// Start building a service.
    pub fn builder() -> SpeechServiceBuilder {
        SpeechServiceBuilder::default()
    }

    /// Initialize the cache (directory creation, index load, expiry sweep).
    /// Must be called once before the other operations.
    pub async fn initialize(&self) -> Result<()> {
        self.cache.initialize().await
    }

    // ------------------------------------------------------------------
    // Cache surface
    // ------------------------------------------------------------------

    /// Location of the cached artifact for `(text, emotion, voice_id)`, if
    /// present.
    pub async fn cached_location(
        &self,
        text: &str,
        emotion: Emotion,
        voice_id: Option<&str>,
    ) -> Option<PathBuf> {
        let utterance = Utterance::new(text, emotion, voice_id.map(str::to_string));
        self.cache.get(&utterance).await
    }

    /// Store externally produced audio for `(text, emotion, voice_id)` and
    /// return its location.
    pub async fn cache_audio(
        &self,
        audio: Bytes,
        text: &str,
        emotion: Emotion,
        voice_id: Option<&str>,
    ) -> Result<PathBuf> {
        let utterance = Utterance::new(text, emotion, voice_id.map(str::to_string));
        self.cache.put(audio, &utterance).await
    }

    /// Delete every cached artifact. Returns the number of entries removed.
    pub async fn clear_cache(&self) -> Result<usize> {
        self.cache.clear().await
    }

    /// Current cache statistics.
    pub async fn cache_statistics(&self) -> CacheStatistics {
        self.cache.statistics().await
    }

    // ------------------------------------------------------------------
    // Playback surface
    // ------------------------------------------------------------------

    /// Play a script as one session. See
    /// [`ScriptPlaybackEngine::play`].
    pub async fn play(&self, script: InterventionScript) -> Result<()> {
        self.engine.play(script).await
    }

    /// Pause the active session.
    pub fn pause(&self) {
        self.engine.pause();
    }

    /// Resume a paused session.
    pub fn resume(&self) {
        self.engine.resume();
    }

    /// Stop the active session.
    pub fn stop(&self) {
        self.engine.stop();
    }

    /// Jump to the next segment of the active session.
    pub fn skip_to_next(&self) {
        self.engine.skip_to_next();
    }

    /// Jump to the previous segment of the active session.
    pub fn skip_to_previous(&self) {
        self.engine.skip_to_previous();
    }

    /// Warm the cache for `script` without audible output.
    pub async fn prewarm(&self, script: &InterventionScript) -> PrewarmReport {
        self.prefetcher.prewarm(script).await
    }

    // ------------------------------------------------------------------
    // Observation
    // ------------------------------------------------------------------

    /// Snapshot of the playback state.
    pub fn progress(&self) -> PlaybackProgress {
        self.engine.progress()
    }

    /// Watch the playback state as it changes.
    pub fn subscribe_progress(&self) -> watch::Receiver<PlaybackProgress> {
        self.engine.subscribe_progress()
    }

    /// The event bus all components publish to.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// The underlying cache manager.
    pub fn cache(&self) -> &Arc<AudioCacheManager> {
        &self.cache
    }

    /// The underlying synthesis coordinator.
    pub fn coordinator(&self) -> &Arc<SynthesisCoordinator> {
        &self.coordinator
    }
}

/// Fail-fast builder for [`SpeechService`].
#[derive(Default)]
pub struct SpeechServiceBuilder {
    file_system: Option<Arc<dyn FileSystemAccess>>,
    audio_sink: Option<Arc<dyn AudioSink>>,
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    voice_source: Option<Arc<dyn VoiceProfileSource>>,
    clock: Option<Arc<dyn Clock>>,
    event_bus: Option<EventBus>,
    cache_config: Option<CacheConfig>,
}

impl SpeechServiceBuilder {
    /// Inject the host file system (required).
    pub fn file_system(mut self, fs: Arc<dyn FileSystemAccess>) -> Self {
        self.file_system = Some(fs);
        self
    }

    /// Inject the host audio sink (required).
    pub fn audio_sink(mut self, sink: Arc<dyn AudioSink>) -> Self {
        self.audio_sink = Some(sink);
        self
    }

    /// Inject the speech synthesis collaborator (required).
    pub fn synthesizer(mut self, synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    /// Inject the voice profile source (required).
    pub fn voice_source(mut self, voices: Arc<dyn VoiceProfileSource>) -> Self {
        self.voice_source = Some(voices);
        self
    }

    /// Inject a time source (defaults to [`SystemClock`]).
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Share an existing event bus (defaults to a fresh one).
    pub fn event_bus(mut self, events: EventBus) -> Self {
        self.event_bus = Some(events);
        self
    }

    /// Override the cache configuration (defaults to
    /// [`CacheConfig::default`]).
    pub fn cache_config(mut self, config: CacheConfig) -> Self {
        self.cache_config = Some(config);
        self
    }

    /// Assemble the service, validating that every required capability was
    /// provided.
    pub fn build(self) -> Result<SpeechService> {
        let file_system = self.file_system.ok_or_else(|| missing(
            "FileSystemAccess",
            "No file system implementation provided. Inject the platform storage adapter.",
        ))?;
        let audio_sink = self.audio_sink.ok_or_else(|| missing(
            "AudioSink",
            "No audio sink implementation provided. Inject the platform audio player adapter.",
        ))?;
        let synthesizer = self.synthesizer.ok_or_else(|| missing(
            "SpeechSynthesizer",
            "No synthesis provider implementation provided. Inject the TTS provider client.",
        ))?;
        let voice_source = self.voice_source.ok_or_else(|| missing(
            "VoiceProfileSource",
            "No voice profile source provided. Inject the host's voice settings adapter.",
        ))?;

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let events = self.event_bus.unwrap_or_default();
        let cache_config = self.cache_config.unwrap_or_default();
        cache_config
            .validate()
            .map_err(|e| SpeechError::Cache(format!("Invalid cache configuration: {}", e)))?;

        let cache = Arc::new(AudioCacheManager::new(
            cache_config,
            file_system,
            clock,
            events.clone(),
        ));
        let coordinator = Arc::new(SynthesisCoordinator::new(
            Arc::clone(&cache),
            synthesizer,
            Arc::clone(&voice_source),
        ));
        let engine = Arc::new(ScriptPlaybackEngine::new(
            Arc::clone(&coordinator),
            audio_sink,
            events.clone(),
        ));
        let prefetcher = Arc::new(ScriptPrefetcher::new(
            Arc::clone(&cache),
            Arc::clone(&coordinator),
            voice_source,
            events.clone(),
        ));

        Ok(SpeechService {
            cache,
            coordinator,
            engine,
            prefetcher,
            events,
        })
    }
}

fn missing(capability: &str, message: &str) -> SpeechError {
    SpeechError::CapabilityMissing {
        capability: capability.to_string(),
        message: message.to_string(),
    }
}
