//! # Script Prefetcher
//!
//! Walks a script ahead of playback and populates the cache through the
//! shared synthesis coordinator, without producing audible output. Because
//! the coordinator deduplicates per key, a prewarm racing a live playback of
//! the same script never triggers redundant generations.
//!
//! Prewarming is best-effort: individual segment failures are counted and
//! logged but never abort the sweep.

use crate::cache::AudioCacheManager;
use crate::coordinator::SynthesisCoordinator;
use crate::script::{InterventionScript, Utterance};
use bridge_traits::voice::VoiceProfileSource;
use core_runtime::events::{CoreEvent, EventBus, PrefetchEvent};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Summary of one prewarm sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrewarmReport {
    /// Segments inspected.
    pub segments: usize,
    /// Segments already present in the cache.
    pub already_cached: usize,
    /// Segments generated during the sweep.
    pub generated: usize,
    /// Segments whose generation failed.
    pub failed: usize,
}

impl PrewarmReport {
    /// Segments for which a generation was attempted.
    pub fn attempted(&self) -> usize {
        self.generated + self.failed
    }

    /// Returns `true` if every segment is now cached.
    pub fn is_fully_warmed(&self) -> bool {
        self.failed == 0
    }
}

/// Best-effort cache warmer for upcoming scripts.
pub struct ScriptPrefetcher {
    cache: Arc<AudioCacheManager>,
    coordinator: Arc<SynthesisCoordinator>,
    voices: Arc<dyn VoiceProfileSource>,
    events: EventBus,
}

impl ScriptPrefetcher {
    /// Create a prefetcher sharing the playback stack's cache and
    /// coordinator.
    pub fn new(
        cache: Arc<AudioCacheManager>,
        coordinator: Arc<SynthesisCoordinator>,
        voices: Arc<dyn VoiceProfileSource>,
        events: EventBus,
    ) -> Self {
        Self {
            cache,
            coordinator,
            voices,
            events,
        }
    }

    /// Resolve every segment of `script` into the cache, discarding the
    /// artifact locations.
    #[instrument(skip(self, script), fields(title = script.title(), segments = script.len()))]
    pub async fn prewarm(&self, script: &InterventionScript) -> PrewarmReport {
        let mut report = PrewarmReport {
            segments: script.len(),
            ..Default::default()
        };

        let voice_id = self.voices.active_voice_id().await;
        for (index, segment) in script.segments().iter().enumerate() {
            let utterance = Utterance::for_segment(segment, voice_id.clone());
            if self.cache.get(&utterance).await.is_some() {
                report.already_cached += 1;
                continue;
            }

            match self.coordinator.resolve(segment).await {
                Ok(_) => report.generated += 1,
                Err(err) => {
                    warn!(segment = index, "prewarm generation failed: {}", err);
                    report.failed += 1;
                }
            }
        }

        debug!(
            already_cached = report.already_cached,
            generated = report.generated,
            failed = report.failed,
            "prewarm sweep finished"
        );
        self.events
            .emit(CoreEvent::Prefetch(PrefetchEvent::Completed {
                segments: report.segments,
                already_cached: report.already_cached,
                generated: report.generated,
                failed: report.failed,
            }))
            .ok();
        report
    }
}
