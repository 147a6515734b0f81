//! # Synthesis Coordinator
//!
//! Makes "generate speech for key K" idempotent across concurrent callers.
//!
//! The coordinator fronts the external synthesis collaborator with the audio
//! cache and an in-flight table: at most one outstanding generation exists
//! per distinct cache key, across playback and prefetch callers sharing the
//! same instance. Concurrent resolvers of the same key all await the one
//! pending outcome, success or failure, and the table entry is removed
//! unconditionally when the generation finishes, so failures never leak
//! entries.
//!
//! Generations run on spawned tasks. A caller that stops waiting (a stopped
//! playback session, for example) therefore never cancels a generation that
//! other waiters may depend on; the finished artifact still lands in the
//! cache for future reuse.

use crate::cache::{AudioCacheManager, CacheKey};
use crate::error::{Result, SpeechError};
use crate::script::{ScriptSegment, Utterance, VoiceTuning};
use bridge_traits::synthesis::{SpeechSynthesizer, SynthesisRequest};
use bridge_traits::voice::VoiceProfileSource;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, instrument, warn};

type SynthesisOutcome = Result<PathBuf>;
type OutcomeReceiver = watch::Receiver<Option<SynthesisOutcome>>;

/// Deduplicating front door to the external speech generation collaborator.
pub struct SynthesisCoordinator {
    cache: Arc<AudioCacheManager>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    voices: Arc<dyn VoiceProfileSource>,
    inflight: Arc<Mutex<HashMap<CacheKey, OutcomeReceiver>>>,
}

impl SynthesisCoordinator {
    /// Create a coordinator over the shared cache and collaborators.
    pub fn new(
        cache: Arc<AudioCacheManager>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        voices: Arc<dyn VoiceProfileSource>,
    ) -> Self {
        Self {
            cache,
            synthesizer,
            voices,
            inflight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Resolve the artifact location for a script segment, generating it at
    /// most once per key across all concurrent callers.
    #[instrument(skip(self, segment), fields(emotion = segment.emotion.slug()))]
    pub async fn resolve(&self, segment: &ScriptSegment) -> Result<PathBuf> {
        let voice_id = self.voices.active_voice_id().await;
        let utterance = Utterance::for_segment(segment, voice_id);
        self.resolve_utterance(&utterance, segment.tuning(), segment.speaking_rate)
            .await
    }

    /// Resolve an utterance descriptor with explicit delivery parameters.
    pub async fn resolve_utterance(
        &self,
        utterance: &Utterance,
        tuning: VoiceTuning,
        speaking_rate: f32,
    ) -> Result<PathBuf> {
        let key = CacheKey::for_utterance(utterance);

        if let Some(path) = self.cache.get_by_key(&key).await {
            debug!(%key, "cache hit, no generation needed");
            return Ok(path);
        }

        let rx = {
            let mut inflight = self.inflight.lock().await;
            match inflight.get(&key) {
                Some(rx) => {
                    debug!(%key, "joining in-flight generation");
                    rx.clone()
                }
                None => {
                    // Refuse to dispatch without a voice identity, before any
                    // network activity.
                    let Some(voice_id) = utterance.voice_id.clone() else {
                        return Err(SpeechError::NoVoiceProfile);
                    };
                    let (tx, rx) = watch::channel(None);
                    inflight.insert(key.clone(), rx.clone());
                    self.spawn_generation(
                        key.clone(),
                        utterance.clone(),
                        voice_id,
                        tuning,
                        speaking_rate,
                        tx,
                    );
                    rx
                }
            }
        };

        await_outcome(rx).await
    }

    /// Number of generations currently in flight.
    pub async fn inflight_count(&self) -> usize {
        self.inflight.lock().await.len()
    }

    fn spawn_generation(
        &self,
        key: CacheKey,
        utterance: Utterance,
        voice_id: String,
        tuning: VoiceTuning,
        speaking_rate: f32,
        tx: watch::Sender<Option<SynthesisOutcome>>,
    ) {
        let cache = Arc::clone(&self.cache);
        let synthesizer = Arc::clone(&self.synthesizer);
        let inflight = Arc::clone(&self.inflight);

        tokio::spawn(async move {
            debug!(%key, "dispatching synthesis");
            let request = SynthesisRequest {
                text: utterance.text.clone(),
                voice_id,
                emotion: utterance.emotion.slug().to_string(),
                stability: tuning.stability,
                similarity: tuning.similarity,
                style: tuning.style,
                speaker_boost: tuning.speaker_boost,
                speaking_rate,
            };

            let outcome: SynthesisOutcome = match synthesizer.synthesize(request).await {
                Ok(audio) => cache.put(audio, &utterance).await,
                Err(err) => {
                    warn!(%key, "synthesis failed: {}", err);
                    Err(SpeechError::from(err))
                }
            };

            // The table entry must go away on every path, success or failure,
            // before the outcome is published.
            inflight.lock().await.remove(&key);
            tx.send(Some(outcome)).ok();
        });
    }
}

/// Await the shared outcome of an in-flight generation.
async fn await_outcome(mut rx: OutcomeReceiver) -> Result<PathBuf> {
    let outcome = rx
        .wait_for(Option::is_some)
        .await
        .map_err(|_| {
            SpeechError::Internal("synthesis task terminated without a result".to_string())
        })?
        .clone();

    match outcome {
        Some(result) => result,
        None => Err(SpeechError::Internal(
            "synthesis outcome slot was empty".to_string(),
        )),
    }
}
