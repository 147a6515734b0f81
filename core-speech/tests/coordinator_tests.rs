//! Dedup and failure-propagation tests for the synthesis coordinator.

mod common;

use bridge_traits::synthesis::{SpeechSynthesizer, SynthesisError, SynthesisRequest};
use bridge_traits::voice::{StaticVoiceSource, VoiceProfileSource};
use bytes::Bytes;
use common::{FakeSynthesizer, ManualClock, MemoryFileSystem};
use core_runtime::events::EventBus;
use core_speech::cache::{AudioCacheManager, CacheConfig};
use core_speech::coordinator::SynthesisCoordinator;
use core_speech::error::SpeechError;
use core_speech::script::{Emotion, ScriptSegment, Utterance};
use std::sync::Arc;
use std::time::Duration;

async fn build_coordinator(
    voice: Option<&str>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
) -> (Arc<SynthesisCoordinator>, Arc<AudioCacheManager>) {
    let fs = Arc::new(MemoryFileSystem::new());
    let clock = Arc::new(ManualClock::new());
    let cache = Arc::new(AudioCacheManager::new(
        CacheConfig::default(),
        fs,
        clock,
        EventBus::new(64),
    ));
    cache.initialize().await.unwrap();

    let voices: Arc<dyn VoiceProfileSource> = match voice {
        Some(id) => Arc::new(StaticVoiceSource::new(id)),
        None => Arc::new(StaticVoiceSource::unconfigured()),
    };
    let coordinator = Arc::new(SynthesisCoordinator::new(
        Arc::clone(&cache),
        synthesizer,
        voices,
    ));
    (coordinator, cache)
}

#[tokio::test(start_paused = true)]
async fn concurrent_resolvers_trigger_exactly_one_generation() {
    let synthesizer = Arc::new(FakeSynthesizer::with_delay(Duration::from_millis(500)));
    let (coordinator, _) = build_coordinator(Some("v1"), synthesizer.clone()).await;

    let segment = ScriptSegment::new("Breathe in slowly", Emotion::Calm);
    let mut handles = Vec::new();
    for _ in 0..5 {
        let coordinator = Arc::clone(&coordinator);
        let segment = segment.clone();
        handles.push(tokio::spawn(
            async move { coordinator.resolve(&segment).await },
        ));
    }

    let mut paths = Vec::new();
    for handle in handles {
        paths.push(handle.await.unwrap().unwrap());
    }

    assert_eq!(synthesizer.call_count(), 1, "generation must be coalesced");
    assert!(paths.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(coordinator.inflight_count().await, 0);
}

#[tokio::test]
async fn cache_hit_resolves_without_generation() {
    let synthesizer = Arc::new(FakeSynthesizer::new());
    let (coordinator, cache) = build_coordinator(Some("v1"), synthesizer.clone()).await;

    let utterance = Utterance::new("Take a deep breath", Emotion::Neutral, Some("v1".to_string()));
    let stored = cache
        .put(Bytes::from_static(b"prerendered"), &utterance)
        .await
        .unwrap();

    let segment = ScriptSegment::new("Take a deep breath", Emotion::Neutral);
    let resolved = coordinator.resolve(&segment).await.unwrap();

    assert_eq!(resolved, stored);
    assert_eq!(synthesizer.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn failure_propagates_to_every_waiter_without_retry() {
    let synthesizer = Arc::new(FakeSynthesizer::with_delay(Duration::from_millis(200)));
    synthesizer.fail_for("Affirm yourself", SynthesisError::QuotaExceeded);
    let (coordinator, cache) = build_coordinator(Some("v1"), synthesizer.clone()).await;

    let segment = ScriptSegment::new("Affirm yourself", Emotion::Encouraging);
    let mut handles = Vec::new();
    for _ in 0..3 {
        let coordinator = Arc::clone(&coordinator);
        let segment = segment.clone();
        handles.push(tokio::spawn(
            async move { coordinator.resolve(&segment).await },
        ));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap(), Err(SpeechError::QuotaExceeded));
    }
    assert_eq!(synthesizer.call_count(), 1, "waiters share one failed call");
    assert_eq!(coordinator.inflight_count().await, 0, "failures must not leak");

    // Nothing was cached for the failed key.
    let utterance = Utterance::new("Affirm yourself", Emotion::Encouraging, Some("v1".to_string()));
    assert!(cache.get(&utterance).await.is_none());

    // The coordinator does not retry on its own, but a fresh request may.
    synthesizer.succeed_for("Affirm yourself");
    let resolved = coordinator.resolve(&segment).await;
    assert!(resolved.is_ok());
    assert_eq!(synthesizer.call_count(), 2);
}

mockall::mock! {
    pub Provider {}

    #[async_trait::async_trait]
    impl SpeechSynthesizer for Provider {
        async fn synthesize(&self, request: SynthesisRequest) -> Result<Bytes, SynthesisError>;
    }
}

#[tokio::test]
async fn missing_voice_profile_short_circuits_before_any_provider_call() {
    let mut provider = MockProvider::new();
    provider.expect_synthesize().times(0);
    let (coordinator, _) = build_coordinator(None, Arc::new(provider)).await;

    let segment = ScriptSegment::new("Hello there", Emotion::Neutral);
    let result = coordinator.resolve(&segment).await;

    assert_eq!(result, Err(SpeechError::NoVoiceProfile));
    assert_eq!(coordinator.inflight_count().await, 0);
}

#[tokio::test]
async fn default_voice_artifacts_are_served_even_without_a_profile() {
    let mut provider = MockProvider::new();
    provider.expect_synthesize().times(0);
    let (coordinator, cache) = build_coordinator(None, Arc::new(provider)).await;

    // A bundled artifact cached under the default-voice sentinel.
    let utterance = Utterance::new("Welcome back", Emotion::Calm, None);
    let stored = cache
        .put(Bytes::from_static(b"bundled"), &utterance)
        .await
        .unwrap();

    let segment = ScriptSegment::new("Welcome back", Emotion::Calm);
    assert_eq!(coordinator.resolve(&segment).await.unwrap(), stored);
}

#[tokio::test]
async fn successful_generation_lands_in_the_cache() {
    let synthesizer = Arc::new(FakeSynthesizer::new());
    let (coordinator, cache) = build_coordinator(Some("v7"), synthesizer.clone()).await;

    let segment = ScriptSegment::new("You are doing well", Emotion::Compassionate);
    let resolved = coordinator.resolve(&segment).await.unwrap();

    let utterance = Utterance::new(
        "You are doing well",
        Emotion::Compassionate,
        Some("v7".to_string()),
    );
    assert_eq!(cache.get(&utterance).await, Some(resolved));
    assert_eq!(cache.statistics().await.item_count, 1);

    // A second resolve is now a pure cache hit.
    coordinator.resolve(&segment).await.unwrap();
    assert_eq!(synthesizer.call_count(), 1);
}
