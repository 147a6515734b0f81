//! # Speech Core
//!
//! Synthesized-audio artifact cache and guided multi-segment playback engine.
//!
//! ## Overview
//!
//! Given a request described by (text, emotional tone, voice identity), this
//! crate either returns a previously generated audio artifact or triggers
//! exactly one external generation call, persists the result, and plays back
//! sequences of such artifacts ("scripts") as timed, interruptible sessions.
//!
//! Components:
//! - [`cache`]: durable key→file store with LRU size eviction, age expiry
//!   and a persisted index snapshot.
//! - [`coordinator`]: per-key deduplication of concurrent generation calls
//!   against the external synthesis collaborator.
//! - [`playback`]: sequential session state machine with
//!   pause/resume/stop/skip and inter-segment pauses.
//! - [`prefetch`]: best-effort cache warming ahead of playback.
//! - [`service`]: dependency-injected facade wiring the above to the host's
//!   bridge implementations.
//!
//! Data flow: caller → playback engine → (per segment) coordinator →
//! cache `get`; on miss → synthesis collaborator → cache `put` →
//! coordinator resolves all waiters → engine plays the artifact → advances.

pub mod cache;
pub mod coordinator;
pub mod error;
pub mod playback;
pub mod prefetch;
pub mod script;
pub mod service;

pub use cache::{AudioCacheManager, CacheConfig, CacheKey, CacheStatistics};
pub use coordinator::SynthesisCoordinator;
pub use error::{Result, SpeechError};
pub use playback::{PlaybackPhase, PlaybackProgress, PlaybackSessionId, ScriptPlaybackEngine};
pub use prefetch::{PrewarmReport, ScriptPrefetcher};
pub use script::{
    Emotion, HapticCue, InterventionScript, ScriptSegment, Utterance, VoiceTuning,
};
pub use service::{SpeechService, SpeechServiceBuilder};
