//! Speech synthesis provider abstraction.
//!
//! The external text-to-speech collaborator: a network call that turns text
//! plus delivery settings into rendered audio bytes. The core treats it as a
//! costly, rate-limited resource. It deduplicates and caches around this
//! trait but never retries inside it. Failures are pre-classified so the
//! calling layers can distinguish configuration problems from transient
//! provider errors.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One synthesis invocation.
///
/// `emotion` is a stable lowercase slug (e.g. `"calm"`); the voice-tuning
/// fields follow the provider's voice-settings model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisRequest {
    /// Text to render.
    pub text: String,
    /// Provider voice identifier to render with.
    pub voice_id: String,
    /// Emotional tone slug driving provider-side delivery.
    pub emotion: String,
    /// Voice stability, `0.0..=1.0`. Lower is more expressive.
    pub stability: f32,
    /// Similarity boost, `0.0..=1.0`.
    pub similarity: f32,
    /// Style exaggeration, `0.0..=1.0`.
    pub style: f32,
    /// Whether to enable provider speaker boost.
    pub speaker_boost: bool,
    /// Speaking rate multiplier (1.0 = natural pace).
    pub speaking_rate: f32,
}

/// Classified synthesis failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SynthesisError {
    /// No voice identity is configured for the requesting profile.
    #[error("No voice profile configured")]
    NoVoiceProfile,

    /// The provider could not be reached.
    #[error("Synthesis network error: {0}")]
    Network(String),

    /// The provider's usage quota is exhausted.
    #[error("Synthesis quota exceeded")]
    QuotaExceeded,

    /// The provider rejected the request.
    #[error("Synthesis API error: {0}")]
    Api(String),
}

/// External text-to-speech generation collaborator.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Render `request` into encoded audio bytes.
    async fn synthesize(&self, request: SynthesisRequest) -> Result<Bytes, SynthesisError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthesis_error_display() {
        assert_eq!(
            SynthesisError::NoVoiceProfile.to_string(),
            "No voice profile configured"
        );
        assert_eq!(
            SynthesisError::Network("timeout".to_string()).to_string(),
            "Synthesis network error: timeout"
        );
        assert_eq!(
            SynthesisError::QuotaExceeded.to_string(),
            "Synthesis quota exceeded"
        );
    }

    #[test]
    fn synthesis_request_roundtrip() {
        let request = SynthesisRequest {
            text: "Take a deep breath".to_string(),
            voice_id: "voice-1".to_string(),
            emotion: "calm".to_string(),
            stability: 0.6,
            similarity: 0.8,
            style: 0.2,
            speaker_boost: true,
            speaking_rate: 0.95,
        };

        let json = serde_json::to_string(&request).unwrap();
        let back: SynthesisRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, request);
    }
}
