//! # Speech Core Error Types
//!
//! Error taxonomy for cache, synthesis coordination and script playback.
//!
//! The enum is `Clone` because one synthesis outcome fans out to every caller
//! coalesced onto the same in-flight generation; payloads are therefore plain
//! strings rather than source errors.

use bridge_traits::synthesis::SynthesisError;
use thiserror::Error;

/// Errors that can occur during speech cache and playback operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpeechError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// No voice identity is configured; synthesis was not attempted.
    #[error("No voice profile configured")]
    NoVoiceProfile,

    /// A required host capability was not provided at construction.
    #[error("Missing capability {capability}: {message}")]
    CapabilityMissing {
        /// Name of the missing bridge capability.
        capability: String,
        /// Actionable guidance for the integrator.
        message: String,
    },

    // ========================================================================
    // Provider Errors
    // ========================================================================
    /// The synthesis provider could not be reached.
    #[error("Synthesis network error: {0}")]
    Network(String),

    /// The synthesis provider's usage quota is exhausted.
    #[error("Synthesis quota exceeded")]
    QuotaExceeded,

    /// The synthesis provider rejected the request.
    #[error("Synthesis API error: {0}")]
    Api(String),

    // ========================================================================
    // Storage Errors
    // ========================================================================
    /// Writing an audio artifact to cache storage failed.
    #[error("Failed to write cache artifact: {0}")]
    StorageWrite(String),

    /// Cache bookkeeping failed (directory resolution, index I/O).
    #[error("Cache error: {0}")]
    Cache(String),

    // ========================================================================
    // Playback Errors
    // ========================================================================
    /// The audio sink failed to play a resolved artifact.
    #[error("Playback failed: {0}")]
    PlaybackFailed(String),

    /// A playback session is already active on this engine.
    #[error("A playback session is already active")]
    SessionBusy,

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// Internal error (should not occur in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SpeechError {
    /// Returns `true` if this error is a configuration problem the user must
    /// fix before retrying (retrying the same request cannot succeed).
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SpeechError::NoVoiceProfile | SpeechError::CapabilityMissing { .. }
        )
    }

    /// Returns `true` if this error came from the synthesis provider and a
    /// fresh request may succeed later.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SpeechError::Network(_) | SpeechError::QuotaExceeded | SpeechError::Api(_)
        )
    }

    /// Returns `true` if this error is related to local cache storage.
    pub fn is_storage(&self) -> bool {
        matches!(self, SpeechError::StorageWrite(_) | SpeechError::Cache(_))
    }
}

impl From<SynthesisError> for SpeechError {
    fn from(err: SynthesisError) -> Self {
        match err {
            SynthesisError::NoVoiceProfile => SpeechError::NoVoiceProfile,
            SynthesisError::Network(message) => SpeechError::Network(message),
            SynthesisError::QuotaExceeded => SpeechError::QuotaExceeded,
            SynthesisError::Api(message) => SpeechError::Api(message),
        }
    }
}

/// Result type for speech core operations.
pub type Result<T> = std::result::Result<T, SpeechError>;
