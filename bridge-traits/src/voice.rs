//! Voice profile source.
//!
//! The host owns voice selection (account settings, cloned voices,
//! entitlements); the core only asks which voice identity, if any, is
//! currently active. A `None` answer makes synthesis impossible and the
//! coordinator short-circuits with a configuration error before any network
//! activity.

use async_trait::async_trait;

/// Supplies the currently active provider voice identity.
#[async_trait]
pub trait VoiceProfileSource: Send + Sync {
    /// The provider voice id to synthesize with, or `None` when the user has
    /// not configured one.
    async fn active_voice_id(&self) -> Option<String>;
}

/// Fixed voice source, convenient for hosts with a single bundled voice and
/// for tests.
#[derive(Debug, Clone)]
pub struct StaticVoiceSource {
    voice_id: Option<String>,
}

impl StaticVoiceSource {
    /// A source that always reports `voice_id`.
    pub fn new(voice_id: impl Into<String>) -> Self {
        Self {
            voice_id: Some(voice_id.into()),
        }
    }

    /// A source that reports no configured voice.
    pub fn unconfigured() -> Self {
        Self { voice_id: None }
    }
}

#[async_trait]
impl VoiceProfileSource for StaticVoiceSource {
    async fn active_voice_id(&self) -> Option<String> {
        self.voice_id.clone()
    }
}
