//! Cache key derivation.
//!
//! A key identifies one synthesized artifact by what is spoken, the emotional
//! tone, and the voice that speaks it. The key is an explicit, documented
//! hash (SHA-256 over a canonical string, truncated to 128 bits and
//! hex-encoded), so the same request maps to the same on-disk file name
//! across runs, platforms and releases. Raw text never appears in file
//! names; the digest keeps them short and filesystem-safe.

use crate::script::{Emotion, Utterance};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Sentinel used in place of a voice identity when none is configured.
pub const DEFAULT_VOICE_SENTINEL: &str = "default";

/// File extension for cached artifacts (the provider returns encoded MP3).
const ARTIFACT_EXTENSION: &str = "mp3";

/// Deterministic identifier for a cached audio artifact.
///
/// Canonical form: `normalize(text) + "|" + emotion slug + "|" + voice id`
/// (or [`DEFAULT_VOICE_SENTINEL`]), hashed with SHA-256 and truncated to the
/// first 16 bytes, rendered as 32 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey {
    digest: String,
}

impl CacheKey {
    /// Derive the key for an utterance descriptor.
    pub fn for_utterance(utterance: &Utterance) -> Self {
        Self::derive(
            &utterance.text,
            utterance.emotion,
            utterance.voice_id.as_deref(),
        )
    }

    /// Derive the key from raw request parts.
    pub fn derive(text: &str, emotion: Emotion, voice_id: Option<&str>) -> Self {
        let canonical = format!(
            "{}|{}|{}",
            normalize_text(text),
            emotion.slug(),
            voice_id.unwrap_or(DEFAULT_VOICE_SENTINEL)
        );
        let digest = Sha256::digest(canonical.as_bytes());
        Self {
            digest: hex::encode(&digest[..16]),
        }
    }

    /// The 32-character hex digest.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// File name of the artifact this key addresses.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.digest, ARTIFACT_EXTENSION)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.digest)
    }
}

/// Text normalization applied before hashing: whitespace is collapsed and
/// case folded so trivially different spellings of the same prompt share an
/// artifact.
fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
