//! Playback session state types.

use std::fmt;
use uuid::Uuid;

/// Unique identifier for one playback session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaybackSessionId(Uuid);

impl PlaybackSessionId {
    /// Generate a new session identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Construct an identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Borrow the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PlaybackSessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlaybackSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle phase of the playback engine.
///
/// `Idle → Playing → (Paused ⇄ Playing) → Completed`; stopping from
/// `Playing` or `Paused` returns the engine to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackPhase {
    /// No session active.
    Idle,
    /// A session is playing.
    Playing,
    /// The active session is paused.
    Paused,
    /// The last session played every segment.
    Completed,
}

/// Transient view of the active session, published through a `watch` channel
/// after every state change.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackProgress {
    /// Identifier of the session this progress belongs to, if any.
    pub session_id: Option<PlaybackSessionId>,
    /// Current lifecycle phase.
    pub phase: PlaybackPhase,
    /// Number of fully completed segments (also the index of the segment
    /// currently playing, while one is).
    pub segment_index: usize,
    /// Total segments in the script.
    pub total_segments: usize,
    /// Completed fraction, `segment_index / total_segments`.
    pub fraction: f64,
}

impl PlaybackProgress {
    /// Progress value for an engine with no session.
    pub fn idle() -> Self {
        Self {
            session_id: None,
            phase: PlaybackPhase::Idle,
            segment_index: 0,
            total_segments: 0,
            fraction: 0.0,
        }
    }
}

/// Transport commands posted to the active session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    /// Suspend the sink and any pending inter-segment wait.
    Pause,
    /// Resume from a pause.
    Resume,
    /// Halt the session and return to idle.
    Stop,
    /// Jump to the next segment.
    SkipNext,
    /// Jump to the previous segment.
    SkipPrevious,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_is_unique() {
        let a = PlaybackSessionId::new();
        let b = PlaybackSessionId::new();
        assert_ne!(a, b);
        assert_eq!(a, PlaybackSessionId::from_uuid(*a.as_uuid()));
    }

    #[test]
    fn idle_progress_shape() {
        let progress = PlaybackProgress::idle();
        assert_eq!(progress.phase, PlaybackPhase::Idle);
        assert_eq!(progress.fraction, 0.0);
        assert!(progress.session_id.is_none());
    }
}
