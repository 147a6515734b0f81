//! # Script Playback
//!
//! Sequential playback of intervention scripts with pause/resume/stop/skip
//! control and inter-segment pauses.

pub mod engine;
pub mod session;

pub use engine::ScriptPlaybackEngine;
pub use session::{PlaybackPhase, PlaybackProgress, PlaybackSessionId, SessionCommand};
