//! Audio output sink abstraction.
//!
//! The core hands fully rendered audio files to the host's audio engine and
//! waits for completion; it never decodes or mixes samples itself. Hosts
//! implement this on top of their platform player (AVAudioPlayer, MediaPlayer,
//! rodio, ...). The sink models one logical output; the playback engine
//! serializes access to it.

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// Playback sink for rendered audio artifacts.
#[async_trait]
pub trait AudioSink: Send + Sync {
    /// Play the file at `path` from start to finish.
    ///
    /// Resolves with `Ok(())` once the item has played to completion, or with
    /// an error if the file cannot be opened or decoded. Callers may invoke
    /// the transport-control methods concurrently while this future is
    /// pending; [`AudioSink::stop`] causes the pending playback to terminate.
    async fn play_to_completion(&self, path: &Path) -> Result<()>;

    /// Pause the current item without releasing it. Position is preserved.
    async fn pause(&self) -> Result<()>;

    /// Resume a paused item.
    async fn resume(&self) -> Result<()>;

    /// Halt the current item and discard it.
    async fn stop(&self) -> Result<()>;

    /// Seek to an absolute position within the current item.
    async fn seek(&self, position: Duration) -> Result<()>;
}
