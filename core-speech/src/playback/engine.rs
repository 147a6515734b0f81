//! # Script Playback Engine
//!
//! Drives ordered segment lists through the synthesis coordinator and the
//! host audio sink as one timed, interruptible session.
//!
//! The engine is the single owner of session state. `play` runs the segment
//! loop on the caller's task; the transport methods (`pause`, `resume`,
//! `stop`, `skip_to_next`, `skip_to_previous`) post commands over a channel
//! that the loop `select!`s against at every suspension point (resolving
//! audio, waiting on the sink, holding inter-segment pauses), so control
//! takes effect promptly. Commands that are invalid for the current phase
//! (e.g. `resume` while playing) are ignored.
//!
//! Stopping a session abandons any wait on an in-flight generation but never
//! cancels the generation itself: it completes on its own task and populates
//! the cache for future reuse.

use crate::coordinator::SynthesisCoordinator;
use crate::error::{Result, SpeechError};
use crate::playback::session::{
    PlaybackPhase, PlaybackProgress, PlaybackSessionId, SessionCommand,
};
use crate::script::{InterventionScript, ScriptSegment};
use bridge_traits::audio::AudioSink;
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, instrument, warn};

struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
}

/// How a session ended when no error occurred.
enum SessionEnd {
    Completed,
    Stopped,
}

/// A transport command that broke out of the current wait.
enum Interrupt {
    Stopped,
    JumpTo(usize),
}

/// Outcome of playing or pausing through one segment step.
enum StepOutcome {
    Advance,
    Interrupted(Interrupt),
}

/// Outcome of resolving one segment's audio.
enum ResolveStep {
    Resolved(PathBuf),
    Interrupted(Interrupt),
}

/// Sequential, interruptible playback of intervention scripts.
pub struct ScriptPlaybackEngine {
    coordinator: Arc<SynthesisCoordinator>,
    sink: Arc<dyn AudioSink>,
    events: EventBus,
    session: Mutex<Option<SessionHandle>>,
    progress_tx: watch::Sender<PlaybackProgress>,
}

impl ScriptPlaybackEngine {
    /// Create an engine over the shared coordinator and host sink.
    pub fn new(
        coordinator: Arc<SynthesisCoordinator>,
        sink: Arc<dyn AudioSink>,
        events: EventBus,
    ) -> Self {
        let (progress_tx, _) = watch::channel(PlaybackProgress::idle());
        Self {
            coordinator,
            sink,
            events,
            session: Mutex::new(None),
            progress_tx,
        }
    }

    /// Play `script` from the first segment to the last.
    ///
    /// Returns once the session completes, is stopped, or fails. At most one
    /// session is active per engine: if one is already running, this fails
    /// with [`SpeechError::SessionBusy`] and never implicitly replaces the
    /// active session.
    ///
    /// A generation failure for any segment aborts the whole session with
    /// that segment's classified error; later segments are never attempted.
    /// A sink failure aborts with [`SpeechError::PlaybackFailed`]. An empty
    /// script completes immediately.
    #[instrument(skip(self, script), fields(title = script.title()))]
    pub async fn play(&self, script: InterventionScript) -> Result<()> {
        let session_id = PlaybackSessionId::new();
        let mut commands = {
            let mut slot = self.session.lock();
            if slot.is_some() {
                return Err(SpeechError::SessionBusy);
            }
            let (tx, rx) = mpsc::unbounded_channel();
            *slot = Some(SessionHandle { commands: tx });
            rx
        };

        let total = script.len();
        info!(%session_id, segments = total, "starting playback session");
        self.events
            .emit(CoreEvent::Playback(PlaybackEvent::SessionStarted {
                session_id: session_id.to_string(),
                title: script.title().to_string(),
                total_segments: total,
            }))
            .ok();
        if total > 0 {
            self.publish(session_id, PlaybackPhase::Playing, 0, total);
            self.emit_progress(session_id, 0.0);
        }

        let outcome = self.run_session(session_id, &script, &mut commands).await;

        // Release the session slot on every path.
        *self.session.lock() = None;

        match outcome {
            Ok(SessionEnd::Completed) => {
                info!(%session_id, "script completed");
                self.publish(session_id, PlaybackPhase::Completed, total, total);
                self.events
                    .emit(CoreEvent::Playback(PlaybackEvent::ScriptCompleted {
                        session_id: session_id.to_string(),
                        title: script.title().to_string(),
                    }))
                    .ok();
                Ok(())
            }
            Ok(SessionEnd::Stopped) => {
                info!(%session_id, "session stopped");
                self.progress_tx.send_replace(PlaybackProgress::idle());
                self.events
                    .emit(CoreEvent::Playback(PlaybackEvent::Stopped {
                        session_id: session_id.to_string(),
                    }))
                    .ok();
                Ok(())
            }
            Err((segment_index, err)) => {
                warn!(%session_id, segment = segment_index, "session aborted: {}", err);
                self.progress_tx.send_replace(PlaybackProgress::idle());
                self.events
                    .emit(CoreEvent::Playback(PlaybackEvent::ScriptFailed {
                        session_id: session_id.to_string(),
                        segment_index: Some(segment_index),
                        message: err.to_string(),
                        recoverable: err.is_transient(),
                    }))
                    .ok();
                Err(err)
            }
        }
    }

    /// Suspend the active session. Valid only while playing; otherwise a
    /// no-op.
    pub fn pause(&self) {
        self.send_command(SessionCommand::Pause);
    }

    /// Resume a paused session. Valid only while paused; otherwise a no-op.
    pub fn resume(&self) {
        self.send_command(SessionCommand::Resume);
    }

    /// Stop the active session and return the engine to idle.
    ///
    /// Cancels the current sink output and any pending inter-segment wait.
    /// In-flight generations are left to finish and populate the cache.
    pub fn stop(&self) {
        self.send_command(SessionCommand::Stop);
    }

    /// Jump to the next segment. Skipping past the last segment completes
    /// the script.
    pub fn skip_to_next(&self) {
        self.send_command(SessionCommand::SkipNext);
    }

    /// Jump to the previous segment. At the first segment this restarts it.
    pub fn skip_to_previous(&self) {
        self.send_command(SessionCommand::SkipPrevious);
    }

    /// Snapshot of the current session state.
    pub fn progress(&self) -> PlaybackProgress {
        self.progress_tx.borrow().clone()
    }

    /// Watch the session state as it changes.
    pub fn subscribe_progress(&self) -> watch::Receiver<PlaybackProgress> {
        self.progress_tx.subscribe()
    }

    /// Returns `true` while a session is active.
    pub fn is_active(&self) -> bool {
        self.session.lock().is_some()
    }

    // ------------------------------------------------------------------
    // Session loop
    // ------------------------------------------------------------------

    async fn run_session(
        &self,
        session_id: PlaybackSessionId,
        script: &InterventionScript,
        commands: &mut mpsc::UnboundedReceiver<SessionCommand>,
    ) -> std::result::Result<SessionEnd, (usize, SpeechError)> {
        let total = script.len();
        if total == 0 {
            debug!("empty script, completing immediately");
            return Ok(SessionEnd::Completed);
        }

        let mut index = 0usize;
        let mut paused = false;

        while index < total {
            let segment = &script.segments()[index];
            self.events
                .emit(CoreEvent::Playback(PlaybackEvent::SegmentStarted {
                    session_id: session_id.to_string(),
                    segment_index: index,
                    total_segments: total,
                }))
                .ok();

            let path = match self
                .resolve_segment(session_id, segment, index, commands, &mut paused)
                .await
                .map_err(|e| (index, e))?
            {
                ResolveStep::Resolved(path) => path,
                ResolveStep::Interrupted(Interrupt::Stopped) => return Ok(SessionEnd::Stopped),
                ResolveStep::Interrupted(Interrupt::JumpTo(next)) => {
                    index = next;
                    continue;
                }
            };

            // Honor a pause that arrived while the audio was resolving.
            if paused {
                if let Some(interrupt) = self
                    .wait_while_paused(session_id, index, commands, &mut paused)
                    .await
                {
                    match interrupt {
                        Interrupt::Stopped => return Ok(SessionEnd::Stopped),
                        Interrupt::JumpTo(next) => {
                            index = next;
                            continue;
                        }
                    }
                }
            }

            match self
                .play_segment(session_id, &path, index, commands, &mut paused)
                .await
                .map_err(|e| (index, e))?
            {
                StepOutcome::Advance => {}
                StepOutcome::Interrupted(Interrupt::Stopped) => return Ok(SessionEnd::Stopped),
                StepOutcome::Interrupted(Interrupt::JumpTo(next)) => {
                    index = next;
                    continue;
                }
            }

            if !segment.pause_after.is_zero() {
                match self
                    .segment_pause(session_id, segment.pause_after, index, commands, &mut paused)
                    .await
                {
                    StepOutcome::Advance => {}
                    StepOutcome::Interrupted(Interrupt::Stopped) => {
                        return Ok(SessionEnd::Stopped)
                    }
                    StepOutcome::Interrupted(Interrupt::JumpTo(next)) => {
                        index = next;
                        continue;
                    }
                }
            }

            index += 1;
            self.publish(session_id, PlaybackPhase::Playing, index, total);
            self.emit_progress(session_id, index as f64 / total as f64);
        }

        Ok(SessionEnd::Completed)
    }

    /// Resolve a segment's audio while staying responsive to transport
    /// commands. Stopping or skipping abandons the wait, not the generation.
    async fn resolve_segment(
        &self,
        session_id: PlaybackSessionId,
        segment: &ScriptSegment,
        index: usize,
        commands: &mut mpsc::UnboundedReceiver<SessionCommand>,
        paused: &mut bool,
    ) -> Result<ResolveStep> {
        let resolve = self.coordinator.resolve(segment);
        tokio::pin!(resolve);
        loop {
            tokio::select! {
                result = &mut resolve => {
                    return result.map(ResolveStep::Resolved);
                }
                cmd = commands.recv() => match cmd {
                    Some(SessionCommand::Pause) => {
                        if !*paused {
                            *paused = true;
                            self.note_paused(session_id);
                        }
                    }
                    Some(SessionCommand::Resume) => {
                        if *paused {
                            *paused = false;
                            self.note_resumed(session_id);
                        }
                    }
                    Some(SessionCommand::Stop) | None => {
                        return Ok(ResolveStep::Interrupted(Interrupt::Stopped));
                    }
                    Some(SessionCommand::SkipNext) => {
                        return Ok(ResolveStep::Interrupted(Interrupt::JumpTo(index + 1)));
                    }
                    Some(SessionCommand::SkipPrevious) => {
                        return Ok(ResolveStep::Interrupted(Interrupt::JumpTo(
                            index.saturating_sub(1),
                        )));
                    }
                }
            }
        }
    }

    /// Feed one artifact to the sink and wait for completion, handling
    /// transport commands along the way.
    async fn play_segment(
        &self,
        session_id: PlaybackSessionId,
        path: &Path,
        index: usize,
        commands: &mut mpsc::UnboundedReceiver<SessionCommand>,
        paused: &mut bool,
    ) -> Result<StepOutcome> {
        debug!(segment = index, "playing segment");
        let playback = self.sink.play_to_completion(path);
        tokio::pin!(playback);
        loop {
            tokio::select! {
                result = &mut playback => {
                    return match result {
                        Ok(()) => Ok(StepOutcome::Advance),
                        Err(e) => Err(SpeechError::PlaybackFailed(e.to_string())),
                    };
                }
                cmd = commands.recv() => match cmd {
                    Some(SessionCommand::Pause) => {
                        if !*paused {
                            *paused = true;
                            if let Err(e) = self.sink.pause().await {
                                warn!("sink pause failed: {}", e);
                            }
                            self.note_paused(session_id);
                        }
                    }
                    Some(SessionCommand::Resume) => {
                        if *paused {
                            *paused = false;
                            if let Err(e) = self.sink.resume().await {
                                warn!("sink resume failed: {}", e);
                            }
                            self.note_resumed(session_id);
                        }
                    }
                    Some(SessionCommand::Stop) | None => {
                        self.halt_sink().await;
                        return Ok(StepOutcome::Interrupted(Interrupt::Stopped));
                    }
                    Some(SessionCommand::SkipNext) => {
                        self.halt_sink().await;
                        return Ok(StepOutcome::Interrupted(Interrupt::JumpTo(index + 1)));
                    }
                    Some(SessionCommand::SkipPrevious) => {
                        self.halt_sink().await;
                        return Ok(StepOutcome::Interrupted(Interrupt::JumpTo(
                            index.saturating_sub(1),
                        )));
                    }
                }
            }
        }
    }

    /// Hold the segment's trailing pause. The wait is cancellable and
    /// pause-aware: pausing keeps the remaining time; resuming continues it;
    /// an elapsed portion is never replayed.
    async fn segment_pause(
        &self,
        session_id: PlaybackSessionId,
        duration: Duration,
        index: usize,
        commands: &mut mpsc::UnboundedReceiver<SessionCommand>,
        paused: &mut bool,
    ) -> StepOutcome {
        debug!(segment = index, ?duration, "inter-segment pause");
        let mut remaining = duration;
        loop {
            if *paused {
                if let Some(interrupt) = self
                    .wait_while_paused(session_id, index, commands, paused)
                    .await
                {
                    return StepOutcome::Interrupted(interrupt);
                }
            }
            if remaining.is_zero() {
                return StepOutcome::Advance;
            }
            let started = Instant::now();
            tokio::select! {
                _ = sleep(remaining) => return StepOutcome::Advance,
                cmd = commands.recv() => {
                    remaining = remaining.saturating_sub(started.elapsed());
                    match cmd {
                        Some(SessionCommand::Pause) => {
                            if !*paused {
                                *paused = true;
                                self.note_paused(session_id);
                            }
                        }
                        Some(SessionCommand::Resume) => {}
                        Some(SessionCommand::Stop) | None => {
                            return StepOutcome::Interrupted(Interrupt::Stopped);
                        }
                        Some(SessionCommand::SkipNext) => {
                            return StepOutcome::Interrupted(Interrupt::JumpTo(index + 1));
                        }
                        Some(SessionCommand::SkipPrevious) => {
                            return StepOutcome::Interrupted(Interrupt::JumpTo(
                                index.saturating_sub(1),
                            ));
                        }
                    }
                }
            }
        }
    }

    /// Block until the session is resumed, stopped or skipped.
    async fn wait_while_paused(
        &self,
        session_id: PlaybackSessionId,
        index: usize,
        commands: &mut mpsc::UnboundedReceiver<SessionCommand>,
        paused: &mut bool,
    ) -> Option<Interrupt> {
        while *paused {
            match commands.recv().await {
                Some(SessionCommand::Resume) => {
                    *paused = false;
                    self.note_resumed(session_id);
                }
                Some(SessionCommand::Pause) => {}
                Some(SessionCommand::Stop) | None => return Some(Interrupt::Stopped),
                Some(SessionCommand::SkipNext) => {
                    return Some(Interrupt::JumpTo(index + 1));
                }
                Some(SessionCommand::SkipPrevious) => {
                    return Some(Interrupt::JumpTo(index.saturating_sub(1)));
                }
            }
        }
        None
    }

    // ------------------------------------------------------------------
    // State publication
    // ------------------------------------------------------------------

    fn send_command(&self, command: SessionCommand) {
        let slot = self.session.lock();
        match slot.as_ref() {
            Some(handle) => {
                handle.commands.send(command).ok();
            }
            None => debug!(?command, "ignoring transport command with no active session"),
        }
    }

    fn publish(
        &self,
        session_id: PlaybackSessionId,
        phase: PlaybackPhase,
        index: usize,
        total: usize,
    ) {
        let fraction = if total == 0 {
            0.0
        } else {
            index as f64 / total as f64
        };
        self.progress_tx.send_replace(PlaybackProgress {
            session_id: Some(session_id),
            phase,
            segment_index: index,
            total_segments: total,
            fraction,
        });
    }

    fn emit_progress(&self, session_id: PlaybackSessionId, fraction: f64) {
        self.events
            .emit(CoreEvent::Playback(PlaybackEvent::ProgressChanged {
                session_id: session_id.to_string(),
                fraction,
            }))
            .ok();
    }

    fn note_paused(&self, session_id: PlaybackSessionId) {
        debug!(%session_id, "session paused");
        self.progress_tx
            .send_modify(|p| p.phase = PlaybackPhase::Paused);
        self.events
            .emit(CoreEvent::Playback(PlaybackEvent::Paused {
                session_id: session_id.to_string(),
            }))
            .ok();
    }

    fn note_resumed(&self, session_id: PlaybackSessionId) {
        debug!(%session_id, "session resumed");
        self.progress_tx
            .send_modify(|p| p.phase = PlaybackPhase::Playing);
        self.events
            .emit(CoreEvent::Playback(PlaybackEvent::Resumed {
                session_id: session_id.to_string(),
            }))
            .ok();
    }

    async fn halt_sink(&self) {
        if let Err(e) = self.sink.stop().await {
            warn!("sink stop failed: {}", e);
        }
    }
}
