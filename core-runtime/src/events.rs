//! # Event Bus System
//!
//! Provides an event-driven architecture for the voice core using
//! `tokio::sync::broadcast`. Core modules publish typed events; the host
//! application (and tests) subscribe to drive notifications, UI state and
//! analytics without coupling to module internals.
//!
//! ## Usage
//!
//! ### Creating an Event Bus
//!
//! ```rust
//! use core_runtime::events::EventBus;
//!
//! let event_bus = EventBus::new(100); // Buffer size of 100 events
//! ```
//!
//! ### Publishing Events
//!
//! ```rust
//! use core_runtime::events::{EventBus, CoreEvent, CacheEvent};
//!
//! # let event_bus = EventBus::new(100);
//! let event = CoreEvent::Cache(CacheEvent::Cleared { entries_removed: 12 });
//!
//! event_bus.emit(event).ok();
//! ```
//!
//! ### Subscribing to Events
//!
//! ```rust
//! use core_runtime::events::{EventBus, CoreEvent};
//! use tokio::sync::broadcast::error::RecvError;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut stream = event_bus.subscribe();
//!
//! tokio::spawn(async move {
//!     loop {
//!         match stream.recv().await {
//!             Ok(event) => println!("Received: {:?}", event),
//!             Err(RecvError::Lagged(n)) => {
//!                 eprintln!("Missed {} events", n);
//!             }
//!             Err(RecvError::Closed) => break,
//!         }
//!     }
//! });
//! # }
//! ```
//!
//! ## Error Handling
//!
//! `tokio::sync::broadcast` can produce two receive errors:
//!
//! - **`RecvError::Lagged(n)`**: subscriber was too slow and missed `n`
//!   events. Non-fatal; the subscriber can continue receiving new events.
//! - **`RecvError::Closed`**: all senders have been dropped; treat as
//!   shutdown.
//!
//! Events carry plain data (strings and numbers, never domain structs) so
//! subscribers never pull module internals into their dependency graph.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// This value balances memory usage with the ability to handle bursts of
/// events. Subscribers that can't keep up will receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
///
/// This is the main event type published and received through the event bus.
/// It wraps domain-specific event types for different modules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Script playback lifecycle events
    Playback(PlaybackEvent),
    /// Audio cache maintenance events
    Cache(CacheEvent),
    /// Cache prewarm events
    Prefetch(PrefetchEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Playback(e) => e.description(),
            CoreEvent::Cache(e) => e.description(),
            CoreEvent::Prefetch(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Playback(PlaybackEvent::ScriptFailed { .. }) => EventSeverity::Error,
            CoreEvent::Playback(PlaybackEvent::ScriptCompleted { .. }) => EventSeverity::Info,
            CoreEvent::Playback(PlaybackEvent::SessionStarted { .. }) => EventSeverity::Info,
            CoreEvent::Cache(CacheEvent::Cleared { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose)
    Debug,
    /// Informational events
    Info,
    /// Warning events
    Warning,
    /// Error events
    Error,
}

// ============================================================================
// Playback Events
// ============================================================================

/// Events emitted by the script playback engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    /// A playback session started.
    SessionStarted {
        /// Unique identifier of the session.
        session_id: String,
        /// Title of the script being played.
        title: String,
        /// Number of segments in the script.
        total_segments: usize,
    },
    /// A segment began playing.
    SegmentStarted {
        /// The session ID.
        session_id: String,
        /// Zero-based index of the segment.
        segment_index: usize,
        /// Number of segments in the script.
        total_segments: usize,
    },
    /// Session progress advanced.
    ProgressChanged {
        /// The session ID.
        session_id: String,
        /// Fraction of segments completed, `0.0..=1.0`.
        fraction: f64,
    },
    /// The session was paused.
    Paused {
        /// The session ID.
        session_id: String,
    },
    /// The session resumed after a pause.
    Resumed {
        /// The session ID.
        session_id: String,
    },
    /// The session was stopped before completing.
    Stopped {
        /// The session ID.
        session_id: String,
    },
    /// Every segment of the script finished playing.
    ScriptCompleted {
        /// The session ID.
        session_id: String,
        /// Title of the completed script.
        title: String,
    },
    /// The session aborted with an error.
    ScriptFailed {
        /// The session ID.
        session_id: String,
        /// Index of the segment that failed, if playback got that far.
        segment_index: Option<usize>,
        /// Human-readable error message.
        message: String,
        /// Whether a fresh `play` may succeed (transient provider errors).
        recoverable: bool,
    },
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::SessionStarted { .. } => "Playback session started",
            PlaybackEvent::SegmentStarted { .. } => "Segment started",
            PlaybackEvent::ProgressChanged { .. } => "Playback progress changed",
            PlaybackEvent::Paused { .. } => "Playback paused",
            PlaybackEvent::Resumed { .. } => "Playback resumed",
            PlaybackEvent::Stopped { .. } => "Playback stopped",
            PlaybackEvent::ScriptCompleted { .. } => "Script completed",
            PlaybackEvent::ScriptFailed { .. } => "Script failed",
        }
    }
}

// ============================================================================
// Cache Events
// ============================================================================

/// Events emitted by the audio cache manager.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum CacheEvent {
    /// Entries were evicted under size pressure or age expiry.
    EntriesEvicted {
        /// Number of entries removed.
        entries_removed: usize,
        /// Bytes reclaimed.
        bytes_freed: u64,
    },
    /// The cache was cleared wholesale.
    Cleared {
        /// Number of entries removed.
        entries_removed: usize,
    },
}

impl CacheEvent {
    fn description(&self) -> &str {
        match self {
            CacheEvent::EntriesEvicted { .. } => "Cache entries evicted",
            CacheEvent::Cleared { .. } => "Cache cleared",
        }
    }
}

// ============================================================================
// Prefetch Events
// ============================================================================

/// Events emitted by the script prefetcher.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PrefetchEvent {
    /// A prewarm sweep finished.
    Completed {
        /// Number of segments inspected.
        segments: usize,
        /// Segments already present in the cache.
        already_cached: usize,
        /// Segments generated during the sweep.
        generated: usize,
        /// Segments whose generation failed.
        failed: usize,
    },
}

impl PrefetchEvent {
    fn description(&self) -> &str {
        match self {
            PrefetchEvent::Completed { .. } => "Prefetch completed",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Uses `tokio::sync::broadcast` internally, which provides:
/// - Multiple producers (clone the `EventBus`)
/// - Multiple consumers (each `subscribe()` creates a new receiver)
/// - Non-blocking sends (events are cloned for each subscriber)
/// - Lagging detection (slow subscribers get `RecvError::Lagged`)
///
/// # Example
///
/// ```rust
/// use core_runtime::events::{EventBus, CoreEvent, CacheEvent};
///
/// # #[tokio::main]
/// # async fn main() {
/// let event_bus = EventBus::new(100);
///
/// let mut subscriber = event_bus.subscribe();
///
/// let event = CoreEvent::Cache(CacheEvent::Cleared { entries_removed: 3 });
/// event_bus.emit(event.clone()).ok();
///
/// assert_eq!(subscriber.recv().await.unwrap(), event);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of events to buffer per subscriber.
    ///   When a subscriber falls behind by more than this amount, it will
    ///   receive a `RecvError::Lagged` error.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event.
    /// Returns an error if there are no active subscribers; emitting into an
    /// empty bus is not a fault, so callers typically `.ok()` the result.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscription to the event stream.
    ///
    /// Each subscriber receives every event emitted after the subscription
    /// was created.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}
