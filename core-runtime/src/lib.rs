//! # Core Runtime
//!
//! Ambient runtime services shared by the voice core crates:
//!
//! - [`events`]: typed event bus over `tokio::sync::broadcast`, carrying
//!   playback, cache and prefetch lifecycle events to the host application.
//! - [`logging`]: `tracing`/`tracing-subscriber` bootstrap with selectable
//!   output formats and env-filter directives.
//! - [`error`]: runtime error types.

pub mod error;
pub mod events;
pub mod logging;

pub use error::{Result, RuntimeError};
pub use events::{CacheEvent, CoreEvent, EventBus, PlaybackEvent, PrefetchEvent};
pub use logging::{init_logging, LogFormat, LoggingConfig};
