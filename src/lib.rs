//! Workspace umbrella crate.
//!
//! Host applications can depend on `wvc-workspace` to pull in the whole
//! voice core without wiring each member crate individually. The real
//! functionality lives in the member crates:
//!
//! - [`bridge_traits`]: capability traits the host platform implements
//!   (file system, audio sink, speech synthesis provider, voice profiles).
//! - [`core_runtime`]: event bus and logging bootstrap.
//! - [`core_speech`]: audio artifact cache, synthesis coordinator, script
//!   playback engine and prefetcher, plus the [`core_speech::SpeechService`]
//!   facade that ties them together.

pub use bridge_traits;
pub use core_runtime;
pub use core_speech;
