//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the voice core and platform-specific
//! implementations. Each trait represents a capability that the core requires but
//! that must be implemented differently per platform (iOS, Android, desktop).
//!
//! ## Traits
//!
//! ### Storage
//! - [`FileSystemAccess`](storage::FileSystemAccess) - File I/O for the audio artifact cache
//!
//! ### Audio
//! - [`AudioSink`](audio::AudioSink) - Plays rendered audio files to completion with transport control
//! - [`SpeechSynthesizer`](synthesis::SpeechSynthesizer) - External text-to-speech generation collaborator
//! - [`VoiceProfileSource`](voice::VoiceProfileSource) - Active voice identity lookup
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//!
//! ## Error Handling
//!
//! Bridge traits use [`BridgeError`](error::BridgeError) for consistent error
//! handling, except the synthesizer, whose failures are pre-classified as
//! [`SynthesisError`](synthesis::SynthesisError) so the core can route
//! configuration errors and transient provider errors differently.
//! Platform implementations should:
//!
//! - Convert platform-specific errors to the bridge error types
//! - Provide actionable error messages
//! - Include error context (e.g., file paths, provider status codes)
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds to support safe concurrent
//! usage across async tasks. Implementations must ensure thread safety.

pub mod audio;
pub mod error;
pub mod storage;
pub mod synthesis;
pub mod time;
pub mod voice;

pub use error::BridgeError;

// Re-export commonly used types
pub use audio::AudioSink;
pub use storage::{FileMetadata, FileSystemAccess};
pub use synthesis::{SpeechSynthesizer, SynthesisError, SynthesisRequest};
pub use time::{Clock, SystemClock};
pub use voice::{StaticVoiceSource, VoiceProfileSource};
