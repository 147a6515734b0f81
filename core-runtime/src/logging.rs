//! # Logging & Tracing Infrastructure
//!
//! Configures the `tracing-subscriber` stack for the voice core, supporting:
//! - Pretty, compact and JSON output formats
//! - Module-level filtering through `EnvFilter` directives
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
//!
//! let config = LoggingConfig::default()
//!     .with_format(LogFormat::Compact)
//!     .with_filter("info,core_speech=debug");
//!
//! init_logging(config).expect("Failed to initialize logging");
//!
//! tracing::info!("Voice core started");
//! ```
//!
//! Initialization installs a global default subscriber and therefore may run
//! only once per process; the host application calls it during startup.

use crate::error::{Result, RuntimeError};
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable pretty format with colors
    Pretty,
    /// Compact format for production
    Compact,
    /// Structured JSON format for machine parsing
    Json,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// `EnvFilter` directive string, e.g. `"info,core_speech=debug"`.
    /// The `RUST_LOG` environment variable overrides it when set.
    pub filter: String,
    /// Output format
    pub format: LogFormat,
    /// Include span enter/exit events in output
    pub with_spans: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: LogFormat::Pretty,
            with_spans: false,
        }
    }
}

impl LoggingConfig {
    /// Set the filter directive string.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    /// Set the output format.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Enable span enter/exit events.
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.with_spans = enabled;
        self
    }
}

/// Initialize the global tracing subscriber.
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .map_err(|e| RuntimeError::LoggingInit(format!("invalid filter directive: {}", e)))?;

    let span_events = if config.with_spans {
        fmt::format::FmtSpan::ENTER | fmt::format::FmtSpan::EXIT
    } else {
        fmt::format::FmtSpan::NONE
    };

    let registry = tracing_subscriber::registry().with(filter);

    let result = match config.format {
        LogFormat::Pretty => registry
            .with(fmt::layer().pretty().with_span_events(span_events))
            .try_init(),
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_span_events(span_events))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_span_events(span_events))
            .try_init(),
    };

    result.map_err(|e| RuntimeError::LoggingInit(e.to_string()))?;
    tracing::debug!(filter = %config.filter, format = ?config.format, "logging initialized");
    Ok(())
}
