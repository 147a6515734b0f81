use thiserror::Error;

/// Errors raised by runtime services.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Logging infrastructure could not be initialized.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// An event could not be delivered because no subscriber is listening.
    #[error("Event bus has no active subscribers")]
    EventBusClosed,
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
