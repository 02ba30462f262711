//! Runtime error types.

use thiserror::Error;

use switchyard_core::ApiError;

use crate::config::ConfigError;

/// Errors that stop the runtime.
///
/// Failures of individual updates are logged and counted instead; see
/// [`RunStats`](crate::RunStats).
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Logging could not be initialised.
    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),

    /// The update source failed with a non-transient error.
    #[error("Update source failed: {0}")]
    Source(#[from] ApiError),
}

/// Errors from logging initialisation.
#[derive(Error, Debug)]
pub enum LoggingError {
    /// A global subscriber is already installed.
    #[error("Failed to install subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),

    /// The log file appender could not be created.
    #[error("Failed to create log file appender: {0}")]
    Appender(#[from] tracing_appender::rolling::InitError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
