// src/error.rs
use thiserror::Error;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, AgentError>;

/// Custom Error type for the service-metrics library
///
/// Per-cycle failures (process, payload, sink) have their own error types
/// and are logged where they happen; they never surface here.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Logging error: {0}")]
    Logging(String),
}
