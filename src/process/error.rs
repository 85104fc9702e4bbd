use std::io;
use std::process::ExitStatus;
use thiserror::Error;

/// Errors that can occur while running the metrics command
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Failed to spawn process: {0}")]
    SpawnError(#[from] io::Error),

    #[error("Process exited with non-zero status: {0}")]
    NonZeroExit(ExitStatus),

    #[error("Failed to read from process: {0}")]
    ReadError(io::Error),

    #[error("Failed to wait for process: {0}")]
    WaitError(io::Error),
}

impl ProcessError {
    /// Whether the command could not be run through to an exit status.
    ///
    /// Only `NonZeroExit` means the command ran and reported failure itself.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ProcessError::NonZeroExit(_))
    }
}
