use std::process::ExitStatus;

use super::error::ProcessError;

/// Exit status a metrics command uses to say it has nothing to report yet
pub const NOT_READY_EXIT_CODE: i32 = 10;

/// Classified result of one metrics command invocation
#[derive(Debug)]
pub enum CommandOutcome {
    /// Exited 0 with the combined output
    Success(Vec<u8>),

    /// Exited with `NOT_READY_EXIT_CODE`
    NotReady(Vec<u8>),

    /// Could not be run, or exited with any other status
    Failed {
        error: ProcessError,
        output: Vec<u8>,
    },
}

impl CommandOutcome {
    /// Classify a finished process by its exit status
    pub fn from_exit(status: ExitStatus, output: Vec<u8>) -> Self {
        match status.code() {
            Some(0) => CommandOutcome::Success(output),
            Some(NOT_READY_EXIT_CODE) => CommandOutcome::NotReady(output),
            // Signal deaths have no code and land here too
            _ => CommandOutcome::Failed {
                error: ProcessError::NonZeroExit(status),
                output,
            },
        }
    }

    /// Outcome for a command that never produced an exit status
    pub fn not_run(error: ProcessError) -> Self {
        CommandOutcome::Failed {
            error,
            output: Vec::new(),
        }
    }

    /// Captured output, whatever the outcome
    pub fn output(&self) -> &[u8] {
        match self {
            CommandOutcome::Success(output) | CommandOutcome::NotReady(output) => output,
            CommandOutcome::Failed { output, .. } => output,
        }
    }
}
