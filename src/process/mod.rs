//! Running the external metrics command
//!
//! The metrics command is run to completion once per cycle. Its stdout and
//! stderr are captured as one byte stream and the exit status is classified
//! into a [`CommandOutcome`].

mod command;
mod error;
mod outcome;

pub use command::Command;
pub use error::ProcessError;
pub use outcome::{CommandOutcome, NOT_READY_EXIT_CODE};

/// Something that can be invoked once per cycle to produce a classified outcome
#[async_trait::async_trait]
pub trait CommandRunner: Send + Sync + 'static {
    /// Run to completion and classify the result
    async fn run(&self) -> CommandOutcome;
}
