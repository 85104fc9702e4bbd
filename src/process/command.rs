use std::io;
use std::process::Stdio;

use log::{debug, trace};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command as TokioCommand};

use crate::process::{CommandOutcome, CommandRunner, ProcessError};

const READ_CHUNK: usize = 4096;

/// The configured metrics command
#[derive(Debug, Clone)]
pub struct Command {
    /// Program to execute
    program: String,

    /// Arguments to pass to the program, in order
    args: Vec<String>,
}

impl Command {
    /// Create a new command
    pub fn new<S: Into<String>>(program: S) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for arg in args {
            self.args.push(arg.into());
        }
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    fn spawn(&self) -> io::Result<Child> {
        TokioCommand::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
    }
}

#[async_trait::async_trait]
impl CommandRunner for Command {
    async fn run(&self) -> CommandOutcome {
        debug!("Spawning command: {} {:?}", self.program, self.args);

        let mut child = match self.spawn() {
            Ok(child) => child,
            Err(e) => return CommandOutcome::not_run(ProcessError::SpawnError(e)),
        };

        let output = match read_combined_output(&mut child).await {
            Ok(output) => output,
            Err(e) => return CommandOutcome::not_run(ProcessError::ReadError(e)),
        };

        let status = match child.wait().await {
            Ok(status) => status,
            Err(e) => return CommandOutcome::not_run(ProcessError::WaitError(e)),
        };

        trace!("[{}] exited with {} after {} bytes of output", self.program, status, output.len());

        CommandOutcome::from_exit(status, output)
    }
}

/// Drain stdout and stderr together, appending chunks in the order they arrive
async fn read_combined_output(child: &mut Child) -> io::Result<Vec<u8>> {
    let mut stdout = child.stdout.take();
    let mut stderr = child.stderr.take();

    let mut output = Vec::new();
    let mut out_buf = [0u8; READ_CHUNK];
    let mut err_buf = [0u8; READ_CHUNK];

    while stdout.is_some() || stderr.is_some() {
        tokio::select! {
            read = read_chunk(&mut stdout, &mut out_buf) => match read? {
                0 => stdout = None,
                n => output.extend_from_slice(&out_buf[..n]),
            },
            read = read_chunk(&mut stderr, &mut err_buf) => match read? {
                0 => stderr = None,
                n => output.extend_from_slice(&err_buf[..n]),
            },
        }
    }

    Ok(output)
}

async fn read_chunk<R>(reader: &mut Option<R>, buf: &mut [u8]) -> io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    match reader {
        Some(reader) => reader.read(buf).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell(script: &str) -> Command {
        Command::new("/bin/sh").arg("-c").arg(script)
    }

    #[tokio::test]
    async fn test_success_captures_stdout() {
        let outcome = shell("printf '[]'").run().await;
        match outcome {
            CommandOutcome::Success(output) => assert_eq!(output, b"[]"),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_output_combines_stdout_and_stderr() {
        let outcome = shell("echo out; sleep 0.2; echo err >&2").run().await;
        match outcome {
            CommandOutcome::Success(output) => assert_eq!(output, b"out\nerr\n"),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_exit_ten_is_not_ready() {
        let outcome = shell("echo 'still starting'; exit 10").run().await;
        match outcome {
            CommandOutcome::NotReady(output) => assert_eq!(output, b"still starting\n"),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_zero_exit_fails_with_output() {
        let outcome = shell("echo boom >&2; exit 3").run().await;
        match outcome {
            CommandOutcome::Failed { error, output } => {
                assert!(!error.is_fatal());
                assert_eq!(output, b"boom\n");
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_program_is_fatal() {
        let outcome = Command::new("/definitely/not/a/metrics-command").run().await;
        match outcome {
            CommandOutcome::Failed { error, output } => {
                assert!(error.is_fatal());
                assert!(matches!(error, ProcessError::SpawnError(_)));
                assert!(output.is_empty());
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_arguments_are_passed_in_order() {
        let outcome = Command::new("/bin/echo")
            .args(["-n", "first", "second"])
            .run()
            .await;
        assert_eq!(outcome.output(), b"first second");
    }

    #[test]
    fn test_builder_keeps_program_and_argument_order() {
        let command = Command::new("/bin/echo").arg("-n").args(["b", "a"]);
        assert_eq!(command.program(), "/bin/echo");
        assert_eq!(command.get_args(), ["-n", "b", "a"]);
    }
}
