use env_logger::{Builder, Logger, Target};
use log::{LevelFilter, Log, Metadata, Record};
use std::io::{self, Write};

use crate::config::LogLevel;
use crate::error::{AgentError, Result};

/// Prefix on every log message
pub const SOURCE: &str = "service-metrics";

/// Writes to stdout at the configured level and to stderr for errors only
struct SplitLogger {
    stdout: Logger,
    stderr: Logger,
}

impl Log for SplitLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.stdout.enabled(metadata) || self.stderr.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        self.stdout.log(record);
        self.stderr.log(record);
    }

    fn flush(&self) {
        self.stdout.flush();
        self.stderr.flush();
    }
}

fn level_filter(level: &LogLevel) -> LevelFilter {
    match level {
        LogLevel::Error => LevelFilter::Error,
        LogLevel::Warn => LevelFilter::Warn,
        LogLevel::Info => LevelFilter::Info,
        LogLevel::Debug => LevelFilter::Debug,
        LogLevel::Trace => LevelFilter::Trace,
    }
}

fn build(target: Target, filter: LevelFilter) -> Logger {
    Builder::new()
        .format(|buf, record| write_record(buf, record))
        .filter(None, filter)
        .target(target)
        .build()
}

/// Format one record as `<timestamp> [<LEVEL>] service-metrics.<message>`
pub fn write_record<W: Write>(out: &mut W, record: &Record) -> io::Result<()> {
    writeln!(
        out,
        "{} [{}] {}.{}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
        record.level(),
        SOURCE,
        record.args()
    )
}

/// Initialize the logging system
pub fn init(level: &LogLevel) -> Result<()> {
    let stdout_level = level_filter(level);
    let logger = SplitLogger {
        stdout: build(Target::Stdout, stdout_level),
        stderr: build(Target::Stderr, LevelFilter::Error),
    };

    log::set_boxed_logger(Box::new(logger))
        .map_err(|e| AgentError::Logging(e.to_string()))?;
    log::set_max_level(stdout_level.max(LevelFilter::Error));

    Ok(())
}
