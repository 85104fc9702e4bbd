//! Command-line arguments for service-metrics.
//!
//! Flags override values from the optional config file and from
//! `SERVICE_METRICS_*` environment variables.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{AgentConfig, ConfigBuilder, ENV_PREFIX, parse_duration};
use crate::error::Result;

/// Main CLI arguments structure
#[derive(Parser, Debug, Default)]
#[command(
    name = "service-metrics",
    about = "Runs a metrics command on an interval and forwards its output to metron",
    version
)]
pub struct Args {
    /// Config file (TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Required. Source name for metrics emitted by this process, e.g. service-name
    #[arg(long)]
    pub origin: Option<String>,

    /// Required. Metron address, e.g. localhost:2346
    #[arg(long = "metron-addr")]
    pub metron_addr: Option<String>,

    /// Required. Path to metrics command
    #[arg(long = "metrics-cmd")]
    pub metrics_cmd: Option<String>,

    /// Argument to pass on to metrics-cmd (multi-valued)
    #[arg(long = "metrics-cmd-arg", allow_hyphen_values = true)]
    pub metrics_cmd_args: Vec<String>,

    /// Interval to run metrics-cmd [default: 1m]
    #[arg(long = "metrics-interval", value_parser = parse_duration)]
    pub metrics_interval: Option<Duration>,

    /// Output debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Args {
    /// Layer config file, environment and flags into one configuration
    ///
    /// The result is not validated.
    pub fn resolve(&self) -> Result<AgentConfig> {
        let mut builder = ConfigBuilder::<AgentConfig>::new();
        if let Some(path) = &self.config {
            builder = builder.add_file(path);
        }
        let mut config = builder.add_env(ENV_PREFIX).build()?;

        self.apply(&mut config);
        Ok(config)
    }

    fn apply(&self, config: &mut AgentConfig) {
        if let Some(origin) = &self.origin {
            config.origin = origin.clone();
        }
        if let Some(addr) = &self.metron_addr {
            config.metron_addr = addr.clone();
        }
        if let Some(cmd) = &self.metrics_cmd {
            config.metrics_cmd = cmd.clone();
        }
        if !self.metrics_cmd_args.is_empty() {
            config.metrics_cmd_args = self.metrics_cmd_args.clone();
        }
        if let Some(interval) = self.metrics_interval {
            config.metrics_interval = interval;
        }
        if self.debug {
            config.debug = true;
        }
    }
}
