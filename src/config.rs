use log::debug;
use serde::{Deserialize, Deserializer};
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::collector::DEFAULT_INTERVAL;
use crate::error::{AgentError, Result};

/// Environment variable prefix, e.g. `SERVICE_METRICS_ORIGIN`
pub const ENV_PREFIX: &str = "SERVICE_METRICS";

/// Agent configuration, resolved once at startup
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AgentConfig {
    /// Source name for emitted metrics, e.g. the service name
    pub origin: String,
    /// Metron address, e.g. `localhost:3457`
    pub metron_addr: String,
    /// Path to the metrics command
    pub metrics_cmd: String,
    /// Arguments passed verbatim to the metrics command
    pub metrics_cmd_args: Vec<String>,
    /// Interval between cycle starts
    #[serde(deserialize_with = "deserialize_duration")]
    pub metrics_interval: Duration,
    /// Debug logging on stdout
    pub debug: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            origin: String::new(),
            metron_addr: String::new(),
            metrics_cmd: String::new(),
            metrics_cmd_args: Vec::new(),
            metrics_interval: DEFAULT_INTERVAL,
            debug: false,
        }
    }
}

impl AgentConfig {
    /// Check required values; the error names the missing flag
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("origin", &self.origin),
            ("metron-addr", &self.metron_addr),
            ("metrics-cmd", &self.metrics_cmd),
        ];

        for (flag, value) in required {
            if value.trim().is_empty() {
                return Err(AgentError::Config(format!("Must provide --{}", flag)));
            }
        }

        if self.metrics_interval.is_zero() {
            return Err(AgentError::Config(
                "--metrics-interval must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Logging level implied by the debug flag
    pub fn log_level(&self) -> LogLevel {
        if self.debug { LogLevel::Debug } else { LogLevel::Info }
    }
}

/// Logging level
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Error level
    Error,
    /// Warning level
    Warn,
    /// Info level
    #[default]
    Info,
    /// Debug level
    Debug,
    /// Trace level
    Trace,
}

/// Source of configuration
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// File path (TOML format)
    File(PathBuf),
    /// Environment variables with a prefix
    Environment(String),
    /// TOML string
    Toml(String),
}

/// Helper function to load configuration from various sources
///
/// Later sources override earlier ones.
pub fn load_config<T>(sources: Vec<ConfigSource>) -> Result<T>
where
    T: for<'de> Deserialize<'de> + Debug,
{
    let mut builder = config::Config::builder();

    for source in sources {
        match source {
            ConfigSource::File(path) => {
                if !path.exists() {
                    return Err(AgentError::Config(format!(
                        "Configuration file not found: {}",
                        path.display()
                    )));
                }

                debug!("Loading TOML configuration from file: {}", path.display());
                builder = builder.add_source(
                    config::File::from(path.as_path()).format(config::FileFormat::Toml),
                );
            }
            ConfigSource::Environment(prefix) => {
                debug!("Loading configuration from environment with prefix: {}", prefix);
                builder = builder.add_source(
                    config::Environment::with_prefix(&prefix)
                        .try_parsing(true)
                        .list_separator(",")
                        .with_list_parse_key("metrics_cmd_args"),
                );
            }
            ConfigSource::Toml(toml_str) => {
                debug!("Loading configuration from TOML string");
                builder = builder.add_source(config::File::from_str(
                    &toml_str,
                    config::FileFormat::Toml,
                ));
            }
        }
    }

    let config = builder
        .build()
        .map_err(|e| AgentError::Config(format!("Failed to build configuration: {}", e)))?;

    let result = config
        .try_deserialize()
        .map_err(|e| AgentError::Config(format!("Failed to deserialize configuration: {}", e)))?;

    debug!("Configuration loaded successfully: {:?}", result);

    Ok(result)
}

/// Configuration builder
pub struct ConfigBuilder<T: for<'de> Deserialize<'de>> {
    sources: Vec<ConfigSource>,
    _marker: std::marker::PhantomData<T>,
}

impl<T: for<'de> Deserialize<'de> + Debug> ConfigBuilder<T> {
    /// Create a new config builder
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            _marker: std::marker::PhantomData,
        }
    }

    /// Add a TOML file source
    pub fn add_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.sources.push(ConfigSource::File(path.as_ref().to_path_buf()));
        self
    }

    /// Add environment variables
    pub fn add_env(mut self, prefix: impl Into<String>) -> Self {
        self.sources.push(ConfigSource::Environment(prefix.into()));
        self
    }

    /// Add TOML string
    pub fn add_toml(mut self, toml: impl Into<String>) -> Self {
        self.sources.push(ConfigSource::Toml(toml.into()));
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<T> {
        load_config::<T>(self.sources)
    }
}

impl<T: for<'de> Deserialize<'de> + Debug> Default for ConfigBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a Go-style duration such as `10ms`, `1m30s` or `1.5h`
pub fn parse_duration(input: &str) -> std::result::Result<Duration, String> {
    let text = input.trim();
    if text.is_empty() {
        return Err("empty duration".to_string());
    }
    if text == "0" {
        return Ok(Duration::ZERO);
    }

    let is_number = |c: char| c.is_ascii_digit() || c == '.';
    let mut nanos = 0f64;
    let mut rest = text;

    while !rest.is_empty() {
        let number_end = rest.find(|c: char| !is_number(c)).unwrap_or(rest.len());
        if number_end == 0 {
            return Err(format!("invalid duration {:?}", input));
        }
        let value: f64 = rest[..number_end]
            .parse()
            .map_err(|_| format!("invalid duration {:?}", input))?;
        rest = &rest[number_end..];

        let unit_end = rest.find(is_number).unwrap_or(rest.len());
        let scale = match &rest[..unit_end] {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            "" => return Err(format!("missing unit in duration {:?}", input)),
            unit => return Err(format!("unknown unit {:?} in duration {:?}", unit, input)),
        };
        rest = &rest[unit_end..];

        nanos += value * scale;
    }

    if !nanos.is_finite() || nanos > u64::MAX as f64 {
        return Err(format!("duration {:?} out of range", input));
    }

    Ok(Duration::from_nanos(nanos.round() as u64))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDuration {
    Seconds(u64),
    Text(String),
}

fn deserialize_duration<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    match RawDuration::deserialize(deserializer)? {
        RawDuration::Seconds(secs) => Ok(Duration::from_secs(secs)),
        RawDuration::Text(text) => parse_duration(&text).map_err(serde::de::Error::custom),
    }
}
