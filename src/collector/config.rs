use std::time::Duration;

/// Default interval between cycle starts
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

/// Configuration for the polling scheduler
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Name used in log lines
    pub name: String,
    /// Time between cycle starts
    pub interval: Duration,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            name: "metrics-collector".to_string(),
            interval: DEFAULT_INTERVAL,
        }
    }
}

impl CollectorConfig {
    pub fn builder(name: impl Into<String>) -> CollectorConfigBuilder {
        CollectorConfigBuilder::new(name)
    }
}

/// Builder for collector configuration
pub struct CollectorConfigBuilder {
    config: CollectorConfig,
}

impl CollectorConfigBuilder {
    /// Create a new collector config builder
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            config: CollectorConfig {
                name: name.into(),
                ..Default::default()
            },
        }
    }

    /// Set the collection interval
    pub fn interval(mut self, interval: Duration) -> Self {
        self.config.interval = interval;
        self
    }

    /// Build the configuration
    pub fn build(self) -> CollectorConfig {
        self.config
    }
}
