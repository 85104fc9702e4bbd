use std::collections::HashSet;
use std::sync::Mutex;

use crate::metric::Metric;

use super::{MetricSink, SinkError};

/// A minimal in-memory sink for testing
///
/// Records every accepted metric in call order. Keys registered with
/// [`MemorySink::fail_on`] are rejected instead of recorded.
pub struct MemorySink {
    sent: Mutex<Vec<Metric>>,
    failing_keys: HashSet<String>,
    name: String,
}

impl MemorySink {
    /// Create a new memory sink
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing_keys: HashSet::new(),
            name: name.into(),
        }
    }

    /// Reject any metric with this key
    pub fn fail_on(mut self, key: impl Into<String>) -> Self {
        self.failing_keys.insert(key.into());
        self
    }

    /// Metrics accepted so far, in the order they were sent
    pub fn sent(&self) -> Vec<Metric> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait::async_trait]
impl MetricSink for MemorySink {
    async fn send_value(&self, key: &str, value: f64, unit: &str) -> Result<(), SinkError> {
        if self.failing_keys.contains(key) {
            return Err(SinkError::Rejected(format!("{} is configured to fail", key)));
        }

        self.sent
            .lock()
            .map_err(|_| SinkError::Rejected("Lock poisoned".to_string()))?
            .push(Metric::new(key, value, unit));

        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
