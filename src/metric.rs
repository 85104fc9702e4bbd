//! Metric payload model
//!
//! A metrics command reports one cycle's worth of observations as a JSON
//! array of `{key, value, unit}` records. Decoding is strict about records:
//! unknown or missing fields, wrong types and empty keys are rejected. Only
//! the first JSON value is read; whatever follows it (stderr chatter, say)
//! is ignored. A `null` payload means no metrics.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single observation reported by the metrics command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Metric {
    /// Metric name
    pub key: String,
    /// Observed value
    pub value: f64,
    /// Free-form unit label
    pub unit: String,
}

impl Metric {
    /// Create a new metric
    pub fn new(key: impl Into<String>, value: f64, unit: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value,
            unit: unit.into(),
        }
    }
}

/// Errors produced while decoding a metric payload
#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("invalid metrics JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("metric at index {0} has an empty key")]
    EmptyKey(usize),

    #[error("no JSON value in output")]
    Empty,
}

/// The ordered metrics produced by one cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricPayload {
    metrics: Vec<Metric>,
}

impl MetricPayload {
    /// Decode raw command output into a payload
    pub fn parse(raw: &[u8]) -> Result<Self, PayloadError> {
        let first = serde_json::Deserializer::from_slice(raw)
            .into_iter::<Option<MetricPayload>>()
            .next()
            .ok_or(PayloadError::Empty)?;
        let payload = first?.unwrap_or_default();

        if let Some(index) = payload.metrics.iter().position(|m| m.key.is_empty()) {
            return Err(PayloadError::EmptyKey(index));
        }

        Ok(payload)
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Metric> {
        self.metrics.iter()
    }
}

impl From<Vec<Metric>> for MetricPayload {
    fn from(metrics: Vec<Metric>) -> Self {
        Self { metrics }
    }
}

impl IntoIterator for MetricPayload {
    type Item = Metric;
    type IntoIter = std::vec::IntoIter<Metric>;

    fn into_iter(self) -> Self::IntoIter {
        self.metrics.into_iter()
    }
}

impl<'a> IntoIterator for &'a MetricPayload {
    type Item = &'a Metric;
    type IntoIter = std::slice::Iter<'a, Metric>;

    fn into_iter(self) -> Self::IntoIter {
        self.metrics.iter()
    }
}
