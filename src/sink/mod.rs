//! Destinations for forwarded metrics
//!
//! The cycle processor hands every metric to a [`MetricSink`] one at a time.
//! A sink reports failures as values and never aborts the caller.

mod memory;
mod udp;

use std::io;
use thiserror::Error;

pub use memory::MemorySink;
pub use udp::UdpSink;

/// Errors a sink can report for a single metric or at setup
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Failed to resolve sink address {addr}: {reason}")]
    Resolve { addr: String, reason: String },

    #[error("Sink IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to encode metric: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Metric rejected: {0}")]
    Rejected(String),
}

/// Accepts individual metric values for delivery
#[async_trait::async_trait]
pub trait MetricSink: Send + Sync + 'static {
    /// Attempt delivery of a single value
    async fn send_value(&self, key: &str, value: f64, unit: &str) -> Result<(), SinkError>;

    /// Get the sink name
    fn name(&self) -> &str;
}
