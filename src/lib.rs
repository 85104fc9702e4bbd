//! Periodically runs a metrics command and forwards the metrics it reports

pub mod cli;
pub mod collector;
pub mod config;
pub mod error;
pub mod metric;
pub mod process;
pub mod sink;
pub mod util;

/// Re-export of commonly used types for convenience
pub mod prelude {
    pub use crate::collector::{CollectorConfig, CycleProcessor, CycleResult, Scheduler};
    pub use crate::config::AgentConfig;
    pub use crate::error::{AgentError, Result};
    pub use crate::metric::{Metric, MetricPayload};
    pub use crate::process::{Command, CommandOutcome, CommandRunner};
    pub use crate::sink::{MemorySink, MetricSink, UdpSink};
}

pub use util::logging::init as init_logging;

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
