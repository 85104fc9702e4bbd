//! Polling loop: one cycle at startup, then one per interval

mod config;
mod cycle;
mod scheduler;

pub use config::{CollectorConfig, CollectorConfigBuilder, DEFAULT_INTERVAL};
pub use cycle::{CycleProcessor, CycleResult};
pub use scheduler::Scheduler;
