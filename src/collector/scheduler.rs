use std::time::Duration;

use log::{debug, info};
use tokio::time::{self, MissedTickBehavior};

use super::config::CollectorConfig;
use super::cycle::{CycleProcessor, CycleResult};
use crate::process::CommandRunner;
use crate::sink::MetricSink;

/// Drives the cycle processor at a fixed interval
///
/// The first cycle runs immediately. Cycles never overlap; one that overruns
/// the interval is followed straight away by the next.
pub struct Scheduler<R, S> {
    config: CollectorConfig,
    processor: CycleProcessor<R, S>,
}

impl<R, S> Scheduler<R, S>
where
    R: CommandRunner,
    S: MetricSink,
{
    /// Create a new scheduler
    pub fn new(config: CollectorConfig, processor: CycleProcessor<R, S>) -> Self {
        Self { config, processor }
    }

    pub fn interval(&self) -> Duration {
        self.config.interval
    }

    pub fn processor(&self) -> &CycleProcessor<R, S> {
        &self.processor
    }

    /// Poll until a cycle asks to stop, returning that cycle's result
    pub async fn run(&self) -> CycleResult {
        info!("Starting {} every {:?}", self.config.name, self.config.interval);

        let mut interval_timer = time::interval(self.config.interval);
        interval_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut cycles: u64 = 0;
        loop {
            interval_timer.tick().await;
            cycles += 1;

            match self.processor.process().await {
                CycleResult::Continue => {
                    debug!("{} cycle {} complete", self.config.name, cycles);
                }
                stop => {
                    debug!("{} stopping after cycle {}: {:?}", self.config.name, cycles, stop);
                    return stop;
                }
            }
        }
    }
}
