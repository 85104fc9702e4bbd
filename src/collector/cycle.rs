use std::borrow::Cow;

use log::{debug, error, info};
use serde_json::{Value, json};

use crate::metric::{Metric, MetricPayload};
use crate::process::{CommandOutcome, CommandRunner, ProcessError};
use crate::sink::{MetricSink, SinkError};

const EXECUTE_ACTION: &str = "executing-metrics-cmd";
const PARSE_ACTION: &str = "parsing-metrics-output";
const SEND_ACTION: &str = "sending metric value failed";

const NOT_CONFIGURED: &str = "no metrics command has been configured, cannot collect metrics";

/// What the driver should do after a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleResult {
    /// Keep polling
    Continue,
    /// The agent cannot work as configured; exit with this status
    FatalStop(i32),
    /// The metrics command reported failure; exit with this status so the supervisor restarts us
    GracefulStop(i32),
}

impl CycleResult {
    /// Process exit status, if the cycle asked to stop
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            CycleResult::Continue => None,
            CycleResult::FatalStop(code) | CycleResult::GracefulStop(code) => Some(*code),
        }
    }
}

/// Runs the metrics command once and forwards what it reports
pub struct CycleProcessor<R, S> {
    runner: R,
    sink: S,
}

impl<R, S> CycleProcessor<R, S>
where
    R: CommandRunner,
    S: MetricSink,
{
    /// Create a new cycle processor
    pub fn new(runner: R, sink: S) -> Self {
        Self { runner, sink }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Execute exactly one cycle
    pub async fn process(&self) -> CycleResult {
        info!("{} {}", EXECUTE_ACTION, json!({ "event": "starting" }));

        let output = match self.runner.run().await {
            CommandOutcome::Success(output) => {
                info!("{} {}", EXECUTE_ACTION, json!({ "event": "done" }));
                output
            }
            CommandOutcome::NotReady(output) => {
                info!(
                    "{} {}",
                    EXECUTE_ACTION,
                    json!({
                        "event": "not yet ready to emit metrics",
                        "output": String::from_utf8_lossy(&output),
                    })
                );
                return CycleResult::Continue;
            }
            CommandOutcome::Failed { error, output } if error.is_fatal() => {
                error!("{} {}", EXECUTE_ACTION, not_run_event(&error, &output));
                return CycleResult::FatalStop(1);
            }
            CommandOutcome::Failed { error, output } => {
                error!(
                    "{} {}",
                    EXECUTE_ACTION,
                    json!({
                        "event": "failed",
                        "error": error.to_string(),
                        "output": String::from_utf8_lossy(&output),
                    })
                );
                return CycleResult::GracefulStop(0);
            }
        };

        let payload = match MetricPayload::parse(&output) {
            Ok(payload) => payload,
            Err(e) => {
                error!(
                    "{} {}",
                    PARSE_ACTION,
                    json!({
                        "event": "failed",
                        "error": e.to_string(),
                        "output": String::from_utf8_lossy(&output),
                    })
                );
                return CycleResult::FatalStop(1);
            }
        };

        self.forward(&payload).await;

        CycleResult::Continue
    }

    /// Send every metric independently; failures are logged and skipped
    async fn forward(&self, payload: &MetricPayload) {
        for metric in payload {
            match self.sink.send_value(&metric.key, metric.value, &metric.unit).await {
                Ok(()) => debug!("Forwarded {}={} {} to {}", metric.key, metric.value, metric.unit, self.sink.name()),
                Err(e) => error!("{} {}", SEND_ACTION, send_failed_event(metric, &e)),
            }
        }
    }
}

/// Event data for a command that never reached an exit status
fn not_run_event(error: &ProcessError, output: &[u8]) -> Value {
    // Only a spawn failure means the configured command is unusable
    let output = match error {
        ProcessError::SpawnError(_) => Cow::Borrowed(NOT_CONFIGURED),
        _ => String::from_utf8_lossy(output),
    };

    json!({
        "event": "failed",
        "error": error.to_string(),
        "output": output,
    })
}

fn send_failed_event(metric: &Metric, error: &SinkError) -> Value {
    json!({
        "event": "failed",
        "error": error.to_string(),
        "metric.key": metric.key,
        "metric.value": metric.value,
        "metric.unit": metric.unit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use std::io;
    use std::os::unix::process::ExitStatusExt;
    use std::process::ExitStatus;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replays canned outcomes, one per run
    struct ScriptedRunner {
        outcomes: Mutex<Vec<CommandOutcome>>,
        runs: AtomicUsize,
    }

    impl ScriptedRunner {
        fn new(outcome: CommandOutcome) -> Self {
            Self {
                outcomes: Mutex::new(vec![outcome]),
                runs: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl CommandRunner for ScriptedRunner {
        async fn run(&self) -> CommandOutcome {
            self.runs.fetch_add(1, Ordering::SeqCst);
            self.outcomes.lock().unwrap().remove(0)
        }
    }

    fn exited(code: i32, output: &[u8]) -> CommandOutcome {
        CommandOutcome::from_exit(ExitStatus::from_raw(code << 8), output.to_vec())
    }

    const TWO_METRICS: &[u8] = br#"[{"key":"loadMetric","value":4,"unit":"Load"},{"key":"temperatureMetric","value":99,"unit":"Temperature"}]"#;

    #[tokio::test]
    async fn test_success_forwards_every_metric_in_order() {
        let processor = CycleProcessor::new(
            ScriptedRunner::new(exited(0, TWO_METRICS)),
            MemorySink::new("test"),
        );

        assert_eq!(processor.process().await, CycleResult::Continue);
        assert_eq!(
            processor.sink().sent(),
            vec![
                Metric::new("loadMetric", 4.0, "Load"),
                Metric::new("temperatureMetric", 99.0, "Temperature"),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_payload_forwards_nothing() {
        let processor = CycleProcessor::new(ScriptedRunner::new(exited(0, b"[]")), MemorySink::new("test"));

        assert_eq!(processor.process().await, CycleResult::Continue);
        assert!(processor.sink().sent().is_empty());
    }

    #[tokio::test]
    async fn test_not_ready_skips_parse_and_forward() {
        // Valid payload on exit 10 must still be ignored
        let processor = CycleProcessor::new(ScriptedRunner::new(exited(10, TWO_METRICS)), MemorySink::new("test"));

        assert_eq!(processor.process().await, CycleResult::Continue);
        assert!(processor.sink().sent().is_empty());
    }

    #[tokio::test]
    async fn test_not_ready_with_garbage_output_continues() {
        let processor = CycleProcessor::new(ScriptedRunner::new(exited(10, b"{{{ nope")), MemorySink::new("test"));
        assert_eq!(processor.process().await, CycleResult::Continue);
    }

    #[tokio::test]
    async fn test_command_failure_stops_gracefully() {
        let processor = CycleProcessor::new(ScriptedRunner::new(exited(1, TWO_METRICS)), MemorySink::new("test"));

        let result = processor.process().await;
        assert_eq!(result, CycleResult::GracefulStop(0));
        assert_eq!(result.exit_code(), Some(0));
        assert!(processor.sink().sent().is_empty());
    }

    #[tokio::test]
    async fn test_launch_failure_is_fatal() {
        let error = ProcessError::SpawnError(io::Error::from(io::ErrorKind::PermissionDenied));
        let processor = CycleProcessor::new(
            ScriptedRunner::new(CommandOutcome::not_run(error)),
            MemorySink::new("test"),
        );

        let result = processor.process().await;
        assert_eq!(result, CycleResult::FatalStop(1));
        assert_eq!(result.exit_code(), Some(1));
    }

    #[tokio::test]
    async fn test_malformed_output_is_fatal() {
        let processor = CycleProcessor::new(ScriptedRunner::new(exited(0, b"load=4")), MemorySink::new("test"));

        assert_eq!(processor.process().await, CycleResult::FatalStop(1));
        assert!(processor.sink().sent().is_empty());
    }

    #[tokio::test]
    async fn test_forward_failure_does_not_stop_remaining_metrics() {
        let processor = CycleProcessor::new(
            ScriptedRunner::new(exited(0, TWO_METRICS)),
            MemorySink::new("test").fail_on("loadMetric"),
        );

        assert_eq!(processor.process().await, CycleResult::Continue);
        assert_eq!(
            processor.sink().sent(),
            vec![Metric::new("temperatureMetric", 99.0, "Temperature")]
        );
    }

    #[tokio::test]
    async fn test_runs_command_once_per_cycle() {
        let runner = ScriptedRunner::new(exited(0, b"[]"));
        let processor = CycleProcessor::new(runner, MemorySink::new("test"));
        processor.process().await;
        assert_eq!(processor.runner.runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_continue_has_no_exit_code() {
        assert_eq!(CycleResult::Continue.exit_code(), None);
    }

    #[tokio::test]
    async fn test_read_failure_is_fatal() {
        let error = ProcessError::ReadError(io::Error::from(io::ErrorKind::BrokenPipe));
        let processor = CycleProcessor::new(
            ScriptedRunner::new(CommandOutcome::not_run(error)),
            MemorySink::new("test"),
        );

        assert_eq!(processor.process().await, CycleResult::FatalStop(1));
    }

    #[test]
    fn test_not_configured_text_only_for_spawn_failures() {
        let spawn = ProcessError::SpawnError(io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(not_run_event(&spawn, b"")["output"], NOT_CONFIGURED);

        let read = ProcessError::ReadError(io::Error::other("pipe closed early"));
        let event = not_run_event(&read, b"");
        assert_eq!(event["output"], "");
        assert!(event["error"].as_str().unwrap().contains("pipe closed early"));

        let wait = ProcessError::WaitError(io::Error::other("no child"));
        let event = not_run_event(&wait, b"partial");
        assert_eq!(event["output"], "partial");
        assert!(event["error"].as_str().unwrap().contains("Failed to wait"));
    }

    #[test]
    fn test_send_failure_event_identifies_metric() {
        let metric = Metric::new("loadMetric", 4.0, "Load");
        let event = send_failed_event(&metric, &SinkError::Rejected("down".to_string()));

        assert_eq!(event["event"], "failed");
        assert_eq!(event["metric.key"], "loadMetric");
        assert_eq!(event["metric.value"], 4.0);
        assert_eq!(event["metric.unit"], "Load");
        assert!(event["error"].as_str().unwrap().contains("down"));
    }
}
