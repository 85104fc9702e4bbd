use anyhow::Result;
use clap::{CommandFactory, Parser};
use log::{error, info};
use serde_json::json;
use service_metrics::cli::Args;
use service_metrics::prelude::*;
use tokio::signal::unix::{SignalKind, signal};

/// Resolves when SIGINT or SIGTERM arrives
async fn shutdown_signal() {
    let (mut interrupt, mut terminate) =
        match (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) {
            (Ok(interrupt), Ok(terminate)) => (interrupt, terminate),
            (Err(e), _) | (_, Err(e)) => {
                error!("installing-signal-handlers {}", json!({ "event": "failed", "error": e.to_string() }));
                return std::future::pending().await;
            }
        };

    tokio::select! {
        _ = interrupt.recv() => {}
        _ = terminate.recv() => {}
    }
}

fn exit(code: i32) -> ! {
    log::logger().flush();
    std::process::exit(code)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Validation failures go straight to stderr; logging is not set up yet
    let config = match args.resolve().and_then(|config| config.validate().map(|_| config)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", Args::command().render_usage());
            eprintln!("\n{}", e);
            std::process::exit(1);
        }
    };

    service_metrics::init_logging(&config.log_level())?;

    let sink = match UdpSink::connect(&config.metron_addr, config.origin.as_str()).await {
        Ok(sink) => sink,
        Err(e) => {
            error!(
                "initializing-metric-sink {}",
                json!({ "event": "failed", "error": e.to_string(), "metron_addr": config.metron_addr })
            );
            exit(1);
        }
    };

    let command = Command::new(config.metrics_cmd.as_str()).args(config.metrics_cmd_args.iter().cloned());
    let collector = CollectorConfig::builder("metrics-cmd")
        .interval(config.metrics_interval)
        .build();
    let scheduler = Scheduler::new(collector, CycleProcessor::new(command, sink));

    let code = tokio::select! {
        result = scheduler.run() => result.exit_code().unwrap_or(0),
        _ = shutdown_signal() => {
            info!("received shutdown signal {}", json!({ "event": "stopping" }));
            0
        }
    };

    exit(code)
}
