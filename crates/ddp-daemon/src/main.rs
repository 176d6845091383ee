//! ddp-daemon entry point.
//!
//! Thin: load config, build collaborators, start the monitor, and shut down
//! on Ctrl-C or when the replay series runs out.
//!
//! Environment:
//! - `DDP_CONFIG`: comma-separated YAML paths, merged in order (optional)
//! - `DDP_REPLAY_CSV`: balance series to replay (required)
//! - `DDP_SNAPSHOT_PATH`: hash-chained JSONL snapshot log (optional)

use std::sync::Arc;

use anyhow::Context;
use ddp_config::{
    engine_config_from_json, load_engine_config, load_layered_yaml_from_strings,
    report_unused_keys, UnusedKeyPolicy,
};
use ddp_daemon::replay::{CsvReplayProvider, LoggingLeverageController};
use ddp_daemon::{Collaborators, DrawdownMonitor, JsonlSnapshotSink};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Silent if the file does not exist; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let config_paths: Vec<String> = std::env::var("DDP_CONFIG")
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    let (loaded, config) = if config_paths.is_empty() {
        let loaded = load_layered_yaml_from_strings(&[])?;
        let config = engine_config_from_json(&loaded.config_json)?;
        (loaded, config)
    } else {
        let refs: Vec<&str> = config_paths.iter().map(String::as_str).collect();
        load_engine_config(&refs).context("load engine config")?
    };
    info!(config_hash = %loaded.config_hash, layers = config_paths.len(), "engine config loaded");

    let unused = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)?;
    for ptr in &unused.unused_leaf_pointers {
        warn!(pointer = %ptr, "config key is not consumed by the engine");
    }

    let csv_path = std::env::var("DDP_REPLAY_CSV").context("DDP_REPLAY_CSV must be set")?;
    let provider = Arc::new(CsvReplayProvider::from_path(&csv_path)?);
    let exhausted = provider.exhausted();
    let initial_balance_micros = provider.initial_balance_micros();

    let mut collab = Collaborators::new(provider, Arc::new(LoggingLeverageController::new()));
    if let Ok(path) = std::env::var("DDP_SNAPSHOT_PATH") {
        let sink = JsonlSnapshotSink::open(&path)
            .with_context(|| format!("open snapshot sink at {path}"))?;
        collab = collab.with_snapshot_sink(Arc::new(sink));
    }

    let monitor = DrawdownMonitor::new(config, initial_balance_micros, collab)
        .context("engine config rejected")?;

    let mut events = monitor.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(ev) => match serde_json::to_string(&ev) {
                    Ok(line) => info!(event = ev.name(), payload = %line, "engine event"),
                    Err(e) => warn!(error = %e, "engine event not serializable"),
                },
                Err(RecvError::Lagged(n)) => warn!(skipped = n, "event log lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    monitor.start();

    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res.context("install ctrl-c handler")?;
            info!("ctrl-c received");
        }
        _ = exhausted.notified() => info!("replay series exhausted"),
    }

    monitor.shutdown().await?;

    let report = monitor.system_report();
    info!(
        tier = report.tier.as_str(),
        max_historical_drawdown = report.state.max_historical_drawdown,
        recovery_activations = report.state.recovery_activations,
        evolution_level = report.state.evolution_level,
        monitor_ticks = report.metrics.monitor_ticks,
        "final system report"
    );
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}
