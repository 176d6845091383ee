//! ddp-testkit
//!
//! Scripted collaborators for driving a `DrawdownMonitor` deterministically
//! in scenario tests. No network, no files.

mod controls;
mod provider;

pub use controls::{LeverageCall, MemorySnapshotSink, RecordingLeverageController};
pub use provider::ScriptedAccountProvider;

use std::sync::Arc;

use ddp_daemon::{Collaborators, DrawdownMonitor};
use ddp_risk::{ConfigurationError, EngineConfig, MICROS_SCALE};

/// Whole currency units to micros.
pub fn units(n: i64) -> i64 {
    n * MICROS_SCALE
}

/// Defaults with timers long enough that scheduled loops never fire during a
/// test; ticks are driven by calling `run_*_tick` directly.
pub fn manual_config() -> EngineConfig {
    let mut cfg = EngineConfig::sane_defaults();
    cfg.timing.monitoring_interval_ms = 60_000;
    cfg.timing.evolution_interval_ms = 60_000;
    cfg.timing.metrics_interval_ms = 60_000;
    cfg.timing.provider_timeout_ms = 500;
    cfg
}

/// A monitor wired to fresh fakes.
pub struct Harness {
    pub monitor: DrawdownMonitor,
    pub provider: Arc<ScriptedAccountProvider>,
    pub leverage: Arc<RecordingLeverageController>,
    pub sink: Arc<MemorySnapshotSink>,
}

impl Harness {
    /// Build a monitor with `initial_balance_micros`; the provider repeats
    /// that balance until scripted otherwise.
    pub fn new(
        config: EngineConfig,
        initial_balance_micros: i64,
    ) -> Result<Self, ConfigurationError> {
        let provider = Arc::new(ScriptedAccountProvider::new(initial_balance_micros));
        let leverage = Arc::new(RecordingLeverageController::new());
        let sink = Arc::new(MemorySnapshotSink::new());
        let collab = Collaborators::new(provider.clone(), leverage.clone())
            .with_snapshot_sink(sink.clone());
        let monitor = DrawdownMonitor::new(config, initial_balance_micros, collab)?;
        leverage.observe(&monitor);
        Ok(Self {
            monitor,
            provider,
            leverage,
            sink,
        })
    }
}
