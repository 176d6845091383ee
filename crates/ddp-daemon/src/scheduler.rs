//! Scheduled loops driving the monitor's ticks.
//!
//! Each loop waits on its timer or the stop signal, then runs one tick to
//! completion. A stop observed while a tick is in flight takes effect once the
//! tick returns; ticks are never aborted.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

use crate::DrawdownMonitor;

/// Monitor loop. Re-reads the cadence before every sleep so a CRITICAL
/// tightening (or its release) applies from the next wait.
pub fn spawn_monitor_loop(monitor: DrawdownMonitor, mut stop: watch::Receiver<bool>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let wait = Duration::from_millis(monitor.monitor_interval_ms());
            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = stop.changed() => break,
            }
            let stopped = *stop.borrow();
            if stopped {
                break;
            }
            let _ = monitor.run_monitor_tick().await;
        }
        debug!("monitor loop stopped");
    })
}

pub fn spawn_evolution_loop(
    monitor: DrawdownMonitor,
    period: Duration,
    mut stop: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = stop.changed() => break,
            }
            let stopped = *stop.borrow();
            if stopped {
                break;
            }
            let _ = monitor.run_evolution_tick().await;
        }
        debug!("evolution loop stopped");
    })
}

pub fn spawn_metrics_loop(
    monitor: DrawdownMonitor,
    period: Duration,
    mut stop: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = stop.changed() => break,
            }
            let stopped = *stop.borrow();
            if stopped {
                break;
            }
            let _ = monitor.run_metrics_tick().await;
        }
        debug!("metrics loop stopped");
    })
}
