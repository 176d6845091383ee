//! Orchestrating monitor.
//!
//! [`DrawdownMonitor`] owns the engine core and runs three ticks against it:
//!
//! - monitor: sample → drawdown → tier (entry actions) → recovery → events → alerts
//! - evolution: resilience decay + momentum-driven evolve
//! - metrics: anti-fragility refresh, adaptive leverage, periodic snapshot
//!
//! All three share one [`TickGuard`] flag; a tick that finds another one
//! running is skipped. The core mutex is only held inside synchronous
//! sections, never across a collaborator call.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use ddp_risk::{
    begin_tick, decay_toward_baseline, evolution_momentum, evolve_if_due, finish_tick,
    recommended_leverage, refresh_anti_fragility, AlertCategory, AlertEntry, ConfigurationError,
    EngineConfig, EscalationTier, EvolutionTrigger, ExternalActionError, ProviderError,
    SystemState, TickReport,
};
use serde_json::json;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::scheduler;
use crate::state::{EngineCore, TickGuard};
use crate::{
    Collaborators, EngineEvent, EngineSnapshot, EvolutionReport, MetricsOutcome, SystemReport,
    TickResult, TradeFeedEvent,
};

const EVENT_BUS_CAPACITY: usize = 1024;

/// Alerts per category included in [`DrawdownMonitor::system_report`] and
/// [`DrawdownMonitor::evolution_report`].
pub const REPORT_ALERTS_PER_CATEGORY: usize = 10;

struct RunningTasks {
    stop: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

struct Shared {
    core: Mutex<EngineCore>,
    tick_running: AtomicBool,
    /// Current monitor cadence; halved while CRITICAL or worse.
    monitor_interval_ms: AtomicU64,
    bus: broadcast::Sender<EngineEvent>,
    collab: Collaborators,
    session_id: Uuid,
    tasks: Mutex<Option<RunningTasks>>,
    /// Handles of paused loops, awaited by `shutdown()`. Finished ones are
    /// dropped on the next start.
    retired: Mutex<Vec<JoinHandle<()>>>,
}

/// Cloneable handle to one engine session.
#[derive(Clone)]
pub struct DrawdownMonitor {
    inner: Arc<Shared>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|p| p.into_inner())
}

impl DrawdownMonitor {
    /// Build a monitor. The only fallible step is configuration validation.
    pub fn new(
        config: EngineConfig,
        initial_balance_micros: i64,
        collab: Collaborators,
    ) -> Result<Self, ConfigurationError> {
        config.validate()?;
        if initial_balance_micros < 0 {
            return Err(ConfigurationError::Invalid {
                field: "initial_balance_micros",
                reason: format!("must be >= 0 (got {initial_balance_micros})"),
            });
        }

        let interval_ms = config.timing.monitoring_interval_ms;
        let (bus, _rx) = broadcast::channel(EVENT_BUS_CAPACITY);
        let session_id = Uuid::new_v4();
        info!(
            %session_id,
            initial_balance_micros,
            provider = collab.provider.name(),
            "drawdown monitor created"
        );

        Ok(Self {
            inner: Arc::new(Shared {
                core: Mutex::new(EngineCore::new(config, initial_balance_micros, Utc::now())),
                tick_running: AtomicBool::new(false),
                monitor_interval_ms: AtomicU64::new(interval_ms),
                bus,
                collab,
                session_id,
                tasks: Mutex::new(None),
                retired: Mutex::new(Vec::new()),
            }),
        })
    }

    pub fn session_id(&self) -> Uuid {
        self.inner.session_id
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.inner.bus.subscribe()
    }

    pub fn monitor_interval_ms(&self) -> u64 {
        self.inner.monitor_interval_ms.load(Ordering::Relaxed)
    }

    /// Whether the scheduled loops are running.
    pub fn is_running(&self) -> bool {
        lock(&self.inner.tasks).is_some()
    }

    /// Active configuration (thresholds may have self-adjusted).
    pub fn config(&self) -> EngineConfig {
        lock(&self.inner.core).config.clone()
    }

    pub fn state(&self) -> SystemState {
        lock(&self.inner.core).state.clone()
    }

    // -----------------------------------------------------------------------
    // Control
    // -----------------------------------------------------------------------

    /// Start the scheduled loops. Returns `false` if already running.
    /// Must be called from inside a tokio runtime.
    pub fn start(&self) -> bool {
        self.spawn_loops("started")
    }

    /// Stop scheduling new ticks. An in-flight tick runs to completion.
    pub fn pause(&self) -> bool {
        let running = lock(&self.inner.tasks).take();
        let Some(running) = running else {
            return false;
        };
        let _ = running.stop.send(true);
        lock(&self.inner.retired).extend(running.handles);
        lock(&self.inner.core).state.is_active = false;
        info!(session_id = %self.inner.session_id, "drawdown monitor paused");
        true
    }

    pub fn resume(&self) -> bool {
        self.spawn_loops("resumed")
    }

    /// Pause, wait for the loops to drain, release the provider and write a
    /// final snapshot when a sink is configured.
    pub async fn shutdown(&self) -> anyhow::Result<()> {
        self.pause();
        let handles = std::mem::take(&mut *lock(&self.inner.retired));
        for h in handles {
            if let Err(e) = h.await {
                warn!(error = %e, "scheduled task ended abnormally");
            }
        }

        self.inner.collab.provider.close().await;

        if let Some(sink) = self.inner.collab.snapshot_sink.clone() {
            let snapshot = self.snapshot();
            sink.write(&snapshot)
                .await
                .context("write final engine snapshot")?;
        }
        info!(session_id = %self.inner.session_id, "drawdown monitor shut down");
        Ok(())
    }

    /// Reinitialize state, restore the loaded config, clear alerts.
    ///
    /// A tick waiting on a collaborator while this runs drops its result.
    pub fn reset(&self) {
        let base_ms = {
            let mut core = lock(&self.inner.core);
            core.reset(Utc::now());
            core.config.timing.monitoring_interval_ms
        };
        self.inner
            .monitor_interval_ms
            .store(base_ms, Ordering::Relaxed);
        info!(session_id = %self.inner.session_id, "engine state reset");
    }

    fn spawn_loops(&self, verb: &'static str) -> bool {
        let mut tasks = lock(&self.inner.tasks);
        if tasks.is_some() {
            debug!("{verb} ignored: loops already running");
            return false;
        }
        lock(&self.inner.retired).retain(|h| !h.is_finished());

        let timing = {
            let mut core = lock(&self.inner.core);
            core.state.is_active = true;
            core.config.timing.clone()
        };
        let evolution_enabled = lock(&self.inner.core).config.features.evolution;

        let (stop_tx, stop_rx) = watch::channel(false);
        let mut handles = vec![scheduler::spawn_monitor_loop(
            self.clone(),
            stop_rx.clone(),
        )];
        if evolution_enabled {
            handles.push(scheduler::spawn_evolution_loop(
                self.clone(),
                Duration::from_millis(timing.evolution_interval_ms),
                stop_rx.clone(),
            ));
        }
        handles.push(scheduler::spawn_metrics_loop(
            self.clone(),
            Duration::from_millis(timing.metrics_interval_ms),
            stop_rx,
        ));

        *tasks = Some(RunningTasks {
            stop: stop_tx,
            handles,
        });
        info!(
            session_id = %self.inner.session_id,
            monitoring_interval_ms = self.monitor_interval_ms(),
            evolution_enabled,
            "drawdown monitor {verb}"
        );
        true
    }

    // -----------------------------------------------------------------------
    // Monitor tick
    // -----------------------------------------------------------------------

    /// One monitoring tick. Scheduled by the monitor loop; callable directly.
    pub async fn run_monitor_tick(&self) -> TickResult {
        let Some(_tick) = TickGuard::try_acquire(&self.inner.tick_running) else {
            return self.skip_overlap("monitor");
        };

        let provider = &self.inner.collab.provider;
        let timeout_ms = self.provider_timeout_ms();
        let sampled = match tokio::time::timeout(
            Duration::from_millis(timeout_ms),
            provider.get_account_snapshot(),
        )
        .await
        {
            Ok(res) => res,
            Err(_) => Err(ProviderError::Timeout {
                after_ms: timeout_ms,
            }),
        };
        let now = Utc::now();

        let account = match sampled {
            Ok(a) => a,
            Err(e) => {
                warn!(provider = provider.name(), error = %e, "account sampling failed; tick skipped");
                let mut core = lock(&self.inner.core);
                core.metrics.sampling_failures += 1;
                core.ledger.push(
                    AlertCategory::Warning,
                    now,
                    format!("account sampling failed: {e}"),
                    json!({ "provider": provider.name(), "error": e.to_string() }),
                );
                return TickResult::SamplingFailed(e);
            }
        };

        // Phase 1: drawdown + tier. Entry actions that only flip flags land here.
        let (decision, epoch, base_interval_ms, last_leverage) = {
            let mut guard = lock(&self.inner.core);
            let core = &mut *guard;
            core.metrics.monitor_ticks += 1;
            core.metrics.last_position_count = account.positions.len();
            let previous_tier = core.tier();

            let decision =
                match begin_tick(&core.config, &mut core.state, account.total_balance_micros) {
                    Ok(d) => d,
                    Err(e) => {
                        core.metrics.computation_failures += 1;
                        error!(
                            error = %e,
                            balance_micros = account.total_balance_micros,
                            "drawdown computation failed; state left unchanged"
                        );
                        core.ledger.push(
                            AlertCategory::Critical,
                            now,
                            format!("drawdown computation failed: {e}"),
                            json!({
                                "balance_micros": account.total_balance_micros,
                                "error": e.to_string(),
                            }),
                        );
                        return TickResult::ComputationFailed(e);
                    }
                };

            if decision.tier != previous_tier {
                info!(
                    from = previous_tier.as_str(),
                    to = decision.tier.as_str(),
                    current_drawdown = core.state.current_drawdown,
                    "escalation tier changed"
                );
            }
            (
                decision,
                core.epoch,
                core.config.timing.monitoring_interval_ms,
                core.state.last_requested_leverage,
            )
        };

        self.apply_sampling_interval(decision.tier >= EscalationTier::Critical, base_interval_ms);

        // EMERGENCY (or worse): the leverage cut is requested before recovery math runs,
        // and only while it lowers the last accepted limit.
        let leverage = match decision.leverage_request(last_leverage) {
            Some(target) => Some(self.request_leverage(target, "emergency").await),
            None => {
                if let Some(target) = decision.leverage_target() {
                    debug!(target, last = ?last_leverage, "emergency leverage limit already in force");
                }
                None
            }
        };

        // Phase 2: recovery protocol, then events, then alerts.
        let report = {
            let mut guard = lock(&self.inner.core);
            let core = &mut *guard;
            if core.epoch != epoch {
                debug!("monitor tick superseded by reset");
                return TickResult::Superseded;
            }
            let report = finish_tick(&core.config, &mut core.state, &decision, leverage, now);
            if report.recovery_error.is_some() {
                core.metrics.computation_failures += 1;
            }
            self.emit_tick_events(core, &report, now);
            for alert in &report.alerts {
                core.ledger.append(alert.clone());
            }
            report
        };

        log_tick_report(&report);
        TickResult::Monitor(Box::new(report))
    }

    fn emit_tick_events(&self, core: &EngineCore, report: &TickReport, now: DateTime<Utc>) {
        let st = &core.state;
        if report.tier >= EscalationTier::Critical {
            self.emit(EngineEvent::DrawdownAlert {
                timestamp: now,
                tier: report.tier,
                current_drawdown: st.current_drawdown,
                max_historical_drawdown: st.max_historical_drawdown,
                peak_balance_micros: st.peak_balance_micros,
                current_balance_micros: st.current_balance_micros,
                conservation_mode: st.conservation_mode,
                leverage_target: report.leverage_target,
            });
        }

        if let Some(out) = &report.recovery {
            self.emit(EngineEvent::RecoveryActivated {
                timestamp: now,
                activation_count: out.recovery_activations,
                drawdown: out.drawdown,
                new_resilience_score: out.resilience_score,
                new_evolution_level: out.evolution_level,
                anti_fragility_index: out.anti_fragility_index,
            });
            if out.evolved {
                self.emit(EngineEvent::EvolutionComplete {
                    timestamp: now,
                    trigger: EvolutionTrigger::Recovery,
                    previous_level: out.evolution_level.saturating_sub(1),
                    evolution_level: out.evolution_level,
                    momentum: None,
                    resilience_score: out.resilience_score,
                    anti_fragility_index: out.anti_fragility_index,
                    thresholds: core.config.thresholds,
                });
            }
        }
    }

    fn apply_sampling_interval(&self, tightened: bool, base_ms: u64) {
        let target = if tightened {
            (base_ms / 2).max(1)
        } else {
            base_ms
        };
        let previous = self
            .inner
            .monitor_interval_ms
            .swap(target, Ordering::Relaxed);
        if previous != target {
            info!(interval_ms = target, tightened, "monitoring interval changed");
        }
    }

    // -----------------------------------------------------------------------
    // Evolution tick
    // -----------------------------------------------------------------------

    /// Resilience decay followed by a momentum check. Staged on a copy; a
    /// computation error leaves state and thresholds untouched.
    pub async fn run_evolution_tick(&self) -> TickResult {
        let Some(_tick) = TickGuard::try_acquire(&self.inner.tick_running) else {
            return self.skip_overlap("evolution");
        };
        let now = Utc::now();

        let mut guard = lock(&self.inner.core);
        let core = &mut *guard;
        if !core.config.features.evolution {
            return TickResult::Disabled;
        }
        core.metrics.evolution_ticks += 1;

        let mut staged = core.state.clone();
        let mut active = core.config.thresholds;
        let original = core.original.thresholds;
        let result = decay_toward_baseline(&core.config.resilience, &mut staged)
            .and_then(|_| evolve_if_due(&core.config, &original, &mut active, &mut staged, now));

        match result {
            Err(e) => {
                core.metrics.computation_failures += 1;
                error!(error = %e, "evolution tick aborted; state left unchanged");
                core.ledger.push(
                    AlertCategory::Critical,
                    now,
                    format!("evolution tick aborted: {e}"),
                    json!({ "error": e.to_string() }),
                );
                TickResult::ComputationFailed(e)
            }
            Ok(outcome) => {
                core.state = staged;
                core.config.thresholds = active;

                match &outcome {
                    Some(out) => {
                        info!(
                            level = out.evolution_level,
                            momentum = out.momentum,
                            resilience = out.resilience_score,
                            "evolution complete"
                        );
                        if out.thresholds_adjusted {
                            info!(
                                critical = out.thresholds.critical,
                                emergency = out.thresholds.emergency,
                                "thresholds self-adjusted"
                            );
                        }
                        self.emit(EngineEvent::EvolutionComplete {
                            timestamp: now,
                            trigger: EvolutionTrigger::Momentum,
                            previous_level: out.previous_level,
                            evolution_level: out.evolution_level,
                            momentum: Some(out.momentum),
                            resilience_score: out.resilience_score,
                            anti_fragility_index: out.anti_fragility_index,
                            thresholds: out.thresholds,
                        });
                        core.ledger.push(
                            AlertCategory::Evolution,
                            now,
                            format!(
                                "evolved to level {} on momentum {:.3}",
                                out.evolution_level, out.momentum
                            ),
                            json!({
                                "trigger": EvolutionTrigger::Momentum,
                                "evolution_level": out.evolution_level,
                                "momentum": out.momentum,
                                "thresholds": out.thresholds,
                            }),
                        );
                    }
                    None => debug!(
                        resilience = core.state.resilience_score,
                        "evolution tick: momentum below trigger"
                    ),
                }
                TickResult::Evolution(outcome)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Metrics / adaptation tick
    // -----------------------------------------------------------------------

    /// Refresh anti-fragility, request adaptive leverage when it changed, and
    /// write a snapshot to the sink.
    pub async fn run_metrics_tick(&self) -> TickResult {
        let Some(_tick) = TickGuard::try_acquire(&self.inner.tick_running) else {
            return self.skip_overlap("metrics");
        };
        let now = Utc::now();

        let (anti_fragility_index, recommended, last_requested, epoch) = {
            let mut guard = lock(&self.inner.core);
            let core = &mut *guard;
            core.metrics.metrics_ticks += 1;
            let af = match refresh_anti_fragility(&mut core.state) {
                Ok(af) => af,
                Err(e) => {
                    core.metrics.computation_failures += 1;
                    error!(error = %e, "anti-fragility refresh failed; state left unchanged");
                    core.ledger.push(
                        AlertCategory::Critical,
                        now,
                        format!("anti-fragility refresh failed: {e}"),
                        json!({ "error": e.to_string() }),
                    );
                    return TickResult::ComputationFailed(e);
                }
            };
            let recommended = core
                .config
                .features
                .adaptive_leverage
                .then(|| recommended_leverage(&core.config, &core.state));
            (af, recommended, core.state.last_requested_leverage, core.epoch)
        };

        let mut outcome = MetricsOutcome {
            anti_fragility_index,
            recommended_leverage: recommended,
            leverage_requested: false,
            leverage_error: None,
            snapshot_written: false,
        };

        if let Some(target) = recommended.filter(|t| Some(*t) != last_requested) {
            outcome.leverage_requested = true;
            let res = self.request_leverage(target, "adaptive").await;

            let mut guard = lock(&self.inner.core);
            let core = &mut *guard;
            if core.epoch != epoch {
                debug!("metrics tick superseded by reset");
                return TickResult::Superseded;
            }
            match res {
                Ok(applied) => {
                    let previous = core.state.last_requested_leverage.replace(applied);
                    self.emit(EngineEvent::SystemAdaptation {
                        timestamp: now,
                        recommended_leverage: applied,
                        previous_leverage: previous,
                        anti_fragility_index: core.state.anti_fragility_index,
                        current_drawdown: core.state.current_drawdown,
                        win_rate: core.state.win_rate(),
                        conservation_mode: core.state.conservation_mode,
                    });
                }
                Err(e) => {
                    core.ledger.push(
                        AlertCategory::Critical,
                        now,
                        format!("adaptive leverage not applied: {e}"),
                        json!({ "leverage_target": target, "error": e.to_string() }),
                    );
                    outcome.leverage_error = Some(e);
                }
            }
        }

        if let Some(sink) = self.inner.collab.snapshot_sink.clone() {
            let snapshot = self.snapshot();
            match sink.write(&snapshot).await {
                Ok(()) => outcome.snapshot_written = true,
                Err(e) => {
                    warn!(error = %format!("{e:#}"), "engine snapshot write failed");
                    let mut core = lock(&self.inner.core);
                    core.metrics.snapshot_failures += 1;
                    core.ledger.push(
                        AlertCategory::Warning,
                        now,
                        format!("engine snapshot write failed: {e:#}"),
                        json!({ "error": format!("{e:#}") }),
                    );
                }
            }
        }

        TickResult::Metrics(outcome)
    }

    // -----------------------------------------------------------------------
    // Trade feed
    // -----------------------------------------------------------------------

    /// Apply one trade result, then re-sample (skipped while paused or when
    /// another tick is running).
    pub async fn handle_trade_event(&self, ev: TradeFeedEvent) -> TickResult {
        let active = {
            let mut core = lock(&self.inner.core);
            core.state.record_trade(ev.profit_micros());
            debug!(
                profit_micros = ev.profit_micros(),
                total_trades = core.state.total_trades,
                consecutive_losses = core.state.consecutive_losses,
                "trade recorded"
            );
            core.state.is_active
        };
        if !active {
            return TickResult::Paused;
        }
        self.run_monitor_tick().await
    }

    /// Consume trade events until the sender side closes.
    pub fn spawn_trade_feed(&self, mut rx: mpsc::Receiver<TradeFeedEvent>) -> JoinHandle<()> {
        let monitor = self.clone();
        tokio::spawn(async move {
            while let Some(ev) = rx.recv().await {
                let _ = monitor.handle_trade_event(ev).await;
            }
            debug!("trade feed closed");
        })
    }

    // -----------------------------------------------------------------------
    // Reports
    // -----------------------------------------------------------------------

    pub fn system_report(&self) -> SystemReport {
        let core = lock(&self.inner.core);
        SystemReport {
            generated_at: Utc::now(),
            session_id: self.inner.session_id,
            tier: core.tier(),
            state: core.state.clone(),
            win_rate: core.state.win_rate(),
            thresholds: core.config.thresholds,
            original_thresholds: core.original.thresholds,
            monitoring_interval_ms: self.monitor_interval_ms(),
            recommended_leverage: recommended_leverage(&core.config, &core.state),
            metrics: core.metrics.clone(),
            alerts: core.ledger.recent_all(REPORT_ALERTS_PER_CATEGORY),
        }
    }

    pub fn evolution_report(&self) -> EvolutionReport {
        let now = Utc::now();
        let core = lock(&self.inner.core);
        let st = &core.state;
        EvolutionReport {
            generated_at: now,
            evolution_level: st.evolution_level,
            resilience_score: st.resilience_score,
            anti_fragility_index: st.anti_fragility_index,
            recovery_activations: st.recovery_activations,
            last_recovery_at: st.last_recovery_at,
            last_evolution_at: st.last_evolution_at,
            momentum: evolution_momentum(&core.config.resilience, st, now),
            thresholds: core.config.thresholds,
            original_thresholds: core.original.thresholds,
            recent_evolutions: core
                .ledger
                .recent(AlertCategory::Evolution, REPORT_ALERTS_PER_CATEGORY),
            recent_recoveries: core
                .ledger
                .recent(AlertCategory::Recovery, REPORT_ALERTS_PER_CATEGORY),
        }
    }

    /// Last `n` alerts of one category, most-recent last.
    pub fn recent_alerts(&self, category: AlertCategory, n: usize) -> Vec<AlertEntry> {
        lock(&self.inner.core).ledger.recent(category, n)
    }

    /// Full snapshot document as handed to the sink.
    pub fn snapshot(&self) -> EngineSnapshot {
        let core = lock(&self.inner.core);
        EngineSnapshot {
            timestamp: Utc::now(),
            session_id: self.inner.session_id,
            system_state: core.state.clone(),
            metrics: core.metrics.clone(),
            alerts: core.ledger.recent_all(core.ledger.capacity()),
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn provider_timeout_ms(&self) -> u64 {
        lock(&self.inner.core).config.timing.provider_timeout_ms
    }

    async fn request_leverage(
        &self,
        target: u32,
        reason: &'static str,
    ) -> Result<u32, ExternalActionError> {
        let timeout_ms = self.provider_timeout_ms();
        let res = match tokio::time::timeout(
            Duration::from_millis(timeout_ms),
            self.inner.collab.leverage.set_max_leverage(target),
        )
        .await
        {
            Ok(r) => r,
            Err(_) => Err(ExternalActionError::Timeout {
                action: "set_max_leverage",
                after_ms: timeout_ms,
            }),
        };

        {
            let mut core = lock(&self.inner.core);
            core.metrics.leverage_requests += 1;
            if res.is_err() {
                core.metrics.leverage_rejections += 1;
            }
        }

        match &res {
            Ok(()) => info!(leverage = target, reason, "leverage limit requested"),
            Err(e) => error!(leverage = target, reason, error = %e, "leverage request failed"),
        }
        res.map(|()| target)
    }

    fn skip_overlap(&self, kind: &'static str) -> TickResult {
        lock(&self.inner.core).metrics.ticks_skipped_overlap += 1;
        debug!(tick = kind, "tick skipped: another tick is still running");
        TickResult::SkippedOverlap
    }

    fn emit(&self, ev: EngineEvent) {
        debug!(event = ev.name(), "engine event");
        // No subscribers is not an error.
        let _ = self.inner.bus.send(ev);
    }
}

fn log_tick_report(report: &TickReport) {
    if let Some(out) = &report.recovery {
        info!(
            activation = out.recovery_activations,
            drawdown = out.drawdown,
            boost = out.boost,
            resilience = out.resilience_score,
            evolution_level = out.evolution_level,
            "recovery protocol activated"
        );
    }
    if let Some(e) = &report.recovery_error {
        error!(error = %e, "recovery protocol aborted; state left unchanged");
    }
    if report.recovery_suppressed {
        debug!(
            current_drawdown = report.current_drawdown,
            "recovery tier held; protocol disarmed until drawdown falls below emergency"
        );
    }
    debug!(
        tier = report.tier.as_str(),
        current_drawdown = report.current_drawdown,
        alerts = report.alerts.len(),
        "monitor tick complete"
    );
}
