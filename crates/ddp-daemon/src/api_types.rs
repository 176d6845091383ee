//! Events, reports and snapshot documents exposed by the monitor.
//!
//! Everything that crosses the engine boundary is `Serialize + Deserialize`
//! so subscribers and sinks can JSON-encode it. No business logic lives here.

use chrono::{DateTime, Utc};
use ddp_risk::{
    AlertEntry, AlertsByCategory, ComputationError, EscalationTier, EvolutionOutcome,
    EvolutionTrigger, ExternalActionError, ProviderError, SystemState, Thresholds, TickReport,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// EngineEvent: broadcast bus payload
// ---------------------------------------------------------------------------

/// Closed set of events published on the engine bus.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// Monitoring tick at CRITICAL or above.
    DrawdownAlert {
        timestamp: DateTime<Utc>,
        tier: EscalationTier,
        current_drawdown: f64,
        max_historical_drawdown: f64,
        peak_balance_micros: i64,
        current_balance_micros: i64,
        conservation_mode: bool,
        leverage_target: Option<u32>,
    },
    RecoveryActivated {
        timestamp: DateTime<Utc>,
        activation_count: u32,
        drawdown: f64,
        new_resilience_score: f64,
        new_evolution_level: u32,
        anti_fragility_index: f64,
    },
    EvolutionComplete {
        timestamp: DateTime<Utc>,
        trigger: EvolutionTrigger,
        previous_level: u32,
        evolution_level: u32,
        /// Set for momentum-driven evolutions only.
        momentum: Option<f64>,
        resilience_score: f64,
        anti_fragility_index: f64,
        thresholds: Thresholds,
    },
    /// Adaptive leverage change accepted by the controller.
    SystemAdaptation {
        timestamp: DateTime<Utc>,
        recommended_leverage: u32,
        previous_leverage: Option<u32>,
        anti_fragility_index: f64,
        current_drawdown: f64,
        win_rate: f64,
        conservation_mode: bool,
    },
}

impl EngineEvent {
    pub fn name(&self) -> &'static str {
        match self {
            EngineEvent::DrawdownAlert { .. } => "drawdown_alert",
            EngineEvent::RecoveryActivated { .. } => "recovery_activated",
            EngineEvent::EvolutionComplete { .. } => "evolution_complete",
            EngineEvent::SystemAdaptation { .. } => "system_adaptation",
        }
    }
}

// ---------------------------------------------------------------------------
// Trade execution feed
// ---------------------------------------------------------------------------

/// Inbound events from the trade-execution collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TradeFeedEvent {
    TradeExecuted { profit_micros: i64 },
    PositionClosed { profit_micros: i64 },
}

impl TradeFeedEvent {
    pub fn profit_micros(&self) -> i64 {
        match self {
            TradeFeedEvent::TradeExecuted { profit_micros }
            | TradeFeedEvent::PositionClosed { profit_micros } => *profit_micros,
        }
    }
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Operational counters. Survive `reset()`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineMetrics {
    pub monitor_ticks: u64,
    pub evolution_ticks: u64,
    pub metrics_ticks: u64,
    /// Ticks of any kind skipped because another tick held the guard.
    pub ticks_skipped_overlap: u64,
    pub sampling_failures: u64,
    pub computation_failures: u64,
    pub leverage_requests: u64,
    pub leverage_rejections: u64,
    pub snapshot_failures: u64,
    pub last_position_count: usize,
}

// ---------------------------------------------------------------------------
// Tick results
// ---------------------------------------------------------------------------

/// What the metrics/adaptation tick did.
#[derive(Clone, Debug, PartialEq)]
pub struct MetricsOutcome {
    pub anti_fragility_index: f64,
    /// `None` when adaptive leverage is disabled.
    pub recommended_leverage: Option<u32>,
    pub leverage_requested: bool,
    pub leverage_error: Option<ExternalActionError>,
    pub snapshot_written: bool,
}

/// Outcome of one scheduled (or directly invoked) tick.
#[derive(Clone, Debug, PartialEq)]
pub enum TickResult {
    Monitor(Box<TickReport>),
    /// `None`: momentum stayed at or below the trigger.
    Evolution(Option<EvolutionOutcome>),
    Metrics(MetricsOutcome),
    /// Another tick held the guard; nothing ran.
    SkippedOverlap,
    SamplingFailed(ProviderError),
    ComputationFailed(ComputationError),
    /// The feature flag for this tick is off.
    Disabled,
    /// Trade-triggered re-sample while the monitor is paused.
    Paused,
    /// `reset()` ran while this tick awaited a collaborator; its result was dropped.
    Superseded,
}

impl TickResult {
    pub fn tier(&self) -> Option<EscalationTier> {
        match self {
            TickResult::Monitor(r) => Some(r.tier),
            _ => None,
        }
    }

    pub fn monitor_report(&self) -> Option<&TickReport> {
        match self {
            TickResult::Monitor(r) => Some(r),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Full state plus the last alerts of every category.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SystemReport {
    pub generated_at: DateTime<Utc>,
    pub session_id: Uuid,
    pub tier: EscalationTier,
    pub state: SystemState,
    pub win_rate: f64,
    /// Active thresholds (after any self-adjustment).
    pub thresholds: Thresholds,
    pub original_thresholds: Thresholds,
    pub monitoring_interval_ms: u64,
    pub recommended_leverage: u32,
    pub metrics: EngineMetrics,
    pub alerts: AlertsByCategory,
}

/// Evolution-focused subset of the system report.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvolutionReport {
    pub generated_at: DateTime<Utc>,
    pub evolution_level: u32,
    pub resilience_score: f64,
    pub anti_fragility_index: f64,
    pub recovery_activations: u32,
    pub last_recovery_at: Option<DateTime<Utc>>,
    pub last_evolution_at: DateTime<Utc>,
    /// Momentum as it would be computed right now.
    pub momentum: f64,
    pub thresholds: Thresholds,
    pub original_thresholds: Thresholds,
    pub recent_evolutions: Vec<AlertEntry>,
    pub recent_recoveries: Vec<AlertEntry>,
}

/// Document handed to the snapshot sink.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub timestamp: DateTime<Utc>,
    pub session_id: Uuid,
    pub system_state: SystemState,
    pub metrics: EngineMetrics,
    pub alerts: AlertsByCategory,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trade_feed_event_wire_shape() {
        let ev: TradeFeedEvent =
            serde_json::from_str(r#"{"type":"trade_executed","profit_micros":-2500000}"#).unwrap();
        assert_eq!(ev.profit_micros(), -2_500_000);
    }

    #[test]
    fn engine_event_is_tagged() {
        let ev = EngineEvent::RecoveryActivated {
            timestamp: Utc::now(),
            activation_count: 1,
            drawdown: 0.08,
            new_resilience_score: 0.9,
            new_evolution_level: 2,
            anti_fragility_index: 0.5,
        };
        let v = serde_json::to_value(&ev).unwrap();
        assert_eq!(v["type"], "recovery_activated");
        assert_eq!(ev.name(), "recovery_activated");
    }
}
