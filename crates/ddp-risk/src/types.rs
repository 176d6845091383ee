use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::EngineConfig;

/// 1e-6 fixed-point scale for balances.
pub const MICROS_SCALE: i64 = 1_000_000;

/// Severity tiers, ordered. Derived from drawdown every tick; never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EscalationTier {
    Normal,
    Critical,
    Emergency,
    Recovery,
}

impl EscalationTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            EscalationTier::Normal => "NORMAL",
            EscalationTier::Critical => "CRITICAL",
            EscalationTier::Emergency => "EMERGENCY",
            EscalationTier::Recovery => "RECOVERY",
        }
    }
}

/// Alert ledger categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertCategory {
    Critical,
    Warning,
    Evolution,
    Recovery,
}

impl AlertCategory {
    pub const ALL: [AlertCategory; 4] = [
        AlertCategory::Critical,
        AlertCategory::Warning,
        AlertCategory::Evolution,
        AlertCategory::Recovery,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertCategory::Critical => "critical",
            AlertCategory::Warning => "warning",
            AlertCategory::Evolution => "evolution",
            AlertCategory::Recovery => "recovery",
        }
    }
}

/// One ledger entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlertEntry {
    pub timestamp: DateTime<Utc>,
    pub category: AlertCategory,
    pub message: String,
    pub payload: Value,
}

impl AlertEntry {
    pub fn new(
        timestamp: DateTime<Utc>,
        category: AlertCategory,
        message: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            timestamp,
            category,
            message: message.into(),
            payload,
        }
    }
}

/// What caused an evolution level increment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvolutionTrigger {
    /// Recovery protocol boost crossed the evolution threshold.
    Recovery,
    /// Evolution momentum crossed the trigger on the evolution tick.
    Momentum,
}

/// Engine state. Single owner (the monitor loop); mutated only inside one
/// synchronous tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SystemState {
    pub is_active: bool,

    pub current_balance_micros: i64,
    pub initial_balance_micros: i64,
    pub peak_balance_micros: i64,

    /// `max(0, (peak - current) / peak)`, in `[0, 1]`.
    pub current_drawdown: f64,
    /// Monotonically non-decreasing.
    pub max_historical_drawdown: f64,

    pub consecutive_losses: u32,
    /// Number of recovery protocol activations.
    pub recovery_activations: u32,
    /// Starts at 1, never decreases.
    pub evolution_level: u32,

    /// Bounded to `[0, 1]` after every update.
    pub resilience_score: f64,
    /// Bounded to `[0, 1]` after every update.
    pub anti_fragility_index: f64,

    pub last_recovery_at: Option<DateTime<Utc>>,
    /// Last evolution of any kind (engine start until the first one).
    pub last_evolution_at: DateTime<Utc>,

    pub total_trades: u64,
    pub profitable_trades: u64,

    /// Cleared on a recovery trigger; set again once drawdown drops below
    /// the emergency threshold.
    pub recovery_armed: bool,
    /// Set by EMERGENCY, cleared on return to NORMAL.
    pub conservation_mode: bool,
    /// Set by CRITICAL (sampling interval halved), cleared on return to NORMAL.
    pub sampling_tightened: bool,
    /// Last leverage limit the controller accepted.
    pub last_requested_leverage: Option<u32>,
}

impl SystemState {
    pub fn new(cfg: &EngineConfig, initial_balance_micros: i64, now: DateTime<Utc>) -> Self {
        let initial = initial_balance_micros.max(0);
        Self {
            is_active: false,
            current_balance_micros: initial,
            initial_balance_micros: initial,
            peak_balance_micros: initial,
            current_drawdown: 0.0,
            max_historical_drawdown: 0.0,
            consecutive_losses: 0,
            recovery_activations: 0,
            evolution_level: 1,
            resilience_score: cfg.resilience.baseline,
            anti_fragility_index: cfg.resilience.anti_fragility_baseline,
            last_recovery_at: None,
            last_evolution_at: now,
            total_trades: 0,
            profitable_trades: 0,
            recovery_armed: true,
            conservation_mode: false,
            sampling_tightened: false,
            last_requested_leverage: None,
        }
    }

    /// Profitable share of closed trades; 0 with no trades.
    pub fn win_rate(&self) -> f64 {
        if self.total_trades == 0 {
            0.0
        } else {
            self.profitable_trades as f64 / self.total_trades as f64
        }
    }

    /// Apply one trade result from the execution feed.
    pub fn record_trade(&mut self, profit_micros: i64) {
        self.total_trades = self.total_trades.saturating_add(1);
        if profit_micros > 0 {
            self.profitable_trades = self.profitable_trades.saturating_add(1);
            self.consecutive_losses = 0;
        } else {
            self.consecutive_losses = self.consecutive_losses.saturating_add(1);
        }
    }
}
