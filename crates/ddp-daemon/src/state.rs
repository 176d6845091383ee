//! Engine-owned state and the tick overlap guard.
//!
//! `EngineCore` is only touched inside short synchronous sections; it is
//! never held across an `.await`.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use ddp_risk::{classify_tier, AlertLedger, EngineConfig, EscalationTier, SystemState};

use crate::EngineMetrics;

// ---------------------------------------------------------------------------
// EngineCore
// ---------------------------------------------------------------------------

pub struct EngineCore {
    /// Active config. Only `thresholds` ever changes (bounded self-adjustment).
    pub config: EngineConfig,
    /// Config as loaded; restored by `reset()`.
    pub original: EngineConfig,
    pub state: SystemState,
    pub ledger: AlertLedger,
    pub metrics: EngineMetrics,
    pub initial_balance_micros: i64,
    /// Bumped by `reset()`. A tick that awaited a collaborator compares the
    /// epoch before writing back.
    pub epoch: u64,
}

impl EngineCore {
    pub fn new(config: EngineConfig, initial_balance_micros: i64, now: DateTime<Utc>) -> Self {
        let state = SystemState::new(&config, initial_balance_micros, now);
        let ledger = AlertLedger::new(config.alert_capacity);
        Self {
            original: config.clone(),
            config,
            state,
            ledger,
            metrics: EngineMetrics::default(),
            initial_balance_micros,
            epoch: 0,
        }
    }

    /// Current tier, recomputed from drawdown and the active thresholds.
    pub fn tier(&self) -> EscalationTier {
        classify_tier(self.state.current_drawdown, &self.config.thresholds)
    }

    /// Reinitialize state in place; keep `is_active` and metrics.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        let is_active = self.state.is_active;
        self.config = self.original.clone();
        self.state = SystemState::new(&self.config, self.initial_balance_micros, now);
        self.state.is_active = is_active;
        self.ledger.clear();
        self.epoch = self.epoch.wrapping_add(1);
    }
}

// ---------------------------------------------------------------------------
// TickGuard
// ---------------------------------------------------------------------------

/// RAII holder of the shared "tick running" flag. At most one tick of any
/// kind holds it; a tick that cannot acquire it is skipped, never queued.
pub struct TickGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> TickGuard<'a> {
    pub fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
