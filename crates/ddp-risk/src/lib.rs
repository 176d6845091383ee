//! ddp-risk
//!
//! Drawdown protection policy core.
//!
//! Goals:
//! - Drawdown tracking from a stream of balance samples
//! - Four-tier escalation (NORMAL / CRITICAL / EMERGENCY / RECOVERY)
//! - Rate-limited recovery protocol feeding a bounded resilience score
//! - Evolution momentum with bounded threshold self-adjustment
//! - Size-bounded alert ledger
//!
//! Deterministic, pure logic. No IO, no wall clock, no async. Callers pass `now`.

mod adaptation;
mod config;
mod drawdown;
mod engine;
mod error;
mod escalation;
mod ledger;
mod recovery;
mod resilience;
mod types;

pub use adaptation::{blend_anti_fragility, recommended_leverage, refresh_anti_fragility};
pub use config::*;
pub use drawdown::{apply_drawdown, compute_drawdown, validate_balance_input, DrawdownUpdate};
pub use engine::{begin_tick, finish_tick, TickReport};
pub use error::*;
pub use escalation::{classify_tier, entry_actions, evaluate_escalation, EscalationDecision, TierAction};
pub use ledger::{AlertLedger, AlertsByCategory};
pub use recovery::{commit_recovery, plan_recovery, run_recovery, RecoveryOutcome};
pub use resilience::{
    adjust_thresholds, clamp_unit, decay_toward_baseline, evolution_momentum, evolution_multiplier,
    evolve_if_due, EvolutionOutcome,
};
pub use types::*;
