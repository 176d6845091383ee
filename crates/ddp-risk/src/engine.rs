//! One monitoring tick, split around the only external side effect.
//!
//! `begin_tick` (drawdown + tier) → caller requests leverage reduction →
//! `finish_tick` (recovery protocol + alert drafts). The leverage request
//! therefore always lands before any recovery math runs.

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::{
    apply_drawdown, compute_drawdown, evaluate_escalation, run_recovery, AlertCategory,
    AlertEntry, ComputationError, EngineConfig, EscalationDecision, EscalationTier,
    ExternalActionError, RecoveryOutcome, SystemState,
};

/// Fold a balance sample into state and evaluate the escalation tier.
///
/// On a computation error nothing has been written to `st`.
pub fn begin_tick(
    cfg: &EngineConfig,
    st: &mut SystemState,
    balance_micros: i64,
) -> Result<EscalationDecision, ComputationError> {
    let upd = compute_drawdown(st, balance_micros)?;
    apply_drawdown(st, balance_micros, &upd);
    Ok(evaluate_escalation(cfg, st))
}

/// Everything that happened in one tick after sampling.
#[derive(Clone, Debug, PartialEq)]
pub struct TickReport {
    pub tier: EscalationTier,
    pub current_drawdown: f64,
    pub leverage_target: Option<u32>,
    pub leverage_error: Option<ExternalActionError>,
    pub recovery: Option<RecoveryOutcome>,
    pub recovery_error: Option<ComputationError>,
    /// RECOVERY tier held but the protocol was disarmed.
    pub recovery_suppressed: bool,
    /// Alert drafts in firing order; the caller appends them to the ledger.
    pub alerts: Vec<AlertEntry>,
}

/// Finish a tick: record the leverage outcome, run the recovery protocol
/// when due, and draft one alert per fired tier.
pub fn finish_tick(
    cfg: &EngineConfig,
    st: &mut SystemState,
    decision: &EscalationDecision,
    leverage: Option<Result<u32, ExternalActionError>>,
    now: DateTime<Utc>,
) -> TickReport {
    let mut alerts = Vec::new();
    let tier = decision.tier;
    let dd = st.current_drawdown;

    if tier >= EscalationTier::Critical {
        alerts.push(AlertEntry::new(
            now,
            AlertCategory::Warning,
            format!("drawdown {:.4} entered CRITICAL tier; sampling tightened", dd),
            json!({
                "tier": EscalationTier::Critical,
                "current_drawdown": dd,
                "critical_threshold": cfg.thresholds.critical,
                "peak_balance_micros": st.peak_balance_micros,
                "current_balance_micros": st.current_balance_micros,
            }),
        ));
    }

    let mut leverage_error = None;
    if tier >= EscalationTier::Emergency {
        let target = decision.leverage_target();
        alerts.push(AlertEntry::new(
            now,
            AlertCategory::Critical,
            format!(
                "drawdown {:.4} entered EMERGENCY tier; conservation mode on, leverage reduction requested",
                dd
            ),
            json!({
                "tier": EscalationTier::Emergency,
                "current_drawdown": dd,
                "emergency_threshold": cfg.thresholds.emergency,
                "leverage_target": target,
            }),
        ));

        match leverage {
            Some(Ok(applied)) => st.last_requested_leverage = Some(applied),
            Some(Err(e)) => {
                alerts.push(AlertEntry::new(
                    now,
                    AlertCategory::Critical,
                    format!("leverage reduction not applied: {e}"),
                    json!({ "leverage_target": target, "error": e.to_string() }),
                ));
                leverage_error = Some(e);
            }
            None => {}
        }
    }

    let mut recovery = None;
    let mut recovery_error = None;
    if decision.recovery_due {
        match run_recovery(&cfg.recovery, st, now) {
            Ok(out) => {
                alerts.push(AlertEntry::new(
                    now,
                    AlertCategory::Recovery,
                    format!(
                        "recovery protocol activation #{} at drawdown {:.4}",
                        out.recovery_activations, out.drawdown
                    ),
                    json!({
                        "activation_count": out.recovery_activations,
                        "drawdown": out.drawdown,
                        "stress_energy": out.stress_energy,
                        "boost": out.boost,
                        "resilience_score": out.resilience_score,
                        "anti_fragility_index": out.anti_fragility_index,
                    }),
                ));
                if out.evolved {
                    alerts.push(AlertEntry::new(
                        now,
                        AlertCategory::Evolution,
                        format!("evolved to level {} after recovery", out.evolution_level),
                        json!({
                            "trigger": "recovery",
                            "evolution_level": out.evolution_level,
                            "boost": out.boost,
                        }),
                    ));
                }
                recovery = Some(out);
            }
            Err(e) => {
                alerts.push(AlertEntry::new(
                    now,
                    AlertCategory::Critical,
                    format!("recovery protocol aborted: {e}"),
                    json!({ "current_drawdown": dd, "error": e.to_string() }),
                ));
                recovery_error = Some(e);
            }
        }
    }

    TickReport {
        tier,
        current_drawdown: dd,
        leverage_target: decision.leverage_target(),
        leverage_error,
        recovery,
        recovery_error,
        recovery_suppressed: tier == EscalationTier::Recovery && !decision.recovery_due,
        alerts,
    }
}
