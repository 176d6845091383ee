use crate::{EngineConfig, EscalationTier, SystemState, Thresholds};

/// Side effects a tier asks the caller to carry out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TierAction {
    /// CRITICAL: halve the monitoring interval.
    TightenSampling,
    /// EMERGENCY: ask the leverage controller for a lower limit.
    ReduceLeverage { target: u32 },
    /// EMERGENCY: enable conservation mode.
    EnterConservation,
    /// RECOVERY: run the recovery protocol (only when armed).
    InvokeRecovery,
}

/// Output of one escalation evaluation.
#[derive(Clone, Debug, PartialEq)]
pub struct EscalationDecision {
    pub tier: EscalationTier,
    /// Entry actions of every non-NORMAL tier up to `tier`, ascending.
    pub actions: Vec<TierAction>,
    /// True when the tier is RECOVERY and the protocol is armed.
    pub recovery_due: bool,
}

impl EscalationDecision {
    pub fn leverage_target(&self) -> Option<u32> {
        self.actions.iter().find_map(|a| match a {
            TierAction::ReduceLeverage { target } => Some(*target),
            _ => None,
        })
    }

    /// Leverage limit to request given the last limit the controller
    /// accepted. `None` when that limit is already at or below the target.
    pub fn leverage_request(&self, last_applied: Option<u32>) -> Option<u32> {
        let target = self.leverage_target()?;
        match last_applied {
            Some(last) if last <= target => None,
            _ => Some(target),
        }
    }
}

/// Map a drawdown onto its tier. Pure function of drawdown and thresholds.
pub fn classify_tier(drawdown: f64, t: &Thresholds) -> EscalationTier {
    if drawdown >= t.recovery {
        EscalationTier::Recovery
    } else if drawdown >= t.emergency {
        EscalationTier::Emergency
    } else if drawdown >= t.critical {
        EscalationTier::Critical
    } else {
        EscalationTier::Normal
    }
}

/// Entry actions for `tier`, cascading through every lower non-NORMAL tier
/// so none is skipped on a jump (leverage is always cut before recovery).
pub fn entry_actions(tier: EscalationTier, cfg: &EngineConfig) -> Vec<TierAction> {
    let mut out = Vec::new();
    if tier >= EscalationTier::Critical {
        out.push(TierAction::TightenSampling);
    }
    if tier >= EscalationTier::Emergency {
        out.push(TierAction::ReduceLeverage {
            target: cfg.leverage.emergency_target(),
        });
        out.push(TierAction::EnterConservation);
    }
    if tier >= EscalationTier::Recovery {
        out.push(TierAction::InvokeRecovery);
    }
    out
}

/// Level-triggered tier evaluation against `st.current_drawdown`.
///
/// Updates only idempotent flags (sampling, conservation, recovery re-arm),
/// so evaluating the same drawdown twice leaves the state unchanged.
pub fn evaluate_escalation(cfg: &EngineConfig, st: &mut SystemState) -> EscalationDecision {
    let t = &cfg.thresholds;
    let tier = classify_tier(st.current_drawdown, t);

    // Re-arm once the episode has eased below EMERGENCY.
    if st.current_drawdown < t.emergency {
        st.recovery_armed = true;
    }

    match tier {
        EscalationTier::Normal => {
            st.sampling_tightened = false;
            st.conservation_mode = false;
        }
        EscalationTier::Critical => {
            st.sampling_tightened = true;
        }
        EscalationTier::Emergency | EscalationTier::Recovery => {
            st.sampling_tightened = true;
            st.conservation_mode = true;
        }
    }

    let actions = entry_actions(tier, cfg);
    let recovery_due = tier == EscalationTier::Recovery && st.recovery_armed;

    EscalationDecision {
        tier,
        actions,
        recovery_due,
    }
}
