//! Recovery protocol.
//!
//! Converts drawdown stress into a resilience boost. Computed as a staged
//! [`RecoveryOutcome`] and committed in one assignment, so a computation
//! error never leaves a partially applied boost behind.

use chrono::{DateTime, Utc};

use crate::{
    clamp_unit, ensure_finite, evolution_multiplier, ComputationError, RecoveryConfig,
    SystemState,
};

/// Staged result of one recovery activation.
#[derive(Clone, Debug, PartialEq)]
pub struct RecoveryOutcome {
    pub drawdown: f64,
    pub stress_energy: f64,
    pub boost: f64,
    /// Resilience after the boost, before any evolution multiplier.
    pub boosted_resilience: f64,
    pub resilience_score: f64,
    pub anti_fragility_index: f64,
    pub recovery_activations: u32,
    pub evolution_level: u32,
    /// True when the boost crossed the evolution threshold.
    pub evolved: bool,
    pub activated_at: DateTime<Utc>,
}

/// Compute a recovery activation without touching state.
pub fn plan_recovery(
    cfg: &RecoveryConfig,
    st: &SystemState,
    now: DateTime<Utc>,
) -> Result<RecoveryOutcome, ComputationError> {
    let drawdown = ensure_finite("drawdown", st.current_drawdown)?;
    let stress_energy = ensure_finite("stress_energy", drawdown * cfg.regeneration_factor)?;
    let boost = ensure_finite("boost", stress_energy * cfg.stress_amplifier)?;

    let boosted_resilience = clamp_unit(ensure_finite(
        "resilience_boost",
        st.resilience_score * (1.0 + boost * 0.1),
    )?);
    let boosted_anti_fragility = clamp_unit(ensure_finite(
        "anti_fragility_boost",
        st.anti_fragility_index * (1.0 + stress_energy * 0.15),
    )?);

    let recovery_activations = st
        .recovery_activations
        .checked_add(1)
        .ok_or(ComputationError::Overflow {
            stage: "recovery_activations",
        })?;

    let evolved = boost >= cfg.evolution_boost_threshold;
    let (evolution_level, resilience_score, anti_fragility_index) = if evolved {
        let level = st
            .evolution_level
            .checked_add(1)
            .ok_or(ComputationError::Overflow {
                stage: "evolution_level",
            })?;
        let mult = evolution_multiplier(level);
        (
            level,
            clamp_unit(ensure_finite("evolve_resilience", boosted_resilience * mult)?),
            clamp_unit(ensure_finite(
                "evolve_anti_fragility",
                boosted_anti_fragility * mult,
            )?),
        )
    } else {
        (st.evolution_level, boosted_resilience, boosted_anti_fragility)
    };

    Ok(RecoveryOutcome {
        drawdown,
        stress_energy,
        boost,
        boosted_resilience,
        resilience_score,
        anti_fragility_index,
        recovery_activations,
        evolution_level,
        evolved,
        activated_at: now,
    })
}

/// Assign a planned outcome and disarm until the drawdown eases.
pub fn commit_recovery(st: &mut SystemState, out: &RecoveryOutcome) {
    st.resilience_score = out.resilience_score;
    st.anti_fragility_index = out.anti_fragility_index;
    st.recovery_activations = out.recovery_activations;
    st.last_recovery_at = Some(out.activated_at);
    if out.evolved {
        st.evolution_level = out.evolution_level;
        st.last_evolution_at = out.activated_at;
    }
    st.recovery_armed = false;
}

/// Plan + commit. On error the state is left exactly as it was (still armed).
pub fn run_recovery(
    cfg: &RecoveryConfig,
    st: &mut SystemState,
    now: DateTime<Utc>,
) -> Result<RecoveryOutcome, ComputationError> {
    let out = plan_recovery(cfg, st, now)?;
    commit_recovery(st, &out);
    Ok(out)
}
