//! Resilience tracker: baseline decay, evolution momentum, and the
//! momentum-driven evolve step (the only place thresholds move after init).

use chrono::{DateTime, Utc};

use crate::{ensure_finite, ComputationError, EngineConfig, ResilienceConfig, SystemState, Thresholds};

/// Clamp into `[0, 1]`. Callers reject non-finite values before clamping.
pub fn clamp_unit(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

/// `1 + level * 0.02`, applied to resilience and anti-fragility on every evolution.
pub fn evolution_multiplier(level: u32) -> f64 {
    1.0 + level as f64 * 0.02
}

/// Pull the resilience score toward its baseline by `decay_rate` of the gap.
///
/// Returns the new score. On a computation error the state is untouched.
pub fn decay_toward_baseline(
    cfg: &ResilienceConfig,
    st: &mut SystemState,
) -> Result<f64, ComputationError> {
    let gap = cfg.baseline - st.resilience_score;
    let next = ensure_finite("resilience_decay", st.resilience_score + gap * cfg.decay_rate)?;
    st.resilience_score = clamp_unit(next);
    Ok(st.resilience_score)
}

/// Evolution momentum in `[0, 1]`:
/// `timeFactor + drawdown * 2 + recoveryActivations * 0.1 * resilience`,
/// where `timeFactor = min(1, ms since last evolution / window)`.
pub fn evolution_momentum(cfg: &ResilienceConfig, st: &SystemState, now: DateTime<Utc>) -> f64 {
    let elapsed_ms = (now - st.last_evolution_at).num_milliseconds().max(0) as f64;
    let window_ms = cfg.evolution_window_ms.max(1) as f64;
    let time_factor = (elapsed_ms / window_ms).min(1.0);
    let drawdown_factor = st.current_drawdown;
    let recovery_factor = st.recovery_activations as f64 * 0.1 * st.resilience_score;

    let m = time_factor + drawdown_factor * 2.0 + recovery_factor;
    if m.is_finite() {
        clamp_unit(m)
    } else {
        0.0
    }
}

/// Bounded self-adjustment of the critical / emergency thresholds.
///
/// Each moves to `original * (1 + min(drift, 0.02 * (level - 1)))`, clamped to
/// `original * (1 ± drift)`. The recovery threshold never moves. A candidate
/// that breaks tier ordering is discarded and `active` is kept.
pub fn adjust_thresholds(
    original: &Thresholds,
    active: &Thresholds,
    level: u32,
    max_drift: f64,
) -> Thresholds {
    let step = (0.02 * level.saturating_sub(1) as f64).min(max_drift);
    let bound = |orig: f64| {
        (orig * (1.0 + step)).clamp(orig * (1.0 - max_drift), orig * (1.0 + max_drift))
    };

    let candidate = Thresholds {
        critical: bound(original.critical),
        emergency: bound(original.emergency),
        recovery: original.recovery,
    };

    if candidate.is_ordered() {
        candidate
    } else {
        *active
    }
}

/// Result of one momentum-driven evolve step.
#[derive(Clone, Debug, PartialEq)]
pub struct EvolutionOutcome {
    pub previous_level: u32,
    pub evolution_level: u32,
    pub momentum: f64,
    pub resilience_score: f64,
    pub anti_fragility_index: f64,
    pub thresholds: Thresholds,
    pub thresholds_adjusted: bool,
}

/// Evolve when momentum exceeds the trigger.
///
/// All values are staged first; state and `active` thresholds are assigned
/// only after every step succeeded.
pub fn evolve_if_due(
    cfg: &EngineConfig,
    original: &Thresholds,
    active: &mut Thresholds,
    st: &mut SystemState,
    now: DateTime<Utc>,
) -> Result<Option<EvolutionOutcome>, ComputationError> {
    let momentum = evolution_momentum(&cfg.resilience, st, now);
    if momentum <= cfg.resilience.momentum_trigger {
        return Ok(None);
    }

    let level = st
        .evolution_level
        .checked_add(1)
        .ok_or(ComputationError::Overflow {
            stage: "evolution_level",
        })?;
    let mult = evolution_multiplier(level);
    let resilience = clamp_unit(ensure_finite(
        "evolve_resilience",
        st.resilience_score * mult,
    )?);
    let anti_fragility = clamp_unit(ensure_finite(
        "evolve_anti_fragility",
        st.anti_fragility_index * mult,
    )?);
    let thresholds = adjust_thresholds(original, active, level, cfg.resilience.max_threshold_drift);
    let thresholds_adjusted = thresholds != *active;

    let previous_level = st.evolution_level;
    st.evolution_level = level;
    st.resilience_score = resilience;
    st.anti_fragility_index = anti_fragility;
    st.last_evolution_at = now;
    *active = thresholds;

    Ok(Some(EvolutionOutcome {
        previous_level,
        evolution_level: level,
        momentum,
        resilience_score: resilience,
        anti_fragility_index: anti_fragility,
        thresholds,
        thresholds_adjusted,
    }))
}
