use crate::{clamp_unit, ensure_finite, ComputationError, EngineConfig, SystemState};

/// Target anti-fragility from win rate, evolution progress and resilience:
/// `winRate * 0.4 + min(1, (level - 1) * 0.1) * 0.3 + resilience * 0.3`.
pub fn blend_anti_fragility(st: &SystemState) -> f64 {
    let evolution = (st.evolution_level.saturating_sub(1) as f64 * 0.1).min(1.0);
    st.win_rate() * 0.4 + evolution * 0.3 + st.resilience_score * 0.3
}

/// Smooth the anti-fragility index toward its blend (70/30) and clamp.
pub fn refresh_anti_fragility(st: &mut SystemState) -> Result<f64, ComputationError> {
    let blend = ensure_finite("anti_fragility_blend", blend_anti_fragility(st))?;
    let next = ensure_finite(
        "anti_fragility_smooth",
        st.anti_fragility_index * 0.7 + blend * 0.3,
    )?;
    st.anti_fragility_index = clamp_unit(next);
    Ok(st.anti_fragility_index)
}

/// Adaptive leverage recommendation.
///
/// Drawdown pressure (relative to the recovery threshold) can take away up to
/// half of `max_leverage`; anti-fragility scales the rest between 50% and
/// 100%. Capped at the EMERGENCY target while conservation mode is on.
pub fn recommended_leverage(cfg: &EngineConfig, st: &SystemState) -> u32 {
    let max = cfg.leverage.max_leverage;
    let pressure = if cfg.thresholds.recovery > 0.0 {
        clamp_unit(st.current_drawdown / cfg.thresholds.recovery)
    } else {
        1.0
    };
    let raw = max as f64 * (1.0 - 0.5 * pressure) * (0.5 + 0.5 * st.anti_fragility_index);

    let mut lev = if raw.is_finite() && raw >= 1.0 {
        (raw.floor() as u32).min(max)
    } else {
        1
    };
    if st.conservation_mode {
        lev = lev.min(cfg.leverage.emergency_target());
    }
    lev.max(1)
}
