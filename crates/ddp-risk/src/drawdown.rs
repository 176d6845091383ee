use crate::{ensure_finite, ComputationError, SystemState};

/// Result of folding one balance sample into the drawdown history.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawdownUpdate {
    pub current_drawdown: f64,
    pub peak_balance_micros: i64,
    pub max_historical_drawdown: f64,
}

/// Guard: a balance sample must be ≥ 0.
///
/// Runs before anything else so a bad upstream value cannot move the peak.
pub fn validate_balance_input(balance_micros: i64) -> Result<(), ComputationError> {
    if balance_micros < 0 {
        return Err(ComputationError::NegativeBalance { balance_micros });
    }
    Ok(())
}

/// Pure drawdown derivation. Same inputs, same output; no side effects.
///
/// - `peak = max(previous peak, new balance)`
/// - `drawdown = max(0, (peak - balance) / peak)`, 0 when `peak == 0`
/// - `max_drawdown = max(previous max, drawdown)`
pub fn compute_drawdown(
    st: &SystemState,
    new_balance_micros: i64,
) -> Result<DrawdownUpdate, ComputationError> {
    validate_balance_input(new_balance_micros)?;

    let peak = st.peak_balance_micros.max(new_balance_micros);

    let current_drawdown = if peak <= 0 {
        0.0
    } else {
        let loss = peak
            .checked_sub(new_balance_micros)
            .ok_or(ComputationError::Overflow { stage: "drawdown" })?;
        let raw = ensure_finite("drawdown", loss as f64 / peak as f64)?;
        raw.clamp(0.0, 1.0)
    };

    Ok(DrawdownUpdate {
        current_drawdown,
        peak_balance_micros: peak,
        max_historical_drawdown: st.max_historical_drawdown.max(current_drawdown),
    })
}

/// Commit a computed update plus the sampled balance.
pub fn apply_drawdown(st: &mut SystemState, new_balance_micros: i64, upd: &DrawdownUpdate) {
    st.current_balance_micros = new_balance_micros;
    st.peak_balance_micros = upd.peak_balance_micros;
    st.current_drawdown = upd.current_drawdown;
    st.max_historical_drawdown = upd.max_historical_drawdown;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EngineConfig, MICROS_SCALE};
    use chrono::{TimeZone, Utc};

    const M: i64 = MICROS_SCALE;

    fn state_at(balance: i64) -> SystemState {
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 0, 0, 0).unwrap();
        SystemState::new(&EngineConfig::sane_defaults(), balance, now)
    }

    #[test]
    fn three_percent_loss_from_peak() {
        let st = state_at(10_000 * M);
        let upd = compute_drawdown(&st, 9_700 * M).unwrap();
        assert!((upd.current_drawdown - 0.03).abs() < 1e-12);
        assert_eq!(upd.peak_balance_micros, 10_000 * M);
        assert!((upd.max_historical_drawdown - 0.03).abs() < 1e-12);
    }

    #[test]
    fn new_high_moves_peak_and_zeroes_drawdown() {
        let mut st = state_at(10_000 * M);
        st.max_historical_drawdown = 0.02;
        let upd = compute_drawdown(&st, 10_500 * M).unwrap();
        assert_eq!(upd.current_drawdown, 0.0);
        assert_eq!(upd.peak_balance_micros, 10_500 * M);
        assert_eq!(upd.max_historical_drawdown, 0.02, "max never decreases");
    }

    #[test]
    fn zero_peak_yields_zero_drawdown() {
        let st = state_at(0);
        let upd = compute_drawdown(&st, 0).unwrap();
        assert_eq!(upd.current_drawdown, 0.0);
    }

    #[test]
    fn total_wipeout_is_one() {
        let st = state_at(500 * M);
        let upd = compute_drawdown(&st, 0).unwrap();
        assert_eq!(upd.current_drawdown, 1.0);
    }

    #[test]
    fn negative_balance_is_rejected_without_touching_state() {
        let st = state_at(1_000 * M);
        let before = st.clone();
        let err = compute_drawdown(&st, -1).unwrap_err();
        assert_eq!(err, ComputationError::NegativeBalance { balance_micros: -1 });
        assert_eq!(st, before);
    }

    #[test]
    fn deterministic_for_same_inputs() {
        let st = state_at(10_000 * M);
        assert_eq!(
            compute_drawdown(&st, 9_123 * M).unwrap(),
            compute_drawdown(&st, 9_123 * M).unwrap()
        );
    }
}
