//! Scenario: NORMAL → RECOVERY in one tick.
//!
//! With thresholds 0.03 / 0.045 / 0.07, a drawdown of 0.08 must fire the
//! EMERGENCY leverage-reduction action and then the recovery protocol, in
//! that order, within the same tick. No tier is skipped silently.

use chrono::{TimeZone, Utc};
use ddp_risk::*;

const M: i64 = MICROS_SCALE;

#[test]
fn jump_to_recovery_cuts_leverage_then_recovers() {
    let mut cfg = EngineConfig::sane_defaults();
    cfg.thresholds = Thresholds::new(0.03, 0.045, 0.07);
    let now = Utc.with_ymd_and_hms(2026, 2, 16, 15, 0, 0).unwrap();
    let mut st = SystemState::new(&cfg, 10_000 * M, now);

    let decision = begin_tick(&cfg, &mut st, 9_200 * M).unwrap();
    assert_eq!(decision.tier, EscalationTier::Recovery);

    let lev_pos = decision
        .actions
        .iter()
        .position(|a| matches!(a, TierAction::ReduceLeverage { .. }))
        .expect("EMERGENCY action must fire on a jump");
    let rec_pos = decision
        .actions
        .iter()
        .position(|a| *a == TierAction::InvokeRecovery)
        .expect("RECOVERY action must fire");
    assert!(lev_pos < rec_pos, "leverage cut precedes recovery");
    assert!(decision.recovery_due);

    // Caller applies the leverage request, then finishes the tick.
    let target = decision.leverage_target().unwrap();
    let report = finish_tick(&cfg, &mut st, &decision, Some(Ok(target)), now);

    assert_eq!(st.last_requested_leverage, Some(10));
    assert!(st.conservation_mode);
    assert!(report.recovery.is_some());
    assert_eq!(st.recovery_activations, 1);

    let categories: Vec<AlertCategory> = report.alerts.iter().map(|a| a.category).collect();
    let crit = categories
        .iter()
        .position(|c| *c == AlertCategory::Critical)
        .unwrap();
    let rec = categories
        .iter()
        .position(|c| *c == AlertCategory::Recovery)
        .unwrap();
    assert!(crit < rec, "EMERGENCY alert drafted before RECOVERY alert");
}

#[test]
fn rejected_leverage_request_is_alerted_and_recovery_still_runs() {
    let cfg = EngineConfig::sane_defaults();
    let now = Utc.with_ymd_and_hms(2026, 2, 16, 15, 0, 0).unwrap();
    let mut st = SystemState::new(&cfg, 10_000 * M, now);

    let decision = begin_tick(&cfg, &mut st, 9_200 * M).unwrap();
    let err = ExternalActionError::Rejected {
        action: "set_max_leverage",
        reason: "venue refused".to_string(),
    };
    let report = finish_tick(&cfg, &mut st, &decision, Some(Err(err.clone())), now);

    assert_eq!(report.leverage_error, Some(err));
    assert_eq!(st.last_requested_leverage, None);
    assert!(report.recovery.is_some(), "engine continues after a rejection");
    assert!(report
        .alerts
        .iter()
        .any(|a| a.category == AlertCategory::Critical && a.message.contains("not applied")));
}
