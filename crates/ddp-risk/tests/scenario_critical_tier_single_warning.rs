//! Scenario: a 3% loss from peak lands in CRITICAL and appends exactly one
//! warning alert.
//!
//! peak = 10_000, new balance = 9_700 → drawdown 0.03 → CRITICAL.

use chrono::{TimeZone, Utc};
use ddp_risk::*;

const M: i64 = MICROS_SCALE;

#[test]
fn three_percent_drawdown_is_critical_with_one_warning() {
    let cfg = EngineConfig::sane_defaults();
    let now = Utc.with_ymd_and_hms(2026, 2, 16, 15, 0, 0).unwrap();
    let mut st = SystemState::new(&cfg, 10_000 * M, now);
    let mut ledger = AlertLedger::new(cfg.alert_capacity);

    let decision = begin_tick(&cfg, &mut st, 9_700 * M).expect("valid sample");
    assert_eq!(decision.tier, EscalationTier::Critical);
    assert_eq!(decision.actions, vec![TierAction::TightenSampling]);
    assert!((st.current_drawdown - 0.03).abs() < 1e-12);

    let report = finish_tick(&cfg, &mut st, &decision, None, now);
    for a in report.alerts.clone() {
        ledger.append(a);
    }

    assert_eq!(ledger.len(AlertCategory::Warning), 1);
    assert_eq!(ledger.len(AlertCategory::Critical), 0);
    assert_eq!(ledger.len(AlertCategory::Recovery), 0);
    assert!(st.sampling_tightened);
    assert!(!st.conservation_mode);
}

#[test]
fn return_below_critical_restores_normal() {
    let cfg = EngineConfig::sane_defaults();
    let now = Utc.with_ymd_and_hms(2026, 2, 16, 15, 0, 0).unwrap();
    let mut st = SystemState::new(&cfg, 10_000 * M, now);

    let d = begin_tick(&cfg, &mut st, 9_600 * M).unwrap();
    assert_eq!(d.tier, EscalationTier::Critical);

    let d = begin_tick(&cfg, &mut st, 9_900 * M).unwrap();
    assert_eq!(d.tier, EscalationTier::Normal);
    assert!(d.actions.is_empty());
    assert!(!st.sampling_tightened);
    assert!(
        (st.max_historical_drawdown - 0.04).abs() < 1e-12,
        "max drawdown keeps the worst point"
    );
}
