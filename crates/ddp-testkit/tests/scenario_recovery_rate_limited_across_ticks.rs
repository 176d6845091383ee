//! Scenario: Recovery Protocol Rate Limiting Through The Monitor
//!
//! # Invariants under test
//!
//! 1. Five consecutive ticks at a 0.08 drawdown activate recovery exactly once.
//! 2. The EMERGENCY leverage cut is requested once; held ticks leave the
//!    accepted limit alone.
//! 3. A dip below the emergency threshold re-arms; the next breach activates again.
//! 4. One recovery alert per actual activation, none for disarmed ticks.

use ddp_risk::{AlertCategory, EscalationTier};
use ddp_testkit::{manual_config, units, Harness};

#[tokio::test]
async fn sustained_breach_activates_once_until_rearmed() {
    let h = Harness::new(manual_config(), units(10_000)).unwrap();
    h.provider.push_balances(&[units(9_200); 5]);

    for i in 0..5 {
        let r = h.monitor.run_monitor_tick().await;
        let report = r.monitor_report().expect("tick completed");
        assert_eq!(report.tier, EscalationTier::Recovery);
        assert_eq!(report.recovery.is_some(), i == 0, "tick {i}");
        assert_eq!(report.recovery_suppressed, i != 0, "tick {i}");
    }
    assert_eq!(h.monitor.state().recovery_activations, 1);
    assert_eq!(h.leverage.values(), vec![10]);
    assert_eq!(h.monitor.recent_alerts(AlertCategory::Recovery, 50).len(), 1);

    // 0.03 < 0.045 re-arms; the next breach activates again.
    h.provider.push_balances(&[units(9_700), units(9_200)]);
    h.monitor.run_monitor_tick().await;
    assert!(h.monitor.state().recovery_armed);
    let r = h.monitor.run_monitor_tick().await;
    assert!(r.monitor_report().and_then(|rep| rep.recovery.as_ref()).is_some());

    assert_eq!(h.monitor.state().recovery_activations, 2);
    assert_eq!(h.monitor.recent_alerts(AlertCategory::Recovery, 50).len(), 2);
}

#[tokio::test]
async fn emergency_band_does_not_rearm() {
    let h = Harness::new(manual_config(), units(10_000)).unwrap();
    // 0.08 -> 0.05 (still >= emergency) -> 0.08
    h.provider
        .push_balances(&[units(9_200), units(9_500), units(9_200)]);
    for _ in 0..3 {
        h.monitor.run_monitor_tick().await;
    }
    assert_eq!(h.monitor.state().recovery_activations, 1);
}
