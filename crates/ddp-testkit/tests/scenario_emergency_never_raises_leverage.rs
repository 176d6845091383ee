//! Scenario: EMERGENCY Leverage Cut Versus Adaptive Leverage
//!
//! # Invariants under test
//!
//! 1. Entering EMERGENCY requests the emergency limit (max(10, 20 * 0.5) = 10).
//! 2. While the tier holds, adaptive leverage may lower the limit further.
//! 3. A later monitor tick never raises the limit back to the emergency target.
//! 4. The controller sees a non-increasing sequence of limits.

use ddp_daemon::TickResult;
use ddp_risk::EscalationTier;
use ddp_testkit::{manual_config, units, Harness};

#[tokio::test]
async fn held_emergency_with_adaptive_ticks_only_lowers_leverage() {
    let h = Harness::new(manual_config(), units(10_000)).unwrap();
    h.provider.push_balances(&[units(9_500); 3]);

    for round in 0..3 {
        let r = h.monitor.run_monitor_tick().await;
        assert_eq!(r.tier(), Some(EscalationTier::Emergency), "round {round}");
        if round < 2 {
            let r = h.monitor.run_metrics_tick().await;
            assert!(matches!(r, TickResult::Metrics(_)), "round {round}: {r:?}");
        }
    }

    let values = h.leverage.values();
    assert_eq!(values, vec![10, 9, 8]);
    assert!(
        values.windows(2).all(|w| w[1] <= w[0]),
        "leverage raised during EMERGENCY: {values:?}"
    );
    assert_eq!(h.monitor.state().last_requested_leverage, Some(8));
}

#[tokio::test]
async fn rejected_emergency_cut_is_retried_next_tick() {
    let h = Harness::new(manual_config(), units(10_000)).unwrap();
    h.leverage.set_reject(true);
    h.provider.push_balances(&[units(9_500); 3]);

    h.monitor.run_monitor_tick().await;
    assert_eq!(h.monitor.state().last_requested_leverage, None);

    h.leverage.set_reject(false);
    h.monitor.run_monitor_tick().await;
    h.monitor.run_monitor_tick().await;

    assert_eq!(h.leverage.values(), vec![10, 10]);
    assert_eq!(h.monitor.state().last_requested_leverage, Some(10));
}
