//! Scenario: Momentum Evolution, Threshold Drift And Reset
//!
//! # Invariants under test
//!
//! 1. A deep drawdown pushes momentum over the trigger; the evolution tick
//!    raises the level and moves critical / emergency within bounds while the
//!    recovery threshold stays put.
//! 2. The evolution event and alert carry the momentum trigger.
//! 3. `reset` restores original thresholds, fresh state and an empty ledger,
//!    while keeping counters.
//! 4. With evolution disabled the tick reports `Disabled` and changes nothing.
//! 5. Low momentum decays resilience toward baseline without evolving.

use ddp_daemon::{EngineEvent, TickResult};
use ddp_risk::{AlertCategory, EvolutionTrigger};
use ddp_testkit::{manual_config, units, Harness};

#[tokio::test]
async fn deep_drawdown_evolves_then_reset_restores() {
    let h = Harness::new(manual_config(), units(10_000)).unwrap();
    h.provider.push_balance(units(6_000));
    h.monitor.run_monitor_tick().await;
    assert_eq!(h.monitor.state().evolution_level, 2);

    let mut events = h.monitor.subscribe();
    let r = h.monitor.run_evolution_tick().await;
    let TickResult::Evolution(Some(out)) = &r else {
        panic!("expected an evolution, got {r:?}");
    };
    assert_eq!(out.previous_level, 2);
    assert_eq!(out.evolution_level, 3);
    assert!(out.momentum > 0.7);
    assert!(out.thresholds_adjusted);
    assert!((out.thresholds.critical - 0.0312).abs() < 1e-9);
    assert!((out.thresholds.emergency - 0.0468).abs() < 1e-9);
    assert_eq!(out.thresholds.recovery, 0.07);

    let active = h.monitor.config().thresholds;
    assert_eq!(active, out.thresholds);

    match events.try_recv().unwrap() {
        EngineEvent::EvolutionComplete {
            trigger, momentum, ..
        } => {
            assert_eq!(trigger, EvolutionTrigger::Momentum);
            assert_eq!(momentum, Some(out.momentum));
        }
        other => panic!("unexpected event {other:?}"),
    }
    let evolutions = h.monitor.recent_alerts(AlertCategory::Evolution, 10);
    assert_eq!(evolutions.len(), 2, "one from recovery, one from momentum");
    assert!(evolutions[1].message.starts_with("evolved to level 3"));

    let report = h.monitor.evolution_report();
    assert_eq!(report.evolution_level, 3);
    assert_eq!(report.original_thresholds.critical, 0.03);
    assert_eq!(report.recent_recoveries.len(), 1);

    h.monitor.reset();
    let st = h.monitor.state();
    assert_eq!(st.evolution_level, 1);
    assert_eq!(st.recovery_activations, 0);
    assert_eq!(st.current_drawdown, 0.0);
    assert_eq!(st.peak_balance_micros, units(10_000));
    assert_eq!(h.monitor.config().thresholds, manual_config().thresholds);
    assert!(h.monitor.recent_alerts(AlertCategory::Evolution, 10).is_empty());
    assert_eq!(h.monitor.system_report().metrics.evolution_ticks, 1);
}

#[tokio::test]
async fn low_momentum_only_decays() {
    let h = Harness::new(manual_config(), units(10_000)).unwrap();
    // Recovery + evolve lifts resilience above baseline.
    h.provider.push_balances(&[units(9_200), units(10_000)]);
    h.monitor.run_monitor_tick().await;
    h.monitor.run_monitor_tick().await;
    let lifted = h.monitor.state().resilience_score;
    assert!(lifted > 0.85);

    // Momentum: time ~0, drawdown 0, one activation * 0.1 * resilience < 0.7.
    let r = h.monitor.run_evolution_tick().await;
    assert_eq!(r, TickResult::Evolution(None));
    let decayed = h.monitor.state().resilience_score;
    assert!(decayed < lifted);
    assert!(decayed > 0.85);
    assert_eq!(h.monitor.state().evolution_level, 2);
}

#[tokio::test]
async fn disabled_evolution_changes_nothing() {
    let mut cfg = manual_config();
    cfg.features.evolution = false;
    let h = Harness::new(cfg, units(10_000)).unwrap();
    let before = h.monitor.state();

    assert_eq!(h.monitor.run_evolution_tick().await, TickResult::Disabled);
    assert_eq!(h.monitor.state(), before);
    assert_eq!(h.monitor.system_report().metrics.evolution_ticks, 0);
}
