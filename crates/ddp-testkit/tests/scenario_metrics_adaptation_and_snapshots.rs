//! Scenario: Metrics Tick, Adaptive Leverage And Snapshots
//!
//! # Invariants under test
//!
//! 1. The metrics tick smooths anti-fragility toward its blend.
//! 2. Adaptive leverage is requested only when the recommendation changes;
//!    an accepted change is published as a system adaptation event.
//! 3. A rejected adaptive request raises a critical alert and is retried on
//!    the next tick.
//! 4. Every metrics tick hands one snapshot to the sink; a sink failure is a
//!    warning alert, never a tick failure.
//! 5. The JSONL sink produces a verifiable hash chain that survives reopening.
//! 6. Reports expose tier, thresholds, counters and per-category alerts.

use std::sync::Arc;

use ddp_audit::{verify_hash_chain, VerifyResult};
use ddp_daemon::{Collaborators, DrawdownMonitor, EngineEvent, JsonlSnapshotSink, TickResult};
use ddp_risk::{AlertCategory, EscalationTier};
use ddp_testkit::{
    manual_config, units, Harness, RecordingLeverageController, ScriptedAccountProvider,
};

#[tokio::test]
async fn first_metrics_tick_adapts_leverage_once() {
    let h = Harness::new(manual_config(), units(10_000)).unwrap();
    let mut events = h.monitor.subscribe();

    let r = h.monitor.run_metrics_tick().await;
    let TickResult::Metrics(out) = &r else {
        panic!("expected metrics outcome, got {r:?}");
    };
    // 0.5 * 0.7 + (0.85 * 0.3) * 0.3
    assert!((out.anti_fragility_index - 0.4265).abs() < 1e-12);
    assert_eq!(out.recommended_leverage, Some(14));
    assert!(out.leverage_requested);
    assert!(out.leverage_error.is_none());
    assert!(out.snapshot_written);

    assert_eq!(h.leverage.values(), vec![14]);
    match events.try_recv().unwrap() {
        EngineEvent::SystemAdaptation {
            recommended_leverage,
            previous_leverage,
            ..
        } => {
            assert_eq!(recommended_leverage, 14);
            assert_eq!(previous_leverage, None);
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert_eq!(h.monitor.state().last_requested_leverage, Some(14));

    // Same recommendation: no second request, snapshot still written.
    let r = h.monitor.run_metrics_tick().await;
    let TickResult::Metrics(out) = &r else {
        panic!("expected metrics outcome, got {r:?}");
    };
    assert_eq!(out.recommended_leverage, Some(14));
    assert!(!out.leverage_requested);
    assert_eq!(h.leverage.values(), vec![14]);
    assert_eq!(h.sink.snapshots().len(), 2);
    assert_eq!(h.monitor.system_report().metrics.metrics_ticks, 2);
}

#[tokio::test]
async fn rejected_adaptive_request_is_retried() {
    let h = Harness::new(manual_config(), units(10_000)).unwrap();
    h.leverage.set_reject(true);

    let r = h.monitor.run_metrics_tick().await;
    let TickResult::Metrics(out) = &r else {
        panic!("expected metrics outcome, got {r:?}");
    };
    assert!(out.leverage_error.is_some());
    assert_eq!(h.monitor.state().last_requested_leverage, None);
    let critical = h.monitor.recent_alerts(AlertCategory::Critical, 10);
    assert_eq!(critical.len(), 1);
    assert!(critical[0].message.starts_with("adaptive leverage not applied"));

    h.leverage.set_reject(false);
    h.monitor.run_metrics_tick().await;
    assert_eq!(h.leverage.calls().len(), 2);
    assert!(h.monitor.state().last_requested_leverage.is_some());
}

#[tokio::test]
async fn adaptive_leverage_disabled_requests_nothing() {
    let mut cfg = manual_config();
    cfg.features.adaptive_leverage = false;
    let h = Harness::new(cfg, units(10_000)).unwrap();

    let r = h.monitor.run_metrics_tick().await;
    let TickResult::Metrics(out) = &r else {
        panic!("expected metrics outcome, got {r:?}");
    };
    assert_eq!(out.recommended_leverage, None);
    assert!(!out.leverage_requested);
    assert!(h.leverage.calls().is_empty());
}

#[tokio::test]
async fn sink_failure_is_a_warning() {
    let h = Harness::new(manual_config(), units(10_000)).unwrap();
    h.sink.set_fail(true);

    let r = h.monitor.run_metrics_tick().await;
    let TickResult::Metrics(out) = &r else {
        panic!("expected metrics outcome, got {r:?}");
    };
    assert!(!out.snapshot_written);
    assert_eq!(h.monitor.system_report().metrics.snapshot_failures, 1);
    let warnings = h.monitor.recent_alerts(AlertCategory::Warning, 10);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains("scripted sink failure"));
}

#[tokio::test]
async fn jsonl_sink_chain_verifies_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snapshots").join("engine.jsonl");

    for _ in 0..2 {
        let provider = Arc::new(ScriptedAccountProvider::new(units(10_000)));
        let leverage = Arc::new(RecordingLeverageController::new());
        let sink = Arc::new(JsonlSnapshotSink::open(&path).unwrap());
        let collab = Collaborators::new(provider, leverage).with_snapshot_sink(sink);
        let monitor = DrawdownMonitor::new(manual_config(), units(10_000), collab).unwrap();

        monitor.run_metrics_tick().await;
        monitor.run_metrics_tick().await;
        monitor.shutdown().await.unwrap();
    }

    // Two sessions, three records each: two metrics ticks plus the final snapshot.
    assert_eq!(
        verify_hash_chain(&path).unwrap(),
        VerifyResult::Valid { lines: 6 }
    );

    let text = std::fs::read_to_string(&path).unwrap();
    let first: serde_json::Value = serde_json::from_str(text.lines().next().unwrap()).unwrap();
    assert_eq!(first["kind"], "engine_snapshot");
    assert!(first["payload"]["system_state"]["peak_balance_micros"].is_i64());
}

#[tokio::test]
async fn system_report_reflects_live_state() {
    let h = Harness::new(manual_config(), units(10_000)).unwrap();
    h.provider.set_positions(3);
    h.provider.push_balance(units(9_500));
    h.monitor.run_monitor_tick().await;

    let report = h.monitor.system_report();
    assert_eq!(report.session_id, h.monitor.session_id());
    assert_eq!(report.tier, EscalationTier::Emergency);
    assert!((report.state.current_drawdown - 0.05).abs() < 1e-12);
    assert_eq!(report.thresholds, report.original_thresholds);
    assert_eq!(report.monitoring_interval_ms, 30_000);
    assert_eq!(report.metrics.monitor_ticks, 1);
    assert_eq!(report.metrics.last_position_count, 3);
    assert_eq!(report.alerts.warning.len(), 1);
    assert_eq!(report.alerts.critical.len(), 1);
    assert!(report.alerts.recovery.is_empty());
    // Conservation mode caps the recommendation at the emergency target.
    assert!(report.recommended_leverage <= 10);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["tier"], "EMERGENCY");
}
