//! Snapshot log hash chain integrity.
//!
//! GREEN when:
//! - Five hash-chained snapshots verify as valid with 5 lines.
//! - Editing one record's payload is detected at that line (hash_self).
//! - Deleting a record is detected by the following line (hash_prev).
//! - Resuming a log continues the chain instead of restarting it.

use ddp_audit::{verify_hash_chain, SnapshotLog, VerifyResult};
use serde_json::json;
use uuid::Uuid;

fn write_five(path: &std::path::Path) {
    let session = Uuid::new_v4();
    let mut log = SnapshotLog::new(path, true).unwrap();
    for i in 0..5 {
        log.append(
            session,
            "engine_snapshot",
            json!({ "tick": i, "current_drawdown": 0.01 * i as f64 }),
        )
        .unwrap();
    }
    assert_eq!(log.seq(), 5);
}

#[test]
fn untampered_chain_verifies_valid() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snapshots.jsonl");
    write_five(&path);

    assert_eq!(
        verify_hash_chain(&path).unwrap(),
        VerifyResult::Valid { lines: 5 }
    );
}

#[test]
fn tampered_payload_detected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snapshots.jsonl");
    write_five(&path);

    let content = std::fs::read_to_string(&path).unwrap();
    let mut lines: Vec<String> = content.lines().map(str::to_string).collect();
    let mut rec: serde_json::Value = serde_json::from_str(&lines[2]).unwrap();
    rec["payload"]["current_drawdown"] = json!(0.0);
    lines[2] = serde_json::to_string(&rec).unwrap();
    std::fs::write(&path, lines.join("\n") + "\n").unwrap();

    match verify_hash_chain(&path).unwrap() {
        VerifyResult::Broken { line, reason } => {
            assert_eq!(line, 3, "expected break at line 3: {reason}");
            assert!(reason.contains("hash_self mismatch"), "got: {reason}");
        }
        VerifyResult::Valid { lines } => panic!("tampered log verified ({lines} lines)"),
    }
}

#[test]
fn deleted_line_detected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snapshots.jsonl");
    write_five(&path);

    let content = std::fs::read_to_string(&path).unwrap();
    let kept: Vec<&str> = content
        .lines()
        .enumerate()
        .filter(|(i, _)| *i != 2)
        .map(|(_, l)| l)
        .collect();
    std::fs::write(&path, kept.join("\n") + "\n").unwrap();

    match verify_hash_chain(&path).unwrap() {
        VerifyResult::Broken { line, reason } => {
            assert_eq!(line, 3);
            assert!(reason.contains("hash_prev mismatch"), "got: {reason}");
        }
        VerifyResult::Valid { lines } => panic!("log with a gap verified ({lines} lines)"),
    }
}

#[test]
fn resumed_log_extends_the_chain() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("snapshots.jsonl");
    write_five(&path);

    let mut log = SnapshotLog::resume(&path, true).unwrap();
    assert_eq!(log.seq(), 5);
    assert!(log.last_hash().is_some());
    let rec = log
        .append(Uuid::new_v4(), "engine_snapshot", json!({ "tick": 5 }))
        .unwrap();
    assert!(rec.hash_prev.is_some());

    assert_eq!(
        verify_hash_chain(&path).unwrap(),
        VerifyResult::Valid { lines: 6 }
    );
}

#[test]
fn empty_log_is_valid() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.jsonl");
    std::fs::write(&path, "").unwrap();
    assert_eq!(
        verify_hash_chain(&path).unwrap(),
        VerifyResult::Valid { lines: 0 }
    );
}
