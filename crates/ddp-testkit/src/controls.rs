use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use anyhow::bail;
use async_trait::async_trait;
use ddp_daemon::{DrawdownMonitor, EngineSnapshot, LeverageController, SnapshotSink};
use ddp_risk::ExternalActionError;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|p| p.into_inner())
}

// ---------------------------------------------------------------------------
// Leverage controller
// ---------------------------------------------------------------------------

/// One recorded `set_max_leverage` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeverageCall {
    pub value: u32,
    /// Recovery activations visible on the observed monitor when the call
    /// arrived; `None` when no monitor is observed.
    pub recovery_activations_at_call: Option<u32>,
}

/// Records every request; optionally rejects them.
pub struct RecordingLeverageController {
    calls: Mutex<Vec<LeverageCall>>,
    reject: AtomicBool,
    observed: Mutex<Option<DrawdownMonitor>>,
}

impl Default for RecordingLeverageController {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingLeverageController {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            reject: AtomicBool::new(false),
            observed: Mutex::new(None),
        }
    }

    /// Snapshot `monitor`'s state on every call. Forms an `Arc` cycle with the
    /// monitor; test use only.
    pub fn observe(&self, monitor: &DrawdownMonitor) {
        *lock(&self.observed) = Some(monitor.clone());
    }

    pub fn set_reject(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<LeverageCall> {
        lock(&self.calls).clone()
    }

    pub fn values(&self) -> Vec<u32> {
        lock(&self.calls).iter().map(|c| c.value).collect()
    }
}

#[async_trait]
impl LeverageController for RecordingLeverageController {
    async fn set_max_leverage(&self, value: u32) -> Result<(), ExternalActionError> {
        let observed = lock(&self.observed).clone();
        let recovery_activations_at_call = observed.map(|m| m.state().recovery_activations);
        lock(&self.calls).push(LeverageCall {
            value,
            recovery_activations_at_call,
        });

        if self.reject.load(Ordering::SeqCst) {
            return Err(ExternalActionError::Rejected {
                action: "set_max_leverage",
                reason: "scripted rejection".to_string(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Snapshot sink
// ---------------------------------------------------------------------------

/// Keeps every snapshot in memory; can be told to fail.
pub struct MemorySnapshotSink {
    snapshots: Mutex<Vec<EngineSnapshot>>,
    fail: AtomicBool,
}

impl Default for MemorySnapshotSink {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySnapshotSink {
    pub fn new() -> Self {
        Self {
            snapshots: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn snapshots(&self) -> Vec<EngineSnapshot> {
        lock(&self.snapshots).clone()
    }
}

#[async_trait]
impl SnapshotSink for MemorySnapshotSink {
    async fn write(&self, snapshot: &EngineSnapshot) -> anyhow::Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            bail!("scripted sink failure");
        }
        lock(&self.snapshots).push(snapshot.clone());
        Ok(())
    }
}
