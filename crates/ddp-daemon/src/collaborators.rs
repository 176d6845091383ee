//! Collaborator boundary: the account provider the sampler pulls from, the
//! leverage controller the engine requests risk reduction from, and the
//! optional snapshot sink.
//!
//! All traits are object-safe and `Send + Sync` so the monitor can hold
//! `Arc<dyn ..>` handles across task boundaries.

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ddp_audit::SnapshotLog;
use ddp_risk::{ExternalActionError, ProviderError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineSnapshot;

// ---------------------------------------------------------------------------
// Account snapshot
// ---------------------------------------------------------------------------

/// One open position as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    /// Signed quantity; negative is short.
    pub qty: i64,
    pub avg_price_micros: i64,
}

/// Balance + positions at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub captured_at_utc: DateTime<Utc>,
    pub total_balance_micros: i64,
    pub positions: Vec<Position>,
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Balance/position provider. Called once per monitoring tick under a timeout.
#[async_trait]
pub trait AccountProvider: Send + Sync {
    /// Human-readable name for logs (e.g. `"csv-replay"`).
    fn name(&self) -> &'static str;

    async fn get_account_snapshot(&self) -> Result<AccountSnapshot, ProviderError>;

    /// Release any held handles. Called once from `shutdown()`.
    async fn close(&self) {}
}

/// Leverage controller. The engine only requests; it never verifies.
#[async_trait]
pub trait LeverageController: Send + Sync {
    async fn set_max_leverage(&self, value: u32) -> Result<(), ExternalActionError>;
}

/// Storage for periodic engine snapshots.
#[async_trait]
pub trait SnapshotSink: Send + Sync {
    async fn write(&self, snapshot: &EngineSnapshot) -> anyhow::Result<()>;
}

/// Handles the monitor is built with.
#[derive(Clone)]
pub struct Collaborators {
    pub provider: Arc<dyn AccountProvider>,
    pub leverage: Arc<dyn LeverageController>,
    pub snapshot_sink: Option<Arc<dyn SnapshotSink>>,
}

impl Collaborators {
    pub fn new(provider: Arc<dyn AccountProvider>, leverage: Arc<dyn LeverageController>) -> Self {
        Self {
            provider,
            leverage,
            snapshot_sink: None,
        }
    }

    pub fn with_snapshot_sink(mut self, sink: Arc<dyn SnapshotSink>) -> Self {
        self.snapshot_sink = Some(sink);
        self
    }
}

// ---------------------------------------------------------------------------
// JSONL snapshot sink
// ---------------------------------------------------------------------------

/// Snapshot sink backed by a hash-chained JSONL [`SnapshotLog`].
///
/// Appends run on the blocking pool; the log mutex serializes them.
pub struct JsonlSnapshotSink {
    log: Arc<Mutex<SnapshotLog>>,
}

impl JsonlSnapshotSink {
    /// Open (or continue) the log at `path`.
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let log = SnapshotLog::resume(path, true).context("open snapshot log")?;
        Ok(Self {
            log: Arc::new(Mutex::new(log)),
        })
    }
}

#[async_trait]
impl SnapshotSink for JsonlSnapshotSink {
    async fn write(&self, snapshot: &EngineSnapshot) -> anyhow::Result<()> {
        let payload = serde_json::to_value(snapshot).context("serialize engine snapshot")?;
        let session_id: Uuid = snapshot.session_id;
        let log = Arc::clone(&self.log);
        tokio::task::spawn_blocking(move || {
            let mut log = log.lock().unwrap_or_else(|p| p.into_inner());
            log.append(session_id, "engine_snapshot", payload).map(|_| ())
        })
        .await
        .context("snapshot writer task failed")?
        .context("append engine snapshot")?;
        Ok(())
    }
}
