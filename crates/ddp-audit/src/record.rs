use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Chain anchor for the first record of a log.
pub(crate) const GENESIS: &str = "GENESIS";

/// One line of the snapshot log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub record_id: Uuid,
    pub session_id: Uuid,
    pub ts_utc: DateTime<Utc>,
    pub kind: String,
    pub payload: Value,
    /// `hash_self` of the previous line; `None` on the first line.
    pub hash_prev: Option<String>,
    pub hash_self: Option<String>,
}

impl SnapshotRecord {
    /// Compact JSON with keys sorted at every depth.
    pub(crate) fn to_line(&self) -> Result<String> {
        encode_canonical(self)
    }
}

/// SHA-256 (hex) over the canonical record with `hash_self` cleared.
pub fn compute_record_hash(rec: &SnapshotRecord) -> Result<String> {
    let unsealed = SnapshotRecord {
        hash_self: None,
        ..rec.clone()
    };
    let line = unsealed.to_line()?;
    Ok(hex::encode(Sha256::digest(line.as_bytes())))
}

/// UUIDv5 over the chain position: previous hash, canonical payload, sequence.
/// Identical inputs give identical ids, so a replayed session reproduces them.
pub(crate) fn derive_record_id(
    last_hash: Option<&str>,
    payload: &Value,
    seq: u64,
) -> Result<Uuid> {
    let body = encode_canonical(payload)?;
    let name = format!("{}|{body}|{seq}", last_hash.unwrap_or(GENESIS));
    Ok(Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()))
}

pub(crate) fn encode_canonical<T: Serialize>(v: &T) -> Result<String> {
    let value = serde_json::to_value(v).context("serialize snapshot record")?;
    serde_json::to_string(&canonical(value)).context("encode snapshot record")
}

fn canonical(v: Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let sorted: Map<String, Value> = entries
                .into_iter()
                .map(|(k, v)| (k, canonical(v)))
                .collect();
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonical).collect()),
        other => other,
    }
}
