use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::record::{compute_record_hash, SnapshotRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyResult {
    /// Every record links to its predecessor and hashes to its `hash_self`.
    Valid { lines: usize },
    /// First broken link; `line` is 1-based in the file.
    Broken { line: usize, reason: String },
}

/// Verify the hash chain of a snapshot log file.
pub fn verify_hash_chain(path: impl AsRef<Path>) -> Result<VerifyResult> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("read snapshot log {}", path.display()))?;
    verify_hash_chain_str(&content)
}

/// Same as [`verify_hash_chain`] over in-memory JSONL content. Blank lines
/// are skipped but still count toward line numbers.
pub fn verify_hash_chain_str(content: &str) -> Result<VerifyResult> {
    let mut expected_prev: Option<String> = None;
    let mut records = 0usize;

    for (idx, raw) in content.lines().enumerate() {
        let line = idx + 1;
        if raw.trim().is_empty() {
            continue;
        }
        let rec: SnapshotRecord = serde_json::from_str(raw.trim())
            .with_context(|| format!("snapshot log line {line} is not a record"))?;
        records += 1;

        if rec.hash_prev != expected_prev {
            return Ok(VerifyResult::Broken {
                line,
                reason: format!(
                    "hash_prev mismatch: expected {expected_prev:?}, found {:?}",
                    rec.hash_prev
                ),
            });
        }
        if let Some(claimed) = rec.hash_self.as_deref() {
            let actual = compute_record_hash(&rec)?;
            if claimed != actual {
                return Ok(VerifyResult::Broken {
                    line,
                    reason: format!("hash_self mismatch: stored {claimed}, computed {actual}"),
                });
            }
        }
        expected_prev = rec.hash_self;
    }

    Ok(VerifyResult::Valid { lines: records })
}
