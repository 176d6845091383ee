use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::record::{compute_record_hash, derive_record_id, SnapshotRecord};

/// Append-only JSONL snapshot writer.
///
/// The file is opened in append mode once and every record is flushed as a
/// single `line + '\n'` write.
pub struct SnapshotLog {
    path: PathBuf,
    file: File,
    hash_chain: bool,
    last_hash: Option<String>,
    seq: u64,
}

impl SnapshotLog {
    /// Start a log at `path`, creating parent directories. Existing content
    /// is kept but not read; use [`SnapshotLog::resume`] to continue a chain.
    pub fn new(path: impl AsRef<Path>, hash_chain: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("create snapshot dir {}", dir.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("open snapshot log {}", path.display()))?;
        Ok(Self {
            path,
            file,
            hash_chain,
            last_hash: None,
            seq: 0,
        })
    }

    /// Continue an existing log: the sequence is the number of records already
    /// present and the chain resumes from the last record's `hash_self`.
    pub fn resume(path: impl AsRef<Path>, hash_chain: bool) -> Result<Self> {
        let path = path.as_ref();
        let existing = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                return Err(e).with_context(|| format!("read snapshot log {}", path.display()))
            }
        };

        let mut records = existing.lines().filter(|l| !l.trim().is_empty());
        let last_line = records.next_back();
        let seq = records.count() as u64 + u64::from(last_line.is_some());

        let mut log = Self::new(path, hash_chain)?;
        log.seq = seq;
        if let Some(line) = last_line {
            let last: SnapshotRecord = serde_json::from_str(line.trim())
                .with_context(|| format!("parse last record of {}", path.display()))?;
            log.last_hash = last.hash_self;
        }
        Ok(log)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `hash_self` of the most recent record, if chained.
    pub fn last_hash(&self) -> Option<String> {
        self.last_hash.clone()
    }

    /// Records written to this file so far, including resumed ones.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Append one record and return it as written.
    pub fn append(&mut self, session_id: Uuid, kind: &str, payload: Value) -> Result<SnapshotRecord> {
        let record_id = derive_record_id(self.last_hash.as_deref(), &payload, self.seq)?;
        let mut rec = SnapshotRecord {
            record_id,
            session_id,
            ts_utc: Utc::now(),
            kind: kind.to_string(),
            payload,
            hash_prev: None,
            hash_self: None,
        };
        if self.hash_chain {
            rec.hash_prev = self.last_hash.clone();
            rec.hash_self = Some(compute_record_hash(&rec)?);
        }

        let mut line = rec.to_line()?;
        line.push('\n');
        self.file
            .write_all(line.as_bytes())
            .with_context(|| format!("append to snapshot log {}", self.path.display()))?;
        self.file.flush().context("flush snapshot log")?;

        self.seq += 1;
        if self.hash_chain {
            self.last_hash = rec.hash_self.clone();
        }
        Ok(rec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unchained_records_carry_no_hashes() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = SnapshotLog::new(dir.path().join("plain.jsonl"), false).unwrap();
        let rec = log.append(Uuid::new_v4(), "engine_snapshot", json!({})).unwrap();
        assert!(rec.hash_prev.is_none() && rec.hash_self.is_none());
        assert_eq!(log.seq(), 1);
        assert!(log.last_hash().is_none());
    }

    #[test]
    fn resume_of_missing_file_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let log = SnapshotLog::resume(dir.path().join("a").join("b.jsonl"), true).unwrap();
        assert_eq!(log.seq(), 0);
        assert!(log.path().exists());
    }
}
