//! ddp-audit
//!
//! Append-only snapshot log. One JSON document per line, keys sorted.
//! Optional hash chain: every record carries `hash_prev` + `hash_self`, so a
//! later edit to any line is detectable with [`verify_hash_chain`].

mod record;
mod verify;
mod writer;

pub use record::{compute_record_hash, SnapshotRecord};
pub use verify::{verify_hash_chain, verify_hash_chain_str, VerifyResult};
pub use writer::SnapshotLog;
