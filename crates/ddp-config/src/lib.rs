//! ddp-config
//!
//! Layered YAML configuration for the drawdown protection engine.
//!
//! - Documents merge in order: earlier docs are base, later docs override.
//! - The merged document is canonicalized to compact JSON and hashed (SHA-256)
//!   so every persisted snapshot can name the exact config it ran under.
//! - [`engine_config_from_json`] extracts a validated [`ddp_risk::EngineConfig`];
//!   validation failure is fatal at startup.
//! - [`report_unused_keys`] lists config leaves no consumer reads.

mod engine;
mod layered;
mod unused;

pub use engine::{engine_config_from_json, load_engine_config, CONSUMED_POINTERS};
pub use layered::{load_layered_yaml, load_layered_yaml_from_strings, LoadedConfig};
pub use unused::{report_unused_keys, UnusedKeyPolicy, UnusedKeyReport};
