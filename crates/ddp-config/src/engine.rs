use anyhow::{anyhow, Context, Result};
use ddp_risk::EngineConfig;
use serde_json::Value;

use crate::{load_layered_yaml, LoadedConfig};

/// JSON-pointer prefixes read by [`engine_config_from_json`].
///
/// Keep in sync with the reads below; anything outside shows up in the
/// unused-key report.
pub const CONSUMED_POINTERS: &[&str] = &[
    "/thresholds/critical",
    "/thresholds/emergency",
    "/thresholds/recovery",
    "/recovery/regeneration_factor",
    "/recovery/stress_amplifier",
    "/recovery/evolution_boost_threshold",
    "/resilience/baseline",
    "/resilience/anti_fragility_baseline",
    "/resilience/decay_rate",
    "/resilience/evolution_window_ms",
    "/resilience/momentum_trigger",
    "/resilience/max_threshold_drift",
    "/leverage/max",
    "/leverage/emergency_floor",
    "/leverage/emergency_scale",
    "/timing/monitoring_interval_ms",
    "/timing/evolution_interval_ms",
    "/timing/metrics_interval_ms",
    "/timing/provider_timeout_ms",
    "/alerts/capacity",
    "/features/adaptive_leverage",
    "/features/evolution",
];

/// Build an [`EngineConfig`] from canonical config JSON (produced by
/// [`crate::load_layered_yaml`]).
///
/// Every key is optional and falls back to [`EngineConfig::sane_defaults`].
/// Numbers may be given as YAML numbers or numeric strings. The result is
/// validated; an invalid config is an error (fail fast at startup).
pub fn engine_config_from_json(cfg: &Value) -> Result<EngineConfig> {
    let d = EngineConfig::sane_defaults();

    let mut out = d.clone();
    out.thresholds.critical = read_f64(cfg, "/thresholds/critical", d.thresholds.critical)?;
    out.thresholds.emergency = read_f64(cfg, "/thresholds/emergency", d.thresholds.emergency)?;
    out.thresholds.recovery = read_f64(cfg, "/thresholds/recovery", d.thresholds.recovery)?;

    out.recovery.regeneration_factor = read_f64(
        cfg,
        "/recovery/regeneration_factor",
        d.recovery.regeneration_factor,
    )?;
    out.recovery.stress_amplifier =
        read_f64(cfg, "/recovery/stress_amplifier", d.recovery.stress_amplifier)?;
    out.recovery.evolution_boost_threshold = read_f64(
        cfg,
        "/recovery/evolution_boost_threshold",
        d.recovery.evolution_boost_threshold,
    )?;

    out.resilience.baseline = read_f64(cfg, "/resilience/baseline", d.resilience.baseline)?;
    out.resilience.anti_fragility_baseline = read_f64(
        cfg,
        "/resilience/anti_fragility_baseline",
        d.resilience.anti_fragility_baseline,
    )?;
    out.resilience.decay_rate = read_f64(cfg, "/resilience/decay_rate", d.resilience.decay_rate)?;
    out.resilience.evolution_window_ms = read_u64(
        cfg,
        "/resilience/evolution_window_ms",
        d.resilience.evolution_window_ms,
    )?;
    out.resilience.momentum_trigger = read_f64(
        cfg,
        "/resilience/momentum_trigger",
        d.resilience.momentum_trigger,
    )?;
    out.resilience.max_threshold_drift = read_f64(
        cfg,
        "/resilience/max_threshold_drift",
        d.resilience.max_threshold_drift,
    )?;

    out.leverage.max_leverage = read_u32(cfg, "/leverage/max", d.leverage.max_leverage)?;
    out.leverage.emergency_floor =
        read_u32(cfg, "/leverage/emergency_floor", d.leverage.emergency_floor)?;
    out.leverage.emergency_scale =
        read_f64(cfg, "/leverage/emergency_scale", d.leverage.emergency_scale)?;

    out.timing.monitoring_interval_ms = read_u64(
        cfg,
        "/timing/monitoring_interval_ms",
        d.timing.monitoring_interval_ms,
    )?;
    out.timing.evolution_interval_ms = read_u64(
        cfg,
        "/timing/evolution_interval_ms",
        d.timing.evolution_interval_ms,
    )?;
    out.timing.metrics_interval_ms = read_u64(
        cfg,
        "/timing/metrics_interval_ms",
        d.timing.metrics_interval_ms,
    )?;
    out.timing.provider_timeout_ms = read_u64(
        cfg,
        "/timing/provider_timeout_ms",
        d.timing.provider_timeout_ms,
    )?;

    out.alert_capacity = read_u64(cfg, "/alerts/capacity", d.alert_capacity as u64)? as usize;

    out.features.adaptive_leverage = read_bool(
        cfg,
        "/features/adaptive_leverage",
        d.features.adaptive_leverage,
    )?;
    out.features.evolution = read_bool(cfg, "/features/evolution", d.features.evolution)?;

    out.validate().context("engine config failed validation")?;
    Ok(out)
}

/// Load layered YAML files and extract the validated engine config.
pub fn load_engine_config(paths: &[&str]) -> Result<(LoadedConfig, EngineConfig)> {
    let loaded = load_layered_yaml(paths)?;
    let engine = engine_config_from_json(&loaded.config_json)?;
    Ok((loaded, engine))
}

fn read_f64(cfg: &Value, ptr: &str, default: f64) -> Result<f64> {
    match cfg.pointer(ptr) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| anyhow!("config {ptr} is not representable as f64")),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .with_context(|| format!("config {ptr} must be a number (got '{s}')")),
        Some(other) => Err(anyhow!("config {ptr} must be a number (got {other})")),
    }
}

fn read_u64(cfg: &Value, ptr: &str, default: u64) -> Result<u64> {
    match cfg.pointer(ptr) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Number(n)) => n
            .as_u64()
            .ok_or_else(|| anyhow!("config {ptr} must be a non-negative integer (got {n})")),
        Some(Value::String(s)) => s
            .trim()
            .parse::<u64>()
            .with_context(|| format!("config {ptr} must be a non-negative integer (got '{s}')")),
        Some(other) => Err(anyhow!(
            "config {ptr} must be a non-negative integer (got {other})"
        )),
    }
}

fn read_u32(cfg: &Value, ptr: &str, default: u32) -> Result<u32> {
    let v = read_u64(cfg, ptr, default as u64)?;
    u32::try_from(v).with_context(|| format!("config {ptr} out of range for u32 (got {v})"))
}

fn read_bool(cfg: &Value, ptr: &str, default: bool) -> Result<bool> {
    match cfg.pointer(ptr) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Bool(b)) => Ok(*b),
        Some(other) => Err(anyhow!("config {ptr} must be a bool (got {other})")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_document_yields_defaults() {
        let cfg = engine_config_from_json(&json!({})).unwrap();
        assert_eq!(cfg, EngineConfig::sane_defaults());
    }

    #[test]
    fn numeric_strings_are_accepted() {
        let cfg = engine_config_from_json(&json!({
            "thresholds": { "critical": "0.02" }
        }))
        .unwrap();
        assert_eq!(cfg.thresholds.critical, 0.02);
    }

    #[test]
    fn wrong_type_is_an_error() {
        let err = engine_config_from_json(&json!({ "features": { "evolution": "yes" } }))
            .unwrap_err();
        assert!(format!("{err:#}").contains("/features/evolution"));
    }

    #[test]
    fn negative_interval_is_an_error() {
        assert!(engine_config_from_json(&json!({
            "timing": { "monitoring_interval_ms": -5 }
        }))
        .is_err());
    }
}
