use std::fs;

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Merged configuration plus its identity.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Lowercase hex SHA-256 of `canonical_json`.
    pub config_hash: String,
    /// Compact JSON, keys sorted at every depth.
    pub canonical_json: String,
    pub config_json: Value,
}

/// Read and merge YAML files in order.
pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let docs = paths
        .iter()
        .map(|p| fs::read_to_string(p).with_context(|| format!("read config layer {p}")))
        .collect::<Result<Vec<String>>>()?;
    let refs: Vec<&str> = docs.iter().map(String::as_str).collect();
    load_layered_yaml_from_strings(&refs)
}

/// Merge in-memory YAML documents in order. No documents yields `{}`.
pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = Value::Object(Map::new());
    for (i, raw) in yaml_docs.iter().enumerate() {
        let layer: serde_yaml::Value =
            serde_yaml::from_str(raw).with_context(|| format!("config layer {i}: invalid yaml"))?;
        // Empty document: nothing to override.
        if layer.is_null() {
            continue;
        }
        let layer = serde_json::to_value(layer)
            .with_context(|| format!("config layer {i}: not representable as json"))?;
        overlay(&mut merged, layer);
    }

    let canonical_json =
        serde_json::to_string(&sorted(&merged)).context("serialize canonical config")?;
    let config_hash = hex::encode(Sha256::digest(canonical_json.as_bytes()));
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

/// Objects merge key by key; any other value replaces what was there.
fn overlay(base: &mut Value, top: Value) {
    match (base, top) {
        (Value::Object(base_map), Value::Object(top_map)) => {
            for (k, v) in top_map {
                match base_map.get_mut(&k) {
                    Some(slot) => overlay(slot, v),
                    None => {
                        base_map.insert(k, v);
                    }
                }
            }
        }
        (slot, other) => *slot = other,
    }
}

fn sorted(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), sorted(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn overlay_merges_objects_and_replaces_scalars() {
        let mut base = json!({"thresholds": {"critical": 0.03, "emergency": 0.045}, "x": [1, 2]});
        overlay(&mut base, json!({"thresholds": {"emergency": 0.05}, "x": [3]}));
        assert_eq!(
            base,
            json!({"thresholds": {"critical": 0.03, "emergency": 0.05}, "x": [3]})
        );
    }

    #[test]
    fn no_layers_is_empty_object() {
        let loaded = load_layered_yaml_from_strings(&[]).unwrap();
        assert_eq!(loaded.canonical_json, "{}");
        assert_eq!(loaded.config_json, json!({}));
    }

    #[test]
    fn bad_yaml_names_the_layer() {
        let err = load_layered_yaml_from_strings(&["a: 1", "b: [unclosed"]).unwrap_err();
        assert!(format!("{err:#}").contains("config layer 1"));
    }
}
