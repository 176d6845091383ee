use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::CONSUMED_POINTERS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnusedKeyPolicy {
    /// Report only; the caller logs the findings.
    Warn,
    /// Refuse to start when anything is unused.
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnusedKeyReport {
    /// Consumed JSON-pointer prefixes checked against (sorted, unique).
    pub consumed_prefixes: Vec<String>,
    /// Leaf pointers outside every consumed prefix (sorted).
    pub unused_leaf_pointers: Vec<String>,
}

impl UnusedKeyReport {
    pub fn is_clean(&self) -> bool {
        self.unused_leaf_pointers.is_empty()
    }
}

/// Compare every leaf of `config_json` against [`CONSUMED_POINTERS`].
///
/// A prefix consumes itself and everything beneath it, matched token by
/// token (`/leverage/max` does not consume `/leverage/maximum`).
pub fn report_unused_keys(config_json: &Value, policy: UnusedKeyPolicy) -> Result<UnusedKeyReport> {
    let mut consumed: Vec<Vec<String>> = CONSUMED_POINTERS.iter().map(|p| tokens(p)).collect();
    consumed.sort();
    consumed.dedup();

    let mut leaves = Vec::new();
    walk_leaves(config_json, &mut Vec::new(), &mut leaves);

    let mut unused: Vec<String> = leaves
        .into_iter()
        .filter(|leaf| !consumed.iter().any(|prefix| leaf.starts_with(prefix)))
        .map(|leaf| render(&leaf))
        .collect();
    unused.sort();
    unused.dedup();

    let report = UnusedKeyReport {
        consumed_prefixes: consumed.iter().map(|t| render(t)).collect(),
        unused_leaf_pointers: unused,
    };

    if policy == UnusedKeyPolicy::Fail && !report.is_clean() {
        let shown: Vec<&str> = report
            .unused_leaf_pointers
            .iter()
            .take(12)
            .map(String::as_str)
            .collect();
        bail!(
            "CONFIG_UNUSED_KEYS: {} config key(s) are not read by the engine: {}",
            report.unused_leaf_pointers.len(),
            shown.join(", ")
        );
    }
    Ok(report)
}

/// Split a JSON pointer into unescaped tokens. `""` and `"/"` are the root.
fn tokens(pointer: &str) -> Vec<String> {
    pointer
        .trim()
        .split('/')
        .filter(|t| !t.is_empty())
        .map(|t| t.replace("~1", "/").replace("~0", "~"))
        .collect()
}

fn render(path: &[String]) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    path.iter()
        .map(|t| format!("/{}", t.replace('~', "~0").replace('/', "~1")))
        .collect()
}

fn walk_leaves(v: &Value, path: &mut Vec<String>, out: &mut Vec<Vec<String>>) {
    match v {
        Value::Object(map) => {
            for (k, child) in map {
                path.push(k.clone());
                walk_leaves(child, path, out);
                path.pop();
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                path.push(i.to_string());
                walk_leaves(child, path, out);
                path.pop();
            }
        }
        _ => out.push(path.clone()),
    }
}
