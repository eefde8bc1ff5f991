//! Structured tree formats (JSON and YAML).
//!
//! Nested mappings flatten to dotted keys and sequences to `key[i]`:
//!
//! ```yaml
//! database:
//!   host: db.internal
//!   ports: [5432, 5433]
//! ```
//!
//! becomes `database.host`, `database.ports[0]` and `database.ports[1]`.
//! Scalars become strings and `null` becomes the empty string. Rendering
//! nests on `.` again; every leaf is written as a string.

use serde_json::{Map, Value as JsonValue};
use serde_yaml::Value as YamlValue;

use super::{Format, SecretMapping};
use crate::error::{FormatError, Result};

pub(super) fn parse_json(raw: &str, source: &str) -> Result<SecretMapping> {
    if raw.trim().is_empty() {
        return Ok(SecretMapping::new());
    }
    let value: JsonValue = serde_json::from_str(raw).map_err(|e| FormatError::Malformed {
        source_name: source.to_string(),
        line: e.line(),
        reason: e.to_string(),
    })?;

    let JsonValue::Object(map) = value else {
        return Err(FormatError::Malformed {
            source_name: source.to_string(),
            line: 1,
            reason: "top level must be an object".to_string(),
        }
        .into());
    };

    let mut mapping = SecretMapping::new();
    for (key, value) in map {
        flatten_json(&key, &value, &mut mapping);
    }
    Ok(mapping)
}

fn flatten_json(prefix: &str, value: &JsonValue, out: &mut SecretMapping) {
    match value {
        JsonValue::Object(map) => {
            for (key, nested) in map {
                flatten_json(&format!("{prefix}.{key}"), nested, out);
            }
        }
        JsonValue::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                flatten_json(&format!("{prefix}[{i}]"), item, out);
            }
        }
        JsonValue::String(s) => {
            out.insert(prefix, s.clone());
        }
        JsonValue::Null => {
            out.insert(prefix, "");
        }
        other => {
            out.insert(prefix, other.to_string());
        }
    }
}

pub(super) fn parse_yaml(raw: &str, source: &str) -> Result<SecretMapping> {
    let value: YamlValue = serde_yaml::from_str(raw).map_err(|e| FormatError::Malformed {
        source_name: source.to_string(),
        line: e.location().map(|l| l.line()).unwrap_or(0),
        reason: e.to_string(),
    })?;

    let map = match value {
        YamlValue::Mapping(map) => map,
        YamlValue::Null => return Ok(SecretMapping::new()),
        _ => {
            return Err(FormatError::Malformed {
                source_name: source.to_string(),
                line: 1,
                reason: "top level must be a mapping".to_string(),
            }
            .into())
        }
    };

    let mut mapping = SecretMapping::new();
    for (key, value) in &map {
        if let Some(key) = yaml_scalar(key) {
            flatten_yaml(&key, value, &mut mapping);
        }
    }
    Ok(mapping)
}

fn flatten_yaml(prefix: &str, value: &YamlValue, out: &mut SecretMapping) {
    match value {
        YamlValue::Mapping(map) => {
            for (key, nested) in map {
                if let Some(key) = yaml_scalar(key) {
                    flatten_yaml(&format!("{prefix}.{key}"), nested, out);
                }
            }
        }
        YamlValue::Sequence(items) => {
            for (i, item) in items.iter().enumerate() {
                flatten_yaml(&format!("{prefix}[{i}]"), item, out);
            }
        }
        YamlValue::Null => {
            out.insert(prefix, "");
        }
        // Tagged values have no string form
        YamlValue::Tagged(_) => {}
        scalar => {
            if let Some(s) = yaml_scalar(scalar) {
                out.insert(prefix, s);
            }
        }
    }
}

fn yaml_scalar(value: &YamlValue) -> Option<String> {
    match value {
        YamlValue::String(s) => Some(s.clone()),
        YamlValue::Number(n) => Some(n.to_string()),
        YamlValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Rebuild the nested object described by dotted keys.
fn nest(mapping: &SecretMapping, format: Format) -> Result<Map<String, JsonValue>> {
    let mut root = Map::new();
    for (key, value) in mapping.iter() {
        let segments: Vec<&str> = key.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(FormatError::IllegalValue {
                key: key.to_string(),
                format: format.to_string(),
                reason: "empty key segment".to_string(),
            }
            .into());
        }

        let (leaf, parents) = match segments.split_last() {
            Some(split) => split,
            None => continue,
        };

        let mut node = &mut root;
        for (depth, segment) in parents.iter().enumerate() {
            let entry = node
                .entry(segment.to_string())
                .or_insert_with(|| JsonValue::Object(Map::new()));
            node = match entry {
                JsonValue::Object(map) => map,
                _ => {
                    return Err(FormatError::Conflict(format!(
                        "{} is both a value and a parent of {}",
                        segments[..=depth].join("."),
                        key
                    ))
                    .into())
                }
            };
        }

        if node.contains_key(*leaf) {
            return Err(FormatError::Conflict(format!(
                "{key} is both a value and a parent of nested keys"
            ))
            .into());
        }
        node.insert(leaf.to_string(), JsonValue::String(value.to_string()));
    }
    Ok(root)
}

pub(super) fn render_json(mapping: &SecretMapping) -> Result<String> {
    let tree = nest(mapping, Format::Json)?;
    let mut out = serde_json::to_string_pretty(&JsonValue::Object(tree))?;
    out.push('\n');
    Ok(out)
}

pub(super) fn render_yaml(mapping: &SecretMapping) -> Result<String> {
    let tree = nest(mapping, Format::Yaml)?;
    Ok(serde_yaml::to_string(&JsonValue::Object(tree))?)
}
