//! Extraction of `variable` blocks from a converted document.

use crate::err;
use crate::error::Result;
use crate::model::{json_kind, TerraformVariable};
use serde_json::{Map, Value};

/// Build every variable declared in `document`.
///
/// Accepts both shapes converters produce for labelled blocks:
/// `{"variable": {"name": {...}}}` and `{"variable": {"name": [{...}]}}`,
/// as well as a list of such maps. Each entry is built independently so
/// one malformed block does not hide the others.
///
/// A section that has neither shape comes back as an `Err` entry named
/// `variable` (or `variable[i]` for an item of a list), so the caller can
/// report it like any other malformed block.
#[must_use]
pub fn extract_variables(document: &Value) -> Vec<(String, Result<TerraformVariable>)> {
    let Some(blocks) = document.get("variable") else {
        return Vec::new();
    };

    let mut out = Vec::new();
    match blocks {
        Value::Object(map) => collect(map, &mut out),
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                match item {
                    Value::Object(map) => collect(map, &mut out),
                    other => out.push(malformed_section(format!("variable[{i}]"), other)),
                }
            }
        }
        other => out.push(malformed_section("variable".to_string(), other)),
    }
    out
}

fn malformed_section(name: String, value: &Value) -> (String, Result<TerraformVariable>) {
    tracing::debug!(section = %name, kind = json_kind(value), "Malformed variable section");
    let message = format!("expected a map of variable blocks, found {}", json_kind(value));
    let error = err!(VariableDefinition {
        name: name.clone(),
        message,
    });
    (name, Err(error))
}

fn collect(map: &Map<String, Value>, out: &mut Vec<(String, Result<TerraformVariable>)>) {
    for (name, body) in map {
        let body = match body {
            // Repeated bodies for one label: the last one is what Terraform sees
            Value::Array(items) => items.last().unwrap_or(&Value::Null),
            other => other,
        };
        out.push((name.clone(), TerraformVariable::from_raw(name, body)));
    }
}
