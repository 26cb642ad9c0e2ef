use std::io::IsTerminal;

use clap::ValueEnum;
use packwire_codec::{builtin, Entry, HeteroMap, Value};
use serde::Serialize;
use serde_json::json;

/// Longest buffer shown in full by the human-readable formats.
const PREVIEW_BYTES: usize = 32;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

pub fn print_json<T: Serialize>(out: &T) {
    println!(
        "{}",
        serde_json::to_string(out).unwrap_or_else(|_| "{}".to_string())
    );
}

/// Display name for a wire type id.
pub fn type_name(id: i32) -> String {
    match builtin::name(id) {
        Some(name) => name.to_string(),
        None => format!("custom:{id}"),
    }
}

/// JSON view of a heteromap: one object per entry, wire order.
pub fn hetero_json(map: &HeteroMap) -> serde_json::Value {
    serde_json::Value::Array(map.iter().map(entry_json).collect())
}

fn entry_json(entry: &Entry) -> serde_json::Value {
    json!({
        "key_type": entry.key_packer.tag(),
        "key": value_json(&entry.key),
        "value_type": entry.value_packer.tag(),
        "value": value_json(&entry.value),
    })
}

pub fn value_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Int8(v) => json!(v),
        Value::Bool(v) => json!(v),
        Value::Int16(v) => json!(v),
        Value::Int32(v) => json!(v),
        Value::Int64(v) => json!(v),
        Value::Float(v) => serde_json::Number::from_f64(*v)
            .map(serde_json::Value::Number)
            .unwrap_or_else(|| json!(v.to_string())),
        Value::Buffer(bytes) => json!(hex::encode(bytes)),
        Value::Date(dt) => json!(dt.to_rfc3339()),
        Value::LocalDate(dt) => json!(dt.to_string()),
        Value::Str(text) => json!(text),
        Value::List(items) => serde_json::Value::Array(items.iter().map(value_json).collect()),
        Value::Map(pairs) => serde_json::Value::Array(
            pairs
                .iter()
                .map(|(key, val)| json!([value_json(key), value_json(val)]))
                .collect(),
        ),
        Value::HeteroMap(map) => hetero_json(map),
        Value::Object(_) => json!("<object>"),
    }
}

/// One-line rendering used by the table and pretty formats.
pub fn value_preview(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Int8(v) => v.to_string(),
        Value::Bool(v) => v.to_string(),
        Value::Int16(v) => v.to_string(),
        Value::Int32(v) => v.to_string(),
        Value::Int64(v) => v.to_string(),
        Value::Float(v) => v.to_string(),
        Value::Buffer(bytes) if bytes.len() > PREVIEW_BYTES => {
            let head = hex::encode(&bytes[..PREVIEW_BYTES]);
            format!("0x{head}… ({} bytes)", bytes.len())
        }
        Value::Buffer(bytes) => format!("0x{}", hex::encode(bytes)),
        Value::Date(dt) => dt.to_rfc3339(),
        Value::LocalDate(dt) => dt.to_string(),
        Value::Str(text) => format!("{text:?}"),
        Value::List(items) => {
            let items: Vec<String> = items.iter().map(value_preview).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Map(pairs) => {
            let pairs: Vec<String> = pairs
                .iter()
                .map(|(key, val)| format!("{}: {}", value_preview(key), value_preview(val)))
                .collect();
            format!("{{{}}}", pairs.join(", "))
        }
        Value::HeteroMap(map) => {
            let pairs: Vec<String> = map
                .iter()
                .map(|entry| {
                    format!(
                        "{}: {}",
                        value_preview(&entry.key),
                        value_preview(&entry.value)
                    )
                })
                .collect();
            format!("{{{}}}", pairs.join(", "))
        }
        Value::Object(_) => "<object>".to_string(),
    }
}

/// Indented tree rendering of a heteromap, nested maps expanded.
pub fn pretty_lines(map: &HeteroMap, depth: usize, lines: &mut Vec<String>) {
    let indent = "  ".repeat(depth + 1);
    for entry in map {
        let key = format!(
            "{} ({})",
            value_preview(&entry.key),
            type_name(entry.key_packer.tag())
        );
        match &entry.value {
            Value::HeteroMap(nested) => {
                lines.push(format!(
                    "{indent}{key} = {} ({} entries)",
                    type_name(entry.value_packer.tag()),
                    nested.len()
                ));
                pretty_lines(nested, depth + 1, lines);
            }
            value => lines.push(format!(
                "{indent}{key} = {} ({})",
                value_preview(value),
                type_name(entry.value_packer.tag())
            )),
        }
    }
}

/// Parse hex text; ASCII whitespace between digits is ignored.
pub fn parse_hex(text: &str) -> Result<Vec<u8>, hex::FromHexError> {
    let digits: Vec<u8> = text
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    hex::decode(digits)
}
