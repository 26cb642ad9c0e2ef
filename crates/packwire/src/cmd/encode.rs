use std::io::Write;
use std::sync::Arc;

use packwire_codec::{builtin, HeteroMap, HeteroMapPacker, Packer, PackerRef, TypeRegistry, Value};
use serde_json::{Map, Number};
use tracing::debug;

use crate::cmd::EncodeArgs;
use crate::exit::{io_error, pack_error, CliError, CliResult, SUCCESS, USAGE};

pub fn run(args: EncodeArgs) -> CliResult<i32> {
    let json: serde_json::Value = serde_json::from_str(&args.json)
        .map_err(|err| CliError::new(USAGE, format!("--json is not valid JSON: {err}")))?;
    let serde_json::Value::Object(object) = json else {
        return Err(CliError::new(USAGE, "--json must be a JSON object"));
    };

    let packer = HeteroMapPacker::new(Arc::new(TypeRegistry::new()));
    let nested: PackerRef = Arc::new(packer.clone());
    let map = object_to_map(&object, &nested, "")?;

    let mut wire = Vec::new();
    packer
        .pack(&map, &mut wire)
        .map_err(|err| pack_error("encode failed", err))?;
    debug!(entries = map.len(), bytes = wire.len(), "encoded heteromap");

    if args.hex {
        println!("{}", hex::encode(&wire));
    } else {
        let mut out = std::io::stdout().lock();
        out.write_all(&wire)
            .and_then(|()| out.flush())
            .map_err(|err| io_error("write failed", err))?;
    }
    Ok(SUCCESS)
}

/// Build a heteromap from a JSON object. Keys travel as `str`; nested
/// objects become nested heteromaps tagged with `nested`.
pub(crate) fn object_to_map(
    object: &Map<String, serde_json::Value>,
    nested: &PackerRef,
    path: &str,
) -> CliResult<HeteroMap> {
    let mut map = HeteroMap::with_capacity(object.len());
    for (key, json) in object {
        let path = if path.is_empty() {
            key.clone()
        } else {
            format!("{path}.{key}")
        };
        let (value, packer) = json_entry(json, nested, &path)?;
        map.insert(key.as_str(), builtin::string(), value, packer);
    }
    Ok(map)
}

fn json_entry(
    json: &serde_json::Value,
    nested: &PackerRef,
    path: &str,
) -> CliResult<(Value, PackerRef)> {
    match json {
        // int32 encodes null as zero
        serde_json::Value::Null => Ok((Value::Null, builtin::int32())),
        serde_json::Value::Bool(flag) => Ok((Value::Bool(*flag), builtin::boolean())),
        serde_json::Value::Number(number) => number_entry(number, path),
        serde_json::Value::String(text) => Ok((Value::from(text.as_str()), builtin::string())),
        serde_json::Value::Array(items) => array_entry(items, path),
        serde_json::Value::Object(object) => {
            let map = object_to_map(object, nested, path)?;
            Ok((Value::HeteroMap(map), Arc::clone(nested)))
        }
    }
}

fn number_entry(number: &Number, path: &str) -> CliResult<(Value, PackerRef)> {
    if let Some(wide) = number.as_i64() {
        return Ok(match i32::try_from(wide) {
            Ok(narrow) => (Value::Int32(narrow), builtin::int32()),
            Err(_) => (Value::Int64(wide), builtin::int64()),
        });
    }
    if number.is_u64() {
        return Err(CliError::new(
            USAGE,
            format!("`{path}`: integer {number} does not fit int64"),
        ));
    }
    match number.as_f64() {
        Some(float) => Ok((Value::Float(float), builtin::float())),
        None => Err(CliError::new(USAGE, format!("`{path}`: unsupported number {number}"))),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ElementKind {
    Int32,
    Int64,
    Float,
    Bool,
    Str,
}

impl ElementKind {
    fn of(json: &serde_json::Value) -> Option<Self> {
        match json {
            serde_json::Value::Bool(_) => Some(Self::Bool),
            serde_json::Value::String(_) => Some(Self::Str),
            serde_json::Value::Number(number) => match number.as_i64() {
                Some(wide) if i32::try_from(wide).is_ok() => Some(Self::Int32),
                Some(_) => Some(Self::Int64),
                None if number.is_f64() => Some(Self::Float),
                None => None,
            },
            _ => None,
        }
    }

    /// The narrowest kind holding both, if the two can share a list.
    fn join(self, other: Self) -> Option<Self> {
        use ElementKind::*;
        match (self, other) {
            (a, b) if a == b => Some(a),
            (Int32, Int64) | (Int64, Int32) => Some(Int64),
            (Int32 | Int64, Float) | (Float, Int32 | Int64) => Some(Float),
            _ => None,
        }
    }
}

fn array_entry(items: &[serde_json::Value], path: &str) -> CliResult<(Value, PackerRef)> {
    let mut kind = ElementKind::Int32;
    for (index, item) in items.iter().enumerate() {
        let item_kind = ElementKind::of(item).ok_or_else(|| {
            CliError::new(
                USAGE,
                format!("`{path}[{index}]`: arrays may only hold numbers, bools or strings"),
            )
        })?;
        kind = if index == 0 {
            item_kind
        } else {
            kind.join(item_kind).ok_or_else(|| {
                CliError::new(USAGE, format!("`{path}`: array mixes element types"))
            })?
        };
    }

    let values = items
        .iter()
        .map(|item| match (kind, item) {
            (ElementKind::Int32, serde_json::Value::Number(n)) => {
                Value::Int32(n.as_i64().and_then(|v| i32::try_from(v).ok()).unwrap_or_default())
            }
            (ElementKind::Int64, serde_json::Value::Number(n)) => {
                Value::Int64(n.as_i64().unwrap_or_default())
            }
            (ElementKind::Float, serde_json::Value::Number(n)) => {
                Value::Float(n.as_f64().unwrap_or_default())
            }
            (_, serde_json::Value::Bool(flag)) => Value::Bool(*flag),
            (_, serde_json::Value::String(text)) => Value::from(text.as_str()),
            _ => Value::Null,
        })
        .collect();

    let packer = match kind {
        ElementKind::Int32 => builtin::list_of_int32(),
        ElementKind::Int64 => builtin::list_of_int64(),
        ElementKind::Float => builtin::list_of_float(),
        ElementKind::Bool => builtin::list_of_bool(),
        ElementKind::Str => builtin::list_of_str(),
    };
    Ok((Value::List(values), packer))
}
