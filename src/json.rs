// JSON bridge
// Literal initializers and field defaults from JSON, and snapshots back to JSON

use crate::error::{ClassyError, ClassyResult};
use crate::runtime::{Array, Dict, Value};
use rustc_hash::FxHashSet;
use serde::Serialize;

/// Parse a JSON document into a value tree
pub fn parse(json: &str) -> ClassyResult<Value> {
    serde_json::from_str::<serde_json::Value>(json)
        .map(|json_value| Value::from(&json_value))
        .map_err(|e| ClassyError::argument_error(format!("invalid JSON: {}", e)))
}

/// Serialize `value`, pretty-printed with `indent` spaces when given
pub fn stringify(value: &Value, indent: Option<usize>) -> ClassyResult<String> {
    let json_value = value.to_json()?;

    match indent {
        Some(indent) => {
            let indent_str = " ".repeat(indent);
            let mut buf = Vec::new();
            let formatter = serde_json::ser::PrettyFormatter::with_indent(indent_str.as_bytes());
            let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
            json_value
                .serialize(&mut ser)
                .map_err(|e| ClassyError::runtime_error(e.to_string()))?;
            String::from_utf8(buf).map_err(|e| ClassyError::runtime_error(e.to_string()))
        }
        None => serde_json::to_string(&json_value).map_err(|e| ClassyError::runtime_error(e.to_string())),
    }
}

impl From<&serde_json::Value> for Value {
    fn from(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::from(s.as_str()),
            serde_json::Value::Array(arr) => {
                Value::Array(Array::from_vec(arr.iter().map(Value::from).collect()))
            }
            serde_json::Value::Object(obj) => {
                Value::Dictionary(obj.iter().map(|(key, value)| (key, Value::from(value))).collect::<Dict>())
            }
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::from(&json)
    }
}

impl Value {
    /// Plain data as JSON. Functions, classes, instances and cyclic
    /// composites have no JSON form; `Undefined` becomes `null`.
    pub fn to_json(&self) -> ClassyResult<serde_json::Value> {
        to_json(self, &mut FxHashSet::default())
    }
}

fn to_json(value: &Value, path: &mut FxHashSet<usize>) -> ClassyResult<serde_json::Value> {
    match value {
        Value::Undefined | Value::Null => Ok(serde_json::Value::Null),
        Value::Boolean(b) => Ok(serde_json::Value::Bool(*b)),
        Value::Number(n) => {
            if n.fract() == 0.0 && n.abs() < 1e15 {
                Ok(serde_json::Value::from(*n as i64))
            } else {
                serde_json::Number::from_f64(*n)
                    .map(serde_json::Value::Number)
                    .ok_or_else(|| ClassyError::type_error("cannot convert number to JSON"))
            }
        }
        Value::String(s) => Ok(serde_json::Value::String(s.to_string())),
        Value::Array(arr) => {
            if !path.insert(arr.addr()) {
                return Err(cyclic());
            }
            let json_arr = arr
                .to_vec()
                .iter()
                .map(|item| to_json(item, path))
                .collect::<ClassyResult<Vec<_>>>()?;
            path.remove(&arr.addr());
            Ok(serde_json::Value::Array(json_arr))
        }
        Value::Dictionary(dict) => {
            if !path.insert(dict.addr()) {
                return Err(cyclic());
            }
            let mut map = serde_json::Map::new();
            for (key, val) in dict.entries() {
                map.insert(key.to_string(), to_json(&val, path)?);
            }
            path.remove(&dict.addr());
            Ok(serde_json::Value::Object(map))
        }
        other => Err(ClassyError::type_error(format!(
            "cannot convert {} to JSON",
            other.type_name()
        ))),
    }
}

fn cyclic() -> ClassyError {
    ClassyError::type_error("cannot convert cyclic value to JSON")
}
