//! Parsing of `--op` arguments for the `imaginary` binary.
//!
//! Syntax: `name` or `name:key=value,key=value`.
//!
//! ```text
//! resize:width=800,height=600
//! convert:type=webp
//! blur:sigma=1.5,minampl=0.2
//! flip:width=100,height=100
//! ```
//!
//! Values that read as JSON scalars (`800`, `1.5`, `true`, `"800"`) keep that
//! type; everything else is sent as a string. A value containing a comma must
//! be double-quoted: `watermark:text="Hello, world"`. The operation name must be one
//! of the known kinds. Parameters are passed through unchecked.

use crate::operation::{Operation, OperationKind, UnknownOperation};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum OperationArgError {
    #[error(transparent)]
    UnknownOperation(#[from] UnknownOperation),
    #[error("expected key=value, got '{0}'")]
    MalformedParam(String),
    #[error("duplicate parameter '{0}'")]
    DuplicateParam(String),
}

/// Parse one `--op` argument.
pub fn parse_operation(arg: &str) -> Result<Operation, OperationArgError> {
    let (name, rest) = match arg.split_once(':') {
        Some((name, rest)) => (name.trim(), Some(rest)),
        None => (arg.trim(), None),
    };
    let kind: OperationKind = name.parse()?;

    let mut params = Map::new();
    for pair in rest.into_iter().flat_map(split_params) {
        if pair.trim().is_empty() {
            continue;
        }
        let (key, raw) = pair
            .split_once('=')
            .map(|(k, v)| (k.trim(), v.trim()))
            .filter(|(k, _)| !k.is_empty())
            .ok_or_else(|| OperationArgError::MalformedParam(pair.to_string()))?;
        if params.contains_key(key) {
            return Err(OperationArgError::DuplicateParam(key.to_string()));
        }
        params.insert(key.to_string(), parse_value(raw));
    }

    Ok(Operation::new(kind.as_str(), params))
}

/// Split on commas that sit outside double quotes.
fn split_params(rest: &str) -> Vec<&str> {
    let mut pairs = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    let mut escaped = false;
    for (i, c) in rest.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if quoted => escaped = true,
            '"' => quoted = !quoted,
            ',' if !quoted => {
                pairs.push(&rest[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    pairs.push(&rest[start..]);
    pairs
}

/// Interpret a raw parameter value.
pub fn parse_value(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(v @ (Value::Number(_) | Value::Bool(_) | Value::String(_))) => v,
        _ => Value::String(raw.to_string()),
    }
}
