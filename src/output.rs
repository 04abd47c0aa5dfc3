//! CLI output formatting.
//!
//! ## Info
//!
//! ```text
//! channels: 3
//! hasAlpha: false
//! height: 50
//! type: jpeg
//! width: 100
//! ```
//!
//! Keys are sorted so output is stable whatever order the service used.
//!
//! ## Pipeline
//!
//! ```text
//! 001 resize width=800 height=600
//! 002 convert type=webp
//! → out.webp (10423 bytes)
//! ```

use crate::operation::Operation;
use serde_json::{Map, Value};
use std::path::Path;

/// Render a scalar without JSON quoting; nested values stay JSON.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// One `key: value` line per info field, sorted by key.
pub fn format_info(info: &Map<String, Value>) -> Vec<String> {
    let mut keys: Vec<&String> = info.keys().collect();
    keys.sort();
    keys.into_iter()
        .map(|key| format!("{}: {}", key, display_value(&info[key])))
        .collect()
}

/// `NNN name key=value ...` for one operation.
pub fn operation_line(index: usize, op: &Operation) -> String {
    let mut line = format!("{:03} {}", index + 1, op.name);
    for (key, value) in &op.params {
        line.push_str(&format!(" {}={}", key, display_value(value)));
    }
    line
}

/// Operation list followed by where the result went.
pub fn format_pipeline(ops: &[Operation], dest: &Path, bytes: u64) -> Vec<String> {
    let mut lines: Vec<String> = ops
        .iter()
        .enumerate()
        .map(|(i, op)| operation_line(i, op))
        .collect();
    if ops.is_empty() {
        lines.push("(no operations)".to_string());
    }
    lines.push(format!("→ {} ({} bytes)", dest.display(), bytes));
    lines
}

pub fn print_info(info: &Map<String, Value>) {
    for line in format_info(info) {
        println!("{}", line);
    }
}

pub fn print_pipeline(ops: &[Operation], dest: &Path, bytes: u64) {
    for line in format_pipeline(ops, dest, bytes) {
        println!("{}", line);
    }
}
