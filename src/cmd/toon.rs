/*!
toon.rs - compact token-oriented encoding of JSON values.

A pure `encode(&Value) -> String` used by the "toon" output format.
Shape rules:
  - objects: one `key: value` line per field, nested objects indent by 2
  - arrays of primitives: `key[N]: a,b,c`
  - arrays of uniform flat objects: `key[N]{f1,f2}:` header + one
    comma-joined row per element
  - other arrays: `key[N]:` + one `- element` line per entry
  - strings stay bare unless they need quoting (delimiters, leading or
    trailing space, empty, or text that would read as a number/bool/null)

The encoding is for terminal reading, not round-tripping; `format_result`
owns the JSON path for machine consumers.
*/

use serde_json::{Map, Value};

/// Encode a JSON value in the compact token-oriented form.
pub fn encode(value: &Value) -> String {
    let mut out = String::new();
    match value {
        Value::Object(map) => encode_object(map, 0, &mut out),
        Value::Array(items) => encode_array_block(None, items, 0, &mut out),
        scalar => out.push_str(&scalar_token(scalar)),
    }
    while out.ends_with('\n') {
        out.pop();
    }
    out
}

fn indent(depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn encode_object(map: &Map<String, Value>, depth: usize, out: &mut String) {
    for (key, val) in map {
        match val {
            Value::Object(inner) => {
                indent(depth, out);
                out.push_str(&format!("{}:\n", key_token(key)));
                encode_object(inner, depth + 1, out);
            }
            Value::Array(items) => encode_array_block(Some(key), items, depth, out),
            scalar => {
                indent(depth, out);
                out.push_str(&format!("{}: {}\n", key_token(key), scalar_token(scalar)));
            }
        }
    }
}

fn encode_array_block(key: Option<&str>, items: &[Value], depth: usize, out: &mut String) {
    let header = |suffix: &str, out: &mut String| {
        indent(depth, out);
        match key {
            Some(k) => out.push_str(&format!("{}[{}]{}:\n", key_token(k), items.len(), suffix)),
            None => out.push_str(&format!("[{}]{}:\n", items.len(), suffix)),
        }
    };

    if items.iter().all(is_primitive) {
        indent(depth, out);
        let joined = items
            .iter()
            .map(scalar_token)
            .collect::<Vec<_>>()
            .join(",");
        match key {
            Some(k) => out.push_str(&format!("{}[{}]: {}\n", key_token(k), items.len(), joined)),
            None => out.push_str(&format!("[{}]: {}\n", items.len(), joined)),
        }
        return;
    }

    if let Some(fields) = uniform_fields(items) {
        header(&format!("{{{}}}", fields.join(",")), out);
        for item in items {
            let obj = item.as_object().expect("uniform_fields guarantees objects");
            indent(depth + 1, out);
            let row = fields
                .iter()
                .map(|f| scalar_token(&obj[*f]))
                .collect::<Vec<_>>()
                .join(",");
            out.push_str(&row);
            out.push('\n');
        }
        return;
    }

    header("", out);
    for item in items {
        match item {
            Value::Object(inner) => {
                indent(depth + 1, out);
                out.push_str("-\n");
                encode_object(inner, depth + 2, out);
            }
            Value::Array(inner) => {
                indent(depth + 1, out);
                out.push_str("-\n");
                encode_array_block(None, inner, depth + 2, out);
            }
            scalar => {
                indent(depth + 1, out);
                out.push_str(&format!("- {}\n", scalar_token(scalar)));
            }
        }
    }
}

fn is_primitive(v: &Value) -> bool {
    !matches!(v, Value::Object(_) | Value::Array(_))
}

/// All elements are flat objects over the identical key set, in order.
fn uniform_fields(items: &[Value]) -> Option<Vec<&str>> {
    let first = items.first()?.as_object()?;
    if first.is_empty() || !first.values().all(is_primitive) {
        return None;
    }
    let fields: Vec<&str> = first.keys().map(String::as_str).collect();
    for item in items.iter().skip(1) {
        let obj = item.as_object()?;
        if obj.len() != fields.len() || !obj.values().all(is_primitive) {
            return None;
        }
        if !fields.iter().all(|f| obj.contains_key(*f)) {
            return None;
        }
    }
    Some(fields)
}

fn key_token(key: &str) -> String {
    if needs_quoting(key) {
        quoted(key)
    } else {
        key.to_string()
    }
}

fn scalar_token(v: &Value) -> String {
    match v {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => {
            if needs_quoting(s) || looks_like_literal(s) {
                quoted(s)
            } else {
                s.clone()
            }
        }
        // Callers only hand primitives here.
        other => other.to_string(),
    }
}

fn needs_quoting(s: &str) -> bool {
    s.is_empty()
        || s.starts_with(' ')
        || s.ends_with(' ')
        || s.chars()
            .any(|c| matches!(c, ',' | ':' | '"' | '[' | ']' | '{' | '}' | '\n' | '\r' | '\t'))
}

/// Bare text that would parse back as a different type must be quoted.
fn looks_like_literal(s: &str) -> bool {
    matches!(s, "true" | "false" | "null") || s.parse::<f64>().is_ok()
}

fn quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
