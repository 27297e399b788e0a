//! JSON decoding helpers shared by the JSON lanes.

use std::collections::VecDeque;

use serde_json::{Map, Value};

use crate::games::fold_key;

/// Limits for walking an untrusted JSON tree.
#[derive(Debug, Clone, Copy)]
pub struct WalkLimits {
    pub max_depth: usize,
    pub max_nodes: usize,
}

/// Decode a capture body as JSON.
///
/// Markup bodies are refused (that is the embedded-recovery lane's job).
/// Anything before the first bracket (XSSI guards, `while(1);`, preambles)
/// is skipped, and trailing bytes after the first complete value are ignored.
pub fn parse_body(text: &str) -> Option<Value> {
    let trimmed = text.trim_start_matches('\u{feff}').trim_start();
    if trimmed.starts_with('<') {
        return None;
    }
    let start = trimmed.find(['{', '['])?;
    first_value(&trimmed[start..])
}

/// Parse the first complete JSON value at the start of `text`.
pub fn first_value(text: &str) -> Option<Value> {
    let mut stream = serde_json::Deserializer::from_str(text).into_iter::<Value>();
    match stream.next() {
        Some(Ok(value)) if value.is_object() || value.is_array() => Some(value),
        _ => None,
    }
}

/// Unwrap one level of an ASMX `{"d": ...}` envelope.
///
/// A string payload is parsed as JSON; a non-string payload is returned as-is.
/// Values that are not envelopes come back unchanged.
pub fn unwrap_asmx(value: Value) -> Value {
    let Value::Object(mut map) = value else {
        return value;
    };
    if map.len() != 1 || !map.contains_key("d") {
        return Value::Object(map);
    }
    match map.remove("d") {
        Some(Value::String(inner)) => match serde_json::from_str::<Value>(&inner) {
            Ok(parsed) => parsed,
            Err(_) => Value::Object(Map::from_iter([("d".to_string(), Value::String(inner))])),
        },
        Some(other) => other,
        None => Value::Object(map),
    }
}

/// Every object node in `root`, visited breadth-first with an explicit worklist.
///
/// Stops descending past `max_depth` and stops visiting after `max_nodes`
/// values, so hostile payloads cost bounded work.
pub fn objects(root: &Value, limits: WalkLimits) -> Vec<&Map<String, Value>> {
    let mut out = Vec::new();
    let mut queue = VecDeque::from([(root, 0usize)]);
    let mut visited = 0usize;

    while let Some((value, depth)) = queue.pop_front() {
        visited += 1;
        if visited > limits.max_nodes {
            tracing::debug!(max_nodes = limits.max_nodes, "JSON walk hit node cap");
            break;
        }
        match value {
            Value::Object(map) => {
                out.push(map);
                if depth < limits.max_depth {
                    queue.extend(map.values().map(|child| (child, depth + 1)));
                }
            }
            Value::Array(items) if depth < limits.max_depth => {
                queue.extend(items.iter().map(|child| (child, depth + 1)));
            }
            _ => {}
        }
    }

    out
}

/// Find the first field whose folded key is one of `synonyms`, in synonym order.
///
/// Null and empty-string values do not count as present.
pub fn field<'a>(map: &'a Map<String, Value>, synonyms: &[&str]) -> Option<(&'a str, &'a Value)> {
    synonyms.iter().find_map(|syn| {
        map.iter()
            .find(|(k, v)| fold_key(k) == *syn && is_present(v))
            .map(|(k, v)| (k.as_str(), v))
    })
}

/// Find the first field whose folded key contains `needle`.
pub fn field_containing<'a>(
    map: &'a Map<String, Value>,
    needle: &str,
) -> Option<(&'a str, &'a Value)> {
    map.iter()
        .find(|(k, v)| fold_key(k).contains(needle) && is_present(v))
        .map(|(k, v)| (k.as_str(), v))
}

/// Render a scalar JSON value as plain text (strings unquoted).
pub fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}
