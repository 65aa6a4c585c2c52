use serde_json::Value;
use tracing::debug;

/// Keys that hold the model's prose, in preference order.
const CONTENT_KEYS: [&str; 6] = ["result", "output", "content", "text", "answer", "response"];

/// Shortest bare string value taken as content when no known key matches.
const MIN_CONTENT_LEN: usize = 10;

/// Pull the prose out of an agent response body.
///
/// Known content keys win, then a nested `data` object, then the first
/// long-enough string value. Failing all of those the object is flattened
/// into `key: value` lines.
pub fn json_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .filter(|v| is_truthy(v))
            .map(json_to_text)
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Object(map) => {
            if let Some(found) = CONTENT_KEYS
                .iter()
                .find_map(|k| map.get(*k).filter(|v| is_truthy(v)))
            {
                return json_to_text(found);
            }
            if let Some(data) = map.get("data") {
                return json_to_text(data);
            }
            if let Some(s) = map
                .values()
                .find_map(|v| v.as_str().filter(|s| s.chars().count() > MIN_CONTENT_LEN))
            {
                return s.to_string();
            }
            map.iter()
                .filter(|(_, v)| is_truthy(v))
                .map(|(k, v)| format!("{}: {}", k, json_to_text(v)))
                .collect::<Vec<_>>()
                .join("\n")
        }
    }
}

/// Treat `body` as JSON when it parses as an object or array, otherwise
/// as the prose itself.
pub fn text_from_body(body: &str) -> String {
    let trimmed = body.trim_start();
    if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
        return body.to_string();
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => json_to_text(&value),
        Err(err) => {
            debug!(error = %err, "body is not JSON, using it verbatim");
            body.to_string()
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
