//! Lenient readers over raw supplier JSON. Suppliers disagree on field names
//! and send numbers as strings, so each reader takes a list of candidate keys
//! and returns the first usable value.

use serde_json::Value;

pub(crate) fn text(item: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match item.get(*key) {
        Some(Value::String(raw)) if !raw.trim().is_empty() => Some(raw.trim().to_string()),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

pub(crate) fn number(item: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| {
        let parsed = match item.get(*key)? {
            Value::Number(number) => number.as_f64(),
            Value::String(raw) => raw.trim().parse::<f64>().ok(),
            _ => None,
        };
        parsed.filter(|value| value.is_finite() && *value > 0.0)
    })
}

pub(crate) fn count(item: &Value, keys: &[&str]) -> Option<u32> {
    number(item, keys).map(|value| value.round().min(f64::from(u32::MAX)) as u32)
}

pub(crate) fn stock(item: &Value, keys: &[&str]) -> Option<i64> {
    keys.iter().find_map(|key| match item.get(*key)? {
        Value::Number(number) => number.as_f64().map(|value| value.max(0.0).round() as i64),
        Value::String(raw) => raw.trim().parse::<f64>().ok().map(|value| value.max(0.0).round() as i64),
        _ => None,
    })
}

/// String lists given either as arrays or as a single string.
pub(crate) fn list(item: &Value, keys: &[&str]) -> Vec<String> {
    for key in keys {
        match item.get(*key) {
            Some(Value::Array(values)) => {
                let collected: Vec<String> = values
                    .iter()
                    .filter_map(|value| match value {
                        Value::String(raw) if !raw.trim().is_empty() => Some(raw.trim().to_string()),
                        Value::Object(_) => text(value, &["url", "src", "name"]),
                        _ => None,
                    })
                    .collect();
                if !collected.is_empty() {
                    return collected;
                }
            }
            Some(Value::String(raw)) if !raw.trim().is_empty() => {
                return vec![raw.trim().to_string()];
            }
            _ => {}
        }
    }
    Vec::new()
}
