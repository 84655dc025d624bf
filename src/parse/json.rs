//! Path lookups over `serde_json::Value`
//!
//! A path is a list of object keys; numeric segments index into arrays.
//! Missing keys yield `None`, never a panic.

use serde_json::Value;

/// Value at `path`
pub fn at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(*segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

pub fn str_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    at(value, path).and_then(Value::as_str)
}

/// Integer at `path`; floats are truncated
pub fn i64_at(value: &Value, path: &[&str]) -> Option<i64> {
    let v = at(value, path)?;
    v.as_i64().or_else(|| v.as_f64().map(|f| f as i64))
}

pub fn f64_at(value: &Value, path: &[&str]) -> Option<f64> {
    at(value, path).and_then(Value::as_f64)
}

pub fn bool_at(value: &Value, path: &[&str]) -> Option<bool> {
    at(value, path).and_then(Value::as_bool)
}

/// Array items at `path`, empty when missing
pub fn array_at<'a>(value: &'a Value, path: &[&str]) -> &'a [Value] {
    at(value, path)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}
