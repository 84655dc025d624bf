//! Insight derivation over normalized records
//!
//! Insights are summary values computed from a tool's records. A key is only
//! ever written when it was derived from at least one real value; callers
//! treat a missing key as "no data".

mod stats;

pub use stats::{average, categorical, mode, numeric, top_n, unique_count};

use serde::Serialize;
use std::collections::BTreeMap;

/// A derived insight value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InsightValue {
    Count(u64),
    Number(f64),
    Text(String),
    List(Vec<String>),
    Integers(Vec<i64>),
}

impl InsightValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(x) => Some(*x),
            Self::Count(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

/// Collects insights, dropping any that have no backing data
#[derive(Debug, Default)]
pub struct InsightBuilder {
    values: BTreeMap<String, InsightValue>,
}

impl InsightBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the most frequent value
    pub fn mode<I>(mut self, key: &str, values: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        if let Some(value) = mode(values) {
            self.values.insert(key.to_string(), InsightValue::Text(value));
        }
        self
    }

    /// Records the `n` most frequent values (without counts)
    pub fn top_n<I>(mut self, key: &str, values: I, n: usize) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let top: Vec<String> = top_n(values, n).into_iter().map(|(v, _)| v).collect();
        if !top.is_empty() {
            self.values.insert(key.to_string(), InsightValue::List(top));
        }
        self
    }

    /// Records the `n` most frequent integers, e.g. hours of day
    pub fn top_n_integers<I>(mut self, key: &str, values: I, n: usize) -> Self
    where
        I: IntoIterator<Item = i64>,
    {
        let top: Vec<i64> = top_n(values, n).into_iter().map(|(v, _)| v).collect();
        if !top.is_empty() {
            self.values.insert(key.to_string(), InsightValue::Integers(top));
        }
        self
    }

    /// Records the mean, rounded to two decimals
    pub fn average<I>(mut self, key: &str, values: I) -> Self
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        if let Some(avg) = average(values) {
            let rounded = (avg * 100.0).round() / 100.0;
            self.values
                .insert(key.to_string(), InsightValue::Number(rounded));
        }
        self
    }

    /// Records the number of distinct values
    pub fn unique_count<I>(mut self, key: &str, values: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let count = unique_count(values);
        if count > 0 {
            self.values
                .insert(key.to_string(), InsightValue::Count(count as u64));
        }
        self
    }

    /// Records a plain count
    pub fn count(mut self, key: &str, count: usize) -> Self {
        if count > 0 {
            self.values
                .insert(key.to_string(), InsightValue::Count(count as u64));
        }
        self
    }

    /// Records an already derived value
    pub fn value(mut self, key: &str, value: Option<InsightValue>) -> Self {
        if let Some(value) = value {
            self.values.insert(key.to_string(), value);
        }
        self
    }

    pub fn build(self) -> BTreeMap<String, InsightValue> {
        self.values
    }
}
