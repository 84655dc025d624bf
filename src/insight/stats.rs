//! Frequency and average helpers
//!
//! All functions are pure and make no assumption about the order of their
//! input beyond the tie-breaking rules documented on each.

use crate::model::{FieldValue, NormalizedRecord};
use std::collections::HashMap;
use std::hash::Hash;

/// Most frequent value
///
/// Ties go to the value that reached the winning count first in input order,
/// so `[B, A, B, A]` yields `B`.
pub fn mode<T, I>(values: I) -> Option<T>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    let mut counts: HashMap<T, usize> = HashMap::new();
    let mut best: Option<(T, usize)> = None;

    for value in values {
        let count = counts.entry(value.clone()).or_insert(0);
        *count += 1;
        let count = *count;

        let replace = match &best {
            Some((_, best_count)) => count > *best_count,
            None => true,
        };
        if replace {
            best = Some((value, count));
        }
    }

    best.map(|(value, _)| value)
}

/// Up to `n` most frequent values with their counts
///
/// Sorted by count descending; equal counts keep first-seen order.
pub fn top_n<T, I>(values: I, n: usize) -> Vec<(T, usize)>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    let mut order: Vec<T> = Vec::new();
    let mut counts: HashMap<T, usize> = HashMap::new();

    for value in values {
        let count = counts.entry(value.clone()).or_insert(0);
        if *count == 0 {
            order.push(value);
        }
        *count += 1;
    }

    let mut ranked: Vec<(T, usize)> = order
        .into_iter()
        .map(|value| {
            let count = counts.get(&value).copied().unwrap_or(0);
            (value, count)
        })
        .collect();

    // sort_by is stable, so first-seen order survives among ties
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(n);
    ranked
}

/// Mean over the values that are present
///
/// Missing values are excluded from the denominator. Returns `None` when
/// nothing is present.
pub fn average<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let (sum, count) = values
        .into_iter()
        .flatten()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));

    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Number of distinct values
pub fn unique_count<T, I>(values: I) -> usize
where
    T: Eq + Hash,
    I: IntoIterator<Item = T>,
{
    values
        .into_iter()
        .collect::<std::collections::HashSet<_>>()
        .len()
}

/// Categorical values of a field across records
///
/// List fields contribute each element; records without the field are skipped.
pub fn categorical(records: &[NormalizedRecord], field: &str) -> Vec<String> {
    let mut values = Vec::new();
    for record in records {
        match record.get(field) {
            Some(FieldValue::List(items)) => values.extend(items.iter().cloned()),
            Some(FieldValue::Text(s)) => values.push(s.clone()),
            Some(FieldValue::Integer(n)) => values.push(n.to_string()),
            Some(FieldValue::Bool(b)) => values.push(b.to_string()),
            _ => {}
        }
    }
    values
}

/// Numeric values of a field, `None` where the field is missing or non-numeric
pub fn numeric(records: &[NormalizedRecord], field: &str) -> Vec<Option<f64>> {
    records.iter().map(|r| r.number(field)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Outcome;

    #[test]
    fn test_mode_tie_goes_to_first_to_reach_max() {
        assert_eq!(mode(vec!["B", "A", "B", "A"]), Some("B"));
        assert_eq!(mode(vec!["A", "B", "B"]), Some("B"));
        assert_eq!(mode(Vec::<&str>::new()), None);
    }

    #[test]
    fn test_top_n_bounds_and_ties() {
        let values = vec!["rust", "go", "rust", "zig", "go", "c"];
        let top = top_n(values, 3);
        assert_eq!(top, vec![("rust", 2), ("go", 2), ("zig", 1)]);

        let top = top_n(vec!["a"], 5);
        assert_eq!(top.len(), 1);
        assert!(top.iter().all(|(_, count)| *count > 0));

        assert!(top_n(Vec::<&str>::new(), 5).is_empty());
    }

    #[test]
    fn test_average_excludes_missing_values() {
        assert_eq!(average(vec![Some(10.0), Some(20.0), None]), Some(15.0));
        assert_eq!(average(vec![None, None]), None);
        assert_eq!(average(Vec::new()), None);
    }

    #[test]
    fn test_unique_count() {
        assert_eq!(unique_count(vec!["a", "b", "a"]), 2);
        assert_eq!(unique_count(Vec::<&str>::new()), 0);
    }

    #[test]
    fn test_categorical_flattens_lists() {
        let records = vec![
            NormalizedRecord::data("Twitter", Outcome::Present)
                .with("hashtags", vec!["rust".to_string(), "tokio".to_string()]),
            NormalizedRecord::data("Twitter", Outcome::Present),
            NormalizedRecord::data("Twitter", Outcome::Present)
                .with("hashtags", vec!["rust".to_string()]),
        ];
        assert_eq!(
            categorical(&records, "hashtags"),
            vec!["rust", "tokio", "rust"]
        );
    }

    #[test]
    fn test_numeric_marks_missing() {
        let records = vec![
            NormalizedRecord::data("Reddit", Outcome::Present).with("score", 10i64),
            NormalizedRecord::data("Reddit", Outcome::Present).with("score", "n/a"),
        ];
        assert_eq!(numeric(&records, "score"), vec![Some(10.0), None]);
    }
}
