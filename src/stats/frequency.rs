use std::collections::HashMap;
use std::hash::Hash;

use serde::Serialize;

use crate::error::{StatResult, StatsError};

/// The most frequent value and how often it occurred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Modal<T> {
    pub value: T,
    pub count: usize,
}

impl<T> Modal<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Modal<U> {
        Modal {
            value: f(self.value),
            count: self.count,
        }
    }
}

/// Count occurrences of each distinct value.
///
/// Ordered by descending count; equal counts keep first-seen order.
pub fn value_counts<T, I>(values: I) -> Vec<(T, usize)>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    let mut slots: HashMap<T, usize> = HashMap::new();
    let mut counts: Vec<(T, usize)> = Vec::new();
    for value in values {
        match slots.get(&value) {
            Some(&slot) => counts[slot].1 += 1,
            None => {
                slots.insert(value.clone(), counts.len());
                counts.push((value, 1));
            }
        }
    }
    // stable: ties stay in first-seen order
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Most frequent value; ties go to the value seen first.
pub fn mode<T, I>(values: I) -> StatResult<Modal<T>>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    value_counts(values)
        .into_iter()
        .next()
        .map(|(value, count)| Modal { value, count })
        .ok_or(StatsError::EmptyDataset)
}
