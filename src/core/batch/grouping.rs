//! Partition grouping
//!
//! Splits an input collection into groups keyed by a caller-supplied
//! partition-key function. Every item lands in exactly one group; groups keep
//! input order and are returned in order of each key's first appearance.

use super::types::PartitionGroup;
use crate::core::store::PartitionKey;
use crate::utils::error::{BatchError, Result};
use std::collections::HashMap;
use std::fmt::Display;

/// Group items with an infallible key function
pub fn group_by_partition<T, K, F>(
    items: impl IntoIterator<Item = T>,
    key_fn: F,
) -> Vec<PartitionGroup<T>>
where
    K: Into<PartitionKey>,
    F: Fn(&T) -> K,
{
    let mut groups: Vec<PartitionGroup<T>> = Vec::new();
    let mut positions: HashMap<PartitionKey, usize> = HashMap::new();

    for item in items {
        let key = key_fn(&item).into();
        push_item(&mut groups, &mut positions, key, item);
    }

    groups
}

/// Group items with a fallible key function
///
/// The first extraction error aborts grouping; no partial result is returned.
pub fn try_group_by_partition<T, K, E, F>(
    items: impl IntoIterator<Item = T>,
    key_fn: F,
) -> Result<Vec<PartitionGroup<T>>>
where
    K: Into<PartitionKey>,
    E: Display,
    F: Fn(&T) -> std::result::Result<K, E>,
{
    let mut groups: Vec<PartitionGroup<T>> = Vec::new();
    let mut positions: HashMap<PartitionKey, usize> = HashMap::new();

    for (index, item) in items.into_iter().enumerate() {
        let key = key_fn(&item)
            .map_err(|e| BatchError::partition_key(index, e.to_string()))?
            .into();
        push_item(&mut groups, &mut positions, key, item);
    }

    Ok(groups)
}

fn push_item<T>(
    groups: &mut Vec<PartitionGroup<T>>,
    positions: &mut HashMap<PartitionKey, usize>,
    key: PartitionKey,
    item: T,
) {
    let position = match positions.get(&key) {
        Some(position) => *position,
        None => {
            positions.insert(key.clone(), groups.len());
            groups.push(PartitionGroup::new(key));
            groups.len() - 1
        }
    };
    groups[position].items.push(item);
}
