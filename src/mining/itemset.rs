//! Itemset value type and sorted-slice set algebra
//!
//! Itemsets are kept as sorted item vectors so equality and hashing are
//! deterministic, and subset tests run in linear time over the two slices.

use crate::transactions::ItemId;
use serde::{Deserialize, Serialize};

/// A frequent itemset with its observed support
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Itemset {
    /// Sorted item ids
    items: Vec<ItemId>,
    /// Number of transactions containing the itemset
    pub count: u64,
    /// Fraction of transactions containing the itemset, in [0, 1]
    pub support: f64,
}

impl Itemset {
    /// Build from already-sorted items and counts.
    /// `total` is the total transaction count used for normalization.
    pub fn new(items: Vec<ItemId>, count: u64, total: u64) -> Self {
        debug_assert!(items.windows(2).all(|w| w[0] < w[1]));
        let support = if total == 0 {
            0.0
        } else {
            count as f64 / total as f64
        };
        Self {
            items,
            count,
            support,
        }
    }

    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_items(self) -> Vec<ItemId> {
        self.items
    }
}

/// True if sorted slice `sub` is a subset of sorted slice `sup`
pub fn is_sorted_subset(sub: &[ItemId], sup: &[ItemId]) -> bool {
    let mut rest = sup;
    for &item in sub {
        match rest.binary_search(&item) {
            Ok(pos) => rest = &rest[pos + 1..],
            Err(_) => return false,
        }
    }
    true
}

/// All subsets of `items` obtained by dropping exactly one element,
/// i.e. the (k-1)-subsets of a k-itemset
pub fn subsets_dropping_one(items: &[ItemId]) -> impl Iterator<Item = Vec<ItemId>> + '_ {
    (0..items.len()).map(move |skip| {
        items
            .iter()
            .enumerate()
            .filter(move |(i, _)| *i != skip)
            .map(|(_, &item)| item)
            .collect()
    })
}

/// Apriori join: merge two sorted k-itemsets sharing their first k-1 items
/// into a (k+1)-candidate. Returns `None` when the prefixes differ or the
/// pair is not in canonical (last-item ascending) order.
pub fn join_on_prefix(a: &[ItemId], b: &[ItemId]) -> Option<Vec<ItemId>> {
    debug_assert_eq!(a.len(), b.len());
    let k = a.len();
    if k == 0 || a[..k - 1] != b[..k - 1] || a[k - 1] >= b[k - 1] {
        return None;
    }
    let mut joined = a.to_vec();
    joined.push(b[k - 1]);
    Some(joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_support_fraction() {
        let set = Itemset::new(vec![1, 2], 2, 5);
        assert!((set.support - 0.4).abs() < 1e-12);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_zero_total_support() {
        let set = Itemset::new(vec![1], 0, 0);
        assert_eq!(set.support, 0.0);
    }

    #[test]
    fn test_is_sorted_subset() {
        assert!(is_sorted_subset(&[2, 5], &[1, 2, 3, 5]));
        assert!(is_sorted_subset(&[], &[1]));
        assert!(!is_sorted_subset(&[2, 4], &[1, 2, 3, 5]));
        assert!(!is_sorted_subset(&[1, 2], &[2]));
    }

    #[test]
    fn test_subsets_dropping_one() {
        let subs: Vec<Vec<ItemId>> = subsets_dropping_one(&[1, 2, 3]).collect();
        assert_eq!(subs, vec![vec![2, 3], vec![1, 3], vec![1, 2]]);
    }

    #[test]
    fn test_join_on_prefix() {
        assert_eq!(join_on_prefix(&[1, 2], &[1, 3]), Some(vec![1, 2, 3]));
        assert_eq!(join_on_prefix(&[1, 2], &[2, 3]), None);
        // canonical order only: the reverse pair does not join
        assert_eq!(join_on_prefix(&[1, 3], &[1, 2]), None);
        assert_eq!(join_on_prefix(&[1], &[4]), Some(vec![1, 4]));
    }
}
