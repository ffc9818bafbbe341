//! Level-wise Apriori itemset miner
//!
//! Candidates at level k are joined from frequent (k-1)-itemsets and pruned
//! by anti-monotonicity *before* any support counting: a candidate with an
//! infrequent (k-1)-subset is never scored. Support counting within a level
//! is parallelized with per-shard partial count maps merged in a single
//! reduce, never concurrent increments to shared counters.

use crate::error::{Error, Result};
use crate::recommendation::metrics::PerformanceTimer;
use crate::transactions::{ItemId, Transaction};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use super::itemset::{is_sorted_subset, join_on_prefix, subsets_dropping_one, Itemset};

/// The full set of frequent itemsets from one mining run, with a support
/// lookup table keyed by sorted item vectors
#[derive(Debug, Clone, Default)]
pub struct FrequentItemsets {
    itemsets: Vec<Itemset>,
    support: HashMap<Vec<ItemId>, f64>,
    total_transactions: u64,
}

impl FrequentItemsets {
    pub fn iter(&self) -> impl Iterator<Item = &Itemset> {
        self.itemsets.iter()
    }

    pub fn len(&self) -> usize {
        self.itemsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.itemsets.is_empty()
    }

    pub fn total_transactions(&self) -> u64 {
        self.total_transactions
    }

    /// Support fraction of a sorted item vector, if it was mined as frequent.
    /// By the Apriori property this is always present for any non-empty
    /// subset of a mined itemset.
    pub fn support_of(&self, items: &[ItemId]) -> Option<f64> {
        self.support.get(items).copied()
    }

    fn push_level(&mut self, level: Vec<Itemset>) {
        for set in level {
            self.support.insert(set.items().to_vec(), set.support);
            self.itemsets.push(set);
        }
    }
}

/// Discover all itemsets with support >= `min_support`.
///
/// `min_support` must be in (0, 1]; zero is rejected up front since it would
/// force enumerating the power set. An empty transaction collection yields an
/// empty result, not an error.
pub fn mine(transactions: &[Transaction], min_support: f64) -> Result<FrequentItemsets> {
    mine_with_max_len(transactions, min_support, None)
}

/// [`mine`] with an optional cap on itemset size
pub fn mine_with_max_len(
    transactions: &[Transaction],
    min_support: f64,
    max_len: Option<usize>,
) -> Result<FrequentItemsets> {
    if !(min_support > 0.0 && min_support <= 1.0) {
        return Err(Error::invalid_threshold(
            "min_support",
            min_support,
            "must be in (0, 1]",
        ));
    }

    let total = transactions.len() as u64;
    let mut result = FrequentItemsets {
        total_transactions: total,
        ..Default::default()
    };
    if total == 0 {
        return Ok(result);
    }

    let _timer = PerformanceTimer::new("apriori_mine");
    info!(
        "Running Apriori (min_support={}, transactions={})",
        min_support, total
    );

    // Level 1: every distinct item meeting the threshold
    let mut item_counts: HashMap<ItemId, u64> = HashMap::new();
    for tx in transactions {
        for &item in tx.items() {
            *item_counts.entry(item).or_insert(0) += 1;
        }
    }

    let mut level: Vec<Itemset> = item_counts
        .into_iter()
        .filter(|&(_, count)| meets_threshold(count, total, min_support))
        .map(|(item, count)| Itemset::new(vec![item], count, total))
        .collect();
    level.sort_unstable_by(|a, b| a.items().cmp(b.items()));
    debug!("Level 1: {} frequent items", level.len());

    let mut k = 1usize;
    while !level.is_empty() {
        let frequent_keys: HashSet<Vec<ItemId>> =
            level.iter().map(|set| set.items().to_vec()).collect();
        let prev: Vec<Vec<ItemId>> = level.iter().map(|set| set.items().to_vec()).collect();
        result.push_level(level);

        k += 1;
        if max_len.is_some_and(|cap| k > cap) {
            debug!("Stopping at max itemset size {}", k - 1);
            break;
        }

        let candidates = generate_candidates(&prev, &frequent_keys);
        if candidates.is_empty() {
            break;
        }
        debug!("Level {}: {} candidates after pruning", k, candidates.len());

        level = count_candidates(transactions, candidates, total, min_support);
        debug!("Level {}: {} frequent itemsets", k, level.len());
    }

    info!("Frequent itemsets found: {}", result.len());
    Ok(result)
}

fn meets_threshold(count: u64, total: u64, min_support: f64) -> bool {
    count as f64 / total as f64 >= min_support
}

/// Join lexicographically sorted (k-1)-itemsets sharing a (k-2)-prefix, then
/// prune candidates with any infrequent (k-1)-subset. Pruning happens here,
/// before any counting.
fn generate_candidates(
    prev: &[Vec<ItemId>],
    frequent_keys: &HashSet<Vec<ItemId>>,
) -> Vec<Vec<ItemId>> {
    let mut candidates = Vec::new();
    for i in 0..prev.len() {
        for j in (i + 1)..prev.len() {
            let Some(candidate) = join_on_prefix(&prev[i], &prev[j]) else {
                // Sorted input: once the prefix stops matching it never
                // matches again for this i
                break;
            };
            let all_subsets_frequent =
                subsets_dropping_one(&candidate).all(|sub| frequent_keys.contains(&sub));
            if all_subsets_frequent {
                candidates.push(candidate);
            }
        }
    }
    candidates
}

/// Count candidate supports with a parallel fold over transactions.
/// Each shard accumulates its own count map; shards merge in a single reduce.
fn count_candidates(
    transactions: &[Transaction],
    candidates: Vec<Vec<ItemId>>,
    total: u64,
    min_support: f64,
) -> Vec<Itemset> {
    let counts: HashMap<usize, u64> = transactions
        .par_iter()
        .fold(HashMap::new, |mut acc, tx| {
            for (idx, candidate) in candidates.iter().enumerate() {
                if candidate.len() <= tx.len() && is_sorted_subset(candidate, tx.items()) {
                    *acc.entry(idx).or_insert(0) += 1;
                }
            }
            acc
        })
        .reduce(HashMap::new, |mut left, right| {
            for (idx, count) in right {
                *left.entry(idx).or_insert(0) += count;
            }
            left
        });

    let mut surviving: Vec<Itemset> = candidates
        .into_iter()
        .enumerate()
        .filter_map(|(idx, items)| {
            let count = counts.get(&idx).copied().unwrap_or(0);
            meets_threshold(count, total, min_support).then(|| Itemset::new(items, count, total))
        })
        .collect();
    surviving.sort_unstable_by(|a, b| a.items().cmp(b.items()));
    surviving
}
