//! Association rule generation and scoring
//!
//! Expands each frequent itemset of size >= 2 into every directed
//! antecedent -> consequent split and computes the four rule measures.
//! Pure over the supplied itemsets; expansion is independent per itemset and
//! runs in parallel.

use crate::transactions::ItemId;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

use super::miner::FrequentItemsets;

/// A scored association rule: antecedent -> consequent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Sorted "if" item set, non-empty, disjoint from the consequent
    pub antecedent: Vec<ItemId>,
    /// Sorted "then" item set, non-empty
    pub consequent: Vec<ItemId>,
    /// Support fraction of antecedent ∪ consequent, in [0, 1]
    pub support: f64,
    /// P(consequent | antecedent), in [0, 1]
    pub confidence: f64,
    /// confidence / P(consequent), >= 0
    pub lift: f64,
    /// Zhang's metric, in [-1, 1]
    pub zhang: f64,
}

impl Rule {
    /// Check the structural and numeric invariants every rule must satisfy,
    /// whether freshly generated or re-imported
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.antecedent.is_empty() || self.consequent.is_empty() {
            return Err("antecedent and consequent must be non-empty".to_string());
        }
        if self.antecedent.iter().any(|item| self.consequent.contains(item)) {
            return Err("antecedent and consequent must be disjoint".to_string());
        }
        if !(0.0..=1.0).contains(&self.support) {
            return Err(format!("support {} outside [0, 1]", self.support));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(format!("confidence {} outside [0, 1]", self.confidence));
        }
        if self.lift < 0.0 || !self.lift.is_finite() {
            return Err(format!("lift {} must be finite and >= 0", self.lift));
        }
        if !(-1.0..=1.0).contains(&self.zhang) {
            return Err(format!("zhang {} outside [-1, 1]", self.zhang));
        }
        Ok(())
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} -> {:?} (conf={:.3}, lift={:.3}, zhang={:.3})",
            self.antecedent, self.consequent, self.confidence, self.lift, self.zhang
        )
    }
}

/// Zhang's metric from the three joint/marginal probabilities.
/// The zero-denominator case (P(A) in {0, 1}) is defined as 0, not an error.
pub fn zhangs_metric(p_ab: f64, p_a: f64, p_b: f64) -> f64 {
    let numerator = p_ab - p_a * p_b;
    let denominator = f64::max(p_ab * (1.0 - p_a), p_a * (p_b - p_ab));
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Expand every frequent itemset of size >= 2 into its 2^n - 2 candidate
/// rules with support, confidence, lift, and Zhang's metric. Unsorted and
/// unfiltered; [`super::filter::filter`] curates the output.
pub fn generate(itemsets: &FrequentItemsets) -> Vec<Rule> {
    let rules: Vec<Rule> = itemsets
        .iter()
        .filter(|set| set.len() >= 2)
        .collect::<Vec<_>>()
        .par_iter()
        .flat_map_iter(|set| expand_itemset(set.items(), set.support, itemsets))
        .collect();

    info!("Raw rules generated: {}", rules.len());
    rules
}

/// One rule per non-empty proper subset of `items` taken as antecedent
fn expand_itemset<'a>(
    items: &'a [ItemId],
    union_support: f64,
    itemsets: &'a FrequentItemsets,
) -> impl Iterator<Item = Rule> + 'a {
    let n = items.len();
    // Bitmask subset enumeration; masks 0 and 2^n - 1 are the empty set and
    // the full set, neither is a valid antecedent
    (1u32..(1u32 << n) - 1).map(move |mask| {
        let mut antecedent = Vec::with_capacity(n - 1);
        let mut consequent = Vec::with_capacity(n - 1);
        for (bit, &item) in items.iter().enumerate() {
            if mask & (1 << bit) != 0 {
                antecedent.push(item);
            } else {
                consequent.push(item);
            }
        }

        // Both sides are subsets of a frequent itemset, so their supports
        // are always present (Apriori property)
        let p_a = itemsets
            .support_of(&antecedent)
            .expect("antecedent support missing from mined itemsets");
        let p_b = itemsets
            .support_of(&consequent)
            .expect("consequent support missing from mined itemsets");

        let confidence = union_support / p_a;
        let lift = if p_b == 0.0 { 0.0 } else { confidence / p_b };

        Rule {
            antecedent,
            consequent,
            support: union_support,
            confidence,
            lift,
            zhang: zhangs_metric(union_support, p_a, p_b),
        }
    })
}
