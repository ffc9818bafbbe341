//! Recommendation Engine
//!
//! Matches a customer basket against the curated rule index and ranks
//! candidate items by rule strength. Holds no mutable state: each call loads
//! the current immutable index snapshot, so concurrent `recommend` calls are
//! safe and an index refresh never tears an in-flight request.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::mining::generator::Rule;
use crate::transactions::{ItemId, PopularityRanking};

use super::index::RuleIndex;
use super::metrics::PerformanceTimer;
use super::updater::SharedIndex;

/// A scored recommendation for a single item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub item: ItemId,
    pub confidence: f64,
    pub lift: f64,
    pub zhang: f64,
    pub reason: RecommendationReason,
}

/// Why this item was recommended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationReason {
    /// A curated rule's antecedent matched the basket
    RuleMatch { antecedent: Vec<ItemId> },
    /// Cold-start fallback from the global popularity ranking
    Popularity { rank: usize },
}

/// Main recommendation engine
#[derive(Clone)]
pub struct RecommendationEngine {
    index: SharedIndex,
    popularity: PopularityRanking,
}

impl RecommendationEngine {
    /// Freeze a curated rule set into an index and build the engine around
    /// it, with the popularity ranking as cold-start fallback
    pub fn build(curated_rules: Vec<Rule>, popularity: PopularityRanking) -> Self {
        Self {
            index: SharedIndex::new(RuleIndex::build(curated_rules)),
            popularity,
        }
    }

    /// Handle to the shared index, for wiring up a refresher
    pub fn shared_index(&self) -> SharedIndex {
        self.index.clone()
    }

    /// Rank up to `top_n` candidate items for `basket`.
    ///
    /// Unknown item ids are dropped with a warning, never an error. An empty
    /// basket, a basket emptied by unknown-item filtering, or a basket no
    /// rule applies to falls back to the popularity ranking; this method
    /// never fails for basket-shaped reasons.
    pub fn recommend(&self, basket: &[ItemId], top_n: usize) -> Vec<Recommendation> {
        let timer = PerformanceTimer::new("recommend");
        let index = self.index.load();

        let mut basket: Vec<ItemId> = basket.to_vec();
        basket.sort_unstable();
        basket.dedup();

        let known: Vec<ItemId> = basket
            .iter()
            .copied()
            .filter(|&item| {
                let keep = index.knows_item(item);
                if !keep {
                    warn!("Dropping unknown item {} from basket", item);
                }
                keep
            })
            .collect();

        if known.is_empty() {
            debug!("Basket empty after filtering, using popularity fallback");
            return self.fallback(&basket, top_n);
        }

        let matched = index.matching(&known);
        if matched.is_empty() {
            debug!("No rule matches basket {:?}, using popularity fallback", known);
            return self.fallback(&basket, top_n);
        }

        // Keep only the best-scoring occurrence per candidate item
        let mut best: HashMap<ItemId, Recommendation> = HashMap::new();
        for rule in &matched {
            for &item in &rule.consequent {
                if basket.binary_search(&item).is_ok() {
                    continue;
                }
                let candidate = Recommendation {
                    item,
                    confidence: rule.confidence,
                    lift: rule.lift,
                    zhang: rule.zhang,
                    reason: RecommendationReason::RuleMatch {
                        antecedent: rule.antecedent.clone(),
                    },
                };
                match best.get(&item) {
                    Some(current) if !stronger(&candidate, current) => {}
                    _ => {
                        best.insert(item, candidate);
                    }
                }
            }
        }

        let mut ranked: Vec<Recommendation> = best.into_values().collect();
        ranked.sort_unstable_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| b.lift.total_cmp(&a.lift))
                .then_with(|| b.zhang.total_cmp(&a.zhang))
                .then_with(|| a.item.cmp(&b.item))
        });
        ranked.truncate(top_n);

        timer.log_if_slow(100);
        debug!(
            "Recommendations: {} items from {} matching rules",
            ranked.len(),
            matched.len()
        );
        ranked
    }

    /// Cold-start path: globally most frequent items, minus the basket.
    /// Fallback entries report the item's global support as confidence with
    /// neutral lift and zhang, and carry a `Popularity` reason.
    fn fallback(&self, basket: &[ItemId], top_n: usize) -> Vec<Recommendation> {
        self.popularity
            .entries()
            .iter()
            .filter(|entry| basket.binary_search(&entry.item).is_err())
            .take(top_n)
            .enumerate()
            .map(|(rank, entry)| Recommendation {
                item: entry.item,
                confidence: entry.fraction,
                lift: 1.0,
                zhang: 0.0,
                reason: RecommendationReason::Popularity { rank },
            })
            .collect()
    }
}

/// Strict "better recommendation" order: confidence, then lift, then zhang
fn stronger(a: &Recommendation, b: &Recommendation) -> bool {
    (a.confidence, a.lift, a.zhang) > (b.confidence, b.lift, b.zhang)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transactions::Transaction;

    fn rule(a: &[ItemId], c: &[ItemId], confidence: f64, lift: f64, zhang: f64) -> Rule {
        Rule {
            antecedent: a.to_vec(),
            consequent: c.to_vec(),
            support: 0.4,
            confidence,
            lift,
            zhang,
        }
    }

    fn sample_popularity() -> PopularityRanking {
        PopularityRanking::from_transactions(&[
            Transaction::new([1, 2, 3]),
            Transaction::new([1, 2]),
            Transaction::new([1, 3]),
            Transaction::new([2, 3]),
            Transaction::new([1]),
        ])
    }

    #[test]
    fn test_single_rule_match() {
        let engine = RecommendationEngine::build(
            vec![rule(&[1], &[2], 0.5, 0.833, 0.1)],
            sample_popularity(),
        );
        let recs = engine.recommend(&[1], 1);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].item, 2);
        assert!((recs[0].confidence - 0.5).abs() < 1e-12);
        assert_eq!(
            recs[0].reason,
            RecommendationReason::RuleMatch {
                antecedent: vec![1]
            }
        );
    }

    #[test]
    fn test_basket_items_excluded() {
        let engine = RecommendationEngine::build(
            vec![rule(&[1], &[2], 0.9, 1.2, 0.3), rule(&[2], &[1], 0.9, 1.2, 0.3)],
            sample_popularity(),
        );
        let recs = engine.recommend(&[1, 2], 5);
        assert!(recs.is_empty());
    }

    #[test]
    fn test_best_occurrence_per_item_wins() {
        let engine = RecommendationEngine::build(
            vec![
                rule(&[1], &[3], 0.6, 1.1, 0.2),
                rule(&[2], &[3], 0.8, 1.3, 0.4),
            ],
            sample_popularity(),
        );
        let recs = engine.recommend(&[1, 2], 5);
        assert_eq!(recs.len(), 1);
        assert!((recs[0].confidence - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_empty_basket_falls_back_to_popularity() {
        let engine =
            RecommendationEngine::build(vec![rule(&[1], &[2], 0.5, 1.2, 0.3)], sample_popularity());
        let recs = engine.recommend(&[], 3);
        assert_eq!(recs.len(), 3);
        // Popularity order over the sample transactions: 1, 2, 3
        assert_eq!(recs[0].item, 1);
        assert!((recs[0].confidence - 0.8).abs() < 1e-12);
        assert!(matches!(
            recs[0].reason,
            RecommendationReason::Popularity { rank: 0 }
        ));
    }

    #[test]
    fn test_unknown_basket_falls_back_like_empty() {
        let engine =
            RecommendationEngine::build(vec![rule(&[1], &[2], 0.5, 1.2, 0.3)], sample_popularity());
        let from_unknown = engine.recommend(&[99], 3);
        let from_empty = engine.recommend(&[], 3);
        assert_eq!(from_unknown, from_empty);
    }

    #[test]
    fn test_no_matching_rule_falls_back() {
        let engine = RecommendationEngine::build(
            vec![rule(&[1, 3], &[2], 0.5, 1.2, 0.3)],
            sample_popularity(),
        );
        // Item 3 is known but no antecedent is a subset of {3}
        let recs = engine.recommend(&[3], 2);
        assert!(!recs.is_empty());
        assert!(matches!(
            recs[0].reason,
            RecommendationReason::Popularity { .. }
        ));
        // Basket item 3 stays excluded even in fallback
        assert!(recs.iter().all(|r| r.item != 3));
    }

    #[test]
    fn test_deterministic_output() {
        let engine = RecommendationEngine::build(
            vec![
                rule(&[1], &[2], 0.5, 1.2, 0.3),
                rule(&[1], &[3], 0.5, 1.2, 0.3),
                rule(&[1], &[4], 0.7, 1.2, 0.3),
            ],
            sample_popularity(),
        );
        let first = engine.recommend(&[1], 5);
        for _ in 0..10 {
            assert_eq!(engine.recommend(&[1], 5), first);
        }
        // Item id breaks the exact tie between items 2 and 3
        assert_eq!(first[0].item, 4);
        assert_eq!(first[1].item, 2);
        assert_eq!(first[2].item, 3);
    }

    #[test]
    fn test_top_n_truncates() {
        let engine = RecommendationEngine::build(
            vec![
                rule(&[1], &[2], 0.9, 1.2, 0.3),
                rule(&[1], &[3], 0.8, 1.2, 0.3),
                rule(&[1], &[4], 0.7, 1.2, 0.3),
            ],
            sample_popularity(),
        );
        assert_eq!(engine.recommend(&[1], 2).len(), 2);
        assert!(engine.recommend(&[1], 0).is_empty());
    }
}
