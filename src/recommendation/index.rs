//! Read-only rule index for sub-linear basket matching
//!
//! Maps each item id to the rules whose antecedent contains it. Matching a
//! basket intersects those per-item postings lists: a rule applies exactly
//! when it is hit once per antecedent item, so curated rules whose antecedent
//! shares nothing with the basket are never touched.
//!
//! The index is immutable after [`RuleIndex::build`]; refreshing a rule set
//! means building a new index and swapping it in wholesale (see
//! [`super::updater::SharedIndex`]).

use crate::mining::generator::Rule;
use crate::transactions::ItemId;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Immutable lookup over a curated rule set
#[derive(Debug, Default)]
pub struct RuleIndex {
    rules: Vec<Rule>,
    /// item id -> indices of rules whose antecedent contains the item
    by_antecedent_item: HashMap<ItemId, Vec<usize>>,
    /// Every item id appearing in any rule, antecedent or consequent
    known_items: HashSet<ItemId>,
}

impl RuleIndex {
    /// Freeze a curated rule list into an index. The rule order is preserved,
    /// so a canonically sorted input stays canonically sorted.
    pub fn build(rules: Vec<Rule>) -> Self {
        let mut by_antecedent_item: HashMap<ItemId, Vec<usize>> = HashMap::new();
        let mut known_items = HashSet::new();

        for (idx, rule) in rules.iter().enumerate() {
            for &item in &rule.antecedent {
                by_antecedent_item.entry(item).or_default().push(idx);
                known_items.insert(item);
            }
            for &item in &rule.consequent {
                known_items.insert(item);
            }
        }

        debug!(
            "Rule index built: {} rules over {} known items",
            rules.len(),
            known_items.len()
        );
        Self {
            rules,
            by_antecedent_item,
            known_items,
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// True if the item appears in any curated rule
    pub fn knows_item(&self, item: ItemId) -> bool {
        self.known_items.contains(&item)
    }

    /// Rules whose antecedent is a subset of `basket` (sorted item ids).
    ///
    /// Gathers candidate rules from the basket items' postings lists and
    /// accepts a rule when its hit count equals its antecedent length: the
    /// postings-list intersection, without a scan of the full rule set.
    pub fn matching(&self, basket: &[ItemId]) -> Vec<&Rule> {
        let mut hits: HashMap<usize, usize> = HashMap::new();
        let mut last: Option<ItemId> = None;
        for &item in basket {
            // Baskets are sets; skip repeated ids so they cannot fake a hit
            if last == Some(item) {
                continue;
            }
            last = Some(item);
            if let Some(postings) = self.by_antecedent_item.get(&item) {
                for &rule_idx in postings {
                    *hits.entry(rule_idx).or_insert(0) += 1;
                }
            }
        }

        let mut matched: Vec<usize> = hits
            .into_iter()
            .filter_map(|(rule_idx, hit_count)| {
                (hit_count == self.rules[rule_idx].antecedent.len()).then_some(rule_idx)
            })
            .collect();
        matched.sort_unstable();
        matched.into_iter().map(|idx| &self.rules[idx]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(a: &[ItemId], c: &[ItemId], confidence: f64) -> Rule {
        Rule {
            antecedent: a.to_vec(),
            consequent: c.to_vec(),
            support: 0.4,
            confidence,
            lift: 1.2,
            zhang: 0.3,
        }
    }

    #[test]
    fn test_matching_requires_full_antecedent() {
        let index = RuleIndex::build(vec![
            rule(&[1], &[2], 0.5),
            rule(&[1, 3], &[2], 0.6),
            rule(&[4], &[5], 0.7),
        ]);

        let matched = index.matching(&[1]);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].antecedent, vec![1]);

        let matched = index.matching(&[1, 3]);
        assert_eq!(matched.len(), 2);

        assert!(index.matching(&[3]).is_empty());
        assert!(index.matching(&[]).is_empty());
    }

    #[test]
    fn test_known_items_cover_both_sides() {
        let index = RuleIndex::build(vec![rule(&[1], &[2], 0.5)]);
        assert!(index.knows_item(1));
        assert!(index.knows_item(2));
        assert!(!index.knows_item(3));
    }

    #[test]
    fn test_duplicate_basket_items_do_not_overcount() {
        let index = RuleIndex::build(vec![rule(&[1, 3], &[2], 0.6)]);
        // Baskets are sets; a repeated id must not fake a full match
        assert!(index.matching(&[1, 1]).is_empty());
    }
}
