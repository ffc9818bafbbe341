//! Rule curation: threshold cuts and redundancy removal
//!
//! A rule is redundant when a strictly more general rule with the same
//! consequent is at least as confident. Redundancy is evaluated against the
//! full threshold-surviving set, so a drop decided by one comparison is never
//! resurrected by a later one. Ties on confidence drop the more specific
//! rule; this is a documented policy choice for determinism.

use crate::error::{Error, Result};
use crate::transactions::ItemId;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{info, warn};

use super::generator::Rule;
use super::itemset::is_sorted_subset;

/// Threshold set applied by [`filter`]
#[derive(Debug, Clone, Copy)]
pub struct RuleThresholds {
    /// Minimum confidence, in [0, 1]
    pub min_confidence: f64,
    /// Minimum lift; 1.0 is the "no better than chance" reference
    pub min_lift: f64,
    /// Minimum Zhang's metric, in [-1, 1]
    pub min_zhang: f64,
}

impl RuleThresholds {
    pub fn new(min_confidence: f64, min_lift: f64, min_zhang: f64) -> Self {
        Self {
            min_confidence,
            min_lift,
            min_zhang,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(Error::invalid_threshold(
                "min_confidence",
                self.min_confidence,
                "must be in [0, 1]",
            ));
        }
        if self.min_lift < 0.0 {
            return Err(Error::invalid_threshold(
                "min_lift",
                self.min_lift,
                "must be >= 0",
            ));
        }
        if !(-1.0..=1.0).contains(&self.min_zhang) {
            return Err(Error::invalid_threshold(
                "min_zhang",
                self.min_zhang,
                "must be in [-1, 1]",
            ));
        }
        Ok(())
    }
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self::new(0.60, 1.0, 0.0)
    }
}

/// Descending strength order: confidence, then lift, then zhang, with a
/// lexicographic antecedent/consequent tail so the order is total and
/// reproducible
pub fn compare_strength(a: &Rule, b: &Rule) -> Ordering {
    b.confidence
        .total_cmp(&a.confidence)
        .then_with(|| b.lift.total_cmp(&a.lift))
        .then_with(|| b.zhang.total_cmp(&a.zhang))
        .then_with(|| a.antecedent.cmp(&b.antecedent))
        .then_with(|| a.consequent.cmp(&b.consequent))
}

/// Curate raw rules: validate thresholds, cut, drop redundant rules,
/// deduplicate, and sort into the canonical descending order.
pub fn filter(rules: Vec<Rule>, thresholds: &RuleThresholds) -> Result<Vec<Rule>> {
    thresholds.validate()?;

    let before = rules.len();
    let survivors: Vec<Rule> = rules
        .into_iter()
        .filter(|rule| {
            rule.confidence >= thresholds.min_confidence
                && rule.lift >= thresholds.min_lift
                && rule.zhang >= thresholds.min_zhang
        })
        .collect();
    info!(
        "Threshold cut: {} of {} rules remain",
        survivors.len(),
        before
    );

    let mut curated = drop_redundant(survivors);
    curated.sort_unstable_by(compare_strength);
    curated.dedup_by(|a, b| a.antecedent == b.antecedent && a.consequent == b.consequent);

    if curated.is_empty() && before > 0 {
        warn!("No rules passed filtering; consider lowering thresholds");
    }
    info!("Curated rules: {}", curated.len());
    Ok(curated)
}

/// Remove rules subsumed by a more general, at-least-as-confident rule with
/// the identical consequent. Comparison runs per shared consequent against
/// all threshold survivors, not only the kept ones.
fn drop_redundant(rules: Vec<Rule>) -> Vec<Rule> {
    let mut by_consequent: HashMap<&[ItemId], Vec<usize>> = HashMap::new();
    for (idx, rule) in rules.iter().enumerate() {
        by_consequent
            .entry(rule.consequent.as_slice())
            .or_default()
            .push(idx);
    }

    let redundant: Vec<bool> = rules
        .iter()
        .map(|rule| {
            by_consequent[rule.consequent.as_slice()].iter().any(|&other_idx| {
                let other = &rules[other_idx];
                other.antecedent.len() < rule.antecedent.len()
                    && is_sorted_subset(&other.antecedent, &rule.antecedent)
                    && other.confidence >= rule.confidence
            })
        })
        .collect();

    let dropped = redundant.iter().filter(|&&r| r).count();
    if dropped > 0 {
        info!("Redundancy removal: {} rules dropped", dropped);
    }

    rules
        .into_iter()
        .zip(redundant)
        .filter_map(|(rule, is_redundant)| (!is_redundant).then_some(rule))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn test_threshold_cut() {
        let rules = vec![
            rule(&[1], &[2], 0.7, 1.2, 0.3),
            rule(&[2], &[3], 0.5, 1.2, 0.3),
            rule(&[3], &[4], 0.7, 0.9, 0.3),
            rule(&[4], &[5], 0.7, 1.2, -0.2),
        ];
        let curated = filter(rules, &RuleThresholds::default()).unwrap();
        assert_eq!(curated.len(), 1);
        assert_eq!(curated[0].antecedent, vec![1]);
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        let thresholds = RuleThresholds::new(1.5, 1.0, 0.0);
        let err = filter(vec![], &thresholds).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_THRESHOLD");

        assert!(filter(vec![], &RuleThresholds::new(0.5, -1.0, 0.0)).is_err());
        assert!(filter(vec![], &RuleThresholds::new(0.5, 1.0, 2.0)).is_err());
    }

    #[test]
    fn test_more_specific_equal_confidence_dropped() {
        // {1} -> {2} at 0.5 subsumes {1,3} -> {2} at 0.5
        let rules = vec![
            rule(&[1], &[2], 0.5, 1.2, 0.3),
            rule(&[1, 3], &[2], 0.5, 1.4, 0.4),
        ];
        let thresholds = RuleThresholds::new(0.0, 0.0, -1.0);
        let curated = filter(rules, &thresholds).unwrap();
        assert_eq!(curated.len(), 1);
        assert_eq!(curated[0].antecedent, vec![1]);
    }

    #[test]
    fn test_more_confident_specific_kept() {
        let rules = vec![
            rule(&[1], &[2], 0.5, 1.2, 0.3),
            rule(&[1, 3], &[2], 0.8, 1.4, 0.4),
        ];
        let thresholds = RuleThresholds::new(0.0, 0.0, -1.0);
        let curated = filter(rules, &thresholds).unwrap();
        assert_eq!(curated.len(), 2);
    }

    #[test]
    fn test_subsumption_requires_same_consequent() {
        let rules = vec![
            rule(&[1], &[2], 0.9, 1.2, 0.3),
            rule(&[1, 3], &[4], 0.5, 1.4, 0.4),
        ];
        let thresholds = RuleThresholds::new(0.0, 0.0, -1.0);
        let curated = filter(rules, &thresholds).unwrap();
        assert_eq!(curated.len(), 2);
    }

    #[test]
    fn test_filter_idempotent() {
        let rules = vec![
            rule(&[1], &[2], 0.9, 1.4, 0.5),
            rule(&[2], &[3], 0.8, 1.2, 0.3),
            rule(&[1, 3], &[2], 0.7, 1.1, 0.2),
        ];
        let thresholds = RuleThresholds::default();
        let once = filter(rules, &thresholds).unwrap();
        let twice = filter(once.clone(), &thresholds).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_output_ordering_deterministic() {
        let rules = vec![
            rule(&[2], &[3], 0.8, 1.5, 0.2),
            rule(&[1], &[4], 0.8, 1.5, 0.6),
            rule(&[3], &[5], 0.9, 1.1, 0.1),
        ];
        let thresholds = RuleThresholds::new(0.0, 0.0, -1.0);
        let curated = filter(rules, &thresholds).unwrap();
        // confidence first, then zhang breaks the 0.8/1.5 tie
        assert_eq!(curated[0].antecedent, vec![3]);
        assert_eq!(curated[1].antecedent, vec![1]);
        assert_eq!(curated[2].antecedent, vec![2]);
    }

    #[test]
    fn test_raising_thresholds_never_grows_output() {
        let rules: Vec<Rule> = (0..10)
            .map(|i| rule(&[i], &[i + 100], 0.5 + (i as f64) * 0.05, 1.2, 0.3))
            .collect();
        let loose = filter(rules.clone(), &RuleThresholds::new(0.5, 1.0, 0.0)).unwrap();
        let tight = filter(rules, &RuleThresholds::new(0.8, 1.0, 0.0)).unwrap();
        assert!(tight.len() <= loose.len());
    }
}
