//! Performance timers and rule-set quality summaries
//!
//! These utilities are used for monitoring mining runs and debugging
//! recommendation quality.

use crate::mining::generator::Rule;
use serde::Serialize;
use std::time::Instant;
use tracing::info;

/// Performance timer for tracking operation duration
pub struct PerformanceTimer {
    start: Instant,
    label: String,
}

impl PerformanceTimer {
    pub fn new(label: &str) -> Self {
        Self {
            start: Instant::now(),
            label: label.to_string(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    pub fn log_if_slow(&self, threshold_ms: u64) {
        let elapsed = self.elapsed_ms();
        if elapsed > threshold_ms {
            tracing::warn!(
                "Slow operation: {} took {}ms (threshold: {}ms)",
                self.label,
                elapsed,
                threshold_ms
            );
        }
    }
}

impl Drop for PerformanceTimer {
    fn drop(&mut self) {
        tracing::debug!("{} completed in {}ms", self.label, self.elapsed_ms());
    }
}

/// Summary statistics over a curated rule set
#[derive(Debug, Clone, Serialize)]
pub struct RuleSetSummary {
    pub total_rules: usize,
    pub avg_support: f64,
    pub avg_confidence: f64,
    pub avg_lift: f64,
    pub avg_zhang: f64,
    /// Strongest rule in canonical order, rendered for logs
    pub top_rule: Option<String>,
}

impl RuleSetSummary {
    pub fn from_rules(rules: &[Rule]) -> Self {
        if rules.is_empty() {
            return Self {
                total_rules: 0,
                avg_support: 0.0,
                avg_confidence: 0.0,
                avg_lift: 0.0,
                avg_zhang: 0.0,
                top_rule: None,
            };
        }

        let n = rules.len() as f64;
        Self {
            total_rules: rules.len(),
            avg_support: rules.iter().map(|r| r.support).sum::<f64>() / n,
            avg_confidence: rules.iter().map(|r| r.confidence).sum::<f64>() / n,
            avg_lift: rules.iter().map(|r| r.lift).sum::<f64>() / n,
            avg_zhang: rules.iter().map(|r| r.zhang).sum::<f64>() / n,
            top_rule: Some(rules[0].to_string()),
        }
    }

    pub fn log(&self) {
        info!("Rule mining summary:");
        info!("  Total rules: {}", self.total_rules);
        if self.total_rules == 0 {
            return;
        }
        info!("  Avg support: {:.4}", self.avg_support);
        info!("  Avg confidence: {:.4}", self.avg_confidence);
        info!("  Avg lift: {:.4}", self.avg_lift);
        info!("  Avg zhang: {:.4}", self.avg_zhang);
        if let Some(top) = &self.top_rule {
            info!("  Top rule: {}", top);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(confidence: f64, lift: f64) -> Rule {
        Rule {
            antecedent: vec![1],
            consequent: vec![2],
            support: 0.4,
            confidence,
            lift,
            zhang: 0.2,
        }
    }

    #[test]
    fn test_summary_averages() {
        let rules = vec![rule(0.6, 1.0), rule(0.8, 2.0)];
        let summary = RuleSetSummary::from_rules(&rules);
        assert_eq!(summary.total_rules, 2);
        assert!((summary.avg_confidence - 0.7).abs() < 1e-12);
        assert!((summary.avg_lift - 1.5).abs() < 1e-12);
        assert!(summary.top_rule.is_some());
    }

    #[test]
    fn test_empty_summary() {
        let summary = RuleSetSummary::from_rules(&[]);
        assert_eq!(summary.total_rules, 0);
        assert!(summary.top_rule.is_none());
    }

    #[test]
    fn test_timer_elapsed() {
        let timer = PerformanceTimer::new("test_op");
        timer.log_if_slow(u64::MAX);
        // Freshly started timers report near-zero elapsed time
        assert!(timer.elapsed_ms() < 10_000);
    }
}
