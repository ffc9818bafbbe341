//! Association-rule mining
//!
//! ## Architecture
//!
//! 1. **Miner** - level-wise Apriori discovery of frequent itemsets under a
//!    minimum support threshold, with anti-monotone pruning before counting
//! 2. **Generator** - expansion of each frequent itemset into scored
//!    antecedent -> consequent rules (support, confidence, lift, zhang)
//! 3. **Filter** - threshold cuts plus subsumption-based redundancy removal,
//!    producing the canonical curated rule set
//!
//! Itemsets are a transient intermediate: they are discarded once rules have
//! been derived. Curated rules are frozen into a
//! [`crate::recommendation::RuleIndex`] for basket matching.

pub mod filter;
pub mod generator;
pub mod itemset;
pub mod miner;

pub use filter::{filter, RuleThresholds};
pub use generator::{generate, Rule};
pub use itemset::Itemset;
pub use miner::{mine, mine_with_max_len, FrequentItemsets};

use crate::config::MiningConfig;
use crate::error::Result;
use crate::recommendation::metrics::{PerformanceTimer, RuleSetSummary};
use crate::transactions::Transaction;
use tracing::info;

/// End-to-end mining run: mine -> generate -> filter.
///
/// Thresholds are validated before any work starts; a bad configuration
/// aborts without partial results.
pub struct MiningPipeline {
    config: MiningConfig,
}

impl MiningPipeline {
    pub fn new(config: MiningConfig) -> Self {
        Self { config }
    }

    /// Run the full pipeline and return the curated rule set
    pub fn run(&self, transactions: &[Transaction]) -> Result<Vec<Rule>> {
        let thresholds = RuleThresholds::new(
            self.config.min_confidence,
            self.config.min_lift,
            self.config.min_zhang,
        );
        thresholds.validate()?;

        let _timer = PerformanceTimer::new("mining_pipeline");
        info!("Starting association rule mining pipeline");

        let itemsets =
            mine_with_max_len(transactions, self.config.min_support, self.config.max_len)?;
        let raw_rules = generate(&itemsets);
        let curated = filter(raw_rules, &thresholds)?;

        let summary = RuleSetSummary::from_rules(&curated);
        summary.log();

        Ok(curated)
    }
}
