//! Configuration management for the MarketBasket engine
//!
//! Provides strongly-typed configuration with validation, environment variable
//! parsing, and sensible defaults. Threshold values are range-checked here so
//! a bad configuration aborts before any mining work starts.
//!
//! # Example
//! ```no_run
//! use marketbasket::Config;
//! let config = Config::from_env().expect("failed to load config");
//! println!("min support: {}", config.mining.min_support);
//! ```

use crate::error::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Lowest item id in the known catalog
pub const ITEM_ID_MIN: u32 = 1;

/// Highest item id in the known catalog
pub const ITEM_ID_MAX: u32 = 48;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Data ingestion configuration
    pub data: DataConfig,
    /// Mining and rule filtering configuration
    pub mining: MiningConfig,
    /// Recommendation engine configuration
    pub recommend: RecommendConfig,
}

/// Data ingestion configuration
#[derive(Debug, Clone)]
pub struct DataConfig {
    /// Path to the customer baskets CSV
    pub baskets_path: PathBuf,
    /// Path the curated rule set is exported to / refreshed from
    pub rules_path: PathBuf,
    /// Lowest valid item id
    pub item_id_min: u32,
    /// Highest valid item id
    pub item_id_max: u32,
    /// Treat out-of-catalog item ids in the input data as fatal
    pub strict_items: bool,
}

/// Mining and rule filtering configuration
#[derive(Debug, Clone)]
pub struct MiningConfig {
    /// Minimum support fraction for frequent itemsets, in (0, 1]
    pub min_support: f64,
    /// Minimum rule confidence, in [0, 1]
    pub min_confidence: f64,
    /// Minimum rule lift (1.0 = no better than chance)
    pub min_lift: f64,
    /// Minimum Zhang's metric, in [-1, 1]
    pub min_zhang: f64,
    /// Optional cap on itemset size, guards against combinatorial blowup
    pub max_len: Option<usize>,
}

/// Recommendation engine configuration
#[derive(Debug, Clone)]
pub struct RecommendConfig {
    /// Default number of recommendations to return
    pub top_n: usize,
    /// Interval between index refresh attempts
    pub refresh_interval: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (ignore if not found)
        dotenvy::dotenv().ok();

        let config = Self {
            data: DataConfig::from_env()?,
            mining: MiningConfig::from_env()?,
            recommend: RecommendConfig::from_env()?,
        };

        config.validate()?;
        config.log_summary();

        Ok(config)
    }

    /// Validate configuration, failing fast on out-of-range thresholds
    pub fn validate(&self) -> Result<()> {
        let m = &self.mining;

        if !(m.min_support > 0.0 && m.min_support <= 1.0) {
            return Err(Error::invalid_threshold(
                "min_support",
                m.min_support,
                "must be in (0, 1]",
            ));
        }
        if !(0.0..=1.0).contains(&m.min_confidence) {
            return Err(Error::invalid_threshold(
                "min_confidence",
                m.min_confidence,
                "must be in [0, 1]",
            ));
        }
        if m.min_lift < 0.0 {
            return Err(Error::invalid_threshold(
                "min_lift",
                m.min_lift,
                "must be >= 0",
            ));
        }
        if !(-1.0..=1.0).contains(&m.min_zhang) {
            return Err(Error::invalid_threshold(
                "min_zhang",
                m.min_zhang,
                "must be in [-1, 1]",
            ));
        }

        if self.data.item_id_min > self.data.item_id_max {
            return Err(Error::InvalidConfig {
                key: "ITEM_ID_MIN",
                message: "item_id_min must be <= item_id_max".into(),
            });
        }

        if self.recommend.top_n == 0 {
            return Err(Error::InvalidConfig {
                key: "RECOMMEND_TOP_N",
                message: "top_n must be a positive integer".into(),
            });
        }

        Ok(())
    }

    /// Log configuration summary
    fn log_summary(&self) {
        info!("Configuration loaded:");
        info!("  Data:");
        info!("    Baskets file: {}", self.data.baskets_path.display());
        info!("    Rules file: {}", self.data.rules_path.display());
        info!(
            "    Item id range: {}-{} (strict: {})",
            self.data.item_id_min, self.data.item_id_max, self.data.strict_items
        );
        info!("  Mining:");
        info!("    Min support: {}", self.mining.min_support);
        info!("    Min confidence: {}", self.mining.min_confidence);
        info!("    Min lift: {}", self.mining.min_lift);
        info!("    Min zhang: {}", self.mining.min_zhang);
        if let Some(max_len) = self.mining.max_len {
            info!("    Max itemset size: {}", max_len);
        }
        info!("  Recommendation:");
        info!("    Top N: {}", self.recommend.top_n);
        info!("    Refresh interval: {:?}", self.recommend.refresh_interval);
    }
}

impl DataConfig {
    fn from_env() -> Result<Self> {
        Ok(Self {
            baskets_path: PathBuf::from(get_env_or(
                "BASKETS_FILE",
                "data/raw/customer_baskets.csv",
            )),
            rules_path: PathBuf::from(get_env_or(
                "RULES_FILE",
                "outputs/rules/association_rules.csv",
            )),
            item_id_min: get_env_or("ITEM_ID_MIN", &ITEM_ID_MIN.to_string())
                .parse()
                .unwrap_or(ITEM_ID_MIN),
            item_id_max: get_env_or("ITEM_ID_MAX", &ITEM_ID_MAX.to_string())
                .parse()
                .unwrap_or(ITEM_ID_MAX),
            strict_items: get_env_or("STRICT_ITEMS", "false").parse().unwrap_or(false),
        })
    }
}

impl MiningConfig {
    fn from_env() -> Result<Self> {
        Ok(Self {
            min_support: get_env_parsed("APRIORI_MIN_SUPPORT", 0.01)?,
            min_confidence: get_env_parsed("APRIORI_MIN_CONFIDENCE", 0.60)?,
            min_lift: get_env_parsed("APRIORI_MIN_LIFT", 1.0)?,
            min_zhang: get_env_parsed("APRIORI_MIN_ZHANG", 0.0)?,
            max_len: {
                let s = get_env_or("APRIORI_MAX_LEN", "");
                if s.is_empty() {
                    None
                } else {
                    Some(s.parse().map_err(|_| Error::InvalidConfig {
                        key: "APRIORI_MAX_LEN",
                        message: format!("not a valid itemset size: {}", s).into(),
                    })?)
                }
            },
        })
    }
}

impl RecommendConfig {
    fn from_env() -> Result<Self> {
        Ok(Self {
            top_n: get_env_or("RECOMMEND_TOP_N", "5").parse().unwrap_or(5),
            refresh_interval: Duration::from_secs(
                get_env_or("RULES_REFRESH_INTERVAL_SECS", "300")
                    .parse()
                    .unwrap_or(300),
            ),
        })
    }
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            min_support: 0.01,
            min_confidence: 0.60,
            min_lift: 1.0,
            min_zhang: 0.0,
            max_len: None,
        }
    }
}

// ============================================================================
// Environment helpers
// ============================================================================

fn get_env_or(var: &str, default: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| default.to_string())
}

fn get_env_parsed(var: &'static str, default: f64) -> Result<f64> {
    match std::env::var(var) {
        Ok(s) => s.parse().map_err(|_| Error::InvalidConfig {
            key: var,
            message: format!("not a valid number: {}", s).into(),
        }),
        Err(_) => Ok(default),
    }
}
