//! MarketBasket library crate
//!
//! Re-exports core modules for integration tests and external use.

pub mod config;
pub mod error;
pub mod export;
pub mod mining;
pub mod recommendation;
pub mod transactions;

// Re-export commonly used types
pub use config::Config;
pub use error::Result;
pub use mining::{MiningPipeline, Rule};
pub use recommendation::{Recommendation, RecommendationEngine, RuleIndex};
pub use transactions::{PopularityRanking, Transaction};
