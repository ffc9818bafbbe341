//! Recommendation Module
//!
//! Turns the curated rule set into ranked product recommendations for a
//! customer basket.
//!
//! ## Architecture
//!
//! 1. **Index** - immutable per-item lookup over curated rule antecedents,
//!    so matching a basket never scans the full rule set
//! 2. **Engine** - matches basket against rules, keeps the best-scoring
//!    occurrence per candidate item, ranks by confidence / lift / zhang
//! 3. **Updater** - publishes rebuilt indexes with an atomic reference swap
//!    and refreshes them periodically from the exported rule file
//!
//! ## Cold start
//!
//! An empty basket, a basket of only unknown items, or a basket no rule
//! applies to falls back to the global popularity ranking. That path is
//! defined behavior, not an error.

pub mod engine;
pub mod index;
pub mod metrics;
pub mod updater;

// Re-export the types that are actually used externally
pub use engine::{Recommendation, RecommendationEngine, RecommendationReason};
pub use index::RuleIndex;
pub use updater::SharedIndex;
