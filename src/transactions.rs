//! Transaction ingestion and item catalog
//!
//! Data loading is treated as a gate: only validated baskets pass through to
//! the miner. A basket is an unordered set of item ids; internally it is kept
//! as a sorted, deduplicated vector so subset tests and hashing stay
//! deterministic.
//!
//! Also provides the popularity ranking used by the recommendation engine's
//! cold-start fallback, and summary statistics over basket sizes.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Item identifier drawn from the known catalog
pub type ItemId = u32;

/// A single customer basket: an immutable set of item ids
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Customer the basket belongs to, when the source data has one
    pub customer_id: Option<u64>,
    /// Sorted, deduplicated item ids
    items: Vec<ItemId>,
}

impl Transaction {
    /// Build a transaction from arbitrary item ids, deduplicating and sorting
    pub fn new(items: impl IntoIterator<Item = ItemId>) -> Self {
        let mut items: Vec<ItemId> = items.into_iter().collect();
        items.sort_unstable();
        items.dedup();
        Self {
            customer_id: None,
            items,
        }
    }

    /// Attach a customer id
    pub fn with_customer(mut self, customer_id: u64) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    /// Item ids, sorted ascending
    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Membership test over the sorted item vector
    pub fn contains(&self, item: ItemId) -> bool {
        self.items.binary_search(&item).is_ok()
    }

    /// True if every id in `subset` (sorted) is present in this basket
    pub fn contains_all(&self, subset: &[ItemId]) -> bool {
        let mut rest = self.items.as_slice();
        for &item in subset {
            match rest.binary_search(&item) {
                Ok(pos) => rest = &rest[pos + 1..],
                Err(_) => return false,
            }
        }
        true
    }
}

// ============================================================================
// Item catalog
// ============================================================================

/// Known item-id universe, as an inclusive range
#[derive(Debug, Clone, Copy)]
pub struct ItemCatalog {
    pub min: ItemId,
    pub max: ItemId,
}

impl ItemCatalog {
    pub fn new(min: ItemId, max: ItemId) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, item: ItemId) -> bool {
        (self.min..=self.max).contains(&item)
    }

    /// Fail with `UnknownItem` when the id is outside the catalog
    pub fn check(&self, item: ItemId) -> Result<()> {
        if self.contains(item) {
            Ok(())
        } else {
            Err(Error::UnknownItem {
                item,
                min: self.min,
                max: self.max,
            })
        }
    }
}

impl Default for ItemCatalog {
    fn default() -> Self {
        Self::new(crate::config::ITEM_ID_MIN, crate::config::ITEM_ID_MAX)
    }
}

// ============================================================================
// CSV ingestion
// ============================================================================

/// Raw CSV row shape: `customer_id,basket` with the basket as a
/// comma-delimited id list (e.g. `"34,13,42"`)
#[derive(Debug, Deserialize)]
struct BasketRecord {
    customer_id: u64,
    basket: String,
}

/// Load and validate customer baskets from a CSV file.
///
/// Rows whose basket cannot be parsed are logged and dropped; a file with a
/// broken schema, or one where every row fails, is `MalformedInput`. Item ids
/// outside the catalog are warned about, or rejected when `strict` is set.
pub fn load_baskets(
    path: &Path,
    catalog: &ItemCatalog,
    strict: bool,
) -> Result<Vec<Transaction>> {
    info!("Loading customer baskets from {}", path.display());

    let mut reader = csv::Reader::from_path(path)?;
    let mut transactions = Vec::new();
    let mut dropped = 0usize;
    let mut out_of_catalog = 0usize;

    for (idx, record) in reader.deserialize::<BasketRecord>().enumerate() {
        // Row numbers are 1-based and skip the header
        let line = idx + 2;
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                warn!("Dropping unparseable row {}: {}", line, e);
                dropped += 1;
                continue;
            }
        };

        let items = match parse_basket_field(&record.basket) {
            Some(items) if !items.is_empty() => items,
            _ => {
                warn!("Dropping row {}: unparseable basket '{}'", line, record.basket);
                dropped += 1;
                continue;
            }
        };

        for &item in &items {
            if !catalog.contains(item) {
                if strict {
                    catalog.check(item)?;
                }
                out_of_catalog += 1;
            }
        }

        transactions.push(Transaction::new(items).with_customer(record.customer_id));
    }

    if transactions.is_empty() {
        return Err(Error::malformed(
            path.display().to_string(),
            "no valid basket rows",
        ));
    }

    if dropped > 0 {
        warn!("Dropped {} unparseable rows", dropped);
    }
    if out_of_catalog > 0 {
        warn!(
            "{} item occurrences outside catalog range {}..={}",
            out_of_catalog, catalog.min, catalog.max
        );
    }

    info!("  Rows loaded: {}", transactions.len());
    Ok(transactions)
}

/// Parse `"1, 5, 12"` into item ids; `None` when any id fails to parse
fn parse_basket_field(basket: &str) -> Option<Vec<ItemId>> {
    basket
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<ItemId>().ok())
        .collect()
}

// ============================================================================
// Popularity ranking (cold-start collaborator)
// ============================================================================

/// One entry of the global popularity ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopularityEntry {
    pub item: ItemId,
    /// Number of transactions containing the item
    pub count: u64,
    /// Fraction of transactions containing the item
    pub fraction: f64,
}

/// Items ranked by global transaction frequency, descending.
/// Consumed read-only by the recommendation engine as cold-start fallback.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PopularityRanking {
    entries: Vec<PopularityEntry>,
}

impl PopularityRanking {
    /// Count per-item transaction frequency and rank descending.
    /// Ties are broken by item id so the ranking is deterministic.
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        let mut counts: HashMap<ItemId, u64> = HashMap::new();
        for tx in transactions {
            for &item in tx.items() {
                *counts.entry(item).or_insert(0) += 1;
            }
        }

        let total = transactions.len().max(1) as f64;
        let mut entries: Vec<PopularityEntry> = counts
            .into_iter()
            .map(|(item, count)| PopularityEntry {
                item,
                count,
                fraction: count as f64 / total,
            })
            .collect();
        entries.sort_unstable_by(|a, b| b.count.cmp(&a.count).then(a.item.cmp(&b.item)));

        debug!("Popularity ranking built over {} items", entries.len());
        Self { entries }
    }

    pub fn entries(&self) -> &[PopularityEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Top `n` entries by frequency
    pub fn top(&self, n: usize) -> &[PopularityEntry] {
        &self.entries[..n.min(self.entries.len())]
    }
}

// ============================================================================
// Basket statistics
// ============================================================================

/// Summary statistics over basket sizes
#[derive(Debug, Clone, Serialize)]
pub struct BasketStats {
    pub transactions: usize,
    pub distinct_items: usize,
    pub mean_size: f64,
    pub median_size: f64,
    pub min_size: usize,
    pub max_size: usize,
}

impl BasketStats {
    pub fn compute(transactions: &[Transaction]) -> Self {
        if transactions.is_empty() {
            return Self {
                transactions: 0,
                distinct_items: 0,
                mean_size: 0.0,
                median_size: 0.0,
                min_size: 0,
                max_size: 0,
            };
        }

        let mut sizes: Vec<usize> = transactions.iter().map(Transaction::len).collect();
        sizes.sort_unstable();

        let total: usize = sizes.iter().sum();
        let mid = sizes.len() / 2;
        let median = if sizes.len() % 2 == 0 {
            (sizes[mid - 1] + sizes[mid]) as f64 / 2.0
        } else {
            sizes[mid] as f64
        };

        let mut distinct: Vec<ItemId> = transactions
            .iter()
            .flat_map(|tx| tx.items().iter().copied())
            .collect();
        distinct.sort_unstable();
        distinct.dedup();

        Self {
            transactions: transactions.len(),
            distinct_items: distinct.len(),
            mean_size: total as f64 / sizes.len() as f64,
            median_size: median,
            min_size: sizes[0],
            max_size: sizes[sizes.len() - 1],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_transaction_dedups_and_sorts() {
        let tx = Transaction::new([5, 1, 3, 5, 1]);
        assert_eq!(tx.items(), &[1, 3, 5]);
        assert!(tx.contains(3));
        assert!(!tx.contains(2));
    }

    #[test]
    fn test_contains_all() {
        let tx = Transaction::new([1, 2, 3, 7]);
        assert!(tx.contains_all(&[1, 3]));
        assert!(tx.contains_all(&[]));
        assert!(!tx.contains_all(&[1, 4]));
    }

    #[test]
    fn test_parse_basket_field() {
        assert_eq!(parse_basket_field("1, 5, 12"), Some(vec![1, 5, 12]));
        assert_eq!(parse_basket_field("7"), Some(vec![7]));
        assert_eq!(parse_basket_field("1,x,3"), None);
        assert_eq!(parse_basket_field(""), Some(vec![]));
    }

    #[test]
    fn test_catalog_check() {
        let catalog = ItemCatalog::new(1, 48);
        assert!(catalog.check(48).is_ok());
        let err = catalog.check(99).unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_ITEM");
    }

    #[test]
    fn test_load_baskets_drops_bad_rows() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "customer_id,basket").unwrap();
        writeln!(file, "1,\"1,2,3\"").unwrap();
        writeln!(file, "2,\"not,a,basket\"").unwrap();
        writeln!(file, "3,\"2,3\"").unwrap();
        file.flush().unwrap();

        let catalog = ItemCatalog::new(1, 48);
        let txs = load_baskets(file.path(), &catalog, false).unwrap();
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].items(), &[1, 2, 3]);
        assert_eq!(txs[0].customer_id, Some(1));
    }

    #[test]
    fn test_load_baskets_strict_rejects_unknown_item() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "customer_id,basket").unwrap();
        writeln!(file, "1,\"1,99\"").unwrap();
        file.flush().unwrap();

        let catalog = ItemCatalog::new(1, 48);
        let err = load_baskets(file.path(), &catalog, true).unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_ITEM");
    }

    #[test]
    fn test_load_baskets_all_bad_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "customer_id,basket").unwrap();
        writeln!(file, "1,\"x\"").unwrap();
        file.flush().unwrap();

        let catalog = ItemCatalog::new(1, 48);
        let err = load_baskets(file.path(), &catalog, false).unwrap_err();
        assert_eq!(err.error_code(), "MALFORMED_INPUT");
    }

    #[test]
    fn test_popularity_ranking_order() {
        let txs = vec![
            Transaction::new([1, 2, 3]),
            Transaction::new([1, 2]),
            Transaction::new([1, 3]),
            Transaction::new([2, 3]),
            Transaction::new([1]),
        ];
        let ranking = PopularityRanking::from_transactions(&txs);
        let top = ranking.top(3);
        assert_eq!(top[0].item, 1);
        assert_eq!(top[0].count, 4);
        assert!((top[0].fraction - 0.8).abs() < 1e-12);
        // 2 and 3 tie at 3, item id breaks the tie
        assert_eq!(top[1].item, 2);
        assert_eq!(top[2].item, 3);
    }

    #[test]
    fn test_basket_stats() {
        let txs = vec![
            Transaction::new([1, 2, 3]),
            Transaction::new([1, 2]),
            Transaction::new([1]),
        ];
        let stats = BasketStats::compute(&txs);
        assert_eq!(stats.transactions, 3);
        assert_eq!(stats.distinct_items, 3);
        assert!((stats.mean_size - 2.0).abs() < 1e-12);
        assert!((stats.median_size - 2.0).abs() < 1e-12);
        assert_eq!(stats.min_size, 1);
        assert_eq!(stats.max_size, 3);
    }
}
