//! Shared index handle and periodic refresh
//!
//! The curated rule set is recomputed out of band and exported to disk; the
//! serving side picks it up by rebuilding the index wholesale and publishing
//! it with an atomic reference swap. In-flight readers keep the snapshot they
//! loaded, so they always observe a complete index, old or new.

use crate::error::Result;
use crate::export;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::index::RuleIndex;

/// Cheaply clonable handle to the current rule index.
/// Readers `load` an `Arc` snapshot; writers `publish` a full replacement.
#[derive(Clone)]
pub struct SharedIndex {
    current: Arc<RwLock<Arc<RuleIndex>>>,
}

impl SharedIndex {
    pub fn new(index: RuleIndex) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(index))),
        }
    }

    /// Snapshot of the current index
    pub fn load(&self) -> Arc<RuleIndex> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            // A writer never panics while holding the lock, but a poisoned
            // lock still guards a fully published index
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Replace the index wholesale
    pub fn publish(&self, index: RuleIndex) {
        let index = Arc::new(index);
        match self.current.write() {
            Ok(mut guard) => *guard = index,
            Err(poisoned) => *poisoned.into_inner() = index,
        }
    }

    /// Reload the exported rule file and publish a freshly built index.
    /// Returns the number of rules in the new index.
    pub fn refresh_from_file(&self, path: &std::path::Path) -> Result<usize> {
        let rules = export::load_rules(path)?;
        let count = rules.len();
        self.publish(RuleIndex::build(rules));
        Ok(count)
    }
}

/// Spawn a background task that periodically reloads the exported rule set
/// and swaps in a rebuilt index. A failed reload keeps the previous index.
pub fn spawn_index_refresher(
    shared: SharedIndex,
    rules_path: PathBuf,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // Skip first tick (runs immediately otherwise)
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match shared.refresh_from_file(&rules_path) {
                Ok(count) => {
                    info!("Rule index refreshed: {} rules", count);
                }
                Err(e) => {
                    warn!(
                        "Index refresh from {} failed, keeping previous index: {}",
                        rules_path.display(),
                        e
                    );
                }
            }
            debug!("Next index refresh in {:?}", interval);
        }
    })
}
