//! MarketBasket Engine
//!
//! Batch pipeline binary: load and validate customer baskets, mine frequent
//! itemsets, generate and curate association rules, export them for the
//! serving side, and print sample recommendations.

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use marketbasket::config::Config;
use marketbasket::export;
use marketbasket::mining::MiningPipeline;
use marketbasket::recommendation::RecommendationEngine;
use marketbasket::transactions::{self, BasketStats, ItemCatalog, PopularityRanking};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("═══════════════════════════════════════════════════════════════");
    info!("  🛒 MarketBasket Engine v{}", env!("CARGO_PKG_VERSION"));
    info!("═══════════════════════════════════════════════════════════════");

    // Phase 1 — configuration
    let config = Config::from_env()?;

    // Phase 2 — data loading and validation
    info!("Phase 1: Data loading and validation");
    let catalog = ItemCatalog::new(config.data.item_id_min, config.data.item_id_max);
    let transactions = transactions::load_baskets(
        &config.data.baskets_path,
        &catalog,
        config.data.strict_items,
    )
    .with_context(|| {
        format!(
            "failed to load baskets from {}",
            config.data.baskets_path.display()
        )
    })?;

    let stats = BasketStats::compute(&transactions);
    info!("Transactions loaded: {}", stats.transactions);
    info!("Distinct items: {}", stats.distinct_items);
    info!(
        "Basket size: mean {:.2}, median {:.1}, range {}-{}",
        stats.mean_size, stats.median_size, stats.min_size, stats.max_size
    );

    // Phase 3 — mining, rule generation, curation
    info!("Phase 2: Association rule mining");
    let curated = MiningPipeline::new(config.mining.clone()).run(&transactions)?;
    if curated.is_empty() {
        warn!("No rules survived curation; recommendations will be popularity only");
    }

    // Phase 4 — export for the persistence/serving layer
    info!("Phase 3: Rule export");
    export::save_rules(&config.data.rules_path, &curated)?;

    // Phase 5 — sample recommendations against the freshly built index
    info!("Phase 4: Sample recommendations");
    let popularity = PopularityRanking::from_transactions(&transactions);
    let engine = RecommendationEngine::build(curated, popularity);

    for basket in sample_baskets(&transactions) {
        let recs = engine.recommend(&basket, config.recommend.top_n);
        info!("Basket {:?}:", basket);
        for rec in recs {
            info!(
                "  → item {:<4} confidence={:.3} lift={:.3} zhang={:.3}",
                rec.item, rec.confidence, rec.lift, rec.zhang
            );
        }
    }

    // Optional serve mode: keep running and pick up recomputed rule files
    if std::env::var("RULES_WATCH").map(|v| v == "true").unwrap_or(false) {
        info!(
            "Watching {} for recomputed rules (refresh every {:?})",
            config.data.rules_path.display(),
            config.recommend.refresh_interval
        );
        let refresher = marketbasket::recommendation::updater::spawn_index_refresher(
            engine.shared_index(),
            config.data.rules_path.clone(),
            config.recommend.refresh_interval,
        );
        tokio::signal::ctrl_c()
            .await
            .context("failed to install Ctrl+C handler")?;
        info!("📴 Shutdown signal received");
        refresher.abort();
    }

    info!("✅ Pipeline complete");
    Ok(())
}

/// A few representative baskets for the demo pass: the first transaction and
/// the empty basket (cold-start path)
fn sample_baskets(transactions: &[marketbasket::Transaction]) -> Vec<Vec<u32>> {
    let mut samples = Vec::new();
    if let Some(first) = transactions.first() {
        samples.push(first.items().to_vec());
    }
    samples.push(Vec::new());
    samples
}

/// Initialize structured logging with tracing
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("marketbasket=debug,info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .with_ansi(std::env::var("NO_COLOR").is_err()),
        )
        .init();
}
