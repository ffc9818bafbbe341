//! Curated-rule persistence
//!
//! Each rule is one CSV record: `;`-joined antecedent ids, `;`-joined
//! consequent ids, then support, confidence, lift, and zhang in that order.
//! Re-imported rules must satisfy the same invariants as freshly generated
//! ones; a corrupt record fails the whole load with the offending line
//! rather than being silently coerced.
//!
//! Writes go through a temp file in the target directory and are persisted
//! atomically, so a crashed export never leaves a half-written rule set for
//! the index refresher to pick up.

use crate::error::{Error, Result};
use crate::mining::generator::Rule;
use crate::transactions::ItemId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Separator between item ids within one side of a rule
const ITEM_SEPARATOR: char = ';';

/// On-disk record shape for one rule
#[derive(Debug, Serialize, Deserialize)]
struct RuleRecord {
    antecedent: String,
    consequent: String,
    support: f64,
    confidence: f64,
    lift: f64,
    zhang: f64,
}

impl From<&Rule> for RuleRecord {
    fn from(rule: &Rule) -> Self {
        Self {
            antecedent: join_items(&rule.antecedent),
            consequent: join_items(&rule.consequent),
            support: rule.support,
            confidence: rule.confidence,
            lift: rule.lift,
            zhang: rule.zhang,
        }
    }
}

/// Sidecar metadata written next to the rule file
#[derive(Debug, Serialize, Deserialize)]
pub struct RuleManifest {
    pub exported_at: DateTime<Utc>,
    pub rule_count: usize,
}

/// Export curated rules atomically to `path`, plus a JSON manifest at
/// `<path>.manifest.json`
pub fn save_rules(path: &Path, rules: &[Rule]) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;

    let tmp = tempfile::NamedTempFile::new_in(dir)?;
    {
        let mut writer = csv::Writer::from_writer(&tmp);
        for rule in rules {
            writer.serialize(RuleRecord::from(rule))?;
        }
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;

    let manifest = RuleManifest {
        exported_at: Utc::now(),
        rule_count: rules.len(),
    };
    let manifest_path = manifest_path_for(path);
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(serde_json::to_string_pretty(&manifest)?.as_bytes())?;
    tmp.persist(&manifest_path).map_err(|e| Error::Io(e.error))?;

    info!("Exported {} rules to {}", rules.len(), path.display());
    Ok(())
}

/// Import rules, re-validating every invariant and failing fast on the first
/// corrupt record
pub fn load_rules(path: &Path) -> Result<Vec<Rule>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rules = Vec::new();

    for (idx, record) in reader.deserialize::<RuleRecord>().enumerate() {
        let line = idx + 2;
        let location = || format!("{}:{}", path.display(), line);

        let record = record.map_err(|e| Error::malformed(location(), e.to_string()))?;

        let rule = Rule {
            antecedent: parse_items(&record.antecedent)
                .map_err(|e| Error::malformed(location(), e))?,
            consequent: parse_items(&record.consequent)
                .map_err(|e| Error::malformed(location(), e))?,
            support: record.support,
            confidence: record.confidence,
            lift: record.lift,
            zhang: record.zhang,
        };
        rule.validate()
            .map_err(|e| Error::malformed(location(), e))?;
        rules.push(rule);
    }

    info!("Imported {} rules from {}", rules.len(), path.display());
    Ok(rules)
}

fn manifest_path_for(path: &Path) -> std::path::PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".manifest.json");
    os.into()
}

fn join_items(items: &[ItemId]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(&ITEM_SEPARATOR.to_string())
}

/// Parse `"1;3"` into sorted unique item ids
fn parse_items(field: &str) -> std::result::Result<Vec<ItemId>, String> {
    let mut items = Vec::new();
    for part in field.split(ITEM_SEPARATOR) {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let item: ItemId = part
            .parse()
            .map_err(|_| format!("invalid item id '{}'", part))?;
        items.push(item);
    }
    let before = items.len();
    items.sort_unstable();
    items.dedup();
    if items.len() != before {
        return Err(format!("duplicate item ids in '{}'", field));
    }
    Ok(items)
}
