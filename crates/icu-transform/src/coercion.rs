//! Counting of values that failed numeric or timestamp coercion.
//!
//! Coercion failures are never fatal: the value becomes null and is
//! recorded here, so data quality stays visible without halting the batch.

use std::collections::BTreeMap;

use icu_model::InputTable;

/// Sample values kept per column.
const MAX_SAMPLES: usize = 3;

/// Failures recorded for one (table, column) pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoercionEntry {
    pub count: usize,
    /// First distinct raw values that failed.
    pub samples: Vec<String>,
}

/// Aggregated coercion warnings for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoercionReport {
    entries: BTreeMap<(InputTable, String), CoercionEntry>,
}

impl CoercionReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one raw value that could not be coerced.
    pub fn record(&mut self, table: InputTable, column: &str, raw: &str) {
        let entry = self
            .entries
            .entry((table, column.to_string()))
            .or_default();
        entry.count += 1;
        let raw = raw.trim();
        if entry.samples.len() < MAX_SAMPLES && !entry.samples.iter().any(|s| s == raw) {
            entry.samples.push(raw.to_string());
        }
    }

    pub fn count(&self, table: InputTable, column: &str) -> usize {
        self.entries
            .get(&(table, column.to_string()))
            .map_or(0, |entry| entry.count)
    }

    pub fn total(&self) -> usize {
        self.entries.values().map(|entry| entry.count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (InputTable, &str, &CoercionEntry)> {
        self.entries
            .iter()
            .map(|((table, column), entry)| (*table, column.as_str(), entry))
    }
}
