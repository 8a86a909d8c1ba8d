//! Data-quality findings.
//!
//! Findings are never fatal. The affected rows are either passed through or
//! dropped as documented on each variant, and the run reports them.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use polars::prelude::DataFrame;

use icu_common::{any_to_i64, find_column};
use icu_model::{InputTable, SignalDictionary, columns};

use crate::error::{Result, TransformError};

/// One data-quality observation about the inputs.
#[derive(Debug, Clone, PartialEq)]
pub enum QualityFinding {
    /// Row with a blank stay or subject identifier; dropped.
    BlankIdentifier { table: InputTable, row: usize },
    /// Repeated stay identifier in the stays table; the first row is kept.
    DuplicateStay { stay_id: String, row: usize },
    /// Discharge before admission; passed through with negative `los_hours`.
    InvertedStay { stay_id: String, los_hours: f64 },
    /// Dictionary code with no entry in the item definitions table.
    UnknownItemCode { code: i64 },
}

impl QualityFinding {
    /// Short category name, used for grouping in summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            QualityFinding::BlankIdentifier { .. } => "blank identifier",
            QualityFinding::DuplicateStay { .. } => "duplicate stay",
            QualityFinding::InvertedStay { .. } => "inverted stay",
            QualityFinding::UnknownItemCode { .. } => "unknown item code",
        }
    }
}

impl fmt::Display for QualityFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualityFinding::BlankIdentifier { table, row } => {
                write!(f, "{table} row {row} has a blank identifier and was dropped")
            }
            QualityFinding::DuplicateStay { stay_id, row } => {
                write!(f, "stay {stay_id} repeated at row {row}; first row kept")
            }
            QualityFinding::InvertedStay { stay_id, los_hours } => {
                write!(
                    f,
                    "stay {stay_id} is discharged before admission (los_hours = {los_hours})"
                )
            }
            QualityFinding::UnknownItemCode { code } => {
                write!(f, "item code {code} is not defined in d_items")
            }
        }
    }
}

/// Findings collected over a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataQualityReport {
    findings: Vec<QualityFinding>,
}

impl DataQualityReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, finding: QualityFinding) {
        self.findings.push(finding);
    }

    pub fn extend(&mut self, findings: impl IntoIterator<Item = QualityFinding>) {
        self.findings.extend(findings);
    }

    pub fn findings(&self) -> &[QualityFinding] {
        &self.findings
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    /// Count of findings per kind, in kind order.
    pub fn counts(&self) -> Vec<(&'static str, usize)> {
        let kinds: BTreeSet<&'static str> = self.findings.iter().map(QualityFinding::kind).collect();
        kinds
            .into_iter()
            .map(|kind| {
                let count = self.findings.iter().filter(|f| f.kind() == kind).count();
                (kind, count)
            })
            .collect()
    }

    /// Emit one warning per finding.
    pub fn log(&self) {
        for finding in &self.findings {
            tracing::warn!(kind = finding.kind(), "{finding}");
        }
    }
}

/// Dictionary codes that the item definitions table does not define.
pub fn unknown_item_codes(items: &DataFrame, dictionary: &SignalDictionary) -> Result<Vec<i64>> {
    let column =
        find_column(items, columns::ITEMID).ok_or_else(|| TransformError::MissingColumn {
            table: InputTable::Items,
            column: columns::ITEMID.to_string(),
        })?;
    let series = column.as_materialized_series();
    let mut defined = HashSet::with_capacity(series.len());
    for idx in 0..series.len() {
        if let Some(code) = any_to_i64(series.get(idx)?) {
            defined.insert(code);
        }
    }
    Ok(dictionary
        .codes()
        .filter(|code| !defined.contains(code))
        .collect())
}
