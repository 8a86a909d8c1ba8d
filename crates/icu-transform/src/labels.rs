//! Outcome label merging.
//!
//! Each label table is left-joined onto the stay frame by subject, or by
//! subject and stay for stay-level labels. Several label rows for the same
//! key collapse to their maximum, so a flag reads as "any positive" and the
//! one-row-per-stay shape is preserved. What happens to stays with no label
//! is decided by a [`MissingLabelPolicy`].

use std::collections::HashMap;
use std::fmt;

use polars::prelude::{DataFrame, IntoColumn, NamedFrom, Series};

use icu_common::{any_to_f64, any_to_string_non_empty, column_strings, find_column};
use icu_model::{LabelKey, LabelKind, LabelSpec, columns};

use crate::coercion::CoercionReport;
use crate::error::{Result, TransformError};
use crate::frame::StayFrame;

/// What to do with a stay that has no label value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingLabelPolicy {
    /// Missing means a definite negative: fill with 0.
    FillNegative,
    /// Leave the value null.
    KeepNull,
    /// Remove the stay from the table.
    DropRow,
}

impl MissingLabelPolicy {
    /// Default policy for a label kind.
    pub fn for_kind(kind: LabelKind) -> Self {
        match kind {
            LabelKind::Binary => MissingLabelPolicy::FillNegative,
            LabelKind::Continuous => MissingLabelPolicy::KeepNull,
        }
    }

    /// Apply the policy to the joined values of one label.
    ///
    /// Binary labels come out as `Int32`, continuous labels as `Float64`.
    pub fn apply(self, name: &str, kind: LabelKind, values: &[Option<f64>]) -> LabelColumn {
        let filled: Vec<Option<f64>> = match self {
            MissingLabelPolicy::FillNegative => {
                values.iter().map(|v| Some(v.unwrap_or(0.0))).collect()
            }
            MissingLabelPolicy::KeepNull | MissingLabelPolicy::DropRow => values.to_vec(),
        };
        let keep = match self {
            MissingLabelPolicy::DropRow => Some(values.iter().map(Option::is_some).collect()),
            _ => None,
        };
        let series = match kind {
            LabelKind::Binary => Series::new(
                name.into(),
                filled
                    .iter()
                    .map(|v| v.map(|v| v.round() as i32))
                    .collect::<Vec<_>>(),
            ),
            LabelKind::Continuous => Series::new(name.into(), filled),
        };
        LabelColumn { series, keep }
    }
}

impl fmt::Display for MissingLabelPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MissingLabelPolicy::FillNegative => "fill-negative",
            MissingLabelPolicy::KeepNull => "keep-null",
            MissingLabelPolicy::DropRow => "drop-row",
        })
    }
}

/// Output of [`MissingLabelPolicy::apply`].
#[derive(Debug, Clone)]
pub struct LabelColumn {
    pub series: Series,
    /// Row mask when the policy removes stays.
    pub keep: Option<Vec<bool>>,
}

/// Counts from merging one label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMergeStats {
    pub label: String,
    /// Stays that found a label value.
    pub matched: usize,
    /// Stays without a label value, before the policy ran.
    pub missing: usize,
    /// Stays removed by the policy.
    pub dropped: usize,
}

type LabelLookup = HashMap<(String, Option<String>), f64>;

/// Left-join one label onto `frame` under `policy`.
pub fn merge_label(
    frame: &mut StayFrame,
    labels: &DataFrame,
    spec: &LabelSpec,
    policy: MissingLabelPolicy,
    report: &mut CoercionReport,
) -> Result<LabelMergeStats> {
    let lookup = build_lookup(labels, spec, report)?;

    let values: Vec<Option<f64>> = frame
        .stays
        .iter()
        .map(|stay| {
            let stay_key = match spec.key {
                LabelKey::Subject => None,
                LabelKey::SubjectStay => Some(stay.stay_id.as_str().to_string()),
            };
            lookup
                .get(&(stay.subject_id.as_str().to_string(), stay_key))
                .copied()
        })
        .collect();
    let matched = values.iter().filter(|v| v.is_some()).count();
    let missing = values.len() - matched;

    let LabelColumn { series, keep } = policy.apply(&spec.column, spec.kind, &values);
    frame.push_column(series.into_column())?;
    let dropped = match keep {
        Some(mask) => frame.retain(&mask)?,
        None => 0,
    };

    tracing::debug!(
        label = %spec.column,
        policy = %policy,
        matched,
        missing,
        dropped,
        "merged label"
    );

    Ok(LabelMergeStats {
        label: spec.column.clone(),
        matched,
        missing,
        dropped,
    })
}

fn build_lookup(
    labels: &DataFrame,
    spec: &LabelSpec,
    report: &mut CoercionReport,
) -> Result<LabelLookup> {
    let missing = |column: &str| TransformError::MissingTargetColumn {
        label: spec.column.clone(),
        table: spec.table,
        column: column.to_string(),
    };

    let subject_col =
        find_column(labels, columns::SUBJECT_ID).ok_or_else(|| missing(columns::SUBJECT_ID))?;
    let stay_col = match spec.key {
        LabelKey::Subject => None,
        LabelKey::SubjectStay => Some(
            find_column(labels, columns::STAY_ID).ok_or_else(|| missing(columns::STAY_ID))?,
        ),
    };
    let value_col = find_column(labels, &spec.column).ok_or_else(|| missing(&spec.column))?;

    let subjects = column_strings(subject_col)?;
    let stays = match stay_col {
        Some(column) => Some(column_strings(column)?),
        None => None,
    };
    let values = value_col.as_materialized_series();

    let mut lookup = LabelLookup::with_capacity(labels.height());
    for row in 0..labels.height() {
        let Some(subject) = subjects[row].clone() else {
            continue;
        };
        let stay = match &stays {
            Some(stays) => match &stays[row] {
                Some(stay) => Some(stay.clone()),
                None => continue,
            },
            None => None,
        };
        let raw = values.get(row)?;
        let value = match any_to_f64(raw.clone()) {
            Some(value) => value,
            None => {
                if let Some(text) = any_to_string_non_empty(raw) {
                    report.record(spec.table, &spec.column, &text);
                }
                continue;
            }
        };
        lookup
            .entry((subject, stay))
            .and_modify(|current| *current = current.max(value))
            .or_insert(value);
    }
    Ok(lookup)
}
