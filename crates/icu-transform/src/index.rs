//! Subject-bucketed, time-sorted observation index.
//!
//! Observations are bucketed by subject once and each bucket is sorted by
//! chart time, so a window lookup is two binary searches and a slice instead
//! of a scan over every observation.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use polars::prelude::DataFrame;

use icu_common::{any_to_i64, column_strings, parse_f64, parse_timestamp};
use icu_model::{InputTable, Observation, SignalDictionary, SubjectId, columns};

use crate::coercion::CoercionReport;
use crate::error::Result;
use crate::frame::require_column;

/// One indexed observation; the subject is implied by its bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartPoint {
    pub charted_at: NaiveDateTime,
    pub item_code: i64,
    pub value: f64,
}

/// Counts from building an index out of a raw table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    /// Raw rows read.
    pub rows: usize,
    /// Rows kept in the index.
    pub indexed: usize,
    /// Rows whose instrument code is not in the dictionary.
    pub unmapped: usize,
    /// Rows dropped for a blank subject, code, time or value.
    pub unusable: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ObservationIndex {
    buckets: HashMap<SubjectId, Vec<ChartPoint>>,
    len: usize,
}

impl ObservationIndex {
    /// Build from coerced observations. Each bucket ends sorted by time.
    pub fn build(observations: impl IntoIterator<Item = Observation>) -> Self {
        let mut buckets: HashMap<SubjectId, Vec<ChartPoint>> = HashMap::new();
        let mut len = 0;
        for obs in observations {
            buckets.entry(obs.subject_id).or_default().push(ChartPoint {
                charted_at: obs.charted_at,
                item_code: obs.item_code,
                value: obs.value,
            });
            len += 1;
        }
        for bucket in buckets.values_mut() {
            bucket.sort_by_key(|point| point.charted_at);
        }
        Self { buckets, len }
    }

    /// Build from the raw observations table.
    ///
    /// Codes outside `dictionary` are dropped before any value parsing.
    /// Unparseable times and values are counted in `report` and dropped.
    pub fn from_frame(
        observations: &DataFrame,
        dictionary: &SignalDictionary,
        report: &mut CoercionReport,
    ) -> Result<(Self, IndexStats)> {
        let table = InputTable::Observations;
        let subjects = column_strings(require_column(observations, table, columns::SUBJECT_ID)?)?;
        let item_col = require_column(observations, table, columns::ITEMID)?;
        let times = column_strings(require_column(observations, table, columns::CHARTTIME)?)?;
        let values = column_strings(require_column(observations, table, columns::VALUENUM)?)?;
        let items = item_col.as_materialized_series();

        let mut stats = IndexStats {
            rows: observations.height(),
            ..IndexStats::default()
        };
        let mut kept = Vec::new();
        for row in 0..observations.height() {
            let Some(code) = any_to_i64(items.get(row)?) else {
                stats.unusable += 1;
                continue;
            };
            if !dictionary.contains(code) {
                stats.unmapped += 1;
                continue;
            }
            let Some(subject) = subjects[row].as_deref() else {
                stats.unusable += 1;
                continue;
            };
            let charted_at = match times[row].as_deref() {
                Some(raw) => {
                    let parsed = parse_timestamp(raw);
                    if parsed.is_none() {
                        report.record(table, columns::CHARTTIME, raw);
                    }
                    parsed
                }
                None => None,
            };
            let value = match values[row].as_deref() {
                Some(raw) => {
                    let parsed = parse_f64(raw);
                    if parsed.is_none() {
                        report.record(table, columns::VALUENUM, raw);
                    }
                    parsed
                }
                None => None,
            };
            let (Some(charted_at), Some(value)) = (charted_at, value) else {
                stats.unusable += 1;
                continue;
            };
            kept.push(Observation {
                subject_id: SubjectId::new(subject)?,
                item_code: code,
                charted_at,
                value,
            });
        }
        stats.indexed = kept.len();

        tracing::debug!(
            rows = stats.rows,
            indexed = stats.indexed,
            unmapped = stats.unmapped,
            unusable = stats.unusable,
            "built observation index"
        );
        Ok((Self::build(kept), stats))
    }

    /// Observations of `subject` charted in `[start, end)`, in time order.
    pub fn query(
        &self,
        subject: &SubjectId,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> &[ChartPoint] {
        let Some(bucket) = self.buckets.get(subject) else {
            return &[];
        };
        if end <= start {
            return &[];
        }
        let lo = bucket.partition_point(|point| point.charted_at < start);
        let hi = bucket.partition_point(|point| point.charted_at < end);
        &bucket[lo..hi]
    }

    /// Total number of indexed observations.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn subject_count(&self) -> usize {
        self.buckets.len()
    }
}
