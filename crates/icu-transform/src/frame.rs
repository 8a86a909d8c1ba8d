//! Stay-aligned frame type.
//!
//! [`StayFrame`] pairs the stay-level DataFrame with the typed [`Stay`]
//! records of its rows, in the same order. Every operation that adds or
//! removes rows keeps the two aligned, which is what lets label merging and
//! window aggregation work on typed keys while the table keeps the dtypes it
//! was loaded with.

use std::collections::HashMap;

use polars::prelude::{
    BooleanChunked, Column, DataFrame, IdxCa, IdxSize, IntoColumn, NewChunkedArray,
};

use icu_common::{any_to_string_non_empty, find_column};
use icu_model::{InputTable, Stay, columns};

use crate::error::{Result, TransformError};

/// The stay-level table and its typed rows.
#[derive(Debug, Clone)]
pub struct StayFrame {
    /// One row per stay, `icustay_id` first.
    pub data: DataFrame,
    /// Typed stays, aligned with `data` row for row.
    pub stays: Vec<Stay>,
}

impl StayFrame {
    pub fn new(data: DataFrame, stays: Vec<Stay>) -> Self {
        debug_assert_eq!(data.height(), stays.len());
        Self { data, stays }
    }

    /// Returns the number of stays in the frame.
    pub fn height(&self) -> usize {
        self.stays.len()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.data
            .get_column_names()
            .into_iter()
            .map(ToString::to_string)
            .collect()
    }

    /// Append a column that is already aligned with the stays.
    pub fn push_column(&mut self, column: Column) -> Result<()> {
        if self.data.column(column.name().as_str()).is_ok() {
            return Err(TransformError::DuplicateColumn {
                column: column.name().to_string(),
            });
        }
        self.data.with_column(column)?;
        Ok(())
    }

    /// Keep only the rows where `keep` is true. Returns the number removed.
    pub fn retain(&mut self, keep: &[bool]) -> Result<usize> {
        debug_assert_eq!(keep.len(), self.stays.len());
        let before = self.stays.len();
        let mask = BooleanChunked::from_slice("keep".into(), keep);
        self.data = self.data.filter(&mask)?;
        let mut flags = keep.iter();
        self.stays.retain(|_| flags.next().copied().unwrap_or(false));
        Ok(before - self.stays.len())
    }

    /// Left-join every non-key column of `other` onto this frame by stay
    /// identifier.
    ///
    /// Stays with no row in `other` get nulls. When `other` repeats a stay
    /// identifier the first row wins. Row count and order never change.
    pub fn join_by_stay(&mut self, other: &DataFrame) -> Result<()> {
        let key = find_column(other, columns::STAY_ID).ok_or_else(|| {
            TransformError::MissingJoinKey {
                column: columns::STAY_ID.to_string(),
            }
        })?;
        let key_name = key.name().clone();
        let key_series = key.as_materialized_series();

        let mut rows: HashMap<String, IdxSize> = HashMap::with_capacity(other.height());
        for idx in 0..key_series.len() {
            if let Some(id) = any_to_string_non_empty(key_series.get(idx)?) {
                rows.entry(id).or_insert(idx as IdxSize);
            }
        }

        let positions = IdxCa::from_iter_options(
            "rows".into(),
            self.stays
                .iter()
                .map(|stay| rows.get(stay.stay_id.as_str()).copied()),
        );

        for column in other.get_columns() {
            if column.name() == &key_name {
                continue;
            }
            let gathered = column.as_materialized_series().take(&positions)?;
            self.push_column(gathered.into_column())?;
        }
        Ok(())
    }
}

/// Look up a required column, matching names case-insensitively.
pub fn require_column<'a>(df: &'a DataFrame, table: InputTable, name: &str) -> Result<&'a Column> {
    find_column(df, name).ok_or_else(|| TransformError::MissingColumn {
        table,
        column: name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use icu_model::{StayId, SubjectId};
    use polars::prelude::{AnyValue, NamedFrom, Series};

    fn stay(id: &str) -> Stay {
        Stay {
            stay_id: StayId::new(id).unwrap(),
            subject_id: SubjectId::new("P1").unwrap(),
            admission: None,
            discharge: None,
        }
    }

    fn frame(ids: &[i64]) -> StayFrame {
        let data = DataFrame::new(vec![
            Series::new(columns::STAY_ID.into(), ids.to_vec()).into(),
        ])
        .unwrap();
        let stays = ids.iter().map(|id| stay(&id.to_string())).collect();
        StayFrame::new(data, stays)
    }

    #[test]
    fn join_by_stay_preserves_rows_and_fills_null() {
        let mut base = frame(&[10, 20, 30]);
        let other = DataFrame::new(vec![
            Series::new(columns::STAY_ID.into(), vec![30i64, 10, 10]).into(),
            Series::new("HeartRate_mean".into(), vec![Some(70.0f64), Some(80.0), Some(99.0)])
                .into(),
        ])
        .unwrap();

        base.join_by_stay(&other).unwrap();

        assert_eq!(base.height(), 3);
        let column = base.data.column("HeartRate_mean").unwrap();
        assert_eq!(column.get(0).unwrap(), AnyValue::Float64(80.0));
        assert_eq!(column.get(1).unwrap(), AnyValue::Null);
        assert_eq!(column.get(2).unwrap(), AnyValue::Float64(70.0));
    }

    #[test]
    fn join_by_stay_rejects_duplicate_columns() {
        let mut base = frame(&[1]);
        base.push_column(Series::new("x".into(), vec![1i32]).into_column())
            .unwrap();
        let other = DataFrame::new(vec![
            Series::new(columns::STAY_ID.into(), vec![1i64]).into(),
            Series::new("x".into(), vec![2i32]).into(),
        ])
        .unwrap();
        assert!(matches!(
            base.join_by_stay(&other),
            Err(TransformError::DuplicateColumn { .. })
        ));
    }

    #[test]
    fn retain_keeps_stays_aligned() {
        let mut base = frame(&[1, 2, 3]);
        let removed = base.retain(&[true, false, true]).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(base.data.height(), 2);
        assert_eq!(base.stays[1].stay_id.as_str(), "3");
        assert_eq!(base.stays[0].stay_id.as_str(), "1");
    }

    #[test]
    fn require_column_reports_table() {
        let df = frame(&[1]).data;
        let err = require_column(&df, InputTable::Stays, columns::INTIME).unwrap_err();
        assert!(matches!(
            err,
            TransformError::MissingColumn { table: InputTable::Stays, .. }
        ));
    }
}
