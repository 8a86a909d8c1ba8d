//! Loading declared tables by identity.

use std::path::Path;

use polars::prelude::DataFrame;

use icu_model::InputTable;

use crate::csv::read_csv_table;
use crate::discovery::table_path;
use crate::error::{IngestError, Result};

/// Load one declared table from the input directory.
///
/// No filtering and no column checks happen here; consumers validate the
/// columns they need.
pub fn load_table(input_dir: &Path, table: InputTable) -> Result<DataFrame> {
    let path = table_path(input_dir, table);
    if !path.is_file() {
        return Err(IngestError::MissingInput { table, path });
    }
    let _span = tracing::debug_span!("load_table", table = %table).entered();
    let df = read_csv_table(&path)?;
    tracing::info!(
        table = %table,
        rows = df.height(),
        columns = df.width(),
        "loaded table"
    );
    Ok(df)
}

/// Check that a loaded table carries the given columns.
///
/// Names match exactly first, then case-insensitively. The first missing
/// column is reported.
pub fn require_columns(df: &DataFrame, table: InputTable, columns: &[&str]) -> Result<()> {
    for column in columns {
        let present = df.get_column_names().iter().any(|name| {
            name.as_str() == *column || name.as_str().eq_ignore_ascii_case(column)
        });
        if !present {
            return Err(IngestError::MissingColumn {
                table,
                column: (*column).to_string(),
            });
        }
    }
    Ok(())
}

/// Load a table that may legitimately be absent.
pub fn load_optional_table(input_dir: &Path, table: InputTable) -> Result<Option<DataFrame>> {
    match load_table(input_dir, table) {
        Ok(df) => Ok(Some(df)),
        Err(IngestError::MissingInput { .. }) => {
            tracing::debug!(table = %table, "optional table not present");
            Ok(None)
        }
        Err(other) => Err(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_table_missing_input() {
        let dir = TempDir::new().unwrap();
        let err = load_table(dir.path(), InputTable::Patients).unwrap_err();
        assert!(matches!(
            err,
            IngestError::MissingInput {
                table: InputTable::Patients,
                ..
            }
        ));
    }

    #[test]
    fn test_load_table_reads_declared_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("patients.csv"),
            "subject_id,anchor_age,gender\n1,65,M\n2,70,F\n",
        )
        .unwrap();
        let df = load_table(dir.path(), InputTable::Patients).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 3);
    }

    #[test]
    fn test_require_columns_names_first_missing() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("icustays.csv"),
            "ICUSTAY_ID,subject_id,intime\n1,1,2024-01-01 00:00:00\n",
        )
        .unwrap();
        let df = load_table(dir.path(), InputTable::Stays).unwrap();
        let err = require_columns(&df, InputTable::Stays, InputTable::Stays.required_columns())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "stays table is missing required column 'outtime'"
        );
    }

    #[test]
    fn test_load_optional_table_absent() {
        let dir = TempDir::new().unwrap();
        assert!(
            load_optional_table(dir.path(), InputTable::Items)
                .unwrap()
                .is_none()
        );
    }
}
