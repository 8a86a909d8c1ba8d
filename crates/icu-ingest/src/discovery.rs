//! Input directory discovery.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use icu_model::InputTable;

use crate::error::{IngestError, Result};

/// Which declared tables are present in an input directory.
#[derive(Debug, Clone, Default)]
pub struct InputInventory {
    pub present: BTreeSet<InputTable>,
    /// CSV files in the directory that are not a declared table.
    pub unrecognized: Vec<PathBuf>,
}

impl InputInventory {
    /// Required tables that are absent, in declaration order.
    pub fn missing_required(&self) -> Vec<InputTable> {
        InputTable::required()
            .filter(|table| !self.present.contains(table))
            .collect()
    }
}

/// Path of a declared table inside the input directory.
pub fn table_path(input_dir: &Path, table: InputTable) -> PathBuf {
    input_dir.join(table.file_name())
}

/// Lists all CSV files in a directory.
///
/// Returns files sorted by filename.
pub fn list_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let mut files = Vec::new();

    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;

    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

        if is_csv {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    Ok(files)
}

/// Classify the CSV files of `input_dir` against the declared tables.
pub fn discover_inputs(input_dir: &Path) -> Result<InputInventory> {
    let mut inventory = InputInventory::default();
    for path in list_csv_files(input_dir)? {
        let name = path
            .file_name()
            .and_then(|v| v.to_str())
            .unwrap_or_default();
        match InputTable::ALL
            .into_iter()
            .find(|table| table.file_name() == name)
        {
            Some(table) => {
                inventory.present.insert(table);
            }
            None => inventory.unrecognized.push(path),
        }
    }
    Ok(inventory)
}

/// Fail fast unless every required table exists.
///
/// Every missing table is logged; the error names the first one.
pub fn check_inputs(input_dir: &Path) -> Result<InputInventory> {
    let inventory = discover_inputs(input_dir)?;
    let missing = inventory.missing_required();
    for table in &missing {
        tracing::error!(
            table = %table,
            path = %table_path(input_dir, *table).display(),
            "required input table is missing"
        );
    }
    if let Some(table) = missing.first() {
        return Err(IngestError::MissingInput {
            table: *table,
            path: table_path(input_dir, *table),
        });
    }
    for path in &inventory.unrecognized {
        tracing::debug!(path = %path.display(), "ignoring unrecognized csv file");
    }
    Ok(inventory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_dir(names: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for name in names {
            std::fs::write(dir.path().join(name), "a\n1\n").unwrap();
        }
        dir
    }

    #[test]
    fn test_list_csv_files_sorted() {
        let dir = create_test_dir(&["b.csv", "a.CSV", "notes.txt"]);
        let files = list_csv_files(dir.path()).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("a.CSV"));
    }

    #[test]
    fn test_list_csv_files_not_a_directory() {
        let dir = TempDir::new().unwrap();
        let file_path = dir.path().join("x.csv");
        std::fs::write(&file_path, "data").unwrap();
        assert!(matches!(
            list_csv_files(&file_path),
            Err(IngestError::DirectoryNotFound { .. })
        ));
    }

    #[test]
    fn test_check_inputs_reports_first_missing_table() {
        let dir = create_test_dir(&["patients.csv", "chartevents.csv", "extra.csv"]);
        let err = check_inputs(dir.path()).unwrap_err();
        match err {
            IngestError::MissingInput { table, path } => {
                assert_eq!(table, InputTable::Stays);
                assert!(path.ends_with("icustays.csv"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_check_inputs_accepts_missing_optional_items() {
        let dir = create_test_dir(&[
            "patients.csv",
            "icustays.csv",
            "chartevents.csv",
            "admissions.csv",
            "sepsis_labels.csv",
            "readmission_labels.csv",
            "extra.csv",
        ]);
        let inventory = check_inputs(dir.path()).unwrap();
        assert!(!inventory.present.contains(&InputTable::Items));
        assert!(inventory.present.contains(&InputTable::Observations));
        assert_eq!(inventory.unrecognized.len(), 1);
    }
}
