//! Feature table writing.
//!
//! Both formats go to sibling temp files (`<name>.<ext>.tmp`) first. Only
//! when both are written and synced are they committed: existing outputs
//! move aside to `<name>.<ext>.bak`, the temps are renamed into place and
//! the backups are removed. A failed commit puts the backups back, so the
//! previous run's pair survives intact and no temp is left behind.

use std::ffi::OsString;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use polars::prelude::{CsvWriter, DataFrame, ParquetWriter, SerWriter};

use crate::error::{OutputError, Result};

/// Where the two copies of the feature table live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeaturePaths {
    pub parquet: PathBuf,
    pub csv: PathBuf,
}

/// Derive the Parquet and CSV paths from the configured output file.
///
/// The Parquet copy is written at `output` itself; the CSV copy swaps the
/// extension for `.csv`.
pub fn feature_paths(output: &Path) -> FeaturePaths {
    FeaturePaths {
        parquet: output.to_path_buf(),
        csv: output.with_extension("csv"),
    }
}

/// Sibling temp path: `features.parquet` becomes `features.parquet.tmp`.
pub fn temp_path(path: &Path) -> PathBuf {
    sibling(path, ".tmp")
}

/// Sibling backup path: `features.parquet` becomes `features.parquet.bak`.
pub fn backup_path(path: &Path) -> PathBuf {
    sibling(path, ".bak")
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

#[derive(Debug, Clone, Copy)]
enum Format {
    Parquet,
    Csv,
}

impl Format {
    fn name(self) -> &'static str {
        match self {
            Format::Parquet => "parquet",
            Format::Csv => "csv",
        }
    }
}

/// Write `df` as Parquet at `output` and as CSV alongside it.
///
/// Creates the output directory when needed. Existing outputs are replaced
/// only after both new files are complete.
pub fn write_feature_table(df: &mut DataFrame, output: &Path) -> Result<FeaturePaths> {
    let paths = feature_paths(output);
    if paths.csv == paths.parquet {
        return Err(OutputError::Io {
            operation: "choose distinct Parquet and CSV paths for",
            path: paths.parquet,
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "output file must not use the .csv extension",
            ),
        });
    }
    ensure_parent_dir(&paths.parquet)?;

    let parquet_tmp = temp_path(&paths.parquet);
    let csv_tmp = temp_path(&paths.csv);
    let temps = [parquet_tmp.as_path(), csv_tmp.as_path()];

    let written = write_temp(df, &parquet_tmp, Format::Parquet)
        .and_then(|()| write_temp(df, &csv_tmp, Format::Csv));
    if let Err(err) = written {
        remove_temps(&temps);
        return Err(err);
    }

    commit(&[
        (parquet_tmp.as_path(), paths.parquet.as_path()),
        (csv_tmp.as_path(), paths.csv.as_path()),
    ])?;

    tracing::info!(
        parquet = %paths.parquet.display(),
        csv = %paths.csv.display(),
        rows = df.height(),
        columns = df.width(),
        "wrote feature table"
    );
    Ok(paths)
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| OutputError::Io {
            operation: "create directory",
            path: parent.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

fn write_temp(df: &mut DataFrame, path: &Path, format: Format) -> Result<()> {
    let mut file = File::create(path).map_err(|source| OutputError::Io {
        operation: "create",
        path: path.to_path_buf(),
        source,
    })?;

    let polars_err = |err: polars::prelude::PolarsError| OutputError::Polars {
        format: format.name(),
        path: path.to_path_buf(),
        message: err.to_string(),
    };
    match format {
        Format::Parquet => {
            ParquetWriter::new(&mut file)
                .finish(df)
                .map_err(polars_err)?;
        }
        Format::Csv => {
            CsvWriter::new(&mut file)
                .include_header(true)
                .finish(df)
                .map_err(polars_err)?;
        }
    }

    file.sync_all().map_err(|source| OutputError::Io {
        operation: "sync",
        path: path.to_path_buf(),
        source,
    })
}

/// Move every temp onto its target, or none of them.
///
/// Each `(temp, target)` pair is renamed in order after any existing target
/// file has been moved to its backup path. On failure the targets already
/// replaced are restored from their backups and all temps are removed.
fn commit(pairs: &[(&Path, &Path)]) -> Result<()> {
    let temps: Vec<&Path> = pairs.iter().map(|(temp, _)| *temp).collect();
    let mut backups: Vec<(PathBuf, &Path)> = Vec::with_capacity(pairs.len());
    let mut committed: Vec<&Path> = Vec::with_capacity(pairs.len());

    for (temp, target) in pairs {
        if target.is_file() {
            let backup = backup_path(target);
            if let Err(source) = fs::rename(target, &backup) {
                rollback(&committed, &backups);
                remove_temps(&temps);
                return Err(OutputError::Io {
                    operation: "back up",
                    path: target.to_path_buf(),
                    source,
                });
            }
            backups.push((backup, *target));
        }
        if let Err(source) = fs::rename(temp, target) {
            rollback(&committed, &backups);
            remove_temps(&temps);
            return Err(OutputError::AtomicWriteFailed {
                temp_path: temp.to_path_buf(),
                target_path: target.to_path_buf(),
                source,
            });
        }
        committed.push(*target);
    }

    let backup_paths: Vec<&Path> = backups
        .iter()
        .map(|(backup, _)| backup.as_path())
        .collect();
    remove_temps(&backup_paths);
    Ok(())
}

/// Undo a partial commit: drop the new targets, then restore the backups.
fn rollback(committed: &[&Path], backups: &[(PathBuf, &Path)]) {
    remove_temps(committed);
    for (backup, target) in backups {
        if let Err(err) = fs::rename(backup, target) {
            tracing::error!(
                backup = %backup.display(),
                target = %target.display(),
                error = %err,
                "failed to restore previous output"
            );
        }
    }
}

fn remove_temps(paths: &[&Path]) {
    for path in paths {
        match fs::remove_file(path) {
            Ok(()) => tracing::debug!(path = %path.display(), "removed stale file"),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "failed to remove stale file");
            }
        }
    }
}
