//! Error types for raw table ingestion.

use std::path::PathBuf;

use icu_model::InputTable;
use thiserror::Error;

/// Errors that can occur while loading raw tables.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// A required source table is absent from the input directory.
    #[error("missing input table '{table}': {path} does not exist")]
    MissingInput { table: InputTable, path: PathBuf },

    /// Input directory not found or not a directory.
    #[error("input directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Failed to read directory entries.
    #[error("failed to read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File uses an encoding the reader does not support.
    #[error("unsupported encoding {encoding} in {path}")]
    UnsupportedEncoding {
        path: PathBuf,
        encoding: &'static str,
    },

    // === CSV Parsing Errors ===
    /// Failed to parse CSV with Polars.
    #[error("failed to parse CSV {path}: {message}")]
    CsvParse { path: PathBuf, message: String },

    /// A loaded table lacks a column the pipeline reads.
    #[error("{table} table is missing required column '{column}'")]
    MissingColumn { table: InputTable, column: String },

    /// CSV file has no header row.
    #[error("CSV file is empty: {path}")]
    EmptyCsv { path: PathBuf },
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
