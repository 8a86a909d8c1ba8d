//! Error types for feature derivation.

use icu_model::InputTable;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransformError {
    /// An input table lacks a column the extractor needs.
    #[error("{table} table is missing required column '{column}'")]
    MissingColumn { table: InputTable, column: String },

    /// A label table lacks its key or value column.
    #[error("label '{label}': {table} table is missing column '{column}'")]
    MissingTargetColumn {
        label: String,
        table: InputTable,
        column: String,
    },

    /// Attaching columns would overwrite an existing one.
    #[error("column '{column}' already exists in the stay table")]
    DuplicateColumn { column: String },

    /// A frame to attach has no stay identifier column.
    #[error("frame to attach has no '{column}' column")]
    MissingJoinKey { column: String },

    #[error(transparent)]
    Model(#[from] icu_model::ModelError),

    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for TransformError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TransformError>;
