//! Feature table output.
//!
//! Writes the stay-level feature table as Parquet and CSV with atomic
//! replacement of any previous run's files.

mod error;
mod writer;

pub use error::{OutputError, Result};
pub use writer::{FeaturePaths, backup_path, feature_paths, temp_path, write_feature_table};
