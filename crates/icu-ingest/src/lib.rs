//! Raw table ingestion for the ICU feature pipeline.
//!
//! This crate reads the raw clinical tables (patients, stays, chart events,
//! admissions, label tables) from an input directory into Polars
//! DataFrames. It performs no filtering and no joins.
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use icu_ingest::{check_inputs, load_table};
//! use icu_model::InputTable;
//!
//! let input_dir = Path::new("data/raw");
//! check_inputs(input_dir)?;
//! let stays = load_table(input_dir, InputTable::Stays)?;
//! ```

mod csv;
mod discovery;
mod error;
mod loader;

// === Error Types ===
pub use error::{IngestError, Result};

// === CSV Reading ===
pub use csv::{read_csv_table, validate_encoding};

// === Input Discovery ===
pub use discovery::{InputInventory, check_inputs, discover_inputs, list_csv_files, table_path};

// === Table Loading ===
pub use loader::{load_optional_table, load_table, require_columns};
