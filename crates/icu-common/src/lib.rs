//! Shared utilities for the ICU feature crates.
//!
//! This crate provides the total value coercions used across the workspace:
//! Polars `AnyValue` conversions and timestamp parsing.

pub mod datetime;
pub mod values;

pub use datetime::{TIMESTAMP_FORMAT, format_timestamp, parse_timestamp};
pub use values::{
    any_to_f64, any_to_i64, any_to_string, any_to_string_non_empty, column_strings, find_column,
    format_numeric, parse_f64, parse_i64,
};
