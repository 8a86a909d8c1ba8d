//! Stay-level feature derivation.
//!
//! - **static_features**: one row per stay with demographics and length of stay
//! - **index**: subject-bucketed, time-sorted chart observations
//! - **vitals**: windowed mean/max per signal
//! - **labels**: outcome label merging under an explicit missing-value policy
//! - **quality**: non-fatal data-quality findings
//! - **coercion**: counts of values that failed numeric or timestamp coercion

pub mod coercion;
pub mod error;
pub mod frame;
pub mod index;
pub mod labels;
pub mod quality;
pub mod static_features;
pub mod vitals;

pub use coercion::{CoercionEntry, CoercionReport};
pub use error::{Result, TransformError};
pub use frame::{StayFrame, require_column};
pub use index::{ChartPoint, IndexStats, ObservationIndex};
pub use labels::{LabelColumn, LabelMergeStats, MissingLabelPolicy, merge_label};
pub use quality::{DataQualityReport, QualityFinding, unknown_item_codes};
pub use static_features::{StaticFeatures, extract_static_features};
pub use vitals::{SignalCoverage, VitalsTable, aggregate_vitals};
