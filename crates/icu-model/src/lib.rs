//! Data model for the ICU stay feature pipeline.
//!
//! - **ids**: canonical subject and stay identifiers
//! - **records**: typed stays, observations and the time window
//! - **signal**: the item dictionary (instrument code to signal name)
//! - **label**: outcome label declarations
//! - **table**: declared identities of the raw input tables
//! - **columns**: raw and published column names

pub mod columns;
pub mod error;
pub mod ids;
pub mod label;
pub mod records;
pub mod signal;
pub mod table;

pub use error::{ModelError, Result};
pub use ids::{StayId, SubjectId};
pub use label::{LabelKey, LabelKind, LabelSpec, default_label_specs};
pub use records::{DEFAULT_WINDOW_HOURS, Observation, Stay, TimeWindow, WindowLength};
pub use signal::{DEFAULT_VITAL_ITEMS, Signal, SignalDictionary, parse_item_code};
pub use table::InputTable;
