//! Column names of the raw inputs and of the published feature table.
//!
//! The output names are a public contract: the training jobs select them by
//! name, so changing any of them is a breaking change.

/// Subject identifier, shared by every input table.
pub const SUBJECT_ID: &str = "subject_id";
/// ICU stay identifier.
pub const STAY_ID: &str = "icustay_id";

// patients.csv
pub const ANCHOR_AGE: &str = "anchor_age";
pub const GENDER: &str = "gender";

// icustays.csv
pub const INTIME: &str = "intime";
pub const OUTTIME: &str = "outtime";

// chartevents.csv
pub const ITEMID: &str = "itemid";
pub const CHARTTIME: &str = "charttime";
pub const VALUENUM: &str = "valuenum";

// d_items.csv
pub const ITEM_LABEL: &str = "label";

// Output-only columns.
pub const AGE: &str = "age";
pub const LOS_HOURS: &str = "los_hours";

// Label columns.
pub const HOSPITAL_EXPIRE_FLAG: &str = "hospital_expire_flag";
pub const SEPSIS_SHOCK_RESPFAIL_FLAG: &str = "sepsis_shock_respfail_flag";
pub const READMISSION_FLAG: &str = "readmission_flag";

/// Static columns of the feature table, in output order.
pub const STATIC_COLUMNS: [&str; 7] = [STAY_ID, SUBJECT_ID, AGE, GENDER, INTIME, OUTTIME, LOS_HOURS];

/// Columns the downstream training jobs read; the pipeline refuses to write
/// a table without them.
pub const REQUIRED_OUTPUT_COLUMNS: [&str; 6] = [
    STAY_ID,
    SUBJECT_ID,
    LOS_HOURS,
    HOSPITAL_EXPIRE_FLAG,
    SEPSIS_SHOCK_RESPFAIL_FLAG,
    READMISSION_FLAG,
];
