//! Declared identities of the raw input tables.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::columns;

/// One of the raw tables the pipeline reads from the input directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputTable {
    Patients,
    Stays,
    Observations,
    Admissions,
    SepsisLabels,
    ReadmissionLabels,
    /// Item definitions, used only to cross-check the signal dictionary.
    Items,
}

impl InputTable {
    pub const ALL: [InputTable; 7] = [
        InputTable::Patients,
        InputTable::Stays,
        InputTable::Observations,
        InputTable::Admissions,
        InputTable::SepsisLabels,
        InputTable::ReadmissionLabels,
        InputTable::Items,
    ];

    /// File name inside the input directory.
    pub fn file_name(self) -> &'static str {
        match self {
            InputTable::Patients => "patients.csv",
            InputTable::Stays => "icustays.csv",
            InputTable::Observations => "chartevents.csv",
            InputTable::Admissions => "admissions.csv",
            InputTable::SepsisLabels => "sepsis_labels.csv",
            InputTable::ReadmissionLabels => "readmission_labels.csv",
            InputTable::Items => "d_items.csv",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            InputTable::Patients => "patients",
            InputTable::Stays => "stays",
            InputTable::Observations => "observations",
            InputTable::Admissions => "admissions",
            InputTable::SepsisLabels => "sepsis labels",
            InputTable::ReadmissionLabels => "readmission labels",
            InputTable::Items => "items",
        }
    }

    /// Whether the pipeline can run without this table.
    pub fn is_optional(self) -> bool {
        matches!(self, InputTable::Items)
    }

    /// Columns the table must carry for the pipeline to use it.
    pub fn required_columns(self) -> &'static [&'static str] {
        match self {
            InputTable::Patients => &[columns::SUBJECT_ID, columns::ANCHOR_AGE, columns::GENDER],
            InputTable::Stays => &[
                columns::STAY_ID,
                columns::SUBJECT_ID,
                columns::INTIME,
                columns::OUTTIME,
            ],
            InputTable::Observations => &[
                columns::SUBJECT_ID,
                columns::ITEMID,
                columns::CHARTTIME,
                columns::VALUENUM,
            ],
            InputTable::Admissions => &[columns::SUBJECT_ID, columns::HOSPITAL_EXPIRE_FLAG],
            InputTable::SepsisLabels => &[
                columns::SUBJECT_ID,
                columns::STAY_ID,
                columns::SEPSIS_SHOCK_RESPFAIL_FLAG,
            ],
            InputTable::ReadmissionLabels => &[
                columns::SUBJECT_ID,
                columns::STAY_ID,
                columns::READMISSION_FLAG,
            ],
            InputTable::Items => &[columns::ITEMID, columns::ITEM_LABEL],
        }
    }

    /// Tables that must exist before the pipeline starts.
    pub fn required() -> impl Iterator<Item = InputTable> {
        Self::ALL.into_iter().filter(|table| !table.is_optional())
    }
}

impl fmt::Display for InputTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
