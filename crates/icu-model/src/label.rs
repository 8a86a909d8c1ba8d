//! Outcome label declarations.

use serde::{Deserialize, Serialize};

use crate::columns;
use crate::table::InputTable;

/// How a label table is keyed against the stay table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelKey {
    /// One value per subject, broadcast to every stay of that subject.
    Subject,
    /// One value per (subject, stay) pair.
    SubjectStay,
}

impl LabelKey {
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            LabelKey::Subject => &[columns::SUBJECT_ID],
            LabelKey::SubjectStay => &[columns::SUBJECT_ID, columns::STAY_ID],
        }
    }
}

/// Value semantics of a label, which decides its default missing policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelKind {
    /// 0/1 flag; absence means a definite negative.
    Binary,
    /// Continuous or ordinal target; absence stays missing.
    Continuous,
}

/// One label column and the table it comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSpec {
    pub column: String,
    pub table: InputTable,
    pub key: LabelKey,
    pub kind: LabelKind,
}

impl LabelSpec {
    pub fn binary(column: impl Into<String>, table: InputTable, key: LabelKey) -> Self {
        Self {
            column: column.into(),
            table,
            key,
            kind: LabelKind::Binary,
        }
    }

    pub fn continuous(column: impl Into<String>, table: InputTable, key: LabelKey) -> Self {
        Self {
            column: column.into(),
            table,
            key,
            kind: LabelKind::Continuous,
        }
    }
}

/// Labels merged by the standard pipeline, in merge order.
pub fn default_label_specs() -> Vec<LabelSpec> {
    vec![
        LabelSpec::binary(
            columns::HOSPITAL_EXPIRE_FLAG,
            InputTable::Admissions,
            LabelKey::Subject,
        ),
        LabelSpec::binary(
            columns::SEPSIS_SHOCK_RESPFAIL_FLAG,
            InputTable::SepsisLabels,
            LabelKey::SubjectStay,
        ),
        LabelSpec::binary(
            columns::READMISSION_FLAG,
            InputTable::ReadmissionLabels,
            LabelKey::SubjectStay,
        ),
    ]
}
