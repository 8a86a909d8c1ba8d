//! Static per-stay attributes.
//!
//! Produces exactly one row per valid stay with demographics from the
//! patients table (first row per subject wins, unmatched stays keep null
//! demographics), canonical timestamps and the length of stay in hours.

use std::collections::{HashMap, HashSet};

use polars::prelude::{
    Column, DataFrame, IdxCa, IdxSize, IntoColumn, NamedFrom, NewChunkedArray, Series,
};

use icu_common::{column_strings, format_timestamp, parse_timestamp};
use icu_model::{InputTable, Stay, StayId, SubjectId, columns};

use crate::coercion::CoercionReport;
use crate::error::Result;
use crate::frame::{StayFrame, require_column};
use crate::quality::QualityFinding;

/// Result of static extraction.
#[derive(Debug, Clone)]
pub struct StaticFeatures {
    pub frame: StayFrame,
    pub findings: Vec<QualityFinding>,
}

/// Build the static stay table from the patients and stays tables.
///
/// Rows with a blank stay or subject identifier are dropped, as are repeated
/// stay identifiers after their first row. Both are reported as findings.
/// Timestamps that fail to parse become null and are counted in `report`.
pub fn extract_static_features(
    patients: &DataFrame,
    stays: &DataFrame,
    report: &mut CoercionReport,
) -> Result<StaticFeatures> {
    let stay_col = require_column(stays, InputTable::Stays, columns::STAY_ID)?;
    let subject_col = require_column(stays, InputTable::Stays, columns::SUBJECT_ID)?;
    let intime_col = require_column(stays, InputTable::Stays, columns::INTIME)?;
    let outtime_col = require_column(stays, InputTable::Stays, columns::OUTTIME)?;
    let patient_subject_col = require_column(patients, InputTable::Patients, columns::SUBJECT_ID)?;
    let age_col = require_column(patients, InputTable::Patients, columns::ANCHOR_AGE)?;
    let gender_col = require_column(patients, InputTable::Patients, columns::GENDER)?;

    let stay_ids = column_strings(stay_col)?;
    let subject_ids = column_strings(subject_col)?;
    let intimes = column_strings(intime_col)?;
    let outtimes = column_strings(outtime_col)?;

    let mut findings = Vec::new();
    let mut seen: HashSet<String> = HashSet::with_capacity(stay_ids.len());
    let mut kept: Vec<IdxSize> = Vec::with_capacity(stay_ids.len());
    let mut records: Vec<Stay> = Vec::with_capacity(stay_ids.len());

    for (row, (stay_id, subject_id)) in stay_ids.iter().zip(&subject_ids).enumerate() {
        let (Some(stay_raw), Some(subject_raw)) = (stay_id, subject_id) else {
            findings.push(QualityFinding::BlankIdentifier {
                table: InputTable::Stays,
                row,
            });
            continue;
        };
        if !seen.insert(stay_raw.clone()) {
            findings.push(QualityFinding::DuplicateStay {
                stay_id: stay_raw.clone(),
                row,
            });
            continue;
        }
        let admission = coerce_timestamp(intimes[row].as_deref(), columns::INTIME, report);
        let discharge = coerce_timestamp(outtimes[row].as_deref(), columns::OUTTIME, report);
        let stay = Stay {
            stay_id: StayId::new(stay_raw.as_str())?,
            subject_id: SubjectId::new(subject_raw.as_str())?,
            admission,
            discharge,
        };
        if stay.is_inverted()
            && let Some(los_hours) = stay.duration_hours()
        {
            findings.push(QualityFinding::InvertedStay {
                stay_id: stay_raw.clone(),
                los_hours,
            });
        }
        kept.push(row as IdxSize);
        records.push(stay);
    }

    let rows = IdxCa::from_vec("rows".into(), kept);
    let stay_out = gather(stay_col, &rows, columns::STAY_ID)?;
    let subject_out = gather(subject_col, &rows, columns::SUBJECT_ID)?;

    let patient_rows = first_row_per_subject(patient_subject_col)?;
    let matches = IdxCa::from_iter_options(
        "patients".into(),
        records
            .iter()
            .map(|stay| patient_rows.get(stay.subject_id.as_str()).copied()),
    );
    let age_out = gather(age_col, &matches, columns::AGE)?;
    let gender_out = gather(gender_col, &matches, columns::GENDER)?;

    let intime_out = Series::new(
        columns::INTIME.into(),
        records
            .iter()
            .map(|stay| stay.admission.map(format_timestamp))
            .collect::<Vec<_>>(),
    );
    let outtime_out = Series::new(
        columns::OUTTIME.into(),
        records
            .iter()
            .map(|stay| stay.discharge.map(format_timestamp))
            .collect::<Vec<_>>(),
    );
    let los_out = Series::new(
        columns::LOS_HOURS.into(),
        records
            .iter()
            .map(Stay::duration_hours)
            .collect::<Vec<_>>(),
    );

    let data = DataFrame::new(vec![
        stay_out,
        subject_out,
        age_out,
        gender_out,
        intime_out.into_column(),
        outtime_out.into_column(),
        los_out.into_column(),
    ])?;

    tracing::debug!(
        stays = records.len(),
        dropped = stay_ids.len() - records.len(),
        "extracted static features"
    );

    Ok(StaticFeatures {
        frame: StayFrame::new(data, records),
        findings,
    })
}

fn coerce_timestamp(
    raw: Option<&str>,
    column: &str,
    report: &mut CoercionReport,
) -> Option<chrono::NaiveDateTime> {
    let raw = raw?;
    let parsed = parse_timestamp(raw);
    if parsed.is_none() {
        report.record(InputTable::Stays, column, raw);
    }
    parsed
}

/// Gather `column` at `rows` under the canonical output `name`.
fn gather(column: &Column, rows: &IdxCa, name: &str) -> Result<Column> {
    let series = column.as_materialized_series().take(rows)?;
    Ok(series.with_name(name.into()).into_column())
}

fn first_row_per_subject(column: &Column) -> Result<HashMap<String, IdxSize>> {
    let subjects = column_strings(column)?;
    let mut rows = HashMap::with_capacity(subjects.len());
    for (row, subject) in subjects.into_iter().enumerate() {
        if let Some(subject) = subject {
            rows.entry(subject).or_insert(row as IdxSize);
        }
    }
    Ok(rows)
}
