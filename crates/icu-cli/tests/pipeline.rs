//! End-to-end runs of the feature pipeline over small raw directories.

use std::fs;
use std::path::{Path, PathBuf};

use polars::prelude::{AnyValue, CsvReadOptions, DataFrame, ParquetReader, SerReader};
use tempfile::TempDir;

use icu_cli::config::{Overrides, PipelineConfig};
use icu_cli::pipeline::{PipelineError, run_pipeline};
use icu_ingest::IngestError;
use icu_model::{InputTable, columns};
use icu_transform::QualityFinding;

fn write(dir: &Path, name: &str, body: &str) {
    fs::write(dir.join(name), body).unwrap();
}

/// Two subjects, two stays. Only the first stay has chart events and a
/// sepsis label; its last heart rate falls exactly on the window end.
fn raw_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    let raw = dir.path();
    write(
        raw,
        "patients.csv",
        "subject_id,anchor_age,gender\n1,65,M\n2,71,F\n",
    );
    write(
        raw,
        "icustays.csv",
        "icustay_id,subject_id,intime,outtime\n\
         100,1,2024-01-01 00:00:00,2024-01-03 00:00:00\n\
         200,2,2024-01-05 12:00:00,2024-01-06 00:00:00\n",
    );
    write(
        raw,
        "chartevents.csv",
        "subject_id,itemid,charttime,valuenum\n\
         1,220045,2024-01-01 01:00:00,80\n\
         1,220045,2024-01-01 23:59:00,100\n\
         1,220045,2024-01-02 00:00:00,999\n\
         1,220277,2024-01-01 02:00:00,not-a-number\n\
         1,50000,2024-01-01 02:00:00,7\n",
    );
    write(
        raw,
        "admissions.csv",
        "subject_id,hospital_expire_flag\n1,0\n2,1\n",
    );
    write(
        raw,
        "sepsis_labels.csv",
        "subject_id,icustay_id,sepsis_shock_respfail_flag\n1,100,1\n",
    );
    write(
        raw,
        "readmission_labels.csv",
        "subject_id,icustay_id,readmission_flag\n2,200,1\n",
    );
    dir
}

fn config(input: &Path, output: PathBuf) -> PipelineConfig {
    PipelineConfig::resolve(
        None,
        Overrides {
            input_dir: Some(input.to_path_buf()),
            output_file: Some(output),
            ..Overrides::default()
        },
    )
    .unwrap()
}

/// Row index of a stay, so assertions do not depend on output order.
fn row_of(df: &DataFrame, stay_id: i64) -> usize {
    let ids = df.column(columns::STAY_ID).unwrap();
    (0..df.height())
        .find(|&row| ids.get(row).unwrap() == AnyValue::Int64(stay_id))
        .unwrap()
}

fn cell(df: &DataFrame, column: &str, row: usize) -> AnyValue<'static> {
    df.column(column).unwrap().get(row).unwrap().into_static()
}

#[test]
fn builds_one_row_per_stay_with_windowed_vitals_and_labels() {
    let raw = raw_dir();
    let out = TempDir::new().unwrap();
    let output = out.path().join("processed").join("icu_features.parquet");

    let result = run_pipeline(&config(raw.path(), output.clone())).unwrap();

    assert_eq!(result.stays, 2);
    assert_eq!(result.rows, 2);
    let paths = result.outputs.as_ref().unwrap();
    assert!(paths.parquet.is_file());
    assert!(paths.csv.is_file());

    let df = ParquetReader::new(fs::File::open(&output).unwrap())
        .finish()
        .unwrap();
    assert_eq!(df.height(), 2);

    let s1 = row_of(&df, 100);
    let s2 = row_of(&df, 200);
    assert_eq!(cell(&df, "HeartRate_mean", s1), AnyValue::Float64(90.0));
    assert_eq!(cell(&df, "HeartRate_max", s1), AnyValue::Float64(100.0));
    assert_eq!(cell(&df, "SpO2_mean", s1), AnyValue::Null);
    assert_eq!(cell(&df, columns::LOS_HOURS, s1), AnyValue::Float64(48.0));

    for column in ["HeartRate_mean", "HeartRate_max", "SpO2_max", "Temperature_mean"] {
        assert_eq!(cell(&df, column, s2), AnyValue::Null);
    }

    assert_eq!(cell(&df, columns::SEPSIS_SHOCK_RESPFAIL_FLAG, s1), AnyValue::Int32(1));
    assert_eq!(cell(&df, columns::SEPSIS_SHOCK_RESPFAIL_FLAG, s2), AnyValue::Int32(0));
    assert_eq!(cell(&df, columns::READMISSION_FLAG, s1), AnyValue::Int32(0));
    assert_eq!(cell(&df, columns::READMISSION_FLAG, s2), AnyValue::Int32(1));
    assert_eq!(cell(&df, columns::HOSPITAL_EXPIRE_FLAG, s2), AnyValue::Int32(1));

    for label in [
        columns::HOSPITAL_EXPIRE_FLAG,
        columns::SEPSIS_SHOCK_RESPFAIL_FLAG,
        columns::READMISSION_FLAG,
    ] {
        assert_eq!(df.column(label).unwrap().null_count(), 0);
    }

    assert_eq!(
        result.coercions.count(InputTable::Observations, columns::VALUENUM),
        1
    );
    assert_eq!(result.coercions.total(), 1);
    assert_eq!(result.index.unmapped, 1);
}

#[test]
fn csv_copy_matches_parquet_and_reruns_are_identical() {
    let raw = raw_dir();
    let out = TempDir::new().unwrap();
    let output = out.path().join("icu_features.parquet");
    let config = config(raw.path(), output.clone());

    let first = run_pipeline(&config).unwrap();
    let csv_path = first.outputs.unwrap().csv;
    let first_bytes = fs::read(&csv_path).unwrap();

    let header = String::from_utf8(first_bytes.clone()).unwrap();
    assert!(header.starts_with(
        "icustay_id,subject_id,age,gender,intime,outtime,los_hours,HeartRate_mean,HeartRate_max,"
    ));

    let from_csv = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(csv_path.clone()))
        .unwrap()
        .finish()
        .unwrap();
    assert_eq!(from_csv.height(), 2);
    assert_eq!(from_csv.width(), first.columns.len());

    run_pipeline(&config).unwrap();
    assert_eq!(fs::read(&csv_path).unwrap(), first_bytes);

    let leftovers = fs::read_dir(out.path())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
        .count();
    assert_eq!(leftovers, 0);
}

#[test]
fn dry_run_writes_nothing() {
    let raw = raw_dir();
    let out = TempDir::new().unwrap();
    let output = out.path().join("icu_features.parquet");
    let mut config = config(raw.path(), output.clone());
    config.dry_run = true;

    let result = run_pipeline(&config).unwrap();

    assert!(result.outputs.is_none());
    assert_eq!(result.rows, 2);
    assert!(!output.exists());
}

#[test]
fn missing_table_names_the_table() {
    let raw = raw_dir();
    fs::remove_file(raw.path().join("icustays.csv")).unwrap();
    let out = TempDir::new().unwrap();

    let err = run_pipeline(&config(raw.path(), out.path().join("f.parquet"))).unwrap_err();

    match err.downcast_ref::<IngestError>() {
        Some(IngestError::MissingInput { table, .. }) => assert_eq!(*table, InputTable::Stays),
        other => panic!("expected missing input, got {other:?}"),
    }
    assert!(!out.path().join("f.parquet").exists());
}

#[test]
fn label_table_without_its_column_fails() {
    let raw = raw_dir();
    write(
        raw.path(),
        "readmission_labels.csv",
        "subject_id,icustay_id,readmitted\n2,200,1\n",
    );
    let out = TempDir::new().unwrap();

    let err = run_pipeline(&config(raw.path(), out.path().join("f.parquet"))).unwrap_err();

    assert!(format!("{err:#}").contains("readmission_flag"));
}

#[test]
fn malformed_and_duplicate_stays_are_reported() {
    let raw = raw_dir();
    write(
        raw.path(),
        "icustays.csv",
        "icustay_id,subject_id,intime,outtime\n\
         100,1,2024-01-01 00:00:00,2024-01-03 00:00:00\n\
         200,2,2024-01-05 12:00:00,2024-01-05 06:00:00\n\
         100,1,2024-02-01 00:00:00,2024-02-02 00:00:00\n",
    );
    let out = TempDir::new().unwrap();
    let mut config = config(raw.path(), out.path().join("f.parquet"));
    config.dry_run = true;

    let result = run_pipeline(&config).unwrap();

    assert_eq!(result.rows, 2);
    let findings = result.quality.findings();
    assert!(findings.contains(&QualityFinding::InvertedStay {
        stay_id: "200".to_string(),
        los_hours: -6.0,
    }));
    assert!(
        findings
            .iter()
            .any(|f| matches!(f, QualityFinding::DuplicateStay { stay_id, .. } if stay_id == "100"))
    );
}

#[test]
fn item_definitions_cross_check_is_advisory() {
    let raw = raw_dir();
    write(
        raw.path(),
        "d_items.csv",
        "itemid,label\n220045,Heart Rate\n220277,O2 saturation\n",
    );
    let out = TempDir::new().unwrap();
    let mut config = config(raw.path(), out.path().join("f.parquet"));
    config.dry_run = true;

    let result = run_pipeline(&config).unwrap();

    let unknown: Vec<i64> = result
        .quality
        .findings()
        .iter()
        .filter_map(|f| match f {
            QualityFinding::UnknownItemCode { code } => Some(*code),
            _ => None,
        })
        .collect();
    assert_eq!(unknown, vec![220179, 220180, 223761]);
}

#[test]
fn schema_error_is_a_pipeline_error() {
    let err = PipelineError::SchemaValidation {
        column: columns::READMISSION_FLAG.to_string(),
    };
    insta::assert_snapshot!(
        err.to_string(),
        @"output is missing required column 'readmission_flag'"
    );
}
