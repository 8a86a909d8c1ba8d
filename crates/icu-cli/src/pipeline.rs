//! Feature pipeline with explicit stages.
//!
//! The stages run in a fixed order:
//! 1. **Load**: check the input directory and read the raw tables
//! 2. **Static**: one row per stay with demographics and length of stay
//! 3. **Labels**: merge every outcome label under its missing-value policy
//! 4. **Vitals**: index the chart events and aggregate each stay's window
//! 5. **Join**: attach the statistics and fix the published column order
//! 6. **Validate**: refuse to publish a table that breaks the output contract
//! 7. **Output**: write Parquet and CSV atomically
//!
//! Each stage logs its boundary at `info` inside its own span.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use polars::prelude::DataFrame;
use thiserror::Error;
use tracing::{debug, info, info_span, warn};

use icu_common::column_strings;
use icu_ingest::{check_inputs, load_optional_table, load_table, require_columns};
use icu_model::{InputTable, LabelKind, LabelSpec, SignalDictionary, columns};
use icu_output::{FeaturePaths, write_feature_table};
use icu_transform::{
    CoercionReport, DataQualityReport, IndexStats, LabelMergeStats, MissingLabelPolicy,
    ObservationIndex, QualityFinding, SignalCoverage, StayFrame, aggregate_vitals,
    extract_static_features, merge_label, unknown_item_codes,
};

use crate::config::PipelineConfig;
use crate::logging::redact_value;

/// Output-contract violations found before writing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("output is missing required column '{column}'")]
    SchemaValidation { column: String },

    #[error("stay '{stay_id}' appears more than once in the output")]
    DuplicateStay { stay_id: String },

    #[error("output has {rows} rows for {stays} stays")]
    RowCountMismatch { rows: usize, stays: usize },

    #[error("binary label '{column}' has {nulls} missing values")]
    NullLabel { column: String, nulls: usize },
}

/// Everything a run produced.
#[derive(Debug)]
pub struct PipelineResult {
    pub stays: usize,
    pub rows: usize,
    pub columns: Vec<String>,
    /// `None` for a dry run.
    pub outputs: Option<FeaturePaths>,
    pub coverage: Vec<SignalCoverage>,
    pub labels: Vec<LabelMergeStats>,
    pub index: IndexStats,
    pub quality: DataQualityReport,
    pub coercions: CoercionReport,
    /// The validated feature table.
    pub table: DataFrame,
}

// ============================================================================
// Stage 1: Load
// ============================================================================

/// Raw tables read from the input directory.
#[derive(Debug)]
pub struct LoadedTables {
    pub tables: BTreeMap<InputTable, DataFrame>,
    /// Item definitions, when present.
    pub items: Option<DataFrame>,
}

impl LoadedTables {
    pub fn get(&self, table: InputTable) -> Result<&DataFrame> {
        self.tables
            .get(&table)
            .with_context(|| format!("{table} table was not loaded"))
    }
}

/// Check the input directory and read every table the run needs.
///
/// Every missing required table is logged before the first one is returned
/// as the error.
pub fn load(input_dir: &Path, labels: &[LabelSpec]) -> Result<LoadedTables> {
    check_inputs(input_dir)
        .with_context(|| format!("check inputs in {}", input_dir.display()))?;

    let mut needed: BTreeSet<InputTable> = [
        InputTable::Patients,
        InputTable::Stays,
        InputTable::Observations,
    ]
    .into_iter()
    .collect();
    needed.extend(labels.iter().map(|spec| spec.table));

    let mut tables = BTreeMap::new();
    for table in needed {
        let df = load_table(input_dir, table).with_context(|| format!("load {table} table"))?;
        if matches!(
            table,
            InputTable::Patients | InputTable::Stays | InputTable::Observations
        ) {
            require_columns(&df, table, table.required_columns())?;
        }
        tables.insert(table, df);
    }
    let items = load_optional_table(input_dir, InputTable::Items).context("load items table")?;

    Ok(LoadedTables { tables, items })
}

// ============================================================================
// Stage 3: Labels
// ============================================================================

/// Merge every label in order, each under the default policy for its kind.
pub fn merge_labels(
    frame: &mut StayFrame,
    tables: &LoadedTables,
    labels: &[LabelSpec],
    coercions: &mut CoercionReport,
) -> Result<Vec<LabelMergeStats>> {
    let mut stats = Vec::with_capacity(labels.len());
    for spec in labels {
        let table = tables.get(spec.table)?;
        let policy = MissingLabelPolicy::for_kind(spec.kind);
        let merged = merge_label(frame, table, spec, policy, coercions)
            .with_context(|| format!("merge label {}", spec.column))?;
        stats.push(merged);
    }
    Ok(stats)
}

// ============================================================================
// Stage 5: Join
// ============================================================================

/// Published column order: static columns, signal statistics, labels.
pub fn output_columns(dictionary: &SignalDictionary, labels: &[LabelSpec]) -> Vec<String> {
    columns::STATIC_COLUMNS
        .iter()
        .map(|name| (*name).to_string())
        .chain(dictionary.feature_columns())
        .chain(labels.iter().map(|spec| spec.column.clone()))
        .collect()
}

// ============================================================================
// Stage 6: Validate
// ============================================================================

/// Rows the output must hold: every extracted stay, less those a
/// drop-row label policy removed.
pub fn expected_rows(extracted_stays: usize, labels: &[LabelMergeStats]) -> usize {
    let dropped: usize = labels.iter().map(|merged| merged.dropped).sum();
    extracted_stays.saturating_sub(dropped)
}

/// Check the assembled table against the output contract.
pub fn validate(
    table: &DataFrame,
    stays: usize,
    labels: &[LabelSpec],
) -> std::result::Result<(), PipelineError> {
    for column in columns::REQUIRED_OUTPUT_COLUMNS {
        if table.column(column).is_err() {
            return Err(PipelineError::SchemaValidation {
                column: column.to_string(),
            });
        }
    }

    if table.height() != stays {
        return Err(PipelineError::RowCountMismatch {
            rows: table.height(),
            stays,
        });
    }

    let ids = table
        .column(columns::STAY_ID)
        .ok()
        .and_then(|column| column_strings(column).ok())
        .unwrap_or_default();
    let mut seen = HashSet::with_capacity(ids.len());
    for id in ids.into_iter().flatten() {
        if !seen.insert(id.clone()) {
            return Err(PipelineError::DuplicateStay { stay_id: id });
        }
    }

    for spec in labels.iter().filter(|spec| spec.kind == LabelKind::Binary) {
        let Ok(column) = table.column(&spec.column) else {
            return Err(PipelineError::SchemaValidation {
                column: spec.column.clone(),
            });
        };
        let nulls = column.null_count();
        if nulls > 0 {
            return Err(PipelineError::NullLabel {
                column: spec.column.clone(),
                nulls,
            });
        }
    }
    Ok(())
}

// ============================================================================
// Orchestration
// ============================================================================

/// Run every stage and, unless this is a dry run, write the outputs.
pub fn run_pipeline(config: &PipelineConfig) -> Result<PipelineResult> {
    let run_span = info_span!(
        "pipeline",
        input_dir = %config.input_dir.display(),
        window_hours = config.window.hours()
    );
    let _run_guard = run_span.enter();
    let run_start = Instant::now();

    let mut coercions = CoercionReport::new();
    let mut quality = DataQualityReport::new();

    let tables = info_span!("load").in_scope(|| -> Result<_> {
        let start = Instant::now();
        let tables = load(&config.input_dir, &config.labels)?;
        info!(
            tables = tables.tables.len(),
            items = tables.items.is_some(),
            duration_ms = start.elapsed().as_millis(),
            "load complete"
        );
        Ok(tables)
    })?;

    if let Some(items) = &tables.items {
        let unknown = unknown_item_codes(items, &config.dictionary)
            .context("cross-check item definitions")?;
        quality.extend(
            unknown
                .into_iter()
                .map(|code| QualityFinding::UnknownItemCode { code }),
        );
    }

    let mut frame = info_span!("static").in_scope(|| -> Result<_> {
        let start = Instant::now();
        let extracted = extract_static_features(
            tables.get(InputTable::Patients)?,
            tables.get(InputTable::Stays)?,
            &mut coercions,
        )
        .context("extract static features")?;
        quality.extend(extracted.findings);
        info!(
            stays = extracted.frame.height(),
            duration_ms = start.elapsed().as_millis(),
            "static extraction complete"
        );
        Ok(extracted.frame)
    })?;
    let extracted_stays = frame.height();

    let labels = info_span!("labels").in_scope(|| -> Result<_> {
        let start = Instant::now();
        let stats = merge_labels(&mut frame, &tables, &config.labels, &mut coercions)?;
        info!(
            labels = stats.len(),
            stays = frame.height(),
            duration_ms = start.elapsed().as_millis(),
            "label merge complete"
        );
        Ok(stats)
    })?;
    for merged in &labels {
        debug!(
            label = %merged.label,
            matched = merged.matched,
            missing = merged.missing,
            dropped = merged.dropped,
            "label coverage"
        );
    }

    let (vitals, index_stats) = info_span!("vitals").in_scope(|| -> Result<_> {
        let start = Instant::now();
        let (index, stats) = ObservationIndex::from_frame(
            tables.get(InputTable::Observations)?,
            &config.dictionary,
            &mut coercions,
        )
        .context("index observations")?;
        let vitals = aggregate_vitals(&index, &config.dictionary, &frame.stays, config.window)
            .context("aggregate vitals")?;
        info!(
            observations = stats.rows,
            indexed = stats.indexed,
            subjects = index.subject_count(),
            duration_ms = start.elapsed().as_millis(),
            "vitals aggregation complete"
        );
        Ok((vitals, stats))
    })?;

    let mut table = info_span!("join").in_scope(|| -> Result<_> {
        let start = Instant::now();
        frame
            .join_by_stay(&vitals.frame)
            .context("join vitals onto stays")?;
        let order = output_columns(&config.dictionary, &config.labels);
        let table = frame.data.select(order).context("order output columns")?;
        info!(
            rows = table.height(),
            columns = table.width(),
            duration_ms = start.elapsed().as_millis(),
            "join complete"
        );
        Ok(table)
    })?;

    info_span!("validate").in_scope(|| -> Result<()> {
        validate(
            &table,
            expected_rows(extracted_stays, &labels),
            &config.labels,
        )?;
        info!(rows = table.height(), "validation passed");
        Ok(())
    })?;

    let outputs = if config.dry_run {
        info!("dry run: skipping output");
        None
    } else {
        Some(info_span!("output").in_scope(|| -> Result<_> {
            let start = Instant::now();
            let paths = write_feature_table(&mut table, &config.output_file)
                .with_context(|| format!("write {}", config.output_file.display()))?;
            info!(
                parquet = %paths.parquet.display(),
                csv = %paths.csv.display(),
                duration_ms = start.elapsed().as_millis(),
                "output complete"
            );
            Ok(paths)
        })?)
    };

    log_coercions(&coercions);
    quality.log();
    info!(
        stays = extracted_stays,
        rows = table.height(),
        duration_ms = run_start.elapsed().as_millis(),
        "pipeline complete"
    );

    Ok(PipelineResult {
        stays: frame.height(),
        rows: table.height(),
        columns: table
            .get_column_names()
            .into_iter()
            .map(ToString::to_string)
            .collect(),
        outputs,
        coverage: vitals.coverage,
        labels,
        index: index_stats,
        quality,
        coercions,
        table,
    })
}

/// One warning per (table, column) with failed coercions.
fn log_coercions(report: &CoercionReport) {
    for (table, column, entry) in report.iter() {
        let samples: Vec<&str> = entry
            .samples
            .iter()
            .map(|sample| redact_value(sample))
            .collect();
        warn!(
            table = %table,
            column,
            count = entry.count,
            samples = ?samples,
            "values could not be coerced and were treated as missing"
        );
    }
}
