//! Windowed vital-sign statistics.
//!
//! For every stay and every configured signal, the mean and maximum of the
//! values charted in `[admission, admission + W)`. An empty window yields
//! null statistics; the stay row is always kept.

use std::collections::HashMap;

use polars::prelude::{DataFrame, IntoColumn, NamedFrom, Series};

use icu_model::{Signal, SignalDictionary, Stay, WindowLength, columns};

use crate::error::Result;
use crate::index::{ChartPoint, ObservationIndex};

/// How many stays got at least one value for a signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalCoverage {
    pub signal: Signal,
    pub stays_with_values: usize,
    pub observations: usize,
}

/// Per-stay statistics, aligned with the stays they were computed for.
#[derive(Debug, Clone)]
pub struct VitalsTable {
    /// `icustay_id` followed by `<signal>_mean`, `<signal>_max` per signal.
    pub frame: DataFrame,
    pub coverage: Vec<SignalCoverage>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    sum: f64,
    count: usize,
    max: f64,
}

impl Accumulator {
    fn push(&mut self, value: f64) {
        if self.count == 0 || value > self.max {
            self.max = value;
        }
        self.sum += value;
        self.count += 1;
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }

    fn max(&self) -> Option<f64> {
        (self.count > 0).then_some(self.max)
    }
}

/// Summarise one window into one accumulator per signal, in dictionary order.
fn summarise(points: &[ChartPoint], slots: &HashMap<i64, usize>, width: usize) -> Vec<Accumulator> {
    let mut acc = vec![Accumulator::default(); width];
    for point in points {
        if let Some(&slot) = slots.get(&point.item_code) {
            acc[slot].push(point.value);
        }
    }
    acc
}

/// Compute windowed statistics for `stays`.
///
/// Stays without a parseable admission time get null statistics.
pub fn aggregate_vitals(
    index: &ObservationIndex,
    dictionary: &SignalDictionary,
    stays: &[Stay],
    window: WindowLength,
) -> Result<VitalsTable> {
    let signals = dictionary.signals();
    let slots: HashMap<i64, usize> = signals
        .iter()
        .enumerate()
        .map(|(slot, signal)| (signal.code, slot))
        .collect();

    let mut means: Vec<Vec<Option<f64>>> = vec![Vec::with_capacity(stays.len()); signals.len()];
    let mut maxes: Vec<Vec<Option<f64>>> = vec![Vec::with_capacity(stays.len()); signals.len()];
    let mut coverage: Vec<SignalCoverage> = signals
        .iter()
        .map(|signal| SignalCoverage {
            signal: signal.clone(),
            stays_with_values: 0,
            observations: 0,
        })
        .collect();

    for stay in stays {
        let points: &[ChartPoint] = match stay.window(window) {
            Some(w) => index.query(&stay.subject_id, w.start, w.end),
            None => &[],
        };
        let acc = summarise(points, &slots, signals.len());
        for (slot, stats) in acc.iter().enumerate() {
            means[slot].push(stats.mean());
            maxes[slot].push(stats.max());
            if stats.count > 0 {
                coverage[slot].stays_with_values += 1;
                coverage[slot].observations += stats.count;
            }
        }
    }

    let ids: Vec<&str> = stays.iter().map(|stay| stay.stay_id.as_str()).collect();
    let mut frame_columns = Vec::with_capacity(1 + 2 * signals.len());
    frame_columns.push(Series::new(columns::STAY_ID.into(), ids).into_column());
    for ((signal, mean), max) in signals.iter().zip(means).zip(maxes) {
        frame_columns.push(Series::new(signal.mean_column().into(), mean).into_column());
        frame_columns.push(Series::new(signal.max_column().into(), max).into_column());
    }
    let frame = DataFrame::new(frame_columns)?;

    for entry in &coverage {
        tracing::debug!(
            signal = %entry.signal.name,
            stays = entry.stays_with_values,
            observations = entry.observations,
            "signal coverage"
        );
    }

    Ok(VitalsTable { frame, coverage })
}
