//! Typed records extracted from the raw tables.

use chrono::{NaiveDateTime, TimeDelta};

use crate::error::{ModelError, Result};
use crate::ids::{StayId, SubjectId};

/// Default observation window anchored at admission.
pub const DEFAULT_WINDOW_HOURS: f64 = 24.0;

/// Length of the observation window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowLength {
    hours: f64,
    delta: TimeDelta,
}

impl WindowLength {
    pub fn from_hours(hours: f64) -> Result<Self> {
        if !hours.is_finite() || hours <= 0.0 {
            return Err(ModelError::InvalidWindow(hours));
        }
        let millis = (hours * 3_600_000.0).round() as i64;
        let delta = TimeDelta::try_milliseconds(millis).ok_or(ModelError::InvalidWindow(hours))?;
        Ok(Self { hours, delta })
    }

    pub fn hours(&self) -> f64 {
        self.hours
    }

    pub fn delta(&self) -> TimeDelta {
        self.delta
    }
}

impl Default for WindowLength {
    fn default() -> Self {
        Self {
            hours: DEFAULT_WINDOW_HOURS,
            delta: TimeDelta::hours(24),
        }
    }
}

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeWindow {
    pub fn anchored(start: NaiveDateTime, length: WindowLength) -> Self {
        let end = start
            .checked_add_signed(length.delta())
            .unwrap_or(NaiveDateTime::MAX);
        Self { start, end }
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.start <= at && at < self.end
    }
}

/// One ICU stay.
#[derive(Debug, Clone, PartialEq)]
pub struct Stay {
    pub stay_id: StayId,
    pub subject_id: SubjectId,
    /// `None` when the raw timestamp could not be parsed.
    pub admission: Option<NaiveDateTime>,
    pub discharge: Option<NaiveDateTime>,
}

impl Stay {
    /// `(discharge - admission)` in hours; negative for malformed stays.
    pub fn duration_hours(&self) -> Option<f64> {
        let (admission, discharge) = (self.admission?, self.discharge?);
        let delta = discharge - admission;
        Some(delta.num_milliseconds() as f64 / 3_600_000.0)
    }

    /// Discharge recorded before admission.
    pub fn is_inverted(&self) -> bool {
        matches!((self.admission, self.discharge), (Some(a), Some(d)) if d < a)
    }

    pub fn window(&self, length: WindowLength) -> Option<TimeWindow> {
        self.admission
            .map(|admission| TimeWindow::anchored(admission, length))
    }
}

/// A fully coerced chart observation.
///
/// Rows whose timestamp or value failed coercion never become an
/// `Observation`; they are counted and dropped at extraction time.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub subject_id: SubjectId,
    pub item_code: i64,
    pub charted_at: NaiveDateTime,
    pub value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn stay(admission: Option<NaiveDateTime>, discharge: Option<NaiveDateTime>) -> Stay {
        Stay {
            stay_id: StayId::new("S1").unwrap(),
            subject_id: SubjectId::new("P1").unwrap(),
            admission,
            discharge,
        }
    }

    #[test]
    fn window_is_half_open() {
        let window = TimeWindow::anchored(at(1, 0, 0), WindowLength::default());
        assert!(window.contains(at(1, 0, 0)));
        assert!(window.contains(at(1, 23, 59)));
        assert!(!window.contains(at(2, 0, 0)));
        assert!(!window.contains(at(1, 0, 0) - TimeDelta::seconds(1)));
    }

    #[test]
    fn duration_in_hours() {
        assert_eq!(
            stay(Some(at(1, 0, 0)), Some(at(2, 12, 0))).duration_hours(),
            Some(36.0)
        );
        assert_eq!(stay(None, Some(at(2, 12, 0))).duration_hours(), None);
    }

    #[test]
    fn inverted_stay_has_negative_duration() {
        let inverted = stay(Some(at(2, 0, 0)), Some(at(1, 18, 0)));
        assert!(inverted.is_inverted());
        assert_eq!(inverted.duration_hours(), Some(-6.0));
    }

    #[test]
    fn window_length_must_be_positive() {
        assert!(WindowLength::from_hours(0.0).is_err());
        assert!(WindowLength::from_hours(-2.0).is_err());
        assert!(WindowLength::from_hours(f64::NAN).is_err());
        let six = WindowLength::from_hours(6.0).unwrap();
        assert_eq!(six.delta(), TimeDelta::hours(6));
    }
}
