//! Windowed aggregation over a large synthetic chart table.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use icu_model::{Observation, SignalDictionary, Stay, StayId, SubjectId, WindowLength};
use icu_transform::{ObservationIndex, aggregate_vitals};
use polars::prelude::AnyValue;

const SUBJECTS: i64 = 2_000;
const PER_SUBJECT: i64 = 100;

fn t0() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

#[test]
fn two_hundred_thousand_observations() {
    let codes: Vec<i64> = SignalDictionary::default().codes().collect();
    let mut observations = Vec::with_capacity((SUBJECTS * PER_SUBJECT) as usize);
    for subject in 0..SUBJECTS {
        let subject_id = SubjectId::new(subject.to_string()).unwrap();
        for n in 0..PER_SUBJECT {
            observations.push(Observation {
                subject_id: subject_id.clone(),
                item_code: codes[(n % codes.len() as i64) as usize],
                // One observation every 30 minutes: 48 of 100 fall in the first day.
                charted_at: t0() + TimeDelta::minutes(30 * n),
                value: n as f64,
            });
        }
    }
    assert_eq!(observations.len(), 200_000);

    let stays: Vec<Stay> = (0..SUBJECTS)
        .map(|subject| Stay {
            stay_id: StayId::new(format!("S{subject}")).unwrap(),
            subject_id: SubjectId::new(subject.to_string()).unwrap(),
            admission: Some(t0()),
            discharge: Some(t0() + TimeDelta::days(3)),
        })
        .collect();

    let index = ObservationIndex::build(observations);
    assert_eq!(index.subject_count(), SUBJECTS as usize);

    let table = aggregate_vitals(
        &index,
        &SignalDictionary::default(),
        &stays,
        WindowLength::default(),
    )
    .unwrap();

    assert_eq!(table.frame.height(), SUBJECTS as usize);
    // HeartRate is every fifth observation starting at n = 0; the last one
    // inside 24h is n = 45.
    let max = table.frame.column("HeartRate_max").unwrap().get(0).unwrap();
    assert_eq!(max, AnyValue::Float64(45.0));
    assert!(
        table
            .coverage
            .iter()
            .all(|entry| entry.stays_with_values == SUBJECTS as usize)
    );
}
