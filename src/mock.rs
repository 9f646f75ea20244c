//! Mock activity data for demos and dashboard previews
//!
//! Provides the fixed sample day used throughout the dashboard and a seeded
//! generator that produces a repeatable day of records over the display taxonomy.

use chrono::{Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::activity::types::{ActivityRecord, DayWindow, DISPLAY_BEHAVIORS};
use crate::error::AggregateError;

/// `(behavior, start (h, m), end (h, m))` in local time
type SampleEntry = (&'static str, (u32, u32), (u32, u32));

const SAMPLE_DAY: [SampleEntry; 12] = [
    ("Foraging", (1, 10), (1, 45)),
    ("Grooming", (2, 15), (2, 40)),
    ("Resting", (3, 0), (5, 0)),
    ("Moving", (6, 30), (7, 15)),
    ("Foraging", (8, 5), (8, 50)),
    ("Pacing", (9, 20), (9, 35)),
    ("Socializing", (10, 0), (11, 30)),
    ("Foraging", (13, 10), (13, 55)),
    ("Grooming", (14, 30), (14, 50)),
    ("Moving", (15, 40), (16, 20)),
    ("Resting", (18, 0), (20, 0)),
    ("Pacing", (21, 5), (21, 25)),
];

/// The fixed twelve-record sample day, laid out in local time on `date`
pub fn sample_day(date: NaiveDate, offset: FixedOffset) -> Result<Vec<ActivityRecord>, AggregateError> {
    SAMPLE_DAY
        .iter()
        .enumerate()
        .map(|(i, (behavior, start, end))| {
            let start = local_instant(date, *start, offset)?;
            let end = local_instant(date, *end, offset)?;
            Ok(ActivityRecord::new(format!("sample-{:02}", i + 1), Some(*behavior), start, end))
        })
        .collect()
}

fn local_instant(
    date: NaiveDate,
    (hour, minute): (u32, u32),
    offset: FixedOffset,
) -> Result<chrono::DateTime<Utc>, AggregateError> {
    date.and_hms_opt(hour, minute, 0)
        .and_then(|naive| offset.from_local_datetime(&naive).single())
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| AggregateError::InvalidWindow(format!("{date} {hour:02}:{minute:02}")))
}

/// Seeded generator for a day of display-taxonomy records
pub struct MockGenerator {
    rng: StdRng,
}

impl MockGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generate up to `count` non-overlapping records inside `window`.
    ///
    /// Records are laid end to end with random gaps; generation stops early once
    /// the day is used up.
    pub fn generate_day(&mut self, window: &DayWindow, count: usize) -> Vec<ActivityRecord> {
        let day_end = window.day_end.with_timezone(&Utc);
        let mut cursor = window.day_start.with_timezone(&Utc);
        let mut records = Vec::with_capacity(count);
        let date = window.day_start.date_naive();

        for i in 0..count {
            let gap = Duration::minutes(self.rng.gen_range(5..=90));
            let length = Duration::minutes(self.rng.gen_range(5..=120));
            let behavior = DISPLAY_BEHAVIORS[self.rng.gen_range(0..DISPLAY_BEHAVIORS.len())];

            let start = match cursor.checked_add_signed(gap) {
                Some(start) if start < day_end => start,
                _ => break,
            };
            let end = start
                .checked_add_signed(length)
                .map_or(day_end, |end| end.min(day_end));

            records.push(ActivityRecord::new(
                format!("{date}-{:03}", i + 1),
                Some(behavior),
                start,
                end,
            ));
            cursor = end;
        }

        log::debug!("generated {} mock records for {date}", records.len());
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::types::{PeakEntry, PeakMetric};
    use crate::activity::{build_hourly_series, compute_per_behavior_metrics, find_peak_hours};
    use chrono::Timelike;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn test_sample_day_layout() {
        let records = sample_day(date(), utc()).unwrap();

        assert_eq!(records.len(), 12);
        assert_eq!(records[0].behavior, "Foraging");
        assert_eq!(records[0].start.hour(), 1);
        assert_eq!(records[0].start.minute(), 10);

        let start_hours: Vec<u32> = records.iter().map(|r| r.start.hour()).collect();
        assert_eq!(start_hours, vec![1, 2, 3, 6, 8, 9, 10, 13, 14, 15, 18, 21]);
    }

    #[test]
    fn test_sample_day_in_local_offset() {
        let offset = FixedOffset::west_opt(4 * 3600).unwrap();
        let records = sample_day(date(), offset).unwrap();

        // 01:10 at -04:00 is 05:10Z
        assert_eq!(records[0].start.hour(), 5);
        assert_eq!(records[0].start.with_timezone(&offset).hour(), 1);
    }

    #[test]
    fn test_sample_day_resting_totals() {
        let window = DayWindow::for_date(date(), utc()).unwrap();
        let records = sample_day(date(), utc()).unwrap();

        let metrics = compute_per_behavior_metrics(&records, window.day_start, window.day_end);
        let resting = &metrics.by_behavior["Resting"];

        assert_eq!(resting.total_duration_ms, 14_400_000);
        assert_eq!(resting.occurrences, 2);
    }

    #[test]
    fn test_sample_day_peaks_by_occurrences_break_ties_by_hour() {
        let window = DayWindow::for_date(date(), utc()).unwrap();
        let records = sample_day(date(), utc()).unwrap();
        let series = build_hourly_series(&records, window.day_start);

        let all = find_peak_hours(&series, PeakMetric::Occurrences, 24);
        let busy: Vec<u32> = all.iter().filter(|p| p.total == 1).map(|p| p.hour).collect();
        assert_eq!(busy, vec![1, 2, 3, 6, 8, 9, 10, 13, 14, 15, 18, 21]);

        let top = find_peak_hours(&series, PeakMetric::Occurrences, 3);
        assert_eq!(
            top,
            vec![
                PeakEntry { hour: 1, total: 1 },
                PeakEntry { hour: 2, total: 1 },
                PeakEntry { hour: 3, total: 1 },
            ]
        );

        let total: u32 = series.hours.iter().map(|b| b.total_occurrences).sum();
        assert_eq!(total, 12);
    }

    #[test]
    fn test_generator_is_deterministic() {
        let window = DayWindow::for_date(date(), utc()).unwrap();

        let first = MockGenerator::new(42).generate_day(&window, 20);
        let second = MockGenerator::new(42).generate_day(&window, 20);

        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn test_generated_records_stay_in_window() {
        let window = DayWindow::for_date(date(), utc()).unwrap();
        let records = MockGenerator::new(7).generate_day(&window, 200);

        assert!(records.len() < 200);
        for pair in records.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
        for record in &records {
            assert!(window.contains(record.start));
            assert!(window.contains(record.end));
            assert!(record.end >= record.start);
            assert!(DISPLAY_BEHAVIORS.contains(&record.behavior.as_str()));
        }
    }
}
