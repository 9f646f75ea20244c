//! Per-behavior metric computation
//!
//! Clips every record to the day window and accumulates occurrence counts and
//! durations per behavior label.

use std::cmp::{max, min};
use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, Utc};

use crate::activity::types::{ActivityRecord, BehaviorMetrics, PerBehaviorMetric};

/// Compute per-behavior summary statistics for `[day_start, day_end]`.
///
/// A record that lies entirely outside the window contributes zero duration but
/// still counts as an occurrence of its behavior.
pub fn compute_per_behavior_metrics(
    activities: &[ActivityRecord],
    day_start: DateTime<FixedOffset>,
    day_end: DateTime<FixedOffset>,
) -> BehaviorMetrics {
    let day_start = day_start.with_timezone(&Utc);
    let day_end = day_end.with_timezone(&Utc);
    let total_day_ms = (day_end - day_start).num_milliseconds().max(0);

    let mut accumulated: BTreeMap<String, (u32, i64)> = BTreeMap::new();
    for record in activities {
        let duration = clipped_duration_ms(record, day_start, day_end);
        let entry = accumulated.entry(record.behavior.clone()).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += duration;
    }

    let by_behavior = accumulated
        .into_iter()
        .map(|(behavior, (occurrences, total_duration_ms))| {
            let metric = PerBehaviorMetric {
                behavior: behavior.clone(),
                occurrences,
                total_duration_ms,
                avg_duration_ms: average_ms(total_duration_ms, occurrences),
                percent_of_day: percent_of(total_duration_ms, total_day_ms),
            };
            (behavior, metric)
        })
        .collect();

    BehaviorMetrics {
        by_behavior,
        total_day_ms,
    }
}

/// Overlap of a record with the window, clamped to zero
fn clipped_duration_ms(
    record: &ActivityRecord,
    day_start: DateTime<Utc>,
    day_end: DateTime<Utc>,
) -> i64 {
    let clipped_start = max(day_start, record.start);
    let clipped_end = min(day_end, record.end);
    (clipped_end - clipped_start).num_milliseconds().max(0)
}

fn average_ms(total_ms: i64, occurrences: u32) -> f64 {
    if occurrences == 0 {
        return 0.0;
    }
    total_ms as f64 / occurrences as f64
}

fn percent_of(part_ms: i64, whole_ms: i64) -> f64 {
    if whole_ms <= 0 {
        return 0.0;
    }
    100.0 * part_ms as f64 / whole_ms as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn offset() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, h, m, 0).unwrap()
    }

    fn record(id: &str, behavior: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> ActivityRecord {
        ActivityRecord::new(id, Some(behavior), start, end)
    }

    fn full_day() -> (DateTime<FixedOffset>, DateTime<FixedOffset>) {
        (
            offset().with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap(),
            offset().with_ymd_and_hms(2024, 1, 16, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_empty_input_keeps_window_length() {
        let (start, end) = full_day();
        let metrics = compute_per_behavior_metrics(&[], start, end);

        assert!(metrics.by_behavior.is_empty());
        assert_eq!(metrics.total_day_ms, 86_400_000);
    }

    #[test]
    fn test_accumulates_per_behavior() {
        let (start, end) = full_day();
        let records = vec![
            record("1", "Resting", at(3, 0), at(5, 0)),
            record("2", "Moving", at(6, 0), at(6, 30)),
            record("3", "Resting", at(18, 0), at(20, 0)),
        ];

        let metrics = compute_per_behavior_metrics(&records, start, end);
        let resting = &metrics.by_behavior["Resting"];

        assert_eq!(resting.occurrences, 2);
        assert_eq!(resting.total_duration_ms, 14_400_000);
        assert_eq!(resting.avg_duration_ms, 7_200_000.0);
        assert!((resting.percent_of_day - 100.0 / 6.0).abs() < 1e-9);

        let moving = &metrics.by_behavior["Moving"];
        assert_eq!(moving.occurrences, 1);
        assert_eq!(moving.total_duration_ms, 1_800_000);
    }

    #[test]
    fn test_records_are_clipped_to_window() {
        let (start, end) = full_day();
        let records = vec![
            record(
                "overnight",
                "Recumbent",
                Utc.with_ymd_and_hms(2024, 1, 14, 22, 0, 0).unwrap(),
                at(1, 0),
            ),
            record(
                "late",
                "Recumbent",
                at(23, 30),
                Utc.with_ymd_and_hms(2024, 1, 16, 2, 0, 0).unwrap(),
            ),
        ];

        let metrics = compute_per_behavior_metrics(&records, start, end);
        let recumbent = &metrics.by_behavior["Recumbent"];

        assert_eq!(recumbent.occurrences, 2);
        assert_eq!(recumbent.total_duration_ms, 90 * 60 * 1000);
    }

    #[test]
    fn test_record_outside_window_still_counts_occurrence() {
        let (start, end) = full_day();
        let records = vec![record(
            "yesterday",
            "Pacing",
            Utc.with_ymd_and_hms(2024, 1, 14, 10, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 14, 11, 0, 0).unwrap(),
        )];

        let metrics = compute_per_behavior_metrics(&records, start, end);
        let pacing = &metrics.by_behavior["Pacing"];

        assert_eq!(pacing.occurrences, 1);
        assert_eq!(pacing.total_duration_ms, 0);
        assert_eq!(pacing.avg_duration_ms, 0.0);
        assert_eq!(pacing.percent_of_day, 0.0);
    }

    #[test]
    fn test_inverted_window_yields_zero_percent() {
        let (start, end) = full_day();
        let records = vec![record("1", "Moving", at(6, 0), at(7, 0))];

        let metrics = compute_per_behavior_metrics(&records, end, start);

        assert_eq!(metrics.total_day_ms, 0);
        let moving = &metrics.by_behavior["Moving"];
        assert_eq!(moving.percent_of_day, 0.0);
        assert_eq!(moving.total_duration_ms, 0);
        assert_eq!(moving.occurrences, 1);
    }

    #[test]
    fn test_end_before_start_contributes_nothing() {
        let (start, end) = full_day();
        let records = vec![record("1", "Scratching", at(9, 0), at(8, 0))];

        let metrics = compute_per_behavior_metrics(&records, start, end);
        assert_eq!(metrics.by_behavior["Scratching"].total_duration_ms, 0);
    }
}
