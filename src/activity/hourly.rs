//! Hour-of-day series construction
//!
//! Spreads each record's duration across the local hours it overlaps and
//! attributes its single occurrence to the hour containing its start.

use std::cmp::{max, min};

use chrono::{DateTime, Duration, FixedOffset, Timelike};

use crate::activity::types::{ActivityRecord, HourBucket, HourlySeries, HOURS_PER_DAY};

const MS_PER_HOUR: i64 = 3_600_000;

/// Build the 24-bucket hourly series for a day.
///
/// Buckets are keyed on the local hour-of-day of each timestamp, where "local" is
/// the offset carried by `day_start`. Records are assumed to belong to that day;
/// a record from another calendar day lands in the buckets of its own local hours.
pub fn build_hourly_series(
    activities: &[ActivityRecord],
    day_start: DateTime<FixedOffset>,
) -> HourlySeries {
    let offset = *day_start.offset();
    let mut hours: Vec<HourBucket> = (0..HOURS_PER_DAY as u32).map(HourBucket::empty).collect();

    for record in activities {
        let start = record.start.with_timezone(&offset);
        let end = record.end.with_timezone(&offset);

        let Some(mut hour_start) = floor_to_hour(start) else {
            log::warn!("record {} has no representable hour start", record.id);
            continue;
        };

        while hour_start <= end {
            if hour_start > start {
                let whole_days = (end - hour_start).num_hours() / HOURS_PER_DAY as i64;
                if whole_days > 0 {
                    let Some(next) = hour_start.checked_add_signed(Duration::days(whole_days)) else {
                        break;
                    };
                    add_whole_days(&mut hours, &record.behavior, whole_days);
                    hour_start = next;
                    continue;
                }
            }

            let hour_end = hour_start.checked_add_signed(Duration::hours(1));
            let overlap_end = hour_end.map_or(end, |hour_end| min(end, hour_end));
            let overlap_ms = (overlap_end - max(start, hour_start))
                .num_milliseconds()
                .max(0);
            let starts_here =
                start >= hour_start && hour_end.map_or(true, |hour_end| start < hour_end);

            if overlap_ms > 0 || starts_here {
                let bucket = &mut hours[hour_start.hour() as usize];
                let totals = bucket
                    .totals_by_behavior
                    .entry(record.behavior.clone())
                    .or_default();

                if overlap_ms > 0 {
                    totals.duration_ms += overlap_ms;
                    bucket.total_duration_ms += overlap_ms;
                }
                if starts_here {
                    totals.occurrences += 1;
                    bucket.total_occurrences += 1;
                }
            }

            match hour_end {
                Some(next) => hour_start = next,
                None => break,
            }
        }
    }

    HourlySeries { hours }
}

/// Credit `days` full hours of `behavior` to every bucket.
///
/// Used for the middle of a record spanning more than a day, where each of those
/// hours lies entirely inside the record and none of them holds its start.
fn add_whole_days(hours: &mut [HourBucket], behavior: &str, days: i64) {
    let ms = days.saturating_mul(MS_PER_HOUR);
    for bucket in hours.iter_mut() {
        let totals = bucket.totals_by_behavior.entry(behavior.to_string()).or_default();
        totals.duration_ms = totals.duration_ms.saturating_add(ms);
        bucket.total_duration_ms = bucket.total_duration_ms.saturating_add(ms);
    }
}

/// Top of the local hour containing `instant`
fn floor_to_hour(instant: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
    instant.with_minute(0)?.with_second(0)?.with_nanosecond(0)
}
