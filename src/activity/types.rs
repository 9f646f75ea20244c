//! Activity data types
//!
//! This module defines the activity records that flow into the aggregator and the
//! derived structures (per-behavior metrics, hour buckets, peak entries) it produces.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AggregateError;

/// Sentinel label for records without a behavior
pub const UNKNOWN_BEHAVIOR: &str = "Unknown";

/// Number of hour buckets in a day
pub const HOURS_PER_DAY: usize = 24;

/// Display taxonomy used by the dashboard legend.
///
/// The aggregator accepts any label; this list only drives mock data and colors.
pub const DISPLAY_BEHAVIORS: [&str; 6] = [
    "Recumbent",
    "Non-Recumbent",
    "Scratching",
    "Self-Directed",
    "Pacing",
    "Moving",
];

/// Map an optional raw label onto a behavior, falling back to [`UNKNOWN_BEHAVIOR`]
pub fn normalize_behavior(label: Option<&str>) -> String {
    match label {
        Some(l) if !l.trim().is_empty() => l.to_string(),
        _ => UNKNOWN_BEHAVIOR.to_string(),
    }
}

/// One observed instance of a behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Opaque identifier, not required to be unique
    pub id: String,
    /// Behavior label (never empty once normalized)
    pub behavior: String,
    /// Interval start
    pub start: DateTime<Utc>,
    /// Interval end (expected `>= start`, not enforced)
    pub end: DateTime<Utc>,
}

impl ActivityRecord {
    /// Build a record, normalizing a blank behavior to [`UNKNOWN_BEHAVIOR`]
    pub fn new(
        id: impl Into<String>,
        behavior: Option<&str>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            behavior: normalize_behavior(behavior),
            start,
            end,
        }
    }

    /// Unclipped duration in milliseconds, clamped to zero
    pub fn duration_ms(&self) -> i64 {
        (self.end - self.start).num_milliseconds().max(0)
    }
}

/// The instant range of a single day's report.
///
/// The offset carried by `day_start` defines "local" time for hour bucketing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayWindow {
    pub day_start: DateTime<FixedOffset>,
    pub day_end: DateTime<FixedOffset>,
}

impl DayWindow {
    pub fn new(day_start: DateTime<FixedOffset>, day_end: DateTime<FixedOffset>) -> Self {
        Self { day_start, day_end }
    }

    /// Local 00:00:00.000 to 23:59:59.999 of `date` in `offset`
    pub fn for_date(date: NaiveDate, offset: FixedOffset) -> Result<Self, AggregateError> {
        let start = date
            .and_hms_milli_opt(0, 0, 0, 0)
            .and_then(|naive| offset.from_local_datetime(&naive).single())
            .ok_or_else(|| AggregateError::InvalidWindow(format!("no local midnight for {date}")))?;
        let end = date
            .and_hms_milli_opt(23, 59, 59, 999)
            .and_then(|naive| offset.from_local_datetime(&naive).single())
            .ok_or_else(|| AggregateError::InvalidWindow(format!("no local day end for {date}")))?;
        Ok(Self::new(start, end))
    }

    /// Parse a `YYYY-MM-DD` date into its local day window
    pub fn parse_date(date: &str, offset: FixedOffset) -> Result<Self, AggregateError> {
        let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
            .map_err(|e| AggregateError::DateParseError(format!("{date}: {e}")))?;
        Self::for_date(date, offset)
    }

    /// `max(0, day_end - day_start)` in milliseconds
    pub fn total_day_ms(&self) -> i64 {
        (self.day_end - self.day_start).num_milliseconds().max(0)
    }

    /// Offset defining local time for this day
    pub fn offset(&self) -> FixedOffset {
        *self.day_start.offset()
    }

    /// Whether `instant` falls within `[day_start, day_end]`
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.day_start.with_timezone(&Utc) && instant <= self.day_end.with_timezone(&Utc)
    }
}

/// Summary statistics for one behavior within a day window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerBehaviorMetric {
    pub behavior: String,
    /// Records carrying this label, including ones clipped to zero duration
    pub occurrences: u32,
    /// Sum of each record's overlap with the day window
    pub total_duration_ms: i64,
    /// `total_duration_ms / occurrences`, 0 without occurrences
    pub avg_duration_ms: f64,
    /// Share of the day window in percent, 0 for an empty window
    pub percent_of_day: f64,
}

/// Result of per-behavior aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorMetrics {
    pub by_behavior: BTreeMap<String, PerBehaviorMetric>,
    pub total_day_ms: i64,
}

/// Duration and occurrences of one behavior inside one hour
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviorHourTotals {
    pub duration_ms: i64,
    pub occurrences: u32,
}

/// One local hour of the day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourBucket {
    /// Local hour, 0-23
    pub hour: u32,
    pub totals_by_behavior: BTreeMap<String, BehaviorHourTotals>,
    pub total_duration_ms: i64,
    pub total_occurrences: u32,
}

impl HourBucket {
    pub fn empty(hour: u32) -> Self {
        Self {
            hour,
            totals_by_behavior: BTreeMap::new(),
            total_duration_ms: 0,
            total_occurrences: 0,
        }
    }
}

/// Hour-indexed breakdown of a day (24 buckets when built by the aggregator)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourlySeries {
    pub hours: Vec<HourBucket>,
}

/// Metric used to rank peak hours
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeakMetric {
    #[default]
    Duration,
    Occurrences,
}

/// A ranked hour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeakEntry {
    pub hour: u32,
    /// Duration in milliseconds or occurrence count, per the ranking metric
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, h, m, 0).unwrap()
    }

    #[test]
    fn test_blank_behavior_becomes_unknown() {
        assert_eq!(normalize_behavior(None), "Unknown");
        assert_eq!(normalize_behavior(Some("")), "Unknown");
        assert_eq!(normalize_behavior(Some("   ")), "Unknown");
        assert_eq!(normalize_behavior(Some("Pacing")), "Pacing");
    }

    #[test]
    fn test_record_duration_clamps_to_zero() {
        let forward = ActivityRecord::new("a", Some("Moving"), utc(1, 0), utc(1, 30));
        assert_eq!(forward.duration_ms(), 30 * 60 * 1000);

        let backward = ActivityRecord::new("b", Some("Moving"), utc(2, 0), utc(1, 0));
        assert_eq!(backward.duration_ms(), 0);
    }

    #[test]
    fn test_day_window_for_date() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let window = DayWindow::parse_date("2024-01-15", offset).unwrap();

        assert_eq!(window.day_start.to_rfc3339(), "2024-01-15T00:00:00+02:00");
        assert_eq!(window.total_day_ms(), 86_400_000 - 1);
        assert_eq!(window.offset(), offset);
        assert!(window.contains(Utc.with_ymd_and_hms(2024, 1, 14, 22, 0, 0).unwrap()));
        assert!(!window.contains(Utc.with_ymd_and_hms(2024, 1, 14, 21, 59, 59).unwrap()));
    }

    #[test]
    fn test_inverted_window_has_zero_length() {
        let offset = FixedOffset::east_opt(0).unwrap();
        let window = DayWindow::new(
            offset.with_ymd_and_hms(2024, 1, 16, 0, 0, 0).unwrap(),
            offset.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap(),
        );
        assert_eq!(window.total_day_ms(), 0);
    }

    #[test]
    fn test_invalid_date_is_rejected() {
        let offset = FixedOffset::east_opt(0).unwrap();
        assert!(DayWindow::parse_date("2024-13-40", offset).is_err());
    }

    #[test]
    fn test_peak_metric_serialization() {
        let json = serde_json::to_string(&PeakMetric::Occurrences).unwrap();
        assert_eq!(json, "\"occurrences\"");
        assert_eq!(PeakMetric::default(), PeakMetric::Duration);
    }
}
