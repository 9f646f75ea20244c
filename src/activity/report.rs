//! Daily report encoder
//!
//! Combines per-behavior metrics, the hourly series and peak rankings into a
//! single serializable report for the dashboard.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::activity::hourly::build_hourly_series;
use crate::activity::metrics::compute_per_behavior_metrics;
use crate::activity::peaks::find_peak_hours;
use crate::activity::types::{ActivityRecord, DayWindow, HourBucket, PeakEntry, PeakMetric};
use crate::error::AggregateError;
use crate::format::{format_ms, format_percent};
use crate::{PRODUCER_NAME, VIZAI_VERSION};

/// Producer metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// The day a report covers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportWindow {
    /// Day start (RFC3339, local offset)
    pub start: String,
    /// Day end (RFC3339, local offset)
    pub end: String,
    pub utc_offset: String,
    pub total_day_ms: i64,
}

/// One row of the behavior summary table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorSummaryRow {
    pub behavior: String,
    pub occurrences: u32,
    pub total_duration_ms: i64,
    pub avg_duration_ms: f64,
    pub percent_of_day: f64,
    pub total_duration: String,
    pub avg_duration: String,
    pub percent: String,
}

/// Peak hours ranked by both metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeakSummary {
    pub by_duration: Vec<PeakEntry>,
    pub by_occurrences: Vec<PeakEntry>,
}

impl PeakSummary {
    pub fn for_metric(&self, metric: PeakMetric) -> &[PeakEntry] {
        match metric {
            PeakMetric::Duration => &self.by_duration,
            PeakMetric::Occurrences => &self.by_occurrences,
        }
    }

    /// Both rankings, `lead` first
    pub fn ordered(&self, lead: PeakMetric) -> [(PeakMetric, &[PeakEntry]); 2] {
        let other = match lead {
            PeakMetric::Duration => PeakMetric::Occurrences,
            PeakMetric::Occurrences => PeakMetric::Duration,
        };
        [(lead, self.for_metric(lead)), (other, self.for_metric(other))]
    }
}

/// Conditions worth surfacing next to a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFlag {
    /// No records survived filtering
    NoRecords,
    /// The day window has zero length
    EmptyWindow,
    /// Some records start outside the day; they count as occurrences and alias into hour buckets
    RecordsOutsideWindow,
    /// Some records end before they start
    EndBeforeStart,
}

/// Everything the dashboard renders for one day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyReport {
    pub producer: ReportProducer,
    pub computed_at_utc: String,
    pub window: ReportWindow,
    pub record_count: usize,
    /// Behaviors the input was filtered to; empty when unfiltered
    pub filter: Vec<String>,
    /// Sorted by descending total duration, then label
    pub behaviors: Vec<BehaviorSummaryRow>,
    pub hours: Vec<HourBucket>,
    pub peaks: PeakSummary,
    pub flags: Vec<ReportFlag>,
}

/// Daily report encoder
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Aggregate `records` over `window` into a report
    pub fn encode(
        &self,
        records: &[ActivityRecord],
        window: &DayWindow,
        filter: Vec<String>,
        top_n: usize,
    ) -> DailyReport {
        let metrics = compute_per_behavior_metrics(records, window.day_start, window.day_end);
        let series = build_hourly_series(records, window.day_start);
        let peaks = PeakSummary {
            by_duration: find_peak_hours(&series, PeakMetric::Duration, top_n),
            by_occurrences: find_peak_hours(&series, PeakMetric::Occurrences, top_n),
        };

        let mut behaviors: Vec<BehaviorSummaryRow> = metrics
            .by_behavior
            .into_values()
            .map(|m| BehaviorSummaryRow {
                total_duration: format_ms(m.total_duration_ms as f64),
                avg_duration: format_ms(m.avg_duration_ms),
                percent: format_percent(m.percent_of_day),
                behavior: m.behavior,
                occurrences: m.occurrences,
                total_duration_ms: m.total_duration_ms,
                avg_duration_ms: m.avg_duration_ms,
                percent_of_day: m.percent_of_day,
            })
            .collect();
        behaviors.sort_by(|a, b| b.total_duration_ms.cmp(&a.total_duration_ms));

        let flags = collect_flags(records, window);
        log::debug!(
            "report for {}: {} records, {} behaviors, flags {:?}",
            window.day_start.date_naive(),
            records.len(),
            behaviors.len(),
            flags
        );

        DailyReport {
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: VIZAI_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            computed_at_utc: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            window: ReportWindow {
                start: window.day_start.to_rfc3339_opts(SecondsFormat::Millis, false),
                end: window.day_end.to_rfc3339_opts(SecondsFormat::Millis, false),
                utc_offset: window.offset().to_string(),
                total_day_ms: metrics.total_day_ms,
            },
            record_count: records.len(),
            filter,
            behaviors,
            hours: series.hours,
            peaks,
            flags,
        }
    }

    /// Encode a report to a JSON string
    pub fn encode_to_json(&self, report: &DailyReport) -> Result<String, AggregateError> {
        serde_json::to_string(report).map_err(|e| AggregateError::EncodingError(e.to_string()))
    }
}

fn collect_flags(records: &[ActivityRecord], window: &DayWindow) -> Vec<ReportFlag> {
    let mut flags = Vec::new();

    if records.is_empty() {
        flags.push(ReportFlag::NoRecords);
    }
    if window.total_day_ms() == 0 {
        flags.push(ReportFlag::EmptyWindow);
    }

    let outside = records.iter().filter(|r| !window.contains(r.start)).count();
    if outside > 0 {
        log::warn!(
            "{outside} record(s) start outside {}; hour buckets use their local hour",
            window.day_start.date_naive()
        );
        flags.push(ReportFlag::RecordsOutsideWindow);
    }

    if records.iter().any(|r| r.end < r.start) {
        flags.push(ReportFlag::EndBeforeStart);
    }

    flags
}
