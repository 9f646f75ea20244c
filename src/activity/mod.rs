//! Activity aggregation module
//!
//! This module turns a day's interval-tagged animal-behavior records into the
//! numbers the VizAI dashboard renders: per-behavior summary statistics, an
//! hour-of-day breakdown and ranked peak hours.
//!
//! Pipeline: Activity JSON → Adapter → Filter → Metrics / Hourly / Peaks → Report JSON

pub mod adapter;
pub mod hourly;
pub mod metrics;
pub mod peaks;
pub mod pipeline;
pub mod report;
pub mod types;

pub use adapter::{ActivityAdapter, RawActivityRecord, ValidationError};
pub use hourly::build_hourly_series;
pub use metrics::compute_per_behavior_metrics;
pub use peaks::{find_peak_hours, DEFAULT_TOP_N};
pub use pipeline::{activity_to_report, filter_by_behaviors, ReportProcessor};
pub use report::{DailyReport, ReportEncoder, ReportFlag};
pub use types::{
    ActivityRecord, BehaviorHourTotals, BehaviorMetrics, DayWindow, HourBucket, HourlySeries,
    PeakEntry, PeakMetric, PerBehaviorMetric, DISPLAY_BEHAVIORS, UNKNOWN_BEHAVIOR,
};
