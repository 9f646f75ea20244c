//! VizAI Activity - behavior telemetry aggregation for the VizAI dashboard
//!
//! Turns a day's interval-tagged animal-behavior records into the numbers the
//! dashboard renders, through a deterministic pipeline: record adaptation →
//! behavior filtering → per-behavior metrics, hourly series and peak ranking →
//! report encoding.
//!
//! ## Modules
//!
//! - **Activity**: the aggregator itself, plus the adapter and report pipeline
//! - **Store**: key-value port for filter state and presets
//! - **Mock**: the fixed sample day and a seeded generator

pub mod activity;
pub mod config;
pub mod error;
pub mod format;
pub mod mock;
pub mod store;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use activity::{
    activity_to_report, build_hourly_series, compute_per_behavior_metrics, find_peak_hours,
    ActivityRecord, DayWindow, PeakMetric, ReportProcessor,
};
pub use config::{ReportConfig, UtcOffsetSetting};
pub use error::AggregateError;
pub use format::{format_ms, format_percent};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};

/// VizAI version embedded in all reports
pub const VIZAI_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "vizai-activity";
