//! Activity pipeline orchestration
//!
//! This module provides the public API for turning activity JSON into a daily
//! report: parse → normalize → filter → aggregate → encode.

use std::collections::BTreeSet;

use crate::activity::adapter::ActivityAdapter;
use crate::activity::report::{DailyReport, ReportEncoder};
use crate::activity::types::{ActivityRecord, DayWindow};
use crate::config::ReportConfig;
use crate::error::AggregateError;
use crate::store::{
    load_json, save_json, FilterPresets, FilterState, KeyValueStore, MemoryStore, FILTERS_KEY,
    PRESETS_KEY,
};

/// Keep records whose behavior is in `behaviors`; an empty set keeps everything
pub fn filter_by_behaviors(
    records: &[ActivityRecord],
    behaviors: &BTreeSet<String>,
) -> Vec<ActivityRecord> {
    if behaviors.is_empty() {
        return records.to_vec();
    }
    records
        .iter()
        .filter(|r| behaviors.contains(&r.behavior))
        .cloned()
        .collect()
}

/// Convert activity JSON (array or NDJSON) to a daily report JSON (stateless, one-shot).
///
/// # Arguments
/// * `records_json` - Activity records
/// * `day` - Calendar day as `YYYY-MM-DD`, interpreted in the config's UTC offset
/// * `config` - Report settings; `config.behaviors` filters the input
///
/// # Example
/// ```ignore
/// let report_json = activity_to_report(records_json, "2024-01-15", &ReportConfig::default())?;
/// ```
pub fn activity_to_report(
    records_json: &str,
    day: &str,
    config: &ReportConfig,
) -> Result<String, AggregateError> {
    let offset = config.resolve_offset()?;
    let window = DayWindow::parse_date(day, offset)?;

    let raw = ActivityAdapter::parse_auto(records_json)?;
    let records = ActivityAdapter::to_records(&raw, offset)?;

    let filter = FilterState::from_behaviors(config.behaviors.iter().cloned());
    let encoder = ReportEncoder::new();
    let report = build_daily_report(&encoder, &records, &window, &filter, config.top_n);
    encoder.encode_to_json(&report)
}

/// Filter and aggregate typed records into a report
pub fn build_daily_report(
    encoder: &ReportEncoder,
    records: &[ActivityRecord],
    window: &DayWindow,
    filter: &FilterState,
    top_n: usize,
) -> DailyReport {
    let filtered = filter_by_behaviors(records, &filter.behaviors);
    if filtered.len() != records.len() {
        log::debug!(
            "behavior filter kept {} of {} records",
            filtered.len(),
            records.len()
        );
    }
    encoder.encode(
        &filtered,
        window,
        filter.behaviors.iter().cloned().collect(),
        top_n,
    )
}

/// Stateful processor that remembers the behavior filter and presets in a store.
///
/// A non-empty `config.behaviors` takes precedence over the stored filter.
pub struct ReportProcessor<S: KeyValueStore = MemoryStore> {
    config: ReportConfig,
    encoder: ReportEncoder,
    store: S,
}

impl ReportProcessor<MemoryStore> {
    /// Create a processor with an in-memory store
    pub fn new(config: ReportConfig) -> Self {
        Self::with_store(config, MemoryStore::new())
    }
}

impl<S: KeyValueStore> ReportProcessor<S> {
    /// Create a processor persisting its filter state in `store`
    pub fn with_store(config: ReportConfig, store: S) -> Self {
        Self {
            config,
            encoder: ReportEncoder::new(),
            store,
        }
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Process activity JSON for `day` and return report JSON
    pub fn process(&self, records_json: &str, day: &str) -> Result<String, AggregateError> {
        let offset = self.config.resolve_offset()?;
        let window = DayWindow::parse_date(day, offset)?;

        let raw = ActivityAdapter::parse_auto(records_json)?;
        let records = ActivityAdapter::to_records(&raw, offset)?;

        let report = self.process_records(&records, &window);
        self.encoder.encode_to_json(&report)
    }

    /// Aggregate typed records with the effective filter
    pub fn process_records(&self, records: &[ActivityRecord], window: &DayWindow) -> DailyReport {
        let filter = self.effective_filter();
        build_daily_report(&self.encoder, records, window, &filter, self.config.top_n)
    }

    fn effective_filter(&self) -> FilterState {
        if self.config.behaviors.is_empty() {
            self.filter()
        } else {
            FilterState::from_behaviors(self.config.behaviors.iter().cloned())
        }
    }

    /// The stored filter (empty when nothing is stored or the store is unreadable)
    pub fn filter(&self) -> FilterState {
        load_json(&self.store, FILTERS_KEY)
    }

    pub fn set_filter(&mut self, filter: &FilterState) {
        save_json(&mut self.store, FILTERS_KEY, filter);
    }

    pub fn clear_filter(&mut self) {
        if let Err(e) = self.store.remove(FILTERS_KEY) {
            log::warn!("cannot clear stored filter: {e}");
        }
    }

    pub fn presets(&self) -> FilterPresets {
        load_json(&self.store, PRESETS_KEY)
    }

    /// Save the stored filter under `name`, replacing any preset with that name
    pub fn save_preset(&mut self, name: &str) {
        let mut presets = self.presets();
        presets.insert(name.to_string(), self.filter());
        save_json(&mut self.store, PRESETS_KEY, &presets);
    }

    /// Make preset `name` the stored filter; returns false when it does not exist
    pub fn apply_preset(&mut self, name: &str) -> bool {
        match self.presets().remove(name) {
            Some(filter) => {
                self.set_filter(&filter);
                true
            }
            None => false,
        }
    }

    pub fn delete_preset(&mut self, name: &str) -> bool {
        let mut presets = self.presets();
        let removed = presets.remove(name).is_some();
        if removed {
            save_json(&mut self.store, PRESETS_KEY, &presets);
        }
        removed
    }
}
