//! Report configuration
//!
//! Settings shared by the report pipeline, the CLI and the FFI layer. A config can
//! be loaded from a JSON file; every field has a default.

use std::fs;
use std::path::Path;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::activity::peaks::DEFAULT_TOP_N;
use crate::activity::types::PeakMetric;
use crate::error::AggregateError;

/// Settings for building a daily report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Local UTC offset, e.g. `"+02:00"`, `"Z"` or `120` (minutes east of UTC)
    pub utc_offset: UtcOffsetSetting,
    /// Number of peak hours to report per metric
    pub top_n: usize,
    /// Peak ranking listed first in report tables and used by `peaks` without `--by`
    pub peak_metric: PeakMetric,
    /// Behaviors to keep; empty keeps all
    pub behaviors: Vec<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            utc_offset: UtcOffsetSetting::default(),
            top_n: DEFAULT_TOP_N,
            peak_metric: PeakMetric::Duration,
            behaviors: Vec::new(),
        }
    }
}

impl ReportConfig {
    pub fn from_json(json: &str) -> Result<Self, AggregateError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, AggregateError> {
        let json = fs::read_to_string(path).map_err(|e| {
            AggregateError::ParseError(format!("Cannot read config {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Parse [`ReportConfig::utc_offset`]
    pub fn resolve_offset(&self) -> Result<FixedOffset, AggregateError> {
        self.utc_offset.resolve()
    }
}

/// A UTC offset as written in a config file: text or whole minutes east of UTC
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UtcOffsetSetting {
    Minutes(i32),
    Text(String),
}

impl Default for UtcOffsetSetting {
    fn default() -> Self {
        UtcOffsetSetting::Text("+00:00".to_string())
    }
}

impl UtcOffsetSetting {
    pub fn resolve(&self) -> Result<FixedOffset, AggregateError> {
        match self {
            UtcOffsetSetting::Text(text) => parse_utc_offset(text),
            UtcOffsetSetting::Minutes(minutes) => {
                if minutes.unsigned_abs() >= 24 * 60 {
                    return Err(AggregateError::InvalidTimezone(format!("{minutes} minutes")));
                }
                FixedOffset::east_opt(minutes * 60)
                    .ok_or_else(|| AggregateError::InvalidTimezone(format!("{minutes} minutes")))
            }
        }
    }
}

impl From<&str> for UtcOffsetSetting {
    fn from(text: &str) -> Self {
        UtcOffsetSetting::Text(text.to_string())
    }
}

impl From<i32> for UtcOffsetSetting {
    fn from(minutes: i32) -> Self {
        UtcOffsetSetting::Minutes(minutes)
    }
}

/// Parse `Z`, `UTC`, `+HH:MM`, `-HH:MM` or `+HHMM` into a fixed offset
pub fn parse_utc_offset(text: &str) -> Result<FixedOffset, AggregateError> {
    let invalid = || AggregateError::InvalidTimezone(text.to_string());
    let trimmed = text.trim();

    if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }

    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'+') => (1, &trimmed[1..]),
        Some(b'-') => (-1, &trimmed[1..]),
        _ => return Err(invalid()),
    };

    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let hours: i32 = digits[..2].parse().map_err(|_| invalid())?;
    let minutes: i32 = digits[2..].parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}
