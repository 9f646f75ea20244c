//! Activity record adapter
//!
//! Parses loosely-shaped activity JSON (an array or NDJSON) and normalizes it into
//! typed [`ActivityRecord`]s. Blank behaviors become `"Unknown"` here, so the
//! aggregation loops never see an empty label.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::activity::types::{normalize_behavior, ActivityRecord};
use crate::error::AggregateError;

/// Layouts accepted for timestamps without an explicit offset
const LOCAL_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// A timestamp as it appears in input: text or epoch milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    EpochMillis(i64),
    Text(String),
}

impl RawTimestamp {
    /// Resolve to an instant.
    ///
    /// RFC 3339 text keeps its own offset; text without an offset is read as local
    /// time in `local`.
    pub fn resolve(&self, local: FixedOffset) -> Option<DateTime<Utc>> {
        match self {
            RawTimestamp::EpochMillis(ms) => Utc.timestamp_millis_opt(*ms).single(),
            RawTimestamp::Text(text) => {
                let text = text.trim();
                if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
                    return Some(dt.with_timezone(&Utc));
                }
                LOCAL_TIMESTAMP_FORMATS.iter().find_map(|fmt| {
                    NaiveDateTime::parse_from_str(text, fmt)
                        .ok()
                        .and_then(|naive| local.from_local_datetime(&naive).single())
                        .map(|dt| dt.with_timezone(&Utc))
                })
            }
        }
    }
}

impl std::fmt::Display for RawTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawTimestamp::EpochMillis(ms) => write!(f, "{ms}"),
            RawTimestamp::Text(text) => write!(f, "{text}"),
        }
    }
}

/// Activity record as received from a producer, before normalization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawActivityRecord {
    /// Identifier; strings and numbers are both accepted
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub behavior: Option<String>,
    #[serde(default)]
    pub start: Option<RawTimestamp>,
    #[serde(default)]
    pub end: Option<RawTimestamp>,
}

impl RawActivityRecord {
    /// Identifier rendered as text, if any
    pub fn id_text(&self) -> Option<String> {
        match &self.id {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        }
    }

    /// Convert to a typed record. `index` names records that carry no id.
    pub fn normalize(
        &self,
        index: usize,
        local: FixedOffset,
    ) -> Result<ActivityRecord, ValidationError> {
        let start = resolve_field(self.start.as_ref(), "start", local)?;
        let end = resolve_field(self.end.as_ref(), "end", local)?;
        let id = self.id_text().unwrap_or_else(|| format!("record-{}", index + 1));

        Ok(ActivityRecord {
            id,
            behavior: normalize_behavior(self.behavior.as_deref()),
            start,
            end,
        })
    }

    /// Full validation, including the interval order the aggregator tolerates
    pub fn validate(&self, local: FixedOffset) -> Result<(), ValidationError> {
        let start = resolve_field(self.start.as_ref(), "start", local)?;
        let end = resolve_field(self.end.as_ref(), "end", local)?;
        if end < start {
            return Err(ValidationError::EndBeforeStart {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }
        Ok(())
    }
}

fn resolve_field(
    value: Option<&RawTimestamp>,
    field: &'static str,
    local: FixedOffset,
) -> Result<DateTime<Utc>, ValidationError> {
    let raw = value.ok_or(ValidationError::MissingTimestamp { field })?;
    raw.resolve(local).ok_or_else(|| ValidationError::InvalidTimestamp {
        field,
        value: raw.to_string(),
    })
}

/// Validation errors for raw activity records
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing timestamp: {field}")]
    MissingTimestamp { field: &'static str },

    #[error("Invalid {field} timestamp: {value}")]
    InvalidTimestamp { field: &'static str, value: String },

    #[error("Interval ends before it starts: {start} > {end}")]
    EndBeforeStart { start: String, end: String },
}

/// Result of validating one record in a batch
#[derive(Debug)]
pub struct ValidationResult {
    pub index: usize,
    pub record_id: Option<String>,
    pub error: ValidationError,
}

/// Adapter from activity JSON to typed records
pub struct ActivityAdapter;

impl ActivityAdapter {
    /// Parse a JSON array of raw records
    pub fn parse_array(json: &str) -> Result<Vec<RawActivityRecord>, AggregateError> {
        let records: Vec<RawActivityRecord> = serde_json::from_str(json)?;
        Ok(records)
    }

    /// Parse NDJSON (one raw record per line, blank lines skipped)
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<RawActivityRecord>, AggregateError> {
        let mut records = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<RawActivityRecord>(trimmed) {
                Ok(record) => records.push(record),
                Err(e) => {
                    return Err(AggregateError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(records)
    }

    /// Parse either shape, picking the array form when the text starts with `[`
    pub fn parse_auto(input: &str) -> Result<Vec<RawActivityRecord>, AggregateError> {
        if input.trim_start().starts_with('[') {
            Self::parse_array(input)
        } else {
            Self::parse_ndjson(input)
        }
    }

    /// Normalize raw records into typed records.
    ///
    /// Unreadable timestamps are rejected; intervals ending before they start are
    /// kept (they aggregate to zero duration) and logged.
    pub fn to_records(
        raw: &[RawActivityRecord],
        local: FixedOffset,
    ) -> Result<Vec<ActivityRecord>, AggregateError> {
        let mut records = Vec::with_capacity(raw.len());
        for (index, item) in raw.iter().enumerate() {
            let record = item.normalize(index, local).map_err(|e| {
                AggregateError::ParseError(format!("Invalid record at index {index}: {e}"))
            })?;
            if record.end < record.start {
                log::warn!(
                    "record {} ends before it starts; it will aggregate to zero duration",
                    record.id
                );
            }
            records.push(record);
        }
        log::debug!("normalized {} activity records", records.len());
        Ok(records)
    }

    /// Validate a batch, returning only the failures
    pub fn validate_records(raw: &[RawActivityRecord], local: FixedOffset) -> Vec<ValidationResult> {
        raw.iter()
            .enumerate()
            .filter_map(|(index, item)| {
                item.validate(local).err().map(|error| ValidationResult {
                    index,
                    record_id: item.id_text(),
                    error,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn test_parse_array_and_normalize() {
        let json = r#"[
            {"id": "a1", "behavior": "Pacing", "start": "2024-01-15T09:00:00Z", "end": "2024-01-15T09:20:00Z"},
            {"id": 7, "behavior": "", "start": "2024-01-15T10:00:00Z", "end": "2024-01-15T10:05:00Z"},
            {"start": 1705312800000, "end": 1705313100000}
        ]"#;

        let raw = ActivityAdapter::parse_array(json).unwrap();
        let records = ActivityAdapter::to_records(&raw, utc()).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].id, "a1");
        assert_eq!(records[0].behavior, "Pacing");
        assert_eq!(records[0].duration_ms(), 20 * 60_000);
        assert_eq!(records[1].id, "7");
        assert_eq!(records[1].behavior, "Unknown");
        assert_eq!(records[2].id, "record-3");
        assert_eq!(records[2].behavior, "Unknown");
        assert_eq!(records[2].start, Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap());
        assert_eq!(records[2].duration_ms(), 5 * 60_000);
    }

    #[test]
    fn test_local_timestamps_use_offset() {
        let offset = FixedOffset::east_opt(-5 * 3600).unwrap();
        let ts = RawTimestamp::Text("2024-01-15T08:00:00".to_string());

        assert_eq!(
            ts.resolve(offset),
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 13, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_rfc3339_keeps_its_own_offset() {
        let offset = FixedOffset::east_opt(9 * 3600).unwrap();
        let ts = RawTimestamp::Text("2024-01-15T08:00:00+01:00".to_string());

        assert_eq!(
            ts.resolve(offset),
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 7, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_parse_ndjson_reports_line() {
        let ndjson = "{\"id\":\"1\",\"start\":\"2024-01-15T01:00:00Z\",\"end\":\"2024-01-15T02:00:00Z\"}\n\nnot json\n";
        let err = ActivityAdapter::parse_ndjson(ndjson).unwrap_err();
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_parse_auto_detects_shape() {
        let array = r#"[{"id":"1","start":"2024-01-15T01:00:00Z","end":"2024-01-15T02:00:00Z"}]"#;
        let ndjson = r#"{"id":"1","start":"2024-01-15T01:00:00Z","end":"2024-01-15T02:00:00Z"}"#;

        assert_eq!(ActivityAdapter::parse_auto(array).unwrap().len(), 1);
        assert_eq!(ActivityAdapter::parse_auto(ndjson).unwrap().len(), 1);
    }

    #[test]
    fn test_unreadable_timestamp_is_rejected() {
        let json = r#"[{"id":"x","behavior":"Moving","start":"yesterday","end":"2024-01-15T02:00:00Z"}]"#;
        let raw = ActivityAdapter::parse_array(json).unwrap();

        let err = ActivityAdapter::to_records(&raw, utc()).unwrap_err();
        assert!(matches!(err, AggregateError::ParseError(_)));
    }

    #[test]
    fn test_end_before_start_is_kept_but_flagged_by_validation() {
        let json = r#"[{"id":"r","behavior":"Moving","start":"2024-01-15T03:00:00Z","end":"2024-01-15T02:00:00Z"}]"#;
        let raw = ActivityAdapter::parse_array(json).unwrap();

        let records = ActivityAdapter::to_records(&raw, utc()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].duration_ms(), 0);

        let failures = ActivityAdapter::validate_records(&raw, utc());
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].index, 0);
        assert_eq!(failures[0].record_id.as_deref(), Some("r"));
        assert!(matches!(failures[0].error, ValidationError::EndBeforeStart { .. }));
    }

    #[test]
    fn test_missing_end_is_reported() {
        let json = r#"[{"id":"m","start":"2024-01-15T03:00:00Z"}]"#;
        let raw = ActivityAdapter::parse_array(json).unwrap();

        let failures = ActivityAdapter::validate_records(&raw, utc());
        assert_eq!(
            failures[0].error,
            ValidationError::MissingTimestamp { field: "end" }
        );
    }
}
