//! Display formatting for durations and percentages

/// Render a millisecond duration as `H:MM` (one hour or more) or `M:SS`.
///
/// Seconds are dropped once the value reaches an hour. Non-positive and
/// non-finite input renders as `0:00`.
pub fn format_ms(ms: f64) -> String {
    if !ms.is_finite() || ms <= 0.0 {
        return "0:00".to_string();
    }

    let total_sec = (ms / 1000.0).floor() as u64;
    let hours = total_sec / 3600;
    let minutes = (total_sec % 3600) / 60;
    let seconds = total_sec % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

/// Render a percentage with one decimal place, e.g. `16.7%`
pub fn format_percent(percent: f64) -> String {
    if !percent.is_finite() {
        return "0.0%".to_string();
    }
    format!("{percent:.1}%")
}
