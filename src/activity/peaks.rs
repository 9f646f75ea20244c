//! Peak hour ranking

use crate::activity::types::{HourlySeries, PeakEntry, PeakMetric};

/// Default number of peak hours reported
pub const DEFAULT_TOP_N: usize = 3;

/// Rank hours by `by`, highest first, keeping at most `top_n` entries.
///
/// The sort is stable, so hours with equal totals stay in ascending hour order.
pub fn find_peak_hours(series: &HourlySeries, by: PeakMetric, top_n: usize) -> Vec<PeakEntry> {
    let mut ranked: Vec<PeakEntry> = series
        .hours
        .iter()
        .map(|bucket| PeakEntry {
            hour: bucket.hour,
            total: match by {
                PeakMetric::Duration => bucket.total_duration_ms,
                PeakMetric::Occurrences => i64::from(bucket.total_occurrences),
            },
        })
        .collect();

    ranked.sort_by(|a, b| b.total.cmp(&a.total));
    ranked.truncate(top_n);
    ranked
}
