// crates/rum-core/src/core/stats.rs
// ============================================================================
// Module: Aggregate Statistics
// Description: Dashboard statistics and report summary shapes.
// Purpose: Define aggregate contracts and the reference computation over rows.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`StatsReport`] backs the dashboard: counts, zero-excluding averages, the
//! nearest-rank 75th percentile of LCP, and the slowest URLs. [`ReportSummary`]
//! backs the periodic email. Backends may compute these in SQL; the
//! `from_records` constructors are the reference semantics and are used by
//! the in-memory backend.
//!
//! All published numbers are rounded to three decimals.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::record::PerformanceRecord;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Number of URLs listed in each slowest-URL table.
pub const SLOWEST_URL_LIMIT: usize = 5;

// ============================================================================
// SECTION: Dashboard Stats
// ============================================================================

/// URL grouped by average LCP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlLcpAggregate {
    /// Page URL.
    pub url: String,
    /// Average LCP in seconds.
    pub avg_lcp: f64,
    /// Hits in the group.
    pub count: u64,
}

/// URL grouped by average server generation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlServerAggregate {
    /// Page URL.
    pub url: String,
    /// Average server time in seconds.
    pub avg_srv: f64,
    /// Hits in the group.
    pub count: u64,
}

/// Aggregate statistics over a filtered record set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsReport {
    /// Matching row count.
    pub count: u64,
    /// Average TTFB over measured rows.
    pub avg_ttfb: f64,
    /// Average LCP over measured rows.
    pub avg_lcp: f64,
    /// Average server time over measured rows.
    pub avg_server: f64,
    /// Average total load over measured rows.
    pub avg_load: f64,
    /// Nearest-rank 75th percentile of LCP.
    pub p75_lcp: f64,
    /// Slowest URLs by average LCP.
    pub slowest_lcp: Vec<UrlLcpAggregate>,
    /// Slowest URLs by average server time.
    pub slowest_srv: Vec<UrlServerAggregate>,
}

impl StatsReport {
    /// Computes statistics over already-filtered records.
    #[must_use]
    pub fn from_records(records: &[&PerformanceRecord]) -> Self {
        let count = records.len() as u64;
        let mut lcps: Vec<f64> = records.iter().map(|record| record.lcp).collect();
        lcps.sort_by(f64::total_cmp);
        let groups = group_by_url(records);
        let mut slowest_lcp: Vec<UrlLcpAggregate> = groups
            .iter()
            .map(|(url, rows)| UrlLcpAggregate {
                url: (*url).to_string(),
                avg_lcp: round3(mean(rows.iter().map(|record| record.lcp))),
                count: rows.len() as u64,
            })
            .collect();
        slowest_lcp.sort_by(|a, b| b.avg_lcp.total_cmp(&a.avg_lcp).then_with(|| a.url.cmp(&b.url)));
        slowest_lcp.truncate(SLOWEST_URL_LIMIT);
        let mut slowest_srv: Vec<UrlServerAggregate> = groups
            .iter()
            .map(|(url, rows)| UrlServerAggregate {
                url: (*url).to_string(),
                avg_srv: round3(mean(rows.iter().map(|record| record.server_time))),
                count: rows.len() as u64,
            })
            .collect();
        slowest_srv.sort_by(|a, b| b.avg_srv.total_cmp(&a.avg_srv).then_with(|| a.url.cmp(&b.url)));
        slowest_srv.truncate(SLOWEST_URL_LIMIT);
        Self {
            count,
            avg_ttfb: round3(mean_excluding_zero(records.iter().map(|record| record.ttfb))),
            avg_lcp: round3(mean_excluding_zero(records.iter().map(|record| record.lcp))),
            avg_server: round3(mean_excluding_zero(
                records.iter().map(|record| record.server_time),
            )),
            avg_load: round3(mean_excluding_zero(records.iter().map(|record| record.total_load))),
            p75_lcp: round3(nearest_rank_value(&lcps, nearest_rank_index(count))),
            slowest_lcp,
            slowest_srv,
        }
    }
}

// ============================================================================
// SECTION: Report Summary
// ============================================================================

/// Per-URL line of the summary report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSummary {
    /// Page URL.
    pub url: String,
    /// Average TTFB in seconds.
    pub ttfb: f64,
    /// Average LCP in seconds.
    pub lcp: f64,
    /// Hits for the URL.
    pub hits: u64,
}

/// Device histogram bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCount {
    /// Device tag, possibly empty.
    pub device: String,
    /// Hits for the device tag.
    pub hits: u64,
}

/// Aggregates used to compose the periodic summary email.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Average TTFB across all rows.
    pub avg_ttfb: f64,
    /// Average LCP across all rows.
    pub avg_lcp: f64,
    /// Average total load across all rows.
    pub avg_load: f64,
    /// Slowest pages by average LCP.
    pub top_pages: Vec<PageSummary>,
    /// Device histogram.
    pub devices: Vec<DeviceCount>,
}

impl ReportSummary {
    /// Computes a summary over every record.
    ///
    /// Only URLs with more than `min_hits` hits are listed, up to `top` entries.
    #[must_use]
    pub fn from_records(records: &[&PerformanceRecord], min_hits: u64, top: usize) -> Self {
        let groups = group_by_url(records);
        let mut top_pages: Vec<PageSummary> = groups
            .iter()
            .filter(|(_, rows)| rows.len() as u64 > min_hits)
            .map(|(url, rows)| PageSummary {
                url: (*url).to_string(),
                ttfb: mean(rows.iter().map(|record| record.ttfb)),
                lcp: mean(rows.iter().map(|record| record.lcp)),
                hits: rows.len() as u64,
            })
            .collect();
        top_pages.sort_by(|a, b| b.lcp.total_cmp(&a.lcp).then_with(|| a.url.cmp(&b.url)));
        top_pages.truncate(top);
        let mut devices: BTreeMap<&str, u64> = BTreeMap::new();
        for record in records {
            *devices.entry(record.device.as_str()).or_default() += 1;
        }
        Self {
            avg_ttfb: mean(records.iter().map(|record| record.ttfb)),
            avg_lcp: mean(records.iter().map(|record| record.lcp)),
            avg_load: mean(records.iter().map(|record| record.total_load)),
            top_pages,
            devices: devices
                .into_iter()
                .map(|(device, hits)| DeviceCount {
                    device: device.to_string(),
                    hits,
                })
                .collect(),
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the zero-based nearest-rank index of the 75th percentile.
///
/// Equals `floor(0.75 * count)`, computed in integers.
#[must_use]
pub const fn nearest_rank_index(count: u64) -> u64 {
    count.saturating_mul(3) / 4
}

/// Rounds to three decimal places.
#[must_use]
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Averages values, ignoring zero entries. Returns `0.0` when nothing remains.
#[must_use]
pub fn mean_excluding_zero(values: impl Iterator<Item = f64>) -> f64 {
    mean(values.filter(|value| *value != 0.0))
}

/// Plain arithmetic mean. Returns `0.0` for no values.
fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut count = 0.0;
    for value in values {
        sum += value;
        count += 1.0;
    }
    if count > 0.0 { sum / count } else { 0.0 }
}

/// Returns the sorted value at `index`, or `0.0` past the end.
fn nearest_rank_value(sorted: &[f64], index: u64) -> f64 {
    usize::try_from(index).ok().and_then(|index| sorted.get(index)).copied().unwrap_or(0.0)
}

/// Groups records by URL in ascending URL order.
fn group_by_url<'a>(
    records: &[&'a PerformanceRecord],
) -> BTreeMap<&'a str, Vec<&'a PerformanceRecord>> {
    let mut groups: BTreeMap<&'a str, Vec<&'a PerformanceRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.url.as_str()).or_default().push(record);
    }
    groups
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn nearest_rank_of_five_is_index_three() {
        assert_eq!(nearest_rank_index(5), 3);
        assert_eq!(nearest_rank_index(4), 3);
        assert_eq!(nearest_rank_index(1), 0);
        assert_eq!(nearest_rank_index(0), 0);
    }

    #[test]
    fn mean_excluding_zero_skips_unmeasured() {
        let mean = mean_excluding_zero([0.0, 2.0, 4.0].into_iter());
        assert!((mean - 3.0).abs() < f64::EPSILON);
        assert!(mean_excluding_zero([0.0, 0.0].into_iter()).abs() < f64::EPSILON);
    }

    #[test]
    fn round3_rounds_half_away_from_zero() {
        assert!((round3(1.23456) - 1.235).abs() < 1e-12);
        assert!((round3(0.0004) - 0.0).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn nearest_rank_index_is_in_bounds(count in 1u64 .. 1_000_000) {
            let index = nearest_rank_index(count);
            prop_assert!(index < count);
            prop_assert!(index * 4 <= count * 3);
        }
    }
}
