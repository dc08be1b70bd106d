// crates/rum-core/tests/log_store.rs
// ============================================================================
// Module: In-Memory Log Store Tests
// Description: Reference semantics for record storage, queries, and retention.
// Purpose: Validate pagination, statistics, eviction, and purge behavior.
// ============================================================================

//! ## Overview
//! Exercises [`InMemoryLogStore`] against the documented store contract:
//! - Filtered pagination with accurate totals
//! - Nearest-rank percentile and zero-excluding averages
//! - FIFO eviction by event time and age-based purge (both idempotent)
//! - Unrounded round trip of inserted values

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::float_cmp,
    reason = "Test-only assertions and helpers are permitted."
)]

use rum_core::EventTime;
use rum_core::InMemoryLogStore;
use rum_core::LogFilter;
use rum_core::LogQuery;
use rum_core::LogStore;
use rum_core::NewRecord;
use rum_core::PageRequest;
use rum_core::SortDirection;
use rum_core::SortKey;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Base timestamp for fixtures.
const BASE: i64 = 1_700_000_000;

/// Builds a record at `BASE + offset` seconds.
fn record_at(offset: i64, url: &str) -> NewRecord {
    NewRecord::new(EventTime::from_unix_seconds(BASE + offset), url)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn ids_increase_in_insertion_order() {
    let store = InMemoryLogStore::new();
    let first = store.insert(record_at(100, "/a")).unwrap();
    let second = store.insert(record_at(0, "/b")).unwrap();
    assert!(second > first);
}

#[test]
fn pagination_reports_filtered_total() {
    let store = InMemoryLogStore::new();
    for index in 0 .. 50 {
        let mut record = record_at(index, "/page");
        record.device = if index < 20 { "mobile" } else { "desktop" }.to_string();
        store.insert(record).unwrap();
    }
    let query = LogQuery {
        filter: LogFilter {
            device: Some("mobile".to_string()),
            ..LogFilter::default()
        },
        page: PageRequest::new(2, 10),
        ..LogQuery::default()
    };
    let page = store.query_logs(&query).unwrap();
    assert_eq!(page.data.len(), 10);
    assert_eq!(page.total, 20);
    assert!(page.data.iter().all(|row| row.device == "mobile"));
}

#[test]
fn query_orders_by_requested_key() {
    let store = InMemoryLogStore::new();
    for (offset, ttfb) in [(0, 0.3), (1, 0.1), (2, 0.2)] {
        let mut record = record_at(offset, "/x");
        record.ttfb = ttfb;
        store.insert(record).unwrap();
    }
    let query = LogQuery {
        sort: SortKey::Ttfb,
        direction: SortDirection::Asc,
        ..LogQuery::default()
    };
    let page = store.query_logs(&query).unwrap();
    let values: Vec<f64> = page.data.iter().map(|row| row.ttfb).collect();
    assert_eq!(values, vec![0.1, 0.2, 0.3]);
    let newest_first = store.query_logs(&LogQuery::default()).unwrap();
    assert_eq!(newest_first.data[0].event_time, EventTime::from_unix_seconds(BASE + 2));
}

#[test]
fn url_filter_matches_substrings() {
    let store = InMemoryLogStore::new();
    store.insert(record_at(0, "https://shop.test/cart/view")).unwrap();
    store.insert(record_at(1, "https://shop.test/blog")).unwrap();
    let query = LogQuery {
        filter: LogFilter {
            url_contains: Some("/cart".to_string()),
            ..LogFilter::default()
        },
        ..LogQuery::default()
    };
    assert_eq!(store.query_logs(&query).unwrap().total, 1);
}

#[test]
fn stats_use_nearest_rank_percentile() {
    let store = InMemoryLogStore::new();
    for (offset, lcp) in [(0, 5.0), (1, 1.0), (2, 3.0), (3, 2.0), (4, 4.0)] {
        let mut record = record_at(offset, "/p");
        record.lcp = lcp;
        store.insert(record).unwrap();
    }
    let stats = store.stats(&LogFilter::default()).unwrap();
    assert_eq!(stats.count, 5);
    assert_eq!(stats.p75_lcp, 4.0);
}

#[test]
fn stats_average_excludes_unmeasured_rows() {
    let store = InMemoryLogStore::new();
    for (offset, ttfb) in [(0, 0.0), (1, 2.0), (2, 4.0)] {
        let mut record = record_at(offset, "/p");
        record.ttfb = ttfb;
        store.insert(record).unwrap();
    }
    let stats = store.stats(&LogFilter::default()).unwrap();
    assert_eq!(stats.avg_ttfb, 3.0);
    assert_eq!(stats.avg_lcp, 0.0);
}

#[test]
fn stats_on_empty_store_are_zero() {
    let store = InMemoryLogStore::new();
    let stats = store.stats(&LogFilter::default()).unwrap();
    assert_eq!(stats.count, 0);
    assert_eq!(stats.p75_lcp, 0.0);
    assert!(stats.slowest_lcp.is_empty());
}

#[test]
fn stats_list_slowest_urls() {
    let store = InMemoryLogStore::new();
    for (offset, url, lcp, server) in
        [(0, "/a", 1.0, 0.1), (1, "/a", 3.0, 0.3), (2, "/b", 5.0, 0.05), (3, "/c", 0.5, 0.9)]
    {
        let mut record = record_at(offset, url);
        record.lcp = lcp;
        record.server_time = server;
        store.insert(record).unwrap();
    }
    let stats = store.stats(&LogFilter::default()).unwrap();
    let lcp_order: Vec<&str> = stats.slowest_lcp.iter().map(|row| row.url.as_str()).collect();
    assert_eq!(lcp_order, vec!["/b", "/a", "/c"]);
    assert_eq!(stats.slowest_lcp[1].avg_lcp, 2.0);
    assert_eq!(stats.slowest_lcp[1].count, 2);
    assert_eq!(stats.slowest_srv[0].url, "/c");
}

#[test]
fn enforce_limit_keeps_most_recent_rows() {
    let store = InMemoryLogStore::new();
    for offset in (0 .. 105).rev() {
        store.insert(record_at(offset, "/fifo")).unwrap();
    }
    assert_eq!(store.enforce_limit(100).unwrap(), 5);
    assert_eq!(store.count().unwrap(), 100);
    let oldest = store
        .query_logs(&LogQuery {
            direction: SortDirection::Asc,
            page: PageRequest::new(1, 1),
            ..LogQuery::default()
        })
        .unwrap();
    assert_eq!(oldest.data[0].event_time, EventTime::from_unix_seconds(BASE + 5));
    assert_eq!(store.enforce_limit(100).unwrap(), 0);
}

#[test]
fn enforce_limit_zero_is_noop() {
    let store = InMemoryLogStore::new();
    store.insert(record_at(0, "/x")).unwrap();
    assert_eq!(store.enforce_limit(0).unwrap(), 0);
    assert_eq!(store.count().unwrap(), 1);
}

#[test]
fn purge_removes_rows_past_retention() {
    let store = InMemoryLogStore::new();
    let day = 86_400;
    store.insert(record_at(-10 * day, "/old")).unwrap();
    store.insert(record_at(-2 * day, "/recent")).unwrap();
    let now = EventTime::from_unix_seconds(BASE);
    assert_eq!(store.purge_older_than(7, now).unwrap(), 1);
    assert_eq!(store.purge_older_than(7, now).unwrap(), 0);
    assert_eq!(store.purge_older_than(0, now).unwrap(), 0);
    assert_eq!(store.count().unwrap(), 1);
}

#[test]
fn inserted_values_round_trip_unrounded() {
    let store = InMemoryLogStore::new();
    let mut record = record_at(0, "/precise");
    record.ttfb = 0.123_456_789;
    record.lcp = 2.000_000_1;
    record.memory_peak = 12_345_678;
    record.meta = Some(serde_json::json!({"k": "v"}));
    let id = store.insert(record).unwrap();
    let loaded = store.get(id).unwrap().unwrap();
    assert_eq!(loaded.ttfb, 0.123_456_789);
    assert_eq!(loaded.lcp, 2.000_000_1);
    assert_eq!(loaded.memory_peak, 12_345_678);
    assert_eq!(loaded.meta, Some(serde_json::json!({"k": "v"})));
}

#[test]
fn insert_sanitizes_text_fields() {
    let store = InMemoryLogStore::new();
    let mut record = record_at(0, "/<script>x</script>page");
    record.device = "mobile-phone-extra".to_string();
    record.ttfb = -1.0;
    let id = store.insert(record).unwrap();
    let loaded = store.get(id).unwrap().unwrap();
    assert_eq!(loaded.url, "/xpage");
    assert_eq!(loaded.device, "mobile-pho");
    assert_eq!(loaded.ttfb, 0.0);
}

#[test]
fn recent_ttfb_is_newest_first() {
    let store = InMemoryLogStore::new();
    for (offset, ttfb) in [(2, 0.2), (0, 0.0), (1, 0.1)] {
        let mut record = record_at(offset, "/x");
        record.ttfb = ttfb;
        store.insert(record).unwrap();
    }
    assert_eq!(store.recent_ttfb(2).unwrap(), vec![0.2, 0.1]);
}

#[test]
fn report_summary_requires_repeat_hits() {
    let store = InMemoryLogStore::new();
    for (offset, url, device) in [(0, "/a", "mobile"), (1, "/a", ""), (2, "/b", "mobile")] {
        let mut record = record_at(offset, url);
        record.device = device.to_string();
        record.lcp = 1.0;
        store.insert(record).unwrap();
    }
    let summary = store.report_summary(1, 10).unwrap();
    assert_eq!(summary.top_pages.len(), 1);
    assert_eq!(summary.top_pages[0].url, "/a");
    assert_eq!(summary.top_pages[0].hits, 2);
    assert_eq!(summary.devices.len(), 2);
    assert_eq!(summary.avg_lcp, 1.0);
}
