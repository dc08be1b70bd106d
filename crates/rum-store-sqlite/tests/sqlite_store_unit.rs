// crates/rum-store-sqlite/tests/sqlite_store_unit.rs
// ============================================================================
// Module: SQLite Store Unit Tests
// Description: Targeted tests for the SQLite log and option store.
// Purpose: Validate path safety, schema versioning, query semantics,
//          aggregates, and maintenance.
// ============================================================================

//! ## Overview
//! Unit-level tests for the `SQLite` store:
//! - Path safety checks and schema version validation
//! - Pagination, sorting, and filter escaping
//! - Aggregate parity with the in-memory store
//! - Capacity and retention maintenance
//! - Option persistence and concurrent inserts

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::float_cmp,
    clippy::use_debug,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::path::Path;
use std::sync::Arc;
use std::thread;

use rum_core::EventTime;
use rum_core::InMemoryLogStore;
use rum_core::LogFilter;
use rum_core::LogQuery;
use rum_core::LogStore;
use rum_core::NewRecord;
use rum_core::OptionStore;
use rum_core::PageRequest;
use rum_core::SortDirection;
use rum_core::SortKey;
use rum_store_sqlite::SqliteRumStore;
use rum_store_sqlite::SqliteStoreConfig;
use rum_store_sqlite::SqliteStoreError;
use rum_store_sqlite::SqliteStoreMode;
use rum_store_sqlite::SqliteSyncMode;
use rusqlite::Connection;
use rusqlite::params;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Base event time used by fixtures.
const BASE: i64 = 1_700_000_000;

fn config_for_path(path: &Path) -> SqliteStoreConfig {
    SqliteStoreConfig {
        path: path.to_path_buf(),
        busy_timeout_ms: 1_000,
        journal_mode: SqliteStoreMode::Wal,
        sync_mode: SqliteSyncMode::Normal,
        read_pool_size: 2,
    }
}

fn store_for(path: &Path) -> SqliteRumStore {
    SqliteRumStore::new(&config_for_path(path)).expect("store init")
}

fn record(offset: i64, url: &str) -> NewRecord {
    NewRecord::new(EventTime::from_unix_seconds(BASE + offset), url)
}

fn metrics(offset: i64, url: &str, ttfb: f64, lcp: f64, server_time: f64) -> NewRecord {
    NewRecord {
        ttfb,
        lcp,
        server_time,
        total_load: lcp + 0.5,
        device: "desktop".to_string(),
        ..record(offset, url)
    }
}

// ============================================================================
// SECTION: Path and Schema
// ============================================================================

#[test]
fn sqlite_store_rejects_directory_path() {
    let temp = TempDir::new().unwrap();
    let err = SqliteRumStore::new(&config_for_path(temp.path())).unwrap_err();
    assert!(matches!(err, SqliteStoreError::Invalid(_)));
}

#[test]
fn sqlite_store_rejects_empty_path() {
    let err = SqliteRumStore::new(&config_for_path(Path::new(""))).unwrap_err();
    assert!(matches!(err, SqliteStoreError::Invalid(_)));
}

#[test]
fn sqlite_store_rejects_overlong_component() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("a".repeat(300)).join("rum.db");
    let err = SqliteRumStore::new(&config_for_path(&path)).unwrap_err();
    assert!(matches!(err, SqliteStoreError::Invalid(_)));
}

#[test]
fn sqlite_store_rejects_empty_read_pool() {
    let temp = TempDir::new().unwrap();
    let mut config = config_for_path(&temp.path().join("rum.db"));
    config.read_pool_size = 0;
    let err = SqliteRumStore::new(&config).unwrap_err();
    assert!(matches!(err, SqliteStoreError::Invalid(_)));
}

#[test]
fn sqlite_store_rejects_unknown_schema_version() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("rum.db");
    drop(store_for(&path));
    let connection = Connection::open(&path).unwrap();
    connection.execute("UPDATE store_meta SET version = ?1", params![99]).unwrap();
    drop(connection);
    let err = SqliteRumStore::new(&config_for_path(&path)).unwrap_err();
    assert!(matches!(err, SqliteStoreError::VersionMismatch(_)));
}

#[test]
fn sqlite_store_creates_parent_directories() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested").join("dir").join("rum.db");
    let store = store_for(&path);
    store.readiness().unwrap();
    assert!(path.exists());
}

// ============================================================================
// SECTION: Records
// ============================================================================

#[test]
fn sqlite_store_round_trips_sanitized_record() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("rum.db"));
    let id = store
        .insert(NewRecord {
            ttfb: 0.12,
            memory_peak: 2_097_152,
            device: "mobile".to_string(),
            net: "4g".to_string(),
            country: "DE".to_string(),
            session_id: "sess-1".to_string(),
            meta: Some(serde_json::json!({"build": "abc"})),
            ..record(0, "https://shop.test/<b>product</b>")
        })
        .unwrap();
    let loaded = LogStore::get(&store, id).unwrap().expect("record");
    assert_eq!(loaded.id, id);
    assert_eq!(loaded.url, "https://shop.test/product");
    assert_eq!(loaded.event_time, EventTime::from_unix_seconds(BASE));
    assert_eq!(loaded.ttfb, 0.12);
    assert_eq!(loaded.memory_peak, 2_097_152);
    assert_eq!(loaded.meta, Some(serde_json::json!({"build": "abc"})));
    assert!(LogStore::get(&store, rum_core::RecordId::new(999)).unwrap().is_none());
}

#[test]
fn sqlite_store_ids_increase_and_persist_across_reopen() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("rum.db");
    let first = {
        let store = store_for(&path);
        let first = store.insert(record(0, "/a")).unwrap();
        let second = store.insert(record(1, "/b")).unwrap();
        assert!(second > first);
        first
    };
    let store = store_for(&path);
    assert_eq!(store.count().unwrap(), 2);
    assert_eq!(LogStore::get(&store, first).unwrap().expect("record").url, "/a");
}

#[test]
fn sqlite_store_paginates_filtered_results_with_total() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("rum.db"));
    for index in 0 .. 20 {
        store
            .insert(NewRecord {
                device: "mobile".to_string(),
                ..record(index, "/m")
            })
            .unwrap();
    }
    for index in 0 .. 5 {
        store
            .insert(NewRecord {
                device: "desktop".to_string(),
                ..record(index, "/d")
            })
            .unwrap();
    }
    let page = store
        .query_logs(&LogQuery {
            filter: LogFilter {
                device: Some("mobile".to_string()),
                ..LogFilter::default()
            },
            page: PageRequest::new(2, 10),
            ..LogQuery::default()
        })
        .unwrap();
    assert_eq!(page.total, 20);
    assert_eq!(page.data.len(), 10);
    assert!(page.data.iter().all(|row| row.device == "mobile"));
    assert_eq!(page.data[0].event_time, EventTime::from_unix_seconds(BASE + 9));
}

#[test]
fn sqlite_store_sort_ties_break_by_id() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("rum.db"));
    let a = store.insert(metrics(0, "/a", 0.5, 1.0, 0.0)).unwrap();
    let b = store.insert(metrics(1, "/b", 0.25, 1.0, 0.0)).unwrap();
    let c = store.insert(metrics(2, "/c", 0.5, 1.0, 0.0)).unwrap();
    let page = store
        .query_logs(&LogQuery {
            sort: SortKey::Ttfb,
            direction: SortDirection::Asc,
            ..LogQuery::default()
        })
        .unwrap();
    let ids: Vec<_> = page.data.iter().map(|row| row.id).collect();
    assert_eq!(ids, vec![b, a, c]);
}

#[test]
fn sqlite_store_url_filter_treats_wildcards_literally() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("rum.db"));
    store.insert(record(0, "/sale/50%off")).unwrap();
    store.insert(record(1, "/sale/50xoff")).unwrap();
    store.insert(record(2, "/sale/a_b")).unwrap();
    store.insert(record(3, "/sale/axb")).unwrap();
    let percent = LogQuery {
        filter: LogFilter {
            url_contains: Some("50%".to_string()),
            ..LogFilter::default()
        },
        ..LogQuery::default()
    };
    let underscore = LogQuery {
        filter: LogFilter {
            url_contains: Some("a_b".to_string()),
            ..LogFilter::default()
        },
        ..LogQuery::default()
    };
    assert_eq!(store.query_logs(&percent).unwrap().total, 1);
    assert_eq!(store.query_logs(&underscore).unwrap().total, 1);
}

// ============================================================================
// SECTION: Aggregates
// ============================================================================

#[test]
fn sqlite_store_p75_uses_nearest_rank() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("rum.db"));
    for (index, lcp) in [3.0, 1.0, 5.0, 2.0, 4.0].into_iter().enumerate() {
        store.insert(metrics(i64::try_from(index).unwrap(), "/p", 0.0, lcp, 0.0)).unwrap();
    }
    let stats = store.stats(&LogFilter::default()).unwrap();
    assert_eq!(stats.count, 5);
    assert_eq!(stats.p75_lcp, 4.0);
}

#[test]
fn sqlite_store_overall_averages_exclude_zero() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("rum.db"));
    store.insert(metrics(0, "/a", 0.0, 1.0, 0.0)).unwrap();
    store.insert(metrics(1, "/a", 2.0, 1.0, 0.0)).unwrap();
    store.insert(metrics(2, "/a", 4.0, 1.0, 0.0)).unwrap();
    let stats = store.stats(&LogFilter::default()).unwrap();
    assert_eq!(stats.avg_ttfb, 3.0);
    assert_eq!(stats.avg_server, 0.0);
}

#[test]
fn sqlite_store_empty_stats_are_zero() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("rum.db"));
    let stats = store.stats(&LogFilter::default()).unwrap();
    assert_eq!(stats.count, 0);
    assert_eq!(stats.p75_lcp, 0.0);
    assert!(stats.slowest_lcp.is_empty());
    assert!(stats.slowest_srv.is_empty());
}

#[test]
fn sqlite_store_stats_match_in_memory_store() {
    let temp = TempDir::new().unwrap();
    let sqlite = store_for(&temp.path().join("rum.db"));
    let memory = InMemoryLogStore::new();
    let fixtures = [
        ("/home", 0.25, 1.5, 0.25),
        ("/home", 0.5, 2.5, 0.0),
        ("/blog", 0.0, 4.0, 0.25),
        ("/blog", 0.75, 3.0, 0.5),
        ("/shop", 1.0, 0.0, 1.0),
        ("/cart", 0.125, 6.0, 0.0),
        ("/about", 0.5, 0.5, 0.375),
        ("/help", 0.25, 2.0, 0.75),
    ];
    for (index, (url, ttfb, lcp, server)) in fixtures.into_iter().enumerate() {
        let offset = i64::try_from(index).unwrap();
        sqlite.insert(metrics(offset, url, ttfb, lcp, server)).unwrap();
        memory.insert(metrics(offset, url, ttfb, lcp, server)).unwrap();
    }
    let filters = [
        LogFilter::default(),
        LogFilter {
            url_contains: Some("o".to_string()),
            ..LogFilter::default()
        },
    ];
    for filter in filters {
        assert_eq!(sqlite.stats(&filter).unwrap(), memory.stats(&filter).unwrap());
    }
    assert_eq!(sqlite.report_summary(1, 10).unwrap(), memory.report_summary(1, 10).unwrap());
}

#[test]
fn sqlite_store_slowest_lists_cap_at_five() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("rum.db"));
    for index in 0 .. 8 {
        let lcp = f64::from(u32::try_from(index).unwrap());
        store.insert(metrics(index, &format!("/p{index}"), 0.0, lcp, lcp)).unwrap();
    }
    let stats = store.stats(&LogFilter::default()).unwrap();
    assert_eq!(stats.slowest_lcp.len(), 5);
    assert_eq!(stats.slowest_lcp[0].url, "/p7");
    assert_eq!(stats.slowest_srv.len(), 5);
    assert_eq!(stats.slowest_srv[4].url, "/p3");
}

#[test]
fn sqlite_store_report_summary_lists_repeat_pages_and_devices() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("rum.db"));
    store.insert(metrics(0, "/once", 1.0, 9.0, 0.0)).unwrap();
    store.insert(metrics(1, "/twice", 0.5, 2.0, 0.0)).unwrap();
    store.insert(metrics(2, "/twice", 0.5, 4.0, 0.0)).unwrap();
    store
        .insert(NewRecord {
            device: String::new(),
            ..record(3, "/bare")
        })
        .unwrap();
    let summary = store.report_summary(1, 10).unwrap();
    assert_eq!(summary.top_pages.len(), 1);
    assert_eq!(summary.top_pages[0].url, "/twice");
    assert_eq!(summary.top_pages[0].lcp, 3.0);
    assert_eq!(summary.top_pages[0].hits, 2);
    let devices: Vec<(&str, u64)> =
        summary.devices.iter().map(|entry| (entry.device.as_str(), entry.hits)).collect();
    assert_eq!(devices, vec![("", 1), ("desktop", 3)]);
}

#[test]
fn sqlite_store_recent_ttfb_is_newest_first() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("rum.db"));
    store.insert(metrics(5, "/a", 3.0, 0.0, 0.0)).unwrap();
    store.insert(metrics(1, "/a", 1.0, 0.0, 0.0)).unwrap();
    store.insert(metrics(9, "/a", 2.0, 0.0, 0.0)).unwrap();
    assert_eq!(store.recent_ttfb(2).unwrap(), vec![2.0, 3.0]);
}

// ============================================================================
// SECTION: Maintenance
// ============================================================================

#[test]
fn sqlite_store_enforce_limit_drops_oldest_and_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("rum.db"));
    for index in 0 .. 105 {
        store.insert(record(index, "/a")).unwrap();
    }
    assert_eq!(store.enforce_limit(100).unwrap(), 5);
    assert_eq!(store.count().unwrap(), 100);
    assert_eq!(store.enforce_limit(100).unwrap(), 0);
    let oldest = store
        .query_logs(&LogQuery {
            direction: SortDirection::Asc,
            page: PageRequest::new(1, 1),
            ..LogQuery::default()
        })
        .unwrap();
    assert_eq!(oldest.data[0].event_time, EventTime::from_unix_seconds(BASE + 5));
    assert_eq!(store.enforce_limit(0).unwrap(), 0);
}

#[test]
fn sqlite_store_purge_removes_expired_rows_once() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("rum.db"));
    let day = 86_400;
    store.insert(record(-40 * day, "/old")).unwrap();
    store.insert(record(-31 * day, "/old")).unwrap();
    store.insert(record(-2 * day, "/new")).unwrap();
    let now = EventTime::from_unix_seconds(BASE);
    assert_eq!(store.purge_older_than(30, now).unwrap(), 2);
    assert_eq!(store.purge_older_than(30, now).unwrap(), 0);
    assert_eq!(store.purge_older_than(0, now).unwrap(), 0);
    assert_eq!(store.count().unwrap(), 1);
}

#[test]
fn sqlite_store_clear_empties_logs_but_keeps_options() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("rum.db"));
    store.insert(record(0, "/a")).unwrap();
    OptionStore::set(&store, "settings", "{}").unwrap();
    store.clear().unwrap();
    assert_eq!(store.count().unwrap(), 0);
    assert_eq!(OptionStore::get(&store, "settings").unwrap().as_deref(), Some("{}"));
}

// ============================================================================
// SECTION: Options and Concurrency
// ============================================================================

#[test]
fn sqlite_option_store_overwrites_and_deletes() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("rum.db");
    {
        let store = store_for(&path);
        assert_eq!(OptionStore::get(&store, "last_interval").unwrap(), None);
        OptionStore::set(&store, "last_interval", "86400").unwrap();
        OptionStore::set(&store, "last_interval", "604800").unwrap();
    }
    let store = store_for(&path);
    assert_eq!(OptionStore::get(&store, "last_interval").unwrap().as_deref(), Some("604800"));
    OptionStore::delete(&store, "last_interval").unwrap();
    OptionStore::delete(&store, "last_interval").unwrap();
    assert_eq!(OptionStore::get(&store, "last_interval").unwrap(), None);
}

#[test]
fn sqlite_store_concurrent_inserts_get_unique_ids() {
    let temp = TempDir::new().unwrap();
    let store = Arc::new(store_for(&temp.path().join("rum.db")));
    let handles: Vec<_> = (0 .. 4)
        .map(|worker| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                (0 .. 25)
                    .map(|index| store.insert(record(worker * 100 + index, "/c")).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();
    let mut ids: Vec<_> = handles.into_iter().flat_map(|handle| handle.join().unwrap()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 100);
    assert_eq!(store.count().unwrap(), 100);
}
