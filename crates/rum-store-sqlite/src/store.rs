// crates/rum-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite RUM Store
// Description: Durable LogStore and OptionStore backed by SQLite WAL.
// Purpose: Persist performance records and options with SQL-side aggregates.
// Dependencies: rum-core, rusqlite, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! This module implements [`LogStore`] and [`OptionStore`] on a single
//! `SQLite` database. Writes go through one serialized write connection;
//! reads are spread round-robin over a small pool of read connections.
//! Aggregates are computed in SQL with the same semantics as the in-memory
//! store: overall averages ignore zero values, per-URL averages do not, and
//! the 75th percentile uses the nearest-rank row at `floor(0.75 * count)`.
//!
//! Filter values are always bound as parameters. URL substring filters escape
//! `LIKE` wildcards so a literal `%` or `_` only matches itself.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use rum_core::DeviceCount;
use rum_core::EventTime;
use rum_core::LogFilter;
use rum_core::LogPage;
use rum_core::LogQuery;
use rum_core::LogStore;
use rum_core::NewRecord;
use rum_core::OptionStore;
use rum_core::OptionStoreError;
use rum_core::PageSummary;
use rum_core::PerformanceRecord;
use rum_core::RecordId;
use rum_core::ReportSummary;
use rum_core::SLOWEST_URL_LIMIT;
use rum_core::StatsReport;
use rum_core::StoreError;
use rum_core::UrlLcpAggregate;
use rum_core::UrlServerAggregate;
use rum_core::nearest_rank_index;
use rum_core::round3;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::Transaction;
use rusqlite::params;
use rusqlite::params_from_iter;
use rusqlite::types::Type;
use rusqlite::types::Value;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Column list shared by every record query.
const RECORD_COLUMNS: &str = "id, event_time, url, server_time, ttfb, lcp, total_load, \
                              memory_peak, device, net, country, session_id, user_role, meta";

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` RUM store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
/// - `read_pool_size` must be greater than zero.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
    /// Number of read connections used for read path isolation.
    #[serde(default = "default_read_pool_size")]
    pub read_pool_size: usize,
}

impl SqliteStoreConfig {
    /// Returns a config with default tuning for `path`.
    #[must_use]
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: default_busy_timeout_ms(),
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
            read_pool_size: default_read_pool_size(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// Returns the default read connection pool size.
const fn default_read_pool_size() -> usize {
    4
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
///
/// # Invariants
/// - Error messages avoid embedding raw record payloads.
#[derive(Debug, Error, Clone)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Stored data could not be decoded.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store configuration or arguments.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Store(message),
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::VersionMismatch(message) => Self::VersionMismatch(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
        }
    }
}

impl From<SqliteStoreError> for OptionStoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Corrupt(message) | SqliteStoreError::Invalid(message) => {
                Self::Invalid(message)
            }
            SqliteStoreError::Db(message) | SqliteStoreError::VersionMismatch(message) => {
                Self::Store(message)
            }
        }
    }
}

/// Maps an engine error into a store error.
fn db_error(err: rusqlite::Error) -> SqliteStoreError {
    match err {
        rusqlite::Error::FromSqlConversionFailure(..) => SqliteStoreError::Corrupt(err.to_string()),
        other => SqliteStoreError::Db(other.to_string()),
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed log and option store.
///
/// # Invariants
/// - All writes are serialized through `write_connection`.
/// - `read_connections` is non-empty.
#[derive(Debug, Clone)]
pub struct SqliteRumStore {
    /// Serialized write connection.
    write_connection: Arc<Mutex<Connection>>,
    /// Read connection pool.
    read_connections: Arc<Vec<Mutex<Connection>>>,
    /// Round-robin cursor into the read pool.
    read_cursor: Arc<AtomicUsize>,
}

impl SqliteRumStore {
    /// Opens an `SQLite`-backed store, creating the schema when missing.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized, or when the stored schema version is unknown.
    pub fn new(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        if config.read_pool_size == 0 {
            return Err(SqliteStoreError::Invalid(
                "read_pool_size must be greater than zero".to_string(),
            ));
        }
        ensure_parent_dir(&config.path)?;
        let mut write_connection = open_connection(config)?;
        initialize_schema(&mut write_connection)?;
        let mut read_connections = Vec::with_capacity(config.read_pool_size);
        for _ in 0 .. config.read_pool_size {
            read_connections.push(Mutex::new(open_connection(config)?));
        }
        Ok(Self {
            write_connection: Arc::new(Mutex::new(write_connection)),
            read_connections: Arc::new(read_connections),
            read_cursor: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Locks the write connection.
    fn writer(&self) -> Result<MutexGuard<'_, Connection>, SqliteStoreError> {
        self.write_connection
            .lock()
            .map_err(|_| SqliteStoreError::Io("sqlite write mutex poisoned".to_string()))
    }

    /// Locks the next read connection using round-robin selection.
    fn reader(&self) -> Result<MutexGuard<'_, Connection>, SqliteStoreError> {
        let len = self.read_connections.len();
        let index = self.read_cursor.fetch_add(1, Ordering::Relaxed) % len;
        self.read_connections[index]
            .lock()
            .map_err(|_| SqliteStoreError::Io("sqlite read mutex poisoned".to_string()))
    }

    /// Inserts a sanitized record.
    fn insert_record(&self, record: NewRecord) -> Result<RecordId, SqliteStoreError> {
        let record = record.sanitized();
        let meta = record
            .meta
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
        let memory_peak = i64::try_from(record.memory_peak).unwrap_or(i64::MAX);
        let guard = self.writer()?;
        guard
            .execute(
                "INSERT INTO rum_logs (event_time, url, server_time, ttfb, lcp, total_load, \
                 memory_peak, device, net, country, session_id, user_role, meta)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    record.event_time.unix_seconds(),
                    record.url,
                    record.server_time,
                    record.ttfb,
                    record.lcp,
                    record.total_load,
                    memory_peak,
                    record.device,
                    record.net,
                    record.country,
                    record.session_id,
                    record.user_role,
                    meta,
                ],
            )
            .map_err(db_error)?;
        Ok(RecordId::new(guard.last_insert_rowid()))
    }

    /// Loads one record by id.
    fn load_record(&self, id: RecordId) -> Result<Option<PerformanceRecord>, SqliteStoreError> {
        let guard = self.reader()?;
        guard
            .query_row(
                &format!("SELECT {RECORD_COLUMNS} FROM rum_logs WHERE id = ?1"),
                params![id.get()],
                read_record,
            )
            .optional()
            .map_err(db_error)
    }

    /// Runs a page query and its filtered count in one read transaction.
    fn page(&self, query: &LogQuery) -> Result<LogPage, SqliteStoreError> {
        let clause = FilterClause::build(&query.filter);
        let mut guard = self.reader()?;
        let tx = guard.transaction().map_err(db_error)?;
        let total = count_rows(&tx, &clause)?;
        let direction = query.direction.keyword();
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM rum_logs{} ORDER BY {} {direction}, id {direction} \
             LIMIT ? OFFSET ?",
            clause.sql,
            query.sort.column(),
        );
        let mut values = clause.params.clone();
        values.push(Value::Integer(i64::from(query.page.per_page())));
        values.push(Value::Integer(i64::try_from(query.page.offset()).unwrap_or(i64::MAX)));
        let data = {
            let mut stmt = tx.prepare(&sql).map_err(db_error)?;
            let rows = stmt.query_map(params_from_iter(values), read_record).map_err(db_error)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(db_error)?
        };
        tx.commit().map_err(db_error)?;
        Ok(LogPage {
            data,
            total,
        })
    }

    /// Computes dashboard statistics in one read transaction.
    fn compute_stats(&self, filter: &LogFilter) -> Result<StatsReport, SqliteStoreError> {
        let clause = FilterClause::build(filter);
        let mut guard = self.reader()?;
        let tx = guard.transaction().map_err(db_error)?;
        let (count, avg_ttfb, avg_lcp, avg_server, avg_load) = tx
            .query_row(
                &format!(
                    "SELECT COUNT(id), AVG(NULLIF(ttfb, 0)), AVG(NULLIF(lcp, 0)), \
                     AVG(NULLIF(server_time, 0)), AVG(NULLIF(total_load, 0)) FROM rum_logs{}",
                    clause.sql
                ),
                params_from_iter(clause.params.iter()),
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, Option<f64>>(1)?,
                        row.get::<_, Option<f64>>(2)?,
                        row.get::<_, Option<f64>>(3)?,
                        row.get::<_, Option<f64>>(4)?,
                    ))
                },
            )
            .map_err(db_error)?;
        let count = u64::try_from(count).unwrap_or(0);
        let p75_lcp = if count == 0 {
            0.0
        } else {
            let mut values = clause.params.clone();
            values.push(Value::Integer(
                i64::try_from(nearest_rank_index(count)).unwrap_or(i64::MAX),
            ));
            tx.query_row(
                &format!(
                    "SELECT lcp FROM rum_logs{} ORDER BY lcp ASC LIMIT 1 OFFSET ?",
                    clause.sql
                ),
                params_from_iter(values),
                |row| row.get::<_, f64>(0),
            )
            .optional()
            .map_err(db_error)?
            .unwrap_or(0.0)
        };
        let slowest_lcp = slowest_by(&tx, &clause, "lcp")?
            .into_iter()
            .map(|(url, avg_lcp, count)| UrlLcpAggregate {
                url,
                avg_lcp,
                count,
            })
            .collect();
        let slowest_srv = slowest_by(&tx, &clause, "server_time")?
            .into_iter()
            .map(|(url, avg_srv, count)| UrlServerAggregate {
                url,
                avg_srv,
                count,
            })
            .collect();
        tx.commit().map_err(db_error)?;
        Ok(StatsReport {
            count,
            avg_ttfb: round3(avg_ttfb.unwrap_or(0.0)),
            avg_lcp: round3(avg_lcp.unwrap_or(0.0)),
            avg_server: round3(avg_server.unwrap_or(0.0)),
            avg_load: round3(avg_load.unwrap_or(0.0)),
            p75_lcp: round3(p75_lcp),
            slowest_lcp,
            slowest_srv,
        })
    }

    /// Deletes the oldest rows beyond `limit`.
    fn trim_to_limit(&self, limit: u64) -> Result<u64, SqliteStoreError> {
        if limit == 0 {
            return Ok(0);
        }
        let mut guard = self.writer()?;
        let tx = guard.transaction().map_err(db_error)?;
        let total: i64 =
            tx.query_row("SELECT COUNT(id) FROM rum_logs", [], |row| row.get(0)).map_err(db_error)?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        if total <= limit {
            return Ok(0);
        }
        let deleted = tx
            .execute(
                "DELETE FROM rum_logs WHERE id IN (SELECT id FROM rum_logs ORDER BY event_time \
                 ASC, id ASC LIMIT ?1)",
                params![total - limit],
            )
            .map_err(db_error)?;
        tx.commit().map_err(db_error)?;
        Ok(u64::try_from(deleted).unwrap_or(u64::MAX))
    }

    /// Deletes rows with an event time before the retention cutoff.
    fn purge(&self, days: u64, now: EventTime) -> Result<u64, SqliteStoreError> {
        if days == 0 {
            return Ok(0);
        }
        let cutoff = now.minus_days(days);
        let guard = self.writer()?;
        let deleted = guard
            .execute("DELETE FROM rum_logs WHERE event_time < ?1", params![cutoff.unix_seconds()])
            .map_err(db_error)?;
        Ok(u64::try_from(deleted).unwrap_or(u64::MAX))
    }

    /// Loads the most recent TTFB values.
    fn latest_ttfb(&self, limit: usize) -> Result<Vec<f64>, SqliteStoreError> {
        let guard = self.reader()?;
        let mut stmt = guard
            .prepare("SELECT ttfb FROM rum_logs ORDER BY event_time DESC, id DESC LIMIT ?1")
            .map_err(db_error)?;
        let rows = stmt
            .query_map(params![i64::try_from(limit).unwrap_or(i64::MAX)], |row| row.get(0))
            .map_err(db_error)?;
        rows.collect::<Result<Vec<f64>, _>>().map_err(db_error)
    }

    /// Computes report aggregates in one read transaction.
    fn summary(&self, min_hits: u64, top: usize) -> Result<ReportSummary, SqliteStoreError> {
        let mut guard = self.reader()?;
        let tx = guard.transaction().map_err(db_error)?;
        let (avg_ttfb, avg_lcp, avg_load) = tx
            .query_row("SELECT AVG(ttfb), AVG(lcp), AVG(total_load) FROM rum_logs", [], |row| {
                Ok((
                    row.get::<_, Option<f64>>(0)?,
                    row.get::<_, Option<f64>>(1)?,
                    row.get::<_, Option<f64>>(2)?,
                ))
            })
            .map_err(db_error)?;
        let top_pages = {
            let mut stmt = tx
                .prepare(
                    "SELECT url, AVG(ttfb), AVG(lcp), COUNT(id) FROM rum_logs GROUP BY url \
                     HAVING COUNT(id) > ?1 ORDER BY AVG(lcp) DESC, url ASC LIMIT ?2",
                )
                .map_err(db_error)?;
            let rows = stmt
                .query_map(
                    params![
                        i64::try_from(min_hits).unwrap_or(i64::MAX),
                        i64::try_from(top).unwrap_or(i64::MAX)
                    ],
                    |row| {
                        Ok(PageSummary {
                            url: row.get(0)?,
                            ttfb: row.get::<_, Option<f64>>(1)?.unwrap_or(0.0),
                            lcp: row.get::<_, Option<f64>>(2)?.unwrap_or(0.0),
                            hits: u64::try_from(row.get::<_, i64>(3)?).unwrap_or(0),
                        })
                    },
                )
                .map_err(db_error)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(db_error)?
        };
        let devices = {
            let mut stmt = tx
                .prepare(
                    "SELECT device, COUNT(id) FROM rum_logs GROUP BY device ORDER BY device ASC",
                )
                .map_err(db_error)?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(DeviceCount {
                        device: row.get(0)?,
                        hits: u64::try_from(row.get::<_, i64>(1)?).unwrap_or(0),
                    })
                })
                .map_err(db_error)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(db_error)?
        };
        tx.commit().map_err(db_error)?;
        Ok(ReportSummary {
            avg_ttfb: avg_ttfb.unwrap_or(0.0),
            avg_lcp: avg_lcp.unwrap_or(0.0),
            avg_load: avg_load.unwrap_or(0.0),
            top_pages,
            devices,
        })
    }

    /// Verifies both the read and write paths can execute a statement.
    fn check_connection(&self) -> Result<(), SqliteStoreError> {
        self.reader()?.execute_batch("SELECT 1").map_err(db_error)?;
        self.writer()?.execute_batch("SELECT 1").map_err(db_error)
    }
}

impl LogStore for SqliteRumStore {
    fn insert(&self, record: NewRecord) -> Result<RecordId, StoreError> {
        Ok(self.insert_record(record)?)
    }

    fn get(&self, id: RecordId) -> Result<Option<PerformanceRecord>, StoreError> {
        Ok(self.load_record(id)?)
    }

    fn count(&self) -> Result<u64, StoreError> {
        let guard = self.reader()?;
        let total: i64 = guard
            .query_row("SELECT COUNT(id) FROM rum_logs", [], |row| row.get(0))
            .map_err(db_error)?;
        Ok(u64::try_from(total).unwrap_or(0))
    }

    fn query_logs(&self, query: &LogQuery) -> Result<LogPage, StoreError> {
        Ok(self.page(query)?)
    }

    fn stats(&self, filter: &LogFilter) -> Result<StatsReport, StoreError> {
        Ok(self.compute_stats(filter)?)
    }

    fn enforce_limit(&self, limit: u64) -> Result<u64, StoreError> {
        Ok(self.trim_to_limit(limit)?)
    }

    fn purge_older_than(&self, days: u64, now: EventTime) -> Result<u64, StoreError> {
        Ok(self.purge(days, now)?)
    }

    fn recent_ttfb(&self, limit: usize) -> Result<Vec<f64>, StoreError> {
        Ok(self.latest_ttfb(limit)?)
    }

    fn report_summary(&self, min_hits: u64, top: usize) -> Result<ReportSummary, StoreError> {
        Ok(self.summary(min_hits, top)?)
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.writer()?.execute("DELETE FROM rum_logs", []).map_err(db_error)?;
        Ok(())
    }

    fn readiness(&self) -> Result<(), StoreError> {
        Ok(self.check_connection()?)
    }
}

impl OptionStore for SqliteRumStore {
    fn get(&self, key: &str) -> Result<Option<String>, OptionStoreError> {
        let guard = self.reader()?;
        let value = guard
            .query_row("SELECT value FROM rum_options WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(db_error)?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), OptionStoreError> {
        self.writer()?
            .execute(
                "INSERT INTO rum_options (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .map_err(db_error)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), OptionStoreError> {
        self.writer()?
            .execute("DELETE FROM rum_options WHERE key = ?1", params![key])
            .map_err(db_error)?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Query Helpers
// ============================================================================

/// `WHERE` clause and bound parameters for a [`LogFilter`].
#[derive(Debug, Clone, Default)]
struct FilterClause {
    /// Either empty or ` WHERE ...` with positional placeholders.
    sql: String,
    /// Positional parameter values.
    params: Vec<Value>,
}

impl FilterClause {
    /// Builds the clause for a filter.
    fn build(filter: &LogFilter) -> Self {
        let mut conditions: Vec<&'static str> = Vec::new();
        let mut params = Vec::new();
        if let Some(session_id) = &filter.session_id {
            conditions.push("session_id = ?");
            params.push(Value::Text(session_id.clone()));
        }
        if let Some(fragment) = &filter.url_contains {
            conditions.push("url LIKE ? ESCAPE '\\'");
            params.push(Value::Text(format!("%{}%", escape_like(fragment))));
        }
        if let Some(device) = &filter.device {
            conditions.push("device = ?");
            params.push(Value::Text(device.clone()));
        }
        if let Some(net) = &filter.net {
            conditions.push("net = ?");
            params.push(Value::Text(net.clone()));
        }
        let sql = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };
        Self {
            sql,
            params,
        }
    }
}

/// Escapes `LIKE` wildcards with a backslash.
fn escape_like(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len());
    for ch in fragment.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Counts rows matching a filter clause.
fn count_rows(tx: &Transaction<'_>, clause: &FilterClause) -> Result<u64, SqliteStoreError> {
    let total: i64 = tx
        .query_row(
            &format!("SELECT COUNT(id) FROM rum_logs{}", clause.sql),
            params_from_iter(clause.params.iter()),
            |row| row.get(0),
        )
        .map_err(db_error)?;
    Ok(u64::try_from(total).unwrap_or(0))
}

/// Returns the slowest URLs by the plain mean of `column`.
///
/// `column` is always a crate-internal literal.
fn slowest_by(
    tx: &Transaction<'_>,
    clause: &FilterClause,
    column: &'static str,
) -> Result<Vec<(String, f64, u64)>, SqliteStoreError> {
    let sql = format!(
        "SELECT url, ROUND(AVG({column}), 3) AS avg_value, COUNT(id) FROM rum_logs{} GROUP BY \
         url ORDER BY avg_value DESC, url ASC LIMIT ?",
        clause.sql
    );
    let mut values = clause.params.clone();
    values.push(Value::Integer(i64::try_from(SLOWEST_URL_LIMIT).unwrap_or(i64::MAX)));
    let mut stmt = tx.prepare(&sql).map_err(db_error)?;
    let rows = stmt
        .query_map(params_from_iter(values), |row| {
            Ok((
                row.get::<_, String>(0)?,
                round3(row.get::<_, Option<f64>>(1)?.unwrap_or(0.0)),
                u64::try_from(row.get::<_, i64>(2)?).unwrap_or(0),
            ))
        })
        .map_err(db_error)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(db_error)
}

/// Decodes one `rum_logs` row selected with [`RECORD_COLUMNS`].
fn read_record(row: &Row<'_>) -> rusqlite::Result<PerformanceRecord> {
    let meta = row
        .get::<_, Option<String>>(13)?
        .map(|raw| serde_json::from_str(&raw))
        .transpose()
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(13, Type::Text, Box::new(err)))?;
    Ok(PerformanceRecord {
        id: RecordId::new(row.get(0)?),
        event_time: EventTime::from_unix_seconds(row.get(1)?),
        url: row.get(2)?,
        server_time: row.get(3)?,
        ttfb: row.get(4)?,
        lcp: row.get(5)?,
        total_load: row.get(6)?,
        memory_peak: u64::try_from(row.get::<_, i64>(7)?).unwrap_or(0),
        device: row.get(8)?,
        net: row.get(9)?,
        country: row.get(10)?,
        session_id: row.get(11)?,
        user_role: row.get(12)?,
        meta,
    })
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteStoreError::Invalid("store path must not be empty".to_string()));
    }
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.exists() && path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with secure defaults.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags).map_err(db_error)?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(db_error)?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(db_error)?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(db_error)?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(db_error)?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(db_error)?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(db_error)?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(db_error)?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS rum_logs (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    event_time INTEGER NOT NULL,
                    url TEXT NOT NULL DEFAULT '',
                    server_time REAL NOT NULL DEFAULT 0,
                    ttfb REAL NOT NULL DEFAULT 0,
                    lcp REAL NOT NULL DEFAULT 0,
                    total_load REAL NOT NULL DEFAULT 0,
                    memory_peak INTEGER NOT NULL DEFAULT 0,
                    device TEXT NOT NULL DEFAULT '',
                    net TEXT NOT NULL DEFAULT '',
                    country TEXT NOT NULL DEFAULT '',
                    session_id TEXT NOT NULL DEFAULT '',
                    user_role TEXT NOT NULL DEFAULT '',
                    meta TEXT
                );
                CREATE INDEX IF NOT EXISTS idx_rum_logs_session_id ON rum_logs (session_id);
                CREATE INDEX IF NOT EXISTS idx_rum_logs_event_time ON rum_logs (event_time);
                CREATE TABLE IF NOT EXISTS rum_options (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );",
            )
            .map_err(db_error)?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(db_error)?;
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("/blog"), "/blog");
    }

    #[test]
    fn empty_filter_has_no_where_clause() {
        let clause = FilterClause::build(&LogFilter::default());
        assert!(clause.sql.is_empty());
        assert!(clause.params.is_empty());
    }

    #[test]
    fn filter_clause_binds_every_constraint() {
        let clause = FilterClause::build(&LogFilter {
            session_id: Some("s1".to_string()),
            url_contains: Some("a_b".to_string()),
            device: Some("mobile".to_string()),
            net: None,
        });
        assert_eq!(
            clause.sql,
            " WHERE session_id = ? AND url LIKE ? ESCAPE '\\' AND device = ?"
        );
        assert_eq!(clause.params.len(), 3);
        assert_eq!(clause.params[1], Value::Text("%a\\_b%".to_string()));
    }
}
