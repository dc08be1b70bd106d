// crates/rum-core/src/interfaces/mod.rs
// ============================================================================
// Module: RUM Interfaces
// Description: Backend-agnostic interfaces for record storage, options, and mail.
// Purpose: Define the contract surfaces used by the RUM runtime.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Interfaces define how the monitor reaches persistence and outbound mail
//! without embedding backend details. [`LogStore`] is the only component
//! that touches persisted performance records; [`OptionStore`] holds small
//! named values such as settings and scheduler bookkeeping.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::EventTime;
use crate::core::LogFilter;
use crate::core::LogPage;
use crate::core::LogQuery;
use crate::core::NewRecord;
use crate::core::PerformanceRecord;
use crate::core::RecordId;
use crate::core::ReportSummary;
use crate::core::StatsReport;

// ============================================================================
// SECTION: Option Keys
// ============================================================================

/// Option key for persisted settings.
pub const OPTION_SETTINGS: &str = "settings";
/// Option key for the last applied report interval (seconds).
pub const OPTION_LAST_INTERVAL: &str = "last_interval";
/// Option key for the last alert timestamp (unix seconds).
pub const OPTION_LAST_ALERT_TS: &str = "last_alert_ts";
/// Option key for the next scheduled report run (unix seconds).
pub const OPTION_NEXT_RUN: &str = "next_run";

// ============================================================================
// SECTION: Log Store
// ============================================================================

/// Log store errors.
///
/// # Invariants
/// - Messages never embed raw record payloads.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Store I/O error.
    #[error("log store io error: {0}")]
    Io(String),
    /// Store data is corrupted.
    #[error("log store corruption: {0}")]
    Corrupt(String),
    /// Store schema version is incompatible.
    #[error("log store version mismatch: {0}")]
    VersionMismatch(String),
    /// Store data or arguments are invalid.
    #[error("log store invalid data: {0}")]
    Invalid(String),
    /// Store reported an error.
    #[error("log store error: {0}")]
    Store(String),
}

/// Persistent performance record store.
///
/// Implementations sanitize inserted text, issue strictly increasing ids,
/// and break sort ties by id so pagination is deterministic.
pub trait LogStore: Send + Sync {
    /// Inserts a record and returns its new id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    fn insert(&self, record: NewRecord) -> Result<RecordId, StoreError>;

    /// Loads a record by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn get(&self, id: RecordId) -> Result<Option<PerformanceRecord>, StoreError>;

    /// Returns the number of stored records.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn count(&self) -> Result<u64, StoreError>;

    /// Runs a filtered, sorted, paginated query.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn query_logs(&self, query: &LogQuery) -> Result<LogPage, StoreError>;

    /// Computes aggregate statistics over the filtered records.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn stats(&self, filter: &LogFilter) -> Result<StatsReport, StoreError>;

    /// Deletes the oldest records by event time until at most `limit` remain.
    /// A zero limit is a no-op. Returns the number of deleted rows.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    fn enforce_limit(&self, limit: u64) -> Result<u64, StoreError>;

    /// Deletes records older than `days` before `now`. Zero days is a no-op.
    /// Returns the number of deleted rows.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    fn purge_older_than(&self, days: u64, now: EventTime) -> Result<u64, StoreError>;

    /// Returns up to `limit` TTFB values, most recent event first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn recent_ttfb(&self, limit: usize) -> Result<Vec<f64>, StoreError>;

    /// Computes the summary report aggregates.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn report_summary(&self, min_hits: u64, top: usize) -> Result<ReportSummary, StoreError>;

    /// Deletes every record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    fn clear(&self) -> Result<(), StoreError>;

    /// Verifies the store can serve requests.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store is unavailable.
    fn readiness(&self) -> Result<(), StoreError>;
}

// ============================================================================
// SECTION: Option Store
// ============================================================================

/// Option store errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OptionStoreError {
    /// Store I/O error.
    #[error("option store io error: {0}")]
    Io(String),
    /// Stored value could not be decoded.
    #[error("option store invalid value: {0}")]
    Invalid(String),
    /// Store reported an error.
    #[error("option store error: {0}")]
    Store(String),
}

/// Named string value persistence.
pub trait OptionStore: Send + Sync {
    /// Reads a value.
    ///
    /// # Errors
    ///
    /// Returns [`OptionStoreError`] when the read fails.
    fn get(&self, key: &str) -> Result<Option<String>, OptionStoreError>;

    /// Writes a value, replacing any prior value.
    ///
    /// # Errors
    ///
    /// Returns [`OptionStoreError`] when the write fails.
    fn set(&self, key: &str, value: &str) -> Result<(), OptionStoreError>;

    /// Removes a value if present.
    ///
    /// # Errors
    ///
    /// Returns [`OptionStoreError`] when the write fails.
    fn delete(&self, key: &str) -> Result<(), OptionStoreError>;
}

// ============================================================================
// SECTION: Mail
// ============================================================================

/// Outbound plain-text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

/// Mail delivery errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MailError {
    /// Recipient is missing or malformed.
    #[error("invalid mail recipient")]
    InvalidRecipient,
    /// Transport refused or failed the message.
    #[error("mail transport error: {0}")]
    Transport(String),
}

/// Outbound mail transport.
pub trait MailSender: Send + Sync {
    /// Sends one message.
    ///
    /// # Errors
    ///
    /// Returns [`MailError`] when delivery fails.
    fn send(&self, message: &MailMessage) -> Result<(), MailError>;
}
