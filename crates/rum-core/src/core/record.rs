// crates/rum-core/src/core/record.rs
// ============================================================================
// Module: Performance Records
// Description: Page-view performance record model and input normalization.
// Purpose: Define the persisted row shape and its sanitization rules.
// Dependencies: serde, serde_json, time
// ============================================================================

//! ## Overview
//! A [`PerformanceRecord`] is one captured page view. Timing fields are
//! seconds with `0.0` meaning "not measured"; there is no separate null
//! marker. [`NewRecord`] is the insert-side shape before an id is issued.
//!
//! Text fields are untrusted client input and are re-sanitized at the storage
//! boundary through [`NewRecord::sanitized`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de::Error as _;
use time::OffsetDateTime;
use time::PrimitiveDateTime;
use time::format_description::BorrowedFormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum stored URL length in characters.
pub const MAX_URL_CHARS: usize = 255;
/// Maximum stored device tag length in characters.
pub const MAX_DEVICE_CHARS: usize = 10;
/// Maximum stored network tag length in characters.
pub const MAX_NET_CHARS: usize = 20;
/// Maximum stored country code length in characters.
pub const MAX_COUNTRY_CHARS: usize = 3;
/// Maximum stored session identifier length in characters.
pub const MAX_SESSION_CHARS: usize = 64;
/// Maximum stored role label length in characters.
pub const MAX_ROLE_CHARS: usize = 50;
/// Seconds per day, used for retention cutoffs.
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Wire and storage format for event timestamps.
const EVENT_TIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

// ============================================================================
// SECTION: Identifiers
// ============================================================================

/// Store-issued record identifier.
///
/// # Invariants
/// - Issued in strictly increasing order by each store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(i64);

impl RecordId {
    /// Creates a record identifier from a raw value.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw identifier value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// SECTION: Event Time
// ============================================================================

/// UTC event timestamp with one-second resolution.
///
/// Serialized as `YYYY-MM-DD HH:MM:SS`. Parsing also accepts RFC 3339.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventTime(i64);

impl EventTime {
    /// Creates an event time from unix seconds.
    #[must_use]
    pub const fn from_unix_seconds(seconds: i64) -> Self {
        Self(seconds)
    }

    /// Returns the timestamp as unix seconds.
    #[must_use]
    pub const fn unix_seconds(self) -> i64 {
        self.0
    }

    /// Returns the current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        Self(OffsetDateTime::now_utc().unix_timestamp())
    }

    /// Returns this time shifted back by whole days.
    #[must_use]
    pub fn minus_days(self, days: u64) -> Self {
        let days = i64::try_from(days).unwrap_or(i64::MAX);
        Self(self.0.saturating_sub(days.saturating_mul(SECONDS_PER_DAY)))
    }

    /// Returns this time shifted forward by seconds.
    #[must_use]
    pub const fn plus_seconds(self, seconds: i64) -> Self {
        Self(self.0.saturating_add(seconds))
    }

    /// Parses `YYYY-MM-DD HH:MM:SS` (UTC) or RFC 3339 input.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if let Ok(value) = PrimitiveDateTime::parse(trimmed, EVENT_TIME_FORMAT) {
            return Some(Self(value.assume_utc().unix_timestamp()));
        }
        OffsetDateTime::parse(trimmed, &Rfc3339).ok().map(|value| Self(value.unix_timestamp()))
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let formatted = OffsetDateTime::from_unix_timestamp(self.0)
            .ok()
            .and_then(|value| value.format(EVENT_TIME_FORMAT).ok());
        match formatted {
            Some(text) => f.write_str(&text),
            None => write!(f, "{}", self.0),
        }
    }
}

impl Serialize for EventTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for EventTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).ok_or_else(|| D::Error::custom("invalid event time"))
    }
}

// ============================================================================
// SECTION: Records
// ============================================================================

/// Persisted page-view performance record.
///
/// # Invariants
/// - Timing fields are finite and non-negative; `0.0` means unmeasured.
/// - `id` is immutable once issued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    /// Store-issued identifier.
    pub id: RecordId,
    /// Event timestamp used for ordering and retention.
    pub event_time: EventTime,
    /// Client-observed page URL.
    pub url: String,
    /// Server generation time in seconds.
    pub server_time: f64,
    /// Time to first byte in seconds.
    pub ttfb: f64,
    /// Largest contentful paint in seconds.
    pub lcp: f64,
    /// Full page load time in seconds.
    pub total_load: f64,
    /// Peak server memory in bytes.
    pub memory_peak: u64,
    /// Coarse device class.
    pub device: String,
    /// Effective network type.
    pub net: String,
    /// Short country code.
    pub country: String,
    /// Browser session correlation id.
    pub session_id: String,
    /// Role of the authenticated viewer, empty when anonymous.
    pub user_role: String,
    /// Opaque JSON attachment.
    pub meta: Option<serde_json::Value>,
}

/// Insert-side record before an id is issued.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecord {
    /// Event timestamp.
    pub event_time: EventTime,
    /// Client-observed page URL.
    pub url: String,
    /// Server generation time in seconds.
    pub server_time: f64,
    /// Time to first byte in seconds.
    pub ttfb: f64,
    /// Largest contentful paint in seconds.
    pub lcp: f64,
    /// Full page load time in seconds.
    pub total_load: f64,
    /// Peak server memory in bytes.
    pub memory_peak: u64,
    /// Coarse device class.
    pub device: String,
    /// Effective network type.
    pub net: String,
    /// Short country code.
    pub country: String,
    /// Browser session correlation id.
    pub session_id: String,
    /// Role of the authenticated viewer.
    pub user_role: String,
    /// Opaque JSON attachment.
    pub meta: Option<serde_json::Value>,
}

impl NewRecord {
    /// Creates a record with the given URL and timestamp and all metrics unmeasured.
    #[must_use]
    pub fn new(event_time: EventTime, url: impl Into<String>) -> Self {
        Self {
            event_time,
            url: url.into(),
            server_time: 0.0,
            ttfb: 0.0,
            lcp: 0.0,
            total_load: 0.0,
            memory_peak: 0,
            device: String::new(),
            net: String::new(),
            country: String::new(),
            session_id: String::new(),
            user_role: String::new(),
            meta: None,
        }
    }

    /// Returns the record with every text field sanitized and bounded and
    /// every timing coerced to a finite non-negative value.
    #[must_use]
    pub fn sanitized(self) -> Self {
        Self {
            event_time: self.event_time,
            url: sanitize_text(&self.url, MAX_URL_CHARS),
            server_time: metric_seconds(self.server_time),
            ttfb: metric_seconds(self.ttfb),
            lcp: metric_seconds(self.lcp),
            total_load: metric_seconds(self.total_load),
            memory_peak: self.memory_peak,
            device: sanitize_text(&self.device, MAX_DEVICE_CHARS),
            net: sanitize_text(&self.net, MAX_NET_CHARS),
            country: sanitize_text(&self.country, MAX_COUNTRY_CHARS),
            session_id: sanitize_text(&self.session_id, MAX_SESSION_CHARS),
            user_role: sanitize_text(&self.user_role, MAX_ROLE_CHARS),
            meta: self.meta,
        }
    }

    /// Attaches a store-issued id.
    #[must_use]
    pub fn into_record(self, id: RecordId) -> PerformanceRecord {
        PerformanceRecord {
            id,
            event_time: self.event_time,
            url: self.url,
            server_time: self.server_time,
            ttfb: self.ttfb,
            lcp: self.lcp,
            total_load: self.total_load,
            memory_peak: self.memory_peak,
            device: self.device,
            net: self.net,
            country: self.country,
            session_id: self.session_id,
            user_role: self.user_role,
            meta: self.meta,
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Coerces a timing value to a finite, non-negative number of seconds.
#[must_use]
pub const fn metric_seconds(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 { value } else { 0.0 }
}

/// Sanitizes a single-line text field.
///
/// Markup tags and control characters are removed, whitespace runs collapse
/// to one space, the result is trimmed and truncated to `max_chars`.
#[must_use]
pub fn sanitize_text(input: &str, max_chars: usize) -> String {
    let mut output = String::with_capacity(input.len().min(max_chars * 4));
    let mut in_tag = false;
    let mut pending_space = false;
    let mut written = 0usize;
    for ch in input.chars() {
        if in_tag {
            if ch == '>' {
                in_tag = false;
            }
            continue;
        }
        if ch == '<' {
            in_tag = true;
            continue;
        }
        if ch.is_whitespace() {
            pending_space = written > 0;
            continue;
        }
        if ch.is_control() {
            continue;
        }
        if pending_space {
            if written + 1 >= max_chars {
                break;
            }
            output.push(' ');
            written += 1;
            pending_space = false;
        }
        if written >= max_chars {
            break;
        }
        output.push(ch);
        written += 1;
    }
    output
}

// ============================================================================
// SECTION: Tests
// ============================================================================
