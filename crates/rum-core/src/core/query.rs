// crates/rum-core/src/core/query.rs
// ============================================================================
// Module: Log Query Grammar
// Description: Filters, sort keys, and pagination for log queries.
// Purpose: Give every backend one closed query vocabulary.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Log queries are conjunctive filters plus an explicit sort key and
//! direction. Sort keys are a closed enum so backends never interpolate
//! caller-provided column names. Pagination is clamped on construction.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::record::PerformanceRecord;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default page size for log queries.
pub const DEFAULT_PER_PAGE: u32 = 50;
/// Maximum page size for log queries.
pub const MAX_PER_PAGE: u32 = 200;

// ============================================================================
// SECTION: Sorting
// ============================================================================

/// Allowed sort columns for log queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Sort by event timestamp.
    #[default]
    EventTime,
    /// Sort by time to first byte.
    Ttfb,
    /// Sort by largest contentful paint.
    Lcp,
    /// Sort by total load time.
    TotalLoad,
}

impl SortKey {
    /// Parses a sort key label. Unknown labels fall back to [`SortKey::EventTime`].
    #[must_use]
    pub fn parse(label: &str) -> Self {
        match label.trim() {
            "ttfb" => Self::Ttfb,
            "lcp" => Self::Lcp,
            "total_load" | "totalLoad" => Self::TotalLoad,
            _ => Self::EventTime,
        }
    }

    /// Returns the storage column name.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::EventTime => "event_time",
            Self::Ttfb => "ttfb",
            Self::Lcp => "lcp",
            Self::TotalLoad => "total_load",
        }
    }
}

/// Sort direction for log queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Ascending order.
    Asc,
    /// Descending order.
    #[default]
    Desc,
}

impl SortDirection {
    /// Parses a direction label; anything other than `asc` is descending.
    #[must_use]
    pub fn parse(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("asc") { Self::Asc } else { Self::Desc }
    }

    /// Returns the SQL keyword for this direction.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

// ============================================================================
// SECTION: Filters
// ============================================================================

/// Conjunctive log filter.
///
/// # Invariants
/// - Present values are non-empty; use [`LogFilter::normalized`] on raw input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogFilter {
    /// Exact session id match.
    pub session_id: Option<String>,
    /// URL substring match, ASCII case-insensitive.
    pub url_contains: Option<String>,
    /// Exact device match.
    pub device: Option<String>,
    /// Exact network type match.
    pub net: Option<String>,
}

impl LogFilter {
    /// Returns the filter with empty and whitespace-only values dropped.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            session_id: non_empty(self.session_id),
            url_contains: non_empty(self.url_contains),
            device: non_empty(self.device),
            net: non_empty(self.net),
        }
    }

    /// Returns true when no constraint is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.session_id.is_none()
            && self.url_contains.is_none()
            && self.device.is_none()
            && self.net.is_none()
    }

    /// Returns true when the record satisfies every present constraint.
    #[must_use]
    pub fn matches(&self, record: &PerformanceRecord) -> bool {
        self.session_id.as_deref().is_none_or(|value| record.session_id == value)
            && self.url_contains.as_deref().is_none_or(|value| contains_ascii_ci(&record.url, value))
            && self.device.as_deref().is_none_or(|value| record.device == value)
            && self.net.as_deref().is_none_or(|value| record.net == value)
    }
}

/// ASCII case-insensitive substring test, matching `SQLite` `LIKE` folding.
fn contains_ascii_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_ascii_lowercase().contains(&needle.to_ascii_lowercase())
}

/// Drops empty strings after trimming.
fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|text| text.trim().to_string()).filter(|text| !text.is_empty())
}

// ============================================================================
// SECTION: Pagination
// ============================================================================

/// Clamped page request.
///
/// # Invariants
/// - `page >= 1`.
/// - `1 <= per_page <= MAX_PER_PAGE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// One-based page number.
    page: u32,
    /// Rows per page.
    per_page: u32,
}

impl PageRequest {
    /// Builds a page request, clamping both values into range.
    #[must_use]
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    /// Returns the one-based page number.
    #[must_use]
    pub const fn page(self) -> u32 {
        self.page
    }

    /// Returns the page size.
    #[must_use]
    pub const fn per_page(self) -> u32 {
        self.per_page
    }

    /// Returns the zero-based row offset.
    #[must_use]
    pub fn offset(self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.per_page)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PER_PAGE)
    }
}

/// Full log query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogQuery {
    /// Row filter.
    pub filter: LogFilter,
    /// Pagination window.
    pub page: PageRequest,
    /// Sort column.
    pub sort: SortKey,
    /// Sort direction.
    pub direction: SortDirection,
}

/// One page of log rows plus the filtered total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogPage {
    /// Rows on this page.
    pub data: Vec<PerformanceRecord>,
    /// Count of all rows matching the filter.
    pub total: u64,
}

// ============================================================================
// SECTION: Tests
// ============================================================================
