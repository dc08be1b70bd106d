// crates/rum-core/src/core/mod.rs
// ============================================================================
// Module: RUM Core Types
// Description: Canonical performance record, query, stats, and settings types.
// Purpose: Provide stable, serializable types shared by every backend and surface.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Core types are the single source of truth for the JSON shapes returned by
//! the HTTP surface and the rows persisted by storage backends.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod identity;
pub mod query;
pub mod record;
pub mod settings;
pub mod stats;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use identity::Identity;
pub use query::DEFAULT_PER_PAGE;
pub use query::LogFilter;
pub use query::LogPage;
pub use query::LogQuery;
pub use query::MAX_PER_PAGE;
pub use query::PageRequest;
pub use query::SortDirection;
pub use query::SortKey;
pub use record::EventTime;
pub use record::NewRecord;
pub use record::PerformanceRecord;
pub use record::RecordId;
pub use record::metric_seconds;
pub use record::sanitize_text;
pub use settings::ListInput;
pub use settings::ReportSchedule;
pub use settings::Settings;
pub use settings::SettingsUpdate;
pub use settings::is_valid_email;
pub use stats::DeviceCount;
pub use stats::PageSummary;
pub use stats::ReportSummary;
pub use stats::SLOWEST_URL_LIMIT;
pub use stats::StatsReport;
pub use stats::UrlLcpAggregate;
pub use stats::UrlServerAggregate;
pub use stats::mean_excluding_zero;
pub use stats::nearest_rank_index;
pub use stats::round3;
