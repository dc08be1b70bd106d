// crates/rum-core/src/core/settings.rs
// ============================================================================
// Module: Monitor Settings
// Description: Process-wide settings model with per-field clamping.
// Purpose: Define defaults and the partial-update rules for settings writes.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`Settings`] is the single process-wide configuration record. Writes go
//! through [`Settings::apply`], which validates each field of a
//! [`SettingsUpdate`] independently: out-of-range values are clamped, invalid
//! values keep the prior setting, and absent fields are left untouched.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::record::MAX_ROLE_CHARS;
use crate::core::record::sanitize_text;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Seconds between daily reports.
pub const DAILY_INTERVAL_SECS: u64 = 86_400;
/// Seconds between weekly reports.
pub const WEEKLY_INTERVAL_SECS: u64 = 604_800;
/// Lower bound for the alert cool-down.
pub const MIN_ALERT_INTERVAL_SECS: u64 = 300;
/// Maximum length of a blacklist prefix.
const MAX_PREFIX_CHARS: usize = 255;
/// Maximum length of an email address.
const MAX_EMAIL_CHARS: usize = 254;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Summary report cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportSchedule {
    /// Once per day.
    #[default]
    Daily,
    /// Once per week.
    Weekly,
}

impl ReportSchedule {
    /// Parses a schedule label; unknown labels return `None`.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim() {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            _ => None,
        }
    }

    /// Returns the interval between runs in seconds.
    #[must_use]
    pub const fn interval_secs(self) -> u64 {
        match self {
            Self::Daily => DAILY_INTERVAL_SECS,
            Self::Weekly => WEEKLY_INTERVAL_SECS,
        }
    }

    /// Returns the schedule label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        }
    }
}

/// Monitor settings.
///
/// # Invariants
/// - `limit >= 1`, `retention_days >= 1`, `alert_consecutive >= 1`.
/// - `sample_rate` in `[0, 1]`.
/// - `alert_ttfb_threshold >= 0`.
/// - `alert_min_interval >= MIN_ALERT_INTERVAL_SECS`.
/// - `alert_recipient` is empty or a valid address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Maximum stored rows.
    pub limit: u64,
    /// Maximum row age in days.
    pub retention_days: u64,
    /// Fraction of eligible page views to track.
    pub sample_rate: f64,
    /// Roles never tracked.
    pub excluded_roles: Vec<String>,
    /// URL path prefixes never tracked.
    pub blacklist: Vec<String>,
    /// Summary report cadence.
    pub report_schedule: ReportSchedule,
    /// TTFB alert threshold in seconds; `0` disables alerts.
    pub alert_ttfb_threshold: f64,
    /// Consecutive breaches required to alert.
    pub alert_consecutive: u32,
    /// Minimum seconds between alerts.
    pub alert_min_interval: u64,
    /// Alert and report recipient; empty uses the configured admin address.
    pub alert_recipient: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            limit: 1000,
            retention_days: 30,
            sample_rate: 1.0,
            excluded_roles: vec!["administrator".to_string(), "editor".to_string()],
            blacklist: Vec::new(),
            report_schedule: ReportSchedule::Daily,
            alert_ttfb_threshold: 2.0,
            alert_consecutive: 5,
            alert_min_interval: 3600,
            alert_recipient: String::new(),
        }
    }
}

/// List input accepted either as an array or a delimited string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListInput {
    /// Explicit list of entries.
    List(Vec<String>),
    /// Delimited text.
    Text(String),
}

impl ListInput {
    /// Splits into sanitized non-empty entries. Text is split on `delimiter`.
    fn entries(self, delimiter: char, max_chars: usize) -> Vec<String> {
        let raw: Vec<String> = match self {
            Self::List(items) => items,
            Self::Text(text) => text.split(delimiter).map(str::to_string).collect(),
        };
        raw.iter()
            .map(|item| sanitize_text(item, max_chars))
            .filter(|item| !item.is_empty())
            .collect()
    }
}

/// Partial settings update. Absent fields keep their prior value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsUpdate {
    /// New row limit.
    pub limit: Option<i64>,
    /// New retention in days.
    pub retention_days: Option<i64>,
    /// New sample rate.
    pub sample_rate: Option<f64>,
    /// New excluded roles (comma-separated text or list).
    pub excluded_roles: Option<ListInput>,
    /// New blacklist (newline-separated text or list).
    pub blacklist: Option<ListInput>,
    /// New report schedule label.
    pub report_schedule: Option<String>,
    /// New TTFB alert threshold.
    pub alert_ttfb_threshold: Option<f64>,
    /// New consecutive breach count.
    pub alert_consecutive: Option<i64>,
    /// New alert cool-down in seconds.
    pub alert_min_interval: Option<i64>,
    /// New recipient address.
    pub alert_recipient: Option<String>,
}

// ============================================================================
// SECTION: Clamping
// ============================================================================

impl Settings {
    /// Applies a partial update, validating each field independently.
    #[must_use]
    pub fn apply(&self, update: SettingsUpdate) -> Self {
        let mut next = self.clone();
        if let Some(limit) = update.limit {
            next.limit = clamp_positive(limit, 1);
        }
        if let Some(days) = update.retention_days {
            next.retention_days = clamp_positive(days, 1);
        }
        if let Some(rate) = update.sample_rate
            && rate.is_finite()
        {
            next.sample_rate = rate.clamp(0.0, 1.0);
        }
        if let Some(roles) = update.excluded_roles {
            next.excluded_roles = roles.entries(',', MAX_ROLE_CHARS);
        }
        if let Some(prefixes) = update.blacklist {
            next.blacklist = prefixes.entries('\n', MAX_PREFIX_CHARS);
        }
        if let Some(schedule) = update.report_schedule.as_deref().and_then(ReportSchedule::parse) {
            next.report_schedule = schedule;
        }
        if let Some(threshold) = update.alert_ttfb_threshold
            && threshold.is_finite()
        {
            next.alert_ttfb_threshold = threshold.max(0.0);
        }
        if let Some(consecutive) = update.alert_consecutive {
            next.alert_consecutive =
                u32::try_from(clamp_positive(consecutive, 1)).unwrap_or(u32::MAX);
        }
        if let Some(interval) = update.alert_min_interval {
            next.alert_min_interval = clamp_positive(interval, MIN_ALERT_INTERVAL_SECS);
        }
        if let Some(recipient) = update.alert_recipient {
            let trimmed = recipient.trim();
            if trimmed.is_empty() {
                next.alert_recipient = String::new();
            } else if is_valid_email(trimmed) {
                next.alert_recipient = trimmed.to_string();
            }
        }
        next
    }

    /// Returns the settings with every invariant re-established.
    ///
    /// Used on values loaded from persistence or configuration files.
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self::default().apply(SettingsUpdate::from(self))
    }

    /// Resolves the notification recipient, falling back to `fallback`.
    ///
    /// Returns `None` when neither address is valid.
    #[must_use]
    pub fn recipient_or<'a>(&'a self, fallback: &'a str) -> Option<&'a str> {
        let candidate =
            if self.alert_recipient.trim().is_empty() { fallback } else { &self.alert_recipient };
        let candidate = candidate.trim();
        is_valid_email(candidate).then_some(candidate)
    }
}

impl From<&Settings> for SettingsUpdate {
    fn from(settings: &Settings) -> Self {
        Self {
            limit: Some(i64::try_from(settings.limit).unwrap_or(i64::MAX)),
            retention_days: Some(i64::try_from(settings.retention_days).unwrap_or(i64::MAX)),
            sample_rate: Some(settings.sample_rate),
            excluded_roles: Some(ListInput::List(settings.excluded_roles.clone())),
            blacklist: Some(ListInput::List(settings.blacklist.clone())),
            report_schedule: Some(settings.report_schedule.as_str().to_string()),
            alert_ttfb_threshold: Some(settings.alert_ttfb_threshold),
            alert_consecutive: Some(i64::from(settings.alert_consecutive)),
            alert_min_interval: Some(i64::try_from(settings.alert_min_interval).unwrap_or(i64::MAX)),
            alert_recipient: Some(settings.alert_recipient.clone()),
        }
    }
}

/// Clamps a signed value to at least `min`.
fn clamp_positive(value: i64, min: u64) -> u64 {
    u64::try_from(value).unwrap_or(0).max(min)
}

/// Returns true for a syntactically plausible single email address.
#[must_use]
pub fn is_valid_email(candidate: &str) -> bool {
    if candidate.len() > MAX_EMAIL_CHARS || candidate.chars().any(|ch| ch.is_whitespace()) {
        return false;
    }
    let Some((local, domain)) = candidate.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '-')
        })
}

// ============================================================================
// SECTION: Tests
// ============================================================================
