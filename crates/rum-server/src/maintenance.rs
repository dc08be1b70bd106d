// crates/rum-server/src/maintenance.rs
// ============================================================================
// Module: Retention Maintenance
// Description: Age purge followed by count eviction.
// Purpose: Keep the log store within the configured retention window and size.
// Dependencies: rum-core
// ============================================================================

//! ## Overview
//! Maintenance runs after stored beacons and from the CLI. Both steps are
//! idempotent, so redundant or overlapping runs delete nothing extra.
//! [`reset_monitor`] is the full teardown used by `rum-monitor uninstall`.

use rum_core::EventTime;
use rum_core::LogStore;
use rum_core::OPTION_LAST_ALERT_TS;
use rum_core::OPTION_LAST_INTERVAL;
use rum_core::OPTION_NEXT_RUN;
use rum_core::OptionStore;
use rum_core::RuntimeError;
use rum_core::Settings;
use rum_core::SettingsAccessor;
use rum_core::StoreError;

/// Rows deleted by one maintenance pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    /// Rows older than the retention window.
    pub purged: u64,
    /// Oldest rows beyond the row limit.
    pub evicted: u64,
}

impl MaintenanceReport {
    /// Returns true when nothing was deleted.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.purged == 0 && self.evicted == 0
    }
}

/// Purges rows older than `retention_days`, then evicts down to `limit`.
///
/// # Errors
///
/// Returns [`StoreError`] when either step fails.
pub fn run_maintenance(
    store: &dyn LogStore,
    settings: &Settings,
    now: EventTime,
) -> Result<MaintenanceReport, StoreError> {
    let purged = store.purge_older_than(settings.retention_days, now)?;
    let evicted = store.enforce_limit(settings.limit)?;
    Ok(MaintenanceReport {
        purged,
        evicted,
    })
}

/// Deletes every stored row, the persisted settings, and the scheduler and
/// alert bookkeeping options. Returns the number of rows removed.
///
/// # Errors
///
/// Returns [`RuntimeError`] when the store or option store fails.
pub fn reset_monitor(
    store: &dyn LogStore,
    settings: &SettingsAccessor,
    options: &dyn OptionStore,
) -> Result<u64, RuntimeError> {
    let removed = store.count()?;
    store.clear()?;
    settings.reset()?;
    for key in [OPTION_LAST_INTERVAL, OPTION_LAST_ALERT_TS, OPTION_NEXT_RUN] {
        options.delete(key)?;
    }
    Ok(removed)
}
