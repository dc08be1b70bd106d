// crates/rum-core/src/runtime/store.rs
// ============================================================================
// Module: RUM In-Memory Stores
// Description: In-memory log and option stores for tests and ephemeral runs.
// Purpose: Provide reference backends without external dependencies.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! This module provides in-memory implementations of [`LogStore`] and
//! [`OptionStore`]. They define the reference semantics the `SQLite` backend
//! is tested against. Data is lost on process exit.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::core::EventTime;
use crate::core::LogFilter;
use crate::core::LogPage;
use crate::core::LogQuery;
use crate::core::NewRecord;
use crate::core::PerformanceRecord;
use crate::core::RecordId;
use crate::core::ReportSummary;
use crate::core::SortDirection;
use crate::core::SortKey;
use crate::core::StatsReport;
use crate::interfaces::LogStore;
use crate::interfaces::OptionStore;
use crate::interfaces::OptionStoreError;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Log Store
// ============================================================================

/// Mutable state behind the in-memory log store.
#[derive(Debug, Default)]
struct MemoryLogState {
    /// Last issued id.
    last_id: i64,
    /// Records keyed by id.
    rows: BTreeMap<RecordId, PerformanceRecord>,
}

/// In-memory log store.
#[derive(Debug, Default, Clone)]
pub struct InMemoryLogStore {
    /// Shared store state.
    state: Arc<Mutex<MemoryLogState>>,
}

impl InMemoryLogStore {
    /// Creates an empty in-memory log store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the store state.
    fn lock(&self) -> Result<MutexGuard<'_, MemoryLogState>, StoreError> {
        self.state.lock().map_err(|_| StoreError::Store("log store mutex poisoned".to_string()))
    }
}

impl LogStore for InMemoryLogStore {
    fn insert(&self, record: NewRecord) -> Result<RecordId, StoreError> {
        let mut guard = self.lock()?;
        guard.last_id = guard.last_id.saturating_add(1);
        let id = RecordId::new(guard.last_id);
        guard.rows.insert(id, record.sanitized().into_record(id));
        Ok(id)
    }

    fn get(&self, id: RecordId) -> Result<Option<PerformanceRecord>, StoreError> {
        Ok(self.lock()?.rows.get(&id).cloned())
    }

    fn count(&self) -> Result<u64, StoreError> {
        Ok(self.lock()?.rows.len() as u64)
    }

    fn query_logs(&self, query: &LogQuery) -> Result<LogPage, StoreError> {
        let guard = self.lock()?;
        let mut matching: Vec<&PerformanceRecord> =
            guard.rows.values().filter(|record| query.filter.matches(record)).collect();
        matching.sort_by(|a, b| compare_for_sort(a, b, query.sort, query.direction));
        let total = matching.len() as u64;
        let offset = usize::try_from(query.page.offset()).unwrap_or(usize::MAX);
        let per_page = usize::try_from(query.page.per_page()).unwrap_or(usize::MAX);
        let data = matching.into_iter().skip(offset).take(per_page).cloned().collect();
        Ok(LogPage {
            data,
            total,
        })
    }

    fn stats(&self, filter: &LogFilter) -> Result<StatsReport, StoreError> {
        let guard = self.lock()?;
        let matching: Vec<&PerformanceRecord> =
            guard.rows.values().filter(|record| filter.matches(record)).collect();
        Ok(StatsReport::from_records(&matching))
    }

    fn enforce_limit(&self, limit: u64) -> Result<u64, StoreError> {
        if limit == 0 {
            return Ok(0);
        }
        let mut guard = self.lock()?;
        let total = guard.rows.len() as u64;
        if total <= limit {
            return Ok(0);
        }
        let excess = usize::try_from(total - limit).unwrap_or(usize::MAX);
        let mut oldest: Vec<(EventTime, RecordId)> =
            guard.rows.values().map(|record| (record.event_time, record.id)).collect();
        oldest.sort_unstable();
        let mut deleted = 0u64;
        for (_, id) in oldest.into_iter().take(excess) {
            if guard.rows.remove(&id).is_some() {
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    fn purge_older_than(&self, days: u64, now: EventTime) -> Result<u64, StoreError> {
        if days == 0 {
            return Ok(0);
        }
        let cutoff = now.minus_days(days);
        let mut guard = self.lock()?;
        let before = guard.rows.len();
        guard.rows.retain(|_, record| record.event_time >= cutoff);
        Ok((before - guard.rows.len()) as u64)
    }

    fn recent_ttfb(&self, limit: usize) -> Result<Vec<f64>, StoreError> {
        let guard = self.lock()?;
        let mut rows: Vec<&PerformanceRecord> = guard.rows.values().collect();
        rows.sort_by(|a, b| b.event_time.cmp(&a.event_time).then_with(|| b.id.cmp(&a.id)));
        Ok(rows.into_iter().take(limit).map(|record| record.ttfb).collect())
    }

    fn report_summary(&self, min_hits: u64, top: usize) -> Result<ReportSummary, StoreError> {
        let guard = self.lock()?;
        let rows: Vec<&PerformanceRecord> = guard.rows.values().collect();
        Ok(ReportSummary::from_records(&rows, min_hits, top))
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.lock()?.rows.clear();
        Ok(())
    }

    fn readiness(&self) -> Result<(), StoreError> {
        self.lock().map(|_| ())
    }
}

/// Orders two records by sort key and direction, then by id in the same direction.
fn compare_for_sort(
    a: &PerformanceRecord,
    b: &PerformanceRecord,
    key: SortKey,
    direction: SortDirection,
) -> Ordering {
    let primary = match key {
        SortKey::EventTime => a.event_time.cmp(&b.event_time),
        SortKey::Ttfb => a.ttfb.total_cmp(&b.ttfb),
        SortKey::Lcp => a.lcp.total_cmp(&b.lcp),
        SortKey::TotalLoad => a.total_load.total_cmp(&b.total_load),
    };
    let ordering = primary.then_with(|| a.id.cmp(&b.id));
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

// ============================================================================
// SECTION: Option Store
// ============================================================================

/// In-memory option store.
#[derive(Debug, Default, Clone)]
pub struct InMemoryOptionStore {
    /// Option map protected by a mutex.
    values: Arc<Mutex<BTreeMap<String, String>>>,
}

impl InMemoryOptionStore {
    /// Creates an empty option store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the option map.
    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, String>>, OptionStoreError> {
        self.values
            .lock()
            .map_err(|_| OptionStoreError::Store("option store mutex poisoned".to_string()))
    }
}

impl OptionStore for InMemoryOptionStore {
    fn get(&self, key: &str) -> Result<Option<String>, OptionStoreError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), OptionStoreError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), OptionStoreError> {
        self.lock()?.remove(key);
        Ok(())
    }
}
