// crates/rum-server/src/scheduler.rs
// ============================================================================
// Module: Report Scheduler
// Description: Recurring summary report and TTFB alert task.
// Purpose: Fire the periodic report and reconcile its interval with settings.
// Dependencies: rum-core, tokio
// ============================================================================

//! ## Overview
//! One recurring task sends the summary report and then evaluates TTFB
//! alerts. The period follows the `report_schedule` setting. Reconciliation
//! compares the desired interval with the persisted `last_interval` option:
//! on change the installed schedule is replaced with one whose first run is
//! a minute out, and the option is updated. With an unchanged interval the
//! persisted `next_run` is resumed, so restarts keep the cadence. Reconciliation runs at startup,
//! after every settings update, and on each loop iteration.
//!
//! Failures are audited and never stop the loop.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::str::FromStr;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;

use rum_core::AlertEvaluator;
use rum_core::AlertOutcome;
use rum_core::EventTime;
use rum_core::MailOutcome;
use rum_core::OPTION_LAST_INTERVAL;
use rum_core::OPTION_NEXT_RUN;
use rum_core::OptionStore;
use rum_core::ReportComposer;
use rum_core::RuntimeError;
use rum_core::SettingsAccessor;
use thiserror::Error;
use tokio::sync::Notify;
use tokio::sync::watch;

use crate::audit::AuditEvent;
use crate::audit::AuditSink;
use crate::audit::TaskAuditEvent;
use crate::gateway::with_blocking;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Delay before the first run of a freshly installed schedule.
pub const FIRST_RUN_DELAY_SECS: i64 = 60;
/// Longest sleep between loop iterations.
const MAX_IDLE: Duration = Duration::from_secs(60);

// ============================================================================
// SECTION: Types
// ============================================================================

/// Currently installed schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstalledSchedule {
    /// Period in seconds.
    pub interval_secs: u64,
    /// Next firing time.
    pub next_run: EventTime,
}

/// Result of one reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciliation {
    /// Installed schedule after reconciliation.
    pub schedule: InstalledSchedule,
    /// True when the persisted interval differed and the schedule was replaced.
    pub changed: bool,
}

/// Outcomes of one scheduled run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Summary report outcome.
    pub summary: Result<MailOutcome, RuntimeError>,
    /// Alert evaluation outcome.
    pub alert: Result<AlertOutcome, RuntimeError>,
}

/// Scheduler errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// Settings or option store failure.
    #[error("scheduler runtime error: {0}")]
    Runtime(String),
    /// Schedule state lock poisoned.
    #[error("scheduler state poisoned")]
    Poisoned,
}

impl From<RuntimeError> for SchedulerError {
    fn from(err: RuntimeError) -> Self {
        Self::Runtime(err.to_string())
    }
}

/// Shared scheduler state.
struct SchedulerInner {
    /// Option store holding `last_interval` and `next_run`.
    options: Arc<dyn OptionStore>,
    /// Settings source.
    settings: SettingsAccessor,
    /// Summary report composer.
    composer: ReportComposer,
    /// TTFB alert evaluator.
    alerts: AlertEvaluator,
    /// Audit sink.
    audit: Arc<dyn AuditSink>,
    /// Installed schedule, if any.
    installed: Mutex<Option<InstalledSchedule>>,
    /// Wakes the loop after a reschedule.
    wake: Notify,
}

/// Report scheduler handle.
#[derive(Clone)]
pub struct ReportScheduler {
    /// Shared state.
    inner: Arc<SchedulerInner>,
}

// ============================================================================
// SECTION: Scheduling
// ============================================================================

impl ReportScheduler {
    /// Creates a scheduler with no installed schedule.
    #[must_use]
    pub fn new(
        options: Arc<dyn OptionStore>,
        settings: SettingsAccessor,
        composer: ReportComposer,
        alerts: AlertEvaluator,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                options,
                settings,
                composer,
                alerts,
                audit,
                installed: Mutex::new(None),
                wake: Notify::new(),
            }),
        }
    }

    /// Returns the installed schedule.
    #[must_use]
    pub fn installed(&self) -> Option<InstalledSchedule> {
        self.lock().ok().and_then(|guard| *guard)
    }

    /// Reconciles the installed schedule with the current settings.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError`] when settings or options cannot be read or written.
    pub fn reconcile(&self, now: EventTime) -> Result<Reconciliation, SchedulerError> {
        let settings = self.inner.settings.get().map_err(RuntimeError::from)?;
        let desired = settings.report_schedule.interval_secs();
        let persisted = self.read_option::<u64>(OPTION_LAST_INTERVAL)?;
        let persisted_next = self.read_option::<i64>(OPTION_NEXT_RUN)?;
        let mut installed = self.lock()?;
        let changed = persisted != Some(desired)
            || installed.as_ref().is_some_and(|schedule| schedule.interval_secs != desired);
        if changed {
            *installed = None;
        }
        let fresh = installed.is_none();
        let resumed = if changed { None } else { persisted_next };
        let schedule = *installed.get_or_insert(InstalledSchedule {
            interval_secs: desired,
            next_run: resumed.map_or_else(
                || now.plus_seconds(FIRST_RUN_DELAY_SECS),
                EventTime::from_unix_seconds,
            ),
        });
        drop(installed);
        if changed {
            self.inner
                .options
                .set(OPTION_LAST_INTERVAL, &desired.to_string())
                .map_err(RuntimeError::from)?;
        }
        if fresh {
            self.persist_next_run(schedule.next_run)?;
            self.record(TaskAuditEvent::scheduled(desired, changed));
            self.inner.wake.notify_one();
        }
        Ok(Reconciliation {
            schedule,
            changed,
        })
    }

    /// Reconciles, then runs the task when the installed schedule is due.
    ///
    /// The advanced `next_run` is persisted before the task runs, so a
    /// restart resumes the cadence instead of firing again.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError`] when reconciliation fails.
    pub fn run_due(&self, now: EventTime) -> Result<Option<RunOutcome>, SchedulerError> {
        self.reconcile(now)?;
        let next_run = {
            let mut installed = self.lock()?;
            let Some(schedule) = installed.as_mut() else {
                return Ok(None);
            };
            if now < schedule.next_run {
                return Ok(None);
            }
            let interval = i64::try_from(schedule.interval_secs).unwrap_or(i64::MAX);
            schedule.next_run = now.plus_seconds(interval);
            schedule.next_run
        };
        if let Err(err) = self.persist_next_run(next_run) {
            self.record(TaskAuditEvent::scheduler_error(err.to_string()));
        }
        Ok(Some(self.run_once(now)))
    }

    /// Sends the summary and then evaluates alerts, regardless of the
    /// summary outcome.
    #[must_use]
    pub fn run_once(&self, now: EventTime) -> RunOutcome {
        let settings = match self.inner.settings.get() {
            Ok(settings) => settings,
            Err(err) => {
                let error = RuntimeError::from(err);
                self.record(TaskAuditEvent::report(false, Some(error.to_string())));
                self.record(TaskAuditEvent::alert_error(error.to_string()));
                return RunOutcome {
                    summary: Err(error.clone()),
                    alert: Err(error),
                };
            }
        };
        let summary = self.inner.composer.send_summary(&settings);
        match &summary {
            Ok(MailOutcome::Sent) => self.record(TaskAuditEvent::report(true, None)),
            Ok(MailOutcome::Failed(err)) => {
                self.record(TaskAuditEvent::report(false, Some(err.to_string())));
            }
            Err(err) => self.record(TaskAuditEvent::report(false, Some(err.to_string()))),
        }
        let alert = self.inner.alerts.evaluate(&settings, now);
        match &alert {
            Ok(outcome) => self.record(TaskAuditEvent::alert(outcome)),
            Err(err) => self.record(TaskAuditEvent::alert_error(err.to_string())),
        }
        RunOutcome {
            summary,
            alert,
        }
    }

    /// Runs the scheduling loop until `stop` flips to true or its sender drops.
    pub async fn run(self, mut stop: watch::Receiver<bool>) {
        loop {
            let now = EventTime::now();
            if let Err(err) = with_blocking(|| self.run_due(now)) {
                self.record(TaskAuditEvent::scheduler_error(err.to_string()));
            }
            let idle = self.installed().map_or(MAX_IDLE, |schedule| {
                let wait = schedule.next_run.unix_seconds().saturating_sub(now.unix_seconds());
                Duration::from_secs(u64::try_from(wait).unwrap_or(0).max(1)).min(MAX_IDLE)
            });
            tokio::select! {
                () = tokio::time::sleep(idle) => {}
                () = self.inner.wake.notified() => {}
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                }
            }
        }
    }

    /// Reads and parses an option; unparsable values read as absent.
    fn read_option<T: FromStr>(&self, key: &str) -> Result<Option<T>, SchedulerError> {
        let raw = self.inner.options.get(key).map_err(RuntimeError::from)?;
        Ok(raw.and_then(|raw| raw.trim().parse::<T>().ok()))
    }

    /// Persists the next firing time.
    fn persist_next_run(&self, next_run: EventTime) -> Result<(), SchedulerError> {
        self.inner
            .options
            .set(OPTION_NEXT_RUN, &next_run.unix_seconds().to_string())
            .map_err(RuntimeError::from)?;
        Ok(())
    }

    /// Locks the installed schedule.
    fn lock(&self) -> Result<MutexGuard<'_, Option<InstalledSchedule>>, SchedulerError> {
        self.inner.installed.lock().map_err(|_| SchedulerError::Poisoned)
    }

    /// Records a task audit event.
    fn record(&self, event: TaskAuditEvent) {
        self.inner.audit.record(&AuditEvent::Task(event));
    }
}
