// crates/rum-server/src/audit.rs
// ============================================================================
// Module: Audit Logging
// Description: Structured audit events for ingestion, admin access, and tasks.
// Purpose: Emit JSON-lines audit logs without hard logging dependencies.
// Dependencies: rum-core, serde, serde_json
// ============================================================================

//! ## Overview
//! Every gateway decision and background task outcome is recorded as one
//! JSON line carrying an `event` label and `timestamp_ms`. Sinks write to
//! stderr, to an append-only file, or nowhere. Events never carry beacon
//! payloads or raw tokens.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use rum_core::AlertOutcome;
use serde::Serialize;

use crate::maintenance::MaintenanceReport;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Ingest decision outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestOutcome {
    /// Beacon stored.
    Stored,
    /// Beacon excluded by tracking policy.
    Skipped,
    /// Beacon rejected (token or payload).
    Rejected,
    /// Storage failed.
    Failed,
}

/// Beacon ingestion audit event.
#[derive(Debug, Clone, Serialize)]
pub struct IngestAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Ingest outcome.
    pub outcome: IngestOutcome,
    /// HTTP status returned.
    pub status: u16,
    /// Request body size in bytes.
    pub request_bytes: usize,
    /// Peer IP address when available.
    pub peer_ip: Option<String>,
    /// Rejection or failure code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

impl IngestAuditEvent {
    /// Creates an ingest event with a consistent timestamp.
    #[must_use]
    pub fn new(
        outcome: IngestOutcome,
        status: u16,
        request_bytes: usize,
        peer_ip: Option<String>,
        code: Option<&'static str>,
    ) -> Self {
        Self {
            event: "ingest",
            timestamp_ms: now_millis(),
            outcome,
            status,
            request_bytes,
            peer_ip,
            code,
        }
    }
}

/// Privileged endpoint access audit event.
#[derive(Debug, Clone, Serialize)]
pub struct AdminAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Endpoint label.
    pub endpoint: &'static str,
    /// Decision outcome (`allow` or `deny`).
    pub decision: &'static str,
    /// Principal subject on allow.
    pub subject: Option<String>,
    /// Bearer token fingerprint (sha256).
    pub token_fingerprint: Option<String>,
    /// Failure reason on deny.
    pub reason: Option<String>,
    /// Peer IP address when available.
    pub peer_ip: Option<String>,
}

impl AdminAuditEvent {
    /// Builds an allow event.
    #[must_use]
    pub fn allowed(
        endpoint: &'static str,
        subject: String,
        token_fingerprint: Option<String>,
        peer_ip: Option<String>,
    ) -> Self {
        Self {
            event: "admin_request",
            timestamp_ms: now_millis(),
            endpoint,
            decision: "allow",
            subject: Some(subject),
            token_fingerprint,
            reason: None,
            peer_ip,
        }
    }

    /// Builds a deny event.
    #[must_use]
    pub fn denied(endpoint: &'static str, reason: String, peer_ip: Option<String>) -> Self {
        Self {
            event: "admin_request",
            timestamp_ms: now_millis(),
            endpoint,
            decision: "deny",
            subject: None,
            token_fingerprint: None,
            reason: Some(reason),
            peer_ip,
        }
    }
}

/// Background task audit event (reports, alerts, maintenance, scheduling).
#[derive(Debug, Clone, Serialize)]
pub struct TaskAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Outcome label.
    pub outcome: &'static str,
    /// Failure detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Observed alert streak.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streak: Option<usize>,
    /// Rows purged by age.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purged: Option<u64>,
    /// Rows evicted by count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evicted: Option<u64>,
    /// Report interval in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_secs: Option<u64>,
}

impl TaskAuditEvent {
    /// Builds a bare task event.
    fn bare(event: &'static str, outcome: &'static str) -> Self {
        Self {
            event,
            timestamp_ms: now_millis(),
            outcome,
            detail: None,
            streak: None,
            purged: None,
            evicted: None,
            interval_secs: None,
        }
    }

    /// Summary report outcome.
    #[must_use]
    pub fn report(sent: bool, detail: Option<String>) -> Self {
        Self {
            detail,
            ..Self::bare("report", if sent { "sent" } else { "failed" })
        }
    }

    /// Alert evaluation outcome.
    #[must_use]
    pub fn alert(outcome: &AlertOutcome) -> Self {
        let (label, streak, detail) = match outcome {
            AlertOutcome::Disabled => ("disabled", None, None),
            AlertOutcome::BelowStreak {
                streak,
            } => ("below_streak", Some(*streak), None),
            AlertOutcome::CoolingDown {
                streak,
                remaining_secs,
            } => ("cooling_down", Some(*streak), Some(format!("{remaining_secs}s remaining"))),
            AlertOutcome::Sent {
                streak,
            } => ("sent", Some(*streak), None),
            AlertOutcome::SendFailed {
                streak,
                error,
            } => ("send_failed", Some(*streak), Some(error.to_string())),
        };
        Self {
            streak,
            detail,
            ..Self::bare("alert", label)
        }
    }

    /// Alert evaluation that could not run.
    #[must_use]
    pub fn alert_error(detail: String) -> Self {
        Self {
            detail: Some(detail),
            ..Self::bare("alert", "error")
        }
    }

    /// Retention maintenance that deleted rows.
    #[must_use]
    pub fn maintenance(report: MaintenanceReport) -> Self {
        Self {
            purged: Some(report.purged),
            evicted: Some(report.evicted),
            ..Self::bare("maintenance", "ok")
        }
    }

    /// Retention maintenance failure.
    #[must_use]
    pub fn maintenance_error(detail: String) -> Self {
        Self {
            detail: Some(detail),
            ..Self::bare("maintenance", "error")
        }
    }

    /// Schedule reconciliation that installed a schedule.
    #[must_use]
    pub fn scheduled(interval_secs: u64, changed: bool) -> Self {
        Self {
            interval_secs: Some(interval_secs),
            ..Self::bare("scheduler", if changed { "rescheduled" } else { "installed" })
        }
    }

    /// Scheduler failure.
    #[must_use]
    pub fn scheduler_error(detail: String) -> Self {
        Self {
            detail: Some(detail),
            ..Self::bare("scheduler", "error")
        }
    }
}

/// Security posture audit event.
#[derive(Debug, Clone, Serialize)]
pub struct SecurityAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Security event kind.
    pub kind: &'static str,
    /// Human-readable message.
    pub message: String,
}

impl SecurityAuditEvent {
    /// Creates a security event with a consistent timestamp.
    #[must_use]
    pub fn new(kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            event: "security",
            timestamp_ms: now_millis(),
            kind,
            message: message.into(),
        }
    }
}

/// Any audit event.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum AuditEvent {
    /// Beacon ingestion.
    Ingest(IngestAuditEvent),
    /// Privileged access decision.
    Admin(AdminAuditEvent),
    /// Background task outcome.
    Task(TaskAuditEvent),
    /// Security posture.
    Security(SecurityAuditEvent),
}

impl AuditEvent {
    /// Returns the event label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Ingest(event) => event.event,
            Self::Admin(event) => event.event,
            Self::Task(event) => event.event,
            Self::Security(event) => event.event,
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink for gateway events.
pub trait AuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: &AuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record(&self, event: &AuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that appends JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, event: &AuditEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: &AuditEvent) {}
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns milliseconds since the unix epoch.
fn now_millis() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
