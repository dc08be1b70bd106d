// crates/rum-server/src/lib.rs
// ============================================================================
// Module: RUM Server Library
// Description: Ingest gateway, report scheduler, and server wiring.
// Purpose: Expose the HTTP gateway and background tasks of the RUM monitor.
// Dependencies: crate::{audit, auth, gateway, mail, maintenance, scheduler, server}
// ============================================================================

//! ## Overview
//! This crate hosts the server side of the RUM monitor: beacon ingestion,
//! privileged reads and settings, manual and scheduled reports, TTFB alerts,
//! and retention maintenance. Storage, mail, and audit are injected through
//! traits so tests run against in-memory backends.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod auth;
pub mod gateway;
pub mod mail;
pub mod maintenance;
pub mod scheduler;
pub mod server;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditEvent;
pub use audit::AuditSink;
pub use audit::FileAuditSink;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use auth::AdminAuthz;
pub use auth::CollectTokenIssuer;
pub use auth::RequestContext;
pub use gateway::CollectOutcome;
pub use gateway::GatewayError;
pub use gateway::REPORT_FAILURE_MESSAGE;
pub use gateway::StatusBody;
pub use mail::LogMailSender;
pub use mail::SpoolMailSender;
pub use mail::build_mail_sender;
pub use maintenance::MaintenanceReport;
pub use maintenance::reset_monitor;
pub use maintenance::run_maintenance;
pub use scheduler::FIRST_RUN_DELAY_SECS;
pub use scheduler::ReportScheduler;
pub use scheduler::RunOutcome;
pub use scheduler::SchedulerError;
pub use server::RumServer;
pub use server::ServerBackends;
pub use server::ServerError;
