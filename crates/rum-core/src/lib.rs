// crates/rum-core/src/lib.rs
// ============================================================================
// Module: RUM Core Library
// Description: Public API surface for the RUM Monitor core.
// Purpose: Expose record types, storage interfaces, and runtime helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! RUM core defines the performance record model, the log query grammar, the
//! aggregate statistics contract, and the backend-agnostic interfaces used by
//! the ingest gateway and report scheduler. Storage, mail, and option
//! persistence are reached only through the traits in [`interfaces`], so the
//! same runtime logic runs against the in-memory backends here and the
//! `SQLite` backend in `rum-store-sqlite`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::LogStore;
pub use interfaces::MailError;
pub use interfaces::MailMessage;
pub use interfaces::MailSender;
pub use interfaces::OPTION_LAST_ALERT_TS;
pub use interfaces::OPTION_LAST_INTERVAL;
pub use interfaces::OPTION_NEXT_RUN;
pub use interfaces::OPTION_SETTINGS;
pub use interfaces::OptionStore;
pub use interfaces::OptionStoreError;
pub use interfaces::StoreError;
pub use runtime::AlertEvaluator;
pub use runtime::AlertOutcome;
pub use runtime::InMemoryLogStore;
pub use runtime::InMemoryOptionStore;
pub use runtime::MailOutcome;
pub use runtime::RandomSampleSource;
pub use runtime::RuntimeError;
pub use runtime::ReportComposer;
pub use runtime::SampleSource;
pub use runtime::SettingsAccessor;
pub use runtime::TrackingPolicy;
