// crates/rum-core/src/runtime/mod.rs
// ============================================================================
// Module: RUM Runtime
// Description: Settings access, tracking policy, alerts, reports, and in-memory backends.
// Purpose: Implement monitor behavior on top of the backend-agnostic interfaces.
// Dependencies: crate::{core, interfaces}, rand
// ============================================================================

//! ## Overview
//! Runtime modules hold the behavior shared by every surface: which page
//! views are tracked, how settings are cached and written, when TTFB alerts
//! fire, and how the periodic summary is composed.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod alerts;
pub mod error;
pub mod policy;
pub mod report;
pub mod settings;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use alerts::AlertEvaluator;
pub use alerts::AlertOutcome;
pub use error::RuntimeError;
pub use policy::RandomSampleSource;
pub use policy::SampleSource;
pub use policy::TrackingPolicy;
pub use report::MailOutcome;
pub use report::ReportComposer;
pub use settings::SettingsAccessor;
pub use store::InMemoryLogStore;
pub use store::InMemoryOptionStore;
