// crates/rum-core/src/runtime/error.rs
// ============================================================================
// Module: RUM Runtime Errors
// Description: Error type shared by runtime components.
// Purpose: Unify store and option failures for settings, alerts, and reports.
// Dependencies: crate::interfaces, thiserror
// ============================================================================

//! ## Overview
//! [`RuntimeError`] wraps the log store and option store failures that the
//! settings accessor, alert evaluator, and report composer can hit, so
//! callers handle one error type.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::interfaces::OptionStoreError;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised by runtime components.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// Log store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Option store failure.
    #[error(transparent)]
    Options(#[from] OptionStoreError),
}
