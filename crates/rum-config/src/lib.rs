// crates/rum-config/src/lib.rs
// ============================================================================
// Module: RUM Monitor Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for rum-monitor.toml semantics.
// Dependencies: rum-core, rum-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `rum-config` defines the configuration model for the RUM monitor server.
//! Loading is strict and fail-closed: oversized, non-UTF-8, unparsable, or
//! internally inconsistent files are rejected before any component starts.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
