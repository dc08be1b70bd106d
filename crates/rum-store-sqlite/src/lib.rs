// crates/rum-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite RUM Store
// Description: Durable LogStore and OptionStore backends using SQLite.
// Purpose: Provide production persistence for performance records and options.
// Dependencies: rum-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides a SQLite-backed [`LogStore`] and [`OptionStore`]
//! implementation. Records live in a single indexed table; aggregates are
//! computed in SQL. Security posture: database contents and filter values
//! are untrusted; every value is bound as a parameter.
//!
//! [`LogStore`]: rum_core::LogStore
//! [`OptionStore`]: rum_core::OptionStore

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SqliteRumStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
