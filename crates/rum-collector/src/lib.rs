// crates/rum-collector/src/lib.rs
// ============================================================================
// Module: RUM Collector Library
// Description: Client-side metric sampling and beacon delivery.
// Purpose: Expose the sampler, delivery agent, and bootstrap contract.
// Dependencies: crate::{bootstrap, delivery, sampler}
// ============================================================================

//! ## Overview
//! The collector runs in the viewer's browser. This crate expresses its
//! logic against small capability traits ([`PageEnvironment`],
//! [`SessionStorage`], [`BeaconTransport`]) so measurement and delivery
//! rules are testable without a browser. The host binds the traits to the
//! real page APIs.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod bootstrap;
pub mod delivery;
pub mod sampler;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use bootstrap::CollectorBootstrap;
pub use bootstrap::DEFAULT_SESSION_KEY;
pub use bootstrap::ServerContext;
pub use delivery::BeaconTransport;
pub use delivery::DeliveryAgent;
pub use delivery::DeliveryOutcome;
pub use delivery::IdSource;
pub use delivery::NONCE_HEADER;
pub use delivery::OutboundRequest;
pub use delivery::RandomIdSource;
pub use delivery::SessionStorage;
pub use delivery::StorageUnavailable;
pub use delivery::TOKEN_QUERY_PARAM;
pub use delivery::TransportError;
pub use delivery::TransportKind;
pub use delivery::Visibility;
pub use delivery::resolve_session_id;
pub use sampler::BeaconPayload;
pub use sampler::CollectorError;
pub use sampler::ConnectionInfo;
pub use sampler::DeviceClass;
pub use sampler::DeviceClassifier;
pub use sampler::LcpEntry;
pub use sampler::LcpTracker;
pub use sampler::LegacyTiming;
pub use sampler::MetricSampler;
pub use sampler::NavigationMetrics;
pub use sampler::NavigationTiming;
pub use sampler::PageEnvironment;
pub use sampler::TimingSource;
pub use sampler::reconcile_server_time;
