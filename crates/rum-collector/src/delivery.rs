// crates/rum-collector/src/delivery.rs
// ============================================================================
// Module: Delivery Agent
// Description: Session correlation and fire-and-forget beacon delivery.
// Purpose: Send at most one payload per page when the page becomes hidden.
// Dependencies: rand, serde_json, thiserror, url, uuid, crate::sampler
// ============================================================================

//! ## Overview
//! [`DeliveryAgent`] waits for the page to become hidden, samples metrics
//! once, and hands the payload to the transport. A keepalive request carries
//! the collect token in [`NONCE_HEADER`]; when keepalive requests are not
//! available the beacon fallback appends the token as the
//! [`TOKEN_QUERY_PARAM`] query parameter because beacons cannot set headers.
//!
//! Transport errors are swallowed. There is no retry.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use rand::RngCore;
use thiserror::Error;
use url::Url;

use crate::sampler::MetricSampler;
use crate::sampler::PageEnvironment;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Header carrying the collect token on keepalive requests.
pub const NONCE_HEADER: &str = "X-Custom-Nonce";
/// Query parameter carrying the collect token on beacon requests.
pub const TOKEN_QUERY_PARAM: &str = "token";
/// Prefix of fallback session identifiers.
const FALLBACK_ID_PREFIX: &str = "rum-";

// ============================================================================
// SECTION: Session Identity
// ============================================================================

/// Session storage is blocked or unavailable.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("session storage unavailable")]
pub struct StorageUnavailable;

/// Session-scoped key-value storage.
pub trait SessionStorage {
    /// Reads a value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageUnavailable`] when storage access is denied.
    fn get(&self, key: &str) -> Result<Option<String>, StorageUnavailable>;

    /// Writes a value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageUnavailable`] when storage access is denied.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageUnavailable>;
}

/// Source of fresh session identifiers.
pub trait IdSource {
    /// Returns a random v4 UUID when a secure generator is available.
    fn secure_uuid(&self) -> Option<String>;
    /// Returns random hex digits.
    fn random_hex(&self) -> String;
    /// Returns the current time in unix milliseconds.
    fn now_millis(&self) -> u128;

    /// Generates a session identifier.
    fn generate(&self) -> String {
        self.secure_uuid().unwrap_or_else(|| {
            format!("{FALLBACK_ID_PREFIX}{}-{}", self.random_hex(), self.now_millis())
        })
    }
}

/// Default identifier source backed by `uuid` and the thread RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIdSource;

impl IdSource for RandomIdSource {
    fn secure_uuid(&self) -> Option<String> {
        Some(uuid::Uuid::new_v4().to_string())
    }

    fn random_hex(&self) -> String {
        format!("{:x}", rand::thread_rng().next_u64())
    }

    fn now_millis(&self) -> u128 {
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
    }
}

/// Reads the session id from storage, creating and persisting one if absent.
///
/// When storage fails the returned id is ephemeral and not persisted.
pub fn resolve_session_id(storage: &dyn SessionStorage, key: &str, ids: &dyn IdSource) -> String {
    match storage.get(key) {
        Ok(Some(existing)) if !existing.is_empty() => existing,
        Ok(_) => {
            let fresh = ids.generate();
            match storage.set(key, &fresh) {
                Ok(()) => storage.get(key).ok().flatten().unwrap_or(fresh),
                Err(StorageUnavailable) => fresh,
            }
        }
        Err(StorageUnavailable) => ids.generate(),
    }
}

// ============================================================================
// SECTION: Transport
// ============================================================================

/// Transport used for a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Keepalive, low-priority request with custom headers.
    Keepalive,
    /// Beacon request without custom headers.
    Beacon,
}

/// Fully-prepared outbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    /// Transport kind.
    pub kind: TransportKind,
    /// Target URL.
    pub url: String,
    /// Extra request headers.
    pub headers: Vec<(String, String)>,
    /// JSON body.
    pub body: String,
    /// Request should be sent at low priority.
    pub low_priority: bool,
}

/// Transport failure; never surfaced to the page.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("beacon transport error: {0}")]
pub struct TransportError(pub String);

/// Browser delivery capabilities.
pub trait BeaconTransport {
    /// Returns true when keepalive requests are available.
    fn supports_keepalive(&self) -> bool;
    /// Returns true when the beacon API is available.
    fn supports_beacon(&self) -> bool;

    /// Sends a prepared request.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the request cannot be queued.
    fn send(&self, request: &OutboundRequest) -> Result<(), TransportError>;
}

// ============================================================================
// SECTION: Agent
// ============================================================================

/// Page visibility state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Page is visible.
    Visible,
    /// Page is hidden (tab switch, navigation, close).
    Hidden,
}

/// Result of a visibility event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Collector is disabled or the page is still visible.
    Ignored,
    /// A payload was already handed off for this page.
    AlreadySent,
    /// Viewer requested reduced data; nothing sent.
    SaveData,
    /// No transport is available.
    NoTransport,
    /// Payload handed to the transport.
    Sent(TransportKind),
    /// Transport rejected the payload; no retry.
    Failed(TransportKind),
}

/// One-shot beacon delivery for a page.
#[derive(Debug)]
pub struct DeliveryAgent {
    /// Metric sampler for the page.
    sampler: MetricSampler,
    /// Session correlation id.
    session_id: String,
    /// Set once a payload has been handed off or declined.
    finished: bool,
}

impl DeliveryAgent {
    /// Creates an agent, resolving the session id up front.
    #[must_use]
    pub fn new(sampler: MetricSampler, storage: &dyn SessionStorage, ids: &dyn IdSource) -> Self {
        let key = sampler.bootstrap().session_key().to_string();
        Self {
            sampler,
            session_id: resolve_session_id(storage, &key, ids),
            finished: false,
        }
    }

    /// Returns the session id in use.
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Returns the sampler for LCP observer callbacks.
    pub const fn sampler_mut(&mut self) -> &mut MetricSampler {
        &mut self.sampler
    }

    /// Handles a visibility change, sending the payload on the first hide.
    pub fn on_visibility_change(
        &mut self,
        state: Visibility,
        env: &dyn PageEnvironment,
        transport: &dyn BeaconTransport,
    ) -> DeliveryOutcome {
        if state != Visibility::Hidden || !self.sampler.bootstrap().is_active() {
            return DeliveryOutcome::Ignored;
        }
        if self.finished {
            return DeliveryOutcome::AlreadySent;
        }
        self.finished = true;
        let Some(payload) = self.sampler.sample(env, &self.session_id) else {
            return DeliveryOutcome::SaveData;
        };
        let Ok(body) = serde_json::to_string(&payload) else {
            return DeliveryOutcome::Failed(TransportKind::Keepalive);
        };
        let Some(request) = self.prepare(transport, body) else {
            return DeliveryOutcome::NoTransport;
        };
        let kind = request.kind;
        match transport.send(&request) {
            Ok(()) => DeliveryOutcome::Sent(kind),
            Err(_) => DeliveryOutcome::Failed(kind),
        }
    }

    /// Builds the request for the best available transport.
    fn prepare(&self, transport: &dyn BeaconTransport, body: String) -> Option<OutboundRequest> {
        let bootstrap = self.sampler.bootstrap();
        if transport.supports_keepalive() {
            return Some(OutboundRequest {
                kind: TransportKind::Keepalive,
                url: bootstrap.collect_url.clone(),
                headers: vec![
                    ("Content-Type".to_string(), "application/json".to_string()),
                    (NONCE_HEADER.to_string(), bootstrap.token.clone()),
                ],
                body,
                low_priority: true,
            });
        }
        if transport.supports_beacon() {
            return Some(OutboundRequest {
                kind: TransportKind::Beacon,
                url: with_token_param(&bootstrap.collect_url, &bootstrap.token),
                headers: Vec::new(),
                body,
                low_priority: false,
            });
        }
        None
    }
}

/// Appends the token query parameter, replacing any existing value.
fn with_token_param(collect_url: &str, token: &str) -> String {
    match Url::parse(collect_url) {
        Ok(mut url) => {
            let retained: Vec<(String, String)> = url
                .query_pairs()
                .filter(|(name, _)| name != TOKEN_QUERY_PARAM)
                .map(|(name, value)| (name.into_owned(), value.into_owned()))
                .collect();
            url.query_pairs_mut().clear().extend_pairs(retained).append_pair(TOKEN_QUERY_PARAM, token);
            url.to_string()
        }
        Err(_) => {
            let separator = if collect_url.contains('?') { '&' } else { '?' };
            format!("{collect_url}{separator}{TOKEN_QUERY_PARAM}={token}")
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_param_is_appended_once() {
        assert_eq!(
            with_token_param("https://s.test/rum/v1/collect?token=old&x=1", "abc"),
            "https://s.test/rum/v1/collect?x=1&token=abc"
        );
        assert_eq!(
            with_token_param("https://s.test/rum/v1/collect", "abc"),
            "https://s.test/rum/v1/collect?token=abc"
        );
    }

    #[test]
    fn fallback_ids_carry_prefix_and_time() {
        /// Identifier source without a secure generator.
        struct NoCrypto;
        impl IdSource for NoCrypto {
            fn secure_uuid(&self) -> Option<String> {
                None
            }

            fn random_hex(&self) -> String {
                "beef".to_string()
            }

            fn now_millis(&self) -> u128 {
                42
            }
        }
        assert_eq!(NoCrypto.generate(), "rum-beef-42");
    }
}
