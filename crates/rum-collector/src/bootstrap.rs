// crates/rum-collector/src/bootstrap.rs
// ============================================================================
// Module: Collector Bootstrap
// Description: Server-rendered configuration handed to the collector.
// Purpose: Define the JSON contract between the gateway and the collector.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The gateway renders a [`CollectorBootstrap`] into each tracked page. It
//! carries the collect endpoint, a short-lived collect token, and the
//! server-side timing context measured while rendering the page. A bootstrap
//! without a collect URL or token disables the collector.

use serde::Deserialize;
use serde::Serialize;

/// Default session storage key for the correlation id.
pub const DEFAULT_SESSION_KEY: &str = "rum_session_id";

/// Server-side context measured while rendering the page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerContext {
    /// Server generation time in seconds.
    pub time: f64,
    /// Peak server memory in bytes.
    pub memory_peak: u64,
    /// Country code from the edge geo header.
    pub country: String,
}

/// Collector bootstrap document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CollectorBootstrap {
    /// False when the page view is not eligible for tracking.
    pub enabled: bool,
    /// Absolute collect endpoint URL.
    pub collect_url: String,
    /// Collect token.
    pub token: String,
    /// Server timestamp (`YYYY-MM-DD HH:MM:SS`, UTC).
    pub timestamp: String,
    /// Server-side render context.
    pub server: ServerContext,
    /// Session storage key.
    pub session_key: String,
}

impl Default for CollectorBootstrap {
    fn default() -> Self {
        Self::disabled()
    }
}

impl CollectorBootstrap {
    /// Returns a bootstrap that disables collection.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            collect_url: String::new(),
            token: String::new(),
            timestamp: String::new(),
            server: ServerContext::default(),
            session_key: DEFAULT_SESSION_KEY.to_string(),
        }
    }

    /// Returns true when the collector should run.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.enabled && !self.collect_url.is_empty() && !self.token.is_empty()
    }

    /// Returns the session key, falling back to the default.
    #[must_use]
    pub fn session_key(&self) -> &str {
        if self.session_key.is_empty() { DEFAULT_SESSION_KEY } else { &self.session_key }
    }
}
