// crates/rum-collector/src/sampler.rs
// ============================================================================
// Module: Metric Sampler
// Description: Computes the beacon payload from page timing capabilities.
// Purpose: Measure LCP, TTFB, load time, and detect stale server timing.
// Dependencies: regex, serde, thiserror, crate::bootstrap
// ============================================================================

//! ## Overview
//! [`MetricSampler`] assembles a [`BeaconPayload`] just before the page is
//! hidden. Timing values come from a [`PageEnvironment`], which the host
//! binds to the browser's performance, navigator, and location APIs.
//!
//! Server generation time is carried in the page from render time. When the
//! page is served from an HTML cache that value is stale, so it is zeroed if
//! it exceeds the observed document fetch time plus [`STALE_TOLERANCE_SECS`].
//!
//! Missing capabilities degrade to zero or empty values; the sampler never
//! fails at runtime.

// ============================================================================
// SECTION: Imports
// ============================================================================

use regex::Regex;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::bootstrap::CollectorBootstrap;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Tolerance added to the document fetch time before server time is stale.
pub const STALE_TOLERANCE_SECS: f64 = 0.05;
/// Case-insensitive user-agent pattern for mobile devices.
const MOBILE_UA_PATTERN: &str = "(?i)Mobi|Android";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Collector construction errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CollectorError {
    /// Device pattern failed to compile.
    #[error("collector device pattern error: {0}")]
    Pattern(String),
}

// ============================================================================
// SECTION: Largest Contentful Paint
// ============================================================================

/// One largest-contentful-paint observation, in milliseconds since navigation.
///
/// Zero means the browser did not report that field.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LcpEntry {
    /// Render time of the element.
    pub render_time: f64,
    /// Load time of the element resource.
    pub load_time: f64,
    /// Entry start time.
    pub start_time: f64,
}

impl LcpEntry {
    /// Returns the best available timestamp in milliseconds.
    #[must_use]
    pub fn best_time_ms(&self) -> f64 {
        [self.render_time, self.load_time, self.start_time]
            .into_iter()
            .find(|value| value.is_finite() && *value > 0.0)
            .unwrap_or(0.0)
    }
}

/// Tracks LCP observations, retaining only the latest entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LcpTracker {
    /// False when the observation API is unavailable.
    supported: bool,
    /// Last observed entry.
    last: Option<LcpEntry>,
}

impl LcpTracker {
    /// Creates a tracker; `supported` reflects observer availability.
    #[must_use]
    pub const fn new(supported: bool) -> Self {
        Self {
            supported,
            last: None,
        }
    }

    /// Records a batch of entries delivered by the observer.
    pub fn observe(&mut self, entries: impl IntoIterator<Item = LcpEntry>) {
        if !self.supported {
            return;
        }
        if let Some(last) = entries.into_iter().last() {
            self.last = Some(last);
        }
    }

    /// Returns LCP in seconds, or `0.0` when unsupported or unobserved.
    #[must_use]
    pub fn lcp_seconds(&self) -> f64 {
        self.last.map_or(0.0, |entry| entry.best_time_ms() / 1000.0)
    }
}

// ============================================================================
// SECTION: Navigation Timing
// ============================================================================

/// Navigation-timing record fields, milliseconds relative to navigation start.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NavigationTiming {
    /// Request start.
    pub request_start: f64,
    /// First response byte.
    pub response_start: f64,
    /// Last response byte.
    pub response_end: f64,
    /// Load event completion; zero while the load event is pending.
    pub load_event_end: f64,
}

/// Legacy timing object fields, absolute epoch milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LegacyTiming {
    /// Request start.
    pub request_start: f64,
    /// First response byte.
    pub response_start: f64,
    /// Load event completion.
    pub load_event_end: f64,
}

/// Available navigation timing source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimingSource {
    /// Modern navigation-timing record.
    Navigation(NavigationTiming),
    /// Legacy timing object.
    Legacy(LegacyTiming),
    /// No timing API.
    Unavailable,
}

/// Derived navigation metrics in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NavigationMetrics {
    /// Time to first byte.
    pub ttfb: f64,
    /// Total load time.
    pub total_load: f64,
    /// Document fetch time, only known from the navigation record.
    pub doc_duration: Option<f64>,
}

impl NavigationMetrics {
    /// Derives metrics from a timing source.
    #[must_use]
    pub fn from_source(source: TimingSource) -> Self {
        match source {
            TimingSource::Navigation(timing) => Self {
                ttfb: span_seconds(timing.request_start, timing.response_start),
                total_load: span_seconds(timing.request_start, timing.load_event_end),
                doc_duration: Some(span_seconds(timing.request_start, timing.response_end)),
            },
            TimingSource::Legacy(timing) => Self {
                ttfb: span_seconds(timing.request_start, timing.response_start),
                total_load: span_seconds(timing.request_start, timing.load_event_end),
                doc_duration: None,
            },
            TimingSource::Unavailable => Self::default(),
        }
    }
}

/// Converts a millisecond span to seconds, clamping negatives to zero.
fn span_seconds(start_ms: f64, end_ms: f64) -> f64 {
    let seconds = (end_ms - start_ms) / 1000.0;
    if seconds.is_finite() && seconds > 0.0 { seconds } else { 0.0 }
}

/// Zeroes server time that could not have been produced for this request.
///
/// Without a document duration the value is kept.
#[must_use]
pub fn reconcile_server_time(server_time: f64, doc_duration: Option<f64>) -> f64 {
    if !server_time.is_finite() || server_time < 0.0 {
        return 0.0;
    }
    match doc_duration {
        Some(duration) if server_time > duration + STALE_TOLERANCE_SECS => 0.0,
        _ => server_time,
    }
}

// ============================================================================
// SECTION: Device and Network
// ============================================================================

/// Coarse device class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    /// Phone or tablet.
    Mobile,
    /// Everything else.
    Desktop,
}

impl DeviceClass {
    /// Returns the wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mobile => "mobile",
            Self::Desktop => "desktop",
        }
    }
}

/// User-agent based device classifier.
#[derive(Debug, Clone)]
pub struct DeviceClassifier {
    /// Compiled mobile pattern.
    mobile: Regex,
}

impl DeviceClassifier {
    /// Compiles the classifier.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError::Pattern`] if the pattern fails to compile.
    pub fn new() -> Result<Self, CollectorError> {
        let mobile =
            Regex::new(MOBILE_UA_PATTERN).map_err(|err| CollectorError::Pattern(err.to_string()))?;
        Ok(Self {
            mobile,
        })
    }

    /// Classifies a user-agent string.
    #[must_use]
    pub fn classify(&self, user_agent: &str) -> DeviceClass {
        if self.mobile.is_match(user_agent) { DeviceClass::Mobile } else { DeviceClass::Desktop }
    }
}

/// Network information capability.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionInfo {
    /// Effective connection type (`4g`, `3g`, `2g`, `slow-2g`).
    pub effective_type: Option<String>,
    /// Reduced-data mode requested by the viewer.
    pub save_data: bool,
}

// ============================================================================
// SECTION: Page Environment
// ============================================================================

/// Browser capabilities the sampler reads from.
pub trait PageEnvironment {
    /// Current page URL.
    fn page_url(&self) -> String;
    /// Navigator user agent.
    fn user_agent(&self) -> String;
    /// Network information, if the API exists.
    fn connection(&self) -> Option<ConnectionInfo>;
    /// Navigation timing source.
    fn timing(&self) -> TimingSource;
}

// ============================================================================
// SECTION: Payload
// ============================================================================

/// JSON beacon body posted to the collect endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeaconPayload {
    /// Server timestamp from the bootstrap.
    pub event_time: String,
    /// Full page URL.
    pub url: String,
    /// Reconciled server generation time.
    pub server_time: f64,
    /// Time to first byte.
    pub ttfb: f64,
    /// Largest contentful paint.
    pub lcp: f64,
    /// Total load time.
    pub total_load: f64,
    /// Peak server memory from the bootstrap.
    pub memory_peak: u64,
    /// Device class label.
    pub device: String,
    /// Effective connection type.
    pub net: String,
    /// Country code from the bootstrap.
    pub country: String,
    /// Session correlation id.
    pub session_id: String,
}

/// Builds beacon payloads for one page.
#[derive(Debug, Clone)]
pub struct MetricSampler {
    /// Server-rendered bootstrap.
    bootstrap: CollectorBootstrap,
    /// LCP observations.
    lcp: LcpTracker,
    /// Device classifier.
    classifier: DeviceClassifier,
}

impl MetricSampler {
    /// Creates a sampler for the page.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError`] if the device classifier cannot be built.
    pub fn new(bootstrap: CollectorBootstrap, lcp: LcpTracker) -> Result<Self, CollectorError> {
        Ok(Self {
            bootstrap,
            lcp,
            classifier: DeviceClassifier::new()?,
        })
    }

    /// Returns the page bootstrap.
    #[must_use]
    pub const fn bootstrap(&self) -> &CollectorBootstrap {
        &self.bootstrap
    }

    /// Returns the LCP tracker for observer callbacks.
    pub const fn lcp_mut(&mut self) -> &mut LcpTracker {
        &mut self.lcp
    }

    /// Builds the payload, or `None` when the viewer requested reduced data.
    #[must_use]
    pub fn sample(&self, env: &dyn PageEnvironment, session_id: &str) -> Option<BeaconPayload> {
        let connection = env.connection();
        if connection.as_ref().is_some_and(|info| info.save_data) {
            return None;
        }
        let metrics = NavigationMetrics::from_source(env.timing());
        let server = &self.bootstrap.server;
        Some(BeaconPayload {
            event_time: self.bootstrap.timestamp.clone(),
            url: env.page_url(),
            server_time: reconcile_server_time(server.time, metrics.doc_duration),
            ttfb: metrics.ttfb,
            lcp: self.lcp.lcp_seconds(),
            total_load: metrics.total_load,
            memory_peak: server.memory_peak,
            device: self.classifier.classify(&env.user_agent()).as_str().to_string(),
            net: connection.and_then(|info| info.effective_type).unwrap_or_default(),
            country: server.country.clone(),
            session_id: session_id.to_string(),
        })
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::float_cmp, reason = "Test-only assertions.")]

    use super::*;

    #[test]
    fn stale_server_time_is_zeroed() {
        assert_eq!(reconcile_server_time(1.2, Some(1.0)), 0.0);
        assert_eq!(reconcile_server_time(0.9, Some(1.0)), 0.9);
        assert_eq!(reconcile_server_time(1.04, Some(1.0)), 1.04);
        assert_eq!(reconcile_server_time(1.2, None), 1.2);
    }

    #[test]
    fn lcp_keeps_last_entry_and_prefers_render_time() {
        let mut tracker = LcpTracker::new(true);
        tracker.observe([LcpEntry {
            render_time: 800.0,
            ..LcpEntry::default()
        }]);
        tracker.observe([
            LcpEntry {
                render_time: 1200.0,
                load_time: 900.0,
                start_time: 100.0,
            },
            LcpEntry {
                render_time: 0.0,
                load_time: 1500.0,
                start_time: 100.0,
            },
        ]);
        assert_eq!(tracker.lcp_seconds(), 1.5);
    }

    #[test]
    fn unsupported_lcp_reports_zero() {
        let mut tracker = LcpTracker::new(false);
        tracker.observe([LcpEntry {
            start_time: 500.0,
            ..LcpEntry::default()
        }]);
        assert_eq!(tracker.lcp_seconds(), 0.0);
    }

    #[test]
    fn navigation_metrics_use_request_start() {
        let metrics = NavigationMetrics::from_source(TimingSource::Navigation(NavigationTiming {
            request_start: 100.0,
            response_start: 350.0,
            response_end: 600.0,
            load_event_end: 2100.0,
        }));
        assert_eq!(metrics.ttfb, 0.25);
        assert_eq!(metrics.total_load, 2.0);
        assert_eq!(metrics.doc_duration, Some(0.5));
    }

    #[test]
    fn pending_load_event_reports_zero() {
        let metrics = NavigationMetrics::from_source(TimingSource::Navigation(NavigationTiming {
            request_start: 100.0,
            response_start: 200.0,
            response_end: 300.0,
            load_event_end: 0.0,
        }));
        assert_eq!(metrics.total_load, 0.0);
    }

    #[test]
    fn device_classification_is_case_insensitive() {
        let classifier = DeviceClassifier::new().unwrap();
        assert_eq!(
            classifier.classify("Mozilla/5.0 (Linux; android 14) MOBILE Safari"),
            DeviceClass::Mobile
        );
        assert_eq!(
            classifier.classify("Mozilla/5.0 (Windows NT 10.0; Win64; x64)"),
            DeviceClass::Desktop
        );
    }
}
