// crates/rum-server/src/gateway.rs
// ============================================================================
// Module: Ingest Gateway
// Description: HTTP handlers for beacon ingestion, reads, reports, and settings.
// Purpose: Validate, authorize, and route gateway requests to the runtime.
// Dependencies: axum, rum-collector, rum-core, serde, serde_json, tokio
// ============================================================================

//! ## Overview
//! The gateway is the only HTTP surface. Beacon ingestion is guarded by a
//! collect token and re-checks tracking eligibility before anything is
//! stored. Reads, report sends, and settings changes require privileged
//! access. Handlers are thin: each builds a [`RequestContext`] and calls a
//! synchronous [`GatewayState`] operation on a blocking-capable thread.
//!
//! Security posture: request bodies, query strings, and headers are
//! untrusted. Store failures surface as opaque 500 responses.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Instant;

use axum::Json;
use axum::body::Bytes;
use axum::extract::ConnectInfo;
use axum::extract::Query;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::http::header::WWW_AUTHENTICATE;
use axum::response::IntoResponse;
use axum::response::Response;
use rum_collector::CollectorBootstrap;
use rum_collector::DEFAULT_SESSION_KEY;
use rum_collector::ServerContext;
use rum_core::DEFAULT_PER_PAGE;
use rum_core::EventTime;
use rum_core::Identity;
use rum_core::LogFilter;
use rum_core::LogQuery;
use rum_core::LogStore;
use rum_core::MailOutcome;
use rum_core::NewRecord;
use rum_core::PageRequest;
use rum_core::RecordId;
use rum_core::ReportComposer;
use rum_core::Settings;
use rum_core::SettingsAccessor;
use rum_core::SettingsUpdate;
use rum_core::SortDirection;
use rum_core::SortKey;
use rum_core::TrackingPolicy;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

use crate::audit::AdminAuditEvent;
use crate::audit::AuditEvent;
use crate::audit::AuditSink;
use crate::audit::IngestAuditEvent;
use crate::audit::IngestOutcome;
use crate::audit::TaskAuditEvent;
use crate::auth::AdminAuthz;
use crate::auth::AuthContext;
use crate::auth::AuthError;
use crate::auth::CollectTokenIssuer;
use crate::auth::RequestContext;
use crate::maintenance::run_maintenance;
use crate::scheduler::ReportScheduler;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Failure message returned when a manual report cannot be sent.
pub const REPORT_FAILURE_MESSAGE: &str = "Check mail settings or recipient";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Gateway request errors.
///
/// # Invariants
/// - Messages never embed request payloads.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Collect token missing or invalid.
    #[error("invalid collect token")]
    Forbidden,
    /// Request body was empty.
    #[error("empty payload")]
    EmptyPayload,
    /// Request body was not a JSON object.
    #[error("invalid json")]
    InvalidJson,
    /// Privileged request without valid credentials.
    #[error("{0}")]
    Unauthenticated(String),
    /// Privileged request from a principal without an admin role.
    #[error("{0}")]
    Unauthorized(String),
    /// Log store failure.
    #[error("store failure: {0}")]
    Store(String),
    /// Settings or option store failure.
    #[error("settings failure: {0}")]
    Settings(String),
}

impl GatewayError {
    /// Returns the HTTP status for the error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Forbidden | Self::Unauthorized(_) => StatusCode::FORBIDDEN,
            Self::EmptyPayload | Self::InvalidJson => StatusCode::BAD_REQUEST,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Store(_) | Self::Settings(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the stable error code reported to callers.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Forbidden | Self::Unauthorized(_) => "forbidden",
            Self::EmptyPayload => "empty_payload",
            Self::InvalidJson => "invalid_json",
            Self::Unauthenticated(_) => "unauthenticated",
            Self::Store(_) | Self::Settings(_) => "store_failure",
        }
    }
}

impl From<AuthError> for GatewayError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthenticated(message) => Self::Unauthenticated(message),
            AuthError::Unauthorized(message) => Self::Unauthorized(message),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let body = StatusBody::error(self.code());
        let mut response = (self.status(), Json(body)).into_response();
        if matches!(self, Self::Unauthenticated(_)) {
            response.headers_mut().insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// Status response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBody {
    /// Status label.
    pub status: String,
    /// Error code for failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Human-readable message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatusBody {
    /// Plain status.
    #[must_use]
    pub fn status(status: &str) -> Self {
        Self {
            status: status.to_string(),
            code: None,
            message: None,
        }
    }

    /// Error status with a code.
    #[must_use]
    pub fn error(code: &str) -> Self {
        Self {
            status: "error".to_string(),
            code: Some(code.to_string()),
            message: None,
        }
    }
}

/// Collect query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct CollectParams {
    /// Collect token for beacon transports that cannot set headers.
    pub token: Option<String>,
}

/// Collector bootstrap query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct BootstrapParams {
    /// URL of the page being rendered.
    pub url: Option<String>,
    /// Generation time of the page being rendered, in seconds.
    pub server_time: Option<String>,
}

impl BootstrapParams {
    /// Returns the reported page generation time, clamped to be non-negative.
    /// Missing or non-finite values yield `None`.
    #[must_use]
    pub fn generation_time(&self) -> Option<f64> {
        self.server_time
            .as_deref()
            .and_then(|text| text.trim().parse::<f64>().ok())
            .filter(|value| value.is_finite())
            .map(|value| value.max(0.0))
    }
}

/// Log and stats query parameters. Values are parsed leniently.
#[derive(Debug, Default, Deserialize)]
pub struct LogParams {
    /// One-based page number.
    pub page: Option<String>,
    /// Page size.
    pub per_page: Option<String>,
    /// Sort direction.
    pub order: Option<String>,
    /// Sort column.
    pub order_by: Option<String>,
    /// Exact session id.
    pub session_id: Option<String>,
    /// URL substring.
    pub url: Option<String>,
    /// Exact device.
    pub device: Option<String>,
    /// Exact network type.
    pub net: Option<String>,
}

impl LogParams {
    /// Builds the row filter, dropping empty values.
    #[must_use]
    pub fn filter(&self) -> LogFilter {
        LogFilter {
            session_id: self.session_id.clone(),
            url_contains: self.url.clone(),
            device: self.device.clone(),
            net: self.net.clone(),
        }
        .normalized()
    }

    /// Builds the full log query with defaults and clamping applied.
    #[must_use]
    pub fn query(&self) -> LogQuery {
        let page = parse_count(self.page.as_deref()).unwrap_or(1);
        let per_page = parse_count(self.per_page.as_deref()).unwrap_or(DEFAULT_PER_PAGE);
        LogQuery {
            filter: self.filter(),
            page: PageRequest::new(page, per_page),
            sort: self.order_by.as_deref().map_or(SortKey::EventTime, SortKey::parse),
            direction: self.order.as_deref().map_or(SortDirection::Desc, SortDirection::parse),
        }
    }
}

/// Outcome of an accepted beacon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectOutcome {
    /// Beacon stored under the issued id.
    Stored(RecordId),
    /// Beacon excluded by tracking policy.
    Skipped,
}

// ============================================================================
// SECTION: Gateway State
// ============================================================================

/// Shared gateway state.
pub struct GatewayState {
    /// Record store.
    pub(crate) store: Arc<dyn LogStore>,
    /// Settings accessor.
    pub(crate) settings: SettingsAccessor,
    /// Tracking policy.
    pub(crate) policy: TrackingPolicy,
    /// Collect token issuer.
    pub(crate) tokens: CollectTokenIssuer,
    /// Privileged access policy.
    pub(crate) authz: AdminAuthz,
    /// Summary composer for manual sends.
    pub(crate) composer: ReportComposer,
    /// Report scheduler, reconciled after settings updates.
    pub(crate) scheduler: ReportScheduler,
    /// Audit sink.
    pub(crate) audit: Arc<dyn AuditSink>,
    /// Route namespace prefix.
    pub(crate) namespace: String,
    /// Public base URL for the collect endpoint.
    pub(crate) public_url: Option<String>,
    /// Geo header name; empty disables.
    pub(crate) geo_header: String,
    /// Run maintenance after every Nth stored beacon.
    pub(crate) maintenance_every: u64,
    /// Stored beacon counter for maintenance debounce.
    pub(crate) stored: AtomicU64,
}

impl GatewayState {
    /// Ingests one beacon.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] for token, payload, or storage failures.
    pub fn collect(
        &self,
        ctx: &RequestContext,
        body: &[u8],
        now: EventTime,
    ) -> Result<CollectOutcome, GatewayError> {
        if !self.tokens.verify(ctx.collect_token.as_deref(), now) {
            return Err(GatewayError::Forbidden);
        }
        let identity = self.authz.identity(ctx);
        let settings = self.current_settings()?;
        let parsed = parse_object(body);
        let url = parsed.as_ref().map(|payload| text_field(payload, "url")).unwrap_or_default();
        if !self.policy.should_track(&settings, &identity, &url) {
            return Ok(CollectOutcome::Skipped);
        }
        let payload = parsed?;
        let record = normalize_beacon(&payload, &identity, now);
        let id = self.store.insert(record).map_err(|err| GatewayError::Store(err.to_string()))?;
        self.maintain(&settings, now);
        Ok(CollectOutcome::Stored(id))
    }

    /// Builds the collector bootstrap for a page view.
    ///
    /// `generation_time` is the renderer-reported generation time of the
    /// page; without it the time spent serving this request is reported.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Settings`] when settings cannot be read.
    pub fn bootstrap(
        &self,
        ctx: &RequestContext,
        page_url: &str,
        generation_time: Option<f64>,
        started: Instant,
        now: EventTime,
    ) -> Result<CollectorBootstrap, GatewayError> {
        let settings = self.current_settings()?;
        let identity = self.authz.identity(ctx);
        if !self.policy.should_track(&settings, &identity, page_url) {
            return Ok(CollectorBootstrap::disabled());
        }
        Ok(CollectorBootstrap {
            enabled: true,
            collect_url: self.collect_url(ctx),
            token: self.tokens.issue(now),
            timestamp: now.to_string(),
            server: ServerContext {
                time: generation_time.unwrap_or_else(|| started.elapsed().as_secs_f64()),
                memory_peak: peak_memory_bytes(),
                country: ctx.country.clone(),
            },
            session_key: DEFAULT_SESSION_KEY.to_string(),
        })
    }

    /// Authorizes a privileged request and records the decision.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when access is denied.
    pub fn authorize(
        &self,
        ctx: &RequestContext,
        endpoint: &'static str,
    ) -> Result<AuthContext, GatewayError> {
        let peer_ip = ctx.peer_ip.map(|ip| ip.to_string());
        match self.authz.authorize_admin(ctx) {
            Ok(auth) => {
                self.audit.record(&AuditEvent::Admin(AdminAuditEvent::allowed(
                    endpoint,
                    auth.subject.clone(),
                    auth.token_fingerprint.clone(),
                    peer_ip,
                )));
                Ok(auth)
            }
            Err(err) => {
                self.audit.record(&AuditEvent::Admin(AdminAuditEvent::denied(
                    endpoint,
                    err.to_string(),
                    peer_ip,
                )));
                Err(err.into())
            }
        }
    }

    /// Applies a settings update and reconciles the report schedule.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when the body is invalid or settings cannot be saved.
    pub fn update_settings(&self, body: &[u8], now: EventTime) -> Result<Settings, GatewayError> {
        if body.is_empty() {
            return Err(GatewayError::EmptyPayload);
        }
        let update: SettingsUpdate =
            serde_json::from_slice(body).map_err(|_| GatewayError::InvalidJson)?;
        let saved = self
            .settings
            .update(update)
            .map_err(|err| GatewayError::Settings(err.to_string()))?;
        if let Err(err) = self.scheduler.reconcile(now) {
            self.audit.record(&AuditEvent::Task(TaskAuditEvent::scheduler_error(err.to_string())));
        }
        Ok(saved)
    }

    /// Returns current settings.
    fn current_settings(&self) -> Result<Settings, GatewayError> {
        self.settings.get().map_err(|err| GatewayError::Settings(err.to_string()))
    }

    /// Runs debounced retention maintenance; failures are audited only.
    fn maintain(&self, settings: &Settings, now: EventTime) {
        let seen = self.stored.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        if seen % self.maintenance_every.max(1) != 0 {
            return;
        }
        match run_maintenance(self.store.as_ref(), settings, now) {
            Ok(report) if report.is_empty() => {}
            Ok(report) => {
                self.audit.record(&AuditEvent::Task(TaskAuditEvent::maintenance(report)));
            }
            Err(err) => {
                self.audit
                    .record(&AuditEvent::Task(TaskAuditEvent::maintenance_error(err.to_string())));
            }
        }
    }

    /// Resolves the absolute collect endpoint URL.
    fn collect_url(&self, ctx: &RequestContext) -> String {
        let path = format!("{}/collect", self.namespace);
        if let Some(base) = &self.public_url {
            return format!("{}{path}", base.trim().trim_end_matches('/'));
        }
        ctx.host.as_ref().map_or(path.clone(), |host| format!("http://{host}{path}"))
    }
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Handles `POST /collect`.
pub(crate) async fn handle_collect(
    State(state): State<Arc<GatewayState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Query(params): Query<CollectParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let ctx = RequestContext::http(peer, &headers, params.token, &state.geo_header);
    let result = with_blocking(|| state.collect(&ctx, &body, EventTime::now()));
    let (outcome, status, code, response) = match result {
        Ok(CollectOutcome::Stored(_)) => (
            IngestOutcome::Stored,
            StatusCode::CREATED,
            None,
            (StatusCode::CREATED, Json(StatusBody::status("ok"))).into_response(),
        ),
        Ok(CollectOutcome::Skipped) => (
            IngestOutcome::Skipped,
            StatusCode::ACCEPTED,
            None,
            (StatusCode::ACCEPTED, Json(StatusBody::status("skipped"))).into_response(),
        ),
        Err(err) => {
            let outcome = if err.status().is_server_error() {
                IngestOutcome::Failed
            } else {
                IngestOutcome::Rejected
            };
            (outcome, err.status(), Some(err.code()), err.into_response())
        }
    };
    state.audit.record(&AuditEvent::Ingest(IngestAuditEvent::new(
        outcome,
        status.as_u16(),
        body.len(),
        ctx.peer_ip.map(|ip| ip.to_string()),
        code,
    )));
    response
}

/// Handles `GET /collector-config`.
pub(crate) async fn handle_collector_config(
    State(state): State<Arc<GatewayState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Query(params): Query<BootstrapParams>,
    headers: HeaderMap,
) -> Response {
    let started = Instant::now();
    let ctx = RequestContext::http(peer, &headers, None, &state.geo_header);
    let generation_time = params.generation_time();
    let page_url = params.url.unwrap_or_else(|| "/".to_string());
    let result = with_blocking(|| {
        state.bootstrap(&ctx, &page_url, generation_time, started, EventTime::now())
    });
    match result {
        Ok(bootstrap) => (StatusCode::OK, Json(bootstrap)).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Handles `GET /logs`.
pub(crate) async fn handle_logs(
    State(state): State<Arc<GatewayState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Query(params): Query<LogParams>,
    headers: HeaderMap,
) -> Response {
    let ctx = RequestContext::http(peer, &headers, None, &state.geo_header);
    let result = with_blocking(|| {
        state.authorize(&ctx, "logs")?;
        state.store.query_logs(&params.query()).map_err(|err| GatewayError::Store(err.to_string()))
    });
    match result {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Handles `GET /stats`.
pub(crate) async fn handle_stats(
    State(state): State<Arc<GatewayState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Query(params): Query<LogParams>,
    headers: HeaderMap,
) -> Response {
    let ctx = RequestContext::http(peer, &headers, None, &state.geo_header);
    let result = with_blocking(|| {
        state.authorize(&ctx, "stats")?;
        state.store.stats(&params.filter()).map_err(|err| GatewayError::Store(err.to_string()))
    });
    match result {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Handles `POST /send-report`.
pub(crate) async fn handle_send_report(
    State(state): State<Arc<GatewayState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Response {
    let ctx = RequestContext::http(peer, &headers, None, &state.geo_header);
    let result = with_blocking(|| {
        state.authorize(&ctx, "send_report")?;
        let settings = state.current_settings()?;
        Ok::<_, GatewayError>(state.composer.send_summary(&settings))
    });
    let detail = match result {
        Err(err) => return err.into_response(),
        Ok(Ok(MailOutcome::Sent)) => None,
        Ok(Ok(MailOutcome::Failed(err))) => Some(err.to_string()),
        Ok(Err(err)) => Some(err.to_string()),
    };
    let sent = detail.is_none();
    state.audit.record(&AuditEvent::Task(TaskAuditEvent::report(sent, detail)));
    if sent {
        (StatusCode::OK, Json(StatusBody::status("sent"))).into_response()
    } else {
        let body = StatusBody {
            status: "failed".to_string(),
            code: None,
            message: Some(REPORT_FAILURE_MESSAGE.to_string()),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

/// Handles `GET /settings`.
pub(crate) async fn handle_get_settings(
    State(state): State<Arc<GatewayState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Response {
    let ctx = RequestContext::http(peer, &headers, None, &state.geo_header);
    let result = with_blocking(|| {
        state.authorize(&ctx, "settings")?;
        state.current_settings()
    });
    match result {
        Ok(settings) => (StatusCode::OK, Json(settings)).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Handles `POST /settings`.
pub(crate) async fn handle_update_settings(
    State(state): State<Arc<GatewayState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let ctx = RequestContext::http(peer, &headers, None, &state.geo_header);
    let result = with_blocking(|| {
        state.authorize(&ctx, "settings_update")?;
        state.update_settings(&body, EventTime::now())
    });
    match result {
        Ok(settings) => (StatusCode::OK, Json(settings)).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Handles `GET /health`.
pub(crate) async fn handle_health(State(state): State<Arc<GatewayState>>) -> Response {
    match with_blocking(|| state.store.readiness()) {
        Ok(()) => (StatusCode::OK, Json(StatusBody::status("ok"))).into_response(),
        Err(_) => {
            (StatusCode::SERVICE_UNAVAILABLE, Json(StatusBody::status("unavailable")))
                .into_response()
        }
    }
}

// ============================================================================
// SECTION: Beacon Normalization
// ============================================================================

/// Parses a request body as a JSON object.
fn parse_object(body: &[u8]) -> Result<Map<String, Value>, GatewayError> {
    if body.is_empty() {
        return Err(GatewayError::EmptyPayload);
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(GatewayError::InvalidJson),
    }
}

/// Converts a beacon object into an insertable record.
///
/// Numbers and numeric strings are coerced; missing or non-scalar values
/// default to zero or empty. Any client-supplied role is ignored and the
/// role is stamped from the request identity.
#[must_use]
pub fn normalize_beacon(
    payload: &Map<String, Value>,
    identity: &Identity,
    now: EventTime,
) -> NewRecord {
    let event_time = EventTime::parse(&text_field(payload, "event_time")).unwrap_or(now);
    NewRecord {
        server_time: number_field(payload, "server_time"),
        ttfb: number_field(payload, "ttfb"),
        lcp: number_field(payload, "lcp"),
        total_load: number_field(payload, "total_load"),
        memory_peak: count_field(payload, "memory_peak"),
        device: text_field(payload, "device"),
        net: text_field(payload, "net"),
        country: text_field(payload, "country"),
        session_id: text_field(payload, "session_id"),
        user_role: identity.primary_role().to_string(),
        ..NewRecord::new(event_time, text_field(payload, "url"))
    }
}

/// Reads a string field; numbers are rendered, anything else is empty.
fn text_field(payload: &Map<String, Value>, key: &str) -> String {
    match payload.get(key) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        _ => String::new(),
    }
}

/// Reads a float field from a number or numeric string.
fn number_field(payload: &Map<String, Value>, key: &str) -> f64 {
    match payload.get(key) {
        Some(Value::Number(number)) => number.as_f64().unwrap_or(0.0),
        Some(Value::String(text)) => text.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Reads a non-negative integer field from a number or numeric string.
fn count_field(payload: &Map<String, Value>, key: &str) -> u64 {
    match payload.get(key) {
        Some(Value::Number(number)) => number.as_u64().unwrap_or(0),
        Some(Value::String(text)) => text.trim().parse::<u64>().unwrap_or(0),
        _ => 0,
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Runs blocking store work, shifting off the async worker when possible.
pub(crate) fn with_blocking<T>(work: impl FnOnce() -> T) -> T {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == tokio::runtime::RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(work)
        }
        _ => work(),
    }
}

/// Parses an optional integer query value as its absolute value.
fn parse_count(value: Option<&str>) -> Option<u32> {
    value
        .and_then(|text| text.trim().parse::<i64>().ok())
        .map(|number| u32::try_from(number.unsigned_abs()).unwrap_or(u32::MAX))
}

/// Returns the process peak resident set size in bytes, or zero when unknown.
fn peak_memory_bytes() -> u64 {
    fs::read_to_string("/proc/self/status")
        .ok()
        .and_then(|status| {
            status.lines().find_map(|line| {
                line.strip_prefix("VmHWM:")
                    .and_then(|rest| rest.trim().trim_end_matches("kB").trim().parse::<u64>().ok())
            })
        })
        .map_or(0, |kib| kib.saturating_mul(1024))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
