// crates/rum-server/src/auth.rs
// ============================================================================
// Module: Gateway Authn/Authz
// Description: Collect tokens, bearer principals, and privileged access checks.
// Purpose: Provide strict, fail-closed auth decisions for gateway requests.
// Dependencies: rum-config, rum-core, hmac, sha2, subtle, rand
// ============================================================================

//! ## Overview
//! Two mechanisms guard the gateway. Beacon ingestion is authenticated with
//! a short-lived collect token: an HMAC over a coarse time tick, valid for
//! the current and previous tick and independent of any login. Privileged
//! read and admin endpoints use either loopback-only access or bearer token
//! principals with an administrator role. Token comparisons are constant
//! time and decisions are fail-closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::IpAddr;
use std::net::SocketAddr;

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::header::HOST;
use hmac::Hmac;
use hmac::Mac;
use rand::Rng;
use rum_collector::NONCE_HEADER;
use rum_config::CollectConfig;
use rum_config::ServerAuthConfig;
use rum_config::ServerAuthMode;
use rum_core::EventTime;
use rum_core::Identity;
use rum_core::sanitize_text;
use sha2::Digest;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum accepted authorization header size.
const MAX_AUTH_HEADER_BYTES: usize = 8 * 1024;
/// Action label bound into every collect token.
const COLLECT_ACTION: &str = "rum_collect";
/// Hex characters kept from the collect token MAC.
pub const COLLECT_TOKEN_LENGTH: usize = 20;
/// Generated secret length when none is configured.
const GENERATED_SECRET_BYTES: usize = 32;
/// Maximum country code length taken from the geo header.
const MAX_COUNTRY_CHARS: usize = 3;
/// Maximum accepted host header length.
const MAX_HOST_BYTES: usize = 255;

/// HMAC-SHA256 keyed hash.
type HmacSha256 = Hmac<Sha256>;

// ============================================================================
// SECTION: Request Context
// ============================================================================

/// Per-request context used for auth and tracking decisions.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Peer IP address when available.
    pub peer_ip: Option<IpAddr>,
    /// Authorization header value.
    pub auth_header: Option<String>,
    /// Collect token from the nonce header or the `token` query parameter.
    pub collect_token: Option<String>,
    /// Host header, when it looks like a host name.
    pub host: Option<String>,
    /// Country code from the configured geo header.
    pub country: String,
}

impl RequestContext {
    /// Builds a context from HTTP request parts.
    ///
    /// The nonce header wins over the query token when both are present.
    #[must_use]
    pub fn http(
        peer: SocketAddr,
        headers: &HeaderMap,
        query_token: Option<String>,
        geo_header: &str,
    ) -> Self {
        let header_text = |name: &str| {
            headers.get(name).and_then(|value| value.to_str().ok()).map(str::to_string)
        };
        let collect_token = header_text(NONCE_HEADER)
            .or(query_token)
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty());
        let auth_header =
            headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok()).map(str::to_string);
        let host = headers
            .get(HOST)
            .and_then(|value| value.to_str().ok())
            .filter(|value| is_host_like(value))
            .map(str::to_string);
        let country = if geo_header.is_empty() {
            String::new()
        } else {
            header_text(geo_header)
                .map(|value| sanitize_text(&value, MAX_COUNTRY_CHARS).to_ascii_uppercase())
                .unwrap_or_default()
        };
        Self {
            peer_ip: Some(peer.ip()),
            auth_header,
            collect_token,
            host,
            country,
        }
    }

    /// Returns true when the peer IP is loopback.
    #[must_use]
    pub fn peer_is_loopback(&self) -> bool {
        self.peer_ip.is_some_and(|ip| ip.is_loopback())
    }
}

/// Returns true when the value only holds host-name characters.
fn is_host_like(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= MAX_HOST_BYTES
        && value.bytes().all(|byte| {
            byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'-' | b':' | b'[' | b']')
        })
}

// ============================================================================
// SECTION: Collect Tokens
// ============================================================================

/// Issues and verifies collect tokens.
///
/// # Invariants
/// - A token verifies for the tick it was issued in and the following tick.
/// - The secret never leaves this type.
#[derive(Clone)]
pub struct CollectTokenIssuer {
    /// MAC key.
    secret: Vec<u8>,
    /// Tick width in seconds (half the configured lifetime).
    tick_secs: u64,
}

impl CollectTokenIssuer {
    /// Creates an issuer with an explicit secret and token lifetime.
    #[must_use]
    pub fn new(secret: impl Into<Vec<u8>>, token_ttl_secs: u64) -> Self {
        Self {
            secret: secret.into(),
            tick_secs: (token_ttl_secs / 2).max(1),
        }
    }

    /// Builds an issuer from configuration, generating a per-process secret
    /// when none is configured.
    #[must_use]
    pub fn from_config(config: &CollectConfig) -> Self {
        let secret = config.secret.as_ref().map_or_else(
            || {
                let mut bytes = [0u8; GENERATED_SECRET_BYTES];
                rand::thread_rng().fill(&mut bytes);
                bytes.to_vec()
            },
            |secret| secret.trim().as_bytes().to_vec(),
        );
        Self::new(secret, config.token_ttl_secs)
    }

    /// Issues a token for the tick containing `now`.
    #[must_use]
    pub fn issue(&self, now: EventTime) -> String {
        self.token_for_tick(self.tick(now))
    }

    /// Verifies a token against the current and previous tick.
    #[must_use]
    pub fn verify(&self, token: Option<&str>, now: EventTime) -> bool {
        let Some(token) = token else {
            return false;
        };
        if token.len() != COLLECT_TOKEN_LENGTH {
            return false;
        }
        let tick = self.tick(now);
        let current = self.token_for_tick(tick);
        let previous = self.token_for_tick(tick.saturating_sub(1));
        let current_ok: bool = current.as_bytes().ct_eq(token.as_bytes()).into();
        let previous_ok: bool = previous.as_bytes().ct_eq(token.as_bytes()).into();
        current_ok | previous_ok
    }

    /// Returns the tick number for `now`.
    fn tick(&self, now: EventTime) -> u64 {
        let seconds = u64::try_from(now.unix_seconds()).unwrap_or(0);
        seconds.div_ceil(self.tick_secs)
    }

    /// Computes the truncated hex MAC for a tick.
    fn token_for_tick(&self, tick: u64) -> String {
        let Ok(mut mac) = HmacSha256::new_from_slice(&self.secret) else {
            return String::new();
        };
        mac.update(COLLECT_ACTION.as_bytes());
        mac.update(b"|");
        mac.update(tick.to_string().as_bytes());
        let digest = mac.finalize().into_bytes();
        let mut hex = hex_encode(&digest);
        hex.truncate(COLLECT_TOKEN_LENGTH);
        hex
    }
}

// ============================================================================
// SECTION: Admin Access
// ============================================================================

/// Authenticated caller context for privileged endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    /// Authentication method.
    pub method: AuthMethod,
    /// Subject label.
    pub subject: String,
    /// Bearer token fingerprint (sha256 hex) for audit logs.
    pub token_fingerprint: Option<String>,
}

/// Authentication method used for the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    /// Loopback access in local-only mode.
    Local,
    /// Bearer token principal.
    BearerToken,
}

/// Authentication or authorization errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Missing or invalid authentication.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),
    /// Caller is authenticated but not authorized.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
}

/// Configured bearer principal.
#[derive(Debug, Clone)]
struct Principal {
    /// Bearer token.
    token: String,
    /// Subject label.
    subject: String,
    /// Granted roles.
    roles: Vec<String>,
}

/// Privileged access policy derived from server configuration.
#[derive(Debug, Clone)]
pub struct AdminAuthz {
    /// Auth mode.
    mode: ServerAuthMode,
    /// Roles that grant privileged access.
    admin_roles: Vec<String>,
    /// Bearer principals.
    principals: Vec<Principal>,
}

impl AdminAuthz {
    /// Builds the policy from server auth configuration.
    #[must_use]
    pub fn from_config(config: Option<&ServerAuthConfig>) -> Self {
        let mode = config.map_or(ServerAuthMode::LocalOnly, |cfg| cfg.mode);
        let admin_roles = config
            .map_or_else(|| vec!["administrator".to_string()], |cfg| cfg.admin_roles.clone());
        let principals = config
            .map(|cfg| {
                cfg.principals
                    .iter()
                    .map(|principal| Principal {
                        token: principal.token.clone(),
                        subject: principal.subject.clone(),
                        roles: principal.roles.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self {
            mode,
            admin_roles,
            principals,
        }
    }

    /// Returns the configured auth mode.
    #[must_use]
    pub const fn mode(&self) -> ServerAuthMode {
        self.mode
    }

    /// Resolves the viewer identity used for tracking decisions.
    ///
    /// A valid bearer token yields the principal's roles; anything else is
    /// anonymous. Loopback access does not imply a role here.
    #[must_use]
    pub fn identity(&self, ctx: &RequestContext) -> Identity {
        parse_bearer_token(ctx.auth_header.as_deref())
            .ok()
            .and_then(|token| self.find_principal(&token))
            .map_or_else(Identity::anonymous, |principal| {
                Identity::authenticated(principal.subject.clone(), principal.roles.clone())
            })
    }

    /// Authorizes a privileged request.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Unauthenticated`] when credentials are missing or
    /// invalid and [`AuthError::Unauthorized`] when the principal lacks an
    /// admin role.
    pub fn authorize_admin(&self, ctx: &RequestContext) -> Result<AuthContext, AuthError> {
        match self.mode {
            ServerAuthMode::LocalOnly => {
                if ctx.peer_is_loopback() {
                    Ok(AuthContext {
                        method: AuthMethod::Local,
                        subject: "loopback".to_string(),
                        token_fingerprint: None,
                    })
                } else {
                    Err(AuthError::Unauthenticated(
                        "local-only mode requires loopback access".to_string(),
                    ))
                }
            }
            ServerAuthMode::BearerToken => {
                let token = parse_bearer_token(ctx.auth_header.as_deref())?;
                let principal = self
                    .find_principal(&token)
                    .ok_or_else(|| AuthError::Unauthenticated("invalid bearer token".to_string()))?;
                let identity =
                    Identity::authenticated(principal.subject.clone(), principal.roles.clone());
                if !identity.has_any_role(&self.admin_roles) {
                    return Err(AuthError::Unauthorized("principal lacks an admin role".to_string()));
                }
                Ok(AuthContext {
                    method: AuthMethod::BearerToken,
                    subject: principal.subject.clone(),
                    token_fingerprint: Some(token_fingerprint(&token)),
                })
            }
        }
    }

    /// Finds the principal for a token, comparing every entry in constant time.
    fn find_principal(&self, token: &str) -> Option<&Principal> {
        let mut found = None;
        for principal in &self.principals {
            let matches: bool = principal.token.as_bytes().ct_eq(token.as_bytes()).into();
            if matches && found.is_none() {
                found = Some(principal);
            }
        }
        found
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Extracts a bearer token from an authorization header.
fn parse_bearer_token(auth_header: Option<&str>) -> Result<String, AuthError> {
    let header = auth_header
        .ok_or_else(|| AuthError::Unauthenticated("missing authorization".to_string()))?;
    if header.len() > MAX_AUTH_HEADER_BYTES {
        return Err(AuthError::Unauthenticated("authorization header too large".to_string()));
    }
    let mut parts = header.trim().splitn(2, ' ');
    let scheme = parts.next().unwrap_or_default();
    let token = parts.next().unwrap_or_default().trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AuthError::Unauthenticated("invalid authorization header".to_string()));
    }
    Ok(token.to_string())
}

/// Returns the sha256 hex fingerprint of a token.
fn token_fingerprint(token: &str) -> String {
    hex_encode(&Sha256::digest(token.as_bytes()))
}

/// Encodes bytes as a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(char::from(HEX[usize::from(byte >> 4)]));
        out.push(char::from(HEX[usize::from(byte & 0x0f)]));
    }
    out
}

// ============================================================================
// SECTION: Tests
// ============================================================================
