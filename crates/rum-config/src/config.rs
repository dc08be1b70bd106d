// crates/rum-config/src/config.rs
// ============================================================================
// Module: RUM Monitor Configuration
// Description: Configuration loading and validation for the RUM monitor.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: rum-core, rum-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Missing or invalid configuration fails closed. The `[settings]` table only
//! seeds initial values; settings persisted in the option store win.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use rum_core::ReportSchedule;
use rum_core::Settings;
use rum_core::SettingsUpdate;
use rum_core::is_valid_email;
use rum_store_sqlite::SqliteStoreConfig;
use rum_store_sqlite::SqliteStoreMode;
use rum_store_sqlite::SqliteSyncMode;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "rum-monitor.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "RUM_MONITOR_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum number of configured principals.
pub(crate) const MAX_AUTH_TOKENS: usize = 64;
/// Maximum length of a bearer token.
pub(crate) const MAX_AUTH_TOKEN_LENGTH: usize = 256;
/// Maximum number of roles per principal or admin role list.
pub(crate) const MAX_PRINCIPAL_ROLES: usize = 32;
/// Minimum collect secret length.
pub(crate) const MIN_COLLECT_SECRET_LENGTH: usize = 16;
/// Minimum collect token lifetime in seconds.
pub(crate) const MIN_TOKEN_TTL_SECS: u64 = 60;
/// Maximum collect token lifetime in seconds.
pub(crate) const MAX_TOKEN_TTL_SECS: u64 = 7 * 86_400;
/// Maximum site name length.
pub(crate) const MAX_SITE_NAME_LENGTH: usize = 200;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// RUM monitor configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RumConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Record and option store configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Outbound mail configuration.
    #[serde(default)]
    pub mail: MailConfig,
    /// Initial settings, clamped like any settings update.
    #[serde(default)]
    pub settings: SettingsUpdate,
}

impl RumConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.store.validate()?;
        self.mail.validate()?;
        if let Some(label) = &self.settings.report_schedule
            && ReportSchedule::parse(label).is_none()
        {
            return Err(ConfigError::Invalid(
                "settings.report_schedule must be daily or weekly".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the initial settings: defaults with `[settings]` applied.
    #[must_use]
    pub fn initial_settings(&self) -> Settings {
        Settings::default().apply(self.settings.clone())
    }
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Route prefix for every endpoint.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Request header carrying the viewer country code; empty disables.
    #[serde(default = "default_geo_header")]
    pub geo_header: String,
    /// Public base URL used to build the collect URL for the collector.
    /// When absent the request `Host` header is used.
    #[serde(default)]
    pub public_url: Option<String>,
    /// Collect token configuration.
    #[serde(default)]
    pub collect: CollectConfig,
    /// Optional authentication for privileged endpoints.
    #[serde(default)]
    pub auth: Option<ServerAuthConfig>,
    /// Audit logging configuration.
    #[serde(default)]
    pub audit: ServerAuditConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            namespace: default_namespace(),
            max_body_bytes: default_max_body_bytes(),
            geo_header: default_geo_header(),
            public_url: None,
            collect: CollectConfig::default(),
            auth: None,
            audit: ServerAuditConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Returns the parsed bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the address does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid("invalid bind address".to_string()))
    }

    /// Returns the effective auth mode.
    #[must_use]
    pub fn auth_mode(&self) -> ServerAuthMode {
        self.auth.as_ref().map_or(ServerAuthMode::LocalOnly, |auth| auth.mode)
    }

    /// Validates server configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_body_bytes must be greater than zero".to_string(),
            ));
        }
        validate_namespace(&self.namespace)?;
        if !self.geo_header.is_empty()
            && !self.geo_header.bytes().all(|byte| byte.is_ascii_alphanumeric() || byte == b'-')
        {
            return Err(ConfigError::Invalid(
                "server.geo_header must be a header name".to_string(),
            ));
        }
        if let Some(url) = &self.public_url {
            let trimmed = url.trim();
            if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
                return Err(ConfigError::Invalid(
                    "server.public_url must be an http(s) url".to_string(),
                ));
            }
        }
        self.collect.validate()?;
        if let Some(auth) = &self.auth {
            auth.validate()?;
        }
        self.audit.validate()?;
        let addr = self.bind_addr()?;
        if !addr.ip().is_loopback() && self.auth_mode() == ServerAuthMode::LocalOnly {
            return Err(ConfigError::Invalid(
                "non-loopback bind disallowed without auth policy".to_string(),
            ));
        }
        Ok(())
    }
}

/// Returns the default bind address.
fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

/// Returns the default route namespace.
fn default_namespace() -> String {
    "/rum/v1".to_string()
}

/// Returns the default max request body size.
const fn default_max_body_bytes() -> usize {
    64 * 1024
}

/// Returns the default geo header name.
fn default_geo_header() -> String {
    "cf-ipcountry".to_string()
}

/// Collect token configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectConfig {
    /// HMAC secret; a random per-process secret is used when absent.
    #[serde(default)]
    pub secret: Option<String>,
    /// Token lifetime in seconds. Tokens stay valid for up to this long.
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            secret: None,
            token_ttl_secs: default_token_ttl_secs(),
        }
    }
}

impl CollectConfig {
    /// Validates collect token configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(secret) = &self.secret {
            if secret.trim().len() < MIN_COLLECT_SECRET_LENGTH {
                return Err(ConfigError::Invalid(format!(
                    "server.collect.secret must be at least {MIN_COLLECT_SECRET_LENGTH} characters"
                )));
            }
            if secret.len() > MAX_AUTH_TOKEN_LENGTH {
                return Err(ConfigError::Invalid("server.collect.secret too long".to_string()));
            }
        }
        if !(MIN_TOKEN_TTL_SECS ..= MAX_TOKEN_TTL_SECS).contains(&self.token_ttl_secs) {
            return Err(ConfigError::Invalid(format!(
                "server.collect.token_ttl_secs must be between {MIN_TOKEN_TTL_SECS} and \
                 {MAX_TOKEN_TTL_SECS}"
            )));
        }
        Ok(())
    }
}

/// Returns the default collect token lifetime.
const fn default_token_ttl_secs() -> u64 {
    86_400
}

/// Audit logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerAuditConfig {
    /// Enable structured audit logging.
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,
    /// Optional audit log path (JSON lines); stderr when absent.
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for ServerAuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
            path: None,
        }
    }
}

impl ServerAuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            validate_path_string("audit.path", path)?;
        }
        Ok(())
    }
}

/// Returns the default audit enablement.
const fn default_audit_enabled() -> bool {
    true
}

/// Inbound auth modes for privileged endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ServerAuthMode {
    /// Loopback peers only, treated as administrators.
    #[default]
    LocalOnly,
    /// Bearer token authentication against configured principals.
    BearerToken,
}

/// Server authentication configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerAuthConfig {
    /// Auth mode for privileged endpoints.
    #[serde(default)]
    pub mode: ServerAuthMode,
    /// Roles that grant access to privileged endpoints.
    #[serde(default = "default_admin_roles")]
    pub admin_roles: Vec<String>,
    /// Bearer token principals.
    #[serde(default)]
    pub principals: Vec<PrincipalConfig>,
}

impl ServerAuthConfig {
    /// Validates auth configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.admin_roles.is_empty() {
            return Err(ConfigError::Invalid("auth.admin_roles must not be empty".to_string()));
        }
        validate_roles("auth.admin_roles", &self.admin_roles)?;
        if self.principals.len() > MAX_AUTH_TOKENS {
            return Err(ConfigError::Invalid("too many auth principals".to_string()));
        }
        for (index, principal) in self.principals.iter().enumerate() {
            principal.validate()?;
            if self.principals[.. index].iter().any(|prior| prior.token == principal.token) {
                return Err(ConfigError::Invalid("duplicate auth token".to_string()));
            }
        }
        if self.mode == ServerAuthMode::BearerToken && self.principals.is_empty() {
            return Err(ConfigError::Invalid("bearer_token auth requires principals".to_string()));
        }
        Ok(())
    }
}

/// Returns the default admin role list.
fn default_admin_roles() -> Vec<String> {
    vec!["administrator".to_string()]
}

/// Bearer token principal.
#[derive(Debug, Clone, Deserialize)]
pub struct PrincipalConfig {
    /// Bearer token.
    pub token: String,
    /// Principal subject label.
    pub subject: String,
    /// Roles granted to the principal.
    #[serde(default)]
    pub roles: Vec<String>,
}

impl PrincipalConfig {
    /// Validates principal configuration constraints.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.token.trim().is_empty() {
            return Err(ConfigError::Invalid("auth token must be non-empty".to_string()));
        }
        if self.token.len() > MAX_AUTH_TOKEN_LENGTH {
            return Err(ConfigError::Invalid("auth token too long".to_string()));
        }
        if self.token.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid(
                "auth token must not contain whitespace".to_string(),
            ));
        }
        if self.subject.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "auth.principals.subject must be non-empty".to_string(),
            ));
        }
        validate_roles("auth.principals.roles", &self.roles)
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Store backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreType {
    /// Use the in-memory store.
    #[default]
    Memory,
    /// Use the `SQLite`-backed durable store.
    Sqlite,
}

/// Record and option store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Store backend type.
    #[serde(rename = "type", default)]
    pub store_type: StoreType,
    /// `SQLite` database path when using the sqlite backend.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_store_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` synchronous mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
    /// Number of read connections.
    #[serde(default = "default_read_pool_size")]
    pub read_pool_size: usize,
    /// Run retention maintenance after every Nth stored beacon.
    #[serde(default = "default_maintenance_every")]
    pub maintenance_every: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            store_type: StoreType::default(),
            path: None,
            busy_timeout_ms: default_store_busy_timeout_ms(),
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
            read_pool_size: default_read_pool_size(),
            maintenance_every: default_maintenance_every(),
        }
    }
}

impl StoreConfig {
    /// Returns the `SQLite` backend config when the sqlite backend is selected.
    #[must_use]
    pub fn sqlite_config(&self) -> Option<SqliteStoreConfig> {
        match (self.store_type, &self.path) {
            (StoreType::Sqlite, Some(path)) => Some(SqliteStoreConfig {
                path: path.clone(),
                busy_timeout_ms: self.busy_timeout_ms,
                journal_mode: self.journal_mode,
                sync_mode: self.sync_mode,
                read_pool_size: self.read_pool_size,
            }),
            _ => None,
        }
    }

    /// Validates store configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.maintenance_every == 0 {
            return Err(ConfigError::Invalid(
                "store maintenance_every must be greater than zero".to_string(),
            ));
        }
        match self.store_type {
            StoreType::Memory => {
                if self.path.is_some() {
                    return Err(ConfigError::Invalid("memory store must not set path".to_string()));
                }
                Ok(())
            }
            StoreType::Sqlite => {
                let path = self
                    .path
                    .as_ref()
                    .ok_or_else(|| ConfigError::Invalid("sqlite store requires path".to_string()))?;
                validate_store_path(path)?;
                if self.read_pool_size == 0 {
                    return Err(ConfigError::Invalid(
                        "store read_pool_size must be greater than zero".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }
}

/// Returns the default store busy timeout.
const fn default_store_busy_timeout_ms() -> u64 {
    5_000
}

/// Returns the default read pool size.
const fn default_read_pool_size() -> usize {
    4
}

/// Returns the default maintenance cadence.
const fn default_maintenance_every() -> u64 {
    1
}

// ============================================================================
// SECTION: Mail
// ============================================================================

/// Outbound mail transport type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MailType {
    /// Write messages to the audit log only.
    #[default]
    Log,
    /// Write each message as a file into a spool directory.
    Spool,
}

/// Outbound mail configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    /// Mail transport type.
    #[serde(rename = "type", default)]
    pub mail_type: MailType,
    /// Sender address.
    #[serde(default = "default_mail_from")]
    pub from: String,
    /// Site name used in report subjects.
    #[serde(default = "default_site_name")]
    pub site_name: String,
    /// Fallback recipient when settings carry no recipient.
    #[serde(default)]
    pub admin_email: String,
    /// Spool directory for the spool transport.
    #[serde(default)]
    pub spool_dir: Option<String>,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            mail_type: MailType::default(),
            from: default_mail_from(),
            site_name: default_site_name(),
            admin_email: String::new(),
            spool_dir: None,
        }
    }
}

impl MailConfig {
    /// Validates mail configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_email(self.from.trim()) {
            return Err(ConfigError::Invalid("mail.from must be a valid address".to_string()));
        }
        if !self.admin_email.trim().is_empty() && !is_valid_email(self.admin_email.trim()) {
            return Err(ConfigError::Invalid(
                "mail.admin_email must be a valid address".to_string(),
            ));
        }
        if self.site_name.trim().is_empty() || self.site_name.len() > MAX_SITE_NAME_LENGTH {
            return Err(ConfigError::Invalid(
                "mail.site_name must be non-empty and at most 200 bytes".to_string(),
            ));
        }
        if let Some(dir) = &self.spool_dir {
            validate_path_string("mail.spool_dir", dir)?;
        }
        if self.mail_type == MailType::Spool && self.spool_dir.is_none() {
            return Err(ConfigError::Invalid("spool mail requires spool_dir".to_string()));
        }
        Ok(())
    }
}

/// Returns the default sender address.
fn default_mail_from() -> String {
    "rum@localhost".to_string()
}

/// Returns the default site name.
fn default_site_name() -> String {
    "RUM Monitor".to_string()
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    let path = Path::new(trimmed);
    for component in path.components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates store paths against security limits.
fn validate_store_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.trim().is_empty() {
        return Err(ConfigError::Invalid("store path must be non-empty".to_string()));
    }
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("store path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("store path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates the route namespace prefix.
fn validate_namespace(namespace: &str) -> Result<(), ConfigError> {
    if !namespace.starts_with('/') {
        return Err(ConfigError::Invalid("server.namespace must start with '/'".to_string()));
    }
    if namespace.len() < 2 || namespace.ends_with('/') {
        return Err(ConfigError::Invalid(
            "server.namespace must not be '/' or end with '/'".to_string(),
        ));
    }
    if !namespace
        .bytes()
        .all(|byte| byte.is_ascii_alphanumeric() || matches!(byte, b'/' | b'-' | b'_' | b'.'))
    {
        return Err(ConfigError::Invalid(
            "server.namespace contains unsupported characters".to_string(),
        ));
    }
    Ok(())
}

/// Validates a role list.
fn validate_roles(field: &str, roles: &[String]) -> Result<(), ConfigError> {
    if roles.len() > MAX_PRINCIPAL_ROLES {
        return Err(ConfigError::Invalid(format!("{field} exceeds max entries")));
    }
    if roles.iter().any(|role| role.trim().is_empty()) {
        return Err(ConfigError::Invalid(format!("{field} entries must be non-empty")));
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(RumConfig::default().validate().is_ok());
    }

    #[test]
    fn namespace_rules() {
        assert!(validate_namespace("/rum/v1").is_ok());
        assert!(validate_namespace("rum").is_err());
        assert!(validate_namespace("/").is_err());
        assert!(validate_namespace("/rum/").is_err());
        assert!(validate_namespace("/rum v1").is_err());
    }

    #[test]
    fn sqlite_config_requires_sqlite_type_and_path() {
        let mut store = StoreConfig::default();
        assert!(store.sqlite_config().is_none());
        store.store_type = StoreType::Sqlite;
        store.path = Some(PathBuf::from("rum.db"));
        let sqlite = store.sqlite_config().expect("sqlite config");
        assert_eq!(sqlite.path, PathBuf::from("rum.db"));
        assert_eq!(sqlite.read_pool_size, 4);
    }
}
