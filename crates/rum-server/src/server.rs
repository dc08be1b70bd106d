// crates/rum-server/src/server.rs
// ============================================================================
// Module: RUM Server
// Description: Backend wiring, routing, and HTTP serving.
// Purpose: Assemble the gateway and scheduler from configuration and serve them.
// Dependencies: axum, rum-config, rum-core, rum-store-sqlite, tokio
// ============================================================================

//! ## Overview
//! [`RumServer`] validates configuration, builds the configured backends,
//! reconciles the report schedule once at startup, and serves the gateway
//! routes under the configured namespace. The scheduler loop runs alongside
//! the HTTP server and stops when the server shuts down.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::Future;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::routing::post;
use rum_config::RumConfig;
use rum_config::ServerAuthMode;
use rum_config::StoreType;
use rum_core::AlertEvaluator;
use rum_core::EventTime;
use rum_core::InMemoryLogStore;
use rum_core::InMemoryOptionStore;
use rum_core::LogStore;
use rum_core::MailSender;
use rum_core::OptionStore;
use rum_core::RandomSampleSource;
use rum_core::ReportComposer;
use rum_core::SampleSource;
use rum_core::SettingsAccessor;
use rum_core::TrackingPolicy;
use rum_store_sqlite::SqliteRumStore;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::audit::AuditEvent;
use crate::audit::AuditSink;
use crate::audit::FileAuditSink;
use crate::audit::NoopAuditSink;
use crate::audit::SecurityAuditEvent;
use crate::audit::StderrAuditSink;
use crate::audit::TaskAuditEvent;
use crate::auth::AdminAuthz;
use crate::auth::CollectTokenIssuer;
use crate::gateway::GatewayState;
use crate::gateway::handle_collect;
use crate::gateway::handle_collector_config;
use crate::gateway::handle_get_settings;
use crate::gateway::handle_health;
use crate::gateway::handle_logs;
use crate::gateway::handle_send_report;
use crate::gateway::handle_stats;
use crate::gateway::handle_update_settings;
use crate::mail::build_mail_sender;
use crate::scheduler::ReportScheduler;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Server startup and transport errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),
    /// Backend initialization error.
    #[error("init error: {0}")]
    Init(String),
    /// HTTP transport error.
    #[error("transport error: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: Backends
// ============================================================================

/// Pluggable backends used by the server.
#[derive(Clone)]
pub struct ServerBackends {
    /// Record store.
    pub store: Arc<dyn LogStore>,
    /// Option store for settings and scheduler state.
    pub options: Arc<dyn OptionStore>,
    /// Outbound mail transport.
    pub mail: Arc<dyn MailSender>,
    /// Audit sink.
    pub audit: Arc<dyn AuditSink>,
    /// Sampling source for the tracking policy.
    pub sampler: Arc<dyn SampleSource>,
}

impl ServerBackends {
    /// Builds the backends named by configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when a backend cannot be opened.
    pub fn from_config(config: &RumConfig) -> Result<Self, ServerError> {
        let (store, options): (Arc<dyn LogStore>, Arc<dyn OptionStore>) =
            match config.store.store_type {
                StoreType::Memory => {
                    (Arc::new(InMemoryLogStore::new()), Arc::new(InMemoryOptionStore::new()))
                }
                StoreType::Sqlite => {
                    let sqlite_config = config.store.sqlite_config().ok_or_else(|| {
                        ServerError::Config("sqlite store requires path".to_string())
                    })?;
                    let sqlite = Arc::new(
                        SqliteRumStore::new(&sqlite_config)
                            .map_err(|err| ServerError::Init(err.to_string()))?,
                    );
                    (sqlite.clone(), sqlite)
                }
            };
        let audit: Arc<dyn AuditSink> = if !config.server.audit.enabled {
            Arc::new(NoopAuditSink)
        } else if let Some(path) = &config.server.audit.path {
            let sink = FileAuditSink::new(Path::new(path.trim()))
                .map_err(|err| ServerError::Init(format!("audit log: {err}")))?;
            Arc::new(sink)
        } else {
            Arc::new(StderrAuditSink)
        };
        Ok(Self {
            store,
            options,
            mail: build_mail_sender(&config.mail)?,
            audit,
            sampler: Arc::new(RandomSampleSource),
        })
    }
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// Assembled RUM server.
pub struct RumServer {
    /// Validated configuration.
    config: RumConfig,
    /// Shared gateway state.
    state: Arc<GatewayState>,
}

impl RumServer {
    /// Builds a server from configuration using the configured backends.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when configuration or backends are invalid.
    pub fn from_config(config: RumConfig) -> Result<Self, ServerError> {
        config.validate().map_err(|err| ServerError::Config(err.to_string()))?;
        let backends = ServerBackends::from_config(&config)?;
        Self::from_parts(config, backends)
    }

    /// Builds a server from configuration and explicit backends.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when configuration is invalid or the initial
    /// schedule reconciliation fails.
    pub fn from_parts(config: RumConfig, backends: ServerBackends) -> Result<Self, ServerError> {
        config.validate().map_err(|err| ServerError::Config(err.to_string()))?;
        let admin_email = config.mail.admin_email.trim().to_string();
        let settings = SettingsAccessor::new(backends.options.clone(), config.initial_settings());
        let composer = ReportComposer::new(
            backends.store.clone(),
            backends.mail.clone(),
            admin_email.clone(),
            config.mail.site_name.trim(),
        );
        let alerts = AlertEvaluator::new(
            backends.store.clone(),
            backends.options.clone(),
            backends.mail.clone(),
            admin_email,
        );
        let scheduler = ReportScheduler::new(
            backends.options.clone(),
            settings.clone(),
            composer.clone(),
            alerts,
            backends.audit.clone(),
        );
        scheduler
            .reconcile(EventTime::now())
            .map_err(|err| ServerError::Init(err.to_string()))?;
        let authz = AdminAuthz::from_config(config.server.auth.as_ref());
        if authz.mode() == ServerAuthMode::LocalOnly {
            backends.audit.record(&AuditEvent::Security(SecurityAuditEvent::new(
                "local_only_auth",
                "privileged endpoints accept loopback peers without credentials",
            )));
        }
        let server = &config.server;
        let state = GatewayState {
            store: backends.store,
            settings,
            policy: TrackingPolicy::new(backends.sampler),
            tokens: CollectTokenIssuer::from_config(&server.collect),
            authz,
            composer,
            scheduler,
            audit: backends.audit,
            namespace: server.namespace.trim().trim_end_matches('/').to_string(),
            public_url: server
                .public_url
                .as_ref()
                .map(|url| url.trim().to_string())
                .filter(|url| !url.is_empty()),
            geo_header: server.geo_header.trim().to_ascii_lowercase(),
            maintenance_every: config.store.maintenance_every,
            stored: AtomicU64::new(0),
        };
        Ok(Self {
            config,
            state: Arc::new(state),
        })
    }

    /// Returns the report scheduler.
    #[must_use]
    pub fn scheduler(&self) -> ReportScheduler {
        self.state.scheduler.clone()
    }

    /// Returns the gateway router with every route under the namespace.
    #[must_use]
    pub fn router(&self) -> Router {
        let routes = Router::new()
            .route("/collect", post(handle_collect))
            .route("/collector-config", get(handle_collector_config))
            .route("/logs", get(handle_logs))
            .route("/stats", get(handle_stats))
            .route("/send-report", post(handle_send_report))
            .route("/settings", get(handle_get_settings).post(handle_update_settings))
            .route("/health", get(handle_health))
            .layer(DefaultBodyLimit::max(self.config.server.max_body_bytes))
            .with_state(Arc::clone(&self.state));
        if self.state.namespace.is_empty() {
            routes
        } else {
            Router::new().nest(&self.state.namespace, routes)
        }
    }

    /// Binds the configured address and serves until ctrl-c.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), ServerError> {
        let addr = self.config.server.bind_addr().map_err(|err| ServerError::Config(err.to_string()))?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|err| ServerError::Transport(format!("bind {addr}: {err}")))?;
        self.serve_listener(listener, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
    }

    /// Serves on an already-bound listener until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Transport`] when the HTTP server fails.
    pub async fn serve_listener(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        let (stop_tx, stop_rx) = watch::channel(false);
        let scheduler = tokio::spawn(self.scheduler().run(stop_rx));
        let app = self.router().into_make_service_with_connect_info::<SocketAddr>();
        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|err| ServerError::Transport(err.to_string()));
        let _ = stop_tx.send(true);
        if let Err(err) = scheduler.await {
            self.state
                .audit
                .record(&AuditEvent::Task(TaskAuditEvent::scheduler_error(err.to_string())));
        }
        served
    }
}
