// crates/rum-server/tests/common/mod.rs
// =============================================================================
// Module: Server Test Helpers
// Description: In-memory backends, recording fakes, and an ephemeral server.
// Purpose: Share fixtures across rum-server integration suites.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]
#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only helpers.")]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::Mutex;

use rum_config::RumConfig;
use rum_core::EventTime;
use rum_core::InMemoryLogStore;
use rum_core::InMemoryOptionStore;
use rum_core::MailError;
use rum_core::MailMessage;
use rum_core::MailSender;
use rum_core::SampleSource;
use rum_server::AuditEvent;
use rum_server::AuditSink;
use rum_server::CollectTokenIssuer;
use rum_server::RumServer;
use rum_server::ServerBackends;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Collect secret configured on test servers.
pub const TEST_SECRET: &str = "test-collect-secret-0123456789abcdef";

// ============================================================================
// SECTION: Fakes
// ============================================================================

/// Mail sender that records messages and optionally fails.
#[derive(Default)]
pub struct RecordingMail {
    /// Delivered messages.
    pub sent: Mutex<Vec<MailMessage>>,
    /// When true, every send fails at the transport.
    pub fail: bool,
}

impl RecordingMail {
    /// Creates a failing sender.
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Returns delivered messages.
    pub fn messages(&self) -> Vec<MailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

impl MailSender for RecordingMail {
    fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        if self.fail {
            return Err(MailError::Transport("smtp down".to_string()));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Audit sink that keeps event labels.
#[derive(Default)]
pub struct RecordingAudit {
    /// Recorded events rendered as JSON.
    pub events: Mutex<Vec<serde_json::Value>>,
}

impl RecordingAudit {
    /// Returns recorded events whose `event` field equals `name`.
    pub fn named(&self, name: &str) -> Vec<serde_json::Value> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|event| event["event"] == name)
            .cloned()
            .collect()
    }
}

impl AuditSink for RecordingAudit {
    fn record(&self, event: &AuditEvent) {
        self.events.lock().unwrap().push(serde_json::to_value(event).unwrap());
    }
}

/// Sample source returning a fixed roll.
pub struct FixedRoll(pub u32);

impl SampleSource for FixedRoll {
    fn roll(&self) -> u32 {
        self.0
    }
}

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// In-memory backends plus handles for assertions.
pub struct Fixture {
    /// Record store.
    pub store: Arc<InMemoryLogStore>,
    /// Option store.
    pub options: Arc<InMemoryOptionStore>,
    /// Mail recorder.
    pub mail: Arc<RecordingMail>,
    /// Audit recorder.
    pub audit: Arc<RecordingAudit>,
}

impl Fixture {
    /// Creates a fixture with a working mail sender.
    pub fn new() -> Self {
        Self::with_mail(RecordingMail::default())
    }

    /// Creates a fixture with the given mail sender.
    pub fn with_mail(mail: RecordingMail) -> Self {
        Self {
            store: Arc::new(InMemoryLogStore::new()),
            options: Arc::new(InMemoryOptionStore::new()),
            mail: Arc::new(mail),
            audit: Arc::new(RecordingAudit::default()),
        }
    }

    /// Returns server backends sharing this fixture's handles.
    pub fn backends(&self) -> ServerBackends {
        ServerBackends {
            store: self.store.clone(),
            options: self.options.clone(),
            mail: self.mail.clone(),
            audit: self.audit.clone(),
            sampler: Arc::new(FixedRoll(0)),
        }
    }
}

/// Returns a config with a fixed collect secret and an admin fallback address.
pub fn test_config() -> RumConfig {
    let mut config = RumConfig::default();
    config.server.collect.secret = Some(TEST_SECRET.to_string());
    config.mail.admin_email = "admin@example.com".to_string();
    config
}

/// Issues a collect token valid for the test secret.
pub fn collect_token(config: &RumConfig) -> String {
    CollectTokenIssuer::new(TEST_SECRET, config.server.collect.token_ttl_secs)
        .issue(EventTime::now())
}

// ============================================================================
// SECTION: Server Harness
// ============================================================================

/// Running test server.
pub struct TestServer {
    /// Base URL including the namespace.
    pub base_url: String,
    /// Shutdown trigger.
    shutdown: Option<oneshot::Sender<()>>,
    /// Server task.
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Returns the URL for an endpoint path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Stops the server and waits for it to exit.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = self.handle.await;
    }
}

/// Spawns a server on an ephemeral loopback port.
pub async fn spawn_server(config: RumConfig, backends: ServerBackends) -> TestServer {
    let namespace = config.server.namespace.clone();
    let server = RumServer::from_parts(config, backends).expect("server");
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr: SocketAddr = listener.local_addr().expect("addr");
    let (tx, rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(async move {
        let _ = server
            .serve_listener(listener, async {
                let _ = rx.await;
            })
            .await;
    });
    TestServer {
        base_url: format!("http://{addr}{namespace}"),
        shutdown: Some(tx),
        handle,
    }
}
