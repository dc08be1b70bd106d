// crates/rum-server/src/mail.rs
// ============================================================================
// Module: Mail Adapters
// Description: Log and spool-directory implementations of the mail sender.
// Purpose: Deliver reports and alerts without embedding an SMTP client.
// Dependencies: rum-config, rum-core, serde_json, time, uuid
// ============================================================================

//! ## Overview
//! The log transport writes one JSON line per message to stderr. The spool
//! transport writes each message as an RFC 5322 text file into a directory
//! that an external mailer drains. Header values are stripped of line
//! breaks so subjects cannot inject headers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use rum_config::MailConfig;
use rum_config::MailType;
use rum_core::MailError;
use rum_core::MailMessage;
use rum_core::MailSender;
use rum_core::is_valid_email;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc2822;
use uuid::Uuid;

use crate::server::ServerError;

// ============================================================================
// SECTION: Log Transport
// ============================================================================

/// Mail log line.
#[derive(Debug, Serialize)]
struct MailLogLine<'a> {
    /// Event identifier.
    event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    timestamp_ms: u128,
    /// Sender address.
    from: &'a str,
    /// Recipient address.
    to: &'a str,
    /// Subject line.
    subject: &'a str,
    /// Body text.
    body: &'a str,
}

/// Mail sender that writes messages to stderr as JSON lines.
pub struct LogMailSender {
    /// Sender address.
    from: String,
}

impl LogMailSender {
    /// Creates a log sender.
    #[must_use]
    pub fn new(from: impl Into<String>) -> Self {
        Self {
            from: from.into(),
        }
    }
}

impl MailSender for LogMailSender {
    fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        check_recipient(&message.to)?;
        let line = MailLogLine {
            event: "mail",
            timestamp_ms: now_millis(),
            from: &self.from,
            to: &message.to,
            subject: &message.subject,
            body: &message.body,
        };
        let payload =
            serde_json::to_string(&line).map_err(|err| MailError::Transport(err.to_string()))?;
        writeln!(io::stderr(), "{payload}").map_err(|err| MailError::Transport(err.to_string()))
    }
}

// ============================================================================
// SECTION: Spool Transport
// ============================================================================

/// Mail sender that writes one `.eml` file per message.
pub struct SpoolMailSender {
    /// Spool directory.
    dir: PathBuf,
    /// Sender address.
    from: String,
}

impl SpoolMailSender {
    /// Creates a spool sender, creating the directory when missing.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be created.
    pub fn new(dir: impl Into<PathBuf>, from: impl Into<String>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            from: from.into(),
        })
    }
}

impl MailSender for SpoolMailSender {
    fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        check_recipient(&message.to)?;
        let date = OffsetDateTime::now_utc()
            .format(&Rfc2822)
            .map_err(|err| MailError::Transport(err.to_string()))?;
        let rendered = format!(
            "From: {}\r\nTo: {}\r\nSubject: {}\r\nDate: {date}\r\nMIME-Version: 1.0\r\nContent-Type: \
             text/plain; charset=utf-8\r\n\r\n{}",
            header_value(&self.from),
            header_value(&message.to),
            header_value(&message.subject),
            message.body.replace('\n', "\r\n"),
        );
        let name = format!("{}-{}", now_millis(), Uuid::new_v4());
        let staging = self.dir.join(format!("{name}.tmp"));
        let target = self.dir.join(format!("{name}.eml"));
        fs::write(&staging, rendered).map_err(|err| MailError::Transport(err.to_string()))?;
        fs::rename(&staging, &target).map_err(|err| MailError::Transport(err.to_string()))
    }
}

// ============================================================================
// SECTION: Construction
// ============================================================================

/// Builds the configured mail sender.
///
/// # Errors
///
/// Returns [`ServerError::Init`] when the spool directory cannot be created.
pub fn build_mail_sender(config: &MailConfig) -> Result<Arc<dyn MailSender>, ServerError> {
    match config.mail_type {
        MailType::Log => Ok(Arc::new(LogMailSender::new(config.from.trim()))),
        MailType::Spool => {
            let dir = config
                .spool_dir
                .as_deref()
                .ok_or_else(|| ServerError::Config("spool mail requires spool_dir".to_string()))?;
            let sender = SpoolMailSender::new(dir.trim(), config.from.trim())
                .map_err(|err| ServerError::Init(format!("mail spool: {err}")))?;
            Ok(Arc::new(sender))
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Rejects malformed recipients before touching the transport.
fn check_recipient(to: &str) -> Result<(), MailError> {
    if is_valid_email(to.trim()) { Ok(()) } else { Err(MailError::InvalidRecipient) }
}

/// Strips line breaks from a header value.
fn header_value(value: &str) -> String {
    value.chars().filter(|ch| *ch != '\r' && *ch != '\n').collect()
}

/// Returns milliseconds since the unix epoch.
fn now_millis() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only assertions.")]

    use super::*;

    fn message(to: &str, subject: &str) -> MailMessage {
        MailMessage {
            to: to.to_string(),
            subject: subject.to_string(),
            body: "line one\nline two".to_string(),
        }
    }

    #[test]
    fn spool_writes_one_file_per_message() {
        let dir = tempfile::tempdir().unwrap();
        let spool = dir.path().join("spool");
        let sender = SpoolMailSender::new(&spool, "rum@example.com").unwrap();
        sender.send(&message("ops@example.com", "Report")).unwrap();
        sender.send(&message("ops@example.com", "Alert")).unwrap();
        let files: Vec<PathBuf> =
            fs::read_dir(&spool).unwrap().map(|entry| entry.unwrap().path()).collect();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|path| path.extension().is_some_and(|ext| ext == "eml")));
        let content = fs::read_to_string(&files[0]).unwrap();
        assert!(content.starts_with("From: rum@example.com\r\nTo: ops@example.com\r\n"));
        assert!(content.ends_with("line one\r\nline two"));
    }

    #[test]
    fn subject_line_breaks_are_stripped() {
        let dir = tempfile::tempdir().unwrap();
        let sender = SpoolMailSender::new(dir.path(), "rum@example.com").unwrap();
        sender.send(&message("ops@example.com", "Hi\r\nBcc: victim@example.com")).unwrap();
        let path = fs::read_dir(dir.path()).unwrap().next().unwrap().unwrap().path();
        let content = fs::read_to_string(path).unwrap();
        assert!(content.contains("Subject: HiBcc: victim@example.com\r\n"));
        assert!(!content.contains("\r\nBcc:"));
    }

    #[test]
    fn invalid_recipient_is_rejected_before_transport() {
        let dir = tempfile::tempdir().unwrap();
        let sender = SpoolMailSender::new(dir.path(), "rum@example.com").unwrap();
        assert_eq!(sender.send(&message("nobody", "x")), Err(MailError::InvalidRecipient));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
        let log = LogMailSender::new("rum@example.com");
        assert_eq!(log.send(&message("", "x")), Err(MailError::InvalidRecipient));
    }
}
