// crates/rum-core/src/runtime/report.rs
// ============================================================================
// Module: Summary Report Composer
// Description: Builds and sends the periodic performance summary email.
// Purpose: Turn store aggregates into a plain-text operator report.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! The summary lists overall averages, the slowest pages by average LCP
//! (only URLs seen more than once), and a device histogram. Send failures
//! are returned as [`MailOutcome::Failed`] values rather than errors so the
//! scheduler can continue with alert evaluation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write as _;
use std::sync::Arc;

use crate::core::ReportSummary;
use crate::core::Settings;
use crate::interfaces::LogStore;
use crate::interfaces::MailError;
use crate::interfaces::MailMessage;
use crate::interfaces::MailSender;
use crate::runtime::error::RuntimeError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Number of pages listed in the summary.
pub const REPORT_TOP_PAGES: usize = 10;
/// URLs need strictly more hits than this to be listed.
pub const REPORT_MIN_HITS: u64 = 1;
/// Divider line used between report sections.
const DIVIDER: &str = "--------------------------------------------------";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Outcome of a summary send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailOutcome {
    /// Message accepted by the transport.
    Sent,
    /// Recipient invalid or transport failed.
    Failed(MailError),
}

impl MailOutcome {
    /// Returns true when the message was sent.
    #[must_use]
    pub const fn is_sent(&self) -> bool {
        matches!(self, Self::Sent)
    }
}

/// Summary report composer.
#[derive(Clone)]
pub struct ReportComposer {
    /// Record source.
    store: Arc<dyn LogStore>,
    /// Outbound mail.
    mail: Arc<dyn MailSender>,
    /// Fallback recipient.
    admin_email: String,
    /// Site name used in the subject and heading.
    site_name: String,
}

// ============================================================================
// SECTION: Composition
// ============================================================================

impl ReportComposer {
    /// Creates a composer.
    #[must_use]
    pub fn new(
        store: Arc<dyn LogStore>,
        mail: Arc<dyn MailSender>,
        admin_email: impl Into<String>,
        site_name: impl Into<String>,
    ) -> Self {
        Self {
            store,
            mail,
            admin_email: admin_email.into(),
            site_name: site_name.into(),
        }
    }

    /// Composes and sends the summary to the configured recipient.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError`] when the store cannot produce the summary.
    pub fn send_summary(&self, settings: &Settings) -> Result<MailOutcome, RuntimeError> {
        let Some(recipient) = settings.recipient_or(&self.admin_email) else {
            return Ok(MailOutcome::Failed(MailError::InvalidRecipient));
        };
        let summary = self.store.report_summary(REPORT_MIN_HITS, REPORT_TOP_PAGES)?;
        let message = MailMessage {
            to: recipient.to_string(),
            subject: format!("RUM Monitor report: {}", self.site_name),
            body: render_summary(&self.site_name, &summary),
        };
        Ok(match self.mail.send(&message) {
            Ok(()) => MailOutcome::Sent,
            Err(error) => MailOutcome::Failed(error),
        })
    }
}

/// Renders the plain-text summary body.
#[must_use]
pub fn render_summary(site_name: &str, summary: &ReportSummary) -> String {
    let mut body = String::new();
    let _ = writeln!(body, "RUM Monitor report for {site_name}");
    let _ = writeln!(body, "{DIVIDER}");
    let _ = writeln!(body, "Avg LCP (User Exp):  {:.3}s", summary.avg_lcp);
    let _ = writeln!(body, "Avg TTFB (Server):   {:.3}s", summary.avg_ttfb);
    let _ = writeln!(body, "Avg Total Load:      {:.3}s", summary.avg_load);
    body.push('\n');
    let _ = writeln!(body, "Top Problematic Pages (Sort by LCP, min 2 views):");
    let _ = writeln!(body, "{DIVIDER}");
    if summary.top_pages.is_empty() {
        body.push_str("Not enough data yet.\n");
    }
    for page in &summary.top_pages {
        let _ = writeln!(
            body,
            "[LCP: {:.3}s | TTFB: {:.3}s] {} ({} hits)",
            page.lcp, page.ttfb, page.url, page.hits
        );
    }
    body.push_str("\nDevice Usage:\n");
    for device in &summary.devices {
        let label = if device.device.is_empty() { "unknown" } else { device.device.as_str() };
        let _ = writeln!(body, "{label}: {}", device.hits);
    }
    body
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DeviceCount;
    use crate::core::PageSummary;

    #[test]
    fn empty_summary_says_not_enough_data() {
        let body = render_summary("Shop", &ReportSummary::default());
        assert!(body.starts_with("RUM Monitor report for Shop\n"));
        assert!(body.contains("Avg LCP (User Exp):  0.000s"));
        assert!(body.contains("Not enough data yet."));
    }

    #[test]
    fn pages_and_devices_are_listed() {
        let summary = ReportSummary {
            avg_ttfb: 0.5,
            avg_lcp: 1.25,
            avg_load: 2.0,
            top_pages: vec![PageSummary {
                url: "/slow".to_string(),
                ttfb: 0.4,
                lcp: 3.5,
                hits: 4,
            }],
            devices: vec![
                DeviceCount {
                    device: String::new(),
                    hits: 2,
                },
                DeviceCount {
                    device: "mobile".to_string(),
                    hits: 3,
                },
            ],
        };
        let body = render_summary("Shop", &summary);
        assert!(body.contains("[LCP: 3.500s | TTFB: 0.400s] /slow (4 hits)"));
        assert!(body.contains("unknown: 2\n"));
        assert!(body.contains("mobile: 3\n"));
        assert!(!body.contains("Not enough data yet."));
    }
}
