// crates/rum-core/src/runtime/alerts.rs
// ============================================================================
// Module: TTFB Alert Evaluator
// Description: Detects sustained TTFB breaches and sends rate-limited alerts.
// Purpose: Notify operators when recent requests are consistently slow.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! The evaluator inspects the most recent TTFB values (newest first) and
//! counts the unbroken leading run above the configured threshold. An alert
//! is sent when that streak reaches `alert_consecutive` and the cool-down
//! since the last alert has elapsed. The last-alert stamp is written only
//! after the mail transport accepts the message.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use crate::core::EventTime;
use crate::core::Settings;
use crate::interfaces::LogStore;
use crate::interfaces::MailError;
use crate::interfaces::MailMessage;
use crate::interfaces::MailSender;
use crate::interfaces::OPTION_LAST_ALERT_TS;
use crate::interfaces::OptionStore;
use crate::runtime::error::RuntimeError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Minimum number of recent rows inspected per evaluation.
pub const MIN_ALERT_WINDOW: usize = 20;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Result of one alert evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum AlertOutcome {
    /// Threshold is zero or no recipient is configured.
    Disabled,
    /// The leading breach run is shorter than required.
    BelowStreak {
        /// Observed streak.
        streak: usize,
    },
    /// Streak qualifies but the cool-down has not elapsed.
    CoolingDown {
        /// Observed streak.
        streak: usize,
        /// Seconds until another alert may be sent.
        remaining_secs: i64,
    },
    /// Alert was sent and the last-alert stamp updated.
    Sent {
        /// Observed streak.
        streak: usize,
    },
    /// Mail transport failed; the last-alert stamp is unchanged.
    SendFailed {
        /// Observed streak.
        streak: usize,
        /// Transport failure.
        error: MailError,
    },
}

/// TTFB streak alert evaluator.
#[derive(Clone)]
pub struct AlertEvaluator {
    /// Record source.
    store: Arc<dyn LogStore>,
    /// Persistence for the last-alert stamp.
    options: Arc<dyn OptionStore>,
    /// Outbound mail.
    mail: Arc<dyn MailSender>,
    /// Fallback recipient when settings do not name one.
    admin_email: String,
}

// ============================================================================
// SECTION: Evaluation
// ============================================================================

impl AlertEvaluator {
    /// Creates an evaluator.
    #[must_use]
    pub fn new(
        store: Arc<dyn LogStore>,
        options: Arc<dyn OptionStore>,
        mail: Arc<dyn MailSender>,
        admin_email: impl Into<String>,
    ) -> Self {
        Self {
            store,
            options,
            mail,
            admin_email: admin_email.into(),
        }
    }

    /// Evaluates recent TTFB values and sends an alert when warranted.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError`] when the store or option store fails.
    pub fn evaluate(&self, settings: &Settings, now: EventTime) -> Result<AlertOutcome, RuntimeError> {
        let threshold = settings.alert_ttfb_threshold;
        let Some(recipient) = settings.recipient_or(&self.admin_email) else {
            return Ok(AlertOutcome::Disabled);
        };
        if threshold <= 0.0 {
            return Ok(AlertOutcome::Disabled);
        }
        let required = usize::try_from(settings.alert_consecutive).unwrap_or(usize::MAX).max(1);
        let recent = self.store.recent_ttfb(MIN_ALERT_WINDOW.max(required))?;
        let streak = breach_streak(&recent, threshold);
        if streak < required {
            return Ok(AlertOutcome::BelowStreak {
                streak,
            });
        }
        let last_alert = self.last_alert_ts()?;
        let cooldown = i64::try_from(settings.alert_min_interval).unwrap_or(i64::MAX);
        let elapsed = now.unix_seconds().saturating_sub(last_alert);
        if elapsed < cooldown {
            return Ok(AlertOutcome::CoolingDown {
                streak,
                remaining_secs: cooldown - elapsed,
            });
        }
        let message = MailMessage {
            to: recipient.to_string(),
            subject: format!("TTFB alert: {streak} hits over {threshold:.2}s"),
            body: format!("{streak} consecutive requests exceeded {threshold:.2}s TTFB."),
        };
        if let Err(error) = self.mail.send(&message) {
            return Ok(AlertOutcome::SendFailed {
                streak,
                error,
            });
        }
        self.options.set(OPTION_LAST_ALERT_TS, &now.unix_seconds().to_string())?;
        Ok(AlertOutcome::Sent {
            streak,
        })
    }

    /// Reads the last-alert stamp; missing or malformed values read as zero.
    fn last_alert_ts(&self) -> Result<i64, RuntimeError> {
        Ok(self
            .options
            .get(OPTION_LAST_ALERT_TS)?
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .unwrap_or(0))
    }
}

/// Counts leading values strictly above `threshold`.
#[must_use]
pub fn breach_streak(values: &[f64], threshold: f64) -> usize {
    values.iter().take_while(|value| **value > threshold).count()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn streak_stops_at_first_non_breach() {
        assert_eq!(breach_streak(&[3.0, 3.0, 1.0, 3.0, 3.0], 2.0), 2);
        assert_eq!(breach_streak(&[1.0, 3.0], 2.0), 0);
        assert_eq!(breach_streak(&[], 2.0), 0);
    }

    #[test]
    fn equal_to_threshold_is_not_a_breach() {
        assert_eq!(breach_streak(&[2.0, 3.0], 2.0), 0);
    }
}
