// crates/rum-core/src/core/identity.rs
// ============================================================================
// Module: Viewer Identity
// Description: Resolved identity of the viewer or operator behind a request.
// Purpose: Carry roles into tracking eligibility and record stamping.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`Identity`] is resolved once per request by the HTTP surface and passed
//! explicitly to the policy and gateway code. Anonymous viewers carry no
//! subject and no roles.

use serde::Deserialize;
use serde::Serialize;

/// Resolved request identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable subject label, if authenticated.
    pub subject: Option<String>,
    /// Roles held by the subject.
    pub roles: Vec<String>,
}

impl Identity {
    /// Returns an anonymous identity.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            subject: None,
            roles: Vec::new(),
        }
    }

    /// Returns an authenticated identity with roles.
    #[must_use]
    pub fn authenticated(subject: impl Into<String>, roles: Vec<String>) -> Self {
        Self {
            subject: Some(subject.into()),
            roles,
        }
    }

    /// Returns the first role, or an empty string for anonymous viewers.
    #[must_use]
    pub fn primary_role(&self) -> &str {
        self.roles.first().map_or("", String::as_str)
    }

    /// Returns true when the identity holds any of the given roles.
    #[must_use]
    pub fn has_any_role<'a>(&self, roles: impl IntoIterator<Item = &'a String>) -> bool {
        roles.into_iter().any(|role| self.roles.iter().any(|held| held == role))
    }
}
