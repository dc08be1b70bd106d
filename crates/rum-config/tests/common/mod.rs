// crates/rum-config/tests/common/mod.rs
// =============================================================================
// Module: Config Test Helpers
// Description: Shared helpers for config validation tests.
// Purpose: Reduce duplication across integration tests for rum-config.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use rum_config::ConfigError;
use rum_config::PrincipalConfig;
use rum_config::RumConfig;
use rum_config::ServerAuthConfig;
use rum_config::ServerAuthMode;

/// Result type used by validation tests.
pub type TestResult = Result<(), String>;

/// Parses a TOML string into a `RumConfig` for tests.
pub fn config_from_toml(toml_str: &str) -> Result<RumConfig, toml::de::Error> {
    toml::from_str(toml_str)
}

/// Returns a minimal config with all defaults applied.
pub fn minimal_config() -> Result<RumConfig, toml::de::Error> {
    config_from_toml("")
}

/// Returns a bearer auth config with one admin principal.
pub fn bearer_auth(token: &str) -> ServerAuthConfig {
    ServerAuthConfig {
        mode: ServerAuthMode::BearerToken,
        admin_roles: vec!["administrator".to_string()],
        principals: vec![PrincipalConfig {
            token: token.to_string(),
            subject: "ops".to_string(),
            roles: vec!["administrator".to_string()],
        }],
    }
}

/// Asserts that a validation result fails with a message containing `needle`.
pub fn assert_invalid(result: Result<(), ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(()) => Err("expected invalid config".to_string()),
    }
}
