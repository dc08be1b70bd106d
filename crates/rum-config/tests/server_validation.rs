//! Server config validation tests for rum-config.
// crates/rum-config/tests/server_validation.rs
// =============================================================================
// Module: Server Config Validation Tests
// Description: Validate bind, namespace, collect token, auth, and audit rules.
// Purpose: Ensure privileged surfaces never start in an unsafe posture.
// =============================================================================

use common::TestResult;
use common::assert_invalid;
use rum_config::PrincipalConfig;
use rum_config::ServerAuthMode;

mod common;

#[test]
fn non_loopback_bind_requires_auth() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.server.bind = "0.0.0.0:8080".to_string();
    assert_invalid(config.validate(), "non-loopback bind disallowed without auth policy")?;
    config.server.auth = Some(common::bearer_auth("ops-token"));
    config.validate().map_err(|err| err.to_string())?;
    Ok(())
}

#[test]
fn invalid_bind_is_rejected() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.server.bind = "localhost".to_string();
    assert_invalid(config.validate(), "invalid bind address")?;
    Ok(())
}

#[test]
fn namespace_must_be_absolute() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.server.namespace = "rum/v1".to_string();
    assert_invalid(config.validate(), "server.namespace must start with '/'")?;
    Ok(())
}

#[test]
fn zero_body_limit_is_rejected() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.server.max_body_bytes = 0;
    assert_invalid(config.validate(), "max_body_bytes must be greater than zero")?;
    Ok(())
}

#[test]
fn bearer_mode_requires_principals() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    let mut auth = common::bearer_auth("ops-token");
    auth.principals.clear();
    config.server.auth = Some(auth);
    assert_invalid(config.validate(), "bearer_token auth requires principals")?;
    Ok(())
}

#[test]
fn overlong_token_is_rejected() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.server.auth = Some(common::bearer_auth(&"t".repeat(257)));
    assert_invalid(config.validate(), "auth token too long")?;
    Ok(())
}

#[test]
fn token_with_whitespace_is_rejected() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.server.auth = Some(common::bearer_auth("ops token"));
    assert_invalid(config.validate(), "auth token must not contain whitespace")?;
    Ok(())
}

#[test]
fn too_many_principals_are_rejected() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    let mut auth = common::bearer_auth("token-0");
    auth.principals = (0 .. 65)
        .map(|index| PrincipalConfig {
            token: format!("token-{index}"),
            subject: format!("subject-{index}"),
            roles: Vec::new(),
        })
        .collect();
    config.server.auth = Some(auth);
    assert_invalid(config.validate(), "too many auth principals")?;
    Ok(())
}

#[test]
fn duplicate_tokens_are_rejected() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    let mut auth = common::bearer_auth("same");
    auth.principals.push(PrincipalConfig {
        token: "same".to_string(),
        subject: "other".to_string(),
        roles: Vec::new(),
    });
    config.server.auth = Some(auth);
    assert_invalid(config.validate(), "duplicate auth token")?;
    Ok(())
}

#[test]
fn local_only_auth_needs_admin_roles() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    let mut auth = common::bearer_auth("ops-token");
    auth.mode = ServerAuthMode::LocalOnly;
    auth.admin_roles.clear();
    config.server.auth = Some(auth);
    assert_invalid(config.validate(), "auth.admin_roles must not be empty")?;
    Ok(())
}

#[test]
fn short_collect_secret_is_rejected() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.server.collect.secret = Some("short".to_string());
    assert_invalid(config.validate(), "server.collect.secret must be at least 16 characters")?;
    Ok(())
}

#[test]
fn collect_ttl_is_bounded() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.server.collect.token_ttl_secs = 10;
    assert_invalid(config.validate(), "server.collect.token_ttl_secs must be between")?;
    Ok(())
}

#[test]
fn geo_header_must_be_a_header_name() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.server.geo_header = "cf ipcountry".to_string();
    assert_invalid(config.validate(), "server.geo_header must be a header name")?;
    Ok(())
}

#[test]
fn public_url_must_be_http() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.server.public_url = Some("ftp://example.com".to_string());
    assert_invalid(config.validate(), "server.public_url must be an http(s) url")?;
    Ok(())
}

#[test]
fn empty_audit_path_is_rejected() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.server.audit.path = Some("  ".to_string());
    assert_invalid(config.validate(), "audit.path must be non-empty")?;
    Ok(())
}
