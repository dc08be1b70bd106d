//! Config load validation tests for rum-config.
// crates/rum-config/tests/load_validation.rs
// =============================================================================
// Module: Config Load Validation Tests
// Description: Validate config loading guards (path, size, encoding, parse).
// Purpose: Ensure config input handling is strict and fail-closed.
// =============================================================================

use std::io::Write;
use std::path::Path;

use rum_config::ConfigError;
use rum_config::MailType;
use rum_config::RumConfig;
use rum_config::StoreType;
use rum_core::ReportSchedule;
use tempfile::NamedTempFile;

type TestResult = Result<(), String>;

fn assert_invalid(result: Result<RumConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config load".to_string()),
    }
}

fn write_config(content: &str) -> Result<NamedTempFile, String> {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(content.as_bytes()).map_err(|err| err.to_string())?;
    Ok(file)
}

#[test]
fn load_rejects_path_too_long() -> TestResult {
    let long_path = "a".repeat(5_000);
    let path = Path::new(&long_path);
    assert_invalid(RumConfig::load(Some(path)), "config path exceeds max length")?;
    Ok(())
}

#[test]
fn load_rejects_path_component_too_long() -> TestResult {
    let long_component = "a".repeat(300);
    let path = Path::new(&long_component);
    assert_invalid(RumConfig::load(Some(path)), "config path component too long")?;
    Ok(())
}

#[test]
fn load_reports_missing_file_as_io_error() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("missing.toml");
    assert_invalid(RumConfig::load(Some(&path)), "config io error")?;
    Ok(())
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    let payload = vec![b'a'; 1_048_577];
    file.write_all(&payload).map_err(|err| err.to_string())?;
    assert_invalid(RumConfig::load(Some(file.path())), "config file exceeds size limit")?;
    Ok(())
}

#[test]
fn load_rejects_non_utf8_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(&[0xFF, 0xFE, 0xFF]).map_err(|err| err.to_string())?;
    assert_invalid(RumConfig::load(Some(file.path())), "config file must be utf-8")?;
    Ok(())
}

#[test]
fn load_rejects_malformed_toml() -> TestResult {
    let file = write_config("[server\nbind = ")?;
    assert_invalid(RumConfig::load(Some(file.path())), "config parse error")?;
    Ok(())
}

#[test]
fn load_rejects_unknown_store_type() -> TestResult {
    let file = write_config("[store]\ntype = \"postgres\"\n")?;
    assert_invalid(RumConfig::load(Some(file.path())), "config parse error")?;
    Ok(())
}

#[test]
fn load_runs_validation() -> TestResult {
    let file = write_config("[store]\ntype = \"sqlite\"\n")?;
    assert_invalid(RumConfig::load(Some(file.path())), "sqlite store requires path")?;
    Ok(())
}

#[test]
fn load_accepts_full_example() -> TestResult {
    let file = write_config(
        r#"
[server]
bind = "0.0.0.0:8080"
namespace = "/rum/v1"
max_body_bytes = 65536
geo_header = "cf-ipcountry"

[server.collect]
secret = "0123456789abcdef0123"
token_ttl_secs = 86400

[server.auth]
mode = "bearer_token"
admin_roles = ["administrator"]
[[server.auth.principals]]
token = "ops-token"
subject = "ops"
roles = ["administrator"]

[server.audit]
enabled = true

[store]
type = "sqlite"
path = "rum.db"
journal_mode = "wal"
sync_mode = "normal"
maintenance_every = 10

[mail]
type = "spool"
from = "rum@example.com"
site_name = "Shop"
admin_email = "ops@example.com"
spool_dir = "mail-spool"

[settings]
limit = 5000
retention_days = 0
report_schedule = "weekly"
excluded_roles = "administrator, editor"
"#,
    )?;
    let config = RumConfig::load(Some(file.path())).map_err(|err| err.to_string())?;
    if config.store.store_type != StoreType::Sqlite || config.store.maintenance_every != 10 {
        return Err("store section not parsed".to_string());
    }
    if config.mail.mail_type != MailType::Spool {
        return Err("mail section not parsed".to_string());
    }
    let settings = config.initial_settings();
    if settings.limit != 5000 || settings.retention_days != 1 {
        return Err(format!("unexpected settings: {} {}", settings.limit, settings.retention_days));
    }
    if settings.report_schedule != ReportSchedule::Weekly {
        return Err("report schedule not applied".to_string());
    }
    if settings.excluded_roles != vec!["administrator".to_string(), "editor".to_string()] {
        return Err("excluded roles not split".to_string());
    }
    Ok(())
}
