//! Store, mail, and settings config validation tests for rum-config.
// crates/rum-config/tests/storage_validation.rs
// =============================================================================
// Module: Storage Config Validation Tests
// Description: Validate store backend, mail transport, and settings seeds.
// Purpose: Ensure persistence and outbound mail configuration fail closed.
// =============================================================================

use std::path::PathBuf;

use common::TestResult;
use common::assert_invalid;
use rum_config::MailType;
use rum_config::StoreType;

mod common;

#[test]
fn memory_store_rejects_path() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.store.store_type = StoreType::Memory;
    config.store.path = Some(PathBuf::from("rum.db"));
    assert_invalid(config.validate(), "memory store must not set path")?;
    Ok(())
}

#[test]
fn sqlite_store_requires_path() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.store.store_type = StoreType::Sqlite;
    assert_invalid(config.validate(), "sqlite store requires path")?;
    Ok(())
}

#[test]
fn sqlite_store_rejects_zero_read_pool() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.store.store_type = StoreType::Sqlite;
    config.store.path = Some(PathBuf::from("rum.db"));
    config.store.read_pool_size = 0;
    assert_invalid(config.validate(), "store read_pool_size must be greater than zero")?;
    Ok(())
}

#[test]
fn sqlite_store_rejects_overlong_path_component() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.store.store_type = StoreType::Sqlite;
    config.store.path = Some(PathBuf::from("a".repeat(300)));
    assert_invalid(config.validate(), "store path component too long")?;
    Ok(())
}

#[test]
fn maintenance_every_must_be_positive() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.store.maintenance_every = 0;
    assert_invalid(config.validate(), "store maintenance_every must be greater than zero")?;
    Ok(())
}

#[test]
fn spool_mail_requires_directory() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.mail.mail_type = MailType::Spool;
    assert_invalid(config.validate(), "spool mail requires spool_dir")?;
    config.mail.spool_dir = Some("mail-spool".to_string());
    config.validate().map_err(|err| err.to_string())?;
    Ok(())
}

#[test]
fn mail_addresses_are_validated() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.mail.admin_email = "not-an-address".to_string();
    assert_invalid(config.validate(), "mail.admin_email must be a valid address")?;
    config.mail.admin_email = String::new();
    config.mail.from = "nobody".to_string();
    assert_invalid(config.validate(), "mail.from must be a valid address")?;
    Ok(())
}

#[test]
fn unknown_report_schedule_is_rejected() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.settings.report_schedule = Some("hourly".to_string());
    assert_invalid(config.validate(), "settings.report_schedule must be daily or weekly")?;
    Ok(())
}

#[test]
fn settings_seed_is_clamped() -> TestResult {
    let config = common::config_from_toml(
        "[settings]\nlimit = -5\nsample_rate = 3.5\nalert_min_interval = 10\n",
    )
    .map_err(|err| err.to_string())?;
    config.validate().map_err(|err| err.to_string())?;
    let settings = config.initial_settings();
    if settings.limit != 1 {
        return Err(format!("limit not clamped: {}", settings.limit));
    }
    if (settings.sample_rate - 1.0).abs() > f64::EPSILON {
        return Err(format!("sample_rate not clamped: {}", settings.sample_rate));
    }
    if settings.alert_min_interval != 300 {
        return Err(format!("alert_min_interval not clamped: {}", settings.alert_min_interval));
    }
    Ok(())
}
