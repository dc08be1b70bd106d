// crates/rum-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for argument parsing and filter construction.
// Purpose: Keep the command surface stable.
// Dependencies: rum-cli main helpers
// ============================================================================

//! ## Overview
//! Parses representative command lines and checks the derived stats filter.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only panic-based assertions are permitted."
)]

use clap::CommandFactory;
use clap::Parser;

use super::Cli;
use super::Commands;
use super::ConfigCommand;
use super::MaintenanceCommand;
use super::ReportCommand;
use super::stats_filter;

#[test]
fn command_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn stats_arguments_build_a_normalized_filter() {
    let cli = Cli::try_parse_from([
        "rum-monitor",
        "stats",
        "--config",
        "rum.toml",
        "--url",
        "  /shop ",
        "--device",
        "mobile",
        "--net",
        "",
    ])
    .unwrap();
    let Some(Commands::Stats(command)) = cli.command else {
        panic!("expected stats command");
    };
    assert_eq!(command.config.config.as_deref(), Some(std::path::Path::new("rum.toml")));
    let filter = stats_filter(&command);
    assert_eq!(filter.url_contains.as_deref(), Some("/shop"));
    assert_eq!(filter.device.as_deref(), Some("mobile"));
    assert_eq!(filter.net, None);
    assert_eq!(filter.session_id, None);
}

#[test]
fn nested_subcommands_parse() {
    let cli = Cli::try_parse_from(["rum-monitor", "report", "send"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Report {
            command: ReportCommand::Send(_)
        })
    ));
    let cli = Cli::try_parse_from(["rum-monitor", "maintenance", "run", "--config", "a.toml"])
        .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Maintenance {
            command: MaintenanceCommand::Run(_)
        })
    ));
    let cli = Cli::try_parse_from(["rum-monitor", "config", "validate"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Config {
            command: ConfigCommand::Validate(_)
        })
    ));
}

#[test]
fn uninstall_confirmation_flag_parses() {
    let cli = Cli::try_parse_from(["rum-monitor", "uninstall"]).unwrap();
    let Some(Commands::Uninstall(command)) = cli.command else {
        panic!("expected uninstall command");
    };
    assert!(!command.yes);
    let cli = Cli::try_parse_from(["rum-monitor", "uninstall", "--yes"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Uninstall(command)) if command.yes));
}

#[test]
fn unknown_commands_are_rejected() {
    assert!(Cli::try_parse_from(["rum-monitor", "purge"]).is_err());
    assert!(Cli::try_parse_from(["rum-monitor", "stats", "--limit", "3"]).is_err());
}

#[test]
fn version_flag_is_global() {
    let cli = Cli::try_parse_from(["rum-monitor", "--version"]).unwrap();
    assert!(cli.show_version);
    assert!(cli.command.is_none());
}
