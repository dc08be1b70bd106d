// crates/rum-cli/src/main.rs
// ============================================================================
// Module: RUM Monitor CLI Entry Point
// Description: Command dispatcher for the server and offline store tasks.
// Purpose: Run the gateway and perform report, maintenance, and stats tasks.
// Dependencies: clap, rum-config, rum-core, rum-server, serde_json, thiserror, tokio
// ============================================================================

//! ## Overview
//! `rum-monitor serve` runs the ingest gateway with the report scheduler.
//! `uninstall --yes` wipes rows, settings, and scheduler bookkeeping.
//! The remaining commands open the configured store directly, so they are
//! only meaningful with the sqlite backend; against the memory backend they
//! see an empty store. Output is JSON on stdout; errors go to stderr with a
//! failing exit code.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use rum_config::RumConfig;
use rum_core::EventTime;
use rum_core::LogFilter;
use rum_core::MailOutcome;
use rum_core::ReportComposer;
use rum_core::Settings;
use rum_core::SettingsAccessor;
use rum_server::REPORT_FAILURE_MESSAGE;
use rum_server::RumServer;
use rum_server::ServerBackends;
use rum_server::reset_monitor;
use rum_server::run_maintenance;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "rum-monitor", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the ingest gateway and report scheduler.
    Serve(ConfigArgs),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Summary report utilities.
    Report {
        /// Selected report subcommand.
        #[command(subcommand)]
        command: ReportCommand,
    },
    /// Retention maintenance utilities.
    Maintenance {
        /// Selected maintenance subcommand.
        #[command(subcommand)]
        command: MaintenanceCommand,
    },
    /// Print aggregate statistics as JSON.
    Stats(StatsCommand),
    /// Delete all stored rows, settings, and scheduler state.
    Uninstall(UninstallCommand),
}

/// Config file selection shared by every command.
#[derive(Args, Debug, Clone, Default)]
struct ConfigArgs {
    /// Config file path (defaults to `RUM_MONITOR_CONFIG` or `rum-monitor.toml`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate the config file.
    Validate(ConfigArgs),
}

/// Report subcommands.
#[derive(Subcommand, Debug)]
enum ReportCommand {
    /// Send the summary report now.
    Send(ConfigArgs),
}

/// Maintenance subcommands.
#[derive(Subcommand, Debug)]
enum MaintenanceCommand {
    /// Purge rows past retention, then evict down to the row limit.
    Run(ConfigArgs),
}

/// Stats command arguments.
#[derive(Args, Debug)]
struct StatsCommand {
    /// Config file selection.
    #[command(flatten)]
    config: ConfigArgs,
    /// Exact session id.
    #[arg(long = "session-id", value_name = "ID")]
    session_id: Option<String>,
    /// Case-insensitive URL substring.
    #[arg(long, value_name = "TEXT")]
    url: Option<String>,
    /// Exact device class.
    #[arg(long, value_name = "DEVICE")]
    device: Option<String>,
    /// Exact network type.
    #[arg(long, value_name = "NET")]
    net: Option<String>,
}

/// Uninstall command arguments.
#[derive(Args, Debug)]
struct UninstallCommand {
    /// Config file selection.
    #[command(flatten)]
    config: ConfigArgs,
    /// Confirm deletion of all stored data.
    #[arg(long)]
    yes: bool,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    if cli.show_version {
        write_stdout_line(&format!("rum-monitor {}", env!("CARGO_PKG_VERSION")))?;
        return Ok(ExitCode::SUCCESS);
    }
    let Some(command) = cli.command else {
        return Err(CliError::new("no command given; see --help".to_string()));
    };
    match command {
        Commands::Serve(args) => command_serve(args).await,
        Commands::Config {
            command: ConfigCommand::Validate(args),
        } => command_config_validate(&args),
        Commands::Report {
            command: ReportCommand::Send(args),
        } => command_report_send(&args),
        Commands::Maintenance {
            command: MaintenanceCommand::Run(args),
        } => command_maintenance_run(&args),
        Commands::Stats(command) => command_stats(&command),
        Commands::Uninstall(command) => command_uninstall(&command),
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(args: ConfigArgs) -> CliResult<ExitCode> {
    let config = load_config(&args)?;
    let bind = config.server.bind.trim().to_string();
    let server = tokio::task::spawn_blocking(move || RumServer::from_config(config))
        .await
        .map_err(|err| CliError::new(format!("server init failed: init join failed: {err}")))?
        .map_err(|err| CliError::new(format!("server init failed: {err}")))?;
    write_stderr_line(&format!("rum-monitor listening on {bind}"))?;
    server.serve().await.map_err(|err| CliError::new(format!("server failed: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `config validate` command.
fn command_config_validate(args: &ConfigArgs) -> CliResult<ExitCode> {
    load_config(args)?;
    write_stdout_line("config valid")?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `report send` command.
fn command_report_send(args: &ConfigArgs) -> CliResult<ExitCode> {
    let offline = OfflineContext::open(args)?;
    let composer = ReportComposer::new(
        offline.backends.store.clone(),
        offline.backends.mail.clone(),
        offline.config.mail.admin_email.trim(),
        offline.config.mail.site_name.trim(),
    );
    let outcome = composer
        .send_summary(&offline.settings)
        .map_err(|err| CliError::new(format!("report failed: {err}")))?;
    match outcome {
        MailOutcome::Sent => {
            write_json(&json!({"status": "sent"}))?;
            Ok(ExitCode::SUCCESS)
        }
        MailOutcome::Failed(err) => {
            write_json(&json!({"status": "failed", "message": REPORT_FAILURE_MESSAGE}))?;
            write_stderr_line(&format!("report delivery failed: {err}"))?;
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Executes the `maintenance run` command.
fn command_maintenance_run(args: &ConfigArgs) -> CliResult<ExitCode> {
    let offline = OfflineContext::open(args)?;
    let report =
        run_maintenance(offline.backends.store.as_ref(), &offline.settings, EventTime::now())
            .map_err(|err| CliError::new(format!("maintenance failed: {err}")))?;
    write_json(&json!({"purged": report.purged, "evicted": report.evicted}))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `stats` command.
fn command_stats(command: &StatsCommand) -> CliResult<ExitCode> {
    let offline = OfflineContext::open(&command.config)?;
    let report = offline
        .backends
        .store
        .stats(&stats_filter(command))
        .map_err(|err| CliError::new(format!("stats failed: {err}")))?;
    let value = serde_json::to_value(&report)
        .map_err(|err| CliError::new(format!("stats encoding failed: {err}")))?;
    write_json(&value)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `uninstall` command.
fn command_uninstall(command: &UninstallCommand) -> CliResult<ExitCode> {
    if !command.yes {
        return Err(CliError::new(
            "uninstall deletes all stored data; pass --yes to confirm".to_string(),
        ));
    }
    let config = load_config(&command.config)?;
    let backends = ServerBackends::from_config(&config)
        .map_err(|err| CliError::new(format!("store open failed: {err}")))?;
    let settings = SettingsAccessor::new(backends.options.clone(), config.initial_settings());
    let removed = reset_monitor(backends.store.as_ref(), &settings, backends.options.as_ref())
        .map_err(|err| CliError::new(format!("uninstall failed: {err}")))?;
    write_json(&json!({"status": "uninstalled", "removed_rows": removed}))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Offline Store Access
// ============================================================================

/// Config, backends, and effective settings for offline commands.
struct OfflineContext {
    /// Loaded configuration.
    config: RumConfig,
    /// Configured backends.
    backends: ServerBackends,
    /// Persisted settings, falling back to configured initial settings.
    settings: Settings,
}

impl OfflineContext {
    /// Loads config and opens the configured backends.
    fn open(args: &ConfigArgs) -> CliResult<Self> {
        let config = load_config(args)?;
        let backends = ServerBackends::from_config(&config)
            .map_err(|err| CliError::new(format!("store open failed: {err}")))?;
        let settings = SettingsAccessor::new(backends.options.clone(), config.initial_settings())
            .get()
            .map_err(|err| CliError::new(format!("settings load failed: {err}")))?;
        Ok(Self {
            config,
            backends,
            settings,
        })
    }
}

/// Loads and validates the config file.
fn load_config(args: &ConfigArgs) -> CliResult<RumConfig> {
    RumConfig::load(args.config.as_deref())
        .map_err(|err| CliError::new(format!("config load failed: {err}")))
}

/// Builds the stats filter from command arguments.
fn stats_filter(command: &StatsCommand) -> LogFilter {
    LogFilter {
        session_id: command.session_id.clone(),
        url_contains: command.url.clone(),
        device: command.device.clone(),
        net: command.net.clone(),
    }
    .normalized()
}

// ============================================================================
// SECTION: Output
// ============================================================================

/// Writes pretty JSON to stdout.
fn write_json(value: &Value) -> CliResult<()> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::new(format!("output encoding failed: {err}")))?;
    write_stdout_line(&rendered)
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
        .map_err(|err| CliError::new(format!("failed to write stdout: {err}")))
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> CliResult<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
        .map_err(|err| CliError::new(format!("failed to write stderr: {err}")))
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
