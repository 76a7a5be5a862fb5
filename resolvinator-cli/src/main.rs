//! # Resolvinator CLI
//!
//! Command-line client for the Resolvinator real-time channels.
//!
//! This CLI provides commands for:
//! - Listening to project, broadcast and user streams
//! - Checking a client configuration before deploying it
//! - Showing protocol defaults

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod commands;
mod settings;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use resolvinator_telemetry::logging::{LogFormat, init_logging};

use commands::{check, info, listen};
use settings::Settings;

/// Resolvinator - real-time channel client
#[derive(Parser)]
#[command(name = "resolvinator")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path (.yaml, .toml or .json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Server base URL, overrides the configuration file
    #[arg(long, global = true, env = "RESOLVINATOR_BASE_URL")]
    base_url: Option<String>,

    /// Authentication token, overrides the configuration file
    #[arg(long, global = true, env = "RESOLVINATOR_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Log output format
    #[arg(long, global = true, value_parser = ["json", "pretty"])]
    log_format: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Connect and print events as JSON lines
    Listen(listen::ListenArgs),

    /// Validate the configuration and show the effective settings
    CheckConfig(check::CheckArgs),

    /// Show client information
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref()).with_context(|| match &cli.config {
        Some(path) => format!("Failed to load {}", path.display()),
        None => "Failed to read environment overrides".to_string(),
    })?;
    settings.override_connection(cli.base_url, cli.token);

    if cli.verbose {
        settings.logging.level = "debug".to_string();
    }
    match cli.log_format.as_deref() {
        Some("json") => settings.logging.format = LogFormat::Json,
        Some("pretty") => settings.logging.format = LogFormat::Pretty,
        _ => {}
    }
    let _guards = init_logging(&settings.logging).context("Failed to initialize logging")?;

    match cli.command {
        Commands::Listen(args) => listen::run(args, settings).await?,
        Commands::CheckConfig(args) => check::run(&args, &settings)?,
        Commands::Info => info::run(),
    }

    Ok(())
}
