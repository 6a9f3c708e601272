//! Gatekeeper CLI - Command-line interface for Gatekeeper RBAC policies.
//!
//! Provides commands to lint policy files, evaluate authorization queries,
//! inspect role hierarchies and export the bundled presets.

mod commands;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::{check, preset, roles, validate};
use gatekeeper_core::logging::init_logging;
use gatekeeper_core::settings::Settings;
use output::OutputFormat;

/// Gatekeeper - Role-Based Access Control Decision Engine CLI
#[derive(Parser)]
#[command(
    name = "gatekeeper",
    author = "Aezi <aezi.zhu@icloud.com>",
    version = "0.1.0",
    about = "Gatekeeper - Role-Based Access Control Decision Engine",
    long_about = "CLI tool for validating RBAC policies and evaluating authorization decisions.",
    propagate_version = true
)]
pub struct Cli {
    /// Output format
    #[arg(short, long, global = true, default_value = "table")]
    output: OutputFormat,

    /// Settings file naming a default policy and logging options
    #[arg(long, global = true, env = "GATEKEEPER_CONFIG")]
    config: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a policy file
    Validate(validate::ValidateArgs),

    /// Evaluate whether a subject may perform an action on a resource
    Check(check::CheckArgs),

    /// Check a role against a minimum required role
    RequireRole(check::RequireRoleArgs),

    /// Show the role hierarchy and capabilities of a policy
    Roles(roles::RolesArgs),

    /// Bundled policy presets
    #[command(subcommand)]
    Preset(preset::PresetCommands),
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => {
            let path_str = path
                .to_str()
                .with_context(|| format!("Settings path is not valid UTF-8: {}", path.display()))?;
            Settings::from_file(path_str)
                .with_context(|| format!("Failed to load settings from {}", path.display()))?
        }
        None => Settings::load().context("Failed to load settings from environment")?,
    };

    if let Some(level) = &cli.log_level {
        settings.logging.level = level.clone();
    }
    Ok(settings)
}

fn run(cli: Cli) -> Result<()> {
    let settings = load_settings(&cli)?;
    init_logging(&settings.logging).context("Failed to initialize logging")?;

    let format = cli.output;
    match cli.command {
        Commands::Validate(args) => validate::execute(args, &settings, format),
        Commands::Check(args) => check::execute(args, &settings, format),
        Commands::RequireRole(args) => check::execute_require_role(args, &settings, format),
        Commands::Roles(args) => roles::execute(args, &settings, format),
        Commands::Preset(cmd) => preset::execute(cmd, format),
    }
}

fn main() {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    if let Err(e) = run(cli) {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}
