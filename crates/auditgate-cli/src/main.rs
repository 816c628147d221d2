//! # auditgate CLI Entry Point
//!
//! Assembles subcommands and dispatches to handler modules.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use auditgate_cli::{check, validate};

/// auditgate — compliance audit policy evaluator.
///
/// Validates compliance settings files and evaluates individual audit
/// decisions against them.
#[derive(Parser, Debug)]
#[command(name = "auditgate", version, about)]
struct Cli {
    /// Compliance settings file (YAML or JSON).
    #[arg(long, short, env = "AUDITGATE_SETTINGS")]
    settings: PathBuf,

    /// Emit JSON instead of plain text.
    #[arg(long, global = true)]
    json: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Build the evaluator from the settings file and summarise it.
    Validate(validate::ValidateArgs),
    /// Print the audit index the sink is writing to right now.
    AuditIndex,
    /// Is write history recorded for an index?
    Write(check::WriteArgs),
    /// Is read history recorded for an index or field?
    Read(check::ReadArgs),
    /// Is an index write-protected?
    Immutable(check::ImmutableArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::from_default_env();
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    match run(&cli) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(auditgate_cli::exit_code(&e))
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<String> {
    let config = auditgate_cli::load_config(&cli.settings)?;

    match &cli.command {
        Commands::Validate(args) => validate::run_validate(&config, args),
        Commands::AuditIndex => check::run_audit_index(&config, cli.json),
        Commands::Write(args) => check::run_write(&config, args, cli.json),
        Commands::Read(args) => check::run_read(&config, args, cli.json),
        Commands::Immutable(args) => check::run_immutable(&config, args, cli.json),
    }
}
