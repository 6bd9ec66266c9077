//! CLI entry point.
//!
//! Parses arguments, installs logging and dispatches to a handler. Handler
//! errors become sysexits-style exit codes.

use clap::{CommandFactory, Parser};
use console::style;
use tracing_subscriber::EnvFilter;

use lector_cli::{Cli, CliError, Commands, handlers};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables before clap reads LECTOR_* fallbacks
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let Some(command) = cli.command else {
        // No command provided - show help
        Cli::command().print_help()?;
        return Ok(());
    };

    if let Err(e) = run(command).await {
        eprintln!("{} {e}", style("error:").red().bold());
        std::process::exit(e.exit_code());
    }

    Ok(())
}

async fn run(command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Speak { source, synth } => handlers::speak::execute(&source, &synth).await,
        Commands::Segment { source } => handlers::segment::execute(&source),
        Commands::Translate { args } => handlers::translate::execute(&args).await,
    }
}

/// Log to stderr. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
