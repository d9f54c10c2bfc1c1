use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use wl_cli::commands::{focus, idles, util};
use wl_cli::{Cli, Commands, Config};

/// Resolves the activity log path from the CLI flag or configuration.
fn resolve_log_path(cli: &Cli, config: &Config) -> PathBuf {
    cli.log
        .clone()
        .unwrap_or_else(|| config.log_path.clone())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let config =
        Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    match &cli.command {
        Some(Commands::Focus {
            hours,
            range,
            by_command,
            json,
        }) => {
            let span = util::resolve_span(*hours, range.as_deref())?;
            let log_path = resolve_log_path(&cli, &config);
            focus::run(&log_path, span, *by_command, *json)?;
        }
        Some(Commands::Idles {
            hours,
            range,
            cutoff_file,
            include_switches,
            no_plot,
            json,
        }) => {
            let span = util::resolve_span(*hours, range.as_deref())?;
            let log_path = resolve_log_path(&cli, &config);
            let cutoff_path = cutoff_file.as_deref().or(config.cutoff_path.as_deref());
            idles::run(
                &log_path,
                span,
                cutoff_path,
                *include_switches,
                *no_plot,
                *json,
            )?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
