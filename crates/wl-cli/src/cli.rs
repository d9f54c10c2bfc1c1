//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Window activity reports.
///
/// Analyzes the window-logger activity log to report per-window focus time,
/// activations, and idle duration distributions per command.
#[derive(Debug, Parser)]
#[command(name = "wl", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the activity log (overrides configuration).
    #[arg(long, global = true)]
    pub log: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Per-window activations and focus time.
    Focus {
        /// Analyze the past N hours (relative to now).
        #[arg(long, conflicts_with = "range")]
        hours: Option<f64>,

        /// Analyze between START and END, each a unix timestamp or an
        /// ISO datetime (e.g. 2025-12-08T10:23:00).
        #[arg(long, num_args = 2, value_names = ["START", "END"])]
        range: Option<Vec<String>>,

        /// Aggregate statistics per command instead of per window.
        #[arg(long)]
        by_command: bool,

        /// Emit JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Idle duration distributions per command.
    Idles {
        /// Analyze the past N hours (relative to now).
        #[arg(long, conflicts_with = "range")]
        hours: Option<f64>,

        /// Analyze between START and END, each a unix timestamp or an
        /// ISO datetime (e.g. 2025-12-08T10:23:00).
        #[arg(long, num_args = 2, value_names = ["START", "END"])]
        range: Option<Vec<String>>,

        /// JSON file mapping commands to minimum idle durations (seconds).
        /// Idle periods shorter than the cutoff for the focused command are
        /// treated as active time.
        #[arg(short = 'c', long)]
        cutoff_file: Option<PathBuf>,

        /// Include idle periods where focus resumes on a different command
        /// than the one active before idling.
        #[arg(long)]
        include_switches: bool,

        /// Skip the box plot, print only the summary table.
        #[arg(long)]
        no_plot: bool,

        /// Emit JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
}
