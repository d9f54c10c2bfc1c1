//! Idles command: idle duration distributions per command.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use wl_core::{AccountOptions, CutoffPolicy, QuerySpan, account, read_log};

use super::plot::render_box_plots;
use super::util::{format_bound, mean, quantile};

const PLOT_WIDTH: usize = 60;

#[derive(Debug, Serialize)]
struct DistributionSummary {
    count: usize,
    mean: f64,
    median: f64,
    q1: f64,
    q3: f64,
    samples: Vec<f64>,
}

impl DistributionSummary {
    fn from_sorted(sorted: Vec<f64>) -> Self {
        Self {
            count: sorted.len(),
            mean: mean(&sorted),
            median: quantile(&sorted, 0.5),
            q1: quantile(&sorted, 0.25),
            q3: quantile(&sorted, 0.75),
            samples: sorted,
        }
    }
}

fn summarize(durations: &BTreeMap<String, Vec<f64>>) -> BTreeMap<String, DistributionSummary> {
    durations
        .iter()
        .filter(|(_, samples)| !samples.is_empty())
        .map(|(cmd, samples)| {
            let mut sorted = samples.clone();
            sorted.sort_by(f64::total_cmp);
            (cmd.clone(), DistributionSummary::from_sorted(sorted))
        })
        .collect()
}

/// Formats the per-command idle summary table. The command column grows
/// to fit the longest name.
fn format_summary_table(
    summaries: &BTreeMap<String, DistributionSummary>,
    span: QuerySpan,
) -> String {
    let mut out = String::new();
    writeln!(
        out,
        "Time window: {} - {} (unix seconds)",
        format_bound(span.start()),
        format_bound(span.end())
    )
    .unwrap();
    writeln!(out).unwrap();

    if summaries.is_empty() {
        writeln!(out, "No idle durations found for the specified time window.").unwrap();
        return out;
    }

    let cmd_width = summaries
        .keys()
        .map(String::len)
        .max()
        .unwrap_or(0)
        .max("Command".len());

    writeln!(
        out,
        "{:<cmd_width$}  {:>5}  {:>9}  {:>10}  {:>8}  {:>8}",
        "Command", "Count", "Mean (s)", "Median (s)", "25% (s)", "75% (s)"
    )
    .unwrap();
    writeln!(out, "{}", "-".repeat(cmd_width + 50)).unwrap();

    for (cmd, summary) in summaries {
        writeln!(
            out,
            "{:<cmd_width$}  {:>5}  {:>9.1}  {:>10.1}  {:>8.1}  {:>8.1}",
            cmd, summary.count, summary.mean, summary.median, summary.q1, summary.q3
        )
        .unwrap();
    }

    out
}

#[derive(Debug, Serialize)]
struct JsonIdlesReport<'a> {
    span: JsonSpan,
    commands: &'a BTreeMap<String, DistributionSummary>,
}

#[derive(Debug, Serialize)]
struct JsonSpan {
    start: Option<f64>,
    end: Option<f64>,
}

/// Runs the idles command.
pub fn run(
    log_path: &Path,
    span: QuerySpan,
    cutoff_path: Option<&Path>,
    include_switches: bool,
    no_plot: bool,
    json: bool,
) -> Result<()> {
    let cutoffs = match cutoff_path {
        Some(path) => CutoffPolicy::load(path)
            .with_context(|| format!("failed to load cutoff file {}", path.display()))?,
        None => CutoffPolicy::default(),
    };
    if !cutoffs.is_empty() {
        tracing::debug!("applying cutoff policy");
    }

    let events = read_log(log_path).context("failed to read activity log")?;
    tracing::debug!(events = events.len(), "loaded activity log");

    let result = account(
        &events,
        AccountOptions {
            span,
            cutoffs,
            include_switches,
        },
    );
    let summaries = summarize(&result.idle_durations);

    if json {
        let report = JsonIdlesReport {
            span: JsonSpan {
                start: span.start().is_finite().then_some(span.start()),
                end: span.end().is_finite().then_some(span.end()),
            },
            commands: &summaries,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print!("{}", format_summary_table(&summaries, span));

    if !no_plot && !summaries.is_empty() {
        let sorted: BTreeMap<String, Vec<f64>> = summaries
            .iter()
            .map(|(cmd, s)| (cmd.clone(), s.samples.clone()))
            .collect();
        println!();
        print!("{}", render_box_plots(&sorted, PLOT_WIDTH));
    }

    Ok(())
}
