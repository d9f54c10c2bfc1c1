//! Focus command: per-window activations and focus time.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use wl_core::{
    AccountOptions, AccountingResult, CommandStats, EntityId, QuerySpan, Totals, account,
    group_by_command, read_log,
};

use super::util::{format_bound, format_hms};

const TITLE_WIDTH: usize = 40;

/// Truncates a cell value to `width` characters, marking the cut with `...`.
fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() > width {
        let head: String = value.chars().take(width - 3).collect();
        format!("{head}...")
    } else {
        value.to_string()
    }
}

fn span_header(span: QuerySpan) -> String {
    format!(
        "Time window: {} - {} (unix seconds)",
        format_bound(span.start()),
        format_bound(span.end())
    )
}

fn totals_line(totals: &Totals, focus_total: f64) -> String {
    format!(
        "Totals: focus {}, idle {}, locked {}, stopped {}",
        format_hms(focus_total),
        format_hms(totals.idle_seconds),
        format_hms(totals.locked_seconds),
        format_hms(totals.stopped_seconds),
    )
}

/// Formats the per-window report, sorted by focus time descending.
pub fn format_focus_table(result: &AccountingResult, span: QuerySpan) -> String {
    let mut out = String::new();
    writeln!(out, "{}", span_header(span)).unwrap();
    writeln!(out).unwrap();

    if result.entities.is_empty() {
        writeln!(out, "No data in the specified time range.").unwrap();
        return out;
    }

    let mut rows: Vec<_> = result.entities.iter().collect();
    rows.sort_by(|(a_id, a), (b_id, b)| {
        b.focus_seconds
            .total_cmp(&a.focus_seconds)
            .then_with(|| a_id.cmp(b_id))
    });

    writeln!(
        out,
        "{:<20}  {:<40}  {:>11}  {:>9}  {:>9}",
        "Hash", "Title", "Activations", "Focus", "Idle"
    )
    .unwrap();
    writeln!(out, "{}", "-".repeat(97)).unwrap();

    let mut focus_total = 0.0;
    for (id, stats) in rows {
        focus_total += stats.focus_seconds;
        let title = truncate(stats.title.as_deref().unwrap_or("<unknown>"), TITLE_WIDTH);
        writeln!(
            out,
            "{:<20}  {:<40}  {:>11}  {:>9}  {:>9}",
            truncate(id.as_str(), 20),
            title,
            stats.activations,
            format_hms(stats.focus_seconds),
            format_hms(stats.idle_seconds),
        )
        .unwrap();
    }

    writeln!(out).unwrap();
    writeln!(out, "{}", totals_line(&result.totals, focus_total)).unwrap();
    out
}

/// Formats the per-command aggregation, sorted by focus time descending.
pub fn format_command_table(
    groups: &BTreeMap<String, CommandStats>,
    totals: &Totals,
    span: QuerySpan,
) -> String {
    let mut out = String::new();
    writeln!(out, "{}", span_header(span)).unwrap();
    writeln!(out).unwrap();

    if groups.is_empty() {
        writeln!(out, "No data in the specified time range.").unwrap();
        return out;
    }

    let mut rows: Vec<_> = groups.iter().collect();
    rows.sort_by(|(a_cmd, a), (b_cmd, b)| {
        b.focus_seconds
            .total_cmp(&a.focus_seconds)
            .then_with(|| a_cmd.cmp(b_cmd))
    });

    writeln!(
        out,
        "{:<40}  {:>7}  {:>11}  {:>9}  {:>9}",
        "Command", "Windows", "Activations", "Focus", "Idle"
    )
    .unwrap();
    writeln!(out, "{}", "-".repeat(84)).unwrap();

    let mut focus_total = 0.0;
    for (cmd, stats) in rows {
        focus_total += stats.focus_seconds;
        writeln!(
            out,
            "{:<40}  {:>7}  {:>11}  {:>9}  {:>9}",
            truncate(cmd, TITLE_WIDTH),
            stats.windows,
            stats.activations,
            format_hms(stats.focus_seconds),
            format_hms(stats.idle_seconds),
        )
        .unwrap();
    }

    writeln!(out).unwrap();
    writeln!(out, "{}", totals_line(totals, focus_total)).unwrap();
    out
}

// ========== JSON Output ==========

#[derive(Debug, Serialize)]
struct JsonSpan {
    start: Option<f64>,
    end: Option<f64>,
}

impl JsonSpan {
    fn new(span: QuerySpan) -> Self {
        Self {
            start: span.start().is_finite().then_some(span.start()),
            end: span.end().is_finite().then_some(span.end()),
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonWindow<'a> {
    hash: &'a EntityId,
    title: Option<&'a str>,
    cmd: Option<&'a str>,
    activations: u64,
    focus_seconds: f64,
    idle_seconds: f64,
}

#[derive(Debug, Serialize)]
struct JsonFocusReport<'a> {
    span: JsonSpan,
    windows: Vec<JsonWindow<'a>>,
    totals: &'a Totals,
}

#[derive(Debug, Serialize)]
struct JsonCommandReport<'a> {
    span: JsonSpan,
    commands: &'a BTreeMap<String, CommandStats>,
    totals: &'a Totals,
}

fn format_focus_json(result: &AccountingResult, span: QuerySpan) -> Result<String> {
    let mut windows: Vec<JsonWindow<'_>> = result
        .entities
        .iter()
        .map(|(id, stats)| JsonWindow {
            hash: id,
            title: stats.title.as_deref(),
            cmd: stats.cmd.as_deref(),
            activations: stats.activations,
            focus_seconds: stats.focus_seconds,
            idle_seconds: stats.idle_seconds,
        })
        .collect();
    windows.sort_by(|a, b| {
        b.focus_seconds
            .total_cmp(&a.focus_seconds)
            .then_with(|| a.hash.cmp(b.hash))
    });

    let report = JsonFocusReport {
        span: JsonSpan::new(span),
        windows,
        totals: &result.totals,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

// ========== Public Interface ==========

/// Runs the focus command.
pub fn run(log_path: &Path, span: QuerySpan, by_command: bool, json: bool) -> Result<()> {
    let events = read_log(log_path).context("failed to read activity log")?;
    tracing::debug!(events = events.len(), "loaded activity log");

    let result = account(
        &events,
        AccountOptions {
            span,
            ..AccountOptions::default()
        },
    );

    if by_command {
        let groups = group_by_command(&result);
        if json {
            let report = JsonCommandReport {
                span: JsonSpan::new(span),
                commands: &groups,
                totals: &result.totals,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print!("{}", format_command_table(&groups, &result.totals, span));
        }
    } else if json {
        println!("{}", format_focus_json(&result, span)?);
    } else {
        print!("{}", format_focus_table(&result, span));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;
    use wl_core::EntityStats;

    use super::*;

    fn id(s: &str) -> EntityId {
        EntityId::new(s).unwrap()
    }

    fn stats(
        title: Option<&str>,
        cmd: Option<&str>,
        activations: u64,
        focus: f64,
        idle: f64,
    ) -> EntityStats {
        EntityStats {
            title: title.map(str::to_owned),
            cmd: cmd.map(str::to_owned),
            activations,
            focus_seconds: focus,
            idle_seconds: idle,
        }
    }

    fn sample_result() -> AccountingResult {
        let mut result = AccountingResult::default();
        result.entities.insert(
            id("aaa"),
            stats(Some("Editor"), Some("/usr/bin/vim"), 1, 100.0, 0.0),
        );
        result
            .entities
            .insert(id("bbb"), stats(Some("Browser"), None, 3, 60.0, 30.0));
        result.totals.idle_seconds = 30.0;
        result
    }

    #[test]
    fn truncate_leaves_short_values_alone() {
        assert_eq!(truncate("short", 40), "short");
        assert_eq!(truncate(&"x".repeat(40), 40), "x".repeat(40));
    }

    #[test]
    fn truncate_marks_long_values() {
        let long = "y".repeat(50);
        let cell = truncate(&long, 40);
        assert_eq!(cell.chars().count(), 40);
        assert!(cell.ends_with("..."));
    }

    #[test]
    fn empty_result_prints_no_data() {
        let out = format_focus_table(
            &AccountingResult::default(),
            QuerySpan::new(0.0, 1000.0).unwrap(),
        );
        assert_snapshot!(out, @r"
        Time window: 0 - 1000 (unix seconds)

        No data in the specified time range.
        ");
    }

    #[test]
    fn table_sorts_by_focus_descending() {
        let out = format_focus_table(&sample_result(), QuerySpan::unbounded());
        let aaa_pos = out.find("aaa").unwrap();
        let bbb_pos = out.find("bbb").unwrap();
        assert!(aaa_pos < bbb_pos, "aaa (100s) should come before bbb (60s)");
    }

    #[test]
    fn table_rows_are_fixed_width() {
        let out = format_focus_table(&sample_result(), QuerySpan::unbounded());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Time window: -inf - +inf (unix seconds)");
        assert_eq!(
            lines[2],
            format!(
                "{:<20}  {:<40}  {:>11}  {:>9}  {:>9}",
                "Hash", "Title", "Activations", "Focus", "Idle"
            )
        );
        assert_eq!(
            lines[4],
            format!(
                "{:<20}  {:<40}  {:>11}  {:>9}  {:>9}",
                "aaa", "Editor", 1, "00:01:40", "00:00:00"
            )
        );
        assert_eq!(
            lines[5],
            format!(
                "{:<20}  {:<40}  {:>11}  {:>9}  {:>9}",
                "bbb", "Browser", 3, "00:01:00", "00:00:30"
            )
        );
    }

    #[test]
    fn totals_line_includes_all_buckets() {
        let out = format_focus_table(&sample_result(), QuerySpan::unbounded());
        assert!(out.ends_with(
            "Totals: focus 00:02:40, idle 00:00:30, locked 00:00:00, stopped 00:00:00\n"
        ));
    }

    #[test]
    fn command_table_groups_and_sorts() {
        let result = sample_result();
        let groups = group_by_command(&result);
        let out = format_command_table(&groups, &result.totals, QuerySpan::unbounded());
        assert!(out.contains("/usr/bin/vim"));
        assert!(out.contains(wl_core::UNKNOWN_COMMAND));
        let vim_pos = out.find("/usr/bin/vim").unwrap();
        let unknown_pos = out.find(wl_core::UNKNOWN_COMMAND).unwrap();
        assert!(vim_pos < unknown_pos);
    }

    #[test]
    fn json_report_is_well_formed() {
        let out = format_focus_json(&sample_result(), QuerySpan::new(0.0, 1000.0).unwrap()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["windows"].as_array().unwrap().len(), 2);
        assert_eq!(value["windows"][0]["hash"], "aaa");
        assert_eq!(value["span"]["start"], 0.0);
    }

    #[test]
    fn json_unbounded_span_is_null() {
        let out = format_focus_json(&sample_result(), QuerySpan::unbounded()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert!(value["span"]["start"].is_null());
        assert!(value["span"]["end"].is_null());
    }
}
