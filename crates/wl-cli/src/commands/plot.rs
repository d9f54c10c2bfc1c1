//! Terminal box plots for idle duration distributions.

use std::collections::BTreeMap;
use std::fmt::Write;

use super::util::quantile;

const LABEL_MAX: usize = 30;

/// Maps a sample value onto a column in `0..width`.
#[expect(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "column index is bounded by the plot width"
)]
fn column(value: f64, min: f64, span: f64, width: usize) -> usize {
    if span <= 0.0 {
        return 0;
    }
    let col = ((value - min) / span * (width - 1) as f64).round() as usize;
    col.min(width - 1)
}

fn plot_row(sorted: &[f64], min: f64, span: f64, width: usize) -> String {
    let mut row = vec![' '; width];

    let lo = column(sorted[0], min, span, width);
    let hi = column(sorted[sorted.len() - 1], min, span, width);
    for cell in &mut row[lo..=hi] {
        *cell = '─';
    }

    let q1 = column(quantile(sorted, 0.25), min, span, width);
    let q3 = column(quantile(sorted, 0.75), min, span, width);
    for cell in &mut row[q1..=q3] {
        *cell = '█';
    }

    row[column(quantile(sorted, 0.5), min, span, width)] = '┃';
    row.into_iter().collect()
}

/// Renders one box plot per command onto a shared scale.
///
/// Each sample list must be sorted ascending and non-empty; whiskers span
/// min to max, the box covers the interquartile range, and `┃` marks the
/// median.
pub fn render_box_plots(groups: &BTreeMap<String, Vec<f64>>, width: usize) -> String {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for samples in groups.values() {
        if let (Some(first), Some(last)) = (samples.first(), samples.last()) {
            min = min.min(*first);
            max = max.max(*last);
        }
    }
    if !min.is_finite() {
        return String::new();
    }
    let span = max - min;

    let label_width = groups
        .keys()
        .map(|cmd| cmd.chars().count().min(LABEL_MAX))
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for (cmd, samples) in groups {
        if samples.is_empty() {
            continue;
        }
        let label: String = cmd.chars().take(LABEL_MAX).collect();
        writeln!(
            out,
            "{label:<label_width$}  {}",
            plot_row(samples, min, span, width)
        )
        .unwrap();
    }

    let left = format!("{min:.1}s");
    let right = format!("{max:.1}s");
    let gap = width.saturating_sub(left.len() + right.len());
    writeln!(out, "{:label_width$}  {left}{}{right}", "", " ".repeat(gap)).unwrap();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups(entries: &[(&str, &[f64])]) -> BTreeMap<String, Vec<f64>> {
        entries
            .iter()
            .map(|(cmd, samples)| ((*cmd).to_string(), samples.to_vec()))
            .collect()
    }

    #[test]
    fn column_maps_range_endpoints() {
        assert_eq!(column(0.0, 0.0, 40.0, 41), 0);
        assert_eq!(column(40.0, 0.0, 40.0, 41), 40);
        assert_eq!(column(20.0, 0.0, 40.0, 41), 20);
    }

    #[test]
    fn degenerate_span_collapses_to_first_column() {
        assert_eq!(column(5.0, 5.0, 0.0, 41), 0);
    }

    #[test]
    fn box_covers_interquartile_range() {
        let data = [0.0, 10.0, 20.0, 30.0, 40.0];
        let row = plot_row(&data, 0.0, 40.0, 41);
        let expected = format!(
            "{}{}┃{}{}",
            "─".repeat(10),
            "█".repeat(10),
            "█".repeat(10),
            "─".repeat(10)
        );
        assert_eq!(row, expected);
    }

    #[test]
    fn plots_share_a_scale() {
        let out = render_box_plots(
            &groups(&[("mpv", &[0.0, 20.0, 40.0]), ("vlc", &[10.0, 20.0, 30.0])]),
            41,
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("mpv  "));
        assert!(lines[1].starts_with("vlc  "));
        // mpv spans the whole scale; vlc's whiskers stay inside it.
        assert!(lines[0].ends_with('─'));
        assert!(lines[1].ends_with(' '));
        assert!(lines[2].contains("0.0s"));
        assert!(lines[2].trim_end().ends_with("40.0s"));
    }

    #[test]
    fn single_sample_renders_a_median_tick() {
        let out = render_box_plots(&groups(&[("mpv", &[42.0])]), 41);
        let row = out.lines().next().unwrap();
        assert!(row.contains('┃'));
    }

    #[test]
    fn empty_input_renders_nothing() {
        assert_eq!(render_box_plots(&BTreeMap::new(), 41), "");
    }
}
