//! Shared utilities for CLI commands.

use anyhow::Context;
use chrono::{DateTime, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use wl_core::QuerySpan;

/// Parse a time argument as either a unix timestamp (integer or float
/// string) or an ISO-8601 datetime/date. Naive datetimes are interpreted
/// as local time.
pub fn parse_time_arg(s: &str) -> anyhow::Result<f64> {
    if let Ok(ts) = s.parse::<f64>() {
        return Ok(ts);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(to_epoch_seconds(&dt.with_timezone(&Utc)));
    }

    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .or_else(|_| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map(|d| d.and_time(NaiveTime::from_hms_opt(0, 0, 0).unwrap()))
        })
        .with_context(|| {
            format!("cannot parse time '{s}' as unix timestamp or ISO datetime")
        })?;

    match Local.from_local_datetime(&naive) {
        // Single or ambiguous (DST fall-back): use the earlier time
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => {
            Ok(to_epoch_seconds(&dt.with_timezone(&Utc)))
        }
        LocalResult::None => anyhow::bail!("time '{s}' does not exist in the local timezone"),
    }
}

/// Resolves the query span from `--hours` / `--range`. Neither flag means
/// the unbounded span.
pub fn resolve_span(hours: Option<f64>, range: Option<&[String]>) -> anyhow::Result<QuerySpan> {
    if let Some(hours) = hours {
        anyhow::ensure!(
            hours.is_finite() && hours >= 0.0,
            "--hours must be a non-negative number, got {hours}"
        );
        let now = to_epoch_seconds(&Utc::now());
        return QuerySpan::new(hours.mul_add(-3600.0, now), now).context("invalid time range");
    }

    if let Some(range) = range {
        anyhow::ensure!(range.len() == 2, "--range takes exactly START and END");
        let start = parse_time_arg(&range[0])?;
        let end = parse_time_arg(&range[1])?;
        return QuerySpan::new(start, end).context("invalid time range");
    }

    Ok(QuerySpan::unbounded())
}

fn to_epoch_seconds(dt: &DateTime<Utc>) -> f64 {
    #[expect(clippy::cast_precision_loss, reason = "millisecond epoch fits f64 exactly")]
    let ms = dt.timestamp_millis() as f64;
    ms / 1000.0
}

/// Formats a duration in seconds as `HH:MM:SS`. Negative values clamp to
/// zero.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "value is rounded and clamped non-negative first"
)]
pub fn format_hms(seconds: f64) -> String {
    let total = seconds.round().max(0.0) as u64;
    let h = total / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;
    format!("{h:02}:{m:02}:{s:02}")
}

/// Mean of a non-empty slice.
#[expect(clippy::cast_precision_loss, reason = "sample counts are small")]
pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Inclusive linear-interpolation quantile of a sorted, non-empty slice.
/// `q` is in `[0, 1]`; a single sample is every quantile of itself.
#[expect(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "indices derive from small sample counts and a clamped q"
)]
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo].mul_add(1.0 - frac, sorted[hi] * frac)
}

/// Formats a span endpoint, spelling out the unbounded cases.
pub fn format_bound(value: f64) -> String {
    if value.is_infinite() {
        if value < 0.0 { "-inf" } else { "+inf" }.to_string()
    } else {
        format!("{value:.0}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_unix_timestamps() {
        assert!((parse_time_arg("1733650000").unwrap() - 1_733_650_000.0).abs() < 1e-6);
        assert!((parse_time_arg("1733650000.5").unwrap() - 1_733_650_000.5).abs() < 1e-6);
    }

    #[test]
    fn parses_rfc3339() {
        let ts = parse_time_arg("2025-12-08T10:23:00Z").unwrap();
        assert!((ts - 1_765_189_380.0).abs() < 1e-6);
    }

    #[test]
    fn parses_naive_datetime_as_local() {
        // The exact value depends on the local timezone; it must simply be
        // a finite timestamp in a plausible range.
        let ts = parse_time_arg("2025-12-08T10:23:00").unwrap();
        assert!(ts.is_finite());
        assert!((1_765_000_000.0..1_766_000_000.0).contains(&ts));
    }

    #[test]
    fn parses_bare_date_as_local_midnight() {
        let ts = parse_time_arg("2025-12-08").unwrap();
        assert!(ts.is_finite());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_time_arg("yesterday-ish").is_err());
    }

    #[test]
    fn no_flags_means_unbounded() {
        let span = resolve_span(None, None).unwrap();
        assert!(span.start().is_infinite() && span.start() < 0.0);
        assert!(span.end().is_infinite() && span.end() > 0.0);
    }

    #[test]
    fn hours_span_ends_now() {
        let span = resolve_span(Some(2.0), None).unwrap();
        assert!((span.end() - span.start() - 7200.0).abs() < 1e-6);
    }

    #[test]
    fn negative_hours_rejected() {
        assert!(resolve_span(Some(-1.0), None).is_err());
    }

    #[test]
    fn range_span_parses_both_endpoints() {
        let range = vec!["100".to_string(), "200".to_string()];
        let span = resolve_span(None, Some(&range)).unwrap();
        assert!((span.start() - 100.0).abs() < 1e-9);
        assert!((span.end() - 200.0).abs() < 1e-9);
    }

    #[test]
    fn inverted_range_rejected() {
        let range = vec!["200".to_string(), "100".to_string()];
        assert!(resolve_span(None, Some(&range)).is_err());
    }

    #[test]
    fn hms_formatting() {
        assert_eq!(format_hms(0.0), "00:00:00");
        assert_eq!(format_hms(59.4), "00:00:59");
        assert_eq!(format_hms(59.6), "00:01:00");
        assert_eq!(format_hms(3661.0), "01:01:01");
        assert_eq!(format_hms(100.0), "00:01:40");
        assert_eq!(format_hms(-5.0), "00:00:00");
        assert_eq!(format_hms(90_000.0), "25:00:00");
    }

    #[test]
    fn mean_of_samples() {
        assert!((mean(&[10.0]) - 10.0).abs() < 1e-9);
        assert!((mean(&[0.0, 10.0, 20.0]) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn quantiles_interpolate_inclusively() {
        let sorted = [0.0, 10.0, 20.0, 30.0, 40.0];
        assert!((quantile(&sorted, 0.25) - 10.0).abs() < 1e-9);
        assert!((quantile(&sorted, 0.5) - 20.0).abs() < 1e-9);
        assert!((quantile(&sorted, 0.75) - 30.0).abs() < 1e-9);

        // Four samples interpolate between ranks.
        let four = [0.0, 10.0, 20.0, 30.0];
        assert!((quantile(&four, 0.5) - 15.0).abs() < 1e-9);
        assert!((quantile(&four, 0.25) - 7.5).abs() < 1e-9);
    }

    #[test]
    fn single_sample_is_every_quantile() {
        let one = [42.0];
        assert!((quantile(&one, 0.25) - 42.0).abs() < 1e-9);
        assert!((quantile(&one, 0.75) - 42.0).abs() < 1e-9);
    }

    #[test]
    fn bound_formatting() {
        assert_eq!(format_bound(f64::NEG_INFINITY), "-inf");
        assert_eq!(format_bound(f64::INFINITY), "+inf");
        assert_eq!(format_bound(1000.0), "1000");
    }
}
