//! JSONL log reader.
//!
//! The window logger appends one JSON object per line. Malformed lines,
//! lines without a usable timestamp, and window entries without a stable
//! `hash` are recovered locally here; the accounting engine only ever sees
//! well-formed [`Event`]s.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::event::{Event, Snapshot, WindowEntry};
use crate::types::EntityId;

/// Errors opening the activity log.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("log file not found: {path}")]
    NotFound { path: String },
    #[error("failed to read log file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// A raw log line before classification. Every field is optional so a
/// single bad field never poisons the rest of the record.
#[derive(Debug, Deserialize)]
struct RawRecord {
    ts: Option<f64>,
    #[serde(default)]
    restart: Option<serde_json::Value>,
    #[serde(default)]
    stopped: Option<serde_json::Value>,
    #[serde(default)]
    idle: Option<bool>,
    #[serde(default)]
    locked: Option<bool>,
    #[serde(default)]
    windows: Option<Vec<RawWindow>>,
}

#[derive(Debug, Deserialize)]
struct RawWindow {
    hash: Option<String>,
    #[serde(default)]
    focused: Option<bool>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    cmd: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Classifies a raw record into an [`Event`], or `None` if it should be
/// skipped (no timestamp, or none of the recognized shapes).
fn classify(raw: RawRecord) -> Option<Event> {
    let ts = raw.ts.filter(|t| t.is_finite())?;

    if raw.restart.is_some() {
        return Some(Event::Restart { ts });
    }
    if raw.stopped.is_some() {
        return Some(Event::Stopped { ts });
    }

    let windows = raw.windows?;
    let windows = windows
        .into_iter()
        .filter_map(|w| {
            let id = EntityId::new(w.hash?).ok()?;
            Some(WindowEntry {
                id,
                focused: w.focused.unwrap_or(false),
                title: non_empty(w.title),
                cmd: non_empty(w.cmd),
            })
        })
        .collect();

    Some(Event::Snapshot(Snapshot {
        ts,
        idle: raw.idle,
        locked: raw.locked,
        windows,
    }))
}

/// Parses log text into events, silently skipping anything malformed.
pub fn parse_log(data: &str) -> Vec<Event> {
    data.lines()
        .enumerate()
        .filter_map(|(lineno, line)| {
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            let raw: RawRecord = match serde_json::from_str(line) {
                Ok(raw) => raw,
                Err(err) => {
                    tracing::debug!(lineno, error = %err, "skipping malformed log line");
                    return None;
                }
            };
            let event = classify(raw);
            if event.is_none() {
                tracing::debug!(lineno, "skipping unrecognized log record");
            }
            event
        })
        .collect()
}

/// Reads and parses the activity log at `path`.
///
/// A missing or unreadable file is the one abort-worthy condition this
/// layer owns; everything inside the file degrades to skipped lines.
pub fn read_log(path: &Path) -> Result<Vec<Event>, LogError> {
    let display = path.display().to_string();
    let data = fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            LogError::NotFound { path: display.clone() }
        } else {
            LogError::Io {
                path: display.clone(),
                source,
            }
        }
    })?;
    Ok(parse_log(&data))
}
