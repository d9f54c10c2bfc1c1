//! Decoded window-logger events.

use crate::types::EntityId;

/// A single record from the activity log, in timestamp order.
///
/// Timestamps are unix-epoch seconds. The engine only requires that they be
/// monotonically non-decreasing across the sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The collector (re)started; all tracked focus/idle/locked state resets.
    Restart { ts: f64 },
    /// The collector stopped; nothing can be focused until it comes back.
    Stopped { ts: f64 },
    /// The authoritative state of the screen as of `ts`.
    Snapshot(Snapshot),
}

impl Event {
    /// The event's timestamp in unix-epoch seconds.
    pub const fn ts(&self) -> f64 {
        match self {
            Self::Restart { ts } | Self::Stopped { ts } => *ts,
            Self::Snapshot(snap) => snap.ts,
        }
    }
}

/// A full state snapshot emitted by the collector.
///
/// `idle` and `locked` are optional: an absent flag means "inherit the
/// previous value", which is not the same as an explicit `false`.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub ts: f64,
    pub idle: Option<bool>,
    pub locked: Option<bool>,
    pub windows: Vec<WindowEntry>,
}

/// One window within a snapshot.
///
/// `title` and `cmd` are descriptive metadata learned opportunistically; the
/// first non-empty value seen for an entity is retained for its lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowEntry {
    pub id: EntityId,
    pub focused: bool,
    pub title: Option<String>,
    pub cmd: Option<String>,
}
