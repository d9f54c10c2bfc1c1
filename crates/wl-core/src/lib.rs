//! Core domain logic for the window-logger analyzer.
//!
//! This crate contains the fundamental types and logic for:
//! - Accounting: the single-pass interval attribution engine
//! - Log reading: decoding the JSONL activity log into events
//! - Cutoff policy: per-command minimum idle durations
//! - Command grouping: aggregating entity statistics per command

mod account;
mod command;
pub mod cutoff;
pub mod event;
pub mod log;
pub mod span;
pub mod types;

pub use account::{AccountOptions, Accountant, AccountingResult, EntityStats, Totals, account};
pub use command::{CommandStats, UNKNOWN_COMMAND, group_by_command};
pub use cutoff::{CutoffError, CutoffPolicy};
pub use event::{Event, Snapshot, WindowEntry};
pub use log::{LogError, parse_log, read_log};
pub use span::{QuerySpan, SpanError};
pub use types::EntityId;
