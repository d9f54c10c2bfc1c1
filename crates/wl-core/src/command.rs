//! Post-pass aggregation of entity statistics by command.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::account::AccountingResult;

/// Bucket name for entities with no known command.
pub const UNKNOWN_COMMAND: &str = "<unknown>";

/// Summed statistics for all entities sharing a command.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CommandStats {
    /// Number of distinct entities in this bucket.
    pub windows: usize,
    pub activations: u64,
    pub focus_seconds: f64,
    pub idle_seconds: f64,
}

/// Groups entity statistics by command. Entities without a known command
/// fall into the [`UNKNOWN_COMMAND`] bucket. Pure reduction over the
/// accounting output; the state machine is not involved.
pub fn group_by_command(result: &AccountingResult) -> BTreeMap<String, CommandStats> {
    let mut groups: BTreeMap<String, CommandStats> = BTreeMap::new();

    for stats in result.entities.values() {
        let key = stats.cmd.as_deref().unwrap_or(UNKNOWN_COMMAND);
        let group = groups.entry(key.to_owned()).or_default();
        group.windows += 1;
        group.activations += stats.activations;
        group.focus_seconds += stats.focus_seconds;
        group.idle_seconds += stats.idle_seconds;
    }

    groups
}
