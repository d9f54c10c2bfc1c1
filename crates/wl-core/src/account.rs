//! Interval accounting engine.
//!
//! A single forward pass over the event stream that attributes the
//! wall-clock interval between consecutive events to the correct bucket:
//!
//! 1. Maintain the collector state as of the previous event's timestamp
//! 2. Attribute `[prev_ts, ts]`, clipped to the query span, by that state
//!    (focused entities, idle episode, locked, or stopped)
//! 3. Detect activations on the snapshot focus-set difference
//! 4. Open/close idle episodes on the `running && idle && !locked` boundary,
//!    applying the per-command cutoff reclassification at close
//!
//! O(events) time, O(distinct entities) memory, no I/O.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use crate::cutoff::CutoffPolicy;
use crate::event::{Event, Snapshot};
use crate::span::QuerySpan;
use crate::types::EntityId;

/// Options for an accounting pass.
#[derive(Debug, Clone, Default)]
pub struct AccountOptions {
    /// Clipping interval; contributions outside it are discarded.
    pub span: QuerySpan,

    /// Per-command minimum idle durations for reclassification.
    pub cutoffs: CutoffPolicy,

    /// Include idle episodes that resume under a different command in the
    /// per-command duration distribution.
    pub include_switches: bool,
}

/// Accumulated statistics for one observed entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityStats {
    /// First non-empty title seen for this entity, if any.
    pub title: Option<String>,

    /// First non-empty command seen for this entity, if any.
    pub cmd: Option<String>,

    /// Transitions from unfocused to focused inside the query span.
    pub activations: u64,

    /// Clipped seconds this entity spent focused while the machine was
    /// active, plus any idle time reclassified by the cutoff policy.
    pub focus_seconds: f64,

    /// Clipped seconds of idle episodes this entity sat focused through
    /// (focused both when the episode opened and when focus resumed).
    pub idle_seconds: f64,
}

/// Aggregate durations not attributable to any entity's focus time.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Totals {
    pub idle_seconds: f64,
    pub locked_seconds: f64,
    pub stopped_seconds: f64,
}

/// The immutable output of one accounting pass.
#[derive(Debug, Clone, Default)]
pub struct AccountingResult {
    /// Statistics per observed entity.
    pub entities: HashMap<EntityId, EntityStats>,

    /// First non-empty title learned per entity.
    pub titles: HashMap<EntityId, String>,

    /// First non-empty command learned per entity.
    pub cmds: HashMap<EntityId, String>,

    /// Aggregate idle/locked/stopped durations.
    pub totals: Totals,

    /// Unclipped durations of accepted idle episodes, per command.
    pub idle_durations: BTreeMap<String, Vec<f64>>,
}

/// The collector phase in effect between two events.
///
/// Locked wins over idle: a locked machine is never an idle episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Stopped,
    Active,
    Idle,
    Locked,
}

/// A window carried over from the last snapshot.
#[derive(Debug, Clone)]
struct TrackedWindow {
    id: EntityId,
    focused: bool,
    /// Command from the snapshot entry itself, falling back to the
    /// metadata cache at snapshot time.
    cmd: Option<String>,
}

/// The current known truth, always as of the previous event's timestamp
/// while the next interval is being attributed.
#[derive(Debug, Clone, Default)]
struct CollectorState {
    running: bool,
    idle: bool,
    locked: bool,
    windows: Vec<TrackedWindow>,
}

impl CollectorState {
    fn phase(&self) -> Phase {
        if !self.running {
            Phase::Stopped
        } else if self.locked {
            Phase::Locked
        } else if self.idle {
            Phase::Idle
        } else {
            Phase::Active
        }
    }

    fn focused_ids(&self) -> impl Iterator<Item = &EntityId> {
        self.windows.iter().filter(|w| w.focused).map(|w| &w.id)
    }

    /// Command of the first focused window with known command metadata.
    fn first_focused_cmd(&self) -> Option<&str> {
        self.windows
            .iter()
            .filter(|w| w.focused)
            .find_map(|w| w.cmd.as_deref())
    }
}

/// An idle episode in progress. At most one exists at any time.
#[derive(Debug, Clone)]
struct IdleEpisode {
    start_ts: f64,
    /// Command focused when the episode opened, if known.
    cmd: Option<String>,
    /// Entities focused immediately before the episode opened.
    focused_at_start: Vec<EntityId>,
    /// Portion of the episode inside the query span.
    overlap_seconds: f64,
    /// Real elapsed time, unclipped; compared against the cutoff.
    raw_seconds: f64,
}

/// Returns-or-creates the stats entry for `id`, pre-populated with any
/// metadata already known. All entity mutation funnels through here so
/// creation order never affects correctness.
fn ensure_entry<'a>(
    entities: &'a mut HashMap<EntityId, EntityStats>,
    titles: &HashMap<EntityId, String>,
    cmds: &HashMap<EntityId, String>,
    id: &EntityId,
) -> &'a mut EntityStats {
    entities.entry(id.clone()).or_insert_with(|| EntityStats {
        title: titles.get(id).cloned(),
        cmd: cmds.get(id).cloned(),
        activations: 0,
        focus_seconds: 0.0,
        idle_seconds: 0.0,
    })
}

/// The accounting state machine. Feed it events in timestamp order with
/// [`Accountant::push`], then take the result with [`Accountant::finish`].
#[derive(Debug, Default)]
pub struct Accountant {
    opts: AccountOptions,
    state: CollectorState,
    prev_ts: Option<f64>,
    episode: Option<IdleEpisode>,
    entities: HashMap<EntityId, EntityStats>,
    titles: HashMap<EntityId, String>,
    cmds: HashMap<EntityId, String>,
    totals: Totals,
    idle_durations: BTreeMap<String, Vec<f64>>,
}

impl Accountant {
    pub fn new(opts: AccountOptions) -> Self {
        Self {
            opts,
            ..Self::default()
        }
    }

    /// Processes one event.
    pub fn push(&mut self, event: &Event) {
        let ts = event.ts();

        // 1. Attribute the interval since the previous event to whatever
        //    phase was in effect across it.
        if let Some(prev) = self.prev_ts {
            let overlap = self.opts.span.overlap(prev, ts);
            match self.state.phase() {
                Phase::Stopped => self.totals.stopped_seconds += overlap,
                Phase::Locked => self.totals.locked_seconds += overlap,
                Phase::Idle => {
                    if let Some(ep) = &mut self.episode {
                        ep.overlap_seconds += overlap;
                        ep.raw_seconds += (ts - prev).max(0.0);
                    }
                }
                Phase::Active => {
                    if overlap > 0.0 {
                        let focused: Vec<EntityId> = self.state.focused_ids().cloned().collect();
                        for id in &focused {
                            ensure_entry(&mut self.entities, &self.titles, &self.cmds, id)
                                .focus_seconds += overlap;
                        }
                    }
                }
            }
        }

        // 2. Activations: entities focused now but not in the previous
        //    snapshot, counted only inside the query span.
        if let Event::Snapshot(snap) = event {
            if self.opts.span.contains(ts) {
                self.detect_activations(snap);
            }
        }

        // 3. State transition and metadata cache update. The focus set in
        //    effect before the transition is what an opening idle episode
        //    captures.
        let was_idle = self.state.phase() == Phase::Idle;
        let focused_before: Vec<EntityId> = self.state.focused_ids().cloned().collect();
        let cmd_before = self.state.first_focused_cmd().map(str::to_owned);

        match event {
            Event::Restart { .. } => {
                self.state.running = true;
                self.state.idle = false;
                self.state.locked = false;
                self.state.windows.clear();
            }
            Event::Stopped { .. } => {
                self.state.running = false;
                self.state.windows.clear();
            }
            Event::Snapshot(snap) => {
                self.state.running = true;
                if let Some(idle) = snap.idle {
                    self.state.idle = idle;
                }
                if let Some(locked) = snap.locked {
                    self.state.locked = locked;
                }
                let mut tracked = Vec::with_capacity(snap.windows.len());
                for w in &snap.windows {
                    self.learn_metadata(&w.id, w.title.as_deref(), w.cmd.as_deref());
                    let cmd = w
                        .cmd
                        .clone()
                        .filter(|c| !c.is_empty())
                        .or_else(|| self.cmds.get(&w.id).cloned());
                    tracked.push(TrackedWindow {
                        id: w.id.clone(),
                        focused: w.focused,
                        cmd,
                    });
                }
                self.state.windows = tracked;
            }
        }

        // 4. Idle episode boundary: compare the phase just left to the
        //    phase just entered.
        let now_idle = self.state.phase() == Phase::Idle;
        if was_idle && !now_idle {
            if let Some(episode) = self.episode.take() {
                self.close_episode(&episode);
            }
        } else if !was_idle && now_idle {
            self.episode = Some(IdleEpisode {
                start_ts: ts,
                cmd: cmd_before,
                focused_at_start: focused_before,
                overlap_seconds: 0.0,
                raw_seconds: 0.0,
            });
        }

        self.prev_ts = Some(ts);
    }

    /// Finishes the pass. An episode still open here is dropped, never
    /// finalized.
    pub fn finish(self) -> AccountingResult {
        if let Some(ep) = &self.episode {
            tracing::debug!(start_ts = ep.start_ts, "dropping idle episode open at end of log");
        }
        AccountingResult {
            entities: self.entities,
            titles: self.titles,
            cmds: self.cmds,
            totals: self.totals,
            idle_durations: self.idle_durations,
        }
    }

    fn detect_activations(&mut self, snap: &Snapshot) {
        let prev_focused: HashSet<&EntityId> = self.state.focused_ids().collect();
        let mut counted: HashSet<&EntityId> = HashSet::new();
        for w in &snap.windows {
            if w.focused && !prev_focused.contains(&w.id) && counted.insert(&w.id) {
                ensure_entry(&mut self.entities, &self.titles, &self.cmds, &w.id).activations += 1;
            }
        }
    }

    /// Records the first non-empty title/cmd seen for an entity, back-filling
    /// an already-created stats entry exactly once.
    fn learn_metadata(&mut self, id: &EntityId, title: Option<&str>, cmd: Option<&str>) {
        if let Some(title) = title.filter(|t| !t.is_empty()) {
            if !self.titles.contains_key(id) {
                self.titles.insert(id.clone(), title.to_owned());
                if let Some(entry) = self.entities.get_mut(id) {
                    if entry.title.is_none() {
                        entry.title = Some(title.to_owned());
                    }
                }
            }
        }
        if let Some(cmd) = cmd.filter(|c| !c.is_empty()) {
            if !self.cmds.contains_key(id) {
                self.cmds.insert(id.clone(), cmd.to_owned());
                if let Some(entry) = self.entities.get_mut(id) {
                    if entry.cmd.is_none() {
                        entry.cmd = Some(cmd.to_owned());
                    }
                }
            }
        }
    }

    fn close_episode(&mut self, ep: &IdleEpisode) {
        let threshold = self.opts.cutoffs.threshold(ep.cmd.as_deref());
        // Non-strict boundary: an episode exactly at the cutoff stays idle.
        let below_cutoff = ep.cmd.is_some() && ep.raw_seconds < threshold;
        tracing::debug!(
            start_ts = ep.start_ts,
            raw = ep.raw_seconds,
            overlap = ep.overlap_seconds,
            below_cutoff,
            "idle episode closed"
        );

        if below_cutoff {
            // A blip shorter than the command's cutoff is active use; the
            // clipped time moves to focus, it is never double-counted.
            if ep.overlap_seconds > 0.0 {
                for id in &ep.focused_at_start {
                    ensure_entry(&mut self.entities, &self.titles, &self.cmds, id)
                        .focus_seconds += ep.overlap_seconds;
                }
            }
        } else {
            self.totals.idle_seconds += ep.overlap_seconds;
            if ep.overlap_seconds > 0.0 {
                let resumed: HashSet<&EntityId> = self.state.focused_ids().collect();
                let through: Vec<EntityId> = ep
                    .focused_at_start
                    .iter()
                    .filter(|id| resumed.contains(id))
                    .cloned()
                    .collect();
                for id in &through {
                    ensure_entry(&mut self.entities, &self.titles, &self.cmds, id)
                        .idle_seconds += ep.overlap_seconds;
                }
            }
        }

        // Distribution variant: the unclipped duration, only for episodes
        // with a known command that intersect the span, resume under the
        // same command (unless switches are included), and meet the cutoff.
        if let Some(cmd) = &ep.cmd {
            let end_cmd = if self.state.phase() == Phase::Active {
                self.state.first_focused_cmd()
            } else {
                None
            };
            let same_command = end_cmd == Some(cmd.as_str());
            if (self.opts.include_switches || same_command)
                && ep.overlap_seconds > 0.0
                && ep.raw_seconds >= threshold
            {
                self.idle_durations
                    .entry(cmd.clone())
                    .or_default()
                    .push(ep.raw_seconds);
            }
        }
    }
}

/// Runs a full accounting pass over an ordered event sequence.
pub fn account<'a, I>(events: I, opts: AccountOptions) -> AccountingResult
where
    I: IntoIterator<Item = &'a Event>,
{
    let mut accountant = Accountant::new(opts);
    for event in events {
        accountant.push(event);
    }
    accountant.finish()
}
